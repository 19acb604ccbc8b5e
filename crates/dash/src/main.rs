// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ctldash: poll a ctl daemon's introspection service and render it.

use std::io::{IsTerminal, Write};
use std::time::Duration;

use clap::Parser;
use ctl_core::SystemClock;
use ctl_dash::color::{self, Palette};
use ctl_dash::render::{self, Renderer};
use ctl_dash::{DashError, DashOptions, Dashboard, ExitError, MonitorClient, Target};
use tracing_subscriber::EnvFilter;

/// Items polled when none are named
const DEFAULT_ITEMS: &[&str] = &["stats", "slots", "jobcount", "jobs", "job_assignments", "directory"];

#[derive(Parser)]
#[command(name = "ctldash", version, about = "Poll and display ctl daemon state", styles = color::styles())]
struct Cli {
    /// Introspection service: host[:port] or unix:<path>
    #[arg(short, long, default_value = "localhost:8100")]
    server: Target,

    /// Seconds between polls
    #[arg(short, long, default_value = "1", value_parser = parse_interval)]
    interval: Duration,

    /// Poll once, print and exit
    #[arg(long)]
    once: bool,

    /// Print one JSON line per poll instead of tables
    #[arg(long)]
    json: bool,

    /// Keep polling when the server returns no data
    #[arg(long)]
    allow_empty: bool,

    /// Items to poll (default: all tables)
    items: Vec<String>,
}

fn parse_interval(s: &str) -> Result<Duration, DashError> {
    s.parse::<f64>()
        .ok()
        .filter(|secs| *secs > 0.0)
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .ok_or_else(|| DashError::InvalidInterval(s.to_string()))
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        match e.downcast_ref::<ExitError>() {
            Some(exit) => {
                eprintln!("Error: {exit}");
                std::process::exit(exit.code);
            }
            None => {
                eprintln!("Error: {e:#}");
                std::process::exit(1);
            }
        }
    }
}

async fn run() -> anyhow::Result<()> {
    // The terminal is the render surface; log only on request.
    if std::env::var_os("RUST_LOG").is_some() {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init();
    }

    let cli = Cli::parse();
    let mut client = MonitorClient::new(cli.server);
    if cli.items.is_empty() {
        for item in DEFAULT_ITEMS {
            client.add_item(*item);
        }
    }
    for item in cli.items {
        client.add_item(item);
    }

    let options = DashOptions { interval: cli.interval, allow_empty: cli.allow_empty };
    let mut dashboard = Dashboard::new(client, SystemClock, options);
    let renderer = Renderer::new(Palette::detect());
    let clear = !cli.once && !cli.json && std::io::stdout().is_terminal();
    let json = cli.json;

    let poll = dashboard.run(cli.once, |snapshot| {
        let mut out = std::io::stdout().lock();
        if json {
            render::json(&mut out, snapshot)?;
        } else {
            if clear {
                write!(out, "\x1b[2J\x1b[H")?;
            }
            renderer.text(&mut out, snapshot)?;
        }
        out.flush()
    });

    tokio::select! {
        result = poll => result.map_err(ExitError::from)?,
        _ = tokio::signal::ctrl_c() => {}
    }
    Ok(())
}
