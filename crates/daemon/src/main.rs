// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ctld: control multiplexer and introspection daemon.

use anyhow::Context;
use ctl_daemon::{env, startup, Config};
use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("loading daemon configuration")?;
    let _guard = init_tracing(&config)?;

    let result = match startup(&config).await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!("startup failed: {}", e);
            return Err(e.into());
        }
    };

    let cancel = CancellationToken::new();
    let mut sigterm = signal(SignalKind::terminate()).context("installing SIGTERM handler")?;
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => info!("received interrupt"),
                _ = sigterm.recv() => info!("received SIGTERM"),
            }
            cancel.cancel();
        }
    });

    result.run(cancel).await?;
    Ok(())
}

/// Daily-rotated file log under the state directory, plus stderr when
/// `CTL_LOG_STDERR` is set. The guard flushes the file writer on drop.
fn init_tracing(config: &Config) -> anyhow::Result<WorkerGuard> {
    std::fs::create_dir_all(&config.log_dir)
        .with_context(|| format!("creating log directory {}", config.log_dir.display()))?;
    let appender = tracing_appender::rolling::daily(&config.log_dir, "ctld.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let file_layer = fmt::layer().with_writer(writer).with_ansi(false);
    let stderr_layer = env::log_stderr().then(|| fmt::layer().with_writer(std::io::stderr).compact());

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .context("initializing tracing")?;
    Ok(guard)
}
