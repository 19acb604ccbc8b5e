// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Text and JSON rendering of a polled snapshot.
//!
//! Each polled item renders as its own table; items that are missing or came
//! back degraded (`""`) are skipped.

use std::collections::BTreeSet;
use std::io::{self, Write};

use ctl_core::{
    DirectoryReport, JobAssignments, JobHistogram, SlotsReport, StatsReport, SystemStats,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};

use crate::color::Palette;
use crate::dashboard::Snapshot;

/// `value * factor / total`, zero when `total` is zero.
fn safe_div(value: f64, total: f64, factor: f64) -> f64 {
    if total == 0.0 {
        0.0
    } else {
        value * factor / total
    }
}

fn item<T: DeserializeOwned>(data: &Map<String, Value>, key: &str) -> Option<T> {
    match data.get(key)? {
        Value::String(s) if s.is_empty() => None,
        value => serde_json::from_value(value.clone()).ok(),
    }
}

/// Write the snapshot as one JSON line: `{"data": ..., "counters": ..., "rates": ...}`.
pub fn json<W: Write>(out: &mut W, snapshot: &Snapshot) -> io::Result<()> {
    let line = json!({
        "time": snapshot.epoch_secs,
        "data": snapshot.data,
        "counters": snapshot.counters,
        "rates": snapshot.rates,
    });
    serde_json::to_writer(&mut *out, &line)?;
    writeln!(out)
}

pub struct Renderer {
    palette: Palette,
}

impl Renderer {
    pub fn new(palette: Palette) -> Self {
        Self { palette }
    }

    /// Write every table present in the snapshot.
    pub fn text<W: Write>(&self, out: &mut W, snapshot: &Snapshot) -> io::Result<()> {
        let data = &snapshot.data;
        writeln!(
            out,
            "{}  queued {}  completed {}  drain {:.1}/s  done {:.1}/s",
            self.palette.header("ctldash"),
            snapshot.counters.queued,
            snapshot.counters.completed,
            snapshot.rates.queued,
            snapshot.rates.completed,
        )?;

        let stats: Option<StatsReport> = item(data, "stats");
        let system = stats.as_ref().map(|s| s.system.clone()).or_else(|| item(data, "stats_system"));
        if let Some(system) = system {
            self.system(out, &system, snapshot.epoch_secs)?;
        }
        if let Some(stats) = &stats {
            self.requests(out, stats)?;
            self.methods(out, stats)?;
        }
        if let Some(slots) = item::<SlotsReport>(data, "slots") {
            self.slots(out, &slots)?;
        }
        if let Some(assignments) = item::<JobAssignments>(data, "job_assignments") {
            self.assignments(out, &assignments)?;
        }
        if let Some(jobs) = item::<JobHistogram>(data, "jobs") {
            self.jobs(out, &jobs)?;
        }
        if let Some(directory) = item::<DirectoryReport>(data, "directory") {
            self.directory(out, &directory)?;
        }
        Ok(())
    }

    fn title<W: Write>(&self, out: &mut W, title: &str, count: usize) -> io::Result<()> {
        writeln!(out)?;
        writeln!(out, "{}", self.palette.header(&format!("{title} ({count})")))
    }

    fn caption<W: Write>(&self, out: &mut W, caption: &str) -> io::Result<()> {
        writeln!(out, "{}", self.palette.context(caption))
    }

    pub fn system<W: Write>(&self, out: &mut W, system: &SystemStats, now_epoch: f64) -> io::Result<()> {
        let uptime_mins = (now_epoch - system.start_time).max(0.0) as u64 / 60;
        let (hours, mins) = (uptime_mins / 60, uptime_mins % 60);
        let rows = [
            ("cpu use", format!("{:.2}", system.cpu_use)),
            ("memory percent", format!("{:.1}", system.memory_percent)),
            ("memory used", format!("{:.2} GB", system.memory_used as f64 / 1e9)),
            ("uptime", format!("{hours}:{mins:02} hh:mm")),
        ];

        self.title(out, "System", rows.len())?;
        self.caption(out, &format!(" {:<30}{:>18} ", "Item", "Value"))?;
        for (name, value) in rows {
            writeln!(out, " {:<30}{:>18} ", name, value)?;
        }
        Ok(())
    }

    pub fn requests<W: Write>(&self, out: &mut W, stats: &StatsReport) -> io::Result<()> {
        self.title(out, "Request Statistics", 4)?;
        self.caption(
            out,
            &format!(
                " {:<8}{:>8}{:>10}{:>10}{:>10}{:>10}{:>8}{:>8}{:>8}{:>8} ",
                "Period", "Reqs", "Av-Reqs", "Av-Resp", "Av-NoWr", "Max-Resp", "Slot", "Slot", "CPU ", "500's"
            ),
        )?;
        self.caption(
            out,
            &format!(
                " {:<8}{:>8}{:>10}{:>10}{:>10}{:>10}{:>8}{:>8}{:>8}{:>8} ",
                "", "", "per sec", "(ms)", "(ms)", "(ms)", "Avg.", "Max", "Avg.", ""
            ),
        )?;
        for (label, seconds, w) in stats.windows() {
            let requests = w.requests as f64;
            writeln!(
                out,
                " {:<8}{:>8}{:>10.1}{:>10.1}{:>10.1}{:>10.1}{:>8.2}{:>8}{:>7.1}%{:>8} ",
                label,
                w.requests,
                safe_div(requests, seconds as f64, 1.0),
                safe_div(w.total_ms, requests, 1.0),
                safe_div(w.total_ms - w.write_ms, requests, 1.0),
                w.max_ms,
                safe_div(w.slots as f64, requests, 1.0),
                w.max_slots,
                safe_div(w.cpu, requests, 1.0),
                w.server_errors,
            )?;
        }
        Ok(())
    }

    pub fn methods<W: Write>(&self, out: &mut W, stats: &StatsReport) -> io::Result<()> {
        let windows = stats.windows();
        let methods: BTreeSet<&str> =
            windows.iter().flat_map(|(_, _, w)| w.method.keys().map(String::as_str)).collect();

        self.title(out, "Methods", methods.len())?;
        let mut captions = vec!["Method".to_string()];
        for (label, _, _) in &windows {
            captions.push("Number".to_string());
            captions.push(format!("{label} (ms)"));
        }
        self.caption(out, &row(&captions))?;

        let mut totals = [(0u64, 0.0f64); 4];
        for method in &methods {
            let mut cells = vec![method.to_string()];
            for (i, (_, _, w)) in windows.iter().enumerate() {
                let count = w.method.get(*method).copied().unwrap_or(0);
                let ms = w.method_ms.get(*method).copied().unwrap_or(0.0);
                totals[i].0 += count;
                totals[i].1 += ms;
                cells.push(count.to_string());
                cells.push(format!("{:.1}", safe_div(ms, count as f64, 1.0)));
            }
            writeln!(out, "{}", row(&cells))?;
        }

        let mut total = vec!["Total:".to_string()];
        let mut unauthorized = vec!["401s:".to_string()];
        for (i, (_, _, w)) in windows.iter().enumerate() {
            total.push(totals[i].0.to_string());
            total.push(format!("{:.1}", safe_div(totals[i].1, totals[i].0 as f64, 1.0)));
            unauthorized.push(w.unauthorized.to_string());
            unauthorized.push(String::new());
        }
        writeln!(out, "{}", row(&total))?;
        writeln!(out, "{}", row(&unauthorized))
    }

    pub fn slots<W: Write>(&self, out: &mut W, report: &SlotsReport) -> io::Result<()> {
        self.title(out, "HTTP Slots", report.slots.len())?;
        self.caption(
            out,
            &format!(
                " {:>4}{:>8}{:>8}{:>8}{:>8}{:>8}{:>8}{:>8}{:>8} ",
                "Slot", "unack", "ack", "uncls", "total", "start", "strting", "stopped", "abd"
            ),
        )?;
        let mut slots: Vec<_> = report.slots.iter().collect();
        slots.sort_by_key(|s| s.slot);
        for s in &slots {
            let line = format!(
                " {:>4}{:>8}{:>8}{:>8}{:>8}{:>8}{:>8}{:>8}{:>8} ",
                s.slot,
                s.unacknowledged,
                s.acknowledged,
                s.unclosed,
                s.total,
                s.started,
                s.starting,
                s.stopped,
                s.abandoned
            );
            if s.unacknowledged + s.acknowledged > 0 {
                writeln!(out, "{}", self.palette.active(&line))?;
            } else {
                writeln!(out, "{line}")?;
            }
        }
        let open: u64 = slots.iter().map(|s| s.unacknowledged + s.acknowledged).sum();
        let total: u64 = slots.iter().map(|s| s.total).sum();
        let mut footer = format!(" {:<12}{:>8}{:>16}", "Total:", open, total);
        if report.overloaded {
            footer.push_str("    OVERLOADED");
        }
        writeln!(out, "{footer}")
    }

    pub fn assignments<W: Write>(&self, out: &mut W, assignments: &JobAssignments) -> io::Result<()> {
        self.title(out, "Job Assignments", assignments.workers.len())?;
        self.caption(out, &format!(" {:>4}{:>12}{:>8}{:>12} ", "Slot", "assigned", "load", "completed"))?;
        for (slot, w) in assignments.workers.iter().enumerate() {
            writeln!(out, " {:>4}{:>12}{:>8}{:>12} ", slot, w.assigned(), w.load(), w.completed())?;
        }
        writeln!(
            out,
            " {:<6}{:>10}{:>8}{:>12}",
            "Total:",
            assignments.total_assigned(),
            format!("{}%", assignments.level),
            assignments.total_completed()
        )
    }

    pub fn jobs<W: Write>(&self, out: &mut W, jobs: &JobHistogram) -> io::Result<()> {
        self.title(out, "Jobs", jobs.len())?;
        self.caption(
            out,
            &format!(
                " {:<40}{:>8}{:>10}{:>8}{:>8}{:>10}{:>10} ",
                "Work Type", "Queued", "Assigned", "Late", "Failed", "Completed", "Av-Time"
            ),
        )?;
        self.caption(out, &format!(" {:<40}{:>8}{:>10}{:>8}{:>8}{:>10}{:>10} ", "", "", "", "", "", "", "(ms)"))?;

        let mut total = ctl_core::WorkTypeCounts::default();
        for (work_type, c) in jobs {
            total.queued += c.queued;
            total.assigned += c.assigned;
            total.late += c.late;
            total.failed += c.failed;
            total.completed += c.completed;
            total.time += c.time;
            let line = format!(
                "{}{:<40}{:>8}{:>10}{:>8}{:>8}{:>10}{:>10.1} ",
                if c.queued > 0 { ">" } else { " " },
                work_type,
                c.queued,
                c.assigned,
                c.late,
                c.failed,
                c.completed,
                c.average_ms()
            );
            if c.queued > 0 {
                writeln!(out, "{}", self.palette.active(&line))?;
            } else {
                writeln!(out, "{line}")?;
            }
        }
        writeln!(
            out,
            " {:<40}{:>8}{:>10}{:>8}{:>8}{:>10}{:>10.1} ",
            "Total:",
            total.queued,
            total.assigned,
            total.late,
            total.failed,
            total.completed,
            total.average_ms()
        )
    }

    pub fn directory<W: Write>(&self, out: &mut W, report: &DirectoryReport) -> io::Result<()> {
        self.title(out, "Directory Service", report.len())?;
        self.caption(out, &format!(" {:<40}{:>15}{:>15}{:>15} ", "Method", "Calls", "Total", "Average"))?;
        self.caption(out, &format!(" {:<40}{:>15}{:>15}{:>15} ", "", "", "(sec)", "(ms)"))?;

        let (mut count, mut seconds) = (0u64, 0.0f64);
        let (mut cached, mut uncached) = (0u64, 0u64);
        for (method, call) in report {
            count += call.count();
            seconds += call.seconds();
            if method.ends_with("-hit") {
                cached += call.count();
            } else if method.ends_with("-miss") || method.ends_with("-expired") {
                uncached += call.count();
            }
            writeln!(
                out,
                " {:<40}{:>15}{:>15.1}{:>15.3} ",
                method,
                call.count(),
                call.seconds(),
                safe_div(call.seconds(), call.count() as f64, 1000.0)
            )?;
        }
        let lookups = (cached + uncached) as f64;
        writeln!(out, " {:<40}{:>15}{:>15.1}{:>15.3} ", "Total:", count, seconds, safe_div(seconds, count as f64, 1000.0))?;
        writeln!(out, " {:<40}{:>15}{:>14.1}%{:>15} ", "Total Cached:", cached, safe_div(cached as f64, lookups, 100.0), "")?;
        writeln!(out, " {:<40}{:>15}{:>14.1}%{:>15} ", "Total Uncached:", uncached, safe_div(uncached as f64, lookups, 100.0), "")
    }
}

/// Method table row: a wide name column then alternating count/time columns.
fn row(cells: &[String]) -> String {
    let mut line = String::from(" ");
    for (i, cell) in cells.iter().enumerate() {
        match i {
            0 => line.push_str(&format!("{cell:<40}")),
            i if i % 2 == 1 => line.push_str(&format!("{cell:>8}")),
            _ => line.push_str(&format!("{cell:>10}")),
        }
    }
    line.push(' ');
    line
}

#[cfg(test)]
#[path = "render_tests.rs"]
mod tests;
