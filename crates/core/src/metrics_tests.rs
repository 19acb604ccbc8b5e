// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde_json::json;

use super::*;

#[test]
fn worker_load_serializes_as_triple() {
    let value = serde_json::to_value(WorkerLoad(2, 40, 17)).unwrap();
    assert_eq!(value, json!([2, 40, 17]));
}

#[test]
fn job_assignments_totals_sum_workers() {
    let assignments = JobAssignments {
        workers: vec![WorkerLoad(1, 10, 5), WorkerLoad(3, 30, 7)],
        level: 20,
    };
    assert_eq!(assignments.total_assigned(), 4);
    assert_eq!(assignments.total_completed(), 12);
}

#[test]
fn job_assignments_decodes_wire_shape() {
    let decoded: JobAssignments =
        serde_json::from_value(json!({"workers": [[0, 0, 3]], "level": 5})).unwrap();
    assert_eq!(decoded.workers, vec![WorkerLoad(0, 0, 3)]);
    assert_eq!(decoded.level, 5);
}

#[test]
fn directory_call_serializes_as_pair() {
    let value = serde_json::to_value(DirectoryCall(4, 0.5)).unwrap();
    assert_eq!(value, json!([4, 0.5]));
}

#[yare::parameterized(
    none_completed = { 0, 3.0, 0.0 },
    one_second_each = { 2, 2.0, 1000.0 },
    fractional = { 4, 0.1, 25.0 },
)]
fn work_type_average_ms(completed: u64, time: f64, expected: f64) {
    let counts = WorkTypeCounts { completed, time, ..Default::default() };
    assert!((counts.average_ms() - expected).abs() < 1e-9);
}

#[test]
fn slots_report_default_is_empty_and_not_overloaded() {
    let value = serde_json::to_value(SlotsReport::default()).unwrap();
    assert_eq!(value, json!({"slots": [], "overloaded": false}));
}

#[test]
fn stats_report_uses_access_log_keys() {
    let mut report = StatsReport::default();
    report.one_minute.requests = 3;
    report.one_minute.method.insert("PROPFIND".into(), 3);
    report.system.start_time = 100.0;

    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["1m"]["requests"], json!(3));
    assert_eq!(value["1m"]["method"]["PROPFIND"], json!(3));
    assert_eq!(value["1h"]["T-MAX"], json!(0.0));
    assert_eq!(value["system"]["start time"], json!(100.0));
    assert!(value.get("current").is_some());
}

#[test]
fn stats_report_tolerates_missing_windows() {
    let report: StatsReport = serde_json::from_value(json!({"5m": {"requests": 9}})).unwrap();
    assert_eq!(report.five_minutes.requests, 9);
    assert_eq!(report.current, RequestWindow::default());
}

#[test]
fn merging_windows_sums_counts_and_keeps_maxima() {
    let mut a = RequestWindow { requests: 1, total_ms: 10.0, max_ms: 10.0, ..Default::default() };
    a.method.insert("GET".into(), 1);
    let mut b = RequestWindow {
        requests: 2,
        total_ms: 5.0,
        max_ms: 4.0,
        max_slots: 3,
        ..Default::default()
    };
    b.method.insert("GET".into(), 1);
    b.method.insert("PUT".into(), 1);

    a.merge(&b);
    assert_eq!(a.requests, 3);
    assert_eq!(a.total_ms, 15.0);
    assert_eq!(a.max_ms, 10.0);
    assert_eq!(a.max_slots, 3);
    assert_eq!(a.method.get("GET"), Some(&2));
    assert_eq!(a.method.get("PUT"), Some(&1));
}
