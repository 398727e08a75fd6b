use super::*;
use crate::ids::RunId;

fn sample_entry(t: i64, b: u64, s: u64) -> ProgressEntry {
    ProgressEntry {
        t,
        b,
        s,
        de: 0,
        dc: 0,
        pe: 1,
        pc: 1,
    }
}

#[test]
fn add_sync_progress_entry_updates_entries_count() {
    let run_id = RunId::new("run-1");
    let mut report = Report::new(&run_id, "hoodi", 1_000);
    report.add_sync_progress_entry(sample_entry(1_000, 10, 5));
    report.add_sync_progress_entry(sample_entry(1_030, 20, 10));
    assert_eq!(report.sync_status.entries_count, 2);
    assert_eq!(report.progress.len(), 2);
}

#[test]
fn close_sets_final_block_and_slot_from_last_entry() {
    let run_id = RunId::new("run-1");
    let mut report = Report::new(&run_id, "hoodi", 1_000);
    report.add_sync_progress_entry(sample_entry(1_000, 10, 5));
    report.add_sync_progress_entry(sample_entry(1_030, 42, 21));
    report.close(1_060, RunStatus::Success, "synced");

    assert_eq!(report.sync_status.block, 42);
    assert_eq!(report.sync_status.slot, 21);
    assert_eq!(report.sync_status.status, Some(RunStatus::Success));
    assert_eq!(report.sync_status.status_message.as_deref(), Some("synced"));
    assert!(report.sync_status.is_closed());
}

#[test]
fn close_with_no_progress_leaves_block_and_slot_zero() {
    let run_id = RunId::new("run-1");
    let mut report = Report::new(&run_id, "hoodi", 1_000);
    report.close(1_001, RunStatus::Timeout, "deadline exceeded");
    assert_eq!(report.sync_status.block, 0);
    assert_eq!(report.sync_status.slot, 0);
}

#[test]
fn clone_for_finalize_clears_progress_but_keeps_last_entry() {
    let run_id = RunId::new("run-1");
    let mut report = Report::new(&run_id, "hoodi", 1_000);
    report.add_sync_progress_entry(sample_entry(1_000, 10, 5));
    report.add_sync_progress_entry(sample_entry(1_030, 20, 10));

    let finalized = report.clone_for_finalize();
    assert!(finalized.progress.is_empty());
    assert_eq!(finalized.sync_status.last_entry, Some(sample_entry(1_030, 20, 10)));
    // Original is untouched.
    assert_eq!(report.progress.len(), 2);
}

#[test]
fn not_closed_report_has_no_status() {
    let run_id = RunId::new("run-1");
    let report = Report::new(&run_id, "hoodi", 1_000);
    assert!(!report.sync_status.is_closed());
}
