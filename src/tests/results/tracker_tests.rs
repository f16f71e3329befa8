use super::*;

use crate::model::ToolResult;

fn result(id: u64) -> ToolResult {
    ToolResult {
        submission_id: SubmissionId(id),
        tool_name: "heatmap".to_string(),
        name: format!("result-{id}"),
        result_type: None,
        payload: serde_json::Value::Null,
        visible: false,
    }
}

#[test]
fn handled_starts_empty() {
    let tracker = SubmissionTracker::new();
    assert!(!tracker.is_handled(SubmissionId(1)));
}

#[test]
fn mark_handled_is_sticky() {
    let mut tracker = SubmissionTracker::new();
    tracker.mark_handled(SubmissionId(3));
    tracker.mark_handled(SubmissionId(3));
    assert!(tracker.is_handled(SubmissionId(3)));
    assert!(!tracker.is_handled(SubmissionId(4)));
}

#[test]
fn mark_all_saved_covers_the_archive() {
    let mut store = ResultStore::new();
    store.set_current(result(1));
    store.save_current().expect("save current");
    store.set_current(result(2));
    store.save_current().expect("save current");
    store.set_current(result(3));

    let mut tracker = SubmissionTracker::new();
    tracker.mark_all_saved(&store);

    assert!(tracker.is_handled(SubmissionId(1)));
    assert!(tracker.is_handled(SubmissionId(2)));
    // The current result is not part of the archive.
    assert!(!tracker.is_handled(SubmissionId(3)));
}
