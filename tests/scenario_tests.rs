// End-to-end scenarios: wrap async functions, call them, build the report.
// Tests that touch the global recorder run serially and reset it first.

use serial_test::serial;
use std::time::{Duration, Instant};
use timed::{process_logs, timed, Recorder, Report, TimedError, TimingEvent};

async fn sleep_ms(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

async fn task_a(ms: u64) {
    sleep_ms(ms).await;
}

async fn task_b(ms: u64) {
    sleep_ms(ms).await;
}

async fn always_fails() -> Result<u32, std::io::Error> {
    Err(std::io::Error::new(std::io::ErrorKind::Other, "nope"))
}

fn fresh_global() -> &'static Recorder {
    let recorder = Recorder::global();
    recorder.reset();
    recorder
}

// ============================================================================
// Scenarios against the global recorder
// ============================================================================

#[tokio::test]
#[serial]
async fn test_single_sleeping_call_reports_one_row() {
    let recorder = fresh_global();
    let wrapped = timed!(sleep_ms);

    wrapped.call((10,)).await;

    let report = Report::from_recorder(recorder).unwrap();
    assert_eq!(report.rows().len(), 1);
    let row = &report.rows()[0];
    assert_eq!(row.function, "scenario_tests.sleep_ms");
    assert!(row.nanos >= 10_000_000);
    // Generous upper bound for scheduler jitter on loaded CI machines.
    assert!(row.seconds >= 0.01 && row.seconds < 0.5);

    process_logs().unwrap();
}

#[tokio::test]
#[serial]
async fn test_two_functions_sorted_by_total() {
    let recorder = fresh_global();
    let a = timed!(task_a);
    let b = timed!(task_b);

    a.call((5,)).await;
    a.call((7,)).await;
    b.call((3,)).await;

    let report = Report::from_recorder(recorder).unwrap();
    let rows = report.rows();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].function, "scenario_tests.task_a");
    assert_eq!(rows[1].function, "scenario_tests.task_b");
    assert!(rows[0].nanos >= 12_000_000);
    assert!(rows[1].nanos >= 3_000_000);
    assert!(rows[0].nanos >= rows[1].nanos);
    assert_eq!(recorder.len(), 3);
}

#[tokio::test]
#[serial]
async fn test_failed_call_leaves_report_empty() {
    let recorder = fresh_global();
    let wrapped = timed!(always_fails);

    let err = wrapped.try_call(()).await.unwrap_err();
    assert_eq!(err.to_string(), "nope");

    assert!(recorder.is_empty());
    let report = Report::from_recorder(recorder).unwrap();
    assert!(report.is_empty());
    process_logs().unwrap();
}

#[test]
#[serial]
fn test_empty_buffer_renders_header_only() {
    let recorder = fresh_global();
    let report = Report::from_recorder(recorder).unwrap();

    let rendered = report.render();
    assert_eq!(rendered.lines().count(), 3);
    assert!(rendered.contains("| Function"));
    assert!(rendered.contains("Time (ns)"));
    process_logs().unwrap();
}

#[test]
#[serial]
fn test_malformed_global_buffer_fails_process_logs() {
    let recorder = fresh_global();
    recorder.record(&TimingEvent::new("m.ok", 1));
    recorder.append("garbage").unwrap();

    match process_logs() {
        Err(TimedError::MalformedRecord { line, .. }) => assert_eq!(line, 2),
        other => panic!("expected MalformedRecord, got {:?}", other),
    }
    recorder.reset();
}

// ============================================================================
// Per-test recorders
// ============================================================================

#[tokio::test]
async fn test_event_count_matches_successful_calls() {
    let recorder = Recorder::new();
    let wrapped = timed!(sleep_ms, recorder.clone());

    for _ in 0..5 {
        let before = Instant::now();
        wrapped.call((1,)).await;
        let bracket = before.elapsed();

        let last = recorder.read_all().pop().unwrap();
        let event = TimingEvent::from_line(&last).unwrap();
        assert!(u128::from(event.time_ns) <= bracket.as_nanos());
    }
    assert_eq!(recorder.len(), 5);
}

#[tokio::test]
async fn test_recorders_are_isolated() {
    let first = Recorder::new();
    let second = Recorder::new();
    let a = timed!(task_a, first.clone());
    let b = timed!(task_b, second.clone());

    a.call((1,)).await;
    b.call((1,)).await;
    b.call((1,)).await;

    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 2);
}

#[tokio::test]
async fn test_report_can_be_regenerated_after_more_calls() {
    let recorder = Recorder::new();
    let wrapped = timed!(task_a, recorder.clone());

    wrapped.call((1,)).await;
    let before = Report::from_recorder(&recorder).unwrap();
    wrapped.call((1,)).await;
    let after = Report::from_recorder(&recorder).unwrap();

    assert_eq!(before.rows().len(), 1);
    assert_eq!(after.rows().len(), 1);
    assert!(after.rows()[0].nanos > before.rows()[0].nanos);
}

#[tokio::test]
async fn test_macro_and_crate_paths_resolve_together() {
    // `timed` names both the crate and the macro imported above.
    let recorder = timed::Recorder::new();
    let by_macro = timed!(task_a, recorder.clone());
    let by_path = timed::Timed::wrap_with_recorder(task_a, recorder.clone());

    by_macro.call((1,)).await;
    by_path.call((1,)).await;

    assert_eq!(by_macro.identity(), by_path.identity());
    let entries = timed::aggregate(&recorder.read_all()).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].function, "scenario_tests.task_a");
    assert_eq!(recorder.len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_spawned_tasks_share_recorder() {
    let recorder = Recorder::new();
    let wrapped = std::sync::Arc::new(timed!(task_b, recorder.clone()));

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let wrapped = wrapped.clone();
            tokio::spawn(async move { wrapped.call((1,)).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }

    let report = Report::from_recorder(&recorder).unwrap();
    assert_eq!(recorder.len(), 16);
    assert_eq!(report.rows().len(), 1);
}
