use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use gblibx_exec::*;

// ---------------------------------------------------------------------------
// RunCmd
// ---------------------------------------------------------------------------

#[test]
fn test_large_output_does_not_deadlock() {
    let count = Arc::new(Mutex::new(0usize));
    let sink = Arc::clone(&count);
    let status = RunCmd::shell("i=0; while [ $i -lt 20000 ]; do echo line$i; i=$((i+1)); done")
        .stdout(move |_| *sink.lock().unwrap() += 1)
        .timeout(Duration::from_secs(30))
        .run()
        .unwrap();
    assert!(status.success());
    assert_eq!(*count.lock().unwrap(), 20000);
}

#[test]
fn test_script_in_temp_dir() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("data.txt"), "alpha\nbeta\n").unwrap();

    let (tx, rx) = mpsc::channel();
    let status = RunCmd::new(["cat", "data.txt"])
        .current_dir(dir.path())
        .stdout(move |line| tx.send(line.to_string()).unwrap())
        .run()
        .unwrap();

    assert_eq!(status.exit_code(), 0);
    assert_eq!(rx.iter().collect::<Vec<_>>(), vec!["alpha", "beta"]);
}

#[test]
fn test_same_sink_for_both_streams() {
    let lines = Arc::new(Mutex::new(Vec::new()));
    let out = Arc::clone(&lines);
    let err = Arc::clone(&lines);
    RunCmd::shell("echo out; echo err >&2")
        .stdout(move |l| out.lock().unwrap().push(format!("1:{l}")))
        .stderr(move |l| err.lock().unwrap().push(format!("2:{l}")))
        .run()
        .unwrap();

    let mut lines = lines.lock().unwrap().clone();
    lines.sort();
    assert_eq!(lines, vec!["1:out", "2:err"]);
}

#[test]
fn test_timeout_error_message() {
    let err = RunCmd::new(["sleep", "3"])
        .timeout(Duration::from_millis(50))
        .run()
        .unwrap_err();
    assert_eq!(err.to_string(), "sleep timed out after 50ms");
}

#[test]
fn test_run_command_stdout_joins_lines() {
    let text = run_command_stdout("printf a\\nb\\nc").unwrap();
    assert_eq!(text, "a\nb\nc");
    assert_eq!(run_command_stdout("true").unwrap(), "");
}

// ---------------------------------------------------------------------------
// Queue and batching
// ---------------------------------------------------------------------------

#[test]
fn test_queue_feeds_periodic_batches() {
    let queue = PriorityQueue::new();
    queue.insert_all([2, 9, 4]);

    let (tx, rx) = mpsc::channel();
    let work = PeriodicWork::new(Duration::from_millis(30), move |batch: Vec<i32>| {
        tx.send(batch).unwrap();
    });
    while let Some(job) = queue.pop() {
        work.add([job]);
    }

    let batch = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(batch, vec![9, 4, 2]);
}
