// tests/supervisor_fake_backend.rs

mod common;

use std::time::Duration;

use common::{FakeProcessBackend, RecordingReporter, ScriptedChangeSource, SIGTERM};
use tokio::sync::mpsc;
use tokio::time::Instant;
use watchserve::engine::{Report, Supervisor, SupervisorOptions};
use watchserve::errors::WatchserveError;
use watchserve::exec::{ExitInfo, LaunchSpec, StopPolicy};

fn launch() -> LaunchSpec {
    LaunchSpec::new("php", "bin/swoft", "http:start")
}

fn options(stop_timeout: u64) -> SupervisorOptions {
    SupervisorOptions {
        interval: Duration::from_secs(3),
        restart_delay: Duration::from_secs(3),
        stop: StopPolicy::with_timeout(Duration::from_secs(stop_timeout)),
        debug: false,
    }
}

/// Send a shutdown request after `after` of (paused) time.
fn shutdown_after(after: Duration) -> mpsc::Receiver<()> {
    let (tx, rx) = mpsc::channel(1);
    tokio::spawn(async move {
        tokio::time::sleep(after).await;
        let _ = tx.send(()).await;
    });
    rx
}

#[tokio::test(start_paused = true)]
async fn test_crashed_child_restarts_after_backoff_without_change() {
    common::init_tracing();

    let backend = FakeProcessBackend::new();
    backend.exit_on_spawn(1);
    let source = ScriptedChangeSource::new();
    let reporter = RecordingReporter::new();
    let start = Instant::now();

    Supervisor::new(launch(), options(45), backend.clone(), source.clone())
        .with_reporter(Box::new(reporter.clone()))
        .with_shutdown(shutdown_after(Duration::from_secs(10)))
        .run()
        .await
        .unwrap();

    assert_eq!(backend.spawned_pids(), vec![100, 101]);
    let times = backend.spawn_times();
    assert!(times[0] - start < Duration::from_millis(1));
    let gap = times[1] - times[0];
    assert!(
        gap >= Duration::from_secs(3) && gap < Duration::from_secs(4),
        "restart came after {gap:?}"
    );

    let reports = reporter.reports();
    assert!(reports.contains(&Report::Exited(ExitInfo {
        pid: 100,
        code: Some(1),
        signal: None
    })));
    assert!(reports.contains(&Report::Restarting {
        delay: Duration::from_secs(3)
    }));
    assert_eq!(reporter.count(|r| matches!(r, Report::Changed(_))), 0);
    assert!(!backend.overlap_detected());
}

#[tokio::test(start_paused = true)]
async fn test_child_exit_between_checks_is_restarted() {
    let backend = FakeProcessBackend::new();
    let handle = backend.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(4500)).await;
        handle.exit_current(255);
    });

    Supervisor::new(launch(), options(45), backend.clone(), ScriptedChangeSource::new())
        .with_shutdown(shutdown_after(Duration::from_secs(11)))
        .run()
        .await
        .unwrap();

    assert_eq!(backend.spawned_pids(), vec![100, 101]);
    let reaped = backend.reaped();
    assert_eq!(reaped[0].0.code, Some(255));
    // Reaped at the next check (t = 6s), restarted one backoff later.
    let gap = backend.spawn_times()[1] - reaped[0].1;
    assert!(gap >= Duration::from_secs(3) && gap < Duration::from_secs(4));
}

#[tokio::test(start_paused = true)]
async fn test_change_stops_old_child_before_starting_new_one() {
    let backend = FakeProcessBackend::new();
    let source = ScriptedChangeSource::new();
    let record = common::modified("app/Http/HomeController.php");
    source.quiet(1).change(record.clone());
    let reporter = RecordingReporter::new();

    Supervisor::new(launch(), options(45), backend.clone(), source.clone())
        .with_reporter(Box::new(reporter.clone()))
        .with_shutdown(shutdown_after(Duration::from_secs(11)))
        .run()
        .await
        .unwrap();

    assert_eq!(backend.spawned_pids(), vec![100, 101]);
    assert!(!backend.overlap_detected());
    assert_eq!(backend.terminate_count(100), 1);

    let sigterm = |pid| ExitInfo {
        pid,
        code: None,
        signal: Some(SIGTERM),
    };
    assert_eq!(
        reporter.reports(),
        vec![
            Report::Started { pid: 100 },
            Report::Changed(Some(record)),
            Report::Stopping { pid: 100 },
            Report::Stopped {
                pid: 100,
                exit: Some(sigterm(100))
            },
            Report::Started { pid: 101 },
            Report::Stopping { pid: 101 },
            Report::Stopped {
                pid: 101,
                exit: Some(sigterm(101))
            },
        ]
    );

    // The replacement starts only after the old child was reaped.
    let reaped_100 = backend.reaped()[0].1;
    assert!(backend.spawn_times()[1] >= reaped_100);
}

#[tokio::test(start_paused = true)]
async fn test_repeated_changes_never_overlap_children() {
    let backend = FakeProcessBackend::new();
    let source = ScriptedChangeSource::new();
    source
        .change(common::modified("app/a.php"))
        .quiet(1)
        .change(common::modified("config/b.php"))
        .change(common::modified("app/c.php"));

    Supervisor::new(launch(), options(45), backend.clone(), source.clone())
        .with_shutdown(shutdown_after(Duration::from_secs(29)))
        .run()
        .await
        .unwrap();

    assert_eq!(backend.spawned_pids(), vec![100, 101, 102, 103]);
    assert!(!backend.overlap_detected());
    assert_eq!(backend.current_pid(), None);
}

#[tokio::test(start_paused = true)]
async fn test_stop_timeout_ends_loop_without_new_child() {
    let backend = FakeProcessBackend::ignoring_sigterm();
    let source = ScriptedChangeSource::new();
    source.change(common::modified("app/a.php"));
    let reporter = RecordingReporter::new();
    let start = Instant::now();

    let result = Supervisor::new(launch(), options(5), backend.clone(), source)
        .with_reporter(Box::new(reporter.clone()))
        .run()
        .await;

    match result {
        Err(WatchserveError::StopTimeout { pid, timeout_secs }) => {
            assert_eq!(pid, 100);
            assert_eq!(timeout_secs, 5);
        }
        other => panic!("Expected StopTimeout, got: {:?}", other),
    }

    assert_eq!(backend.spawned_pids(), vec![100]);
    assert_eq!(backend.current_pid(), Some(100));
    // SIGTERM is re-sent once per retry until the timeout expires.
    assert_eq!(backend.terminate_count(100), 5);
    assert!(Instant::now() - start >= Duration::from_secs(5));
    assert_eq!(
        reporter.reports().last(),
        Some(&Report::StopFailed {
            pid: 100,
            timeout: Duration::from_secs(5)
        })
    );
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_running_child() {
    let backend = FakeProcessBackend::new();
    let source = ScriptedChangeSource::new();

    Supervisor::new(launch(), options(45), backend.clone(), source.clone())
        .with_shutdown(shutdown_after(Duration::from_secs(7)))
        .run()
        .await
        .unwrap();

    assert_eq!(backend.spawned_pids(), vec![100]);
    assert_eq!(backend.terminate_count(100), 1);
    assert_eq!(backend.current_pid(), None);
    // Checks at t = 0, 3 and 6.
    assert_eq!(source.polls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_spawn_failure_is_fatal() {
    let backend = FakeProcessBackend::new();
    backend.fail_spawns();

    let result = Supervisor::new(launch(), options(45), backend.clone(), ScriptedChangeSource::new())
        .run()
        .await;

    assert!(matches!(result, Err(WatchserveError::SpawnFailed(_))));
    assert!(backend.spawned_pids().is_empty());
}
