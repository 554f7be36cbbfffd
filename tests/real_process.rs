// tests/real_process.rs
#![cfg(unix)]

mod common;

use std::fs;
use std::path::Path;
use std::time::Duration;

use common::RecordingReporter;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tempfile::TempDir;
use tokio::sync::mpsc;
use watchserve::engine::{Report, Supervisor, SupervisorOptions};
use watchserve::exec::{
    stop_child, LaunchSpec, ProcessBackend, RealProcessBackend, StopOutcome, StopPolicy,
};
use watchserve::watch::{ChangeDetector, FilterSpec, WatchFilter};

fn script(dir: &Path, name: &str, body: &str) -> LaunchSpec {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    LaunchSpec::new("sh", &path, "").with_cwd(dir)
}

fn quick_policy(timeout_ms: u64) -> StopPolicy {
    StopPolicy {
        timeout: Duration::from_millis(timeout_ms),
        retry: Duration::from_millis(100),
    }
}

#[tokio::test]
async fn test_exit_code_is_reported() {
    let tmp = TempDir::new().unwrap();
    let spec = script(tmp.path(), "fail.sh", "exit 3\n");
    let mut backend = RealProcessBackend::new();

    let pid = backend.spawn(&spec).unwrap();

    let exit = common::with_timeout(async {
        loop {
            if let Some(exit) = backend.try_wait().unwrap() {
                return exit;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await;

    assert_eq!(exit.pid, pid);
    assert_eq!(exit.code, Some(3));
    assert!(!backend.is_alive(pid));
}

#[tokio::test]
async fn test_graceful_stop_of_cooperative_child() {
    let tmp = TempDir::new().unwrap();
    let spec = script(tmp.path(), "serve.sh", "exec sleep 30\n");
    let mut backend = RealProcessBackend::new();

    let pid = backend.spawn(&spec).unwrap();
    assert!(backend.is_alive(pid));

    let outcome = common::with_timeout(stop_child(&mut backend, pid, quick_policy(3000)))
        .await
        .unwrap();

    match outcome {
        StopOutcome::Stopped(Some(exit)) => {
            assert_eq!(exit.pid, pid);
            assert_eq!(exit.signal, Some(Signal::SIGTERM as i32));
        }
        other => panic!("Expected a reaped child, got: {:?}", other),
    }
    assert!(!backend.is_alive(pid));
}

#[tokio::test]
async fn test_child_ignoring_sigterm_times_out() {
    let tmp = TempDir::new().unwrap();
    let spec = script(
        tmp.path(),
        "stubborn.sh",
        "trap '' TERM\nwhile true; do sleep 0.1; done\n",
    );
    let mut backend = RealProcessBackend::new();
    let pid = backend.spawn(&spec).unwrap();

    // Give the shell time to install the trap.
    tokio::time::sleep(Duration::from_millis(200)).await;

    let outcome = common::with_timeout(stop_child(&mut backend, pid, quick_policy(500)))
        .await
        .unwrap();
    assert_eq!(outcome, StopOutcome::TimedOut);
    assert!(backend.is_alive(pid));

    kill(Pid::from_raw(pid as i32), Signal::SIGKILL).unwrap();
    common::with_timeout(async {
        while backend.try_wait().unwrap().is_none() {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await;
}

#[tokio::test]
async fn test_spawn_of_missing_interpreter_fails() {
    let mut backend = RealProcessBackend::new();
    let spec = LaunchSpec::new("/definitely/not/an/interpreter", "bin/swoft", "http:start");

    let err = backend.spawn(&spec).unwrap_err();
    assert!(matches!(err, watchserve::errors::WatchserveError::SpawnFailed(_)));
}

#[tokio::test]
async fn test_edit_restarts_real_child() {
    common::init_tracing();
    let tmp = TempDir::new().unwrap();
    let app = tmp.path().join("app");
    fs::create_dir(&app).unwrap();
    let watched = app.join("a.php");
    fs::write(&watched, "<?php // v1").unwrap();

    let mut detector = ChangeDetector::new(WatchFilter::new(&FilterSpec::default()).unwrap());
    detector.watch([&app]);
    detector.initialize_baseline().unwrap();

    let spec = script(tmp.path(), "serve.sh", "exec sleep 30\n");
    let options = SupervisorOptions {
        interval: Duration::from_millis(200),
        restart_delay: Duration::from_millis(200),
        stop: quick_policy(3000),
        debug: false,
    };
    let reporter = RecordingReporter::new();
    let (tx, rx) = mpsc::channel(1);

    let observer = reporter.clone();
    let edited = watched.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        fs::write(&edited, "<?php // v2").unwrap();
        while observer.count(|r| matches!(r, Report::Started { .. })) < 2 {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        let _ = tx.send(()).await;
    });

    let result = common::with_timeout(
        Supervisor::new(spec, options, RealProcessBackend::new(), detector)
            .with_reporter(Box::new(reporter.clone()))
            .with_shutdown(rx)
            .run(),
    )
    .await;
    assert!(result.is_ok(), "supervisor failed: {:?}", result);

    let reports = reporter.reports();
    let changed = reports.iter().find_map(|r| match r {
        Report::Changed(Some(record)) => Some(record.clone()),
        _ => None,
    });
    assert_eq!(changed.unwrap().path, watched);
    assert_eq!(reporter.count(|r| matches!(r, Report::Started { .. })), 2);
    assert!(!reports.iter().any(|r| matches!(r, Report::StopFailed { .. })));
}
