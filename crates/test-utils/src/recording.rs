use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use watchserve::engine::{ChangeSource, Report, Reporter};
use watchserve::errors::Result;
use watchserve::watch::ChangeRecord;

/// Reporter that keeps every report for later assertions.
#[derive(Debug, Clone, Default)]
pub struct RecordingReporter {
    reports: Arc<Mutex<Vec<Report>>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<Report> {
        self.reports.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Report) -> bool) -> usize {
        self.reports().iter().filter(|r| pred(r)).count()
    }
}

impl Reporter for RecordingReporter {
    fn report(&mut self, report: &Report) {
        self.reports.lock().unwrap().push(report.clone());
    }
}

#[derive(Debug, Default)]
struct Script {
    /// One entry per upcoming check; `Some` reports a change.
    queue: VecDeque<Option<ChangeRecord>>,
    last: Option<ChangeRecord>,
    polls: usize,
}

/// Change source driven by the test instead of the filesystem.
///
/// Checks past the end of the script report "no change".
#[derive(Debug, Clone, Default)]
pub struct ScriptedChangeSource {
    script: Arc<Mutex<Script>>,
}

impl ScriptedChangeSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `n` checks that see nothing.
    pub fn quiet(&self, n: usize) -> &Self {
        let mut script = self.script.lock().unwrap();
        script.queue.extend(std::iter::repeat_n(None, n));
        self
    }

    /// Queue a check that reports `record` as changed.
    pub fn change(&self, record: ChangeRecord) -> &Self {
        self.script.lock().unwrap().queue.push_back(Some(record));
        self
    }

    pub fn polls(&self) -> usize {
        self.script.lock().unwrap().polls
    }
}

impl ChangeSource for ScriptedChangeSource {
    fn has_changed(&mut self) -> Result<bool> {
        let mut script = self.script.lock().unwrap();
        script.polls += 1;
        match script.queue.pop_front() {
            Some(Some(record)) => {
                script.last = Some(record);
                Ok(true)
            }
            _ => {
                script.last = None;
                Ok(false)
            }
        }
    }

    fn changed_info(&self) -> Option<ChangeRecord> {
        self.script.lock().unwrap().last.clone()
    }
}
