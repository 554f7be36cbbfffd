#![allow(dead_code, unused_imports)]

pub use watchserve_test_utils::builders;
pub use watchserve_test_utils::fake_backend::{FakeEvent, FakeProcessBackend, SIGTERM};
pub use watchserve_test_utils::recording::{RecordingReporter, ScriptedChangeSource};
pub use watchserve_test_utils::{init_tracing, with_timeout};

use std::path::PathBuf;
use watchserve::watch::ChangeRecord;

/// A change record for a modified file.
pub fn modified(path: &str) -> ChangeRecord {
    ChangeRecord {
        path: PathBuf::from(path),
        old_hash: Some("old".to_string()),
        new_hash: Some("new".to_string()),
    }
}
