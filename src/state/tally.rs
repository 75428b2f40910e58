use serde::{Deserialize, Serialize};
use std::fmt;

/// Running success/failure count reported by every stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTally {
    pub succeeded: u32,
    pub failed: u32,
    pub skipped: u32,
}

impl StageTally {
    pub fn success(&mut self) {
        self.succeeded += 1;
    }

    pub fn failure(&mut self) {
        self.failed += 1;
    }

    pub fn skip(&mut self) {
        self.skipped += 1;
    }

    /// Items the stage looked at, whatever the outcome
    pub fn total(&self) -> u32 {
        self.succeeded + self.failed + self.skipped
    }
}

impl fmt::Display for StageTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} succeeded, {} failed, {} skipped",
            self.succeeded, self.failed, self.skipped
        )
    }
}
