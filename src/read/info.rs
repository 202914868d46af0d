//! Result types for read operations.

/// Result of testing archive integrity.
///
/// Reports how many entries were tested, how many passed or failed, and why
/// each failure happened.
#[must_use = "test results should be checked to verify archive integrity"]
#[derive(Debug, Clone, Default)]
pub struct TestResult {
    /// Number of entries tested.
    pub entries_tested: usize,
    /// Number of entries that passed.
    pub entries_passed: usize,
    /// Number of entries that failed.
    pub entries_failed: usize,
    /// Detailed failures (entry name and error message).
    pub failures: Vec<(String, String)>,
}

impl TestResult {
    /// Returns true if all entries passed.
    pub fn is_ok(&self) -> bool {
        self.entries_failed == 0
    }

    /// Returns true if any entries failed.
    pub fn is_err(&self) -> bool {
        self.entries_failed > 0
    }
}
