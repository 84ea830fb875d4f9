use std::path::PathBuf;
use std::time::Duration;

/// Voter-side configuration, constructed once at process start and handed
/// to components by reference. The core never reads the environment.
#[derive(Debug, Clone)]
pub struct VoterConfig {
    /// Directory holding the credential file. Created with mode 0700.
    pub storage_dir: PathBuf,
    /// Upper bound on the blocking wait for a submission receipt.
    pub submission_timeout: Duration,
}

impl VoterConfig {
    pub fn new(storage_dir: impl Into<PathBuf>) -> Self {
        VoterConfig {
            storage_dir: storage_dir.into(),
            submission_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_submission_timeout(mut self, timeout: Duration) -> Self {
        self.submission_timeout = timeout;
        self
    }
}

impl Default for VoterConfig {
    fn default() -> Self {
        VoterConfig::new("config")
    }
}
