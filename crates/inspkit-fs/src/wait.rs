#![forbid(unsafe_code)]

//! Blocking wait for a file produced by another process.

use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

/// Polling parameters for [`wait_for_file`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitConfig {
    /// Give up after this long. Default 10 s.
    pub timeout: Duration,
    /// Delay between existence checks. Default 150 ms.
    pub poll_interval: Duration,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(10_000),
            poll_interval: Duration::from_millis(150),
        }
    }
}

impl WaitConfig {
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

/// How a wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Appeared,
    TimedOut,
}

impl WaitOutcome {
    #[must_use]
    pub fn appeared(self) -> bool {
        self == Self::Appeared
    }
}

/// Poll until `path` exists or `config.timeout` elapses.
///
/// The path is checked once before any sleep, so an existing file returns
/// immediately even with a zero timeout. A zero poll interval is treated as
/// one millisecond.
///
/// Never fails: a path that cannot be checked (permission denied, a file in
/// place of a parent directory) counts as not there yet.
pub fn wait_for_file(path: &Path, config: &WaitConfig) -> WaitOutcome {
    let start = Instant::now();
    let interval = config.poll_interval.max(Duration::from_millis(1));
    let mut polls = 0u32;

    loop {
        polls += 1;
        match path.try_exists() {
            Ok(true) => {
                debug!(path = %path.display(), polls, "file appeared");
                return WaitOutcome::Appeared;
            }
            Ok(false) => {}
            Err(error) => trace!(path = %path.display(), %error, "existence check failed"),
        }

        let elapsed = start.elapsed();
        if elapsed >= config.timeout {
            warn!(
                path = %path.display(),
                timeout_ms = config.timeout.as_millis() as u64,
                "timed out waiting for file"
            );
            return WaitOutcome::TimedOut;
        }
        thread::sleep(interval.min(config.timeout - elapsed));
    }
}
