use crate::EntryError;
use std::path::{Path, PathBuf};
use std::time::Duration;
use toolbox_runtime::EntryPoint;
use tracing::debug;

/// Process name of the entry point of every supported container.
pub const ENTRY_POINT_SENTINEL: &str = "toolbox";

/// Upper bound on the number of one-second sleeps spent waiting for init.
pub const INITIALIZED_TIMEOUT_SECS: u32 = 25;

/// Stamp file the container's init process creates once it is set up.
pub fn readiness_marker(runtime_dir: &Path, pid: i64) -> PathBuf {
    runtime_dir.join(format!("container-initialized-{pid}"))
}

/// Reject containers that predate the current entry point, and nonsense PIDs.
///
/// Runs before any look at the readiness marker.
pub fn check_entry_point(container: &str, entry_point: &EntryPoint) -> Result<(), EntryError> {
    if entry_point.process_name != ENTRY_POINT_SENTINEL {
        debug!(
            "container {container} runs '{}' as PID 1",
            entry_point.process_name
        );
        return Err(EntryError::UnsupportedContainer(container.to_owned()));
    }
    if entry_point.pid <= 0 {
        return Err(EntryError::InvalidEntryPoint(container.to_owned()));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitError {
    Timeout,
    Cancelled,
}

/// Bounded, cancellable poll with a fixed interval.
#[derive(Debug, Clone, Copy)]
pub struct ReadinessWaiter {
    attempts: u32,
    interval: Duration,
}

impl Default for ReadinessWaiter {
    fn default() -> Self {
        Self::new(INITIALIZED_TIMEOUT_SECS, Duration::from_secs(1))
    }
}

impl ReadinessWaiter {
    pub fn new(attempts: u32, interval: Duration) -> Self {
        Self { attempts, interval }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Check `ready`, sleeping between checks, until it holds or `attempts`
    /// sleeps have passed. Returns the number of sleeps taken.
    ///
    /// A condition that first holds at check `k` (counting from zero) returns
    /// `Ok(k)`. `cancelled` is consulted before every sleep.
    pub fn poll(
        &self,
        mut ready: impl FnMut() -> bool,
        cancelled: impl Fn() -> bool,
    ) -> Result<u32, WaitError> {
        let mut sleeps = 0;
        loop {
            if ready() {
                return Ok(sleeps);
            }
            if sleeps >= self.attempts {
                return Err(WaitError::Timeout);
            }
            if cancelled() {
                return Err(WaitError::Cancelled);
            }
            std::thread::sleep(self.interval);
            sleeps += 1;
        }
    }

    /// Wait for `marker` to appear on disk.
    pub fn wait_for_marker(
        &self,
        container: &str,
        marker: &Path,
        cancelled: impl Fn() -> bool,
    ) -> Result<u32, EntryError> {
        debug!("waiting for {}", marker.display());
        self.poll(|| marker.exists(), cancelled)
            .map_err(|e| match e {
                WaitError::Timeout => EntryError::InitializationTimeout(container.to_owned()),
                WaitError::Cancelled => EntryError::Cancelled(container.to_owned()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn instant(attempts: u32) -> ReadinessWaiter {
        ReadinessWaiter::new(attempts, Duration::ZERO)
    }

    fn entry_point(name: &str, pid: i64) -> EntryPoint {
        EntryPoint {
            process_name: name.to_owned(),
            pid,
        }
    }

    #[test]
    fn marker_path_layout() {
        assert_eq!(
            readiness_marker(Path::new("/run/user/1000/toolbox"), 4242),
            PathBuf::from("/run/user/1000/toolbox/container-initialized-4242")
        );
    }

    #[test]
    fn default_waiter_is_25_seconds() {
        let waiter = ReadinessWaiter::default();
        assert_eq!(waiter.attempts(), 25);
        assert_eq!(waiter.interval, Duration::from_secs(1));
    }

    #[test]
    fn ready_immediately_takes_no_sleep() {
        assert_eq!(instant(25).poll(|| true, || false), Ok(0));
    }

    #[test]
    fn ready_at_check_k_takes_k_sleeps() {
        for k in [1_u32, 7, 25] {
            let checks = Cell::new(0_u32);
            let sleeps = instant(25).poll(
                || {
                    let n = checks.get();
                    checks.set(n + 1);
                    n == k
                },
                || false,
            );
            assert_eq!(sleeps, Ok(k));
            assert_eq!(checks.get(), k + 1);
        }
    }

    #[test]
    fn never_ready_times_out_after_all_sleeps() {
        let checks = Cell::new(0_u32);
        let result = instant(25).poll(
            || {
                checks.set(checks.get() + 1);
                false
            },
            || false,
        );
        assert_eq!(result, Err(WaitError::Timeout));
        // One check before the first sleep and one after each sleep.
        assert_eq!(checks.get(), 26);
    }

    #[test]
    fn cancellation_stops_the_loop() {
        let checks = Cell::new(0_u32);
        let result = instant(25).poll(
            || {
                checks.set(checks.get() + 1);
                false
            },
            || checks.get() >= 3,
        );
        assert_eq!(result, Err(WaitError::Cancelled));
        assert_eq!(checks.get(), 3);
    }

    #[test]
    fn marker_created_while_waiting_is_seen() {
        let dir = tempfile::tempdir().unwrap();
        let marker = readiness_marker(dir.path(), 99);
        let checks = Cell::new(0_u32);
        let sleeps = instant(25)
            .poll(
                || {
                    checks.set(checks.get() + 1);
                    if checks.get() == 4 {
                        std::fs::write(&marker, "").unwrap();
                    }
                    marker.exists()
                },
                || false,
            )
            .unwrap();
        assert_eq!(sleeps, 3);
    }

    #[test]
    fn missing_marker_is_initialization_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let marker = readiness_marker(dir.path(), 1);
        let err = instant(2)
            .wait_for_marker("dev", &marker, || false)
            .unwrap_err();
        assert!(matches!(err, EntryError::InitializationTimeout(c) if c == "dev"));
    }

    #[test]
    fn interrupted_wait_is_cancelled() {
        let dir = tempfile::tempdir().unwrap();
        let marker = readiness_marker(dir.path(), 1);
        let err = instant(25)
            .wait_for_marker("dev", &marker, || true)
            .unwrap_err();
        assert!(matches!(err, EntryError::Cancelled(_)));
    }

    #[test]
    fn foreign_entry_point_is_unsupported() {
        let err = check_entry_point("old", &entry_point("bash", 12)).unwrap_err();
        assert!(matches!(err, EntryError::UnsupportedContainer(_)));
        assert!(err.to_string().contains("too old"));
    }

    #[test]
    fn entry_point_path_is_not_the_sentinel() {
        let err = check_entry_point("odd", &entry_point("/usr/local/bin/toolbox", 12)).unwrap_err();
        assert!(matches!(err, EntryError::UnsupportedContainer(_)));
    }

    #[test]
    fn sentinel_is_checked_before_pid() {
        let err = check_entry_point("old", &entry_point("sleep", 0)).unwrap_err();
        assert!(matches!(err, EntryError::UnsupportedContainer(_)));
    }

    #[test]
    fn non_positive_pid_is_invalid() {
        for pid in [0, -1] {
            let err = check_entry_point("dev", &entry_point("toolbox", pid)).unwrap_err();
            assert!(matches!(err, EntryError::InvalidEntryPoint(_)));
        }
        assert!(check_entry_point("dev", &entry_point("toolbox", 1)).is_ok());
    }
}
