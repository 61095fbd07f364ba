//! File access that tolerates editors and scanners touching the same files
//!
//! Reads retry a bounded number of times on transient errors. Writes go to a temporary file
//! in the destination directory and are moved into place with an atomic rename, so a reader
//! sees either the old content or the new content, never a torn file.

use log::{debug, warn};
use std::io::{self, ErrorKind, Write};
use std::path::Path;
use std::thread;
use std::time::Duration;
use tempfile::NamedTempFile;

const DEFAULT_ATTEMPTS: u32 = 10;
const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// How often, and how patiently, to retry a transient failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            delay,
        }
    }

    /// One attempt, no waiting
    pub fn immediate() -> Self {
        Self::new(1, Duration::ZERO)
    }

    fn run<T>(&self, what: &str, path: &Path, mut op: impl FnMut() -> io::Result<T>) -> io::Result<T> {
        let mut attempt = 1;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(err) if is_transient(&err) && attempt < self.attempts => {
                    warn!(
                        "{} {} failed (attempt {}/{}): {}",
                        what,
                        path.display(),
                        attempt,
                        self.attempts,
                        err
                    );
                    thread::sleep(self.delay);
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_ATTEMPTS, DEFAULT_RETRY_DELAY)
    }
}

fn is_transient(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::NotFound
            | ErrorKind::PermissionDenied
            | ErrorKind::Interrupted
            | ErrorKind::WouldBlock
    )
}

/// Read a whole file, retrying transient failures
pub fn safe_read(path: impl AsRef<Path>, policy: &RetryPolicy) -> io::Result<Vec<u8>> {
    let path = path.as_ref();
    let bytes = policy.run("reading", path, || std::fs::read(path))?;
    debug!("read {} bytes from {}", bytes.len(), path.display());
    Ok(bytes)
}

/// Replace `path` with `bytes` atomically
///
/// The parent directory must exist. The temporary file lives next to the destination so
/// the final rename never crosses a filesystem.
pub fn safe_write(path: impl AsRef<Path>, bytes: &[u8], policy: &RetryPolicy) -> io::Result<()> {
    let path = path.as_ref();
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = NamedTempFile::new_in(parent)?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;

    let mut pending = Some(temp);
    policy.run("replacing", path, || {
        let Some(temp) = pending.take() else {
            return Err(io::Error::new(ErrorKind::Other, "temporary file already consumed"));
        };
        match temp.persist(path) {
            Ok(_) => Ok(()),
            Err(err) => {
                pending = Some(err.file);
                Err(err.error)
            }
        }
    })?;

    debug!("wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.txt");
        let policy = RetryPolicy::immediate();

        safe_write(&path, b"first", &policy).unwrap();
        safe_write(&path, b"second", &policy).unwrap();

        assert_eq!(safe_read(&path, &policy).unwrap(), b"second");
        // only the destination remains, no leftover temporary files
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_read_missing_gives_up() {
        let dir = TempDir::new().unwrap();
        let policy = RetryPolicy::new(3, Duration::from_millis(1));
        let err = safe_read(dir.path().join("missing"), &policy).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_retry_counts_attempts() {
        let policy = RetryPolicy::new(4, Duration::ZERO);
        let mut calls = 0;
        let result: io::Result<()> = policy.run("testing", Path::new("x"), || {
            calls += 1;
            Err(io::Error::new(ErrorKind::NotFound, "gone"))
        });
        assert!(result.is_err());
        assert_eq!(calls, 4);
    }

    #[test]
    fn test_permanent_errors_are_not_retried() {
        let policy = RetryPolicy::new(4, Duration::ZERO);
        let mut calls = 0;
        let result: io::Result<()> = policy.run("testing", Path::new("x"), || {
            calls += 1;
            Err(io::Error::new(ErrorKind::InvalidData, "bad"))
        });
        assert!(result.is_err());
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_zero_attempts_still_tries_once() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).attempts, 1);
    }
}
