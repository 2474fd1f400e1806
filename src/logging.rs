//! File logging for host applications

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;

use crate::constants::LOG_FILE_NAME;

/// Install a global subscriber writing to `<dir>/freeman.log`.
///
/// Keep the returned guard alive for as long as logs should be flushed.
/// Returns `None` if a global subscriber was already installed.
pub fn init(dir: impl AsRef<Path>) -> Option<WorkerGuard> {
    let file_appender = tracing_appender::rolling::never(dir.as_ref(), LOG_FILE_NAME);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .try_init()
        .ok()?;
    Some(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_second_init_is_refused() {
        let temp = tempdir().unwrap();
        let first = init(temp.path());
        assert!(first.is_some());
        tracing::info!("logging initialized");
        assert!(init(temp.path()).is_none());
        drop(first);
        assert!(temp.path().join(LOG_FILE_NAME).exists());
    }
}
