use std::{
    fs::{File, OpenOptions},
    io::Write,
    path::PathBuf,
    process,
};

use anyhow::{anyhow, Context, Result};
use fs2::FileExt;

use crate::infrastructure::directories::ResolvedPaths;

const LOCK_FILENAME: &str = ".rustlefeed.lock";

/// Exclusive file lock on the data directory. Two readers sharing one
/// sqlite history would race the judged-log upserts, so a second instance
/// refuses to start. The lock releases when the process exits.
#[derive(Debug)]
pub struct InstanceGuard {
    _file: File,
    path: PathBuf,
}

impl InstanceGuard {
    pub fn acquire(paths: &ResolvedPaths) -> Result<Self> {
        let lock_path = paths.data_dir.join(LOCK_FILENAME);
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .with_context(|| format!("failed to open lock file {}", lock_path.display()))?;

        file.try_lock_exclusive().map_err(|_| {
            anyhow!(
                "another rustlefeed instance holds {}; refusing to start",
                lock_path.display()
            )
        })?;

        file.set_len(0)?;
        writeln!(file, "{}", process::id())?;
        tracing::info!(
            target: "lifecycle",
            pid = process::id(),
            lock = %lock_path.display(),
            "instance lock acquired"
        );

        Ok(Self {
            _file: file,
            path: lock_path,
        })
    }
}

impl Drop for InstanceGuard {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}
