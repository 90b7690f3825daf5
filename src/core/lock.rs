//! Deployment lock.
//!
//! Mutating runs against one `(project, environment)` take an exclusive
//! advisory lock on `{state_dir}/{prefix}.lock`. The lock file records who
//! holds it so a second run can say who it is waiting on.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::{debug, trace};

use crate::core::domain::Prefix;
use crate::error::{LockError, Result};

/// Held lock. Released on drop.
#[derive(Debug)]
pub struct DeployLock {
    file: File,
    path: PathBuf,
}

impl DeployLock {
    /// Take the lock for `prefix`, failing immediately if it is held.
    ///
    /// # Errors
    ///
    /// Returns `LockError::Held` naming the current holder, or
    /// `LockError::Open` if the lock file cannot be created.
    pub fn acquire(state_dir: &Path, prefix: &Prefix) -> Result<Self> {
        let path = state_dir.join(format!("{}.lock", prefix));
        let open_err = |source| LockError::Open {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(state_dir).map_err(open_err)?;
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(open_err)?;

        if file.try_lock_exclusive().is_err() {
            let mut holder = String::new();
            let _ = file.read_to_string(&mut holder);
            let holder = holder.trim();
            return Err(LockError::Held {
                path: path.clone(),
                holder: if holder.is_empty() {
                    "unknown holder".to_string()
                } else {
                    holder.to_string()
                },
            }
            .into());
        }

        let record = format!(
            "{} pid {} since {}",
            whoami::username(),
            std::process::id(),
            chrono::Utc::now().to_rfc3339()
        );
        file.set_len(0).map_err(open_err)?;
        file.seek(SeekFrom::Start(0)).map_err(open_err)?;
        file.write_all(record.as_bytes()).map_err(open_err)?;
        file.flush().map_err(open_err)?;

        debug!(path = %path.display(), "lock acquired");
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DeployLock {
    fn drop(&mut self) {
        let _ = self.file.set_len(0);
        let _ = FileExt::unlock(&self.file);
        trace!(path = %self.path.display(), "lock released");
    }
}
