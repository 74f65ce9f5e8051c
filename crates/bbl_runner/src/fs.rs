//! File-system port used by the executors.
//!
//! Executors write templates, variables and state blobs into their working
//! directory before running a tool and read results back afterwards. Going
//! through [`FileIo`] lets tests inject failures without touching globals.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// File operations needed by the executors.
pub trait FileIo: Send + Sync {
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Write `contents`, creating parent directories as needed.
    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

    /// Like [`FileIo::write`], but only the owner may read the file.
    fn write_private(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

    fn exists(&self, path: &Path) -> bool;

    fn remove_dir_all(&self, path: &Path) -> io::Result<()>;
}

/// [`FileIo`] backed by the local file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl FileIo for LocalFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, contents)
    }

    fn write_private(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(path)?;
        // mode() only applies to newly created files
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(0o600))?;
        }
        file.write_all(contents)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        match fs::remove_dir_all(path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}
