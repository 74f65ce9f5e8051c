//! State persistence.
//!
//! The state lives in `<state-dir>/bbl-state.json`. A missing file means no
//! environment exists yet; a file that exists but does not parse is an error,
//! never silently replaced.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{StateError, StateResult};
use crate::model::{State, STATE_VERSION};

pub const STATE_FILE: &str = "bbl-state.json";
const STATE_BACKUP: &str = "bbl-state.json.backup";
const STATE_TMP: &str = "bbl-state.json.tmp";
const TERRAFORM_DIR: &str = "terraform";
const BOSH_DIR: &str = "bosh";

/// Reads and writes the state file of one state directory.
#[derive(Debug, Clone)]
pub struct Store {
    dir: PathBuf,
}

impl Store {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn state_path(&self) -> PathBuf {
        self.dir.join(STATE_FILE)
    }

    fn backup_path(&self) -> PathBuf {
        self.dir.join(STATE_BACKUP)
    }

    /// Working directory for terraform.
    pub fn terraform_dir(&self) -> PathBuf {
        self.dir.join(TERRAFORM_DIR)
    }

    /// Root of the bosh working directories.
    pub fn bosh_dir(&self) -> PathBuf {
        self.dir.join(BOSH_DIR)
    }

    /// Create the per-tool working directories.
    pub fn ensure_dirs(&self) -> StateResult<()> {
        for dir in [
            self.terraform_dir(),
            self.bosh_dir().join("jumpbox"),
            self.bosh_dir().join("director"),
            self.bosh_dir().join("cloudconfig"),
        ] {
            fs::create_dir_all(&dir)?;
        }
        Ok(())
    }

    pub fn exists(&self) -> bool {
        self.state_path().exists()
    }

    /// Load the current state.
    pub fn get(&self) -> StateResult<State> {
        let path = self.state_path();
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("State file not found at {:?}, returning empty state", path);
                return Ok(State::default());
            }
            Err(e) => {
                warn!("Failed to read state file {:?}: {}", path, e);
                return Err(e.into());
            }
        };

        let state: State = serde_json::from_str(&content).map_err(|source| {
            warn!("Failed to parse state file {:?}: {}", path, source);
            StateError::Corrupt {
                path: path.clone(),
                source,
            }
        })?;

        if state.version > STATE_VERSION {
            return Err(StateError::UnsupportedVersion {
                found: state.version,
                supported: STATE_VERSION,
            });
        }

        debug!("Loaded state for environment {:?}", state.env_id);
        Ok(state)
    }

    /// Save the state, keeping the previous file as a backup.
    pub fn set(&self, state: &State) -> StateResult<()> {
        fs::create_dir_all(&self.dir)?;

        let mut state = state.clone();
        state.version = STATE_VERSION;
        let content = serde_json::to_string_pretty(&state)?;

        // The current file stays in place until the new one is complete.
        let tmp = self.dir.join(STATE_TMP);
        fs::write(&tmp, content)?;

        let path = self.state_path();
        if path.exists() {
            fs::copy(&path, self.backup_path())?;
        }
        fs::rename(&tmp, &path)?;

        debug!("Saved state for environment {:?}", state.env_id);
        Ok(())
    }

    /// Remove the state file, its backup and the tool working directories.
    pub fn delete(&self) -> StateResult<()> {
        for file in [self.state_path(), self.backup_path(), self.dir.join(STATE_TMP)] {
            match fs::remove_file(&file) {
                Err(e) if e.kind() != io::ErrorKind::NotFound => return Err(e.into()),
                _ => {}
            }
        }
        for dir in [self.terraform_dir(), self.bosh_dir()] {
            match fs::remove_dir_all(&dir) {
                Err(e) if e.kind() != io::ErrorKind::NotFound => return Err(e.into()),
                _ => {}
            }
        }
        debug!("Deleted state in {:?}", self.dir);
        Ok(())
    }
}
