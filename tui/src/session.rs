use std::{fs, io::ErrorKind, path::PathBuf};

use anyhow::Context;
use comms::types::AuthSession;

/// Persists the session as a single JSON file, surviving restarts.
///
/// The file is the only thing the client stores locally; everything else is
/// rebuilt from server responses after login.
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Restores the persisted session, if any. Corrupted content is
    /// discarded and removed rather than surfaced; the user just logs in again.
    pub fn load(&self) -> Option<AuthSession> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return None,
            Err(err) => {
                tracing::warn!("could not read the session file: {}", err);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(session) => Some(session),
            Err(err) => {
                tracing::warn!("discarding corrupted session file: {}", err);
                self.clear();
                None
            }
        }
    }

    pub fn save(&self, session: &AuthSession) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("could not create the session directory")?;
        }

        fs::write(&self.path, serde_json::to_string(session)?)
            .context("could not write the session file")?;

        Ok(())
    }

    pub fn clear(&self) {
        if let Err(err) = fs::remove_file(&self.path) {
            if err.kind() != ErrorKind::NotFound {
                tracing::warn!("could not remove the session file: {}", err);
            }
        }
    }
}
