//! # Session
//!
//! The signed-in user's credentials. A [`Session`] is produced by logging in
//! or registering, handed by reference to every authenticated call, and
//! dropped on logout or when the backend rejects its token.
//!
//! The CLI keeps the session between invocations in a small JSON file; see
//! [`Session::save`] and [`Session::load`].

use std::{fs, io::ErrorKind, path::Path};

use eyre::{Result, WrapErr};
use roombook_core::{errors::BookingError, models::user::UserInfo};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user: Option<UserInfo>,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            user: None,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn user(&self) -> Option<&UserInfo> {
        self.user.as_ref()
    }

    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(UserInfo::is_admin)
    }

    pub fn with_user(mut self, user: UserInfo) -> Self {
        self.user = Some(user);
        self
    }

    /// Swaps in a re-issued token, as returned after a profile update.
    pub fn refresh(&mut self, token: String, user: UserInfo) {
        self.token = token;
        self.user = Some(user);
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
            .wrap_err_with(|| format!("Failed to write session file {}", path.display()))?;
        debug!(path = %path.display(), "session saved");
        Ok(())
    }

    /// Loads a saved session; a missing file means nobody is logged in.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        let json = match fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e)
                    .wrap_err_with(|| format!("Failed to read session file {}", path.display()));
            }
        };

        let session = serde_json::from_str(&json)
            .wrap_err_with(|| format!("Corrupt session file {}", path.display()))?;
        Ok(Some(session))
    }

    /// Ends the session by removing its file, if any.
    pub fn clear(path: &Path) -> Result<()> {
        match fs::remove_file(path) {
            Ok(()) => {
                debug!(path = %path.display(), "session cleared");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e)
                .wrap_err_with(|| format!("Failed to remove session file {}", path.display())),
        }
    }

    /// Removes the stored session if `error` says the backend rejected its token.
    ///
    /// Returns whether the file was cleared.
    pub fn clear_if_rejected(path: &Path, error: &BookingError) -> Result<bool> {
        if !error.is_session_expired() {
            return Ok(false);
        }
        Self::clear(path)?;
        Ok(true)
    }
}

// Keep the token out of logs.
impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("user", &self.user)
            .finish()
    }
}
