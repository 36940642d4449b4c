use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{read_if_exists, write_replacing};
use crate::client::SessionToken;
use crate::error::{Error, Result};

const TOKEN_FILE: &str = "authToken.txt";

/// Cached session token (`authToken.txt`).
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub(super) fn new(config_dir: &Path) -> Self {
        Self {
            path: config_dir.join(TOKEN_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Ok(None)` means the user has to log in. An empty file counts as absent.
    pub fn get(&self) -> Result<Option<SessionToken>> {
        let token = read_if_exists(&self.path)?.and_then(SessionToken::new);
        debug!(present = token.is_some(), "checked cached token");
        Ok(token)
    }

    pub fn set(&self, token: &SessionToken) -> Result<()> {
        write_replacing(&self.path, token.as_str().as_bytes(), true)
    }

    /// Returns `true` when a token file was removed.
    pub fn clear(&self) -> Result<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(Error::io(&self.path, err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigDir;
    use tempfile::tempdir;

    fn token(raw: &str) -> SessionToken {
        SessionToken::new(raw.to_string()).unwrap()
    }

    #[test]
    fn token_roundtrip_is_exact() {
        let dir = tempdir().unwrap();
        let store = ConfigDir::at(dir.path()).token_store();

        for raw in ["tok123", "eyJhbGciOiJIUzI1NiJ9.e30.sig", " padded\ttoken \n"] {
            store.set(&token(raw)).unwrap();
            assert_eq!(store.get().unwrap().unwrap().as_str(), raw);
        }
    }

    #[test]
    fn missing_token_is_absent() {
        let dir = tempdir().unwrap();
        let store = ConfigDir::at(dir.path()).token_store();

        assert!(store.get().unwrap().is_none());
    }

    #[test]
    fn empty_token_file_is_absent() {
        let dir = tempdir().unwrap();
        let store = ConfigDir::at(dir.path()).token_store();
        fs::write(store.path(), "").unwrap();

        assert!(store.get().unwrap().is_none());
    }

    #[test]
    fn set_overwrites_longer_token() {
        let dir = tempdir().unwrap();
        let store = ConfigDir::at(dir.path()).token_store();

        store.set(&token("a-very-long-original-token")).unwrap();
        store.set(&token("short")).unwrap();

        assert_eq!(fs::read_to_string(store.path()).unwrap(), "short");
    }

    #[test]
    fn clear_removes_token() {
        let dir = tempdir().unwrap();
        let store = ConfigDir::at(dir.path()).token_store();
        store.set(&token("tok123")).unwrap();

        assert!(store.clear().unwrap());
        assert!(store.get().unwrap().is_none());
        assert!(!store.clear().unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn token_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let store = ConfigDir::at(dir.path()).token_store();
        store.set(&token("tok123")).unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
