use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::debug;
use url::Url;

use crate::error::{Error, Result};

mod token;

pub use token::TokenStore;

const APP_DIR: &str = "shortlinks";
const SERVER_FILE: &str = "server.txt";

/// Directory holding the persisted server and token files.
///
/// Resolved once at startup and handed to each store, so a change to the
/// environment mid-run never moves the files.
#[derive(Debug, Clone)]
pub struct ConfigDir {
    root: PathBuf,
}

impl ConfigDir {
    /// `$XDG_CONFIG_HOME/shortlinks`, falling back to `~/.config/shortlinks`.
    pub fn resolve() -> Result<Self> {
        Self::resolve_from(|key| std::env::var(key).ok(), dirs::home_dir())
    }

    /// Same as [`ConfigDir::resolve`] with the environment and home directory injected.
    pub fn resolve_from<FEnv>(env: FEnv, home: Option<PathBuf>) -> Result<Self>
    where
        FEnv: Fn(&str) -> Option<String>,
    {
        let base = env("XDG_CONFIG_HOME")
            .map(|path| path.trim().to_string())
            .filter(|path| !path.is_empty())
            .map(PathBuf::from)
            .or_else(|| home.map(|home| home.join(".config")))
            .ok_or(Error::NoConfigDir)?;

        Ok(Self::at(base.join(APP_DIR)))
    }

    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn server_store(&self) -> ServerStore {
        ServerStore {
            path: self.root.join(SERVER_FILE),
        }
    }

    pub fn token_store(&self) -> TokenStore {
        TokenStore::new(&self.root)
    }
}

/// Persisted default server endpoint (`server.txt`).
#[derive(Debug, Clone)]
pub struct ServerStore {
    path: PathBuf,
}

impl ServerStore {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing file is `Ok(None)`; unparseable content is `ServerCorrupt`.
    pub fn get(&self) -> Result<Option<Url>> {
        let Some(content) = read_if_exists(&self.path)? else {
            return Ok(None);
        };

        let url = Url::parse(content.trim()).map_err(|source| Error::ServerCorrupt {
            path: self.path.clone(),
            source,
        })?;
        debug!(server = %url, "loaded saved server");
        Ok(Some(url))
    }

    pub fn set(&self, server: &Url) -> Result<()> {
        write_replacing(&self.path, server.as_str().as_bytes(), false)
    }
}

pub(crate) fn read_if_exists(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(Error::io(path, err)),
    }
}

/// Write `contents` to a sibling temp file, then rename it over `path`.
pub(crate) fn write_replacing(path: &Path, contents: &[u8], private: bool) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| Error::io(parent, err))?;
    }

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    let mut options = fs::OpenOptions::new();
    options.create(true).truncate(true).write(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        if private {
            options.mode(0o600);
        }
    }
    #[cfg(not(unix))]
    let _ = private;

    let mut file = options
        .open(&tmp_path)
        .map_err(|err| Error::io(&tmp_path, err))?;
    file.write_all(contents)
        .and_then(|()| file.sync_all())
        .map_err(|err| Error::io(&tmp_path, err))?;
    drop(file);

    fs::rename(&tmp_path, path).map_err(|err| Error::io(path, err))
}
