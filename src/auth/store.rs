use std::fs;
use std::io::Write;
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TadoError};

/// Durable storage for the refresh token.
///
/// Only the refresh token is persisted; access tokens are short-lived and
/// re-derived on resume.
pub trait TokenSink: Send + Sync {
    fn load(&self) -> Result<Option<String>>;
    fn save(&self, refresh_token: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// File-backed sink writing `{"refresh_token": "..."}`.
///
/// # Example
/// ```no_run
/// use tado_client::auth::{FileTokenSink, TokenSink};
///
/// let sink = FileTokenSink::new(FileTokenSink::default_path());
/// sink.save("refresh")?;
/// # Ok::<(), tado_client::error::TadoError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FileTokenSink {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl FileTokenSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// `~/.tado/refresh_token.json`
    pub fn default_path() -> PathBuf {
        default_tado_dir().join("refresh_token.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenSink for FileTokenSink {
    fn load(&self) -> Result<Option<String>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(TadoError::Io(err)),
        };
        if raw.trim().is_empty() {
            return Ok(None);
        }
        let file: TokenFile = serde_json::from_str(&raw)?;
        Ok(file.refresh_token.filter(|token| !token.is_empty()))
    }

    fn save(&self, refresh_token: &str) -> Result<()> {
        let file = TokenFile {
            refresh_token: Some(refresh_token.to_string()),
        };
        let serialized = serde_json::to_vec(&file)?;
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        write_private(&self.path, &serialized)
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(TadoError::Io(err)),
        }
    }
}

/// Process-local sink.
#[derive(Debug, Default)]
pub struct MemoryTokenSink {
    value: Mutex<Option<String>>,
}

impl TokenSink for MemoryTokenSink {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.value.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn save(&self, refresh_token: &str) -> Result<()> {
        *self.value.lock().unwrap_or_else(|e| e.into_inner()) = Some(refresh_token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.value.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TokenFile {
    refresh_token: Option<String>,
}

fn default_tado_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".tado"))
        .unwrap_or_else(|| PathBuf::from(".tado"))
}

/// Replace `path` with `data` through a private sibling file and a rename.
fn write_private(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut temp_path = path.as_os_str().to_owned();
    temp_path.push(".tmp");
    let temp_path = PathBuf::from(temp_path);

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);

    let written = options
        .open(&temp_path)
        .and_then(|mut file| {
            file.write_all(data)?;
            file.sync_all()
        })
        .and_then(|()| fs::rename(&temp_path, path));
    if let Err(err) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(TadoError::Io(err));
    }
    Ok(())
}
