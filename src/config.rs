//! Process configuration, resolved once at startup

use crate::storage::{MemoryStore, NoteStore, OpenStore, SqliteStore, StorageResult};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Label a note must carry before the server will modify it
pub const DEFAULT_LABEL: &str = "keep-mcp";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8001;
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(10);

/// Immutable settings shared by the policy gate, the API and the transports
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Allow modifying notes that lack the protective label
    pub unsafe_mode: bool,
    pub label: String,
    /// SQLite file; `None` means the per-user data directory
    pub db: Option<PathBuf>,
    /// Keep notes in process memory instead of SQLite
    pub memory: bool,
    /// Upper bound on a single store load or save
    pub store_timeout: Duration,
    pub host: String,
    pub port: u16,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            unsafe_mode: false,
            label: DEFAULT_LABEL.to_string(),
            db: None,
            memory: false,
            store_timeout: DEFAULT_STORE_TIMEOUT,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl Settings {
    /// The SQLite path in effect
    pub fn db_path(&self) -> PathBuf {
        self.db.clone().unwrap_or_else(default_db_path)
    }

    /// Open the store these settings select
    pub fn open_store(&self) -> StorageResult<Arc<dyn NoteStore>> {
        if self.memory {
            return Ok(Arc::new(MemoryStore::new()));
        }
        Ok(Arc::new(SqliteStore::open(self.db_path())?))
    }

    /// `host:port` for the REST listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Get the default database path (~/.local/share/keep-mcp/notes.db)
pub fn default_db_path() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    data_dir.join("keep-mcp").join("notes.db")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let settings = Settings::default();
        assert!(!settings.unsafe_mode);
        assert_eq!(settings.label, "keep-mcp");
        assert_eq!(settings.bind_addr(), "0.0.0.0:8001");
        assert_eq!(settings.store_timeout, Duration::from_secs(10));
    }

    #[test]
    fn explicit_db_path_wins() {
        let settings = Settings {
            db: Some(PathBuf::from("/tmp/notes.db")),
            ..Settings::default()
        };
        assert_eq!(settings.db_path(), PathBuf::from("/tmp/notes.db"));
        assert!(default_db_path().ends_with("keep-mcp/notes.db"));
    }

    #[tokio::test]
    async fn memory_flag_opens_an_empty_store() {
        let settings = Settings {
            memory: true,
            ..Settings::default()
        };
        let store = settings.open_store().unwrap();
        assert!(store.list().await.unwrap().is_empty());
    }
}
