//! Snapshot persistence.
//!
//! The whole database is written as one YAML document after every
//! successful mutation and read back once at startup. Files written by
//! older servers are accepted: `null` records are dropped, missing keys take
//! their defaults, and broken cross-references are repaired on load.

use async_trait::async_trait;
use newsroom_core::integrity::{audit, repair};
use newsroom_core::{ContentStore, Database};
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::sync::Mutex;

use crate::error::Result;

/// Where snapshots are loaded from and saved to.
#[async_trait]
pub trait SnapshotGateway: Send + Sync {
    /// Reads the saved database, or `None` if nothing has been saved.
    async fn load(&self) -> Result<Option<Database>>;

    /// Replaces the saved database with `db`.
    async fn save(&self, db: &Database) -> Result<()>;
}

// ==================== YAML File ====================

/// Snapshot stored as a YAML file.
#[derive(Debug)]
pub struct YamlSnapshotFile {
    path: PathBuf,
    writing: Mutex<()>,
}

impl YamlSnapshotFile {
    /// Creates a gateway for the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writing: Mutex::new(()),
        }
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl SnapshotGateway for YamlSnapshotFile {
    async fn load(&self) -> Result<Option<Database>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(serde_yaml::from_str(&content)?))
    }

    async fn save(&self, db: &Database) -> Result<()> {
        let content = serde_yaml::to_string(db)?;

        // Writers take turns on the staging file; the rename is atomic.
        let _writing = self.writing.lock().await;
        let staging = self.staging_path();
        tokio::fs::write(&staging, content).await?;
        tokio::fs::rename(&staging, &self.path).await?;

        tracing::debug!(path = %self.path.display(), "Snapshot saved");
        Ok(())
    }
}

// ==================== Disabled ====================

/// Gateway that never loads and discards saves. Used in test mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPersistence;

#[async_trait]
impl SnapshotGateway for NoPersistence {
    async fn load(&self) -> Result<Option<Database>> {
        Ok(None)
    }

    async fn save(&self, _db: &Database) -> Result<()> {
        Ok(())
    }
}

// ==================== Startup ====================

/// Builds the store from the last snapshot.
///
/// A missing snapshot gives an empty store. So does an unreadable one,
/// after a warning. A loaded snapshot is audited and repaired before use.
pub async fn open_store(gateway: &dyn SnapshotGateway) -> ContentStore {
    let db = match gateway.load().await {
        Ok(Some(db)) => db,
        Ok(None) => {
            tracing::info!("No snapshot found, starting with an empty store");
            return ContentStore::new();
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load snapshot, starting with an empty store");
            return ContentStore::new();
        }
    };

    let db = checked(db);
    tracing::info!(
        users = db.users().count(),
        articles = db.articles().count(),
        comments = db.comments().count(),
        "Snapshot loaded"
    );

    ContentStore::from_database(db)
}

fn checked(mut db: Database) -> Database {
    let violations = audit(&db);
    if violations.is_empty() {
        return db;
    }

    for violation in &violations {
        tracing::warn!(%violation, "Snapshot inconsistency");
    }
    let repaired = repair(&mut db);
    tracing::warn!(repaired, "Snapshot repaired");

    db
}
