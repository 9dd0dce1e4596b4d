//! Thread-safe handle around the [`Database`].

use parking_lot::RwLock;

use crate::Database;

/// The process-wide content store.
///
/// Every entity operation runs inside a single lock acquisition: queries
/// under the read lock, mutations under the write lock. An operation
/// therefore always sees and leaves a consistent database, and no two
/// mutations interleave. Access is closure-scoped so no caller can keep a
/// reference to the database past its own call.
#[derive(Debug, Default)]
pub struct ContentStore {
    db: RwLock<Database>,
}

impl ContentStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded from a previously saved database.
    pub fn from_database(db: Database) -> Self {
        Self {
            db: RwLock::new(db),
        }
    }

    /// Runs a query against the database.
    pub fn read<R>(&self, f: impl FnOnce(&Database) -> R) -> R {
        f(&self.db.read())
    }

    /// Runs a mutation against the database.
    pub fn write<R>(&self, f: impl FnOnce(&mut Database) -> R) -> R {
        f(&mut self.db.write())
    }

    /// Returns a full copy of the current database.
    pub fn snapshot(&self) -> Database {
        self.db.read().clone()
    }
}
