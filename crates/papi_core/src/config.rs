//! Storage backend selection.
//!
//! # Responsibility
//! - Describe which payment backend a process should use.
//! - Open that backend behind the repository contract.

use crate::db::{open_db, open_db_in_memory};
use crate::repo::map_repo::MapPaymentRepository;
use crate::repo::payment_repo::{PaymentRepository, RepoResult};
use crate::repo::sqlite_repo::SqlitePaymentRepository;
use log::info;
use std::path::PathBuf;

/// Payment storage backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StorageConfig {
    /// Process-local map; contents are lost on exit.
    #[default]
    Memory,
    /// SQLite database file, created and migrated on open.
    Sqlite { path: PathBuf },
}

impl StorageConfig {
    /// Opens the configured backend.
    ///
    /// # Errors
    /// - Propagates database open/migration failures and schema checks.
    pub fn open_repository(&self) -> RepoResult<Box<dyn PaymentRepository>> {
        let repo: Box<dyn PaymentRepository> = match self {
            Self::Memory => Box::new(MapPaymentRepository::new()),
            Self::Sqlite { path } => {
                Box::new(SqlitePaymentRepository::try_new(open_db(path)?)?)
            }
        };
        info!(
            "event=storage_open module=config status=ok backend={}",
            self.backend_name()
        );
        Ok(repo)
    }

    /// Opens a private in-memory SQLite backend.
    pub fn open_sqlite_in_memory() -> RepoResult<SqlitePaymentRepository> {
        SqlitePaymentRepository::try_new(open_db_in_memory()?)
    }

    fn backend_name(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Sqlite { .. } => "sqlite",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::StorageConfig;
    use crate::model::payment::Payment;
    use uuid::Uuid;

    #[test]
    fn memory_backend_opens_empty() {
        let repo = StorageConfig::default().open_repository().unwrap();
        let id = Uuid::new_v4();
        repo.add(&Payment::new(id, Uuid::new_v4())).unwrap();
        assert_eq!(repo.get(id).unwrap().id, id);
    }

    #[test]
    fn sqlite_backend_opens_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig::Sqlite {
            path: dir.path().join("payments.db"),
        };
        let repo = config.open_repository().unwrap();
        let id = Uuid::new_v4();
        repo.add(&Payment::new(id, Uuid::new_v4())).unwrap();
        drop(repo);

        let reopened = config.open_repository().unwrap();
        assert_eq!(reopened.get(id).unwrap().id, id);
    }
}
