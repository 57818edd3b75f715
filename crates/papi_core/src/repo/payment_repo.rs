//! Payment repository contract and shared error taxonomy.
//!
//! # Responsibility
//! - Define the CRUD + pagination contract every payment backend satisfies.
//! - Classify failures into `Conflict`, `NotFound` and `BadOffsetLimit`,
//!   keeping every other failure opaque.
//!
//! # Invariants
//! - Returned payments always carry the canonical resource type.
//! - `list` never returns more than [`LIST_LIMIT_MAX`] payments.
//! - Implementations are safe to share between threads.

use crate::db::DbError;
use crate::model::payment::{Payment, PaymentId, PaymentValidationError};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Largest page size accepted by [`PaymentRepository::list`].
pub const LIST_LIMIT_MAX: i64 = 100;

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors returned by payment repositories.
#[derive(Debug)]
pub enum RepoError {
    /// A payment with the same id already exists.
    Conflict(String),
    /// No payment has the requested id.
    NotFound(String),
    /// Pagination parameters are out of range.
    BadOffsetLimit(String),
    /// Input payment rejected before reaching storage.
    Validation(PaymentValidationError),
    /// Unclassified storage failure.
    Db(DbError),
    /// Persisted row cannot be mapped back into a payment.
    InvalidData(String),
    /// In-memory store lock was poisoned by a panicking writer.
    LockPoisoned(&'static str),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl RepoError {
    /// Returns whether this is one of the classified domain errors
    /// (`Conflict`, `NotFound`, `BadOffsetLimit`).
    ///
    /// Anything else should be treated by callers as an internal failure.
    pub fn is_domain(&self) -> bool {
        matches!(
            self,
            Self::Conflict(_) | Self::NotFound(_) | Self::BadOffsetLimit(_)
        )
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Conflict(message) | Self::NotFound(message) | Self::BadOffsetLimit(message) => {
                f.write_str(message)
            }
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted payment data: {message}"),
            Self::LockPoisoned(context) => write!(f, "payment store lock poisoned ({context})"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "payment repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "payment repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "payment repository requires column `{column}` in table `{table}`"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PaymentValidationError> for RepoError {
    fn from(value: PaymentValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for payment CRUD and pagination.
pub trait PaymentRepository: Send + Sync {
    /// Stores a new payment and returns the stored copy.
    ///
    /// Fails with [`RepoError::Conflict`] when `payment.id` already exists.
    fn add(&self, payment: &Payment) -> RepoResult<Payment>;

    /// Fails with [`RepoError::NotFound`] when `id` does not exist.
    fn get(&self, id: PaymentId) -> RepoResult<Payment>;

    /// Replaces the whole payment stored under `id`.
    ///
    /// The stored version becomes `payment.version + 1`; the version already
    /// on record is not consulted. Fails with [`RepoError::NotFound`] when
    /// `id` does not exist.
    fn update(&self, id: PaymentId, payment: &Payment) -> RepoResult<Payment>;

    /// Fails with [`RepoError::NotFound`] when `id` does not exist.
    fn delete(&self, id: PaymentId) -> RepoResult<()>;

    /// Returns up to `limit` payments ordered by id text, skipping `offset`.
    ///
    /// Fails with [`RepoError::BadOffsetLimit`] when `limit` is outside
    /// `1..=100`, `offset` is negative, or `offset` is not below the number of
    /// stored payments.
    fn list(&self, offset: i64, limit: i64) -> RepoResult<Vec<Payment>>;
}

impl<R: PaymentRepository + ?Sized> PaymentRepository for Box<R> {
    fn add(&self, payment: &Payment) -> RepoResult<Payment> {
        (**self).add(payment)
    }

    fn get(&self, id: PaymentId) -> RepoResult<Payment> {
        (**self).get(id)
    }

    fn update(&self, id: PaymentId, payment: &Payment) -> RepoResult<Payment> {
        (**self).update(id, payment)
    }

    fn delete(&self, id: PaymentId) -> RepoResult<()> {
        (**self).delete(id)
    }

    fn list(&self, offset: i64, limit: i64) -> RepoResult<Vec<Payment>> {
        (**self).list(offset, limit)
    }
}

impl<R: PaymentRepository + ?Sized> PaymentRepository for Arc<R> {
    fn add(&self, payment: &Payment) -> RepoResult<Payment> {
        (**self).add(payment)
    }

    fn get(&self, id: PaymentId) -> RepoResult<Payment> {
        (**self).get(id)
    }

    fn update(&self, id: PaymentId, payment: &Payment) -> RepoResult<Payment> {
        (**self).update(id, payment)
    }

    fn delete(&self, id: PaymentId) -> RepoResult<()> {
        (**self).delete(id)
    }

    fn list(&self, offset: i64, limit: i64) -> RepoResult<Vec<Payment>> {
        (**self).list(offset, limit)
    }
}

/// Checks `limit` and the sign of `offset` before any storage access.
pub fn check_list_bounds(offset: i64, limit: i64) -> RepoResult<()> {
    if limit <= 0 || limit > LIST_LIMIT_MAX {
        return Err(RepoError::BadOffsetLimit(format!(
            "list limit {limit} is outside allowed range (0, {LIST_LIMIT_MAX}]"
        )));
    }
    if offset < 0 {
        return Err(RepoError::BadOffsetLimit(format!(
            "list offset {offset} is negative"
        )));
    }
    Ok(())
}

/// Rejects an `offset` at or beyond the current number of records.
pub fn check_offset_in_range(offset: i64, count: i64) -> RepoResult<()> {
    if offset >= count {
        return Err(RepoError::BadOffsetLimit(format!(
            "list offset is {offset} but only {count} records exist"
        )));
    }
    Ok(())
}

pub(crate) fn not_found(id: PaymentId) -> RepoError {
    RepoError::NotFound(format!("payment with ID {id} not found"))
}

pub(crate) fn conflict(id: PaymentId) -> RepoError {
    RepoError::Conflict(format!("a payment with ID {id} already exists"))
}

/// Builds the record stored by `update`: canonical type, path id, bumped version.
pub(crate) fn updated_record(id: PaymentId, payment: &Payment) -> RepoResult<Payment> {
    let next_version = payment
        .version
        .checked_add(1)
        .ok_or(PaymentValidationError::VersionOverflow(payment.version))?;
    let mut updated = payment.normalized();
    updated.id = id;
    updated.version = next_version;
    Ok(updated)
}
