//! Payment repository core.
//! Domain model, storage backends and the use-case service for payment records.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::StorageConfig;
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::payment::{
    ChargesInformation, Money, Payment, PaymentAttributes, PaymentFx, PaymentId, PaymentParty,
    PaymentValidationError, SponsorParty,
};
pub use repo::map_repo::MapPaymentRepository;
pub use repo::payment_repo::{PaymentRepository, RepoError, RepoResult, LIST_LIMIT_MAX};
pub use repo::sqlite_repo::SqlitePaymentRepository;
pub use service::payment_service::PaymentService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
