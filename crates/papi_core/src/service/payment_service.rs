//! Payment use-case service.
//!
//! # Responsibility
//! - Provide stable CRUD and paging entry points over any payment backend.
//! - Log unexpected storage failures; domain errors pass through silently.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - Service layer remains storage-agnostic.

use crate::model::payment::{Payment, PaymentId};
use crate::repo::payment_repo::{PaymentRepository, RepoError, RepoResult};
use log::{debug, error};

/// Use-case service wrapper for payment operations.
pub struct PaymentService<R: PaymentRepository> {
    repo: R,
}

impl<R: PaymentRepository> PaymentService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Borrows the underlying repository.
    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn create_payment(&self, payment: &Payment) -> RepoResult<Payment> {
        let result = self.repo.add(payment);
        log_outcome("payment_create", Some(payment.id), &result);
        result
    }

    pub fn get_payment(&self, id: PaymentId) -> RepoResult<Payment> {
        let result = self.repo.get(id);
        log_failure("payment_get", Some(id), &result);
        result
    }

    /// Replaces the payment stored under `id`; see [`PaymentRepository::update`].
    pub fn update_payment(&self, id: PaymentId, payment: &Payment) -> RepoResult<Payment> {
        let result = self.repo.update(id, payment);
        log_outcome("payment_update", Some(id), &result);
        result
    }

    pub fn delete_payment(&self, id: PaymentId) -> RepoResult<()> {
        let result = self.repo.delete(id);
        log_outcome("payment_delete", Some(id), &result);
        result
    }

    /// Lists payments by raw offset/limit.
    pub fn list_payments(&self, offset: i64, limit: i64) -> RepoResult<Vec<Payment>> {
        let result = self.repo.list(offset, limit);
        log_failure("payment_list", None, &result);
        result
    }

    /// Lists one page of payments.
    ///
    /// # Contract
    /// - Page `page_number` (zero-based) of size `page_size` starts at offset
    ///   `page_number * page_size`.
    /// - Negative or overflowing inputs fail with [`RepoError::BadOffsetLimit`].
    pub fn list_page(&self, page_number: i64, page_size: i64) -> RepoResult<Vec<Payment>> {
        let offset = page_number.checked_mul(page_size).ok_or_else(|| {
            RepoError::BadOffsetLimit(format!(
                "page {page_number} of size {page_size} is out of range"
            ))
        })?;
        self.list_payments(offset, page_size)
    }
}

fn log_outcome<T>(event: &'static str, id: Option<PaymentId>, result: &RepoResult<T>) {
    if result.is_ok() {
        debug!(
            "event={event} module=service status=ok id={}",
            id_field(id)
        );
    }
    log_failure(event, id, result);
}

fn log_failure<T>(event: &'static str, id: Option<PaymentId>, result: &RepoResult<T>) {
    if let Err(err) = result {
        if !err.is_domain() {
            error!(
                "event={event} module=service status=error id={} error={err}",
                id_field(id)
            );
        }
    }
}

fn id_field(id: Option<PaymentId>) -> String {
    id.map(|id| id.to_string())
        .unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::PaymentService;
    use crate::model::payment::Payment;
    use crate::repo::map_repo::MapPaymentRepository;
    use crate::repo::payment_repo::RepoError;
    use uuid::Uuid;

    #[test]
    fn list_page_rejects_overflowing_offset() {
        let service = PaymentService::new(MapPaymentRepository::new());
        service
            .create_payment(&Payment::new(Uuid::new_v4(), Uuid::new_v4()))
            .unwrap();

        assert!(matches!(
            service.list_page(i64::MAX, 2),
            Err(RepoError::BadOffsetLimit(_))
        ));
        assert!(matches!(
            service.list_page(-1, 10),
            Err(RepoError::BadOffsetLimit(_))
        ));
        assert_eq!(service.list_page(0, 10).unwrap().len(), 1);
    }

    #[test]
    fn service_passes_domain_errors_through() {
        let service = PaymentService::new(MapPaymentRepository::new());
        let id = Uuid::new_v4();
        assert!(matches!(
            service.get_payment(id),
            Err(RepoError::NotFound(_))
        ));
        assert!(matches!(
            service.delete_payment(id),
            Err(RepoError::NotFound(_))
        ));
    }
}
