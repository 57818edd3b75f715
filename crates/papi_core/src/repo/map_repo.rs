//! In-memory payment repository.
//!
//! # Responsibility
//! - Keep payments in a process-local map guarded by one reader/writer lock.
//! - Serve as the reference backend for contract tests.
//!
//! # Invariants
//! - Stored payments are owned clones; callers never alias stored state.
//! - Existence checks and mutations take the lock separately, so two
//!   concurrent `add` calls with the same id may both succeed and the later
//!   write wins.

use crate::model::payment::{Payment, PaymentId};
use crate::repo::payment_repo::{
    check_list_bounds, check_offset_in_range, conflict, not_found, updated_record,
    PaymentRepository, RepoError, RepoResult,
};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Map-backed payment repository.
#[derive(Debug, Default)]
pub struct MapPaymentRepository {
    payments: RwLock<HashMap<PaymentId, Payment>>,
}

impl MapPaymentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored payments.
    pub fn len(&self) -> RepoResult<usize> {
        Ok(self.read("len")?.len())
    }

    pub fn is_empty(&self) -> RepoResult<bool> {
        Ok(self.read("is_empty")?.is_empty())
    }

    /// Removes every stored payment.
    pub fn delete_all(&self) -> RepoResult<()> {
        self.write("delete_all")?.clear();
        Ok(())
    }

    fn contains(&self, id: PaymentId, context: &'static str) -> RepoResult<bool> {
        Ok(self.read(context)?.contains_key(&id))
    }

    fn read(
        &self,
        context: &'static str,
    ) -> RepoResult<RwLockReadGuard<'_, HashMap<PaymentId, Payment>>> {
        self.payments
            .read()
            .map_err(|_| RepoError::LockPoisoned(context))
    }

    fn write(
        &self,
        context: &'static str,
    ) -> RepoResult<RwLockWriteGuard<'_, HashMap<PaymentId, Payment>>> {
        self.payments
            .write()
            .map_err(|_| RepoError::LockPoisoned(context))
    }
}

impl PaymentRepository for MapPaymentRepository {
    fn add(&self, payment: &Payment) -> RepoResult<Payment> {
        payment.validate()?;

        if self.contains(payment.id, "add")? {
            return Err(conflict(payment.id));
        }

        let stored = payment.normalized();
        self.write("add")?.insert(stored.id, stored.clone());
        Ok(stored)
    }

    fn get(&self, id: PaymentId) -> RepoResult<Payment> {
        self.read("get")?
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    fn update(&self, id: PaymentId, payment: &Payment) -> RepoResult<Payment> {
        payment.validate()?;

        if !self.contains(id, "update")? {
            return Err(not_found(id));
        }

        let updated = updated_record(id, payment)?;
        self.write("update")?.insert(id, updated.clone());
        Ok(updated)
    }

    fn delete(&self, id: PaymentId) -> RepoResult<()> {
        if !self.contains(id, "delete")? {
            return Err(not_found(id));
        }

        self.write("delete")?.remove(&id);
        Ok(())
    }

    fn list(&self, offset: i64, limit: i64) -> RepoResult<Vec<Payment>> {
        check_list_bounds(offset, limit)?;

        let mut ids = self
            .read("list")?
            .keys()
            .map(|id| id.to_string())
            .collect::<Vec<_>>();
        let count = i64::try_from(ids.len()).unwrap_or(i64::MAX);
        check_offset_in_range(offset, count)?;

        ids.sort_unstable();
        // Both bounds are within 0..=count after the checks above.
        let from = offset as usize;
        let to = offset.saturating_add(limit).min(count) as usize;

        let payments = self.read("list")?;
        Ok(ids[from..to]
            .iter()
            .filter_map(|id| {
                id.parse::<PaymentId>()
                    .ok()
                    .and_then(|id| payments.get(&id).cloned())
            })
            .collect())
    }
}
