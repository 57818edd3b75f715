//! Payment domain model.
//!
//! # Responsibility
//! - Define the nested payment document shared by every layer.
//!
//! # Invariants
//! - Every payment is identified by a caller-assigned `PaymentId`.
//! - Stored and returned payments carry the resource type `Payment`.

pub mod payment;
