//! Payment persistence: the repository contract and its backends.
//!
//! # Responsibility
//! - Define the data access contract shared by every payment backend.
//! - Keep storage details (locks, SQL, composite literals) out of services.
//!
//! # Invariants
//! - Writes run `Payment::validate()` before touching storage.
//! - Backends report `Conflict`, `NotFound` and `BadOffsetLimit` as typed
//!   errors; everything else stays opaque.

pub mod map_repo;
pub mod payment_repo;
pub mod sqlite_repo;
