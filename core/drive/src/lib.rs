//! Drive API access for sharesweep.
//!
//! The audit is written against two async traits, [`ActivityLog`] and
//! [`FilePermissions`]. The Google implementations live in [`gdrive`];
//! [`MemoryDrive`] implements both in memory for tests.
//!
//! # Design Principles
//! - Provider isolation: no Google-specific logic in the audit crate
//! - Typed wire model: only the fields the audit reads are decoded
//! - Unified error semantics: HTTP statuses map onto the common error type

pub mod gdrive;
pub mod memory;
pub mod model;
pub mod provider;

pub use memory::{DriveCall, MemoryDrive};
pub use model::{
    ActivityRecord, DriveFile, DriveItem, Permission, PermissionKind, Target, ANYONE_WITH_LINK,
};
pub use provider::{ActivityLog, ActivityQuery, FilePermissions};
