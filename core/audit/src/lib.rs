//! sharesweep audit
//!
//! Finds files created in the last day and revokes their public-link
//! sharing:
//! - Time window calculation (now minus 24 hours, epoch milliseconds)
//! - Activity classification and the per-run creation index
//! - Sharing audit with public-link removal
//! - The audit job entry point and its daily scheduler

pub mod activity;
pub mod auditor;
pub mod config;
pub mod index;
pub mod job;
pub mod scheduler;
pub mod window;

// Re-export main types
pub use activity::{ActionKind, ClassifiedActivity};
pub use auditor::{AuditSummary, SharingAuditor};
pub use config::AuditConfig;
pub use index::CreationIndex;
pub use job::{AuditJob, RunOutcome};
pub use scheduler::{DailySchedule, DailyScheduler, SchedulerHandle};
pub use window::{window_start_millis, yesterday_millis};
