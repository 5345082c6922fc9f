//! One audit run: activity window → creation index → sharing audit.

use std::io::Write;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use sharesweep_common::Result;
use sharesweep_drive::{ActivityLog, ActivityQuery, FilePermissions};

use crate::auditor::{AuditSummary, SharingAuditor};
use crate::index::CreationIndex;
use crate::window::yesterday_millis;

/// Maximum number of activities fetched per run.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The activity log was empty for the window.
    NothingToAudit,
    /// The audit ran to completion.
    Completed(AuditSummary),
    /// An API call failed; the run was abandoned.
    Failed(String),
}

/// The audit entry point, wired to its API collaborators.
pub struct AuditJob {
    activity: Arc<dyn ActivityLog>,
    auditor: SharingAuditor,
    page_size: u32,
}

impl AuditJob {
    pub fn new(activity: Arc<dyn ActivityLog>, files: Arc<dyn FilePermissions>) -> Self {
        Self {
            activity,
            auditor: SharingAuditor::new(files),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Override the activity page size.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Audit the last 24 hours.
    ///
    /// Never fails: errors are logged and reported as [`RunOutcome::Failed`]
    /// so a resident scheduler keeps going.
    pub async fn run<W: Write + Send>(&self, out: &mut W) -> RunOutcome {
        let span = info_span!("audit_run", run_id = %Uuid::new_v4());
        let started = Instant::now();

        let result = self
            .run_with_window(yesterday_millis(), out)
            .instrument(span.clone())
            .await;

        let _entered = span.enter();
        match result {
            Ok(None) => {
                info!("No activity in the last day");
                RunOutcome::NothingToAudit
            }
            Ok(Some(summary)) => {
                info!(
                    "Audit completed in {:?}: {} audited, {} skipped, {} public links removed, {} kept",
                    started.elapsed(),
                    summary.files_audited,
                    summary.entries_skipped,
                    summary.public_links_removed,
                    summary.refusals
                );
                RunOutcome::Completed(summary)
            }
            Err(e) => {
                error!("An error occurred: {}", e);
                RunOutcome::Failed(e.to_string())
            }
        }
    }

    /// Audit creations after `window_start_millis` (epoch milliseconds).
    ///
    /// Returns `Ok(None)` when the activity log has nothing for the window.
    ///
    /// # Errors
    /// - Activity query or any file/permission call failed
    pub async fn run_with_window<W: Write + Send>(
        &self,
        window_start_millis: i64,
        out: &mut W,
    ) -> Result<Option<AuditSummary>> {
        let query = ActivityQuery::since_millis(window_start_millis, self.page_size);
        let activities = self.activity.query_activity(&query).await?;
        info!("Fetched {} activities", activities.len());

        let Some(index) = CreationIndex::build(activities) else {
            return Ok(None);
        };

        let summary = self.auditor.audit(Some(&index), out).await?;
        Ok(Some(summary))
    }
}
