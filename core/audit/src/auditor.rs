//! Sharing audit of newly created files.
//!
//! For every created file the auditor prints who the file is shared with
//! and revokes the "anyone with the link" grant, unless that grant is the
//! only permission left on the file.

use std::io::Write;
use std::sync::Arc;
use tracing::{debug, info, warn};

use sharesweep_common::{FileId, Result};
use sharesweep_drive::{ActivityRecord, DriveItem, FilePermissions, Permission, PermissionKind};

use crate::index::CreationIndex;

/// First line of every printed summary.
pub const SUMMARY_HEADER: &str = "File creation summary for the past day";

/// Counters for one audit pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuditSummary {
    /// Files whose permissions were inspected.
    pub files_audited: usize,
    /// Index entries skipped by the file-type guard.
    pub entries_skipped: usize,
    /// Public link grants deleted.
    pub public_links_removed: usize,
    /// Files where the public link was the sole permission and was kept.
    pub refusals: usize,
}

/// File to audit for an index entry, or `None` when the entry must be
/// skipped: the primary target is not a file (folder, shared drive,
/// comment) or its ID could not be resolved.
pub fn auditable_file<'a>(
    file_id: Option<&'a FileId>,
    activity: &ActivityRecord,
) -> Option<&'a FileId> {
    let is_file = primary_item(activity).is_some_and(DriveItem::is_file);

    if is_file {
        file_id
    } else {
        None
    }
}

fn primary_item(activity: &ActivityRecord) -> Option<&DriveItem> {
    activity
        .primary_target()
        .and_then(|target| target.drive_item.as_ref())
}

/// Inspects and tightens sharing on created files.
pub struct SharingAuditor {
    files: Arc<dyn FilePermissions>,
}

impl SharingAuditor {
    pub fn new(files: Arc<dyn FilePermissions>) -> Self {
        Self { files }
    }

    /// Audit every entry of `index`, writing the summary to `out`.
    ///
    /// A `None` index means there was no activity: nothing is printed and
    /// no API call is made.
    ///
    /// # Errors
    /// - Any API failure, as soon as it happens; files after it are not
    ///   audited
    /// - Writing to `out` failed
    pub async fn audit<W: Write + Send>(
        &self,
        index: Option<&CreationIndex>,
        out: &mut W,
    ) -> Result<AuditSummary> {
        let mut summary = AuditSummary::default();
        let Some(index) = index else {
            return Ok(summary);
        };

        writeln!(out, "{}", SUMMARY_HEADER)?;
        writeln!(out)?;

        for (file_id, activity) in index.iter() {
            let Some(file_id) = auditable_file(file_id, activity) else {
                if primary_item(activity).is_some_and(DriveItem::is_folder) {
                    debug!("Skipping folder creation");
                } else {
                    debug!("Skipping creation that is not an addressable file");
                }
                summary.entries_skipped += 1;
                continue;
            };

            self.audit_file(file_id, out, &mut summary).await?;
            summary.files_audited += 1;
        }

        writeln!(out, "\n")?;
        Ok(summary)
    }

    async fn audit_file<W: Write + Send>(
        &self,
        file_id: &FileId,
        out: &mut W,
        summary: &mut AuditSummary,
    ) -> Result<()> {
        let permissions = self.files.list_permissions(file_id).await?;
        let file = self.files.get_file(file_id).await?;

        writeln!(out, "{} - sharing status:", file.name)?;

        for permission in &permissions {
            match permission.kind {
                PermissionKind::User => writeln!(
                    out,
                    "    - Has user access for user id {}, with {} role\n",
                    permission.id, permission.role
                )?,
                PermissionKind::Group => writeln!(
                    out,
                    "    - Has group access for group id {}, with {} role\n",
                    permission.id, permission.role
                )?,
                PermissionKind::Domain => writeln!(
                    out,
                    "    - Has domain access for domain {}, with {} role\n",
                    permission.domain.as_deref().unwrap_or("(unnamed)"),
                    permission.role
                )?,
                _ if permission.is_anyone_with_link() => {
                    self.handle_public_link(
                        file_id,
                        &file.name,
                        permission,
                        &permissions,
                        out,
                        summary,
                    )
                    .await?
                }
                _ => debug!("Ignoring {:?} permission {}", permission.kind, permission.id),
            }
        }

        Ok(())
    }

    async fn handle_public_link<W: Write + Send>(
        &self,
        file_id: &FileId,
        file_name: &str,
        permission: &Permission,
        permissions: &[Permission],
        out: &mut W,
        summary: &mut AuditSummary,
    ) -> Result<()> {
        if permissions.len() > 1 {
            self.files.delete_permission(file_id, &permission.id).await?;
            info!("Removed public link access from {} ({})", file_name, file_id);
            writeln!(out, "    - Had Public access, removed by the program")?;
            summary.public_links_removed += 1;
        } else {
            warn!(
                "Public link is the only permission on {} ({}), leaving it in place",
                file_name, file_id
            );
            writeln!(out, "ERROR: file can't have only public permission")?;
            summary.refusals += 1;
        }

        Ok(())
    }
}
