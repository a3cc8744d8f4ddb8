//! Rotation pass: compress every active stream and truncate it.

use tracing::{info, instrument, warn};

use super::{LogArchive, LogError};
use crate::time::unix_millis;

/// One stream moved into an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotatedLog {
    pub source: String,
    pub archive: String,
}

/// One stream the pass could not rotate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationFailure {
    pub id: String,
    pub reason: String,
}

/// Outcome of a rotation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RotationReport {
    pub rotated: Vec<RotatedLog>,
    pub skipped_empty: Vec<String>,
    pub failed: Vec<RotationFailure>,
}

impl RotationReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

impl LogArchive {
    /// Rotate every active stream into `<id>-<unix millis>`.
    ///
    /// Empty streams are skipped. A failing stream is recorded and the pass
    /// moves on. Lines appended between the compress and truncate steps of
    /// a stream are dropped with the truncation.
    #[instrument(skip(self), fields(dir = %self.dir().display()))]
    pub async fn rotate(&self) -> Result<RotationReport, LogError> {
        let ids = self.list(false).await?;
        let stamp = unix_millis();
        let mut report = RotationReport::default();

        for id in ids {
            let archive = format!("{id}-{stamp}");
            match self.rotate_one(&id, &archive).await {
                Ok(()) => report.rotated.push(RotatedLog {
                    source: id,
                    archive,
                }),
                Err(LogError::Empty(_)) => report.skipped_empty.push(id),
                Err(e) => {
                    warn!(log = %id, error = %e, "Log rotation failed");
                    report.failed.push(RotationFailure {
                        id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            rotated = report.rotated.len(),
            skipped = report.skipped_empty.len(),
            failed = report.failed.len(),
            "Log rotation pass complete"
        );
        Ok(report)
    }

    async fn rotate_one(&self, id: &str, archive: &str) -> Result<(), LogError> {
        self.compress(id, archive).await?;
        self.truncate(id).await
    }
}
