//! Letter version lineage management
//!
//! Every generated letter lives in a lineage: version 1 is the root, each
//! revision appends version n+1 and flips the previous latest flag in the
//! same atomic storage step, so exactly one version per lineage is latest at
//! any time.

use crate::traits::ReconciliationStorage;
use crate::types::{EngineError, EngineResult, LetterVersion};

/// Bounded retry count for optimistic-concurrency conflicts
pub const MAX_CONFLICT_RETRIES: usize = 3;

/// Storage-backed manager for letter lineages
pub struct LetterVersionManager<S: ReconciliationStorage> {
    storage: S,
}

impl<S: ReconciliationStorage> LetterVersionManager<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Start a new lineage with version 1 as its own root
    pub async fn open_lineage(&mut self) -> EngineResult<LetterVersion> {
        let id = uuid::Uuid::new_v4().to_string();
        let version = LetterVersion {
            id: id.clone(),
            root_letter_id: id,
            version_number: 1,
            is_latest: true,
            created_at: chrono::Utc::now().naive_utc(),
        };
        self.storage.save_letter_version(&version).await?;
        Ok(version)
    }

    /// Revise a letter: append the next version and demote the current latest
    ///
    /// A concurrent revision of the same lineage shows up as a storage
    /// conflict; the current state is re-read and the append retried a
    /// bounded number of times before the conflict is surfaced.
    pub async fn revise(&mut self, root_letter_id: &str) -> EngineResult<LetterVersion> {
        let mut last_conflict = None;

        for _ in 0..MAX_CONFLICT_RETRIES {
            let latest = self
                .storage
                .get_latest_version(root_letter_id)
                .await?
                .ok_or_else(|| EngineError::LetterNotFound(root_letter_id.to_string()))?;

            let next = LetterVersion {
                id: uuid::Uuid::new_v4().to_string(),
                root_letter_id: root_letter_id.to_string(),
                version_number: latest.version_number + 1,
                is_latest: true,
                created_at: chrono::Utc::now().naive_utc(),
            };

            match self.storage.supersede_latest(root_letter_id, &next).await {
                Ok(promoted) => return Ok(promoted),
                Err(EngineError::Conflict(reason)) => {
                    last_conflict = Some(reason);
                }
                Err(other) => return Err(other),
            }
        }

        Err(EngineError::Conflict(last_conflict.unwrap_or_else(|| {
            format!("Could not revise letter lineage '{}'", root_letter_id)
        })))
    }

    /// The single version of a lineage currently flagged latest
    pub async fn latest(&self, root_letter_id: &str) -> EngineResult<LetterVersion> {
        self.storage
            .get_latest_version(root_letter_id)
            .await?
            .ok_or_else(|| EngineError::LetterNotFound(root_letter_id.to_string()))
    }

    /// Full version history of a lineage, oldest first
    pub async fn history(&self, root_letter_id: &str) -> EngineResult<Vec<LetterVersion>> {
        self.storage.list_versions(root_letter_id).await
    }
}
