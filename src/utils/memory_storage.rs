//! In-memory storage implementation for testing and development

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::traits::*;
use crate::types::*;

/// In-memory storage backed by `RwLock`-guarded maps
///
/// Both write paths take the corresponding write lock for their whole
/// read-check-write sequence, which gives the per-entity atomicity the
/// storage contract requires.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    installments: Arc<RwLock<HashMap<String, PaymentInstallment>>>,
    letter_versions: Arc<RwLock<HashMap<String, LetterVersion>>>,
}

impl MemoryStorage {
    /// Create a new memory storage instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) {
        self.installments.write().unwrap().clear();
        self.letter_versions.write().unwrap().clear();
    }
}

#[async_trait]
impl ReconciliationStorage for MemoryStorage {
    async fn save_installment(&mut self, installment: &PaymentInstallment) -> EngineResult<()> {
        self.installments
            .write()
            .unwrap()
            .insert(installment.id.clone(), installment.clone());
        Ok(())
    }

    async fn get_installment(
        &self,
        installment_id: &str,
    ) -> EngineResult<Option<PaymentInstallment>> {
        Ok(self
            .installments
            .read()
            .unwrap()
            .get(installment_id)
            .cloned())
    }

    async fn list_installments(
        &self,
        fee_calculation_id: &str,
    ) -> EngineResult<Vec<PaymentInstallment>> {
        let installments = self.installments.read().unwrap();
        let mut filtered: Vec<PaymentInstallment> = installments
            .values()
            .filter(|inst| inst.fee_calculation_id == fee_calculation_id)
            .cloned()
            .collect();
        filtered.sort_by_key(|inst| inst.installment_number);
        Ok(filtered)
    }

    async fn update_installment(
        &mut self,
        installment: &PaymentInstallment,
        expected_revision: u64,
    ) -> EngineResult<PaymentInstallment> {
        let mut installments = self.installments.write().unwrap();
        let current = installments
            .get(&installment.id)
            .ok_or_else(|| EngineError::InstallmentNotFound(installment.id.clone()))?;

        if current.revision != expected_revision {
            return Err(EngineError::Conflict(format!(
                "Installment '{}' was modified concurrently (revision {} != {})",
                installment.id, current.revision, expected_revision
            )));
        }

        let mut updated = installment.clone();
        updated.revision = expected_revision + 1;
        installments.insert(updated.id.clone(), updated.clone());
        Ok(updated)
    }

    async fn save_letter_version(&mut self, version: &LetterVersion) -> EngineResult<()> {
        self.letter_versions
            .write()
            .unwrap()
            .insert(version.id.clone(), version.clone());
        Ok(())
    }

    async fn get_letter_version(&self, version_id: &str) -> EngineResult<Option<LetterVersion>> {
        Ok(self
            .letter_versions
            .read()
            .unwrap()
            .get(version_id)
            .cloned())
    }

    async fn get_latest_version(
        &self,
        root_letter_id: &str,
    ) -> EngineResult<Option<LetterVersion>> {
        Ok(self
            .letter_versions
            .read()
            .unwrap()
            .values()
            .find(|v| v.root_letter_id == root_letter_id && v.is_latest)
            .cloned())
    }

    async fn list_versions(&self, root_letter_id: &str) -> EngineResult<Vec<LetterVersion>> {
        let versions = self.letter_versions.read().unwrap();
        let mut filtered: Vec<LetterVersion> = versions
            .values()
            .filter(|v| v.root_letter_id == root_letter_id)
            .cloned()
            .collect();
        filtered.sort_by_key(|v| v.version_number);
        Ok(filtered)
    }

    async fn supersede_latest(
        &mut self,
        root_letter_id: &str,
        next: &LetterVersion,
    ) -> EngineResult<LetterVersion> {
        let mut versions = self.letter_versions.write().unwrap();

        let previous = versions
            .values()
            .find(|v| v.root_letter_id == root_letter_id && v.is_latest)
            .cloned()
            .ok_or_else(|| EngineError::LetterNotFound(root_letter_id.to_string()))?;

        if next.version_number != previous.version_number + 1 {
            return Err(EngineError::Conflict(format!(
                "Lineage '{}' advanced concurrently: expected next version {}, got {}",
                root_letter_id,
                previous.version_number + 1,
                next.version_number
            )));
        }

        let mut demoted = previous;
        demoted.is_latest = false;
        versions.insert(demoted.id.clone(), demoted);

        let mut promoted = next.clone();
        promoted.is_latest = true;
        versions.insert(promoted.id.clone(), promoted.clone());
        Ok(promoted)
    }
}
