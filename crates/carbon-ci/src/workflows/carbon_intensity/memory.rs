use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;

use super::domain::{ReportId, ReportStatus};
use super::repository::{
    AuditLogEntry, ReportRecord, ReportRepository, RepositoryError, StatusChange,
};

struct StoredReport {
    record: ReportRecord,
    log: Vec<AuditLogEntry>,
}

/// Process-local store. A single lock guards each record together with its
/// audit log, so status compare-and-swap and log append commit as one step.
#[derive(Default, Clone)]
pub struct InMemoryReportRepository {
    reports: Arc<Mutex<HashMap<ReportId, StoredReport>>>,
}

impl InMemoryReportRepository {
    fn lock(&self) -> Result<MutexGuard<'_, HashMap<ReportId, StoredReport>>, RepositoryError> {
        self.reports
            .lock()
            .map_err(|_| RepositoryError::Unavailable("report store lock poisoned".to_string()))
    }

    pub fn len(&self) -> Result<usize, RepositoryError> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, RepositoryError> {
        Ok(self.lock()?.is_empty())
    }
}

impl ReportRepository for InMemoryReportRepository {
    fn insert(&self, record: ReportRecord) -> Result<ReportRecord, RepositoryError> {
        let mut guard = self.lock()?;
        if guard.contains_key(&record.report_id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(
            record.report_id.clone(),
            StoredReport {
                record: record.clone(),
                log: Vec::new(),
            },
        );
        Ok(record)
    }

    fn fetch(&self, id: &ReportId) -> Result<Option<ReportRecord>, RepositoryError> {
        let guard = self.lock()?;
        Ok(guard.get(id).map(|stored| stored.record.clone()))
    }

    fn replace_draft(&self, record: ReportRecord) -> Result<ReportRecord, RepositoryError> {
        let mut guard = self.lock()?;
        let stored = guard
            .get_mut(&record.report_id)
            .ok_or(RepositoryError::NotFound)?;
        if stored.record.status != ReportStatus::Draft {
            return Err(RepositoryError::StatusConflict {
                expected: ReportStatus::Draft,
                found: stored.record.status,
            });
        }

        // Workflow columns are owned by `commit_transition`.
        stored.record = ReportRecord {
            status: stored.record.status,
            rejection_reason: stored.record.rejection_reason.clone(),
            assigned_auditor: stored.record.assigned_auditor.clone(),
            created_at: stored.record.created_at,
            ..record
        };
        Ok(stored.record.clone())
    }

    fn commit_transition(
        &self,
        change: StatusChange,
    ) -> Result<(ReportRecord, AuditLogEntry), RepositoryError> {
        let mut guard = self.lock()?;
        let stored = guard
            .get_mut(&change.report_id)
            .ok_or(RepositoryError::NotFound)?;
        if stored.record.status != change.expected {
            return Err(RepositoryError::StatusConflict {
                expected: change.expected,
                found: stored.record.status,
            });
        }

        let now = Utc::now();
        let recorded_at = stored
            .log
            .last()
            .map(|previous| previous.recorded_at.max(now))
            .unwrap_or(now);
        let entry = AuditLogEntry {
            sequence: stored.log.len() as u64 + 1,
            report_id: change.report_id,
            action: change.entry.action,
            prior_status: change.entry.prior_status,
            new_status: change.entry.new_status,
            actor: change.entry.actor,
            notes: change.entry.notes,
            recorded_at,
        };

        stored.record.status = change.status;
        stored.record.assigned_auditor = change.assigned_auditor;
        stored.record.rejection_reason = change.rejection_reason;
        stored.record.updated_at = recorded_at;
        stored.log.push(entry.clone());

        Ok((stored.record.clone(), entry))
    }

    fn audit_log(&self, id: &ReportId) -> Result<Vec<AuditLogEntry>, RepositoryError> {
        let guard = self.lock()?;
        guard
            .get(id)
            .map(|stored| stored.log.clone())
            .ok_or(RepositoryError::NotFound)
    }

    fn by_status(
        &self,
        status: ReportStatus,
        limit: usize,
    ) -> Result<Vec<ReportRecord>, RepositoryError> {
        let guard = self.lock()?;
        let mut matching: Vec<ReportRecord> = guard
            .values()
            .filter(|stored| stored.record.status == status)
            .map(|stored| stored.record.clone())
            .collect();
        matching.sort_by(|a, b| {
            a.updated_at
                .cmp(&b.updated_at)
                .then_with(|| a.report_id.cmp(&b.report_id))
        });
        matching.truncate(limit);
        Ok(matching)
    }
}
