use std::collections::HashMap;
use std::sync::RwLock;
use tracing::info;

use super::types::{Job, JobResult, JobStatus};

/// Partial update merged into an existing job record. Absent fields are
/// left untouched.
#[derive(Debug, Default)]
pub struct JobUpdate {
    pub status: Option<JobStatus>,
    pub progress: Option<u8>,
    pub stage: Option<String>,
    pub result: Option<JobResult>,
    pub error: Option<String>,
}

impl JobUpdate {
    pub fn status(mut self, status: JobStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn progress(mut self, progress: u8) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = Some(stage.into());
        self
    }

    pub fn result(mut self, result: JobResult) -> Self {
        self.result = Some(result);
        self
    }

    pub fn error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Mark a job failed with a human-readable reason.
    pub fn failed(error: impl Into<String>) -> Self {
        Self::default().status(JobStatus::Error).error(error)
    }
}

/// In-memory store of all in-flight and completed jobs.
///
/// Records live for the process lifetime; there is no eviction, so memory
/// grows with the number of jobs ever created. Acceptable for the intended
/// single-user deployment.
pub struct JobRegistry {
    jobs: RwLock<HashMap<String, Job>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self { jobs: RwLock::new(HashMap::new()) }
    }

    /// Insert a new record and return its identifier.
    pub fn create(&self, job: Job) -> String {
        let id = job.id.clone();
        info!("Creating job {} ({} -> {})", id, job.source, job.target);
        self.jobs.write().unwrap().insert(id.clone(), job);
        id
    }

    pub fn get(&self, id: &str) -> Option<Job> {
        self.jobs.read().unwrap().get(id).cloned()
    }

    /// Merge fields into an existing record. Updating an unknown id is a
    /// silent no-op; workers may race registry cleanup.
    pub fn update(&self, id: &str, update: JobUpdate) {
        let mut jobs = self.jobs.write().unwrap();
        if let Some(job) = jobs.get_mut(id) {
            if let Some(status) = update.status {
                job.status = status;
            }
            if let Some(progress) = update.progress {
                job.progress = progress;
            }
            if let Some(stage) = update.stage {
                job.stage = stage;
            }
            if let Some(result) = update.result {
                job.result = Some(result);
            }
            if let Some(error) = update.error {
                job.error = Some(error);
            }
            job.updated_at = chrono::Utc::now();
        }
    }

    pub fn list(&self) -> Vec<String> {
        self.jobs.read().unwrap().keys().cloned().collect()
    }
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::types::MediaKind;

    fn registry_with_job() -> (JobRegistry, String) {
        let registry = JobRegistry::new();
        let id = registry.create(Job::new(MediaKind::Text, MediaKind::Text, None));
        (registry, id)
    }

    #[test]
    fn create_and_get() {
        let (registry, id) = registry_with_job();
        let job = registry.get(&id).unwrap();
        assert_eq!(job.status, JobStatus::Queued);
        assert!(registry.list().contains(&id));
    }

    #[test]
    fn get_unknown_returns_none() {
        let registry = JobRegistry::new();
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn update_merges_only_provided_fields() {
        let (registry, id) = registry_with_job();

        registry.update(
            &id,
            JobUpdate::default()
                .status(JobStatus::Processing)
                .progress(40)
                .stage("Transcribing audio..."),
        );
        let job = registry.get(&id).unwrap();
        assert_eq!(job.status, JobStatus::Processing);
        assert_eq!(job.progress, 40);
        assert_eq!(job.stage, "Transcribing audio...");
        assert!(job.error.is_none());

        // a later partial update leaves earlier fields alone
        registry.update(&id, JobUpdate::default().progress(80));
        let job = registry.get(&id).unwrap();
        assert_eq!(job.status, JobStatus::Processing);
        assert_eq!(job.progress, 80);
    }

    #[test]
    fn update_on_unknown_id_is_a_noop() {
        let registry = JobRegistry::new();
        registry.update("missing", JobUpdate::failed("nope"));
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn failed_update_sets_terminal_error() {
        let (registry, id) = registry_with_job();
        registry.update(&id, JobUpdate::failed("engine exploded"));
        let job = registry.get(&id).unwrap();
        assert_eq!(job.status, JobStatus::Error);
        assert_eq!(job.error.as_deref(), Some("engine exploded"));
        assert!(job.status.is_terminal());
    }
}
