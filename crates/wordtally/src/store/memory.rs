use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::engine::job::{Job, JobId};
use crate::error::StoreError;

use super::ProcessStore;

/// Process store kept entirely in memory.
#[derive(Default)]
pub struct InMemoryProcessStore {
    jobs: RwLock<BTreeMap<JobId, Job>>,
}

impl InMemoryProcessStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProcessStore for InMemoryProcessStore {
    fn save(&self, job: &Job) -> Result<Job, StoreError> {
        let mut jobs = self.jobs.write().map_err(|_| StoreError::LockPoisoned)?;
        jobs.insert(job.id, job.clone());
        Ok(job.clone())
    }

    fn find(&self, id: JobId) -> Result<Option<Job>, StoreError> {
        let jobs = self.jobs.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(jobs.get(&id).cloned())
    }

    fn exists(&self, id: JobId) -> Result<bool, StoreError> {
        let jobs = self.jobs.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(jobs.contains_key(&id))
    }

    fn find_all(&self) -> Result<Vec<Job>, StoreError> {
        let jobs = self.jobs.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(jobs.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::job::JobStatus;

    #[test]
    fn test_save_and_find() {
        let store = InMemoryProcessStore::new();
        let job = Job::new(JobId::new(1), "/data");

        store.save(&job).unwrap();

        assert!(store.exists(JobId::new(1)).unwrap());
        assert_eq!(store.find(JobId::new(1)).unwrap(), Some(job));
        assert_eq!(store.find(JobId::new(2)).unwrap(), None);
    }

    #[test]
    fn test_save_replaces() {
        let store = InMemoryProcessStore::new();
        let mut job = Job::new(JobId::new(1), "/data");
        store.save(&job).unwrap();

        job.fail("boom");
        store.save(&job).unwrap();

        let stored = store.find(JobId::new(1)).unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Failed);
        assert_eq!(store.find_all().unwrap().len(), 1);
    }

    #[test]
    fn test_find_all_ordered() {
        let store = InMemoryProcessStore::new();
        store.save(&Job::new(JobId::new(3), "/c")).unwrap();
        store.save(&Job::new(JobId::new(1), "/a")).unwrap();

        let ids: Vec<JobId> = store.find_all().unwrap().iter().map(|j| j.id).collect();
        assert_eq!(ids, vec![JobId::new(1), JobId::new(3)]);
    }
}
