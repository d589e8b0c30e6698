//! In-memory repositories used by tests and local runs without a database

use async_trait::async_trait;
use spellbook_core::domain::class::{ClassRecord, NoteRecord};
use spellbook_core::domain::job::{JobRecord, ScoreRecord};
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::repository::class::{self, ClassRepository};
use crate::repository::job::{self, JobRecordStore, RecordStoreError, ScoreStats};

#[derive(Default)]
struct RecordTables {
    jobs: HashMap<Uuid, JobRecord>,
    scores: HashMap<Uuid, ScoreRecord>,
}

#[derive(Default)]
pub struct InMemoryJobRecordStore {
    tables: Mutex<RecordTables>,
}

impl InMemoryJobRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn job_count(&self) -> usize {
        self.tables.lock().await.jobs.len()
    }
}

#[async_trait]
impl JobRecordStore for InMemoryJobRecordStore {
    async fn insert_job(&self, record: &JobRecord) -> job::Result<()> {
        self.tables
            .lock()
            .await
            .jobs
            .insert(record.job_id, record.clone());
        Ok(())
    }

    async fn find_job(&self, job_id: Uuid) -> job::Result<Option<JobRecord>> {
        Ok(self.tables.lock().await.jobs.get(&job_id).cloned())
    }

    async fn find_score(&self, job_id: Uuid) -> job::Result<Option<ScoreRecord>> {
        Ok(self.tables.lock().await.scores.get(&job_id).cloned())
    }

    async fn insert_score(&self, score: &ScoreRecord) -> job::Result<()> {
        let mut tables = self.tables.lock().await;

        if !tables.jobs.contains_key(&score.job_id) {
            return Err(RecordStoreError::UnknownJob(score.job_id));
        }
        if tables.scores.contains_key(&score.job_id) {
            return Err(RecordStoreError::DuplicateScore(score.job_id));
        }

        tables.scores.insert(score.job_id, score.clone());
        Ok(())
    }

    async fn scores_for_class(&self, class_id: Uuid) -> job::Result<Vec<ScoreRecord>> {
        let tables = self.tables.lock().await;

        let mut scores: Vec<ScoreRecord> = tables
            .scores
            .values()
            .filter(|score| {
                tables
                    .jobs
                    .get(&score.job_id)
                    .is_some_and(|job| job.owner_class_id == class_id)
            })
            .cloned()
            .collect();
        scores.sort_by_key(|score| score.created_at);

        Ok(scores)
    }

    async fn score_stats(&self, class_ids: &[Uuid]) -> job::Result<HashMap<Uuid, ScoreStats>> {
        let tables = self.tables.lock().await;

        let mut sums: HashMap<Uuid, (u32, f64)> = HashMap::new();
        for score in tables.scores.values() {
            let Some(job) = tables.jobs.get(&score.job_id) else {
                continue;
            };
            if class_ids.contains(&job.owner_class_id) {
                let entry = sums.entry(job.owner_class_id).or_default();
                entry.0 += 1;
                entry.1 += score.score;
            }
        }

        Ok(sums
            .into_iter()
            .map(|(class_id, (count, sum))| {
                let stats = ScoreStats {
                    count,
                    average: sum / f64::from(count),
                };
                (class_id, stats)
            })
            .collect())
    }
}

#[derive(Default)]
struct ClassTables {
    classes: Vec<ClassRecord>,
    notes: Vec<NoteRecord>,
}

#[derive(Default)]
pub struct InMemoryClassRepository {
    tables: Mutex<ClassTables>,
}

impl InMemoryClassRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ClassRepository for InMemoryClassRepository {
    async fn create_class(&self, user_id: &str, name: &str) -> class::Result<ClassRecord> {
        let class = ClassRecord {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            name: name.to_string(),
            created_at: chrono::Utc::now(),
        };
        self.tables.lock().await.classes.push(class.clone());
        Ok(class)
    }

    async fn list_classes(
        &self,
        user_id: &str,
        offset: u32,
        limit: u32,
    ) -> class::Result<Vec<ClassRecord>> {
        // Newest first; insertion order breaks ties in creation time
        Ok(self
            .tables
            .lock()
            .await
            .classes
            .iter()
            .rev()
            .filter(|class| class.user_id == user_id)
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn count_classes(&self, user_id: &str) -> class::Result<u64> {
        let tables = self.tables.lock().await;
        Ok(tables
            .classes
            .iter()
            .filter(|class| class.user_id == user_id)
            .count() as u64)
    }

    async fn find_class(&self, user_id: &str, class_id: Uuid) -> class::Result<Option<ClassRecord>> {
        Ok(self
            .tables
            .lock()
            .await
            .classes
            .iter()
            .find(|class| class.id == class_id && class.user_id == user_id)
            .cloned())
    }

    async fn insert_note(&self, note: &NoteRecord) -> class::Result<()> {
        self.tables.lock().await.notes.push(note.clone());
        Ok(())
    }

    async fn note_keys(&self, class_id: Uuid) -> class::Result<Vec<String>> {
        Ok(self
            .tables
            .lock()
            .await
            .notes
            .iter()
            .filter(|note| note.class_id == class_id)
            .map(|note| note.key.clone())
            .collect())
    }

    async fn list_notes(
        &self,
        class_id: Uuid,
        offset: u32,
        limit: u32,
    ) -> class::Result<Vec<NoteRecord>> {
        Ok(self
            .tables
            .lock()
            .await
            .notes
            .iter()
            .filter(|note| note.class_id == class_id)
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn count_notes(&self, class_id: Uuid) -> class::Result<u32> {
        let tables = self.tables.lock().await;
        let count = tables
            .notes
            .iter()
            .filter(|note| note.class_id == class_id)
            .count();
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    async fn note_counts(&self, class_ids: &[Uuid]) -> class::Result<HashMap<Uuid, u32>> {
        let tables = self.tables.lock().await;
        let mut counts = HashMap::new();
        for note in tables.notes.iter().filter(|note| class_ids.contains(&note.class_id)) {
            *counts.entry(note.class_id).or_insert(0u32) += 1;
        }
        Ok(counts)
    }

    async fn delete_note(&self, class_id: Uuid, key: &str) -> class::Result<bool> {
        let mut tables = self.tables.lock().await;
        let before = tables.notes.len();
        tables
            .notes
            .retain(|note| !(note.class_id == class_id && note.key == key));
        Ok(tables.notes.len() < before)
    }
}
