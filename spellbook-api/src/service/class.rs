//! Class Service
//!
//! Classes and their note pages. Notes are uploaded directly to the object
//! store through signed URLs; this service only hands out the URLs and keeps
//! the note rows that job submission reads its inputs from.

use spellbook_core::domain::class::{ClassRecord, ClassSummary, NoteRecord};
use spellbook_core::dto::class::{
    ClassPage, NotePage, NoteView, PageQuery, ProcessingStatus, UploadSlot,
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::cache::TtlCache;
use crate::gateway::{ObjectStore, StoreError};
use crate::repository::{ClassRepository, JobRecordStore, RecordStoreError};

pub const MAX_FILES_PER_UPLOAD: u32 = 20;
pub const MAX_PAGE_LIMIT: u32 = 100;

#[derive(Debug, Error)]
pub enum ClassError {
    #[error("{0}")]
    Validation(String),

    #[error("class {0} not found")]
    ClassNotFound(Uuid),

    #[error("note {0} not found")]
    NoteNotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Records(#[from] RecordStoreError),
}

#[derive(Clone)]
pub struct ClassService {
    classes: Arc<dyn ClassRepository>,
    records: Arc<dyn JobRecordStore>,
    store: Arc<dyn ObjectStore>,
    display_urls: Arc<TtlCache<String>>,
    upload_ttl: Duration,
    display_ttl: Duration,
    ocr_prefix: String,
}

impl ClassService {
    pub fn new(
        classes: Arc<dyn ClassRepository>,
        records: Arc<dyn JobRecordStore>,
        store: Arc<dyn ObjectStore>,
        display_urls: Arc<TtlCache<String>>,
        upload_ttl: Duration,
        display_ttl: Duration,
        ocr_prefix: impl Into<String>,
    ) -> Self {
        Self {
            classes,
            records,
            store,
            display_urls,
            upload_ttl,
            display_ttl,
            ocr_prefix: ocr_prefix.into(),
        }
    }

    pub async fn create_class(&self, user_id: &str, name: &str) -> Result<ClassRecord, ClassError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ClassError::Validation("name is required".to_string()));
        }

        let class = self.classes.create_class(user_id, name).await?;
        tracing::info!("Class created: {} ({}) for {}", class.id, class.name, user_id);
        Ok(class)
    }

    /// One page of the user's classes, newest first, with note and score aggregates
    pub async fn list_classes(&self, user_id: &str, query: PageQuery) -> Result<ClassPage, ClassError> {
        validate_page(query)?;

        let total = self.classes.count_classes(user_id).await?;
        let offset = (query.page - 1).saturating_mul(query.limit);
        let classes = self.classes.list_classes(user_id, offset, query.limit).await?;

        Ok(ClassPage {
            classes: self.summarize(classes).await?,
            total,
        })
    }

    /// A single class with its aggregates
    pub async fn class_summary(&self, user_id: &str, class_id: Uuid) -> Result<ClassSummary, ClassError> {
        let class = self.owned_class(user_id, class_id).await?;
        let mut summaries = self.summarize(vec![class]).await?;
        summaries.pop().ok_or(ClassError::ClassNotFound(class_id))
    }

    async fn summarize(&self, classes: Vec<ClassRecord>) -> Result<Vec<ClassSummary>, ClassError> {
        if classes.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = classes.iter().map(|class| class.id).collect();
        let note_counts = self.classes.note_counts(&ids).await?;
        let score_stats = self.records.score_stats(&ids).await?;

        Ok(classes
            .into_iter()
            .map(|class| {
                let stats = score_stats.get(&class.id).copied().unwrap_or_default();
                ClassSummary {
                    notes_count: note_counts.get(&class.id).copied().unwrap_or(0),
                    total_quiz_scores: stats.count,
                    average_quiz_score: stats.average,
                    class,
                }
            })
            .collect())
    }

    async fn owned_class(&self, user_id: &str, class_id: Uuid) -> Result<ClassRecord, ClassError> {
        self.classes
            .find_class(user_id, class_id)
            .await?
            .ok_or(ClassError::ClassNotFound(class_id))
    }

    /// Registers `count` new notes and returns a write URL for each
    pub async fn request_uploads(
        &self,
        user_id: &str,
        class_id: Uuid,
        count: u32,
    ) -> Result<Vec<UploadSlot>, ClassError> {
        if count == 0 || count > MAX_FILES_PER_UPLOAD {
            return Err(ClassError::Validation(format!(
                "numberOfFiles must be between 1 and {}",
                MAX_FILES_PER_UPLOAD
            )));
        }
        self.owned_class(user_id, class_id).await?;

        let mut slots = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let key = Uuid::new_v4().to_string();
            let upload_url = self.store.put_signed_url(&key, self.upload_ttl)?;

            self.classes
                .insert_note(&NoteRecord {
                    key: key.clone(),
                    class_id,
                    user_id: user_id.to_string(),
                    created_at: chrono::Utc::now(),
                })
                .await?;

            slots.push(UploadSlot { key, upload_url });
        }

        self.display_urls.invalidate(&cache_prefix(class_id));
        tracing::info!("Issued {} upload URLs for class {}", count, class_id);

        Ok(slots)
    }

    /// One page of notes with read URLs, reusing cached URLs while fresh
    pub async fn list_notes(
        &self,
        user_id: &str,
        class_id: Uuid,
        query: PageQuery,
    ) -> Result<NotePage, ClassError> {
        validate_page(query)?;
        self.owned_class(user_id, class_id).await?;

        let total = self.classes.count_notes(class_id).await?;
        let offset = (query.page - 1).saturating_mul(query.limit);
        let notes = self.classes.list_notes(class_id, offset, query.limit).await?;

        let mut views = Vec::with_capacity(notes.len());
        for note in notes {
            let cache_key = format!("{}{}", cache_prefix(class_id), note.key);
            let url = match self.display_urls.get(&cache_key) {
                Some(url) => url,
                None => {
                    let url = self.store.get_signed_url(&note.key, self.display_ttl)?;
                    self.display_urls.insert(cache_key, url.clone());
                    url
                }
            };
            views.push(NoteView { key: note.key, url });
        }

        Ok(NotePage {
            notes: views,
            total_pages: total.div_ceil(query.limit),
        })
    }

    /// Deletes the note row, then its blob
    pub async fn delete_note(&self, user_id: &str, class_id: Uuid, key: &str) -> Result<(), ClassError> {
        self.owned_class(user_id, class_id).await?;

        if !self.classes.delete_note(class_id, key).await? {
            return Err(ClassError::NoteNotFound(key.to_string()));
        }

        self.display_urls.invalidate(&cache_prefix(class_id));

        if let Err(e) = self.store.delete(key).await {
            tracing::error!("Note row {} deleted but its blob was not: {}", key, e);
            return Err(e.into());
        }

        tracing::info!("Note {} deleted from class {}", key, class_id);
        Ok(())
    }

    /// Counts notes whose OCR output exists
    pub async fn processing_status(&self, user_id: &str, class_id: Uuid) -> Result<ProcessingStatus, ClassError> {
        self.owned_class(user_id, class_id).await?;

        let keys = self.classes.note_keys(class_id).await?;
        let mut processed = 0u32;
        for key in &keys {
            if self.store.exists(&self.ocr_key(key)).await? {
                processed += 1;
            }
        }

        let total = u32::try_from(keys.len()).unwrap_or(u32::MAX);
        Ok(ProcessingStatus {
            processed_notes: processed,
            unprocessed_notes: total - processed,
            total_notes: total,
        })
    }

    /// Key of the OCR output of a note
    pub fn ocr_key(&self, note_key: &str) -> String {
        let prefix = self.ocr_prefix.trim_end_matches('/');
        if prefix.is_empty() {
            note_key.to_string()
        } else {
            format!("{}/{}", prefix, note_key)
        }
    }
}

fn validate_page(query: PageQuery) -> Result<(), ClassError> {
    if query.page == 0 || query.limit == 0 || query.limit > MAX_PAGE_LIMIT {
        return Err(ClassError::Validation(format!(
            "page must be at least 1 and limit between 1 and {}",
            MAX_PAGE_LIMIT
        )));
    }
    Ok(())
}

fn cache_prefix(class_id: Uuid) -> String {
    format!("{}/", class_id)
}
