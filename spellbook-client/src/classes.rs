//! Class and note API endpoints

use reqwest::Method;
use spellbook_core::domain::class::{ClassRecord, ClassSummary};
use spellbook_core::dto::class::{
    ClassPage, CreateClass, NotePage, ProcessingStatus, RequestUploads, UploadSlot, UploadSlots,
};
use uuid::Uuid;

use crate::SpellbookClient;
use crate::error::{ClientError, Result};

/// Largest page the server hands out
const CLASS_PAGE_LIMIT: u32 = 100;

impl SpellbookClient {
    // =============================================================================
    // Classes
    // =============================================================================

    /// Create a class
    pub async fn create_class(&self, name: &str) -> Result<ClassRecord> {
        let response = self
            .request(Method::POST, "/classes")
            .json(&CreateClass {
                name: name.to_string(),
            })
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// One page of the current user's classes, newest first
    pub async fn list_classes(&self, page: u32, limit: u32) -> Result<ClassPage> {
        let response = self
            .request(Method::GET, "/classes")
            .query(&[("page", page), ("limit", limit)])
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Every class of the current user, walking the listing page by page
    pub async fn list_all_classes(&self) -> Result<Vec<ClassSummary>> {
        let mut classes = Vec::new();
        let mut page = 1;
        loop {
            let batch = self.list_classes(page, CLASS_PAGE_LIMIT).await?;
            let done = batch.classes.len() < CLASS_PAGE_LIMIT as usize
                || classes.len() + batch.classes.len() >= batch.total as usize;
            classes.extend(batch.classes);
            if done {
                return Ok(classes);
            }
            page += 1;
        }
    }

    /// A single class with its note and score aggregates
    pub async fn get_class(&self, class_id: Uuid) -> Result<ClassSummary> {
        let response = self
            .request(Method::GET, &format!("/classes/{}", class_id))
            .send()
            .await?;

        self.handle_response(response).await
    }

    // =============================================================================
    // Notes
    // =============================================================================

    /// Reserve `number_of_files` note slots, each with its own upload URL
    pub async fn request_uploads(&self, class_id: Uuid, number_of_files: u32) -> Result<Vec<UploadSlot>> {
        let response = self
            .request(Method::POST, &format!("/classes/{}/notes", class_id))
            .json(&RequestUploads { number_of_files })
            .send()
            .await?;

        let slots: UploadSlots = self.handle_response(response).await?;
        Ok(slots.uploads)
    }

    /// Upload the content of one note to a signed URL
    pub async fn upload_note(&self, upload_url: &str, bytes: Vec<u8>) -> Result<()> {
        if !upload_url.starts_with("http://") && !upload_url.starts_with("https://") {
            return Err(ClientError::InvalidRequest(format!(
                "not an upload URL: {}",
                upload_url
            )));
        }

        let response = self.client.put(upload_url).body(bytes).send().await?;

        self.handle_empty_response(response).await
    }

    /// Download an object through a signed URL
    pub async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(response.bytes().await?.to_vec())
    }

    /// One page of notes with display URLs
    pub async fn list_notes(&self, class_id: Uuid, page: u32, limit: u32) -> Result<NotePage> {
        let response = self
            .request(Method::GET, &format!("/classes/{}/notes", class_id))
            .query(&[("page", page), ("limit", limit)])
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Delete a note and its content
    pub async fn delete_note(&self, class_id: Uuid, key: &str) -> Result<()> {
        let response = self
            .request(Method::DELETE, &format!("/classes/{}/notes/{}", class_id, key))
            .send()
            .await?;

        self.handle_empty_response(response).await
    }

    /// How many notes of a class have been processed
    pub async fn processing_status(&self, class_id: Uuid) -> Result<ProcessingStatus> {
        let response = self
            .request(Method::GET, &format!("/classes/{}/notes/status", class_id))
            .send()
            .await?;

        self.handle_response(response).await
    }
}
