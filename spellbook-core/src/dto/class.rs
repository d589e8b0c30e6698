//! Class and note DTOs

use serde::{Deserialize, Serialize};

use crate::domain::class::ClassSummary;

/// Request to create a class
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateClass {
    pub name: String,
}

/// Request for upload URLs for a batch of note pages
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestUploads {
    pub number_of_files: u32,
}

/// Where to upload one note page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSlot {
    pub key: String,
    pub upload_url: String,
}

/// Upload slots handed out for a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadSlots {
    pub uploads: Vec<UploadSlot>,
}

/// Paging parameters for class and note listings
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    10
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
        }
    }
}

/// A note together with a read-capable URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteView {
    pub key: String,
    pub url: String,
}

/// One page of notes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotePage {
    pub notes: Vec<NoteView>,
    pub total_pages: u32,
}

/// One page of classes with the number of classes the user owns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassPage {
    #[serde(rename = "data")]
    pub classes: Vec<ClassSummary>,
    pub total: u64,
}

/// How many notes of a class have been through OCR
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingStatus {
    pub processed_notes: u32,
    pub unprocessed_notes: u32,
    pub total_notes: u32,
}
