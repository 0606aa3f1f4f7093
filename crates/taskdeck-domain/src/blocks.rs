use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::page::PageId;

pub type NoteId = i64;
pub type ImageId = i64;
pub type FileId = i64;

/// A freeform text block on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    pub page_id: PageId,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageBlock {
    pub id: ImageId,
    pub page_id: PageId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileBlock {
    pub id: FileId,
    pub page_id: PageId,
    pub name: String,
    #[serde(default)]
    pub created_date_time: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_wire_format() {
        let note: Note =
            serde_json::from_str(r#"{"id": 2, "pageId": 4, "content": "draft"}"#).unwrap();
        assert_eq!(note.page_id, 4);
        assert_eq!(note.content, "draft");
    }

    #[test]
    fn test_file_block_wire_format() {
        let file: FileBlock =
            serde_json::from_str(r#"{"id": 8, "pageId": 4, "name": "spec.pdf"}"#).unwrap();
        assert_eq!(file.name, "spec.pdf");
        assert!(file.created_date_time.is_none());
    }
}
