use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskdeck_core::Point;

use crate::{page::PageId, workspace::WorkspaceId};

pub type CardId = i64;

/// A freely positioned note-like entity on a page's canvas.
///
/// Position is authoritative in the backend but is optimistically mutated
/// locally during drag and written back on drag-end. A card may carry a
/// `workspace_id` reference, in which case opening the card navigates to
/// that workspace (card-as-reference).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: CardId,
    pub page_id: PageId,
    pub name: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub workspace_id: Option<WorkspaceId>,
    #[serde(default)]
    pub created_date_time: Option<DateTime<Utc>>,
}

impl Card {
    /// Element id for this card's canvas node, a pure function of the card
    /// id. No two cards on a page may share one.
    pub fn element_id(id: CardId) -> String {
        format!("card-{id}")
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn set_position(&mut self, position: Point) {
        self.x = position.x;
        self.y = position.y;
    }

    pub fn has_workspace(&self) -> bool {
        self.workspace_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_id_is_pure_function_of_id() {
        assert_eq!(Card::element_id(12), "card-12");
        assert_eq!(Card::element_id(12), Card::element_id(12));
    }

    #[test]
    fn test_wire_format_with_defaults() {
        let card: Card =
            serde_json::from_str(r#"{"id": 3, "pageId": 9, "name": "Research"}"#).unwrap();
        assert_eq!(card.position(), Point::new(0.0, 0.0));
        assert_eq!(card.workspace_id, None);
        assert!(card.status.is_none());
    }

    #[test]
    fn test_position_roundtrip() {
        let mut card: Card = serde_json::from_str(
            r#"{"id": 3, "pageId": 9, "name": "Research", "x": 20.0, "y": 190.0}"#,
        )
        .unwrap();
        assert_eq!(card.position(), Point::new(20.0, 190.0));

        card.set_position(Point::new(40.0, 60.0));
        assert_eq!(card.x, 40.0);
        assert_eq!(card.y, 60.0);
    }
}
