use serde::{Deserialize, Serialize};

use crate::workspace::WorkspaceId;

pub type PageId = i64;

/// One named view of tasks, notes, images and cards within a workspace.
/// A workspace owns an ordered sequence of pages; exactly one page is
/// current per open workspace at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: PageId,
    pub workspace_id: WorkspaceId,
    pub name: String,
    #[serde(default)]
    pub order_index: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format() {
        let page: Page = serde_json::from_str(
            r#"{"id": 4, "workspaceId": 2, "name": "Planning", "orderIndex": 1}"#,
        )
        .unwrap();
        assert_eq!(page.workspace_id, 2);
        assert_eq!(page.order_index, 1);
    }
}
