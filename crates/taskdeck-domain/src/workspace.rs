use serde::{Deserialize, Serialize};

/// Backend-assigned workspace identifier. Ids are stable integers usable as
/// element-id components.
pub type WorkspaceId = i64;

/// One tab's subject. Created and deleted by the backend; the session layer
/// only references it by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub id: WorkspaceId,
    pub name: String,
    #[serde(default)]
    pub folder_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format_is_camel_case() {
        let workspace: Workspace =
            serde_json::from_str(r#"{"id": 7, "name": "Launch", "folderId": 3}"#).unwrap();
        assert_eq!(workspace.id, 7);
        assert_eq!(workspace.folder_id, Some(3));
    }

    #[test]
    fn test_folder_id_is_optional() {
        let workspace: Workspace = serde_json::from_str(r#"{"id": 1, "name": "Inbox"}"#).unwrap();
        assert_eq!(workspace.folder_id, None);
    }
}
