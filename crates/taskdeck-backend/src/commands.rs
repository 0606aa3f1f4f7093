use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use taskdeck_core::{DeckError, DeckResult};
use taskdeck_domain::{
    Card, CardId, Connection, FileBlock, FileId, ImageBlock, ImageId, NewTask, Note, NoteId, Page,
    PageId, Task, TaskId, Workspace, WorkspaceId,
};

use crate::boundary::Backend;

/// Typed command facade over the `invoke` boundary, one method per backend
/// command the session core uses.
pub struct Commands<'a> {
    backend: &'a dyn Backend,
}

impl<'a> Commands<'a> {
    pub fn new(backend: &'a dyn Backend) -> Self {
        Self { backend }
    }

    async fn call<T: DeserializeOwned>(&self, command: &str, args: Value) -> DeckResult<T> {
        let value = self.backend.invoke(command, args).await?;
        serde_json::from_value(value)
            .map_err(|e| DeckError::Serialization(format!("{command}: {e}")))
    }

    async fn call_unit(&self, command: &str, args: Value) -> DeckResult<()> {
        self.backend.invoke(command, args).await?;
        Ok(())
    }

    pub async fn fetch_workspace(&self, workspace_id: WorkspaceId) -> DeckResult<Workspace> {
        self.call("fetch_workspace", json!({ "workspaceId": workspace_id }))
            .await
    }

    pub async fn fetch_workspace_for_card(&self, card_id: CardId) -> DeckResult<Workspace> {
        self.call("fetch_workspace_for_card", json!({ "cardId": card_id }))
            .await
    }

    pub async fn fetch_pages_for_workspace(
        &self,
        workspace_id: WorkspaceId,
    ) -> DeckResult<Vec<Page>> {
        self.call(
            "fetch_pages_for_workspace",
            json!({ "workspaceId": workspace_id }),
        )
        .await
    }

    pub async fn create_page_for_workspace(
        &self,
        workspace_id: WorkspaceId,
        name: &str,
    ) -> DeckResult<Page> {
        self.call(
            "create_page_for_workspace",
            json!({ "workspaceId": workspace_id, "name": name }),
        )
        .await
    }

    pub async fn rename_page(&self, page_id: PageId, new_name: &str) -> DeckResult<()> {
        self.call_unit(
            "rename_page",
            json!({ "pageId": page_id, "newName": new_name }),
        )
        .await
    }

    pub async fn delete_page(&self, page_id: PageId) -> DeckResult<()> {
        self.call_unit("delete_page", json!({ "pageId": page_id }))
            .await
    }

    pub async fn fetch_tasks_for_workspace(
        &self,
        workspace_id: WorkspaceId,
    ) -> DeckResult<Vec<Task>> {
        self.call(
            "fetch_tasks_for_workspace",
            json!({ "workspaceId": workspace_id }),
        )
        .await
    }

    pub async fn create_task_for_page(&self, task: &NewTask) -> DeckResult<Task> {
        let args = serde_json::to_value(task)
            .map_err(|e| DeckError::Serialization(format!("create_task_for_page: {e}")))?;
        self.call("create_task_for_page", args).await
    }

    pub async fn update_task(&self, task: &Task) -> DeckResult<Task> {
        let args = serde_json::to_value(task)
            .map_err(|e| DeckError::Serialization(format!("update_task: {e}")))?;
        self.call("update_task", args).await
    }

    pub async fn delete_task(&self, task_id: TaskId) -> DeckResult<()> {
        self.call_unit("delete_task", json!({ "taskId": task_id }))
            .await
    }

    pub async fn fetch_notes_for_page(&self, page_id: PageId) -> DeckResult<Vec<Note>> {
        self.call("fetch_notes_for_page", json!({ "pageId": page_id }))
            .await
    }

    pub async fn delete_note(&self, note_id: NoteId) -> DeckResult<()> {
        self.call_unit("delete_note", json!({ "noteId": note_id }))
            .await
    }

    pub async fn fetch_images_for_page(&self, page_id: PageId) -> DeckResult<Vec<ImageBlock>> {
        self.call("fetch_images_for_page", json!({ "pageId": page_id }))
            .await
    }

    pub async fn delete_image(&self, image_id: ImageId) -> DeckResult<()> {
        self.call_unit("delete_image", json!({ "imageId": image_id }))
            .await
    }

    /// Files are fetched unscoped and filtered to the page by the caller.
    pub async fn fetch_files(&self) -> DeckResult<Vec<FileBlock>> {
        self.call("fetch_files", json!({})).await
    }

    pub async fn delete_file(&self, file_id: FileId) -> DeckResult<()> {
        self.call_unit("delete_file", json!({ "fileId": file_id }))
            .await
    }

    pub async fn fetch_cards_for_page(&self, page_id: PageId) -> DeckResult<Vec<Card>> {
        self.call("fetch_cards_for_page", json!({ "pageId": page_id }))
            .await
    }

    pub async fn create_card_for_page(
        &self,
        page_id: PageId,
        name: &str,
        description: Option<&str>,
        status: Option<&str>,
    ) -> DeckResult<Card> {
        self.call(
            "create_card_for_page",
            json!({
                "pageId": page_id,
                "name": name,
                "description": description,
                "status": status,
            }),
        )
        .await
    }

    pub async fn update_card(&self, card: &Card) -> DeckResult<Card> {
        let args = serde_json::to_value(card)
            .map_err(|e| DeckError::Serialization(format!("update_card: {e}")))?;
        self.call("update_card", args).await
    }

    pub async fn delete_card(&self, card_id: CardId) -> DeckResult<()> {
        self.call_unit("delete_card", json!({ "cardId": card_id }))
            .await
    }

    pub async fn update_card_position(&self, card_id: CardId, x: f64, y: f64) -> DeckResult<()> {
        self.call_unit(
            "update_card_position",
            json!({ "cardId": card_id, "x": x, "y": y }),
        )
        .await
    }

    pub async fn fetch_connections_for_page(&self, page_id: PageId) -> DeckResult<Vec<Connection>> {
        self.call("fetch_connections_for_page", json!({ "pageId": page_id }))
            .await
    }

    pub async fn create_connection(&self, from_card_id: CardId, to_card_id: CardId) -> DeckResult<()> {
        self.call_unit(
            "create_connection",
            json!({ "fromCardId": from_card_id, "toCardId": to_card_id }),
        )
        .await
    }

    pub async fn delete_connection(&self, from_card_id: CardId, to_card_id: CardId) -> DeckResult<()> {
        self.call_unit(
            "delete_connection",
            json!({ "fromCardId": from_card_id, "toCardId": to_card_id }),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mockall::mock;

    mock! {
        pub TestBackend {}

        #[async_trait]
        impl Backend for TestBackend {
            async fn invoke(&self, command: &str, args: Value) -> DeckResult<Value>;
        }
    }

    #[tokio::test]
    async fn test_fetch_cards_deserializes_list() {
        let mut backend = MockTestBackend::new();
        backend
            .expect_invoke()
            .withf(|command, args| {
                command == "fetch_cards_for_page" && *args == json!({ "pageId": 4 })
            })
            .returning(|_, _| {
                Ok(json!([
                    { "id": 1, "pageId": 4, "name": "A", "x": 20.0, "y": 20.0 },
                    { "id": 2, "pageId": 4, "name": "B" }
                ]))
            });

        let cards = Commands::new(&backend).fetch_cards_for_page(4).await.unwrap();
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].name, "A");
        assert_eq!(cards[1].x, 0.0);
    }

    #[tokio::test]
    async fn test_backend_rejection_propagates_as_error() {
        let mut backend = MockTestBackend::new();
        backend
            .expect_invoke()
            .returning(|_, _| Err(DeckError::Backend("connection refused".into())));

        let result = Commands::new(&backend).fetch_cards_for_page(4).await;
        assert!(matches!(result, Err(DeckError::Backend(_))));
    }

    #[tokio::test]
    async fn test_malformed_payload_is_a_serialization_error() {
        let mut backend = MockTestBackend::new();
        backend
            .expect_invoke()
            .returning(|_, _| Ok(json!({ "unexpected": true })));

        let result = Commands::new(&backend).fetch_cards_for_page(4).await;
        assert!(matches!(result, Err(DeckError::Serialization(_))));
    }

    #[tokio::test]
    async fn test_update_card_position_sends_coordinates() {
        let mut backend = MockTestBackend::new();
        backend
            .expect_invoke()
            .withf(|command, args| {
                command == "update_card_position"
                    && *args == json!({ "cardId": 9, "x": 40.0, "y": 60.0 })
            })
            .returning(|_, _| Ok(Value::Null));

        Commands::new(&backend)
            .update_card_position(9, 40.0, 60.0)
            .await
            .unwrap();
    }
}
