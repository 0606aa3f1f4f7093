use crate::boundary::Backend;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Mutex;
use taskdeck_core::{DeckError, DeckResult};
use taskdeck_domain::{
    Card, CardId, Connection, FileBlock, ImageBlock, Note, Page, PageId, Task, Workspace,
    WorkspaceId,
};
use uuid::Uuid;

/// In-memory implementation of the `invoke` boundary.
///
/// Backs local sessions and tests: ids are assigned from a monotonic
/// counter, deletes cascade the way the real backend does (page deletes
/// remove the page's content, card deletes remove touching connections).
/// Commands can be made to fail on demand for error-path tests.
pub struct MemoryBackend {
    instance_id: Uuid,
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    next_id: i64,
    workspaces: Vec<Workspace>,
    pages: Vec<Page>,
    tasks: Vec<Task>,
    notes: Vec<Note>,
    images: Vec<ImageBlock>,
    files: Vec<FileBlock>,
    cards: Vec<Card>,
    connections: Vec<Connection>,
    failing: HashSet<String>,
    calls: Vec<String>,
}

impl State {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn page(&self, page_id: PageId) -> DeckResult<&Page> {
        self.pages
            .iter()
            .find(|p| p.id == page_id)
            .ok_or_else(|| DeckError::NotFound(format!("page {page_id}")))
    }
}

fn arg_i64(args: &Value, key: &str) -> DeckResult<i64> {
    args.get(key)
        .and_then(Value::as_i64)
        .ok_or_else(|| DeckError::Validation(format!("missing argument: {key}")))
}

fn arg_f64(args: &Value, key: &str) -> DeckResult<f64> {
    args.get(key)
        .and_then(Value::as_f64)
        .ok_or_else(|| DeckError::Validation(format!("missing argument: {key}")))
}

fn arg_str(args: &Value, key: &str) -> DeckResult<String> {
    args.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| DeckError::Validation(format!("missing argument: {key}")))
}

fn opt_str(args: &Value, key: &str) -> Option<String> {
    args.get(key).and_then(Value::as_str).map(str::to_string)
}

fn to_value<T: serde::Serialize>(value: &T) -> DeckResult<Value> {
    serde_json::to_value(value).map_err(|e| DeckError::Serialization(e.to_string()))
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4(),
            state: Mutex::new(State::default()),
        }
    }

    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    /// Make every subsequent invocation of `command` fail.
    pub fn fail_on(&self, command: &str) {
        self.state.lock().unwrap().failing.insert(command.to_string());
    }

    pub fn clear_failure(&self, command: &str) {
        self.state.lock().unwrap().failing.remove(command);
    }

    /// Names of the commands invoked so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn call_count(&self, command: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| c.as_str() == command)
            .count()
    }

    pub fn seed_workspace(&self, name: &str) -> Workspace {
        let mut state = self.state.lock().unwrap();
        let workspace = Workspace {
            id: state.allocate_id(),
            name: name.to_string(),
            folder_id: None,
        };
        state.workspaces.push(workspace.clone());
        workspace
    }

    pub fn seed_page(&self, workspace_id: WorkspaceId, name: &str) -> Page {
        let mut state = self.state.lock().unwrap();
        let order_index = state
            .pages
            .iter()
            .filter(|p| p.workspace_id == workspace_id)
            .count() as i32;
        let page = Page {
            id: state.allocate_id(),
            workspace_id,
            name: name.to_string(),
            order_index,
        };
        state.pages.push(page.clone());
        page
    }

    pub fn seed_card(&self, page_id: PageId, name: &str, x: f64, y: f64) -> Card {
        let mut state = self.state.lock().unwrap();
        let card = Card {
            id: state.allocate_id(),
            page_id,
            name: name.to_string(),
            status: None,
            description: None,
            x,
            y,
            workspace_id: None,
            created_date_time: Some(Utc::now()),
        };
        state.cards.push(card.clone());
        card
    }

    /// Attach a workspace reference to a seeded card.
    pub fn link_card_workspace(&self, card_id: CardId, workspace_id: WorkspaceId) {
        let mut state = self.state.lock().unwrap();
        if let Some(card) = state.cards.iter_mut().find(|c| c.id == card_id) {
            card.workspace_id = Some(workspace_id);
        }
    }

    pub fn seed_task(&self, page_id: PageId, title: &str) -> Task {
        let mut state = self.state.lock().unwrap();
        let task = Task {
            id: state.allocate_id(),
            page_id,
            title: title.to_string(),
            description: None,
            status: None,
            priority: None,
            due_date: None,
            assigned_to: None,
            industry: None,
            created_date_time: Some(Utc::now()),
        };
        state.tasks.push(task.clone());
        task
    }

    pub fn seed_note(&self, page_id: PageId, content: &str) -> Note {
        let mut state = self.state.lock().unwrap();
        let note = Note {
            id: state.allocate_id(),
            page_id,
            content: content.to_string(),
        };
        state.notes.push(note.clone());
        note
    }

    pub fn seed_file(&self, page_id: PageId, name: &str) -> FileBlock {
        let mut state = self.state.lock().unwrap();
        let file = FileBlock {
            id: state.allocate_id(),
            page_id,
            name: name.to_string(),
            created_date_time: Some(Utc::now()),
        };
        state.files.push(file.clone());
        file
    }

    pub fn seed_connection(&self, from_card_id: CardId, to_card_id: CardId) -> Connection {
        let mut state = self.state.lock().unwrap();
        let connection = Connection::new(from_card_id, to_card_id);
        state.connections.push(connection);
        connection
    }

    /// Stored position of a card, for asserting write-backs.
    pub fn card_position(&self, card_id: CardId) -> Option<(f64, f64)> {
        self.state
            .lock()
            .unwrap()
            .cards
            .iter()
            .find(|c| c.id == card_id)
            .map(|c| (c.x, c.y))
    }

    pub fn connection_count(&self) -> usize {
        self.state.lock().unwrap().connections.len()
    }

    fn dispatch(&self, command: &str, args: &Value) -> DeckResult<Value> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(command.to_string());

        if state.failing.contains(command) {
            return Err(DeckError::Backend(format!("{command} failed")));
        }

        match command {
            "fetch_workspace" => {
                let id = arg_i64(args, "workspaceId")?;
                let workspace = state
                    .workspaces
                    .iter()
                    .find(|w| w.id == id)
                    .ok_or_else(|| DeckError::NotFound(format!("workspace {id}")))?;
                to_value(workspace)
            }
            "fetch_workspace_for_card" => {
                let card_id = arg_i64(args, "cardId")?;
                let workspace_id = state
                    .cards
                    .iter()
                    .find(|c| c.id == card_id)
                    .ok_or_else(|| DeckError::NotFound(format!("card {card_id}")))?
                    .workspace_id
                    .ok_or_else(|| {
                        DeckError::NotFound(format!("no workspace for card {card_id}"))
                    })?;
                let workspace = state
                    .workspaces
                    .iter()
                    .find(|w| w.id == workspace_id)
                    .ok_or_else(|| DeckError::NotFound(format!("workspace {workspace_id}")))?;
                to_value(workspace)
            }
            "fetch_pages_for_workspace" => {
                let id = arg_i64(args, "workspaceId")?;
                let mut pages: Vec<&Page> = state
                    .pages
                    .iter()
                    .filter(|p| p.workspace_id == id)
                    .collect();
                pages.sort_by_key(|p| p.order_index);
                to_value(&pages)
            }
            "create_page_for_workspace" => {
                let workspace_id = arg_i64(args, "workspaceId")?;
                let name = arg_str(args, "name")?;
                let order_index = state
                    .pages
                    .iter()
                    .filter(|p| p.workspace_id == workspace_id)
                    .count() as i32;
                let page = Page {
                    id: state.allocate_id(),
                    workspace_id,
                    name,
                    order_index,
                };
                state.pages.push(page.clone());
                to_value(&page)
            }
            "rename_page" => {
                let page_id = arg_i64(args, "pageId")?;
                let new_name = arg_str(args, "newName")?;
                let page = state
                    .pages
                    .iter_mut()
                    .find(|p| p.id == page_id)
                    .ok_or_else(|| DeckError::NotFound(format!("page {page_id}")))?;
                page.name = new_name;
                Ok(Value::Null)
            }
            "delete_page" => {
                let page_id = arg_i64(args, "pageId")?;
                state.page(page_id)?;
                let page_cards: HashSet<CardId> = state
                    .cards
                    .iter()
                    .filter(|c| c.page_id == page_id)
                    .map(|c| c.id)
                    .collect();
                state.pages.retain(|p| p.id != page_id);
                state.tasks.retain(|t| t.page_id != page_id);
                state.notes.retain(|n| n.page_id != page_id);
                state.images.retain(|i| i.page_id != page_id);
                state.files.retain(|f| f.page_id != page_id);
                state.cards.retain(|c| c.page_id != page_id);
                state.connections.retain(|c| {
                    !page_cards.contains(&c.from_card_id) && !page_cards.contains(&c.to_card_id)
                });
                Ok(Value::Null)
            }
            "fetch_tasks_for_workspace" => {
                let workspace_id = arg_i64(args, "workspaceId")?;
                let workspace_pages: HashSet<PageId> = state
                    .pages
                    .iter()
                    .filter(|p| p.workspace_id == workspace_id)
                    .map(|p| p.id)
                    .collect();
                let tasks: Vec<&Task> = state
                    .tasks
                    .iter()
                    .filter(|t| workspace_pages.contains(&t.page_id))
                    .collect();
                to_value(&tasks)
            }
            "create_task_for_page" => {
                let page_id = arg_i64(args, "pageId")?;
                state.page(page_id)?;
                let task = Task {
                    id: state.allocate_id(),
                    page_id,
                    title: arg_str(args, "title")?,
                    description: opt_str(args, "description"),
                    status: opt_str(args, "status"),
                    priority: opt_str(args, "priority"),
                    due_date: opt_str(args, "dueDate"),
                    assigned_to: args.get("assignedTo").and_then(Value::as_i64),
                    industry: opt_str(args, "industry"),
                    created_date_time: Some(Utc::now()),
                };
                state.tasks.push(task.clone());
                to_value(&task)
            }
            "update_task" => {
                let task: Task = serde_json::from_value(args.clone())
                    .map_err(|e| DeckError::Serialization(e.to_string()))?;
                let slot = state
                    .tasks
                    .iter_mut()
                    .find(|t| t.id == task.id)
                    .ok_or_else(|| DeckError::NotFound(format!("task {}", task.id)))?;
                *slot = task.clone();
                to_value(&task)
            }
            "delete_task" => {
                let task_id = arg_i64(args, "taskId")?;
                state.tasks.retain(|t| t.id != task_id);
                Ok(Value::Null)
            }
            "fetch_notes_for_page" => {
                let page_id = arg_i64(args, "pageId")?;
                let notes: Vec<&Note> =
                    state.notes.iter().filter(|n| n.page_id == page_id).collect();
                to_value(&notes)
            }
            "delete_note" => {
                let note_id = arg_i64(args, "noteId")?;
                state.notes.retain(|n| n.id != note_id);
                Ok(Value::Null)
            }
            "fetch_images_for_page" => {
                let page_id = arg_i64(args, "pageId")?;
                let images: Vec<&ImageBlock> = state
                    .images
                    .iter()
                    .filter(|i| i.page_id == page_id)
                    .collect();
                to_value(&images)
            }
            "delete_image" => {
                let image_id = arg_i64(args, "imageId")?;
                state.images.retain(|i| i.id != image_id);
                Ok(Value::Null)
            }
            "fetch_files" => to_value(&state.files),
            "delete_file" => {
                let file_id = arg_i64(args, "fileId")?;
                state.files.retain(|f| f.id != file_id);
                Ok(Value::Null)
            }
            "fetch_cards_for_page" => {
                let page_id = arg_i64(args, "pageId")?;
                let cards: Vec<&Card> =
                    state.cards.iter().filter(|c| c.page_id == page_id).collect();
                to_value(&cards)
            }
            "create_card_for_page" => {
                let page_id = arg_i64(args, "pageId")?;
                state.page(page_id)?;
                let card = Card {
                    id: state.allocate_id(),
                    page_id,
                    name: arg_str(args, "name")?,
                    status: opt_str(args, "status"),
                    description: opt_str(args, "description"),
                    x: 0.0,
                    y: 0.0,
                    workspace_id: None,
                    created_date_time: Some(Utc::now()),
                };
                state.cards.push(card.clone());
                to_value(&card)
            }
            "update_card" => {
                let card: Card = serde_json::from_value(args.clone())
                    .map_err(|e| DeckError::Serialization(e.to_string()))?;
                let slot = state
                    .cards
                    .iter_mut()
                    .find(|c| c.id == card.id)
                    .ok_or_else(|| DeckError::NotFound(format!("card {}", card.id)))?;
                *slot = card.clone();
                to_value(&card)
            }
            "delete_card" => {
                let card_id = arg_i64(args, "cardId")?;
                state.cards.retain(|c| c.id != card_id);
                state.connections.retain(|c| !c.touches(card_id));
                Ok(Value::Null)
            }
            "update_card_position" => {
                let card_id = arg_i64(args, "cardId")?;
                let x = arg_f64(args, "x")?;
                let y = arg_f64(args, "y")?;
                let card = state
                    .cards
                    .iter_mut()
                    .find(|c| c.id == card_id)
                    .ok_or_else(|| DeckError::NotFound(format!("card {card_id}")))?;
                card.x = x;
                card.y = y;
                Ok(Value::Null)
            }
            "fetch_connections_for_page" => {
                let page_id = arg_i64(args, "pageId")?;
                let page_cards: HashSet<CardId> = state
                    .cards
                    .iter()
                    .filter(|c| c.page_id == page_id)
                    .map(|c| c.id)
                    .collect();
                let connections: Vec<&Connection> = state
                    .connections
                    .iter()
                    .filter(|c| page_cards.contains(&c.from_card_id))
                    .collect();
                to_value(&connections)
            }
            "create_connection" => {
                let from = arg_i64(args, "fromCardId")?;
                let to = arg_i64(args, "toCardId")?;
                if !state.connections.iter().any(|c| c.connects(from, to)) {
                    state.connections.push(Connection::new(from, to));
                }
                Ok(Value::Null)
            }
            "delete_connection" => {
                let from = arg_i64(args, "fromCardId")?;
                let to = arg_i64(args, "toCardId")?;
                state.connections.retain(|c| !c.connects(from, to));
                Ok(Value::Null)
            }
            other => Err(DeckError::NotFound(format!("unknown command: {other}"))),
        }
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn invoke(&self, command: &str, args: Value) -> DeckResult<Value> {
        tracing::debug!(command, "invoke");
        self.dispatch(command, &args)
    }
}
