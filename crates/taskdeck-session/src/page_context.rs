use taskdeck_backend::{Backend, Commands};
use taskdeck_core::{DeckError, DeckResult, Rect};
use taskdeck_domain::{
    Card, CardId, Connection, FileBlock, FileId, ImageBlock, ImageId, NewTask, Note, NoteId, Page,
    PageId, Task, TaskId, Workspace,
};

use crate::scope::ScopeRegistry;
use crate::session::Session;
use crate::view::{EventKind, Handler};

const TASK_ROW_HEIGHT: f64 = 28.0;
const BLOCK_HEIGHT: f64 = 120.0;
const PAGE_TAB_WIDTH: f64 = 120.0;

/// Everything fetched for one page in one reload.
#[derive(Debug, Default, Clone)]
pub struct PageData {
    pub tasks: Vec<Task>,
    pub notes: Vec<Note>,
    pub images: Vec<ImageBlock>,
    pub files: Vec<FileBlock>,
    pub cards: Vec<Card>,
    pub connections: Vec<Connection>,
}

/// Fetch the full data set for a page, scoped to `page.id`.
///
/// Tasks are fetched per workspace and filtered to the page; a failing file
/// fetch degrades to an empty file list rather than failing the reload.
pub async fn fetch_page_data(backend: &dyn Backend, page: &Page) -> DeckResult<PageData> {
    let commands = Commands::new(backend);

    let workspace_tasks = commands.fetch_tasks_for_workspace(page.workspace_id).await?;
    let tasks = workspace_tasks
        .into_iter()
        .filter(|t| t.page_id == page.id)
        .collect();
    let notes = commands.fetch_notes_for_page(page.id).await?;
    let images = commands.fetch_images_for_page(page.id).await?;
    let cards = commands.fetch_cards_for_page(page.id).await?;
    let files = match commands.fetch_files().await {
        Ok(all) => all.into_iter().filter(|f| f.page_id == page.id).collect(),
        Err(err) => {
            tracing::debug!("fetch_files failed, continuing without files: {err}");
            Vec::new()
        }
    };
    let connections = commands.fetch_connections_for_page(page.id).await?;

    Ok(PageData {
        tasks,
        notes,
        images,
        files,
        cards,
        connections,
    })
}

/// Owns all data for one page within one workspace.
///
/// `reload` is the sole path for refreshing view state from the backend:
/// the view is a cache of backend state, rebuilt wholesale after any write,
/// never trusted as a source of truth beyond the current render pass.
/// A generation counter makes rapid overlapping reloads converge on the
/// last call: a fetch that completes for an older generation is discarded.
pub struct PageContext {
    workspace: Workspace,
    pages: Vec<Page>,
    current_page: Option<Page>,
    data: PageData,
    generation: u64,
    loading: bool,
}

impl PageContext {
    pub fn new(workspace: Workspace, pages: Vec<Page>) -> Self {
        Self {
            workspace,
            pages,
            current_page: None,
            data: PageData::default(),
            generation: 0,
            loading: false,
        }
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn current_page(&self) -> Option<&Page> {
        self.current_page.as_ref()
    }

    pub fn data(&self) -> &PageData {
        &self.data
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn require_current_page(&self) -> DeckResult<Page> {
        self.current_page
            .clone()
            .ok_or_else(|| DeckError::Validation("no current page".to_string()))
    }

    /// Start a reload: bump the generation, raise the loading flag and clear
    /// the state held for the previous page, so a fast page switch can never
    /// render another page's leftovers. Returns the new generation.
    pub fn begin_reload(&mut self, page: &Page) -> u64 {
        self.generation += 1;
        self.loading = true;
        self.data = PageData::default();
        self.current_page = Some(page.clone());
        self.generation
    }

    /// Apply a completed fetch. Stale generations are discarded without
    /// touching the rendered state; the latest generation wins. Returns
    /// whether the data was applied.
    pub fn commit_reload(&mut self, session: &mut Session, generation: u64, data: PageData) -> bool {
        if generation != self.generation {
            tracing::debug!(
                generation,
                latest = self.generation,
                "discarding stale reload"
            );
            return false;
        }
        self.data = data;
        self.loading = false;
        self.render(session);
        true
    }

    /// The single authoritative resynchronization routine.
    ///
    /// On fetch failure the prior rendered state is left intact (no partial
    /// render), an error is surfaced, and the operation is retryable by the
    /// user, e.g. by switching tabs away and back.
    pub async fn reload(&mut self, session: &mut Session, page: &Page) -> DeckResult<()> {
        let generation = self.begin_reload(page);
        tracing::debug!(page = page.id, generation, "reloading page data");
        let fetched = fetch_page_data(session.backend(), page).await;
        match fetched {
            Ok(data) => {
                self.commit_reload(session, generation, data);
                Ok(())
            }
            Err(err) => {
                if generation == self.generation {
                    self.loading = false;
                    session
                        .messages
                        .error(format!("Failed to load page data: {err}"));
                } else {
                    tracing::debug!(generation, "superseded reload failed: {err}");
                }
                Err(err)
            }
        }
    }

    /// The render pipeline, in fixed order: page tabs, then tasks, then
    /// cards, then connections, then blocks. Later steps may observe the
    /// nodes earlier steps mounted. A failing step is logged loudly and
    /// aborts only itself.
    fn render(&self, session: &mut Session) {
        let Some(page) = self.current_page.clone() else {
            return;
        };
        let workspace_id = self.workspace.id;

        if let Err(err) = self.render_page_tabs(session) {
            tracing::error!(page = page.id, "page tab render failed: {err}");
        }
        if let Err(err) = self.render_tasks(session, &page) {
            tracing::error!(page = page.id, "task render failed: {err}");
        }
        if let Err(err) =
            session
                .canvas
                .render(&mut session.dom, &mut session.scope, workspace_id, &self.data.cards)
        {
            tracing::error!(page = page.id, "card render failed: {err}");
        }
        session
            .graph
            .render(&session.dom, workspace_id, page.id, &self.data.connections);
        if let Err(err) = self.render_blocks(session, &page) {
            tracing::error!(page = page.id, "block render failed: {err}");
        }
    }

    /// Render the page strip for this workspace, marking the current page.
    fn render_page_tabs(&self, session: &mut Session) -> DeckResult<()> {
        let workspace_id = self.workspace.id;
        let strip_id = ScopeRegistry::scoped_id(workspace_id, None, "page-tabs");
        let strip_rect = session
            .dom
            .rect(&strip_id)
            .ok_or_else(|| DeckError::MissingContainer(strip_id.clone()))?;
        session.dom.clear_children(&strip_id)?;

        let current_id = self.current_page.as_ref().map(|p| p.id);
        for (index, page) in self.pages.iter().enumerate() {
            let rect = Rect::new(
                strip_rect.x + index as f64 * PAGE_TAB_WIDTH,
                strip_rect.y,
                PAGE_TAB_WIDTH,
                strip_rect.height,
            );
            let class = if current_id == Some(page.id) {
                "workspace-tab active"
            } else {
                "workspace-tab"
            };
            let element_id = session.scope.create_element(
                &mut session.dom,
                workspace_id,
                Some(page.id),
                &strip_id,
                "tab",
                class,
                rect,
            )?;
            session.scope.listen(
                &mut session.dom,
                workspace_id,
                &element_id,
                EventKind::Click,
                Handler::SelectPage(page.id),
            )?;
        }
        Ok(())
    }

    fn render_tasks(&self, session: &mut Session, page: &Page) -> DeckResult<()> {
        let workspace_id = self.workspace.id;
        let table_id = ScopeRegistry::scoped_id(workspace_id, None, "task-table");
        let table_rect = session
            .dom
            .rect(&table_id)
            .ok_or_else(|| DeckError::MissingContainer(table_id.clone()))?;
        session.dom.clear_children(&table_id)?;

        for (index, task) in self.data.tasks.iter().enumerate() {
            let rect = Rect::new(
                table_rect.x,
                table_rect.y + index as f64 * TASK_ROW_HEIGHT,
                table_rect.width,
                TASK_ROW_HEIGHT,
            );
            session.scope.create_element(
                &mut session.dom,
                workspace_id,
                Some(page.id),
                &table_id,
                &format!("task-row-{}", task.id),
                "task-row",
                rect,
            )?;
        }
        Ok(())
    }

    /// Render the block layer: notes, then images, then files, stacked.
    fn render_blocks(&self, session: &mut Session, page: &Page) -> DeckResult<()> {
        let workspace_id = self.workspace.id;
        let container_id = ScopeRegistry::scoped_id(workspace_id, None, "page-blocks");
        let container_rect = session
            .dom
            .rect(&container_id)
            .ok_or_else(|| DeckError::MissingContainer(container_id.clone()))?;
        session.dom.clear_children(&container_id)?;

        let mut index = 0usize;
        let mut mount = |session: &mut Session, base_id: String, class: &str| -> DeckResult<()> {
            let rect = Rect::new(
                container_rect.x,
                container_rect.y + index as f64 * BLOCK_HEIGHT,
                container_rect.width,
                BLOCK_HEIGHT,
            );
            session.scope.create_element(
                &mut session.dom,
                workspace_id,
                Some(page.id),
                &container_id,
                &base_id,
                class,
                rect,
            )?;
            index += 1;
            Ok(())
        };

        for note in &self.data.notes {
            mount(session, format!("note-{}", note.id), "page-block note")?;
        }
        for image in &self.data.images {
            mount(session, format!("image-{}", image.id), "page-block image")?;
        }
        for file in &self.data.files {
            mount(session, format!("file-{}", file.id), "page-block file-block")?;
        }
        Ok(())
    }

    /// Clear every rendered layer for this workspace (used when the last
    /// page is deleted).
    fn clear_page_content(&self, session: &mut Session) {
        let workspace_id = self.workspace.id;
        session.graph.clear_workspace(workspace_id);
        for base_id in ["page-tabs", "task-table", "cards-grid", "page-blocks"] {
            let container_id = ScopeRegistry::scoped_id(workspace_id, None, base_id);
            for child in session.dom.children(&container_id) {
                session.dom.remove_listeners_for(&child);
            }
            if let Err(err) = session.dom.clear_children(&container_id) {
                tracing::warn!("could not clear {container_id}: {err}");
            }
        }
    }

    /// Switch to another page of this workspace and reload it.
    pub async fn select_page(&mut self, session: &mut Session, page_id: PageId) -> DeckResult<()> {
        let page = self
            .pages
            .iter()
            .find(|p| p.id == page_id)
            .cloned()
            .ok_or_else(|| DeckError::NotFound(format!("page {page_id}")))?;
        self.reload(session, &page).await
    }

    pub async fn create_task(&mut self, session: &mut Session, task: NewTask) -> DeckResult<Task> {
        let page = self.require_current_page()?;
        let result = session.commands().create_task_for_page(&task).await;
        let created = match result {
            Ok(created) => created,
            Err(err) => {
                session
                    .messages
                    .error(format!("Failed to create task: {err}"));
                return Err(err);
            }
        };
        self.reload(session, &page).await?;
        session.messages.success("Task created");
        Ok(created)
    }

    pub async fn update_task(&mut self, session: &mut Session, task: &Task) -> DeckResult<()> {
        let page = self.require_current_page()?;
        let result = session.commands().update_task(task).await;
        if let Err(err) = result {
            session
                .messages
                .error(format!("Failed to update task: {err}"));
            return Err(err);
        }
        self.reload(session, &page).await?;
        session.messages.success("Task updated");
        Ok(())
    }

    pub async fn delete_task(&mut self, session: &mut Session, task_id: TaskId) -> DeckResult<()> {
        let page = self.require_current_page()?;
        let result = session.commands().delete_task(task_id).await;
        if let Err(err) = result {
            session
                .messages
                .error(format!("Failed to delete task: {err}"));
            return Err(err);
        }
        self.reload(session, &page).await?;
        session.messages.success("Task deleted");
        Ok(())
    }

    /// Create a card on the current page, placing it through the canvas's
    /// collision-avoidant grid and writing the chosen position back.
    pub async fn create_card(
        &mut self,
        session: &mut Session,
        name: &str,
        description: Option<&str>,
        status: Option<&str>,
    ) -> DeckResult<Card> {
        let page = self.require_current_page()?;
        let result = session
            .commands()
            .create_card_for_page(page.id, name, description, status)
            .await;
        let mut created = match result {
            Ok(created) => created,
            Err(err) => {
                session
                    .messages
                    .error(format!("Failed to create card: {err}"));
                return Err(err);
            }
        };

        let position = session.canvas.place_new_card(&self.data.cards);
        created.set_position(position);
        let position_result = session
            .commands()
            .update_card_position(created.id, position.x, position.y)
            .await;
        if let Err(err) = position_result {
            // Non-critical: the card exists, the next reload resyncs.
            tracing::debug!(card_id = created.id, "could not persist new card position: {err}");
        }

        self.reload(session, &page).await?;
        session.messages.success("Card created");
        Ok(created)
    }

    pub async fn update_card(&mut self, session: &mut Session, card: &Card) -> DeckResult<Card> {
        let page = self.require_current_page()?;
        let result = session.commands().update_card(card).await;
        let updated = match result {
            Ok(updated) => updated,
            Err(err) => {
                session
                    .messages
                    .error(format!("Failed to update card: {err}"));
                return Err(err);
            }
        };
        self.reload(session, &page).await?;
        session.messages.success("Card updated");
        Ok(updated)
    }

    /// Delete a card. The card's visual edges are purged before the backend
    /// delete so the edge layer is orphan-safe even if the delete fails or
    /// lags.
    pub async fn delete_card(&mut self, session: &mut Session, card_id: CardId) -> DeckResult<()> {
        let page = self.require_current_page()?;
        session.graph.remove_edges_for_card(self.workspace.id, card_id);

        let result = session.commands().delete_card(card_id).await;
        match result {
            Ok(()) => {
                self.reload(session, &page).await?;
                session.messages.success("Card deleted");
                Ok(())
            }
            Err(err) => {
                session
                    .messages
                    .error(format!("Failed to delete card: {err}"));
                Err(err)
            }
        }
    }

    /// Create a directed connection between two cards on the current page.
    pub async fn link_cards(
        &mut self,
        session: &mut Session,
        from_card_id: CardId,
        to_card_id: CardId,
    ) -> DeckResult<()> {
        let page = self.require_current_page()?;
        let result = session
            .commands()
            .create_connection(from_card_id, to_card_id)
            .await;
        if let Err(err) = result {
            session.messages.error(format!("Failed to link cards: {err}"));
            return Err(err);
        }
        self.reload(session, &page).await?;
        session.messages.success("Cards linked");
        Ok(())
    }

    /// Create a page in this workspace; the new page becomes current.
    pub async fn create_page(&mut self, session: &mut Session, name: &str) -> DeckResult<Page> {
        let result = session
            .commands()
            .create_page_for_workspace(self.workspace.id, name)
            .await;
        let page = match result {
            Ok(page) => page,
            Err(err) => {
                session
                    .messages
                    .error(format!("Failed to create page: {err}"));
                return Err(err);
            }
        };
        self.pages.push(page.clone());
        self.reload(session, &page).await?;
        session.messages.success("Page created");
        Ok(page)
    }

    pub async fn rename_page(
        &mut self,
        session: &mut Session,
        page_id: PageId,
        new_name: &str,
    ) -> DeckResult<()> {
        let result = session.commands().rename_page(page_id, new_name).await;
        if let Err(err) = result {
            session
                .messages
                .error(format!("Failed to rename page: {err}"));
            return Err(err);
        }
        if let Some(page) = self.pages.iter_mut().find(|p| p.id == page_id) {
            page.name = new_name.to_string();
        }
        if let Some(current) = self.current_page.as_mut() {
            if current.id == page_id {
                current.name = new_name.to_string();
            }
        }
        if let Some(page) = self.current_page.clone() {
            self.reload(session, &page).await?;
        }
        session.messages.success("Page renamed");
        Ok(())
    }

    /// Delete a page. If the current page was deleted, the first remaining
    /// page becomes current; with no pages left the content layers are
    /// cleared.
    pub async fn delete_page(&mut self, session: &mut Session, page_id: PageId) -> DeckResult<()> {
        let result = session.commands().delete_page(page_id).await;
        if let Err(err) = result {
            session
                .messages
                .error(format!("Failed to delete page: {err}"));
            return Err(err);
        }

        self.pages.retain(|p| p.id != page_id);
        let current_deleted = self.current_page.as_ref().map(|p| p.id) == Some(page_id);
        if current_deleted {
            if let Some(first) = self.pages.first().cloned() {
                self.reload(session, &first).await?;
            } else {
                self.current_page = None;
                self.data = PageData::default();
                self.clear_page_content(session);
            }
        } else if let Some(current) = self.current_page.clone() {
            self.reload(session, &current).await?;
        }
        session.messages.success("Page deleted");
        Ok(())
    }

    pub async fn delete_note(&mut self, session: &mut Session, note_id: NoteId) -> DeckResult<()> {
        let page = self.require_current_page()?;
        let result = session.commands().delete_note(note_id).await;
        if let Err(err) = result {
            session
                .messages
                .error(format!("Failed to delete note: {err}"));
            return Err(err);
        }
        self.reload(session, &page).await?;
        session.messages.success("Note deleted");
        Ok(())
    }

    pub async fn delete_image(
        &mut self,
        session: &mut Session,
        image_id: ImageId,
    ) -> DeckResult<()> {
        let page = self.require_current_page()?;
        let result = session.commands().delete_image(image_id).await;
        if let Err(err) = result {
            session
                .messages
                .error(format!("Failed to delete image: {err}"));
            return Err(err);
        }
        self.reload(session, &page).await?;
        session.messages.success("Image deleted");
        Ok(())
    }

    pub async fn delete_file(&mut self, session: &mut Session, file_id: FileId) -> DeckResult<()> {
        let page = self.require_current_page()?;
        let result = session.commands().delete_file(file_id).await;
        if let Err(err) = result {
            session
                .messages
                .error(format!("Failed to delete file: {err}"));
            return Err(err);
        }
        self.reload(session, &page).await?;
        session.messages.success("File deleted");
        Ok(())
    }
}
