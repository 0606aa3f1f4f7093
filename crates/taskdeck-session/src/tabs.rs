use taskdeck_core::{DeckError, DeckResult, Rect};
use taskdeck_domain::{CardId, PageId, Workspace, WorkspaceId};

use crate::events::UiEvent;
use crate::page_context::PageContext;
use crate::session::Session;
use crate::view::{EventKind, Handler};

const TAB_BAR_ID: &str = "tabs-bar";
const EMPTY_STATE_ID: &str = "tabs-empty-state";
const TAB_BUTTON_WIDTH: f64 = 160.0;

/// One open workspace session: a view subtree, an activation flag and the
/// page context that owns its data. Tabs not in the open set do not exist;
/// closing a tab discards all of its state.
pub struct Tab {
    root_id: String,
    active: bool,
    opened_seq: u64,
    pub context: PageContext,
}

impl Tab {
    pub fn workspace_id(&self) -> WorkspaceId {
        self.context.workspace().id
    }

    pub fn root_id(&self) -> &str {
        &self.root_id
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

/// Owns the set of open workspace tabs and their lifecycles. The top-level
/// orchestrator: composes the session's canvas, graph and scope registry
/// and routes shell input events.
pub struct TabManager {
    session: Session,
    tabs: Vec<Tab>,
    next_seq: u64,
    suppress_click: bool,
}

impl TabManager {
    pub fn new(mut session: Session) -> Self {
        if let Err(err) = session.dom.mount_root(TAB_BAR_ID, "tabs-bar") {
            tracing::error!("could not mount tab bar: {err}");
        }
        if let Err(err) = session.dom.mount_root(EMPTY_STATE_ID, "tabs-empty-state") {
            tracing::error!("could not mount empty state: {err}");
        }
        Self {
            session,
            tabs: Vec::new(),
            next_seq: 0,
            suppress_click: false,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn tab_count(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_open(&self, workspace_id: WorkspaceId) -> bool {
        self.tabs.iter().any(|t| t.workspace_id() == workspace_id)
    }

    pub fn open_workspace_ids(&self) -> Vec<WorkspaceId> {
        self.tabs.iter().map(Tab::workspace_id).collect()
    }

    /// Read hook for the navigation sidebar: the workspace to highlight.
    pub fn active_workspace_id(&self) -> Option<WorkspaceId> {
        self.tabs.iter().find(|t| t.active).map(Tab::workspace_id)
    }

    pub fn active_tab(&self) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.active)
    }

    /// Whether the shell should show the no-tabs empty state.
    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    /// Split borrow for mutation helpers: the session and the active tab's
    /// page context.
    pub fn active_parts_mut(&mut self) -> Option<(&mut Session, &mut PageContext)> {
        let index = self.tabs.iter().position(|t| t.active)?;
        Some((&mut self.session, &mut self.tabs[index].context))
    }

    /// Open a workspace.
    ///
    /// Already open and not forced: the existing tab is activated (which
    /// reloads, covering backend changes made while it was inactive). Not
    /// open while exactly one other tab is open and not forced: that tab is
    /// repurposed in place rather than opening a second one. Otherwise a
    /// new tab is created and activated.
    pub async fn open(&mut self, workspace: Workspace, force_new: bool) -> DeckResult<()> {
        let workspace_id = workspace.id;
        if self.is_open(workspace_id) {
            // One tab per workspace: scope ownership is keyed by workspace
            // id, so a forced duplicate would collide. Activate instead.
            return self.activate(workspace_id).await;
        }
        if !force_new && self.tabs.len() == 1 {
            let previous = self.tabs.remove(0);
            self.discard_tab(previous);
        }

        let tab = match self.mount_tab(workspace).await {
            Ok(tab) => tab,
            Err(err) => {
                self.update_empty_state();
                if let Err(render_err) = self.render_tab_bar() {
                    tracing::warn!("tab bar render failed: {render_err}");
                }
                return Err(err);
            }
        };
        self.tabs.push(tab);
        self.update_empty_state();
        self.activate(workspace_id).await
    }

    /// Deactivate all other tabs (hiding their content and their edges,
    /// without destroying either), show the target and reload it for
    /// robustness against stale background state.
    pub async fn activate(&mut self, workspace_id: WorkspaceId) -> DeckResult<()> {
        let index = self
            .tabs
            .iter()
            .position(|t| t.workspace_id() == workspace_id)
            .ok_or_else(|| DeckError::NotFound(format!("workspace {workspace_id} is not open")))?;

        for tab in &mut self.tabs {
            let is_active = tab.workspace_id() == workspace_id;
            tab.active = is_active;
            if let Err(err) = self.session.dom.set_visible(&tab.root_id, is_active) {
                tracing::warn!("tab pane missing during activation: {err}");
            }
            if !is_active {
                self.session.graph.hide_workspace(tab.workspace_id());
            }
        }
        self.session.graph.show_workspace(&self.session.dom, workspace_id);
        if let Err(err) = self.render_tab_bar() {
            tracing::warn!("tab bar render failed: {err}");
        }

        if let Some(page) = self.tabs[index].context.current_page().cloned() {
            if let Err(err) = self.tabs[index]
                .context
                .reload(&mut self.session, &page)
                .await
            {
                tracing::warn!(workspace_id, "reload on activation failed: {err}");
            }
        }
        Ok(())
    }

    /// Close a tab: tear down everything scoped to its workspace, remove its
    /// subtree, and activate the most recently opened remaining tab (or show
    /// the empty state).
    pub async fn close(&mut self, workspace_id: WorkspaceId) -> DeckResult<()> {
        let index = self
            .tabs
            .iter()
            .position(|t| t.workspace_id() == workspace_id)
            .ok_or_else(|| DeckError::NotFound(format!("workspace {workspace_id} is not open")))?;
        let tab = self.tabs.remove(index);
        self.discard_tab(tab);
        self.update_empty_state();

        let next = self
            .tabs
            .iter()
            .max_by_key(|t| t.opened_seq)
            .map(Tab::workspace_id);
        match next {
            Some(next) => self.activate(next).await,
            None => {
                if let Err(err) = self.render_tab_bar() {
                    tracing::warn!("tab bar render failed: {err}");
                }
                Ok(())
            }
        }
    }

    /// Open the workspace a card references (card-as-reference navigation).
    pub async fn open_card_workspace(&mut self, card_id: CardId) -> DeckResult<()> {
        let result = self.session.commands().fetch_workspace_for_card(card_id).await;
        let workspace = match result {
            Ok(workspace) => workspace,
            Err(err) => {
                self.session
                    .messages
                    .error(format!("Failed to open workspace for card: {err}"));
                return Err(err);
            }
        };
        self.open(workspace, false).await
    }

    /// Reload the active tab's current page.
    pub async fn reload_active(&mut self) -> DeckResult<()> {
        let index = self
            .tabs
            .iter()
            .position(|t| t.active)
            .ok_or_else(|| DeckError::Validation("no active tab".to_string()))?;
        let page = self.tabs[index]
            .context
            .current_page()
            .cloned()
            .ok_or_else(|| DeckError::Validation("no current page".to_string()))?;
        self.tabs[index]
            .context
            .reload(&mut self.session, &page)
            .await
    }

    /// Switch the active tab to another of its pages.
    pub async fn select_page(&mut self, page_id: PageId) -> DeckResult<()> {
        let index = self
            .tabs
            .iter()
            .position(|t| t.active)
            .ok_or_else(|| DeckError::Validation("no active tab".to_string()))?;
        self.tabs[index]
            .context
            .select_page(&mut self.session, page_id)
            .await
    }

    /// Route a shell input event.
    pub async fn handle_event(&mut self, event: UiEvent) -> DeckResult<()> {
        match event {
            UiEvent::Resized(size) => {
                self.session.dom.set_viewport(size);
                if let Some(workspace_id) = self.active_workspace_id() {
                    self.session.graph.reposition(&self.session.dom, workspace_id);
                }
            }
            UiEvent::Scrolled => {
                if let Some(workspace_id) = self.active_workspace_id() {
                    self.session.graph.reposition(&self.session.dom, workspace_id);
                }
            }
            UiEvent::PointerDown(point) => {
                if let Some(Handler::StartCardDrag(card_id)) =
                    self.session.dom.hit_test(point, EventKind::PointerDown)
                {
                    if let Some(workspace_id) = self.active_workspace_id() {
                        self.session
                            .canvas
                            .pointer_down(&self.session.dom, workspace_id, card_id);
                    }
                }
            }
            UiEvent::PointerMoved { dx, dy } => {
                self.session
                    .canvas
                    .drag_move(&mut self.session.dom, &mut self.session.graph, dx, dy);
            }
            UiEvent::PointerUp => {
                let backend = self.session.backend_arc();
                let outcome = self.session.canvas.drag_end(
                    &mut self.session.dom,
                    &mut self.session.graph,
                    &backend,
                );
                // A real drag eats the click that follows pointer-up.
                self.suppress_click = outcome.is_some_and(|o| o.was_drag);
            }
            UiEvent::Clicked(point) => {
                if self.suppress_click {
                    self.suppress_click = false;
                    return Ok(());
                }
                match self.session.dom.hit_test(point, EventKind::Click) {
                    Some(Handler::SelectPage(page_id)) => self.select_page(page_id).await?,
                    Some(Handler::OpenCardWorkspace(card_id)) => {
                        self.open_card_workspace(card_id).await?
                    }
                    Some(Handler::ActivateWorkspace(workspace_id)) => {
                        self.activate(workspace_id).await?
                    }
                    Some(Handler::CloseWorkspace(workspace_id)) => {
                        self.close(workspace_id).await?
                    }
                    Some(Handler::StartCardDrag(_)) | None => {}
                }
            }
        }
        Ok(())
    }

    async fn mount_tab(&mut self, workspace: Workspace) -> DeckResult<Tab> {
        let workspace_id = workspace.id;
        let root_id = format!("tab-{workspace_id}");
        self.session.dom.mount_root(&root_id, "tab-pane")?;
        self.session.scope.track(workspace_id, &root_id);

        // The tab bar occupies the top row; pane content starts below it.
        let scaffold = [
            ("page-tabs", "workspace-tabs", Rect::new(0.0, 44.0, 960.0, 36.0)),
            ("task-table", "task-table-wrapper", Rect::new(0.0, 88.0, 960.0, 192.0)),
            ("cards-grid", "cards-grid", Rect::new(0.0, 288.0, 960.0, 420.0)),
            ("page-blocks", "page-blocks-container", Rect::new(0.0, 716.0, 960.0, 360.0)),
        ];
        for (base_id, class, rect) in scaffold {
            self.session.scope.create_element(
                &mut self.session.dom,
                workspace_id,
                None,
                &root_id,
                base_id,
                class,
                rect,
            )?;
        }

        let pages_result = self
            .session
            .commands()
            .fetch_pages_for_workspace(workspace_id)
            .await;
        let pages = match pages_result {
            Ok(pages) => pages,
            Err(err) => {
                self.session
                    .messages
                    .error(format!("Failed to load workspace pages: {err}"));
                self.session.scope.teardown(workspace_id, &mut self.session.dom);
                return Err(err);
            }
        };

        let mut context = PageContext::new(workspace, pages);
        if let Some(first) = context.pages().first().cloned() {
            if let Err(err) = context.reload(&mut self.session, &first).await {
                tracing::warn!(workspace_id, "initial page reload failed: {err}");
            }
        }

        let opened_seq = self.next_seq;
        self.next_seq += 1;
        tracing::debug!(workspace_id, opened_seq, "opened workspace tab");
        Ok(Tab {
            root_id,
            active: false,
            opened_seq,
            context,
        })
    }

    fn discard_tab(&mut self, tab: Tab) {
        let workspace_id = tab.workspace_id();
        self.session.graph.clear_workspace(workspace_id);
        self.session.scope.teardown(workspace_id, &mut self.session.dom);
        // Guard for anything mounted under the root outside the registry.
        self.session.dom.remove(&tab.root_id);
        tracing::debug!(workspace_id, "discarded workspace tab");
    }

    fn update_empty_state(&mut self) {
        let empty = self.tabs.is_empty();
        if let Err(err) = self.session.dom.set_visible(EMPTY_STATE_ID, empty) {
            tracing::warn!("empty state node missing: {err}");
        }
    }

    /// Rebuild the workspace tab bar: one button and one close control per
    /// open tab, owned by that tab's workspace scope.
    fn render_tab_bar(&mut self) -> DeckResult<()> {
        let Self { session, tabs, .. } = self;
        for child in session.dom.children(TAB_BAR_ID) {
            session.dom.remove_listeners_for(&child);
        }
        session.dom.clear_children(TAB_BAR_ID)?;

        for (index, tab) in tabs.iter().enumerate() {
            let workspace_id = tab.workspace_id();
            let x = index as f64 * TAB_BUTTON_WIDTH;
            let class = if tab.active { "tab active" } else { "tab" };
            let button = session.scope.create_element(
                &mut session.dom,
                workspace_id,
                None,
                TAB_BAR_ID,
                "tab-button",
                class,
                Rect::new(x, 0.0, TAB_BUTTON_WIDTH, 36.0),
            )?;
            session.scope.listen(
                &mut session.dom,
                workspace_id,
                &button,
                EventKind::Click,
                Handler::ActivateWorkspace(workspace_id),
            )?;
            let close = session.scope.create_element(
                &mut session.dom,
                workspace_id,
                None,
                TAB_BAR_ID,
                "tab-close",
                "close-tab",
                Rect::new(x + TAB_BUTTON_WIDTH - 24.0, 8.0, 20.0, 20.0),
            )?;
            session.scope.listen(
                &mut session.dom,
                workspace_id,
                &close,
                EventKind::Click,
                Handler::CloseWorkspace(workspace_id),
            )?;
        }
        Ok(())
    }
}
