use std::collections::{HashMap, HashSet};
use taskdeck_core::{DeckResult, Rect};
use taskdeck_domain::{PageId, WorkspaceId};

use crate::view::{Dom, EventKind, Handler, Listener};

/// Generates collision-free element ids namespaced by workspace and page,
/// and records ownership of created elements and listeners so a workspace
/// can be torn down in bulk when its tab closes.
#[derive(Debug, Default)]
pub struct ScopeRegistry {
    elements: HashMap<WorkspaceId, HashSet<String>>,
    listeners: HashMap<WorkspaceId, Vec<Listener>>,
}

impl ScopeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deterministic scoped id: the same inputs always map to the same id,
    /// and ids from different workspaces or pages can never collide.
    pub fn scoped_id(workspace_id: WorkspaceId, page_id: Option<PageId>, base_id: &str) -> String {
        match page_id {
            Some(page_id) => format!("ws-{workspace_id}-pg-{page_id}-{base_id}"),
            None => format!("ws-{workspace_id}-{base_id}"),
        }
    }

    /// Record ownership of an element for later teardown.
    pub fn track(&mut self, workspace_id: WorkspaceId, element_id: &str) {
        self.elements
            .entry(workspace_id)
            .or_default()
            .insert(element_id.to_string());
    }

    /// Record ownership of a listener for later teardown.
    pub fn track_listener(
        &mut self,
        workspace_id: WorkspaceId,
        element_id: &str,
        event: EventKind,
        handler: Handler,
    ) {
        let listener = Listener {
            element_id: element_id.to_string(),
            event,
            handler,
        };
        let tracked = self.listeners.entry(workspace_id).or_default();
        if !tracked.contains(&listener) {
            tracked.push(listener);
        }
    }

    /// Mount an element with a scoped id and track it. Returns the scoped id.
    pub fn create_element(
        &mut self,
        dom: &mut Dom,
        workspace_id: WorkspaceId,
        page_id: Option<PageId>,
        parent_id: &str,
        base_id: &str,
        class: &str,
        rect: Rect,
    ) -> DeckResult<String> {
        let element_id = Self::scoped_id(workspace_id, page_id, base_id);
        dom.mount(parent_id, &element_id, class, rect)?;
        self.track(workspace_id, &element_id);
        Ok(element_id)
    }

    /// Attach a listener and track it.
    pub fn listen(
        &mut self,
        dom: &mut Dom,
        workspace_id: WorkspaceId,
        element_id: &str,
        event: EventKind,
        handler: Handler,
    ) -> DeckResult<()> {
        dom.add_listener(element_id, event, handler)?;
        self.track_listener(workspace_id, element_id, event, handler);
        Ok(())
    }

    /// Remove every tracked element still mounted and detach every tracked
    /// listener, then clear the bookkeeping for this workspace.
    ///
    /// Idempotent: tearing down an already-torn-down or never-registered
    /// workspace is a no-op, and elements already removed by other code are
    /// skipped without error.
    pub fn teardown(&mut self, workspace_id: WorkspaceId, dom: &mut Dom) {
        if let Some(listeners) = self.listeners.remove(&workspace_id) {
            for listener in listeners {
                dom.remove_listener(&listener.element_id, listener.event, listener.handler);
            }
        }
        if let Some(elements) = self.elements.remove(&workspace_id) {
            let mut removed = 0usize;
            for element_id in elements {
                removed += dom.remove(&element_id).len();
            }
            tracing::debug!(workspace_id, removed, "tore down workspace scope");
        }
    }

    pub fn tracked_element_count(&self, workspace_id: WorkspaceId) -> usize {
        self.elements.get(&workspace_id).map_or(0, HashSet::len)
    }

    pub fn tracked_listener_count(&self, workspace_id: WorkspaceId) -> usize {
        self.listeners.get(&workspace_id).map_or(0, Vec::len)
    }
}
