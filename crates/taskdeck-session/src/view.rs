use std::collections::HashMap;
use taskdeck_core::{DeckError, DeckResult, Point, Rect, Size};
use taskdeck_domain::{CardId, PageId, WorkspaceId};

/// Input events an element can listen for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    PointerDown,
}

/// What a listener does when its event fires.
///
/// Handlers are plain data rather than closures so that ownership can be
/// tracked per workspace and torn down in bulk, and so a handler can never
/// capture a node that has since been unmounted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    StartCardDrag(CardId),
    OpenCardWorkspace(CardId),
    SelectPage(PageId),
    ActivateWorkspace(WorkspaceId),
    CloseWorkspace(WorkspaceId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Listener {
    pub element_id: String,
    pub event: EventKind,
    pub handler: Handler,
}

/// A mounted element: a rectangle with an identity, a class and a place in
/// the tree. Coordinates are absolute.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: String,
    pub class: String,
    pub rect: Rect,
    pub visible: bool,
    parent: Option<String>,
    children: Vec<String>,
}

/// The mounted-node tree the session renders into.
///
/// This is the shell boundary: the surrounding UI mirrors this tree into
/// whatever real widget system it uses. Element ids are unique; mounting a
/// duplicate id is a contract error, and listeners can only be attached to
/// currently-mounted nodes.
#[derive(Debug, Default)]
pub struct Dom {
    nodes: HashMap<String, Node>,
    roots: Vec<String>,
    listeners: Vec<Listener>,
    viewport: Size,
}

impl Dom {
    pub fn new(viewport: Size) -> Self {
        Self {
            viewport,
            ..Self::default()
        }
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
    }

    pub fn mount_root(&mut self, id: &str, class: &str) -> DeckResult<()> {
        self.insert_node(None, id, class, Rect::default())
    }

    pub fn mount(&mut self, parent: &str, id: &str, class: &str, rect: Rect) -> DeckResult<()> {
        if !self.nodes.contains_key(parent) {
            return Err(DeckError::MissingContainer(parent.to_string()));
        }
        self.insert_node(Some(parent.to_string()), id, class, rect)
    }

    fn insert_node(
        &mut self,
        parent: Option<String>,
        id: &str,
        class: &str,
        rect: Rect,
    ) -> DeckResult<()> {
        if self.nodes.contains_key(id) {
            return Err(DeckError::Validation(format!("duplicate element id: {id}")));
        }
        match &parent {
            Some(parent_id) => {
                if let Some(parent_node) = self.nodes.get_mut(parent_id) {
                    parent_node.children.push(id.to_string());
                }
            }
            None => self.roots.push(id.to_string()),
        }
        self.nodes.insert(
            id.to_string(),
            Node {
                id: id.to_string(),
                class: class.to_string(),
                rect,
                visible: true,
                parent,
                children: Vec::new(),
            },
        );
        Ok(())
    }

    /// Remove an element and its subtree, detaching their listeners.
    /// Removing an absent element is a no-op.
    pub fn remove(&mut self, id: &str) -> Vec<String> {
        let parent_id = match self.nodes.get(id) {
            Some(node) => node.parent.clone(),
            None => return Vec::new(),
        };

        let mut removed = Vec::new();
        let mut stack = vec![id.to_string()];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(&current) {
                stack.extend(node.children);
                removed.push(current);
            }
        }

        if let Some(parent_id) = parent_id {
            if let Some(parent) = self.nodes.get_mut(&parent_id) {
                parent.children.retain(|c| c != id);
            }
        }
        self.roots.retain(|r| r != id);
        self.listeners.retain(|l| !removed.contains(&l.element_id));
        removed
    }

    /// Remove all children of an element, leaving the element itself.
    pub fn clear_children(&mut self, id: &str) -> DeckResult<Vec<String>> {
        let children = self
            .nodes
            .get(id)
            .ok_or_else(|| DeckError::MissingContainer(id.to_string()))?
            .children
            .clone();
        let mut removed = Vec::new();
        for child in children {
            removed.extend(self.remove(&child));
        }
        Ok(removed)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn rect(&self, id: &str) -> Option<Rect> {
        self.nodes.get(id).map(|n| n.rect)
    }

    pub fn class(&self, id: &str) -> Option<&str> {
        self.nodes.get(id).map(|n| n.class.as_str())
    }

    pub fn children(&self, id: &str) -> Vec<String> {
        self.nodes
            .get(id)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn set_rect(&mut self, id: &str, rect: Rect) -> DeckResult<()> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| DeckError::StaleReference(id.to_string()))?;
        node.rect = rect;
        Ok(())
    }

    pub fn translate(&mut self, id: &str, dx: f64, dy: f64) -> DeckResult<()> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| DeckError::StaleReference(id.to_string()))?;
        node.rect.translate(dx, dy);
        Ok(())
    }

    pub fn set_visible(&mut self, id: &str, visible: bool) -> DeckResult<()> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| DeckError::StaleReference(id.to_string()))?;
        node.visible = visible;
        Ok(())
    }

    /// Visibility of an element accounting for hidden ancestors.
    pub fn is_visible(&self, id: &str) -> bool {
        let mut current = match self.nodes.get(id) {
            Some(node) => node,
            None => return false,
        };
        loop {
            if !current.visible {
                return false;
            }
            match current.parent.as_deref().and_then(|p| self.nodes.get(p)) {
                Some(parent) => current = parent,
                None => return true,
            }
        }
    }

    /// Attach a listener. The element must be mounted.
    pub fn add_listener(
        &mut self,
        element_id: &str,
        event: EventKind,
        handler: Handler,
    ) -> DeckResult<()> {
        if !self.nodes.contains_key(element_id) {
            return Err(DeckError::StaleReference(element_id.to_string()));
        }
        let listener = Listener {
            element_id: element_id.to_string(),
            event,
            handler,
        };
        if !self.listeners.contains(&listener) {
            self.listeners.push(listener);
        }
        Ok(())
    }

    /// Detach an exact listener. Detaching one that is not attached (or
    /// whose element is gone) is a no-op.
    pub fn remove_listener(&mut self, element_id: &str, event: EventKind, handler: Handler) {
        self.listeners
            .retain(|l| !(l.element_id == element_id && l.event == event && l.handler == handler));
    }

    pub fn remove_listeners_for(&mut self, element_id: &str) -> usize {
        let initial_len = self.listeners.len();
        self.listeners.retain(|l| l.element_id != element_id);
        initial_len - self.listeners.len()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn listeners_for(&self, element_id: &str) -> Vec<Listener> {
        self.listeners
            .iter()
            .filter(|l| l.element_id == element_id)
            .cloned()
            .collect()
    }

    pub fn find_listener(&self, element_id: &str, event: EventKind) -> Option<Handler> {
        self.listeners
            .iter()
            .find(|l| l.element_id == element_id && l.event == event)
            .map(|l| l.handler)
    }

    /// Resolve a pointer event to the topmost listening element under the
    /// point. Listeners on unmounted or hidden elements never fire.
    pub fn hit_test(&self, point: Point, event: EventKind) -> Option<Handler> {
        self.listeners.iter().rev().find_map(|listener| {
            if listener.event != event {
                return None;
            }
            let node = self.nodes.get(&listener.element_id)?;
            if !self.is_visible(&node.id) || !node.rect.contains(point) {
                return None;
            }
            Some(listener.handler)
        })
    }
}
