use taskdeck_core::{DeckError, DeckResult, Point};
use taskdeck_domain::{Card, CardId, Connection, PageId, WorkspaceId};

use crate::view::Dom;

/// One rendered leader line between two card nodes. Edges hold element ids,
/// never node references; endpoints are re-resolved against the mounted
/// tree on every render and reposition.
#[derive(Debug, Clone)]
pub struct VisualEdge {
    pub workspace_id: WorkspaceId,
    pub page_id: PageId,
    pub from_card_id: CardId,
    pub to_card_id: CardId,
    from_element: String,
    to_element: String,
    pub path: (Point, Point),
    pub visible: bool,
}

/// Owns the visual edges for every open workspace.
///
/// Invariant: the live edges for a workspace are always a subset of the
/// connections whose two endpoints are presently mounted nodes in that
/// workspace. `render` fully replaces a workspace's edges, so two renders
/// in a row leave exactly the second call's edge count.
#[derive(Debug, Default)]
pub struct ConnectionGraph {
    edges: Vec<VisualEdge>,
}

impl ConnectionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the edge set for a page. Edges previously owned by the
    /// workspace are cleared first; connections with an unmounted endpoint
    /// are silently skipped, since the endpoint may simply not be rendered
    /// yet. A failure building one edge never aborts the rest.
    pub fn render(
        &mut self,
        dom: &Dom,
        workspace_id: WorkspaceId,
        page_id: PageId,
        connections: &[Connection],
    ) {
        self.edges.retain(|e| e.workspace_id != workspace_id);

        for connection in connections {
            let from_element = Card::element_id(connection.from_card_id);
            let to_element = Card::element_id(connection.to_card_id);
            if !dom.contains(&from_element) || !dom.contains(&to_element) {
                tracing::debug!(
                    from = connection.from_card_id,
                    to = connection.to_card_id,
                    "skipping connection with unmounted endpoint"
                );
                continue;
            }
            match Self::edge_path(dom, &from_element, &to_element) {
                Ok(path) => self.edges.push(VisualEdge {
                    workspace_id,
                    page_id,
                    from_card_id: connection.from_card_id,
                    to_card_id: connection.to_card_id,
                    from_element,
                    to_element,
                    path,
                    visible: true,
                }),
                Err(err) => {
                    tracing::error!(
                        from = connection.from_card_id,
                        to = connection.to_card_id,
                        "failed to build edge: {err}"
                    );
                }
            }
        }
    }

    fn edge_path(dom: &Dom, from_element: &str, to_element: &str) -> DeckResult<(Point, Point)> {
        let from = dom
            .rect(from_element)
            .ok_or_else(|| DeckError::StaleReference(from_element.to_string()))?;
        let to = dom
            .rect(to_element)
            .ok_or_else(|| DeckError::StaleReference(to_element.to_string()))?;
        Ok((from.center(), to.center()))
    }

    /// Recompute every edge path for one workspace. Pure geometry; called on
    /// window resize, container scroll, drag-move and drag-end. Edges whose
    /// endpoints have vanished since the last render are dropped, keeping
    /// the mounted-endpoints invariant.
    pub fn reposition(&mut self, dom: &Dom, workspace_id: WorkspaceId) {
        self.edges.retain_mut(|edge| {
            if edge.workspace_id != workspace_id {
                return true;
            }
            match Self::edge_path(dom, &edge.from_element, &edge.to_element) {
                Ok(path) => {
                    edge.path = path;
                    true
                }
                Err(err) => {
                    tracing::warn!(
                        from = edge.from_card_id,
                        to = edge.to_card_id,
                        "dropping edge with stale endpoint: {err}"
                    );
                    false
                }
            }
        });
    }

    /// Remove exactly the edges touching a card. Called before the card is
    /// deleted; this is the only legal way connections become orphan-safe.
    pub fn remove_edges_for_card(&mut self, workspace_id: WorkspaceId, card_id: CardId) -> usize {
        let initial_len = self.edges.len();
        self.edges.retain(|e| {
            e.workspace_id != workspace_id
                || (e.from_card_id != card_id && e.to_card_id != card_id)
        });
        let removed = initial_len - self.edges.len();
        if removed > 0 {
            tracing::debug!(workspace_id, card_id, removed, "purged edges for card");
        }
        removed
    }

    /// Drop all edges owned by a workspace (tab close / repurpose).
    pub fn clear_workspace(&mut self, workspace_id: WorkspaceId) -> usize {
        let initial_len = self.edges.len();
        self.edges.retain(|e| e.workspace_id != workspace_id);
        initial_len - self.edges.len()
    }

    /// Hide a workspace's edges without destroying them (tab deactivation).
    pub fn hide_workspace(&mut self, workspace_id: WorkspaceId) {
        for edge in self.edges.iter_mut().filter(|e| e.workspace_id == workspace_id) {
            edge.visible = false;
        }
    }

    /// Restore visibility for a workspace's edges and refresh their paths.
    pub fn show_workspace(&mut self, dom: &Dom, workspace_id: WorkspaceId) {
        self.reposition(dom, workspace_id);
        for edge in self.edges.iter_mut().filter(|e| e.workspace_id == workspace_id) {
            edge.visible = true;
        }
    }

    pub fn edges_for(&self, workspace_id: WorkspaceId) -> impl Iterator<Item = &VisualEdge> {
        self.edges.iter().filter(move |e| e.workspace_id == workspace_id)
    }

    pub fn edge_count_for(&self, workspace_id: WorkspaceId) -> usize {
        self.edges_for(workspace_id).count()
    }

    pub fn visible_edge_count_for(&self, workspace_id: WorkspaceId) -> usize {
        self.edges_for(workspace_id).filter(|e| e.visible).count()
    }

    pub fn has_edge(&self, workspace_id: WorkspaceId, from: CardId, to: CardId) -> bool {
        self.edges_for(workspace_id)
            .any(|e| e.from_card_id == from && e.to_card_id == to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskdeck_core::{Rect, Size};

    fn dom_with_cards(cards: &[(CardId, f64, f64)]) -> Dom {
        let mut dom = Dom::new(Size::new(1280.0, 720.0));
        dom.mount_root("grid", "cards-grid").unwrap();
        for (id, x, y) in cards {
            dom.mount(
                "grid",
                &Card::element_id(*id),
                "task-card",
                Rect::new(*x, *y, 250.0, 150.0),
            )
            .unwrap();
        }
        dom
    }

    #[test]
    fn test_render_creates_edges_for_mounted_endpoints() {
        let dom = dom_with_cards(&[(1, 20.0, 20.0), (2, 270.0, 20.0)]);
        let mut graph = ConnectionGraph::new();

        graph.render(&dom, 1, 5, &[Connection::new(1, 2)]);
        assert_eq!(graph.edge_count_for(1), 1);
        assert!(graph.has_edge(1, 1, 2));

        let edge = graph.edges_for(1).next().unwrap();
        assert_eq!(edge.path.0, Point::new(145.0, 95.0));
        assert_eq!(edge.path.1, Point::new(395.0, 95.0));
    }

    #[test]
    fn test_render_skips_missing_endpoints() {
        let dom = dom_with_cards(&[(1, 20.0, 20.0)]);
        let mut graph = ConnectionGraph::new();

        graph.render(&dom, 1, 5, &[Connection::new(1, 2), Connection::new(2, 3)]);
        assert_eq!(graph.edge_count_for(1), 0);
    }

    #[test]
    fn test_rerender_does_not_duplicate() {
        let dom = dom_with_cards(&[(1, 20.0, 20.0), (2, 270.0, 20.0)]);
        let mut graph = ConnectionGraph::new();
        let connections = [Connection::new(1, 2)];

        graph.render(&dom, 1, 5, &connections);
        graph.render(&dom, 1, 5, &connections);
        assert_eq!(graph.edge_count_for(1), 1);

        graph.render(&dom, 1, 5, &[]);
        assert_eq!(graph.edge_count_for(1), 0);
    }

    #[test]
    fn test_render_is_scoped_to_workspace() {
        let mut dom = dom_with_cards(&[(1, 20.0, 20.0), (2, 270.0, 20.0)]);
        dom.mount(
            "grid",
            &Card::element_id(3),
            "task-card",
            Rect::new(20.0, 190.0, 250.0, 150.0),
        )
        .unwrap();
        dom.mount(
            "grid",
            &Card::element_id(4),
            "task-card",
            Rect::new(270.0, 190.0, 250.0, 150.0),
        )
        .unwrap();

        let mut graph = ConnectionGraph::new();
        graph.render(&dom, 1, 5, &[Connection::new(1, 2)]);
        graph.render(&dom, 2, 9, &[Connection::new(3, 4)]);

        assert_eq!(graph.edge_count_for(1), 1);
        assert_eq!(graph.edge_count_for(2), 1);

        graph.render(&dom, 1, 5, &[]);
        assert_eq!(graph.edge_count_for(1), 0);
        assert_eq!(graph.edge_count_for(2), 1);
    }

    #[test]
    fn test_reposition_follows_moved_cards() {
        let mut dom = dom_with_cards(&[(1, 20.0, 20.0), (2, 270.0, 20.0)]);
        let mut graph = ConnectionGraph::new();
        graph.render(&dom, 1, 5, &[Connection::new(1, 2)]);

        dom.translate(&Card::element_id(1), 100.0, 50.0).unwrap();
        graph.reposition(&dom, 1);

        let edge = graph.edges_for(1).next().unwrap();
        assert_eq!(edge.path.0, Point::new(245.0, 145.0));
    }

    #[test]
    fn test_reposition_drops_edges_with_unmounted_endpoints() {
        let mut dom = dom_with_cards(&[(1, 20.0, 20.0), (2, 270.0, 20.0)]);
        let mut graph = ConnectionGraph::new();
        graph.render(&dom, 1, 5, &[Connection::new(1, 2)]);

        dom.remove(&Card::element_id(2));
        graph.reposition(&dom, 1);
        assert_eq!(graph.edge_count_for(1), 0);
    }

    #[test]
    fn test_remove_edges_for_card() {
        let dom = dom_with_cards(&[(1, 20.0, 20.0), (2, 270.0, 20.0), (3, 20.0, 190.0)]);
        let mut graph = ConnectionGraph::new();
        graph.render(
            &dom,
            1,
            5,
            &[Connection::new(1, 2), Connection::new(3, 1), Connection::new(2, 3)],
        );

        assert_eq!(graph.remove_edges_for_card(1, 1), 2);
        assert_eq!(graph.edge_count_for(1), 1);
        assert!(graph.has_edge(1, 2, 3));
    }

    #[test]
    fn test_hide_and_show_workspace() {
        let dom = dom_with_cards(&[(1, 20.0, 20.0), (2, 270.0, 20.0)]);
        let mut graph = ConnectionGraph::new();
        graph.render(&dom, 1, 5, &[Connection::new(1, 2)]);

        graph.hide_workspace(1);
        assert_eq!(graph.visible_edge_count_for(1), 0);
        assert_eq!(graph.edge_count_for(1), 1);

        graph.show_workspace(&dom, 1);
        assert_eq!(graph.visible_edge_count_for(1), 1);
    }
}
