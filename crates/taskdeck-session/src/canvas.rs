use std::sync::Arc;
use taskdeck_backend::{Backend, Commands};
use taskdeck_core::{CanvasConfig, DeckError, DeckResult, Point, Rect};
use taskdeck_domain::{Card, CardId, WorkspaceId};

use crate::graph::ConnectionGraph;
use crate::scope::ScopeRegistry;
use crate::view::{Dom, EventKind, Handler};

/// Per-card drag state: idle -> dragging -> idle. Dragging is entered on
/// pointer-down and exited on pointer-up; `moved` distinguishes a drag from
/// a click-to-open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DragState {
    Idle,
    Dragging {
        workspace_id: WorkspaceId,
        card_id: CardId,
        moved: bool,
    },
}

/// Result of a completed pointer-up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragOutcome {
    pub workspace_id: WorkspaceId,
    pub card_id: CardId,
    pub position: Point,
    /// False when the pointer never moved: the gesture was a click, and the
    /// card's click-to-open handler should fire instead.
    pub was_drag: bool,
}

/// Owns card placement, the card layer rebuild, and the drag interaction.
///
/// A shared facility parameterized by workspace id on every call; it holds
/// no per-workspace state beyond the single in-flight drag.
#[derive(Debug)]
pub struct CardCanvas {
    config: CanvasConfig,
    drag: DragState,
}

impl CardCanvas {
    pub fn new(config: CanvasConfig) -> Self {
        Self {
            config,
            drag: DragState::Idle,
        }
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    fn card_rect(&self, position: Point) -> Rect {
        Rect::new(
            position.x,
            position.y,
            self.config.card_width,
            self.config.card_height,
        )
    }

    /// Compute a position for a new card: start at the grid cell indexed by
    /// the count of existing cards, advance through subsequent cells while
    /// the candidate rectangle overlaps any existing card's stored position,
    /// and fall back to a diagonal stagger once the retry bound is spent.
    /// New cards stay visually distinguishable even under pathological
    /// existing layouts.
    pub fn place_new_card(&self, existing: &[Card]) -> Point {
        let mut cell = existing.len();
        for _ in 0..self.config.placement_attempts {
            let (x, y) = self.config.grid_cell(cell);
            let candidate = self.card_rect(Point::new(x, y));
            let overlaps = existing
                .iter()
                .any(|card| self.card_rect(card.position()).overlaps(&candidate));
            if !overlaps {
                return Point::new(x, y);
            }
            cell += 1;
        }

        let count = existing.len();
        tracing::warn!(count, "placement retries exhausted, using staggered fallback");
        Point::new(
            self.config.start_x
                + (count % self.config.stagger_per_row) as f64 * self.config.stagger_x,
            self.config.start_y
                + (count / self.config.stagger_per_row) as f64 * self.config.stagger_y,
        )
    }

    /// Full rebuild of the card layer for a page.
    ///
    /// Drag handlers on the previous nodes are detached before the nodes are
    /// replaced, so no handler survives a re-render. If a render happens
    /// mid-drag, the dragged card keeps its current optimistic position
    /// instead of resetting to the fetched one.
    pub fn render(
        &mut self,
        dom: &mut Dom,
        scope: &mut ScopeRegistry,
        workspace_id: WorkspaceId,
        cards: &[Card],
    ) -> DeckResult<()> {
        let grid_id = ScopeRegistry::scoped_id(workspace_id, None, "cards-grid");
        let grid_rect = dom
            .rect(&grid_id)
            .ok_or_else(|| DeckError::MissingContainer(grid_id.clone()))?;
        let origin = grid_rect.origin();

        let preserved = match self.drag {
            DragState::Dragging {
                workspace_id: drag_workspace,
                card_id,
                ..
            } if drag_workspace == workspace_id => {
                dom.rect(&Card::element_id(card_id)).map(|rect| (card_id, rect))
            }
            _ => None,
        };

        for child in dom.children(&grid_id) {
            dom.remove_listeners_for(&child);
        }
        dom.clear_children(&grid_id)?;

        for card in cards {
            let element_id = Card::element_id(card.id);
            // Stored positions are grid-relative; node rects are absolute.
            let rect = match preserved {
                Some((dragged_id, rect)) if dragged_id == card.id => rect,
                _ => self.card_rect(Point::new(origin.x + card.x, origin.y + card.y)),
            };
            if let Err(err) = dom.mount(&grid_id, &element_id, "task-card", rect) {
                tracing::error!(card_id = card.id, "failed to mount card: {err}");
                continue;
            }
            scope.track(workspace_id, &element_id);
            scope.listen(
                dom,
                workspace_id,
                &element_id,
                EventKind::PointerDown,
                Handler::StartCardDrag(card.id),
            )?;
            if card.has_workspace() {
                scope.listen(
                    dom,
                    workspace_id,
                    &element_id,
                    EventKind::Click,
                    Handler::OpenCardWorkspace(card.id),
                )?;
            }
        }
        tracing::debug!(workspace_id, count = cards.len(), "rendered card layer");
        Ok(())
    }

    /// Enter the dragging state for a card. Only cards with a mounted node
    /// and an attached drag handler can start a drag.
    pub fn pointer_down(&mut self, dom: &Dom, workspace_id: WorkspaceId, card_id: CardId) -> bool {
        if self.drag != DragState::Idle {
            return false;
        }
        let element_id = Card::element_id(card_id);
        if !dom.contains(&element_id)
            || dom.find_listener(&element_id, EventKind::PointerDown).is_none()
        {
            tracing::warn!(card_id, "ignoring pointer-down on unmounted card");
            return false;
        }
        self.drag = DragState::Dragging {
            workspace_id,
            card_id,
            moved: false,
        };
        true
    }

    /// Apply a pointer delta to the dragged card and synchronously track the
    /// edges. Pure geometry, cheap enough for animation-frame cadence.
    pub fn drag_move(&mut self, dom: &mut Dom, graph: &mut ConnectionGraph, dx: f64, dy: f64) {
        let DragState::Dragging {
            workspace_id,
            card_id,
            ..
        } = self.drag
        else {
            return;
        };
        let element_id = Card::element_id(card_id);
        match dom.translate(&element_id, dx, dy) {
            Ok(()) => {
                self.drag = DragState::Dragging {
                    workspace_id,
                    card_id,
                    moved: true,
                };
                graph.reposition(dom, workspace_id);
            }
            Err(err) => {
                // The node vanished mid-drag (deletion or re-render race).
                tracing::warn!(card_id, "ending drag on stale card: {err}");
                self.drag = DragState::Idle;
            }
        }
    }

    /// Exit the dragging state. If the card actually moved, its final
    /// position is written through the backend boundary fire-and-forget:
    /// the visual position is already correct locally, a failure is logged
    /// rather than surfaced, and a later reload resyncs from backend truth.
    pub fn drag_end(
        &mut self,
        dom: &mut Dom,
        graph: &mut ConnectionGraph,
        backend: &Arc<dyn Backend>,
    ) -> Option<DragOutcome> {
        let DragState::Dragging {
            workspace_id,
            card_id,
            moved,
        } = self.drag
        else {
            return None;
        };
        self.drag = DragState::Idle;

        let element_id = Card::element_id(card_id);
        let rect = match dom.rect(&element_id) {
            Some(rect) => rect,
            None => {
                tracing::warn!(card_id, "drag ended on unmounted card");
                return None;
            }
        };
        graph.reposition(dom, workspace_id);

        // Convert back to the grid-relative coordinates the backend stores.
        let grid_id = ScopeRegistry::scoped_id(workspace_id, None, "cards-grid");
        let grid_origin = dom.rect(&grid_id).map(|r| r.origin()).unwrap_or_default();
        let position = Point::new(rect.x - grid_origin.x, rect.y - grid_origin.y);
        if moved {
            let backend = Arc::clone(backend);
            tokio::spawn(async move {
                if let Err(err) = Commands::new(backend.as_ref())
                    .update_card_position(card_id, position.x, position.y)
                    .await
                {
                    tracing::warn!(card_id, "failed to save card position: {err}");
                }
            });
        }

        Some(DragOutcome {
            workspace_id,
            card_id,
            position,
            was_drag: moved,
        })
    }

    pub fn dragging_card(&self) -> Option<CardId> {
        match self.drag {
            DragState::Dragging { card_id, .. } => Some(card_id),
            DragState::Idle => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskdeck_core::Size;

    fn canvas() -> CardCanvas {
        CardCanvas::new(CanvasConfig::default())
    }

    fn card(id: CardId, x: f64, y: f64) -> Card {
        Card {
            id,
            page_id: 1,
            name: format!("card {id}"),
            status: None,
            description: None,
            x,
            y,
            workspace_id: None,
            created_date_time: None,
        }
    }

    #[test]
    fn test_first_card_goes_to_origin_cell() {
        assert_eq!(canvas().place_new_card(&[]), Point::new(20.0, 20.0));
    }

    #[test]
    fn test_placement_advances_to_second_row() {
        // Cards occupy row 0; the count-indexed cell is the first free one.
        let existing = [card(1, 20.0, 20.0), card(2, 270.0, 20.0)];
        assert_eq!(canvas().place_new_card(&existing), Point::new(20.0, 190.0));
    }

    #[test]
    fn test_placement_skips_overlapping_cells() {
        let existing = [card(1, 20.0, 20.0), card(2, 20.0, 190.0)];
        // Cell 2 is (20, 190), occupied; the scan advances to (290, 190).
        assert_eq!(canvas().place_new_card(&existing), Point::new(290.0, 190.0));
    }

    #[test]
    fn test_placement_never_overlaps_within_retry_bound() {
        let config = CanvasConfig::default();
        let canvas = canvas();
        let mut existing: Vec<Card> = Vec::new();
        for i in 0..20 {
            let position = canvas.place_new_card(&existing);
            let placed = Rect::new(position.x, position.y, config.card_width, config.card_height);
            for other in &existing {
                let other_rect =
                    Rect::new(other.x, other.y, config.card_width, config.card_height);
                assert!(!placed.overlaps(&other_rect), "card {i} overlaps");
            }
            existing.push(card(i as i64 + 1, position.x, position.y));
        }
    }

    #[test]
    fn test_stagger_fallback_after_retries_exhausted() {
        let config = CanvasConfig {
            placement_attempts: 2,
            ..CanvasConfig::default()
        };
        let canvas = CardCanvas::new(config);
        // Occupy the two cells the bounded scan will try (cells 2 and 3).
        let existing = [card(1, 20.0, 190.0), card(2, 290.0, 190.0)];
        let position = canvas.place_new_card(&existing);
        // count = 2 -> stagger (20 + 2*60, 20 + 0*40)
        assert_eq!(position, Point::new(140.0, 20.0));
    }

    #[test]
    fn test_render_requires_grid_container() {
        let mut dom = Dom::new(Size::new(1280.0, 720.0));
        let mut scope = ScopeRegistry::new();
        let result = canvas().render(&mut dom, &mut scope, 1, &[]);
        assert!(matches!(result, Err(DeckError::MissingContainer(_))));
    }
}
