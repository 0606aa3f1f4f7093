//! Drives a session against the in-memory backend: opens two workspace
//! tabs, drags a card, follows a card's workspace reference and closes a
//! tab, printing the resulting state.

use std::sync::Arc;

use taskdeck_backend::{Backend, MemoryBackend};
use taskdeck_core::{CanvasConfig, Point, Size};
use taskdeck_session::{Session, TabManager, UiEvent};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let backend = Arc::new(MemoryBackend::new());
    let alpha = backend.seed_workspace("Alpha");
    let page = backend.seed_page(alpha.id, "Home");
    let research = backend.seed_card(page.id, "Research", 20.0, 20.0);
    let brief = backend.seed_card(page.id, "Brief", 270.0, 20.0);
    backend.seed_connection(research.id, brief.id);
    backend.seed_task(page.id, "Collect sources");

    let beta = backend.seed_workspace("Beta");
    backend.seed_page(beta.id, "Home");
    backend.link_card_workspace(brief.id, beta.id);

    let session = Session::new(
        Arc::clone(&backend) as Arc<dyn Backend>,
        CanvasConfig::load(),
        Size::new(1280.0, 720.0),
    );
    let mut manager = TabManager::new(session);

    manager.open(alpha.clone(), false).await?;
    println!(
        "opened {:?}: {} nodes, {} edges",
        alpha.name,
        manager.session().dom.node_count(),
        manager.session().graph.edge_count_for(alpha.id),
    );

    // Drag the first card one grid cell down.
    let grid = manager
        .session()
        .dom
        .rect(&format!("ws-{}-cards-grid", alpha.id))
        .expect("cards grid is mounted");
    manager
        .handle_event(UiEvent::PointerDown(Point::new(grid.x + 30.0, grid.y + 30.0)))
        .await?;
    manager
        .handle_event(UiEvent::PointerMoved { dx: 0.0, dy: 170.0 })
        .await?;
    manager.handle_event(UiEvent::PointerUp).await?;
    tokio::task::yield_now().await;
    println!(
        "dragged {:?} to {:?}",
        research.name,
        backend.card_position(research.id),
    );

    // Follow the second card's workspace reference (repurposes the tab).
    let card_rect = manager
        .session()
        .dom
        .rect(&format!("card-{}", brief.id))
        .expect("card is mounted");
    let press = card_rect.center();
    manager.handle_event(UiEvent::PointerDown(press)).await?;
    manager.handle_event(UiEvent::PointerUp).await?;
    manager.handle_event(UiEvent::Clicked(press)).await?;
    println!(
        "active workspace after click: {:?}",
        manager.active_workspace_id(),
    );

    manager.open(alpha.clone(), true).await?;
    println!("open tabs: {:?}", manager.open_workspace_ids());

    manager.close(alpha.id).await?;
    manager.close(beta.id).await?;
    println!("all tabs closed, empty state: {}", manager.is_empty());

    for entry in manager.session_mut().messages.drain() {
        println!("[{:?}] {}", entry.level, entry.text);
    }
    Ok(())
}
