use std::sync::Arc;

use taskdeck_backend::{Backend, MemoryBackend};
use taskdeck_core::{CanvasConfig, Point, Size};
use taskdeck_session::{Session, TabManager, UiEvent};

fn new_manager(backend: &Arc<MemoryBackend>) -> TabManager {
    let session = Session::new(
        Arc::clone(backend) as Arc<dyn Backend>,
        CanvasConfig::default(),
        Size::new(1280.0, 720.0),
    );
    TabManager::new(session)
}

#[tokio::test]
async fn test_single_open_tab_is_repurposed() {
    let backend = Arc::new(MemoryBackend::new());
    let w1 = backend.seed_workspace("Alpha");
    backend.seed_page(w1.id, "Home");
    let w2 = backend.seed_workspace("Beta");
    backend.seed_page(w2.id, "Home");

    let mut manager = new_manager(&backend);
    manager.open(w1.clone(), false).await.unwrap();
    assert_eq!(manager.tab_count(), 1);
    assert_eq!(manager.active_workspace_id(), Some(w1.id));

    // One tab open, not forced: the tab is repurposed, not duplicated.
    manager.open(w2.clone(), false).await.unwrap();
    assert_eq!(manager.tab_count(), 1);
    assert_eq!(manager.active_workspace_id(), Some(w2.id));
    assert!(!manager.is_open(w1.id));
    assert!(!manager.session().dom.contains(&format!("tab-{}", w1.id)));
    assert!(manager.session().dom.contains(&format!("tab-{}", w2.id)));
}

#[tokio::test]
async fn test_force_new_keeps_both_tabs_with_one_active() {
    let backend = Arc::new(MemoryBackend::new());
    let w1 = backend.seed_workspace("Alpha");
    backend.seed_page(w1.id, "Home");
    let w2 = backend.seed_workspace("Beta");
    backend.seed_page(w2.id, "Home");

    let mut manager = new_manager(&backend);
    manager.open(w1.clone(), false).await.unwrap();
    manager.open(w2.clone(), true).await.unwrap();

    assert_eq!(manager.tab_count(), 2);
    assert_eq!(manager.active_workspace_id(), Some(w2.id));
    assert!(!manager.session().dom.is_visible(&format!("tab-{}", w1.id)));
    assert!(manager.session().dom.is_visible(&format!("tab-{}", w2.id)));

    manager.activate(w1.id).await.unwrap();
    assert_eq!(manager.active_workspace_id(), Some(w1.id));
    assert!(manager.session().dom.is_visible(&format!("tab-{}", w1.id)));
    assert!(!manager.session().dom.is_visible(&format!("tab-{}", w2.id)));
}

#[tokio::test]
async fn test_opening_an_open_workspace_activates_it() {
    let backend = Arc::new(MemoryBackend::new());
    let w1 = backend.seed_workspace("Alpha");
    backend.seed_page(w1.id, "Home");
    let w2 = backend.seed_workspace("Beta");
    backend.seed_page(w2.id, "Home");

    let mut manager = new_manager(&backend);
    manager.open(w1.clone(), false).await.unwrap();
    manager.open(w2.clone(), true).await.unwrap();
    assert_eq!(manager.active_workspace_id(), Some(w2.id));

    manager.open(w1.clone(), false).await.unwrap();
    assert_eq!(manager.tab_count(), 2);
    assert_eq!(manager.active_workspace_id(), Some(w1.id));
}

#[tokio::test]
async fn test_close_activates_most_recently_opened_remaining() {
    let backend = Arc::new(MemoryBackend::new());
    let w1 = backend.seed_workspace("Alpha");
    backend.seed_page(w1.id, "Home");
    let w2 = backend.seed_workspace("Beta");
    backend.seed_page(w2.id, "Home");
    let w3 = backend.seed_workspace("Gamma");
    backend.seed_page(w3.id, "Home");

    let mut manager = new_manager(&backend);
    manager.open(w1.clone(), false).await.unwrap();
    manager.open(w2.clone(), true).await.unwrap();
    manager.open(w3.clone(), true).await.unwrap();
    assert_eq!(manager.tab_count(), 3);

    manager.close(w3.id).await.unwrap();
    assert_eq!(manager.active_workspace_id(), Some(w2.id));

    manager.close(w2.id).await.unwrap();
    assert_eq!(manager.active_workspace_id(), Some(w1.id));

    manager.close(w1.id).await.unwrap();
    assert!(manager.is_empty());
    assert_eq!(manager.active_workspace_id(), None);
    assert!(manager.session().dom.is_visible("tabs-empty-state"));
}

#[tokio::test]
async fn test_empty_state_toggles_with_tabs() {
    let backend = Arc::new(MemoryBackend::new());
    let w1 = backend.seed_workspace("Alpha");
    backend.seed_page(w1.id, "Home");

    let mut manager = new_manager(&backend);
    assert!(manager.session().dom.is_visible("tabs-empty-state"));

    manager.open(w1.clone(), false).await.unwrap();
    assert!(!manager.session().dom.is_visible("tabs-empty-state"));

    manager.close(w1.id).await.unwrap();
    assert!(manager.session().dom.is_visible("tabs-empty-state"));
}

#[tokio::test]
async fn test_close_tears_down_everything_scoped_to_the_workspace() {
    let backend = Arc::new(MemoryBackend::new());
    let w1 = backend.seed_workspace("Alpha");
    let page = backend.seed_page(w1.id, "Home");
    let c1 = backend.seed_card(page.id, "C1", 20.0, 20.0);
    let c2 = backend.seed_card(page.id, "C2", 270.0, 20.0);
    backend.seed_connection(c1.id, c2.id);
    backend.seed_task(page.id, "Write brief");
    backend.seed_note(page.id, "draft");
    let w2 = backend.seed_workspace("Beta");
    let other_page = backend.seed_page(w2.id, "Home");
    backend.seed_card(other_page.id, "Other", 20.0, 20.0);

    let mut manager = new_manager(&backend);
    manager.open(w1.clone(), false).await.unwrap();
    manager.open(w2.clone(), true).await.unwrap();

    let grid_id = format!("ws-{}-cards-grid", w1.id);
    let card_element = format!("card-{}", c1.id);
    assert!(manager.session().dom.contains(&grid_id));
    assert!(manager.session().dom.contains(&card_element));

    manager.close(w1.id).await.unwrap();

    // Teardown completeness: no node and no listener tracked under the
    // workspace survives.
    assert!(!manager.session().dom.contains(&grid_id));
    assert!(!manager.session().dom.contains(&card_element));
    assert!(!manager.session().dom.contains(&format!("tab-{}", w1.id)));
    assert!(manager.session().dom.listeners_for(&card_element).is_empty());
    assert_eq!(manager.session().scope.tracked_element_count(w1.id), 0);
    assert_eq!(manager.session().scope.tracked_listener_count(w1.id), 0);
    assert_eq!(manager.session().graph.edge_count_for(w1.id), 0);

    // The other workspace is untouched.
    assert!(manager
        .session()
        .dom
        .contains(&format!("ws-{}-cards-grid", w2.id)));
}

#[tokio::test]
async fn test_deactivation_hides_edges_without_destroying_them() {
    let backend = Arc::new(MemoryBackend::new());
    let w1 = backend.seed_workspace("Alpha");
    let page = backend.seed_page(w1.id, "Home");
    let c1 = backend.seed_card(page.id, "C1", 20.0, 20.0);
    let c2 = backend.seed_card(page.id, "C2", 270.0, 20.0);
    backend.seed_connection(c1.id, c2.id);
    let w2 = backend.seed_workspace("Beta");
    backend.seed_page(w2.id, "Home");

    let mut manager = new_manager(&backend);
    manager.open(w1.clone(), false).await.unwrap();
    assert_eq!(manager.session().graph.visible_edge_count_for(w1.id), 1);

    manager.open(w2.clone(), true).await.unwrap();
    assert_eq!(manager.session().graph.visible_edge_count_for(w1.id), 0);
    assert_eq!(manager.session().graph.edge_count_for(w1.id), 1);

    manager.activate(w1.id).await.unwrap();
    assert_eq!(manager.session().graph.visible_edge_count_for(w1.id), 1);
}

#[tokio::test]
async fn test_tab_bar_clicks_activate_and_close() {
    let backend = Arc::new(MemoryBackend::new());
    let w1 = backend.seed_workspace("Alpha");
    backend.seed_page(w1.id, "Home");
    let w2 = backend.seed_workspace("Beta");
    backend.seed_page(w2.id, "Home");

    let mut manager = new_manager(&backend);
    manager.open(w1.clone(), false).await.unwrap();
    manager.open(w2.clone(), true).await.unwrap();
    assert_eq!(manager.active_workspace_id(), Some(w2.id));

    // First tab button occupies x 0..160; clicking it activates Alpha.
    manager
        .handle_event(UiEvent::Clicked(Point::new(50.0, 18.0)))
        .await
        .unwrap();
    assert_eq!(manager.active_workspace_id(), Some(w1.id));

    // Its close control sits at the right edge of the button.
    manager
        .handle_event(UiEvent::Clicked(Point::new(146.0, 18.0)))
        .await
        .unwrap();
    assert_eq!(manager.tab_count(), 1);
    assert_eq!(manager.active_workspace_id(), Some(w2.id));
}

#[tokio::test]
async fn test_open_surfaces_backend_failure() {
    let backend = Arc::new(MemoryBackend::new());
    let w1 = backend.seed_workspace("Alpha");
    backend.seed_page(w1.id, "Home");
    backend.fail_on("fetch_pages_for_workspace");

    let mut manager = new_manager(&backend);
    assert!(manager.open(w1.clone(), false).await.is_err());
    assert!(manager.is_empty());
    assert!(!manager.session().messages.is_empty());
    // The failed mount leaves nothing tracked behind.
    assert_eq!(manager.session().scope.tracked_element_count(w1.id), 0);
}
