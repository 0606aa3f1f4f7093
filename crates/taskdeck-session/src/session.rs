use std::sync::Arc;
use taskdeck_backend::{Backend, Commands};
use taskdeck_core::{CanvasConfig, MessageLog, Size};
use uuid::Uuid;

use crate::canvas::CardCanvas;
use crate::graph::ConnectionGraph;
use crate::scope::ScopeRegistry;
use crate::view::Dom;

/// The explicit session object: owns the view tree, scope registry, canvas,
/// graph, message surface and the backend handle, and is passed by
/// reference to whatever needs them. Nothing in the session layer reaches
/// state through ambient globals.
pub struct Session {
    backend: Arc<dyn Backend>,
    instance_id: Uuid,
    pub dom: Dom,
    pub scope: ScopeRegistry,
    pub canvas: CardCanvas,
    pub graph: ConnectionGraph,
    pub messages: MessageLog,
}

impl Session {
    pub fn new(backend: Arc<dyn Backend>, config: CanvasConfig, viewport: Size) -> Self {
        let instance_id = Uuid::new_v4();
        tracing::debug!(%instance_id, "created session");
        Self {
            backend,
            instance_id,
            dom: Dom::new(viewport),
            scope: ScopeRegistry::new(),
            canvas: CardCanvas::new(config),
            graph: ConnectionGraph::new(),
            messages: MessageLog::new(),
        }
    }

    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    pub fn backend_arc(&self) -> Arc<dyn Backend> {
        Arc::clone(&self.backend)
    }

    pub fn commands(&self) -> Commands<'_> {
        Commands::new(self.backend.as_ref())
    }
}
