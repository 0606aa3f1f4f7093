pub mod canvas;
pub mod events;
pub mod graph;
pub mod page_context;
pub mod scope;
pub mod session;
pub mod tabs;
pub mod view;

pub use canvas::{CardCanvas, DragOutcome};
pub use events::UiEvent;
pub use graph::{ConnectionGraph, VisualEdge};
pub use page_context::{fetch_page_data, PageContext, PageData};
pub use scope::ScopeRegistry;
pub use session::Session;
pub use tabs::{Tab, TabManager};
pub use view::{Dom, EventKind, Handler, Node};
