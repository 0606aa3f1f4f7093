pub mod config;
pub mod error;
pub mod geometry;
pub mod messages;
pub mod result;

pub use config::CanvasConfig;
pub use error::DeckError;
pub use geometry::{Point, Rect, Size};
pub use messages::{MessageEntry, MessageLevel, MessageLog};
pub use result::DeckResult;
