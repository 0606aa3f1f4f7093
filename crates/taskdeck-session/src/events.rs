use taskdeck_core::{Point, Size};

/// Shell input events the session reacts to. Pointer events drive the card
/// drag state machine; resize and scroll trigger edge repositioning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UiEvent {
    Resized(Size),
    Scrolled,
    PointerDown(Point),
    PointerMoved { dx: f64, dy: f64 },
    PointerUp,
    /// Synthesized by the shell after pointer-up; a completed drag
    /// suppresses the click that follows it.
    Clicked(Point),
}
