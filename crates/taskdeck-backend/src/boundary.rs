use async_trait::async_trait;
use serde_json::Value;
use taskdeck_core::DeckResult;

/// The single abstract boundary to persistence.
///
/// All fetches and mutations go through `invoke`; the session core does not
/// depend on the shape of the transport (local IPC, HTTP, ...), only on:
/// calls resolve with structured data or reject with an error value
/// convertible to a display string, and list-fetch commands return arrays
/// whose elements carry stable integer `id` fields.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn invoke(&self, command: &str, args: Value) -> DeckResult<Value>;
}
