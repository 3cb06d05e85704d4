//! HTTP boundary: task submission, polling, and the legacy synchronous endpoint.

mod error;
mod handlers;
mod router;
mod state;
pub mod wire;

pub use error::{ErrorShape, HttpError};
pub use handlers::ENDPOINTS_TEXT;
pub use router::build_router;
pub use state::AppState;
