//! Claims ("reclamos") as they arrive from the backend's change
//! stream, and the notifications derived from their changes.
pub mod models;
pub mod notifications;
pub use models::*;
pub use notifications::*;
