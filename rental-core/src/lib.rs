//! rental-core: Shared infrastructure for the Fleetbook portal workspace.
pub mod error;
pub mod middleware;
pub mod observability;

pub use axum;
pub use serde;
pub use serde_json;
pub use tracing;
pub use validator;
