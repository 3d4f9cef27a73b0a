//! HR Assist server: the axum API over the QA engine.

pub mod routes;
pub mod state;

pub use routes::build_router;
pub use state::AppState;
