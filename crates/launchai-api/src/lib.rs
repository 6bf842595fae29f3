//! # LaunchAI API
//!
//! axum router for the chat backend.
//!
//! ## Endpoints
//!
//! | Method | Path | Purpose |
//! |--------|------|---------|
//! | `POST` | `/api/chat` | One dispatched AI response |
//! | `GET`  | `/api/providers` | Providers in fallback order |
//! | `GET`  | `/api/insights` | Static launch insight for a profile |
//! | `GET`  | `/health` | Liveness |
//!
//! Every error body has the shape `{"success": false, "error": "..."}`.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;

pub use error::{ApiError, ApiResult};
pub use routes::{create_routes, AppState};
