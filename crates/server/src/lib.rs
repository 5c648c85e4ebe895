//! HTTP API for flashcard deck conversion
//!
//! Wraps [`flashdeck::convert_bytes`] in an Axum server. The request body is
//! the raw generator output, untouched; the response is the deck JSON.
//!
//! # Endpoints
//!
//! - `GET /` - API information
//! - `POST /api/v1/convert[?deck_name=...]` - Convert a payload into a deck
//!
//! Errors share one body shape:
//!
//! ```json
//! {"error": {"code": "MALFORMED_PAYLOAD", "message": "...", "details": {"preview": "...", "hints": ["..."]}}}
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::{build_router, start_server};
pub use state::ServerState;
