//! Imagery viewer service library.
//!
//! Exposes the router and state so the HTTP surface can be tested without a
//! listening socket.

pub mod handlers;
pub mod server;
pub mod state;

pub use server::create_router;
pub use state::AppState;
