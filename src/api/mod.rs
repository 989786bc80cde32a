//! API server module for the /ask endpoint and the static chat page

pub mod handlers;
pub mod routes;
pub mod server;
pub mod types;

pub use server::serve;
