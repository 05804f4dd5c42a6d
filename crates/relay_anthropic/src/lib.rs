// --- File: crates/relay_anthropic/src/lib.rs ---
// Declare modules within this crate
pub mod client;
pub mod doc;
pub mod error;
pub mod handlers;
pub mod routes;

// Re-export the routes function to be used by the main backend service
pub use routes::routes;
