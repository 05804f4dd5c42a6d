// --- File: crates/relay_tiktok/src/lib.rs ---
// Declare modules within this crate
pub mod doc;
pub mod handlers;
pub mod logic;
pub mod routes;

// Re-export the routes function to be used by the main backend service
pub use routes::routes;
