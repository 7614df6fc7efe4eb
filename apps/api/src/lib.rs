//! Resume alignment service: one alignment pipeline, shared by the HTTP server (`api`)
//! and the command-line front end (`align`).

pub mod alignment;
pub mod config;
pub mod errors;
pub mod llm_client;
pub mod routes;
pub mod state;
