// Resume alignment: prompt → schema-constrained generation → resilient decode →
// validation, under a retry coordinator, with an optional history log.
// All provider calls go through llm_client.

pub mod decoder;
pub mod error;
pub mod export;
pub mod handlers;
pub mod history;
pub mod models;
pub mod pipeline;
pub mod prompts;
pub mod retry;
pub mod schema;
pub mod validator;
