pub mod auth;
pub mod connection;
pub mod database;
pub mod llm_model;
pub mod query;

pub use auth::*;
pub use connection::*;
pub use database::*;
pub use llm_model::*;
pub use query::*;
