pub mod connection_repository;
pub mod llm_client;
pub mod registry_service;
pub mod sql_agent;
pub mod sql_executor;
pub mod token_service;
pub mod user_repository;
pub mod user_service;

pub use connection_repository::*;
pub use llm_client::*;
pub use registry_service::DatabaseRegistry;
pub use sql_agent::{AskEngine, SqlAgent};
pub use sql_executor::{MySqlExecutor, SqlExecutor};
pub use token_service::TokenService;
pub use user_repository::*;
pub use user_service::UserService;
