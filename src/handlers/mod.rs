pub mod ask_handler;
pub mod auth_handler;
pub mod database_handler;
pub mod docs_handler;
pub mod health_handler;
pub mod model_handler;

pub use ask_handler::*;
pub use auth_handler::*;
pub use database_handler::*;
pub use docs_handler::ApiDoc;
pub use health_handler::*;
pub use model_handler::*;
