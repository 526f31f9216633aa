pub mod shutdown;
pub mod sql_guard;
pub mod validation;

pub use shutdown::*;
pub use validation::*;
