pub mod error;
pub mod models;
pub mod routes;

pub use error::{format_error, RelayError};
pub use routes::configure;
