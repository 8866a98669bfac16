pub mod access_extractor;
pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::*;
