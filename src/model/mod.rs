pub mod access;
pub mod common;
pub mod content;
pub mod kind;
pub mod row;

pub use access::*;
pub use common::*;
pub use content::*;
pub use kind::*;
pub use row::Row;
