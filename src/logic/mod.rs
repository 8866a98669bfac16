pub mod access;
pub mod clone_result;
pub mod cloner;
pub mod descriptor;
pub mod identity_map;
pub mod inherit;
pub mod service;
pub mod validate;

pub use access::*;
pub use clone_result::*;
pub use cloner::*;
pub use descriptor::*;
pub use identity_map::*;
pub use service::*;
pub use validate::*;
