//! Data models

mod node;
mod resource;
mod snapshot;

pub use node::*;
pub use resource::*;
pub use snapshot::*;
