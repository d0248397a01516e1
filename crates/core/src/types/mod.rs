//! Shared type definitions.

mod id;
mod price;
mod status;

pub use id::*;
pub use price::*;
pub use status::*;
