//! Type definitions for SOW storage.

mod data;
mod ids;
mod sows;
mod tokens;

pub use data::*;
pub use ids::*;
pub use sows::*;
pub use tokens::*;
