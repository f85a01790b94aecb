mod allocator;
mod candidate;
mod error;
mod id;
#[cfg(test)]
mod mock;
mod rand;
mod service;
mod stats;
mod store;

pub use crate::allocator::*;
pub use crate::candidate::*;
pub use crate::error::*;
pub use crate::id::*;
pub use crate::rand::*;
pub use crate::service::*;
pub use crate::stats::*;
pub use crate::store::*;
