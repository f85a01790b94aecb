mod block;
mod membership;
mod user;

pub use block::*;
pub use membership::*;
pub use user::*;
