mod block;
mod config;
mod fallback;
mod status;
#[cfg(test)]
mod tests;

pub use block::*;
pub use config::*;
pub use fallback::*;
pub use status::*;
