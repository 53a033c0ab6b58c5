pub mod types;
pub mod payload;
pub mod client;

pub use types::*;
pub use payload::*;
pub use client::*;
