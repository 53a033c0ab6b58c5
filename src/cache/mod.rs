pub mod fingerprint;
pub mod store;
pub mod analysis_cache;

pub use fingerprint::*;
pub use store::*;
pub use analysis_cache::*;
