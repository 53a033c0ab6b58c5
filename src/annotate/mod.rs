pub mod markup;
pub mod fragment;
pub mod entity;
pub mod citation;
pub mod references;
pub mod render;
pub mod matcher;
pub mod landmark;

pub use fragment::*;
pub use entity::*;
pub use citation::*;
pub use references::*;
pub use render::*;
pub use matcher::*;
pub use landmark::*;
