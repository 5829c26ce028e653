// crates/types/src/lib.rs
pub mod job;
pub mod status;
pub mod wire;

pub use job::*;
pub use status::*;
pub use wire::*;
