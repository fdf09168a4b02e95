pub mod bootstrap;
pub mod runtime;

pub use runtime::{block_source_for, load_config, Runtime};
