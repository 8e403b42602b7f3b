pub mod adapters;
pub mod contracts;
pub mod feed;
pub mod log_layer;

pub use adapters::*;
pub use contracts::*;
pub use feed::*;
pub use log_layer::*;
