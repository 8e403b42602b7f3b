pub mod actions;
pub mod bindings;
pub mod bus;
pub mod config;
pub mod message;
pub mod reducer;
pub mod sanitize;
pub mod state;
pub mod store;

pub use actions::*;
pub use bindings::*;
pub use bus::*;
pub use config::*;
pub use message::*;
pub use reducer::*;
pub use sanitize::*;
pub use state::*;
pub use store::*;
