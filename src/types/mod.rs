//! Core data types: events, messages, usage.

pub mod event;
pub mod generation;
pub mod message;
pub mod stream;
pub mod usage;

pub use event::*;
pub use generation::*;
pub use message::*;
pub use stream::*;
pub use usage::*;
