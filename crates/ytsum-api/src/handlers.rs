//! Request handlers.

pub mod chat;
pub mod health;
pub mod relay;
pub mod summarize;
pub mod transcript;

pub use chat::*;
pub use health::*;
pub use summarize::*;
pub use transcript::*;
