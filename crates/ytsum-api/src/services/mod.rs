//! Collaborators used by the handlers.

pub mod openrouter;
pub mod subscription;

pub use openrouter::{LlmMessage, OpenRouterClient};
pub use subscription::{StaticSubscriptionGate, SubscriptionGate};
