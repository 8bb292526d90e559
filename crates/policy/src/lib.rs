//! Policy resolvers: raw detection signals in, moderation decisions out.
//!
//! Both resolvers are pure functions of their inputs and configuration.
//! They never perform I/O; encryption and logging of the outcome belong to
//! the engine.

pub mod format;
pub mod image;
pub mod text;

pub use format::{category_reason, flag_reason, title_case};
pub use image::{ImageAssessment, ImagePolicy};
pub use text::{TextDecision, TextPolicy};
