//! Foreign-key resolution (spec §4.3).

pub mod resolver;

pub use resolver::{link_foreign_key, LinkOutcome};
