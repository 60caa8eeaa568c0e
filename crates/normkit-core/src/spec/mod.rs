//! Specifications: composable validation predicates over a [`crate::project::Project`]
//! or a single entity's live data, each contributing to a shared [`base::Report`].

pub mod base;
pub mod entity;
pub mod foreign_key;
pub mod project;

pub use base::{Report, Severity, SpecificationIssue};
