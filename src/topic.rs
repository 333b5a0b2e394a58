//! Topic pattern handling
//!
//! Compiles subscription patterns (`+` single level, `#` remaining suffix)
//! and resolves received topics against an ordered sequence of patterns.

pub mod filter;
pub mod matcher;

#[cfg(test)]
mod matcher_tests;

pub use filter::{FilterSegment, TopicFilter};
pub use matcher::first_match;
