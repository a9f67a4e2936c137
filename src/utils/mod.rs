//! Small shared helpers.

pub mod unicode;
