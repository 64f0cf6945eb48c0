//! Common utilities and helpers

pub mod text;
