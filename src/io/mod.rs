//! Import/export utilities.

pub mod export;
