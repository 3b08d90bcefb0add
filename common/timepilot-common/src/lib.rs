//! Common code shared across the workspace

pub mod boxedarray;
pub mod frontend;
pub mod num;
