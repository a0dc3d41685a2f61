pub mod builtin;
pub mod catalog;
pub mod classify;
pub mod eval;
