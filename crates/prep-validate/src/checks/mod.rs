//! Individual checks.

pub mod category;
pub mod columns;
pub mod dates;
pub mod nullable;
pub mod pattern;
