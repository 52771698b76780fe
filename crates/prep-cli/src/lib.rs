//! Library components of the `prepflow` command-line host.

pub mod declare;
pub mod logging;
pub mod report;
