pub mod diff;
pub mod list;
pub mod secret;
pub mod sync;

mod common;
mod report;
