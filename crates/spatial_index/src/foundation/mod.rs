//! Foundation utilities
//!
//! Math types and logging support shared by every other module.

pub mod logging;
pub mod math;
