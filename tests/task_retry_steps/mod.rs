//! Step definitions for task retry ordering scenarios.

pub mod given;
pub mod then;
pub mod when;
pub mod world;
