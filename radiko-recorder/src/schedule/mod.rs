//! Program schedule source.

pub mod radiko;

pub use radiko::{RadikoClient, Schedule, Station};
