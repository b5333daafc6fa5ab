//! Domain model: programs, jobs and the rules that select them.

pub mod job;
pub mod program;
pub mod rules;
pub mod value_objects;

pub use job::Job;
pub use program::{Program, parse_radiko_timestamp};
pub use rules::{Rule, RuleSet, TitlePattern};
pub use value_objects::RetryPolicy;
