//! radiko-recorder library crate.
//!
//! Records radiko timefree programs selected by rules. Jobs are submitted over
//! HTTP into an in-memory priority queue and captured by a pool of workers
//! driving streamlink, ffmpeg and ffprobe.

pub mod api;
pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod domain;
pub mod downloader;
pub mod error;
pub mod logging;
pub mod notification;
pub mod pipeline;
pub mod schedule;
pub mod utils;

pub use error::{Error, Result};
