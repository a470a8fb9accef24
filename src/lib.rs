//! Reelcraft - Natural-Language Video Editing
//!
//! Translates plain-language editing commands ("trim the first 10 seconds",
//! "add a title") into structured instructions and applies them to video
//! files with ffmpeg.

pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod instruction;
pub mod interpret;
pub mod media;
pub mod pipeline;
pub mod stock;
