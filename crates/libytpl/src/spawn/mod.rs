//! Module for spawning the external commands

pub mod ffmpeg;
pub mod multiplatform;
pub mod ytdl;
