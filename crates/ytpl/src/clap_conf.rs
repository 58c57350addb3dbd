//! Module for Clap related structs (derived)

#![deny(missing_docs)] // comments are used for "--help" generation, so it should always be defined

use clap::{
	ArgAction,
	Parser,
};
use libytpl::locate::Locator;
use std::path::PathBuf;

/// Download all videos from a YouTube playlist in 720p using yt-dlp
#[derive(Debug, Parser, Clone, PartialEq)]
#[command(author, version = env!("YTPL_VERSION"), about, long_about = None)]
#[command(bin_name = "ytpl")]
pub struct CliDerive {
	/// URL of the YouTube playlist
	pub playlist_url:    String,
	/// Output directory
	#[arg(short, long = "output", default_value = "downloads", env = "YTPL_OUTPUT")]
	pub output_path:     PathBuf,
	/// Use this ffmpeg executable instead of searching PATH and the bundled locations first
	#[arg(long = "ffmpeg-location", env = "YTPL_FFMPEG_LOCATION")]
	pub ffmpeg_location: Option<PathBuf>,
	/// Set Logging verbosity (0 - Default - WARN, 1 - INFO, 2 - DEBUG, 3 - TRACE)
	#[arg(short, long, action = ArgAction::Count)]
	pub verbosity:       u8,
}

impl CliDerive {
	/// Get the [Locator] to use for finding ffmpeg, respecting a explicitly set location
	#[must_use]
	pub fn locator(&self) -> Locator {
		return match &self.ffmpeg_location {
			Some(path) => Locator::with_override(path),
			None => Locator::default(),
		};
	}
}
