//! Module for building the download configuration and turning it into yt-dlp arguments

use std::{
	ffi::OsString,
	path::{
		Path,
		PathBuf,
	},
};

use crate::locate::ToolLocation;

/// Format selector: exact 720p mp4 video with m4a audio, falling back to a combined mp4 of at most 720p, falling back to anything of at most 720p
pub const FORMAT_720P: &str = "bv*[height<=720][height>=720][ext=mp4]+ba[ext=m4a]/b[height<=720][ext=mp4]/b[height<=720]";
/// The output filename template inside the playlist directory
pub const FILENAME_TEMPLATE: &str = "%(playlist_index)02d - %(title)s.%(ext)s";
/// The directory template inside the output directory
pub const PLAYLIST_DIR_TEMPLATE: &str = "%(playlist_title)s";
/// The container all merged media will end up in
pub const MERGE_OUTPUT_FORMAT: &str = "mp4";
/// How often a network operation and a fragment is retried
pub const RETRIES: u32 = 10;

/// Arguments given to a ffmpeg post-processor of yt-dlp
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostprocessorArgs {
	/// The post-processor name, like "VideoRemuxer"
	pub name: String,
	/// The arguments to give to ffmpeg
	pub args: Vec<String>,
}

impl PostprocessorArgs {
	/// Get the value as yt-dlp expects it for "--postprocessor-args"
	#[must_use]
	pub fn to_ytdl_value(&self) -> String {
		return format!("{}:{}", self.name, self.args.join(" "));
	}
}

/// All options a download is run with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadConfiguration {
	/// Format selector with fallbacks
	pub format:              String,
	/// Full output path template, including the output directory
	pub output_template:     PathBuf,
	/// Download the whole playlist instead of only the referenced video
	pub yes_playlist:        bool,
	/// Skip media which errored instead of aborting the whole run
	pub ignore_errors:       bool,
	/// Container to merge video and audio into
	pub merge_output_format: String,
	/// Only use ascii characters and avoid "&" and spaces in filenames
	pub restrict_filenames:  bool,
	/// Write the thumbnail as a separate file
	pub write_thumbnail:     bool,
	/// Resume partially downloaded files
	pub continue_partial:    bool,
	/// Show progress in the console title
	pub console_title:       bool,
	/// Keep the intermediate video file after post-processing
	pub keep_video:          bool,
	/// Extra arguments for the remux post-processor
	pub remux_args:          PostprocessorArgs,
	/// Overwrite all existing files
	pub overwrites:          bool,
	/// Keep downloaded fragments after they have been merged
	pub keep_fragments:      bool,
	/// Retries for each network operation
	pub retries:             u32,
	/// Retries for each fragment
	pub fragment_retries:    u32,
	/// Which ffmpeg to use, [None] lets yt-dlp search itself
	pub ffmpeg_location:     Option<ToolLocation>,
}

/// Build the [DownloadConfiguration] for downloading a playlist into `output_dir`
/// This function does not do any I/O and always results in the same value for the same input
#[must_use]
pub fn build_options(output_dir: &Path, ffmpeg_location: Option<&ToolLocation>) -> DownloadConfiguration {
	return DownloadConfiguration {
		format:              FORMAT_720P.to_owned(),
		output_template:     output_dir.join(PLAYLIST_DIR_TEMPLATE).join(FILENAME_TEMPLATE),
		yes_playlist:        true,
		ignore_errors:       true,
		merge_output_format: MERGE_OUTPUT_FORMAT.to_owned(),
		restrict_filenames:  true,
		write_thumbnail:     false,
		continue_partial:    true,
		console_title:       true,
		keep_video:          false,
		remux_args:          PostprocessorArgs {
			name: "VideoRemuxer".to_owned(),
			args: ["-c:v", "copy", "-c:a", "copy"].map(String::from).to_vec(),
		},
		overwrites:          true,
		keep_fragments:      false,
		retries:             RETRIES,
		fragment_retries:    RETRIES,
		ffmpeg_location:     ffmpeg_location.cloned(),
	};
}

/// Internal Struct for easily adding various types that resolve to [`OsString`] and output a [`Vec<OsString>`]
/// exists because [std::process::Command] is too overkill to use for a argument collection for having to use [duct] later
#[derive(Debug)]
struct ArgsHelper(Vec<OsString>);
impl ArgsHelper {
	/// Create a new instance of ArgsHelper
	pub fn new() -> Self {
		return Self(Vec::default());
	}

	/// Add a new Argument to the list, added at the end and converted to a [`OsString`]
	/// Returns the input reference to "self" for chaining
	pub fn arg<U>(&mut self, arg: U) -> &mut Self
	where
		U: Into<OsString>,
	{
		self.0.push(arg.into());

		return self;
	}

	/// Add either `yes` or `no` depending on `flag`
	pub fn flag(&mut self, flag: bool, yes: &str, no: &str) -> &mut Self {
		return self.arg(if flag { yes } else { no });
	}

	/// Convert Self to the inner value
	/// Consumes self
	pub fn into_inner(self) -> Vec<OsString> {
		return self.0;
	}
}

impl From<ArgsHelper> for Vec<OsString> {
	fn from(v: ArgsHelper) -> Self {
		return v.into_inner();
	}
}

impl DownloadConfiguration {
	/// Assemble all yt-dlp arguments for this configuration, in a consistent order
	/// Does not include the urls to download, those need to be added after
	#[must_use]
	pub fn to_ytdl_args(&self) -> Vec<OsString> {
		let mut ytdl_args = ArgsHelper::new();

		// set the format that should be downloaded
		ytdl_args.arg("-f").arg(&self.format);
		// set the output path
		ytdl_args.arg("-o").arg(&self.output_template);

		ytdl_args.flag(self.yes_playlist, "--yes-playlist", "--no-playlist");
		ytdl_args.flag(self.ignore_errors, "--ignore-errors", "--abort-on-error");

		// set final consistent output format
		ytdl_args
			.arg("--merge-output-format")
			.arg(&self.merge_output_format);

		ytdl_args.flag(
			self.restrict_filenames,
			"--restrict-filenames",
			"--no-restrict-filenames",
		);
		ytdl_args.flag(self.write_thumbnail, "--write-thumbnail", "--no-write-thumbnail");
		ytdl_args.flag(self.continue_partial, "--continue", "--no-continue");
		ytdl_args.flag(self.console_title, "--console-title", "--no-console-title");
		ytdl_args.flag(self.keep_video, "--keep-video", "--no-keep-video");

		ytdl_args
			.arg("--postprocessor-args")
			.arg(self.remux_args.to_ytdl_value());

		ytdl_args.flag(self.overwrites, "--force-overwrites", "--no-force-overwrites");
		ytdl_args.flag(self.keep_fragments, "--keep-fragments", "--no-keep-fragments");

		ytdl_args.arg("--retries").arg(self.retries.to_string());
		ytdl_args
			.arg("--fragment-retries")
			.arg(self.fragment_retries.to_string());

		// yt-dlp checks "--ffmpeg-location" as a filesystem path, so a bare command name would be resolved against the working directory
		// for a command found in PATH, yt-dlp finds the same executable with its own PATH search
		if let Some(ToolLocation::Path(ffmpeg)) = &self.ffmpeg_location {
			ytdl_args.arg("--ffmpeg-location").arg(ffmpeg);
		}

		// ensure ytdl prints the progress reports on a new line, because output is read line-by-line
		ytdl_args.arg("--newline");

		return ytdl_args.into();
	}
}
