//! Module that contains all logic for spawning the "ffmpeg" command
use std::{
	ffi::OsStr,
	process::{
		Command,
		Output,
		Stdio,
	},
	sync::LazyLock,
};

use regex::Regex;

use crate::error::IOErrorToError;

/// Binary name to spawn for ffmpeg when searching in PATH
pub const FFMPEG_BIN_NAME: &str = "ffmpeg";

/// Create a new ffmpeg [Command] instance for the given `program`, which may be a name in PATH or a path
#[inline]
#[must_use]
pub fn base_ffmpeg<P: AsRef<OsStr>>(program: P) -> Command {
	let mut cmd = super::multiplatform::spawn_command(program);

	// explicitly disable interactive mode
	cmd.arg("-nostdin");

	return cmd;
}

/// Regex to parse the version from a "ffmpeg -version" output
/// cap1: version
static FFMPEG_VERSION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
	return Regex::new(r"(?mi)^ffmpeg version ([a-z0-9.-]+)").unwrap();
});

/// Run `program -version` and return the STDOUT output if it exited successfully
/// STDERR and STDIN are set to null, so nothing gets printed
pub fn ffmpeg_version_output<P: AsRef<OsStr>>(program: P) -> Result<String, crate::Error> {
	let mut cmd = base_ffmpeg(program);
	cmd.arg("-version");

	let command_output: Output = cmd
		.stderr(Stdio::null())
		.stdout(Stdio::piped())
		.stdin(Stdio::null())
		.spawn()
		.attach_location_err("ffmpeg spawn")?
		.wait_with_output()
		.attach_location_err("ffmpeg wait_with_output")?;

	if !command_output.status.success() {
		return Err(crate::Error::command_unsuccessful("FFMPEG did not successfully exit!"));
	}

	return Ok(String::from_utf8(command_output.stdout)?);
}

/// Internal Function to parse the input to a ffmpeg version with regex
#[inline]
pub(crate) fn ffmpeg_parse_version(input: &str) -> Result<String, crate::Error> {
	return Ok(FFMPEG_VERSION_REGEX
		.captures_iter(input)
		.next()
		.ok_or_else(|| return crate::Error::no_captures("FFMPEG Version could not be determined"))?[1]
		.to_owned());
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_ffmpeg_parse_version_invalid_input() {
		assert_eq!(
			ffmpeg_parse_version("hello"),
			Err(crate::Error::no_captures("FFMPEG Version could not be determined"))
		);
	}

	#[test]
	fn test_ffmpeg_parse_version_valid_static_input() {
		let ffmpeg_output = "ffmpeg version n6.1.1 Copyright (c) 2000-2023 the FFmpeg developers
built with gcc 13.2.1 (GCC) 20230801
libavutil      58. 29.100 / 58. 29.100
libavcodec     60. 31.102 / 60. 31.102
libavformat    60. 16.100 / 60. 16.100
";

		assert_eq!(ffmpeg_parse_version(ffmpeg_output), Ok("n6.1.1".to_owned()));
	}

	#[test]
	fn test_ffmpeg_parse_version_static_build() {
		let ffmpeg_output = "ffmpeg version 6.0-static https://johnvansickle.com/ffmpeg/  Copyright (c) 2000-2023 the FFmpeg developers\n";

		assert_eq!(ffmpeg_parse_version(ffmpeg_output), Ok("6.0-static".to_owned()));
	}

	#[test]
	fn test_ffmpeg_version_output_missing_binary() {
		let res = ffmpeg_version_output("ytpl-test-ffmpeg-that-does-not-exist");

		assert!(res.is_err());
	}

	#[test]
	#[ignore = "CI Install not present currently"]
	fn test_ffmpeg_spawn() {
		let output = ffmpeg_version_output(FFMPEG_BIN_NAME).expect("Expected ffmpeg to run");

		assert!(ffmpeg_parse_version(&output).is_ok());
	}
}
