//! Module for downloading a playlist with yt-dlp

use std::{
	ffi::OsString,
	io::{
		BufRead,
		BufReader,
		Write,
	},
	path::Path,
	process::ExitStatus,
	time::Duration,
};

use crate::{
	error::IOErrorToError,
	locate::{
		DATA_DIR_NAME,
		Locator,
		ToolLocation,
	},
	options::{
		DownloadConfiguration,
		build_options,
	},
	spawn::ytdl::{
		YTDL_BIN_NAME,
		require_ytdl_installed,
		warn_minimal_version,
		ytdl_parse_version_naivedate,
	},
};

/// Something that can download urls with a given [DownloadConfiguration]
pub trait Downloader {
	/// Download all `urls` and return the exit code of the download
	/// Errors for single media are expected to be handled by the implementation based on [DownloadConfiguration::ignore_errors]
	fn download(&self, urls: &[&str], config: &DownloadConfiguration) -> Result<i32, crate::Error>;
}

/// [Downloader] which runs yt-dlp
#[derive(Debug, Clone, PartialEq, Default)]
pub struct YtDlp {
	/// Skip checking the yt-dlp version before starting
	pub skip_version_check: bool,
}

impl Downloader for YtDlp {
	fn download(&self, urls: &[&str], config: &DownloadConfiguration) -> Result<i32, crate::Error> {
		if !self.skip_version_check {
			let version = require_ytdl_installed()?;

			match ytdl_parse_version_naivedate(&version) {
				Ok(date) => {
					warn_minimal_version(date);
				},
				Err(err) => debug!("Could not parse {} version as a date: {}", YTDL_BIN_NAME, err),
			}
		}

		let mut args = config.to_ytdl_args();
		args.extend(urls.iter().map(OsString::from));

		debug!("Running {} with arguments {:?}", YTDL_BIN_NAME, args);

		// merge stderr into stdout
		// the reader handle kills and waits for the child once dropped, so it does not outlive this function
		let ytdl_child = duct::cmd(YTDL_BIN_NAME, args)
			.stderr_to_stdout()
			.unchecked()
			.reader()
			.attach_location_err(format!("{} in PATH", YTDL_BIN_NAME))?;

		let stdout_reader = BufReader::new(&ytdl_child);

		handle_stdout(stdout_reader, std::io::stdout().lock())?;

		let status = loop {
			// wait loop, because somehow a "ReaderHandle" does not implement "wait", only "try_wait", but have to wait for it to exit here
			match ytdl_child.try_wait() {
				Ok(Some(output)) => break output.status,
				Ok(None) => (),
				Err(err) => {
					return Err(crate::Error::custom_ioerror_location(
						err.kind(),
						err.to_string(),
						"duct ytdl try_wait",
					));
				},
			}

			std::thread::sleep(Duration::from_millis(100)); // sleep to same some time between the next wait (to not cause constant cpu spike)
		};

		return Ok(exit_code(status));
	}
}

/// Helper function to forward the output of a spawned ytdl command
/// Lines are forwarded as raw bytes, because the output is not guaranteed to be UTF-8 (like non-UTF-8 titles on windows code pages)
/// The reader is always drained until EOF, otherwise the child would block on a full pipe
/// Returns the amount of lines forwarded
#[inline]
fn handle_stdout<R: BufRead, W: Write>(mut reader: R, mut out: W) -> Result<usize, crate::Error> {
	let mut count = 0;
	let mut line: Vec<u8> = Vec::with_capacity(256);

	loop {
		line.clear();

		match reader.read_until(b'\n', &mut line) {
			// EOF
			Ok(0) => break,
			Ok(_) => (),
			Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
			// a actual read error cannot be recovered from, returning drops the reader handle, which kills the child
			Err(err) => return Err(err).attach_location_err("read ytdl output"),
		}

		let trimmed = line.strip_suffix(b"\n").unwrap_or(line.as_slice());
		let trimmed = trimmed.strip_suffix(b"\r").unwrap_or(trimmed);

		trace!("ytdl [STDOUT]: \"{}\"", String::from_utf8_lossy(trimmed));

		out.write_all(trimmed).attach_location_err("forward ytdl output")?;
		out.write_all(b"\n").attach_location_err("forward ytdl output")?;
		count += 1;
	}

	out.flush().attach_location_err("forward ytdl output")?;

	return Ok(count);
}

/// Get the exit code of a [ExitStatus], a status without code (like killed by a signal) counts as 0
fn exit_code(status: ExitStatus) -> i32 {
	return match status.code() {
		Some(code) => code,
		None => {
			warn!("{} exited without a exit code ({}), counting as success", YTDL_BIN_NAME, status);
			return 0;
		},
	};
}

/// The message shown when no ffmpeg could be found
pub fn missing_ffmpeg_message() -> String {
	let bundle_dir = dirs::data_dir().map_or_else(
		|| return format!("the \"{}/bin\" data directory", DATA_DIR_NAME),
		|v| return format!("\"{}\"", v.join(DATA_DIR_NAME).join("bin").display()),
	);

	return format!(
		"ffmpeg is required but not found. Install ffmpeg (https://ffmpeg.org/download.html) OR place a bundled ffmpeg executable next to the ytpl executable or into {bundle_dir}."
	);
}

/// Ensure ffmpeg is available and return where it is
pub fn ensure_dependencies(locator: &Locator) -> Result<ToolLocation, crate::Error> {
	return locator
		.locate()
		.ok_or_else(|| return crate::Error::dependency_missing(missing_ffmpeg_message()));
}

/// Download a whole playlist into `output_dir` with `downloader`
/// Fails before touching the filesystem if no ffmpeg could be found
/// Returns the exit code of the download
pub fn download_playlist<D: Downloader>(
	playlist_url: &str,
	output_dir: &Path,
	locator: &Locator,
	downloader: &D,
) -> Result<i32, crate::Error> {
	let ffmpeg = ensure_dependencies(locator)?;

	debug!("Output dir is \"{}\"", output_dir.display());
	std::fs::create_dir_all(output_dir).attach_path_err(output_dir)?;

	let config = build_options(output_dir, Some(&ffmpeg));

	return downloader.download(&[playlist_url], &config);
}

#[cfg(test)]
mod test {
	use std::cell::RefCell;

	use tempfile::{
		Builder as TempBuilder,
		TempDir,
	};

	use super::*;
	use crate::{
		error::ErrorInner,
		locate::test_utils::FixedStrategy,
	};

	/// Downloader that records what it was called with
	struct TestDownloader {
		calls:  RefCell<Vec<(Vec<String>, DownloadConfiguration)>>,
		result: fn() -> Result<i32, crate::Error>,
	}

	impl TestDownloader {
		fn new(result: fn() -> Result<i32, crate::Error>) -> Self {
			return Self {
				calls: RefCell::new(Vec::new()),
				result,
			};
		}
	}

	impl Downloader for TestDownloader {
		fn download(&self, urls: &[&str], config: &DownloadConfiguration) -> Result<i32, crate::Error> {
			self.calls.borrow_mut().push((
				urls.iter().map(|v| return (*v).to_owned()).collect(),
				config.clone(),
			));

			return (self.result)();
		}
	}

	fn create_dir() -> TempDir {
		return TempBuilder::new()
			.prefix("ytpl-test-download-")
			.tempdir()
			.expect("Expected a temp dir to be created");
	}

	fn locator_with(result: Option<ToolLocation>) -> Locator {
		let (strategy, _calls) = FixedStrategy::new(result);

		return Locator::new(vec![Box::new(strategy)]);
	}

	const URL: &str = "https://www.youtube.com/playlist?list=PLtest";

	#[test]
	fn test_missing_ffmpeg() {
		let dir = create_dir();
		let output_dir = dir.path().join("downloads");
		let downloader = TestDownloader::new(|| return Ok(0));

		let res = download_playlist(URL, &output_dir, &locator_with(None), &downloader);

		let err = res.expect_err("Expected missing ffmpeg to error");
		assert!(matches!(err.inner(), ErrorInner::DependencyMissing(_)));
		let msg = err.to_string();
		assert!(msg.contains("ffmpeg is required"));
		assert!(msg.contains("https://ffmpeg.org/download.html"));
		assert!(msg.contains("bundled ffmpeg"));

		assert!(!output_dir.exists());
		assert!(downloader.calls.borrow().is_empty());
	}

	#[test]
	fn test_ensure_dependencies() {
		let found = ToolLocation::Command("ffmpeg".into());

		assert_eq!(ensure_dependencies(&locator_with(Some(found.clone()))), Ok(found));
		assert_eq!(
			ensure_dependencies(&locator_with(None)),
			Err(crate::Error::dependency_missing(missing_ffmpeg_message()))
		);
	}

	#[test]
	fn test_download_creates_dir() {
		let dir = create_dir();
		let output_dir = dir.path().join("nested").join("downloads");
		let ffmpeg = ToolLocation::Path("/opt/bundle/ffmpeg".into());
		let downloader = TestDownloader::new(|| return Ok(0));

		let res = download_playlist(URL, &output_dir, &locator_with(Some(ffmpeg.clone())), &downloader);

		assert_eq!(res, Ok(0));
		assert!(output_dir.is_dir());

		let calls = downloader.calls.borrow();
		assert_eq!(calls.len(), 1);
		assert_eq!(calls[0].0, vec![URL.to_owned()]);
		assert_eq!(calls[0].1, build_options(&output_dir, Some(&ffmpeg)));
		assert_eq!(calls[0].1.ffmpeg_location, Some(ffmpeg));
	}

	#[test]
	fn test_download_existing_dir_and_code_passthrough() {
		let dir = create_dir();
		let downloader = TestDownloader::new(|| return Ok(101));

		let res = download_playlist(
			URL,
			dir.path(),
			&locator_with(Some(ToolLocation::Command("ffmpeg".into()))),
			&downloader,
		);

		assert_eq!(res, Ok(101));
	}

	#[test]
	fn test_download_error_propagates() {
		let dir = create_dir();
		let downloader = TestDownloader::new(|| return Err(crate::Error::other("spawn failed")));

		let res = download_playlist(
			URL,
			dir.path(),
			&locator_with(Some(ToolLocation::Command("ffmpeg".into()))),
			&downloader,
		);

		assert_eq!(res, Err(crate::Error::other("spawn failed")));
	}

	#[test]
	fn test_handle_stdout_forwards_lines() {
		let input = "[youtube:tab] Downloading playlist\n[download] Downloading item 1 of 2\n";
		let mut out: Vec<u8> = Vec::new();

		let count = handle_stdout(input.as_bytes(), &mut out).expect("Expected forwarding to work");

		assert_eq!(count, 2);
		assert_eq!(String::from_utf8(out).expect("Expected utf8"), input);
	}

	#[test]
	fn test_handle_stdout_non_utf8_line() {
		let mut input: Vec<u8> = Vec::new();
		input.extend_from_slice(b"[download] first\n");
		input.extend_from_slice(b"[download] t\xfftle\n");
		// more than a pipe buffer worth of output after the invalid line
		for i in 0..10_000 {
			input.extend_from_slice(format!("[download] progress line {i:05}\n").as_bytes());
		}
		input.extend_from_slice(b"[download] last");
		let mut out: Vec<u8> = Vec::new();

		let count = handle_stdout(input.as_slice(), &mut out).expect("Expected forwarding to work");

		assert_eq!(count, 10_003);
		assert!(out.starts_with(b"[download] first\n[download] t\xfftle\n"));
		assert!(out.ends_with(b"[download] progress line 09999\n[download] last\n"));
	}

	#[test]
	fn test_handle_stdout_crlf() {
		let mut out: Vec<u8> = Vec::new();

		let count = handle_stdout(b"line one\r\nline two\r\n".as_slice(), &mut out).expect("Expected forwarding to work");

		assert_eq!(count, 2);
		assert_eq!(out, b"line one\nline two\n");
	}

	#[cfg(unix)]
	#[test]
	fn test_exit_code() {
		use std::os::unix::process::ExitStatusExt;

		assert_eq!(exit_code(ExitStatus::from_raw(0)), 0);
		assert_eq!(exit_code(ExitStatus::from_raw(1 << 8)), 1);
		// killed by SIGKILL, no exit code available
		assert_eq!(exit_code(ExitStatus::from_raw(9)), 0);
	}
}
