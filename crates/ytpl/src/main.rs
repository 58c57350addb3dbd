#![allow(clippy::needless_return)]
#![warn(clippy::implicit_return)]

#[macro_use]
extern crate log;

use clap::Parser;
use libytpl::{
	locate::Locator,
	main::download::{
		Downloader,
		YtDlp,
		download_playlist,
	},
};
use std::io::Error as ioError;

mod clap_conf;
use clap_conf::*;

mod logger;

/// Main
fn main() -> Result<(), ioError> {
	let mut logger_handle = logger::setup_logger().map_err(|err| return ioError::other(err.to_string()))?;

	// parsing errors print the usage and exit with a non-0 code here
	let cli_matches = CliDerive::parse();

	// apply cli "verbosity" argument to the log level
	let Some(spec) = logger::verbosity_spec(cli_matches.verbosity) else {
		return Err(ioError::other(
			"Expected verbosity integer range between 0 and 3 (inclusive)",
		));
	};
	logger_handle.set_new_spec(spec);

	info!("CLI Verbosity is {}", cli_matches.verbosity);

	let code = command_download(&cli_matches, &cli_matches.locator(), &YtDlp::default());

	// flush logs before exiting, because "exit" does not run destructors
	logger_handle.shutdown();
	std::process::exit(code);
}

/// Handler function for downloading the playlist
/// Returns the exit code to use, errors are printed to STDERR and result in code 1
fn command_download<D: Downloader>(main_args: &CliDerive, locator: &Locator, downloader: &D) -> i32 {
	return match download_playlist(&main_args.playlist_url, &main_args.output_path, locator, downloader) {
		Ok(code) => code,
		Err(err) => {
			debug!("Error Backtrace:\n{}", err.get_backtrace());
			eprintln!("{}", err);
			return 1;
		},
	};
}
