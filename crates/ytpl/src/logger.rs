//! Module for all Logger related things

use colored::{
	Color,
	Colorize,
};
use flexi_logger::{
	DeferredNow,
	FlexiLoggerError,
	LogSpecification,
	Logger,
	LoggerHandle,
	Record,
	style,
};

/// Function for setting up the logger
/// Logs go to STDERR, because STDOUT is used for the yt-dlp output
#[inline]
pub fn setup_logger() -> Result<LoggerHandle, FlexiLoggerError> {
	return Logger::try_with_env_or_str("warn")?
		.adaptive_format_for_stderr(flexi_logger::AdaptiveFormat::Custom(log_format, color_log_format))
		.log_to_stderr()
		.start();
}

/// Map the cli verbosity to a [LogSpecification]
/// Returns [None] if the verbosity is out of range
pub fn verbosity_spec(verbosity: u8) -> Option<LogSpecification> {
	let level = match verbosity {
		0 => "warn",
		1 => "info",
		2 => "debug",
		3 => "trace",
		_ => return None,
	};

	return LogSpecification::parse(level).ok();
}

/// ISO 8601 Time Format for logging
/// format to be "1977-11-30T13:30:30.000+0200"
pub const ISO8601_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

/// Logging format for log files and non-interactive formats
/// Not Colored and not padded
///
/// Example Lines:
/// `[2022-03-02T13:42:43.374+0100 ERROR module]: test line`
/// `[2022-03-02T13:42:43.374+0100 WARN module::deeper]: test line`
pub fn log_format(w: &mut dyn std::io::Write, now: &mut DeferredNow, record: &Record) -> Result<(), std::io::Error> {
	return write!(
		w,
		"[{} {} {}]: {}", // dont pad anything for non-interactive logs
		now.format(ISO8601_TIME_FORMAT),
		record.level(),
		record.module_path().unwrap_or("<unnamed module>"),
		&record.args()
	);
}

/// Logging format for a tty for interactive formats
/// Colored and padded
///
/// Example Lines:
/// `[2022-03-02T13:42:43.374+0100 ERROR module]: test line`
/// `[2022-03-02T13:42:43.374+0100 WARN  module::deeper]: test line`
pub fn color_log_format(
	w: &mut dyn std::io::Write,
	now: &mut DeferredNow,
	record: &Record,
) -> Result<(), std::io::Error> {
	let level = record.level();
	return write!(
		w,
		"[{} {} {}]: {}",
		now.format(ISO8601_TIME_FORMAT).to_string().color(Color::BrightBlack), // Bright Black = Grey
		style(level).paint(format!("{:5}", level)), // pad level to 5 characters, cannot be done in the string itself, because of the color characters
		record.module_path().unwrap_or("<unnamed module>"),
		&record.args()
	);
}
