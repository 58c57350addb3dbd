//! Module for finding a usable ffmpeg executable
//!
//! Finding is done by a ordered list of [DiscoveryStrategy], where the first strategy to find something wins.
//! The default order is to first check PATH and then check for a bundled copy.

use std::{
	ffi::{
		OsStr,
		OsString,
	},
	path::{
		Path,
		PathBuf,
	},
};

use path_absolutize::Absolutize;

use crate::spawn::{
	ffmpeg::{
		FFMPEG_BIN_NAME,
		ffmpeg_parse_version,
		ffmpeg_version_output,
	},
	multiplatform::{
		current_exe_dir,
		executable_name,
	},
};

/// Name of the directory inside the user data directory where a bundled ffmpeg may be placed
pub const DATA_DIR_NAME: &str = "ytpl";

/// Where a found executable is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolLocation {
	/// A bare command name, which is resolved via PATH
	Command(OsString),
	/// A absolute path to a executable
	Path(PathBuf),
}

impl ToolLocation {
	/// Get the value to pass as a program to spawn
	#[must_use]
	pub fn as_os_str(&self) -> &OsStr {
		return match self {
			Self::Command(v) => v.as_os_str(),
			Self::Path(v) => v.as_os_str(),
		};
	}
}

impl std::fmt::Display for ToolLocation {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		return write!(f, "{}", self.as_os_str().to_string_lossy());
	}
}

/// A single way to find a executable
pub trait DiscoveryStrategy {
	/// Name of the strategy, used for logging
	fn name(&self) -> &str;
	/// Try to find the executable, [None] if not found
	/// Any error while trying counts as not found
	fn discover(&self) -> Option<ToolLocation>;
}

/// Find the executable in PATH by running it with "-version"
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPath {
	/// The command name to run
	command: OsString,
}

impl SearchPath {
	/// Create a new [SearchPath] strategy for a given command name
	pub fn new<C: Into<OsString>>(command: C) -> Self {
		return Self { command: command.into() };
	}
}

impl Default for SearchPath {
	fn default() -> Self {
		return Self::new(FFMPEG_BIN_NAME);
	}
}

impl DiscoveryStrategy for SearchPath {
	fn name(&self) -> &str {
		return "PATH";
	}

	fn discover(&self) -> Option<ToolLocation> {
		// any failure (not found, non-0 exit, bad output) is treated the same
		let output = match ffmpeg_version_output(&self.command) {
			Ok(v) => v,
			Err(err) => {
				debug!(
					"\"{}\" could not be run from PATH: {}",
					self.command.to_string_lossy(),
					err
				);
				return None;
			},
		};

		match ffmpeg_parse_version(&output) {
			Ok(version) => debug!("Found ffmpeg version {} in PATH", version),
			Err(_) => debug!("Found ffmpeg in PATH, but could not determine its version"),
		}

		return Some(ToolLocation::Command(self.command.clone()));
	}
}

/// Find a private copy of the executable in a list of directories
#[derive(Debug, Clone, PartialEq)]
pub struct BundledCopy {
	/// Directories to check, in order
	dirs:      Vec<PathBuf>,
	/// The filename of the executable, including platform extension
	file_name: String,
}

impl BundledCopy {
	/// Create a new [BundledCopy] strategy with custom directories to check
	pub fn new(dirs: Vec<PathBuf>) -> Self {
		return Self {
			dirs,
			file_name: executable_name(FFMPEG_BIN_NAME),
		};
	}

	/// Get the default directories a bundled ffmpeg may be in
	/// Those are the directory of the current executable and the "bin" directory in the user data directory
	pub fn default_dirs() -> Vec<PathBuf> {
		let mut dirs = Vec::with_capacity(2);

		if let Some(exe_dir) = current_exe_dir() {
			dirs.push(exe_dir);
		}

		if let Some(data_dir) = dirs::data_dir() {
			dirs.push(data_dir.join(DATA_DIR_NAME).join("bin"));
		}

		return dirs;
	}
}

impl Default for BundledCopy {
	fn default() -> Self {
		return Self::new(Self::default_dirs());
	}
}

impl DiscoveryStrategy for BundledCopy {
	fn name(&self) -> &str {
		return "bundled";
	}

	fn discover(&self) -> Option<ToolLocation> {
		for dir in &self.dirs {
			let path = dir.join(&self.file_name);

			if path.is_file() {
				return Some(ToolLocation::Path(path));
			}

			trace!("No bundled ffmpeg at \"{}\"", path.display());
		}

		return None;
	}
}

/// Use a path explicitly given by the user
#[derive(Debug, Clone, PartialEq)]
pub struct ExplicitPath {
	path: PathBuf,
}

impl ExplicitPath {
	/// Create a new [ExplicitPath] strategy
	pub fn new<P: Into<PathBuf>>(path: P) -> Self {
		return Self { path: path.into() };
	}
}

impl DiscoveryStrategy for ExplicitPath {
	fn name(&self) -> &str {
		return "explicit";
	}

	fn discover(&self) -> Option<ToolLocation> {
		if !self.path.is_file() {
			warn!(
				"Explicitly given ffmpeg path \"{}\" is not a file, ignoring it",
				self.path.display()
			);
			return None;
		}

		return match self.path.absolutize() {
			Ok(v) => Some(ToolLocation::Path(v.to_path_buf())),
			Err(err) => {
				warn!("Could not absolutize \"{}\": {}", self.path.display(), err);
				return None;
			},
		};
	}
}

/// Finds a ffmpeg executable by trying all strategies in order
pub struct Locator {
	strategies: Vec<Box<dyn DiscoveryStrategy>>,
}

impl Locator {
	/// Create a [Locator] with a custom list of strategies
	pub fn new(strategies: Vec<Box<dyn DiscoveryStrategy>>) -> Self {
		return Self { strategies };
	}

	/// Create the default [Locator], but try `path` before anything else
	pub fn with_override<P: AsRef<Path>>(path: P) -> Self {
		let mut locator = Self::default();
		locator
			.strategies
			.insert(0, Box::new(ExplicitPath::new(path.as_ref())));

		return locator;
	}

	/// Find the executable, returns the first found location
	/// Strategies after the first successful one are not run
	pub fn locate(&self) -> Option<ToolLocation> {
		for strategy in &self.strategies {
			if let Some(location) = strategy.discover() {
				info!("Found ffmpeg via {}: \"{}\"", strategy.name(), location);
				return Some(location);
			}

			debug!("ffmpeg not found via {}", strategy.name());
		}

		return None;
	}
}

impl Default for Locator {
	fn default() -> Self {
		return Self::new(vec![
			Box::new(SearchPath::default()),
			Box::new(BundledCopy::default()),
		]);
	}
}

impl std::fmt::Debug for Locator {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		return f
			.debug_list()
			.entries(self.strategies.iter().map(|v| return v.name()))
			.finish();
	}
}

#[cfg(test)]
pub(crate) mod test_utils {
	use std::{
		cell::Cell,
		rc::Rc,
	};

	use super::*;

	/// Strategy that always returns a fixed value and counts how often it was asked
	pub struct FixedStrategy {
		pub result: Option<ToolLocation>,
		pub calls:  Rc<Cell<usize>>,
	}

	impl FixedStrategy {
		pub fn new(result: Option<ToolLocation>) -> (Self, Rc<Cell<usize>>) {
			let calls = Rc::new(Cell::new(0));

			return (
				Self {
					result,
					calls: calls.clone(),
				},
				calls,
			);
		}
	}

	impl DiscoveryStrategy for FixedStrategy {
		fn name(&self) -> &str {
			return "fixed";
		}

		fn discover(&self) -> Option<ToolLocation> {
			self.calls.set(self.calls.get() + 1);
			return self.result.clone();
		}
	}
}
