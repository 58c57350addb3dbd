use std::{
	ffi::OsStr,
	path::PathBuf,
	process::Command,
};

/// Spawn a binary, either a name to search in PATH or a direct path to a executable
/// Apparently, rust automatically adds a extensions (".exe") on windows if none is specified
#[inline]
pub fn spawn_command<B: AsRef<OsStr>>(binary: B) -> Command {
	return Command::new(binary);
}

/// Get the filename a executable named `binary_name` has on the current platform
/// On windows this means adding ".exe", on other platforms it is unchanged
#[inline]
#[must_use]
pub fn executable_name(binary_name: &str) -> String {
	return format!("{}{}", binary_name, std::env::consts::EXE_SUFFIX);
}

/// Get the directory the currently running executable is in
/// Returns [None] if the path could not be determined
pub fn current_exe_dir() -> Option<PathBuf> {
	let current_binary_path = match std::env::current_exe() {
		Ok(v) => v,
		Err(err) => {
			debug!("Could not determine current executable path: {}", err);
			return None;
		},
	};

	return current_binary_path.parent().map(|v| return v.to_path_buf());
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_executable_name() {
		#[cfg(windows)]
		assert_eq!(executable_name("ffmpeg"), "ffmpeg.exe");
		#[cfg(not(windows))]
		assert_eq!(executable_name("ffmpeg"), "ffmpeg");
	}

	#[test]
	fn test_current_exe_dir() {
		let dir = current_exe_dir().expect("Expected test binary to have a directory");

		assert!(dir.is_dir());
	}
}
