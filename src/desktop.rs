//! Desktop background integration.
//!
//! Sets a cached image as the wallpaper using each platform's own tooling:
//! `gsettings` on Linux (GNOME), `osascript` on macOS and the registry plus
//! `RUNDLL32` on Windows.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

/// Errors from setting the desktop background.
#[derive(Debug, Error)]
pub enum DesktopError {
    #[error("image file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} exited with status {status}: {stderr}")]
    CommandFailed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("setting the desktop background is not supported on this platform")]
    Unsupported,
}

/// Commands that set `path` as the background on the current platform.
fn background_commands(path: &Path) -> Result<Vec<Command>, DesktopError> {
    #[cfg(target_os = "linux")]
    {
        let uri = format!("file://{}", path.display());
        let keys = ["picture-uri", "picture-uri-dark"];
        Ok(keys
            .iter()
            .map(|&key| {
                let mut cmd = Command::new("gsettings");
                cmd.args(["set", "org.gnome.desktop.background", key, uri.as_str()]);
                cmd
            })
            .collect())
    }

    #[cfg(target_os = "macos")]
    {
        let script = format!(
            "tell application \"System Events\" to tell every desktop to set picture to \"{}\"",
            path.display().to_string().replace('"', "\\\"")
        );
        let mut cmd = Command::new("osascript");
        cmd.args(["-e", script.as_str()]);
        Ok(vec![cmd])
    }

    #[cfg(windows)]
    {
        let mut reg = Command::new("reg");
        reg.args(["add", r"HKCU\Control Panel\Desktop", "/v", "Wallpaper", "/t", "REG_SZ", "/f", "/d"])
            .arg(path);
        let mut refresh = Command::new("RUNDLL32.EXE");
        refresh.args(["user32.dll,UpdatePerUserSystemParameters"]);
        Ok(vec![reg, refresh])
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos", windows)))]
    {
        let _ = path;
        Err(DesktopError::Unsupported)
    }
}

fn run(mut cmd: Command) -> Result<(), DesktopError> {
    let program = cmd.get_program().to_string_lossy().into_owned();
    log::debug!("Running {:?}", cmd);

    let output = cmd.output().map_err(|source| DesktopError::Spawn {
        program: program.clone(),
        source,
    })?;
    if output.status.success() {
        Ok(())
    } else {
        Err(DesktopError::CommandFailed {
            program,
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

/// Set the image at `path` as the desktop background.
///
/// # Errors
///
/// Returns [`DesktopError::NotFound`] if `path` is not an existing file, and
/// a spawn or command error if the platform tool fails.
pub fn set_desktop_background(path: &Path) -> Result<(), DesktopError> {
    if !path.is_file() {
        return Err(DesktopError::NotFound(path.to_path_buf()));
    }

    for cmd in background_commands(path)? {
        run(cmd)?;
    }
    log::info!("Desktop background set to {}", path.display());
    Ok(())
}
