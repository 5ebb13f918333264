// tabshelf platform paths
// Resolves where settings and the collection database live on each OS.

use std::env;
use std::path::PathBuf;

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const APP_DIR_UNIX: &str = "tabshelf";
#[cfg(any(target_os = "macos", target_os = "windows"))]
const APP_DIR_DESKTOP: &str = "Tabshelf";

/// Environment variable that relocates the data directory (used by the RPC binary and tests).
pub const DATA_DIR_ENV: &str = "TABSHELF_DATA_DIR";

#[cfg(not(target_os = "windows"))]
fn home_dir() -> PathBuf {
    PathBuf::from(env::var("HOME").unwrap_or_else(|_| String::from("/tmp")))
}

/// Returns the configuration directory.
///
/// - **Linux**: `$XDG_CONFIG_HOME/tabshelf` or `~/.config/tabshelf`
/// - **macOS**: `~/Library/Application Support/Tabshelf`
/// - **Windows**: `%APPDATA%/Tabshelf`
pub fn get_config_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        home_dir()
            .join("Library")
            .join("Application Support")
            .join(APP_DIR_DESKTOP)
    }
    #[cfg(target_os = "windows")]
    {
        let appdata = env::var("APPDATA")
            .unwrap_or_else(|_| String::from("C:\\Users\\Default\\AppData\\Roaming"));
        PathBuf::from(appdata).join(APP_DIR_DESKTOP)
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        match env::var("XDG_CONFIG_HOME") {
            Ok(xdg) => PathBuf::from(xdg).join(APP_DIR_UNIX),
            Err(_) => home_dir().join(".config").join(APP_DIR_UNIX),
        }
    }
}

/// Returns the data directory, honouring [`DATA_DIR_ENV`] first.
///
/// - **Linux**: `$XDG_DATA_HOME/tabshelf` or `~/.local/share/tabshelf`
/// - **macOS** / **Windows**: same as the config directory
pub fn get_data_dir() -> PathBuf {
    if let Ok(dir) = env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }
    #[cfg(any(target_os = "macos", target_os = "windows"))]
    {
        get_config_dir()
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        match env::var("XDG_DATA_HOME") {
            Ok(xdg) => PathBuf::from(xdg).join(APP_DIR_UNIX),
            Err(_) => home_dir().join(".local").join("share").join(APP_DIR_UNIX),
        }
    }
}

/// Full path of the collection database file inside the data directory.
pub fn database_path(file_name: &str) -> PathBuf {
    get_data_dir().join(file_name)
}
