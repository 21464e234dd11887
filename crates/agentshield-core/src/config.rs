//! Default locations for AgentShield's on-disk configuration, following the
//! same XDG convention the rest of the pack tooling in this ecosystem uses.

use std::path::PathBuf;

/// `$XDG_CONFIG_HOME/agentshield/packs`, falling back to
/// `~/.config/agentshield/packs` on Unix or `%APPDATA%\agentshield\packs`
/// on Windows. Returns `None` when neither environment variable is set.
#[must_use]
pub fn default_pack_dir() -> Option<PathBuf> {
    #[cfg(not(windows))]
    {
        default_pack_dir_unix(std::env::var("XDG_CONFIG_HOME").ok(), std::env::var("HOME").ok())
    }

    #[cfg(windows)]
    {
        std::env::var("APPDATA")
            .ok()
            .map(|appdata| PathBuf::from(appdata).join("agentshield").join("packs"))
    }
}

#[cfg(not(windows))]
fn default_pack_dir_unix(xdg_config_home: Option<String>, home: Option<String>) -> Option<PathBuf> {
    if let Some(xdg) = xdg_config_home {
        if !xdg.is_empty() {
            return Some(PathBuf::from(xdg).join("agentshield").join("packs"));
        }
    }
    home.map(|home| {
        PathBuf::from(home)
            .join(".config")
            .join("agentshield")
            .join("packs")
    })
}
