use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const CONFIG_FILE: &str = "relay.yaml";
pub const CONFIG_ENV: &str = "RELAY_CONFIG";
/// User-level config location, relative to the home directory.
pub const USER_CONFIG: &str = ".config/relay/relay.yaml";

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Resolve the config file to load.
///
/// Priority:
/// 1. `--config` flag / `RELAY_CONFIG` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `relay.yaml`
/// 3. `~/.config/relay/relay.yaml`
///
/// `None` means no file exists and defaults apply.
pub fn resolve_config(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = explicit {
        return Some(p.to_path_buf());
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    if let Some(found) = find_upward(&cwd, CONFIG_FILE) {
        return Some(found);
    }

    user_config_path().filter(|p| p.is_file())
}

/// First `name` found in `start` or one of its ancestors.
pub fn find_upward(start: &Path, name: &str) -> Option<PathBuf> {
    let mut dir = start.to_path_buf();
    loop {
        let candidate = dir.join(name);
        if candidate.is_file() {
            return Some(candidate);
        }
        match dir.parent() {
            Some(p) => dir = p.to_path_buf(),
            None => return None,
        }
    }
}

pub fn user_config_path() -> Option<PathBuf> {
    home::home_dir().map(|h| h.join(USER_CONFIG))
}
