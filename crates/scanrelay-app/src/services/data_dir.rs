// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-aware config file resolution.

use std::path::{Path, PathBuf};

const APP_DIR: &str = "scanrelay";
const CONFIG_FILE: &str = "config.json";

/// The config file to load: the explicit path if given, otherwise the
/// per-user default if it exists. `None` means built-in defaults.
pub fn resolve_config(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let default = config_dir(|key| std::env::var(key).ok())?.join(CONFIG_FILE);
    default.is_file().then_some(default)
}

/// `$XDG_CONFIG_HOME/scanrelay`, falling back to `$HOME/.config/scanrelay`.
fn config_dir(lookup: impl Fn(&str) -> Option<String>) -> Option<PathBuf> {
    if let Some(xdg) = lookup("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(xdg).join(APP_DIR));
    }
    lookup("HOME")
        .filter(|v| !v.is_empty())
        .map(|home| PathBuf::from(home).join(".config").join(APP_DIR))
}
