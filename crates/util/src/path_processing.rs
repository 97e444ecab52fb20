use std::path::PathBuf;

use dirs_next::home_dir;

/// Expand a leading `~` to the user's home directory.
///
/// Paths without a leading tilde are returned unchanged apart from trimming.
pub fn expand_tilde(path: &str) -> PathBuf {
    let trimmed = path.trim();
    let home = || home_dir().unwrap_or_else(|| PathBuf::from("~"));
    if trimmed == "~" {
        return home();
    }
    match trimmed.strip_prefix("~/").or_else(|| trimmed.strip_prefix("~\\")) {
        Some(rest) => home().join(rest),
        None => PathBuf::from(trimmed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaves_absolute_paths_alone() {
        assert_eq!(expand_tilde(" /etc/oasis/oasis.json "), PathBuf::from("/etc/oasis/oasis.json"));
    }

    #[test]
    fn expands_home_prefix() {
        if let Some(home) = home_dir() {
            assert_eq!(expand_tilde("~/oasis.json"), home.join("oasis.json"));
            assert_eq!(expand_tilde("~"), home);
        }
    }
}
