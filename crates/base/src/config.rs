use std::path::{Path, PathBuf};

use directories::UserDirs;

use crate::{DEFAULT_CONFIG_NAME, DEFAULT_HOME_DIR_NAME, SESSION_ROOT_DIR_NAME};

/// Returns the gardenctl home directory.
///
/// `home_override` is the value of `GCTL_HOME`; when unset or empty the home
/// is `~/.garden`, falling back to a relative `.garden` if the user's home
/// directory cannot be determined.
#[must_use]
pub fn gardenctl_home(home_override: Option<&str>) -> PathBuf {
    match home_override.filter(|home| !home.is_empty()) {
        Some(home) => PathBuf::from(home),
        None => UserDirs::new().map_or_else(
            || PathBuf::from(DEFAULT_HOME_DIR_NAME),
            |dirs| dirs.home_dir().join(DEFAULT_HOME_DIR_NAME),
        ),
    }
}

/// Returns `<home>/<name>.yaml`, where `name` defaults to `gardenctl-v2`.
#[must_use]
pub fn config_file_path(home: &Path, config_name: Option<&str>) -> PathBuf {
    let name = config_name.filter(|name| !name.is_empty()).unwrap_or(DEFAULT_CONFIG_NAME);
    home.join(format!("{name}.yaml"))
}

/// Returns `<tmp>/garden/<session_id>`.
#[must_use]
pub fn session_directory(temp_dir: &Path, session_id: &str) -> PathBuf {
    [temp_dir, Path::new(SESSION_ROOT_DIR_NAME), Path::new(session_id)].iter().collect()
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use super::*;

    #[test]
    fn test_gardenctl_home_override() {
        assert_eq!(gardenctl_home(Some("/opt/garden")), PathBuf::from("/opt/garden"));
    }

    #[test]
    fn test_gardenctl_home_ignores_empty_override() {
        assert!(gardenctl_home(Some("")).ends_with(DEFAULT_HOME_DIR_NAME));
    }

    #[test]
    fn test_config_file_path() {
        let home = Path::new("/home/user/.garden");
        assert_eq!(
            config_file_path(home, None),
            PathBuf::from("/home/user/.garden/gardenctl-v2.yaml")
        );
        assert_eq!(
            config_file_path(home, Some("testing")),
            PathBuf::from("/home/user/.garden/testing.yaml")
        );
    }

    #[test]
    fn test_session_directory() {
        assert_eq!(
            session_directory(Path::new("/tmp"), "abc-123"),
            PathBuf::from("/tmp/garden/abc-123")
        );
    }
}
