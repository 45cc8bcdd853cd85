//! Per-shell session state.
//!
//! Every shell gets its own directory below `${TMPDIR}/garden`, named after
//! the session id exported into the shell. The target file, the kubeconfig
//! cache and the kubeconfig link all live there.

use std::{
    path::{Path, PathBuf},
    sync::LazyLock,
};

use gardenctl_base::consts::env;
use regex::Regex;
use snafu::{OptionExt, ResultExt, Snafu, ensure};

static SESSION_ID_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("^[a-zA-Z0-9_-]{1,128}$").expect("session id regex is valid")
});

/// A version 4 UUID anywhere in a terminal session id like `w0t0p0:<uuid>`.
static TERM_SESSION_UUID_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("(?i)[0-9a-f]{8}-[0-9a-f]{4}-4[0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}")
        .expect("terminal session uuid regex is valid")
});

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display(
        "Environment variable {} is required, export it with a unique value for the \
         current shell",
        env::SESSION_ID
    ))]
    NoSessionId,

    #[snafu(display(
        "Session id '{id}' is invalid, it must consist of 1 to 128 alphanumeric characters, \
         '-' or '_'"
    ))]
    InvalidSessionId { id: String },

    #[snafu(display("Failed to create session directory {}, error: {source}", path.display()))]
    CreateSessionDirectory { path: PathBuf, source: std::io::Error },
}

/// Picks the session id from `GCTL_SESSION_ID`, falling back to the UUID
/// embedded in `TERM_SESSION_ID`.
///
/// Terminal session ids without a version 4 UUID are ignored. The UUID is
/// lowercased.
///
/// # Errors
///
/// Fails if no id is available or `GCTL_SESSION_ID` is not usable as a
/// directory name.
pub fn resolve_session_id(
    session_id: Option<&str>,
    term_session_id: Option<&str>,
) -> Result<String, Error> {
    if let Some(id) = session_id.filter(|id| !id.is_empty()) {
        ensure!(SESSION_ID_REGEX.is_match(id), InvalidSessionIdSnafu { id });
        return Ok(id.to_string());
    }
    term_session_id
        .and_then(|id| TERM_SESSION_UUID_REGEX.find(id))
        .map(|uuid| uuid.as_str().to_ascii_lowercase())
        .context(NoSessionIdSnafu)
}

/// The directory of one shell session.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Session {
    dir: PathBuf,
}

impl Session {
    /// Opens the session `id` below `temp_dir`, creating its directory with
    /// owner-only permissions.
    ///
    /// # Errors
    ///
    /// Fails if the directory cannot be created.
    pub fn open(temp_dir: &Path, id: &str) -> Result<Self, Error> {
        let dir = gardenctl_base::config::session_directory(temp_dir, id);
        gardenctl_base::utils::create_private_dir_all(&dir)
            .with_context(|_| CreateSessionDirectorySnafu { path: dir.clone() })?;
        tracing::debug!("Using session directory {}", dir.display());
        Ok(Self { dir })
    }

    #[must_use]
    pub fn dir(&self) -> &Path { &self.dir }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TERM_UUID: &str = "12345678-1234-4567-89ab-123456789012";

    #[test]
    fn test_resolve_session_id_prefers_gardenctl_variable() {
        let term = format!("w0t0p0:{TERM_UUID}");
        let id = resolve_session_id(Some("gctl-1"), Some(&term)).expect("session id");
        assert_eq!(id, "gctl-1");
    }

    #[test]
    fn test_resolve_session_id_extracts_terminal_uuid() {
        for (term, expected) in [
            ("w0t0p0:12345678-1234-4567-89AB-123456789012", TERM_UUID),
            ("w0:12345678-1234-4567-89ab-123456789012:some-suffix", TERM_UUID),
            ("a1b2c3d4-5678-4abc-9def-123456789012", "a1b2c3d4-5678-4abc-9def-123456789012"),
            (
                "foo:bar:ABCDEF12-3456-4789-9ABC-DEF123456789:x",
                "abcdef12-3456-4789-9abc-def123456789",
            ),
        ] {
            assert_eq!(resolve_session_id(None, Some(term)).expect("session id"), expected);
            assert_eq!(resolve_session_id(Some(""), Some(term)).expect("session id"), expected);
        }
    }

    #[test]
    fn test_resolve_session_id_ignores_terminal_id_without_uuid() {
        for term in ["term_1", "w0:no-uid:some-suffix", "12345678-1234-3567-89ab-123456789012"] {
            assert!(
                matches!(resolve_session_id(None, Some(term)), Err(Error::NoSessionId)),
                "accepted {term}"
            );
        }
    }

    #[test]
    fn test_resolve_session_id_requires_a_value() {
        assert!(matches!(resolve_session_id(None, None), Err(Error::NoSessionId)));
        assert!(matches!(resolve_session_id(Some(""), Some("")), Err(Error::NoSessionId)));
    }

    #[test]
    fn test_resolve_session_id_rejects_path_characters() {
        let long = "x".repeat(129);
        for id in ["../etc", "a/b", "with space", long.as_str()] {
            assert!(
                matches!(resolve_session_id(Some(id), None), Err(Error::InvalidSessionId { .. })),
                "accepted {id}"
            );
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_open_creates_private_directory() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::tempdir().expect("create temp dir");
        let session = Session::open(temp.path(), "abc").expect("open session");

        assert_eq!(session.dir(), temp.path().join("garden").join("abc"));
        let mode = std::fs::metadata(session.dir()).expect("stat dir").permissions().mode();
        assert_eq!(mode & 0o777, 0o700);
    }
}
