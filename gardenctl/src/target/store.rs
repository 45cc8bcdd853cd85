use std::path::{Path, PathBuf};

use snafu::ResultExt;

use super::{Error, Target, error};

/// Persists the target of one session as YAML.
///
/// There is no locking; concurrent invocations need distinct sessions.
#[derive(Clone, Debug)]
pub struct TargetStore {
    path: PathBuf,
}

impl TargetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }

    #[allow(dead_code)]
    #[must_use]
    pub fn path(&self) -> &Path { &self.path }

    /// Reads the stored target. A missing or empty file is the empty target.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CorruptTargetState`] if the file cannot be decoded or
    /// the decoded target is invalid.
    pub fn read(&self) -> Result<Target, Error> {
        let data = match std::fs::read(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Target::default());
            }
            Err(source) => return Err(Error::ReadTargetFile { path: self.path.clone(), source }),
        };
        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(Target::default());
        }

        let target: Target = serde_yaml::from_slice(&data).map_err(|err| {
            Error::CorruptTargetState { path: self.path.clone(), message: err.to_string() }
        })?;
        target.validate().map_err(|err| Error::CorruptTargetState {
            path: self.path.clone(),
            message: err.to_string(),
        })?;
        Ok(target)
    }

    /// Replaces the stored target.
    ///
    /// # Errors
    ///
    /// Fails if serialization or the atomic write fails.
    pub fn write(&self, target: &Target) -> Result<(), Error> {
        let data = serde_yaml::to_string(target).context(error::SerializeTargetSnafu)?;
        gardenctl_base::utils::write_file_atomically(&self.path, data.as_bytes(), 0o600)
            .with_context(|_| error::WriteTargetFileSnafu { path: self.path.clone() })?;
        tracing::debug!("Wrote target {target} to {}", self.path.display());
        Ok(())
    }
}
