use std::path::PathBuf;

use kube::config::Kubeconfig;
use sha2::{Digest, Sha256};
use snafu::ResultExt;

use super::{Error, Target, error};

/// Kubeconfigs of targets, cached as `kubeconfig.<digest>.yaml` in the
/// session directory.
#[derive(Clone, Debug)]
pub struct KubeconfigCache {
    dir: PathBuf,
}

impl KubeconfigCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self { Self { dir: dir.into() } }

    /// Returns the cache file of `target`.
    ///
    /// The name is derived from every level of the target, so distinct
    /// targets never share a file.
    #[must_use]
    pub fn path(&self, target: &Target) -> PathBuf {
        let key = format!(
            "{}|{}|{}|{}|{}",
            target.garden_name(),
            target.project_name(),
            target.seed_name(),
            target.shoot_name(),
            target.control_plane()
        );
        let digest = hex::encode(Sha256::digest(key.as_bytes()));
        self.dir.join(format!("kubeconfig.{digest}.yaml"))
    }

    /// Returns the cached kubeconfig of `target`, or `None` on a miss.
    ///
    /// # Errors
    ///
    /// Fails if the file exists but cannot be read or parsed.
    pub fn read(&self, target: &Target) -> Result<Option<Kubeconfig>, Error> {
        let path = self.path(target);
        let data = match std::fs::read(&path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("Kubeconfig cache miss for {target}");
                return Ok(None);
            }
            Err(source) => return Err(Error::ReadKubeconfigCache { path, source }),
        };
        tracing::debug!("Kubeconfig cache hit for {target} at {}", path.display());
        Ok(Some(crate::kubeconfig::from_yaml(&data)?))
    }

    /// Stores `kubeconfig` for `target` and returns the file path.
    ///
    /// # Errors
    ///
    /// Fails if serialization or the atomic write fails.
    pub fn write(&self, target: &Target, kubeconfig: &Kubeconfig) -> Result<PathBuf, Error> {
        let path = self.path(target);
        let data = crate::kubeconfig::to_yaml(kubeconfig)?;
        gardenctl_base::utils::write_file_atomically(&path, data.as_bytes(), 0o600)
            .with_context(|_| error::WriteKubeconfigCacheSnafu { path: path.clone() })?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kubeconfig::{from_yaml, testing::GARDEN_KUBECONFIG};

    #[test]
    fn test_path_is_deterministic() {
        let cache = KubeconfigCache::new("/tmp/garden/session");
        let target = Target::new("live", "team-a", "", "web", false);
        assert_eq!(cache.path(&target), cache.path(&target.clone()));
        assert_ne!(cache.path(&target), cache.path(&target.clone().with_control_plane(true)));
        assert_ne!(
            cache.path(&Target::new("live", "ab", "", "", false)),
            cache.path(&Target::new("live", "a", "", "b", false))
        );

        let name = cache.path(&target).file_name().map(|name| name.to_string_lossy().into_owned());
        let name = name.expect("file name");
        assert!(name.starts_with("kubeconfig.") && name.ends_with(".yaml"));
        assert_eq!(name.len(), "kubeconfig.".len() + 64 + ".yaml".len());
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let cache = KubeconfigCache::new(dir.path());
        let target = Target::new("live", "", "", "", false);
        assert!(cache.read(&target).expect("read cache").is_none());

        let kubeconfig = from_yaml(GARDEN_KUBECONFIG.as_bytes()).expect("parse kubeconfig");
        let path = cache.write(&target, &kubeconfig).expect("write cache");
        assert_eq!(path, cache.path(&target));

        let cached = cache.read(&target).expect("read cache").expect("cache hit");
        assert_eq!(cached.current_context, kubeconfig.current_context);
        assert_eq!(
            crate::kubeconfig::to_yaml(&cached).expect("serialize"),
            crate::kubeconfig::to_yaml(&kubeconfig).expect("serialize")
        );
    }
}
