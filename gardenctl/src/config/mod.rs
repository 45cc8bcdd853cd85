mod access_restriction;
mod error;
mod log;
mod pattern;

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    sync::LazyLock,
};

use regex::Regex;
use resolve_path::PathResolveExt;
use serde::{Deserialize, Serialize};
use snafu::ResultExt;

pub use self::{
    access_restriction::{AccessRestriction, AccessRestrictionMessages},
    error::Error,
    log::LogConfig,
};
#[cfg(test)]
pub use self::access_restriction::{AccessRestrictionMessage, AccessRestrictionOption};

static GARDEN_NAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("^[a-zA-Z0-9_-]+$").expect("garden name regex is valid")
});

/// Returns whether `name` is usable as a canonical garden name.
#[must_use]
pub fn is_valid_garden_name(name: &str) -> bool { GARDEN_NAME_REGEX.is_match(name) }

/// The user's list of gardens plus process-wide settings.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub gardens: Vec<Garden>,

    /// Whether `kubeconfig.yaml` in the session directory follows the target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_kubeconfig: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log: Option<LogConfig>,
}

/// A garden cluster known to gardenctl.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Garden {
    /// Canonical name, stored under `identity`.
    #[serde(rename = "identity")]
    pub name: String,

    /// Alternate name, stored under `name`.
    #[serde(rename = "name", default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    pub kubeconfig: PathBuf,

    /// Overrides the kubeconfig's current context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub patterns: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub access_restrictions: Vec<AccessRestriction>,
}

impl Garden {
    /// Returns whether `name_or_alias` refers to this garden.
    #[must_use]
    pub fn is_named(&self, name_or_alias: &str) -> bool {
        self.name == name_or_alias || self.alias.as_deref() == Some(name_or_alias)
    }

    /// Returns the kubeconfig path with `~` expanded.
    ///
    /// # Errors
    ///
    /// Fails if the path cannot be resolved.
    pub fn kubeconfig_path(&self) -> Result<PathBuf, Error> {
        self.kubeconfig
            .try_resolve()
            .map(|path| path.to_path_buf())
            .with_context(|_| error::ResolveFilePathSnafu { file_path: self.kubeconfig.clone() })
    }
}

impl Config {
    /// Loads the configuration from `path`.
    ///
    /// A missing file yields the empty configuration.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or parsed, or if it does not pass
    /// [`Config::validate`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let path = path
            .try_resolve()
            .map(|path| path.to_path_buf())
            .with_context(|_| error::ResolveFilePathSnafu { file_path: path.to_path_buf() })?;

        let data = match std::fs::read(&path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("Config file {} does not exist, using empty config", path.display());
                return Ok(Self::default());
            }
            Err(source) => return Err(Error::OpenConfig { filename: path, source }),
        };

        let config: Self = if data.iter().all(u8::is_ascii_whitespace) {
            Self::default()
        } else {
            serde_yaml::from_slice(&data)
                .with_context(|_| error::ParseConfigSnafu { filename: path.clone() })?
        };
        config.validate()?;

        Ok(config)
    }

    /// Validates and writes the configuration to `path` atomically.
    ///
    /// # Errors
    ///
    /// Fails if validation, serialization or the write fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        self.validate()?;
        let path = path.as_ref();
        let data = serde_yaml::to_string(self).context(error::SerializeConfigSnafu)?;
        gardenctl_base::utils::write_file_atomically(path, data.as_bytes(), 0o600)
            .with_context(|_| error::WriteConfigSnafu { filename: path.to_path_buf() })
    }

    /// Checks garden names, name/alias uniqueness and patterns.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn validate(&self) -> Result<(), Error> {
        let mut seen = HashSet::new();
        for garden in &self.gardens {
            if !is_valid_garden_name(&garden.name) {
                return error::InvalidGardenNameSnafu { name: garden.name.clone() }.fail();
            }

            for name in std::iter::once(&garden.name).chain(garden.alias.iter()) {
                if !seen.insert(name.as_str()) {
                    return error::DuplicateGardenSnafu { name: name.clone() }.fail();
                }
            }

            for pattern in &garden.patterns {
                let _regex = pattern::compile(&garden.name, pattern)?;
            }
        }
        Ok(())
    }

    /// Finds a garden by exact name, then by exact alias.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownGarden`] if neither matches.
    pub fn find_garden(&self, name_or_alias: &str) -> Result<&Garden, Error> {
        self.gardens
            .iter()
            .find(|garden| garden.name == name_or_alias)
            .or_else(|| {
                self.gardens.iter().find(|garden| garden.alias.as_deref() == Some(name_or_alias))
            })
            .ok_or_else(|| Error::UnknownGarden { name: name_or_alias.to_string() })
    }

    #[must_use]
    pub fn link_kubeconfig(&self) -> bool { self.link_kubeconfig.unwrap_or(true) }

    /// Inserts `garden`, replacing any garden of the same name.
    pub fn upsert_garden(&mut self, garden: Garden) {
        match self.gardens.iter_mut().find(|existing| existing.name == garden.name) {
            Some(existing) => *existing = garden,
            None => self.gardens.push(garden),
        }
    }

    /// Removes the garden named `name` and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownGarden`] if no garden has that name.
    pub fn delete_garden(&mut self, name: &str) -> Result<Garden, Error> {
        let index = self
            .gardens
            .iter()
            .position(|garden| garden.name == name)
            .ok_or_else(|| Error::UnknownGarden { name: name.to_string() })?;
        Ok(self.gardens.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
gardens:
  - identity: live
    name: prod
    kubeconfig: /kubeconfigs/live.yaml
    context: admin
    patterns:
      - "^namespace:(?P<namespace>[^/]+)$"
    accessRestrictions:
      - key: seed.gardener.cloud/eu-access
        notifyIf: true
        msg: Do not access this cluster from outside the EU
        options:
          - key: support.gardener.cloud/eu-access-for-cluster-nodes
            notifyIf: false
            msg: Do not touch the nodes
  - identity: stage
    kubeconfig: ~/.kube/stage.yaml
linkKubeconfig: false
"#;

    fn write_config(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join("gardenctl-v2.yaml");
        std::fs::write(&path, content).expect("write config");
        path
    }

    #[test]
    fn test_load() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config = Config::load(write_config(dir.path(), CONFIG)).expect("load config");

        assert_eq!(config.gardens.len(), 2);
        let live = &config.gardens[0];
        assert_eq!(live.name, "live");
        assert_eq!(live.alias.as_deref(), Some("prod"));
        assert_eq!(live.context.as_deref(), Some("admin"));
        assert_eq!(live.access_restrictions[0].options.len(), 1);
        assert!(!config.link_kubeconfig());
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config = Config::load(dir.path().join("absent.yaml")).expect("load config");
        assert_eq!(config, Config::default());
        assert!(config.link_kubeconfig());
    }

    #[test]
    fn test_load_rejects_malformed_yaml() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let err = Config::load(write_config(dir.path(), "gardens: {")).expect_err("parse error");
        assert!(matches!(err, Error::ParseConfig { .. }));
    }

    #[test]
    fn test_load_rejects_duplicate_alias() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let content = "gardens:\n  - identity: live\n    kubeconfig: a\n  - identity: stage\n    \
                       name: live\n    kubeconfig: b\n";
        let err = Config::load(write_config(dir.path(), content)).expect_err("duplicate");
        assert!(matches!(err, Error::DuplicateGarden { name } if name == "live"));
    }

    #[test]
    fn test_validate_rejects_invalid_name() {
        let config = Config {
            gardens: vec![Garden { name: "live garden".to_string(), ..Garden::default() }],
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidGardenName { .. })));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let original = Config::load(write_config(dir.path(), CONFIG)).expect("load config");

        let path = dir.path().join("nested").join("saved.yaml");
        original.save(&path).expect("save config");

        assert_eq!(Config::load(&path).expect("reload config"), original);
        let text = std::fs::read_to_string(&path).expect("read config");
        assert!(text.contains("identity: live"));
        assert!(text.contains("name: prod"));
    }

    #[test]
    fn test_save_keeps_log_file_path_as_written() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let content = format!("{CONFIG}log:\n  filePath: ~/logs/gardenctl.log\n");
        let path = write_config(dir.path(), &content);

        let config = Config::load(&path).expect("load config");
        let file_path = config.log.as_ref().and_then(|log| log.file_path.clone());
        assert_eq!(file_path, Some(PathBuf::from("~/logs/gardenctl.log")));

        config.save(&path).expect("save config");
        let text = std::fs::read_to_string(&path).expect("read config");
        assert!(text.contains("~/logs/gardenctl.log"));
        assert_eq!(Config::load(&path).expect("reload config"), config);
    }

    #[test]
    fn test_find_garden_by_name_then_alias() {
        let config = Config {
            gardens: vec![
                Garden {
                    name: "live".to_string(),
                    alias: Some("stage".to_string()),
                    ..Garden::default()
                },
                Garden { name: "stage".to_string(), ..Garden::default() },
            ],
            ..Config::default()
        };
        assert_eq!(config.find_garden("stage").expect("garden").name, "stage");

        let config = Config { gardens: vec![config.gardens[0].clone()], ..Config::default() };
        assert_eq!(config.find_garden("stage").expect("garden").name, "live");
        assert!(matches!(config.find_garden("dev"), Err(Error::UnknownGarden { .. })));
    }

    #[test]
    fn test_upsert_and_delete_garden() {
        let mut config = Config::default();
        config.upsert_garden(Garden { name: "live".to_string(), ..Garden::default() });
        config.upsert_garden(Garden {
            name: "live".to_string(),
            context: Some("admin".to_string()),
            ..Garden::default()
        });
        assert_eq!(config.gardens.len(), 1);
        assert_eq!(config.gardens[0].context.as_deref(), Some("admin"));

        let removed = config.delete_garden("live").expect("delete");
        assert_eq!(removed.name, "live");
        assert!(matches!(config.delete_garden("live"), Err(Error::UnknownGarden { .. })));
    }
}
