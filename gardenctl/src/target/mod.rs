//! The current target and everything needed to change it.
//!
//! A [`Target`] names at most one garden, one project or seed, one shoot and
//! whether the shoot's control plane is meant. [`TargetBuilder`] turns user
//! intent into a validated target by consulting the garden, [`TargetStore`]
//! persists it per session, and [`Manager`] ties both to the configuration
//! and to the clients and kubeconfigs derived from a target.

mod builder;
mod client_config;
mod error;
mod flags;
mod kubeconfig_cache;
mod manager;
mod store;

use std::{fmt, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use snafu::ensure;

pub use self::{
    builder::TargetBuilder,
    error::Error,
    flags::TargetFlags,
    kubeconfig_cache::KubeconfigCache,
    manager::{Manager, ResolveKind},
    store::TargetStore,
};
use crate::garden::ListFilter;

static DNS_LABEL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").expect("DNS label regex is valid")
});

const DNS_LABEL_MAX_LENGTH: usize = 63;
const DNS_SUBDOMAIN_MAX_LENGTH: usize = 253;

/// A level of the target hierarchy.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, clap::ValueEnum)]
pub enum TargetKind {
    Garden,
    Project,
    Seed,
    Shoot,
    ControlPlane,
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Garden => "garden",
            Self::Project => "project",
            Self::Seed => "seed",
            Self::Shoot => "shoot",
            Self::ControlPlane => "control-plane",
        })
    }
}

/// The (garden, project, seed, shoot, control plane) selection.
///
/// Values are immutable, the `with_*` methods return modified copies and do
/// not validate. Empty strings mean "not targeted".
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    garden: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    project: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    seed: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    shoot: String,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    control_plane: bool,
}

impl Target {
    #[must_use]
    pub fn new(
        garden: impl Into<String>,
        project: impl Into<String>,
        seed: impl Into<String>,
        shoot: impl Into<String>,
        control_plane: bool,
    ) -> Self {
        Self {
            garden: garden.into(),
            project: project.into(),
            seed: seed.into(),
            shoot: shoot.into(),
            control_plane,
        }
    }

    #[must_use]
    pub fn with_garden(self, garden: impl Into<String>) -> Self {
        Self { garden: garden.into(), ..self }
    }

    #[must_use]
    pub fn with_project(self, project: impl Into<String>) -> Self {
        Self { project: project.into(), ..self }
    }

    #[must_use]
    pub fn with_seed(self, seed: impl Into<String>) -> Self { Self { seed: seed.into(), ..self } }

    #[must_use]
    pub fn with_shoot(self, shoot: impl Into<String>) -> Self {
        Self { shoot: shoot.into(), ..self }
    }

    #[must_use]
    pub fn with_control_plane(self, control_plane: bool) -> Self { Self { control_plane, ..self } }

    #[must_use]
    pub fn garden_name(&self) -> &str { &self.garden }

    #[must_use]
    pub fn project_name(&self) -> &str { &self.project }

    #[must_use]
    pub fn seed_name(&self) -> &str { &self.seed }

    #[must_use]
    pub fn shoot_name(&self) -> &str { &self.shoot }

    #[must_use]
    pub const fn control_plane(&self) -> bool { self.control_plane }

    #[must_use]
    pub fn is_empty(&self) -> bool { *self == Self::default() }

    /// Returns the deepest targeted level.
    #[must_use]
    pub fn kind(&self) -> Option<TargetKind> {
        if self.control_plane {
            Some(TargetKind::ControlPlane)
        } else if !self.shoot.is_empty() {
            Some(TargetKind::Shoot)
        } else if !self.project.is_empty() {
            Some(TargetKind::Project)
        } else if !self.seed.is_empty() {
            Some(TargetKind::Seed)
        } else if !self.garden.is_empty() {
            Some(TargetKind::Garden)
        } else {
            None
        }
    }

    /// Checks the structural invariants of a target.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTarget`] describing the first violation.
    pub fn validate(&self) -> Result<(), Error> {
        ensure!(
            self.project.is_empty() || self.seed.is_empty(),
            error::InvalidTargetSnafu { reason: "project and seed are mutually exclusive" }
        );
        ensure!(
            !self.control_plane || !self.shoot.is_empty(),
            error::InvalidTargetSnafu { reason: "control plane requires a shoot" }
        );
        ensure!(
            !self.garden.is_empty()
                || (self.project.is_empty() && self.seed.is_empty() && self.shoot.is_empty()),
            error::InvalidTargetSnafu { reason: "project, seed and shoot require a garden" }
        );
        ensure!(
            self.garden.is_empty() || crate::config::is_valid_garden_name(&self.garden),
            error::InvalidTargetSnafu { reason: format!("invalid garden name '{}'", self.garden) }
        );
        ensure!(
            self.project.is_empty() || is_dns_subdomain(&self.project),
            error::InvalidTargetSnafu {
                reason: format!("invalid project name '{}'", self.project)
            }
        );
        ensure!(
            self.seed.is_empty() || is_dns_label(&self.seed),
            error::InvalidTargetSnafu { reason: format!("invalid seed name '{}'", self.seed) }
        );
        ensure!(
            self.shoot.is_empty() || is_dns_label(&self.shoot),
            error::InvalidTargetSnafu { reason: format!("invalid shoot name '{}'", self.shoot) }
        );
        Ok(())
    }

    /// Returns the shoot list filter this target selects.
    #[must_use]
    pub fn as_list_filter(&self) -> ListFilter {
        let mut filter = ListFilter::all();
        if !self.project.is_empty() {
            filter = filter.by_project(&self.project);
        }
        if !self.seed.is_empty() {
            filter = filter.by_seed(&self.seed);
        }
        if !self.shoot.is_empty() {
            filter = filter.by_name(&self.shoot);
        }
        filter
    }

    /// Returns the `gardenctl target` invocation recreating this target.
    #[must_use]
    pub fn to_command_line(&self) -> String {
        let mut line = format!("{} target", gardenctl_base::CLI_PROGRAM_NAME);
        for (flag, value) in [
            ("garden", &self.garden),
            ("project", &self.project),
            ("seed", &self.seed),
            ("shoot", &self.shoot),
        ] {
            if !value.is_empty() {
                line.push_str(&format!(" --{flag} {value}"));
            }
        }
        if self.control_plane {
            line.push_str(" --control-plane");
        }
        line
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts = [
            ("garden", &self.garden),
            ("project", &self.project),
            ("seed", &self.seed),
            ("shoot", &self.shoot),
        ]
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(kind, value)| format!("{kind}:{value:?}"))
        .collect::<Vec<_>>();

        if parts.is_empty() {
            return f.write_str("<empty>");
        }
        f.write_str(&parts.join(", "))?;
        if self.control_plane {
            f.write_str(", control plane targeted")?;
        }
        Ok(())
    }
}

fn is_dns_label(value: &str) -> bool {
    value.len() <= DNS_LABEL_MAX_LENGTH && DNS_LABEL_REGEX.is_match(value)
}

fn is_dns_subdomain(value: &str) -> bool {
    value.len() <= DNS_SUBDOMAIN_MAX_LENGTH && value.split('.').all(is_dns_label)
}
