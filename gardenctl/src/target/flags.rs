use clap::Args;
use snafu::ensure;

use super::{Error, Target, error};

/// Per-invocation target overrides shared by every command.
#[derive(Args, Clone, Debug, Default, Eq, PartialEq)]
pub struct TargetFlags {
    #[clap(long = "garden", global = true, help = "Target the given garden cluster")]
    pub garden: Option<String>,

    #[clap(long = "project", global = true, help = "Target the given project")]
    pub project: Option<String>,

    #[clap(long = "seed", global = true, help = "Target the given seed cluster")]
    pub seed: Option<String>,

    #[clap(long = "shoot", global = true, help = "Target the given shoot cluster")]
    pub shoot: Option<String>,

    #[clap(
        long = "control-plane",
        global = true,
        help = "Target the control plane of the shoot"
    )]
    pub control_plane: bool,
}

impl TargetFlags {
    /// Returns whether no flag was given.
    #[must_use]
    pub fn is_empty(&self) -> bool { *self == Self::default() }

    /// Returns whether the flags name a garden, making the stored target
    /// irrelevant.
    #[must_use]
    pub fn is_target_valid(&self) -> bool {
        self.garden.as_deref().is_some_and(|garden| !garden.is_empty())
    }

    /// Merges the flags onto `target`.
    ///
    /// Every flag clears the levels below it, so `--garden other` on top of a
    /// targeted shoot leaves only the garden.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConflictingFlags`] if both `--project` and `--seed`
    /// are given, or [`Error::InvalidTarget`] if the result is invalid.
    pub fn apply(&self, target: Target) -> Result<Target, Error> {
        ensure!(self.project.is_none() || self.seed.is_none(), error::ConflictingFlagsSnafu);

        let mut target = target;
        if let Some(garden) = &self.garden {
            target = target
                .with_garden(garden)
                .with_project("")
                .with_seed("")
                .with_shoot("")
                .with_control_plane(false);
        }
        if let Some(project) = &self.project {
            target =
                target.with_project(project).with_seed("").with_shoot("").with_control_plane(false);
        }
        if let Some(seed) = &self.seed {
            target =
                target.with_seed(seed).with_project("").with_shoot("").with_control_plane(false);
        }
        if let Some(shoot) = &self.shoot {
            target = target.with_shoot(shoot);
        }
        if self.control_plane {
            target = target.with_control_plane(true);
        }

        target.validate()?;
        Ok(target)
    }

    /// Returns the target described by the flags alone.
    ///
    /// # Errors
    ///
    /// See [`TargetFlags::apply`].
    pub fn to_target(&self) -> Result<Target, Error> { self.apply(Target::default()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(garden: Option<&str>, project: Option<&str>, seed: Option<&str>) -> TargetFlags {
        TargetFlags {
            garden: garden.map(str::to_string),
            project: project.map(str::to_string),
            seed: seed.map(str::to_string),
            ..TargetFlags::default()
        }
    }

    #[test]
    fn test_garden_flag_moves_up() {
        let current = Target::new("live", "team-a", "", "web", true);
        let target = flags(Some("stage"), None, None).apply(current).expect("apply flags");
        assert_eq!(target, Target::new("stage", "", "", "", false));
    }

    #[test]
    fn test_project_flag_replaces_seed() {
        let current = Target::new("live", "", "aws", "web", false);
        let target = flags(None, Some("team-a"), None).apply(current).expect("apply flags");
        assert_eq!(target, Target::new("live", "team-a", "", "", false));
    }

    #[test]
    fn test_seed_flag_replaces_project() {
        let current = Target::new("live", "team-a", "", "web", true);
        let target = flags(None, None, Some("aws")).apply(current).expect("apply flags");
        assert_eq!(target, Target::new("live", "", "aws", "", false));
    }

    #[test]
    fn test_shoot_flag_keeps_project() {
        let current = Target::new("live", "team-a", "", "web", false);
        let flags = TargetFlags {
            shoot: Some("api".to_string()),
            control_plane: true,
            ..TargetFlags::default()
        };
        let target = flags.apply(current).expect("apply flags");
        assert_eq!(target, Target::new("live", "team-a", "", "api", true));
    }

    #[test]
    fn test_conflicting_flags() {
        let err = flags(Some("live"), Some("team-a"), Some("aws"))
            .apply(Target::default())
            .expect_err("project and seed conflict");
        assert!(matches!(err, Error::ConflictingFlags));
    }

    #[test]
    fn test_invalid_result() {
        let flags = TargetFlags { control_plane: true, ..TargetFlags::default() };
        assert!(matches!(flags.to_target(), Err(Error::InvalidTarget { .. })));
    }

    #[test]
    fn test_is_target_valid() {
        assert!(!TargetFlags::default().is_target_valid());
        assert!(!flags(None, Some("team-a"), None).is_target_valid());
        assert!(flags(Some("live"), None, None).is_target_valid());
    }
}
