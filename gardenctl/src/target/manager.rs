use std::{
    io::Write,
    path::{Path, PathBuf},
};

use gardenctl_base::{KUBECONFIG_LINK_NAME, TARGET_FILE_NAME, consts::gardener};
use kube::config::Kubeconfig;
use serde::Serialize;
use snafu::{OptionExt, ResultExt, ensure};

use super::{
    Error, KubeconfigCache, Target, TargetBuilder, TargetFlags, TargetKind, TargetStore,
    builder::find_shoot, client_config, error,
};
use crate::{
    config::{AccessRestriction, AccessRestrictionMessages, Config, Garden},
    garden::{ClientProvider, GardenClient, Shoot},
    kubeconfig,
};

/// Levels `resolve` can describe.
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ResolveKind {
    Garden,
    Project,
    Seed,
    Shoot,
}

/// What the current target refers to, as printed by `resolve`.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedTarget {
    pub garden: ResolvedGarden,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<ResolvedProject>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<ResolvedSeed>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub shoot: Option<ResolvedShoot>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct ResolvedGarden {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct ResolvedProject {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct ResolvedSeed {
    pub name: String,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedShoot {
    pub name: String,
    pub namespace: String,

    /// Rendered access restriction notice, if any applies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_restriction: Option<String>,
}

/// Entry point of every command that reads or changes the target.
///
/// Owns the configuration, the session's target store and kubeconfig cache,
/// and the provider used to reach garden clusters.
pub struct Manager<P> {
    config: Config,
    flags: TargetFlags,
    provider: P,
    session_dir: PathBuf,
    store: TargetStore,
    cache: KubeconfigCache,
    history_file: Option<PathBuf>,
    link_kubeconfig: bool,
}

impl<P> Manager<P>
where
    P: ClientProvider,
{
    pub fn new(config: Config, provider: P, session_dir: impl Into<PathBuf>) -> Self {
        let session_dir = session_dir.into();
        let link_kubeconfig = config.link_kubeconfig();
        Self {
            config,
            flags: TargetFlags::default(),
            provider,
            store: TargetStore::new(session_dir.join(TARGET_FILE_NAME)),
            cache: KubeconfigCache::new(&session_dir),
            session_dir,
            history_file: None,
            link_kubeconfig,
        }
    }

    /// Applies `flags` on top of the stored target for this invocation.
    #[must_use]
    pub fn with_flags(mut self, flags: TargetFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Records every target change in `path`.
    #[must_use]
    pub fn with_history_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.history_file = Some(path.into());
        self
    }

    #[must_use]
    pub const fn with_link_kubeconfig(mut self, link_kubeconfig: bool) -> Self {
        self.link_kubeconfig = link_kubeconfig;
        self
    }

    #[allow(dead_code)]
    #[must_use]
    pub const fn config(&self) -> &Config { &self.config }

    #[must_use]
    pub const fn flags(&self) -> &TargetFlags { &self.flags }

    #[allow(dead_code)]
    #[must_use]
    pub fn session_dir(&self) -> &Path { &self.session_dir }

    /// Path of the link following the kubeconfig of the current target.
    #[must_use]
    pub fn kubeconfig_link(&self) -> PathBuf { self.session_dir.join(KUBECONFIG_LINK_NAME) }

    /// Returns the stored target with the target flags applied.
    ///
    /// Flags naming a garden describe the whole target and the store is not
    /// read.
    ///
    /// # Errors
    ///
    /// Fails if the store cannot be read or the flags are invalid.
    pub fn current_target(&self) -> Result<Target, Error> {
        if self.flags.is_target_valid() {
            return self.flags.to_target();
        }
        self.flags.apply(self.store.read()?)
    }

    /// Like [`Manager::current_target`] but without `--control-plane`.
    ///
    /// The control plane needs a shoot first, so operations that honour the
    /// flag enqueue it as their last action.
    fn base_target(&self) -> Result<Target, Error> {
        let flags = TargetFlags { control_plane: false, ..self.flags.clone() };
        if flags.is_target_valid() {
            return flags.to_target();
        }
        flags.apply(self.store.read()?)
    }

    fn builder(&self) -> Result<TargetBuilder<'_, P>, Error> {
        Ok(TargetBuilder::new(&self.config, &self.provider).init(self.base_target()?))
    }

    pub async fn target_garden(&self, name: &str) -> Result<Target, Error> {
        let target = self.builder()?.set_garden(name).build().await?;
        self.update_target(target).await
    }

    pub async fn target_project(&self, name: &str) -> Result<Target, Error> {
        let target = self.builder()?.set_project(name).build().await?;
        self.update_target(target).await
    }

    pub async fn target_seed(&self, name: &str) -> Result<Target, Error> {
        let target = self.builder()?.set_seed(name).build().await?;
        self.update_target(target).await
    }

    /// Targets shoot `name`, and its control plane if `--control-plane` is
    /// given.
    ///
    /// # Errors
    ///
    /// Fails if the shoot cannot be resolved unambiguously or the target
    /// cannot be written.
    pub async fn target_shoot(&self, name: &str) -> Result<Target, Error> {
        let mut builder = self.builder()?.set_shoot(name);
        if self.flags.control_plane {
            builder = builder.set_control_plane();
        }
        let target = builder.build().await?;
        self.update_target(target).await
    }

    pub async fn target_control_plane(&self) -> Result<Target, Error> {
        let target = self.builder()?.set_control_plane().build().await?;
        self.update_target(target).await
    }

    /// Targets exactly what the target flags describe, verifying every level
    /// against the garden.
    ///
    /// # Errors
    ///
    /// Fails like the individual `target_*` operations.
    pub async fn target_flags(&self) -> Result<Target, Error> {
        let flags = &self.flags;
        let mut builder = self.builder()?;
        if let Some(garden) = &flags.garden {
            builder = builder.set_garden(garden);
        }
        if let Some(project) = &flags.project {
            builder = builder.set_project(project);
        }
        if let Some(seed) = &flags.seed {
            builder = builder.set_seed(seed);
        }
        if let Some(shoot) = &flags.shoot {
            builder = builder.set_shoot(shoot);
        }
        if flags.control_plane {
            builder = builder.set_control_plane();
        }
        let target = builder.build().await?;
        self.update_target(target).await
    }

    /// Targets whatever the configured patterns extract from `value`.
    ///
    /// # Errors
    ///
    /// Fails if no pattern or several gardens match, or if the captured
    /// values cannot be targeted.
    pub async fn target_match_pattern(&self, value: &str) -> Result<Target, Error> {
        let current = self.base_target()?;
        let garden = Some(current.garden_name()).filter(|garden| !garden.is_empty());
        let found = self.config.match_pattern(value, garden)?;
        tracing::debug!("Value '{value}' matched {found:?}");

        let mut builder = self.builder()?.set_garden(&found.garden);
        builder = match (found.project, found.namespace) {
            (Some(project), Some(namespace)) => builder.set_project_of_namespace(project, namespace),
            (Some(project), None) => builder.set_project(project),
            (None, Some(namespace)) => builder.set_namespace(namespace),
            (None, None) => builder,
        };
        if let Some(shoot) = found.shoot {
            builder = builder.set_shoot(shoot);
        }
        if self.flags.control_plane {
            builder = builder.set_control_plane();
        }
        let target = builder.build().await?;
        self.update_target(target).await
    }

    /// Clears the whole target and returns the garden that was targeted.
    pub async fn unset_garden(&self) -> Result<String, Error> {
        let current = self.current_target()?;
        ensure!(!current.garden_name().is_empty(), error::NoGardenTargetedSnafu);
        let _target = self.update_target(Target::default()).await?;
        Ok(current.garden_name().to_string())
    }

    /// Clears the project with its shoot and returns the project that was
    /// targeted.
    pub async fn unset_project(&self) -> Result<String, Error> {
        let current = self.current_target()?;
        ensure!(!current.project_name().is_empty(), error::NoProjectTargetedSnafu);
        let name = current.project_name().to_string();
        let _target = self
            .update_target(current.with_project("").with_shoot("").with_control_plane(false))
            .await?;
        Ok(name)
    }

    /// Clears the seed with its shoot and returns the seed that was
    /// targeted.
    pub async fn unset_seed(&self) -> Result<String, Error> {
        let current = self.current_target()?;
        ensure!(!current.seed_name().is_empty(), error::NoSeedTargetedSnafu);
        let name = current.seed_name().to_string();
        let _target = self
            .update_target(current.with_seed("").with_shoot("").with_control_plane(false))
            .await?;
        Ok(name)
    }

    pub async fn unset_shoot(&self) -> Result<String, Error> {
        let current = self.current_target()?;
        ensure!(!current.shoot_name().is_empty(), error::NoShootTargetedSnafu);
        let name = current.shoot_name().to_string();
        let _target = self.update_target(current.with_shoot("").with_control_plane(false)).await?;
        Ok(name)
    }

    /// Leaves the control plane and returns the name of its shoot.
    pub async fn unset_control_plane(&self) -> Result<String, Error> {
        let current = self.current_target()?;
        ensure!(current.control_plane(), error::NoControlPlaneTargetedSnafu);
        let name = current.shoot_name().to_string();
        let _target = self.update_target(current.with_control_plane(false)).await?;
        Ok(name)
    }

    /// Persists `target` and brings history and kubeconfig link up to date.
    ///
    /// Only the target write can fail the operation.
    async fn update_target(&self, target: Target) -> Result<Target, Error> {
        self.store.write(&target)?;

        if let Err(err) = self.append_history(&target) {
            tracing::warn!("{err}");
        }
        if self.link_kubeconfig
            && let Err(err) = self.update_kubeconfig_link(&target).await
        {
            tracing::warn!("{err}");
        }
        Ok(target)
    }

    fn append_history(&self, target: &Target) -> Result<(), Error> {
        let Some(path) = self.history_file.as_deref() else { return Ok(()) };
        if target.is_empty() {
            return Ok(());
        }
        if let Some(dir) = path.parent() {
            gardenctl_base::utils::create_private_dir_all(dir)
                .with_context(|_| error::WriteHistorySnafu { path })?;
        }
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|_| error::WriteHistorySnafu { path })?;
        writeln!(file, "{}", target.to_command_line())
            .with_context(|_| error::WriteHistorySnafu { path })
    }

    /// Returns the recorded target history, oldest first.
    ///
    /// # Errors
    ///
    /// Fails if the history file exists but cannot be read.
    pub fn history(&self) -> Result<String, Error> {
        let Some(path) = self.history_file.as_deref() else { return Ok(String::new()) };
        match std::fs::read_to_string(path) {
            Ok(history) => Ok(history),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(source) => Err(Error::ReadHistory { path: path.to_path_buf(), source }),
        }
    }

    /// Points the session's `kubeconfig.yaml` at the kubeconfig of `target`,
    /// or removes it if no garden is targeted.
    async fn update_kubeconfig_link(&self, target: &Target) -> Result<(), Error> {
        let link = self.kubeconfig_link();
        match std::fs::symlink_metadata(&link) {
            Ok(_) => std::fs::remove_file(&link)
                .with_context(|_| error::LinkKubeconfigSnafu { path: link.clone() })?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => return Err(Error::LinkKubeconfig { path: link, source }),
        }
        if target.garden_name().is_empty() {
            return Ok(());
        }

        let kubeconfig = self.write_client_config(target).await?;
        #[cfg(unix)]
        let linked = std::os::unix::fs::symlink(&kubeconfig, &link);
        #[cfg(not(unix))]
        let linked = std::fs::copy(&kubeconfig, &link).map(|_| ());
        linked.with_context(|_| error::LinkKubeconfigSnafu { path: link.clone() })?;

        tracing::info!("Linked {} to {}", link.display(), kubeconfig.display());
        Ok(())
    }

    /// Creates a client for the garden named `name`.
    ///
    /// # Errors
    ///
    /// Fails if the garden is unknown or its kubeconfig is unusable.
    #[allow(dead_code)]
    pub async fn garden_client(&self, name: &str) -> Result<P::GardenClient, Error> {
        let garden = self.config.find_garden(name)?;
        Ok(self.provider.garden_client(garden).await?)
    }

    /// Returns the kubeconfig of the deepest level of `target`.
    ///
    /// Kubeconfigs are cached per target in the session directory, so only
    /// the first call for a target talks to the garden. The garden level is
    /// always read from the configured file.
    ///
    /// # Errors
    ///
    /// Fails if the target is empty, any lookup fails or the cache cannot be
    /// written.
    pub async fn client_config(&self, target: &Target) -> Result<Kubeconfig, Error> {
        ensure!(!target.is_empty(), error::NoTargetSetSnafu);
        let garden = self.config.find_garden(target.garden_name())?;

        if target.kind() == Some(TargetKind::Garden) {
            let kubeconfig = kubeconfig::load_garden_kubeconfig(garden)?;
            let _path = self.cache.write(target, &kubeconfig)?;
            return Ok(kubeconfig);
        }

        if let Some(kubeconfig) = self.cache.read(target)? {
            return Ok(kubeconfig);
        }

        let client = self.provider.garden_client(garden).await?;
        let kubeconfig = client_config::target_kubeconfig(&client, garden, target).await?;
        let _path = self.cache.write(target, &kubeconfig)?;
        Ok(kubeconfig)
    }

    /// Makes sure the kubeconfig of `target` is cached and returns its path.
    ///
    /// # Errors
    ///
    /// See [`Manager::client_config`].
    pub async fn write_client_config(&self, target: &Target) -> Result<PathBuf, Error> {
        let _kubeconfig = self.client_config(target).await?;
        Ok(self.cache.path(target))
    }

    /// Creates a client for the seed of `target`.
    ///
    /// # Errors
    ///
    /// Fails if no seed is targeted or its kubeconfig cannot be assembled.
    pub async fn seed_client(&self, target: &Target) -> Result<kube::Client, Error> {
        ensure!(!target.garden_name().is_empty(), error::NoGardenTargetedSnafu);
        ensure!(!target.seed_name().is_empty(), error::NoSeedTargetedSnafu);
        let seed_target = Target::new(target.garden_name(), "", target.seed_name(), "", false);
        let kubeconfig = self.client_config(&seed_target).await?;
        Ok(self.provider.client(&kubeconfig).await?)
    }

    /// Creates a client for the shoot of `target`, or for its control plane.
    ///
    /// # Errors
    ///
    /// Fails if no shoot is targeted or its kubeconfig cannot be assembled.
    pub async fn shoot_client(&self, target: &Target) -> Result<kube::Client, Error> {
        ensure!(!target.garden_name().is_empty(), error::NoGardenTargetedSnafu);
        ensure!(!target.shoot_name().is_empty(), error::NoShootTargetedSnafu);
        let kubeconfig = self.client_config(target).await?;
        Ok(self.provider.client(&kubeconfig).await?)
    }

    /// Creates a client for the cluster at the deepest level of `target`.
    ///
    /// Garden and project targets talk to the garden cluster, the others to
    /// their seed, shoot or control plane.
    ///
    /// # Errors
    ///
    /// Fails if the target is empty or its kubeconfig cannot be assembled.
    pub async fn cluster_client(&self, target: &Target) -> Result<kube::Client, Error> {
        match target.kind() {
            Some(TargetKind::Seed) => self.seed_client(target).await,
            Some(TargetKind::Shoot | TargetKind::ControlPlane) => self.shoot_client(target).await,
            Some(TargetKind::Garden | TargetKind::Project) => {
                let kubeconfig = self.client_config(target).await?;
                Ok(self.provider.client(&kubeconfig).await?)
            }
            None => error::NoTargetSetSnafu.fail(),
        }
    }

    /// Evaluates the access restrictions of the garden against the shoot of
    /// `target`.
    ///
    /// # Errors
    ///
    /// Fails if no shoot is targeted or it cannot be found.
    pub async fn access_restrictions(
        &self,
        target: &Target,
    ) -> Result<AccessRestrictionMessages, Error> {
        ensure!(!target.shoot_name().is_empty(), error::NoShootTargetedSnafu);
        let garden = self.config.find_garden(target.garden_name())?;
        if garden.access_restrictions.is_empty() {
            return Ok(AccessRestrictionMessages::default());
        }
        let client = self.provider.garden_client(garden).await?;
        let shoot = find_shoot(&client, target, target.shoot_name()).await?;
        Ok(AccessRestriction::check_all(&garden.access_restrictions, &shoot))
    }

    /// Describes the `kind` level of the current target.
    ///
    /// Shoot based answers follow the shoot: its seed, its project and, for
    /// a targeted control plane, the shoot hosting that control plane.
    ///
    /// # Errors
    ///
    /// Fails if the level cannot be derived from the current target.
    pub async fn resolve(&self, kind: ResolveKind) -> Result<ResolvedTarget, Error> {
        let target = self.current_target()?;
        ensure!(!target.garden_name().is_empty(), error::NoGardenTargetedSnafu);
        let garden = self.config.find_garden(target.garden_name())?;

        let mut resolved = ResolvedTarget {
            garden: ResolvedGarden { name: garden.name.clone(), alias: garden.alias.clone() },
            ..ResolvedTarget::default()
        };
        if kind == ResolveKind::Garden {
            return Ok(resolved);
        }

        let client = self.provider.garden_client(garden).await?;

        if kind == ResolveKind::Project && !target.project_name().is_empty() {
            let name = target.project_name();
            let project = client
                .get_project(name)
                .await?
                .with_context(|| error::UnknownProjectSnafu { garden: &garden.name, name })?;
            resolved.project = Some(ResolvedProject {
                name: project.name().to_string(),
                namespace: project.namespace().map(str::to_string),
            });
            return Ok(resolved);
        }

        if kind == ResolveKind::Seed && !target.seed_name().is_empty() {
            let name = target.seed_name();
            let seed = client
                .get_seed(name)
                .await?
                .with_context(|| error::UnknownSeedSnafu { garden: &garden.name, name })?;
            resolved.seed = Some(ResolvedSeed { name: seed.name().to_string() });
            return Ok(resolved);
        }

        let shoot = self.resolve_shoot(&client, garden, &target, kind).await?;
        let seed = shoot.seed_name().context(error::ShootNotScheduledSnafu { name: shoot.name() })?;
        if kind == ResolveKind::Seed {
            resolved.seed = Some(ResolvedSeed { name: seed.to_string() });
            return Ok(resolved);
        }

        let shoot = if target.control_plane() {
            hosting_shoot(&client, garden, seed).await?
        } else {
            shoot
        };
        let seed = shoot.seed_name().context(error::ShootNotScheduledSnafu { name: shoot.name() })?;

        let project = client
            .get_project_by_namespace(shoot.namespace())
            .await?
            .context(error::NamespaceNotAProjectSnafu { name: shoot.namespace() })?;
        resolved.project = Some(ResolvedProject {
            name: project.name().to_string(),
            namespace: project.namespace().map(str::to_string),
        });
        if kind == ResolveKind::Project {
            return Ok(resolved);
        }

        let messages = AccessRestriction::check_all(&garden.access_restrictions, &shoot);
        resolved.seed = Some(ResolvedSeed { name: seed.to_string() });
        resolved.shoot = Some(ResolvedShoot {
            name: shoot.name().to_string(),
            namespace: shoot.namespace().to_string(),
            access_restriction: (!messages.is_empty()).then(|| messages.to_string()),
        });
        Ok(resolved)
    }

    /// The shoot `resolve` reports on: the targeted shoot, or the shoot
    /// backing a targeted managed seed.
    async fn resolve_shoot(
        &self,
        client: &P::GardenClient,
        garden: &Garden,
        target: &Target,
        kind: ResolveKind,
    ) -> Result<Shoot, Error> {
        if !target.shoot_name().is_empty() {
            return find_shoot(client, target, target.shoot_name()).await;
        }
        if !target.seed_name().is_empty() {
            return hosting_shoot(client, garden, target.seed_name()).await;
        }
        match kind {
            ResolveKind::Project => error::NoProjectTargetedSnafu.fail(),
            ResolveKind::Seed => error::NoSeedTargetedSnafu.fail(),
            ResolveKind::Garden | ResolveKind::Shoot => error::NoShootTargetedSnafu.fail(),
        }
    }
}

/// The shoot in the `garden` project that backs managed seed `seed`.
async fn hosting_shoot<C>(client: &C, garden: &Garden, seed: &str) -> Result<Shoot, Error>
where
    C: GardenClient,
{
    let shoot_ref = client
        .get_shoot_of_managed_seed(seed)
        .await?
        .context(error::SeedNotManagedSnafu { name: seed })?;
    let target = Target::new(&garden.name, gardener::GARDEN_PROJECT, "", &shoot_ref.name, false);
    find_shoot(client, &target, &shoot_ref.name).await
}
