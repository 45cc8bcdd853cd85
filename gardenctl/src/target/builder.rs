use gardenctl_base::consts::gardener;
use snafu::{OptionExt, ensure};

use super::{Error, Target, error};
use crate::{
    config::Config,
    garden::{self, ClientProvider, GardenClient, Shoot},
};

/// A deferred, validating step of a [`TargetBuilder`].
#[derive(Clone, Debug, Eq, PartialEq)]
enum Action {
    Garden(String),
    Project(String),
    Namespace(String),
    /// A pattern captured both; they must name the same project.
    ProjectOfNamespace { project: String, namespace: String },
    Seed(String),
    Shoot(String),
    ControlPlane,
}

/// Turns user intent into a validated [`Target`].
///
/// Setters only enqueue actions. [`TargetBuilder::build`] runs them in order
/// against a draft of the initial target, consulting the garden cluster, and
/// stops at the first failure.
pub struct TargetBuilder<'a, P> {
    config: &'a Config,
    provider: &'a P,
    initial: Target,
    actions: Vec<Action>,
}

impl<'a, P> TargetBuilder<'a, P>
where
    P: ClientProvider,
{
    pub fn new(config: &'a Config, provider: &'a P) -> Self {
        Self { config, provider, initial: Target::default(), actions: Vec::new() }
    }

    /// Starts from `target` instead of the empty target.
    #[must_use]
    pub fn init(mut self, target: Target) -> Self {
        self.initial = target;
        self
    }

    #[must_use]
    pub fn set_garden(self, name_or_alias: impl Into<String>) -> Self {
        self.push(Action::Garden(name_or_alias.into()))
    }

    #[must_use]
    pub fn set_project(self, name: impl Into<String>) -> Self {
        self.push(Action::Project(name.into()))
    }

    /// Targets the project owning namespace `name`.
    #[must_use]
    pub fn set_namespace(self, name: impl Into<String>) -> Self {
        self.push(Action::Namespace(name.into()))
    }

    /// Targets `project` after checking that `namespace` belongs to it.
    #[must_use]
    pub fn set_project_of_namespace(
        self,
        project: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        self.push(Action::ProjectOfNamespace { project: project.into(), namespace: namespace.into() })
    }

    #[must_use]
    pub fn set_seed(self, name: impl Into<String>) -> Self { self.push(Action::Seed(name.into())) }

    #[must_use]
    pub fn set_shoot(self, name: impl Into<String>) -> Self {
        self.push(Action::Shoot(name.into()))
    }

    /// Targets the control plane of the shoot targeted at that point.
    #[must_use]
    pub fn set_control_plane(self) -> Self { self.push(Action::ControlPlane) }

    fn push(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Runs the queued actions and returns the resulting target.
    ///
    /// # Errors
    ///
    /// Returns the error of the first failing action, or
    /// [`Error::InvalidTarget`] if the result violates an invariant.
    pub async fn build(self) -> Result<Target, Error> {
        let Self { config, provider, initial, actions } = self;
        let mut context = BuildContext { config, provider, client: None };
        let mut draft = initial;

        for action in actions {
            tracing::debug!("Applying {action:?} to target {draft}");
            draft = match action {
                Action::Garden(name) => {
                    let garden = config.find_garden(&name)?;
                    Target::default().with_garden(&garden.name)
                }
                Action::Project(name) => context.set_project(draft, &name).await?,
                Action::Namespace(namespace) => {
                    let project = context.project_of_namespace(&draft, &namespace).await?;
                    context.set_project(draft, &project).await?
                }
                Action::ProjectOfNamespace { project, namespace } => {
                    let namespace_project = context.project_of_namespace(&draft, &namespace).await?;
                    ensure!(
                        namespace_project == project,
                        error::ConflictingPatternSnafu { project, namespace, namespace_project }
                    );
                    context.set_project(draft, &project).await?
                }
                Action::Seed(name) => context.set_seed(draft, &name).await?,
                Action::Shoot(name) => context.set_shoot(draft, &name).await?,
                Action::ControlPlane => {
                    ensure!(!draft.garden_name().is_empty(), error::NoGardenTargetedSnafu);
                    ensure!(!draft.shoot_name().is_empty(), error::NoShootTargetedSnafu);
                    let shoot = draft.shoot_name().to_string();
                    context.set_shoot(draft, &shoot).await?.with_control_plane(true)
                }
            };
        }

        draft.validate()?;
        Ok(draft)
    }
}

/// State shared by the actions of one build.
struct BuildContext<'a, P>
where
    P: ClientProvider,
{
    config: &'a Config,
    provider: &'a P,
    client: Option<P::GardenClient>,
}

impl<P> BuildContext<'_, P>
where
    P: ClientProvider,
{
    /// Returns a client for the garden of `target`, reusing the previous one
    /// if the garden did not change.
    async fn client(&mut self, target: &Target) -> Result<&P::GardenClient, Error> {
        let garden = target.garden_name();
        ensure!(!garden.is_empty(), error::NoGardenTargetedSnafu);

        let client = match self.client.take() {
            Some(client) if client.name() == garden => client,
            _ => self.provider.garden_client(self.config.find_garden(garden)?).await?,
        };
        Ok(self.client.insert(client))
    }

    async fn set_project(&mut self, draft: Target, name: &str) -> Result<Target, Error> {
        let client = self.client(&draft).await?;
        let project = client.get_project(name).await?.with_context(|| {
            error::UnknownProjectSnafu { garden: draft.garden_name(), name }
        })?;
        ensure!(project.namespace().is_some(), error::ProjectNotReadySnafu { name });

        Ok(draft.with_project(name).with_seed("").with_shoot("").with_control_plane(false))
    }

    async fn project_of_namespace(&mut self, draft: &Target, name: &str) -> Result<String, Error> {
        let client = self.client(draft).await?;
        let namespace = client.get_namespace(name).await?.with_context(|| {
            error::UnknownNamespaceSnafu { garden: draft.garden_name(), name }
        })?;
        namespace
            .metadata
            .labels
            .as_ref()
            .and_then(|labels| labels.get(gardener::labels::PROJECT_NAME))
            .filter(|project| !project.is_empty())
            .cloned()
            .context(error::NamespaceNotAProjectSnafu { name })
    }

    async fn set_seed(&mut self, draft: Target, name: &str) -> Result<Target, Error> {
        let client = self.client(&draft).await?;
        let _seed = client
            .get_seed(name)
            .await?
            .with_context(|| error::UnknownSeedSnafu { garden: draft.garden_name(), name })?;

        Ok(draft.with_seed(name).with_project("").with_shoot("").with_control_plane(false))
    }

    async fn set_shoot(&mut self, draft: Target, name: &str) -> Result<Target, Error> {
        let shoot = self.find_shoot(&draft, name).await?;

        let project = if draft.project_name().is_empty() {
            let client = self.client(&draft).await?;
            client
                .get_project_by_namespace(shoot.namespace())
                .await?
                .map(|project| project.name().to_string())
                .context(error::NamespaceNotAProjectSnafu { name: shoot.namespace() })?
        } else {
            draft.project_name().to_string()
        };

        Ok(draft
            .with_project(project)
            .with_seed("")
            .with_shoot(shoot.name())
            .with_control_plane(false))
    }

    async fn find_shoot(&mut self, draft: &Target, name: &str) -> Result<Shoot, Error> {
        let client = self.client(draft).await?;
        find_shoot(client, draft, name).await
    }
}

/// Finds shoot `name` within the scope of `target`.
///
/// A targeted project identifies the shoot directly. Otherwise shoots are
/// listed on the targeted seed or across the garden and must match exactly
/// once.
pub(super) async fn find_shoot<C>(client: &C, target: &Target, name: &str) -> Result<Shoot, Error>
where
    C: GardenClient,
{
    if target.project_name().is_empty() {
        let filter = target.clone().with_shoot(name).as_list_filter();
        return Ok(client.find_shoot(&filter).await?);
    }

    let project = client.get_project(target.project_name()).await?.with_context(|| {
        error::UnknownProjectSnafu { garden: target.garden_name(), name: target.project_name() }
    })?;
    let namespace =
        project.namespace().context(error::ProjectNotReadySnafu { name: target.project_name() })?;
    client
        .get_shoot(namespace, name)
        .await?
        .ok_or_else(|| garden::Error::UnknownShoot { name: name.to_string() }.into())
}
