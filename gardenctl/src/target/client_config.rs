//! Kubeconfigs for the roles a target can address.

use gardenctl_base::consts::gardener;
use kube::config::Kubeconfig;
use snafu::OptionExt;

use super::{Error, Target, builder::find_shoot, error};
use crate::{
    config::Garden,
    ext::KubeconfigExt,
    garden::{self, GardenClient, Shoot},
    kubeconfig,
};

/// Assembles the kubeconfig of the deepest level of `target`.
///
/// Only the garden level is served without `client`; callers resolve it
/// through [`kubeconfig::load_garden_kubeconfig`] directly.
pub(super) async fn target_kubeconfig<C>(
    client: &C,
    garden: &Garden,
    target: &Target,
) -> Result<Kubeconfig, Error>
where
    C: GardenClient,
{
    if !target.shoot_name().is_empty() {
        let shoot = find_shoot(client, target, target.shoot_name()).await?;
        if target.control_plane() {
            return control_plane_kubeconfig(client, garden, &shoot).await;
        }
        return shoot_kubeconfig(client, garden, &shoot).await;
    }
    if !target.seed_name().is_empty() {
        return seed_kubeconfig(client, garden, target.seed_name()).await;
    }
    if !target.project_name().is_empty() {
        return project_kubeconfig(client, garden, target).await;
    }
    Ok(kubeconfig::load_garden_kubeconfig(garden)?)
}

/// The garden kubeconfig with every context pointed at the project namespace.
async fn project_kubeconfig<C>(
    client: &C,
    garden: &Garden,
    target: &Target,
) -> Result<Kubeconfig, Error>
where
    C: GardenClient,
{
    let name = target.project_name();
    let project = client
        .get_project(name)
        .await?
        .with_context(|| error::UnknownProjectSnafu { garden: &garden.name, name })?;
    let namespace = project.namespace().context(error::ProjectNotReadySnafu { name })?;
    Ok(kubeconfig::load_garden_kubeconfig(garden)?.with_namespace(namespace)?)
}

/// The kubeconfig of seed `name`.
///
/// A managed seed is reached through the shoot backing it. Other seeds
/// publish a kubeconfig in a `.oidc` or `.login` secret in the garden
/// namespace, with the seed's own secret reference as the last resort.
pub(super) async fn seed_kubeconfig<C>(
    client: &C,
    garden: &Garden,
    name: &str,
) -> Result<Kubeconfig, Error>
where
    C: GardenClient,
{
    if let Some(shoot_ref) = client.get_shoot_of_managed_seed(name).await? {
        tracing::debug!("Using shoot {} backing managed seed {name}", shoot_ref.name);
        let shoot = client
            .get_shoot(gardener::GARDEN_NAMESPACE, &shoot_ref.name)
            .await?
            .ok_or_else(|| garden::Error::UnknownShoot { name: shoot_ref.name.clone() })?;
        return shoot_kubeconfig(client, garden, &shoot).await;
    }

    let seed = client
        .get_seed(name)
        .await?
        .with_context(|| error::UnknownSeedSnafu { garden: &garden.name, name })?;

    let mut candidates = [gardener::SEED_SECRET_OIDC_SUFFIX, gardener::SEED_SECRET_LOGIN_SUFFIX]
        .iter()
        .map(|suffix| (gardener::GARDEN_NAMESPACE.to_string(), format!("{name}{suffix}")))
        .collect::<Vec<_>>();
    if let Some(secret_ref) = seed.spec.secret_ref.as_ref().filter(|secret| !secret.name.is_empty())
    {
        candidates.push((secret_ref.namespace.clone(), secret_ref.name.clone()));
    }

    for (namespace, secret_name) in &candidates {
        if let Some(secret) = client.get_secret(namespace, secret_name).await? {
            tracing::debug!("Using kubeconfig of seed {name} from secret {namespace}/{secret_name}");
            let data = kubeconfig::secret_data(&secret, gardener::SECRET_KEY_KUBECONFIG)?;
            return Ok(kubeconfig::from_yaml(data)?);
        }
    }

    Err(kubeconfig::Error::SecretNotFound {
        namespace: gardener::GARDEN_NAMESPACE.to_string(),
        name: format!("{name}{}", gardener::SEED_SECRET_LOGIN_SUFFIX),
    }
    .into())
}

/// The gardenlogin kubeconfig of `shoot`.
pub(super) async fn shoot_kubeconfig<C>(
    client: &C,
    garden: &Garden,
    shoot: &Shoot,
) -> Result<Kubeconfig, Error>
where
    C: GardenClient,
{
    let secret_name = format!("{}{}", shoot.name(), gardener::SHOOT_CA_SECRET_SUFFIX);
    let secret = client.get_secret(shoot.namespace(), &secret_name).await?.with_context(|| {
        kubeconfig::error::SecretNotFoundSnafu { namespace: shoot.namespace(), name: &secret_name }
    })?;
    let ca_cert = kubeconfig::secret_data(&secret, gardener::SECRET_KEY_CA_CERT)?;
    Ok(kubeconfig::shoot_kubeconfig(&garden.name, shoot, ca_cert)?)
}

/// The kubeconfig of the seed hosting `shoot`, scoped to the shoot's
/// control plane namespace.
pub(super) async fn control_plane_kubeconfig<C>(
    client: &C,
    garden: &Garden,
    shoot: &Shoot,
) -> Result<Kubeconfig, Error>
where
    C: GardenClient,
{
    let seed = shoot.seed_name().context(error::ShootNotScheduledSnafu { name: shoot.name() })?;
    let technical_id =
        shoot.technical_id().context(error::MissingTechnicalIdSnafu { name: shoot.name() })?;
    Ok(seed_kubeconfig(client, garden, seed).await?.with_namespace(technical_id)?)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        garden::fake::FakeGardenClient,
        kubeconfig::testing::{GARDEN_KUBECONFIG, current_namespace},
    };

    const SEED_KUBECONFIG: &str = r"
current-context: seed
clusters:
  - name: seed
    cluster:
      server: https://api.aws-eu1.example.com
contexts:
  - name: seed
    context:
      cluster: seed
      user: seed
users:
  - name: seed
    user:
      token: seed-token
";

    fn garden(dir: &tempfile::TempDir) -> Garden {
        let path = dir.path().join("live.yaml");
        std::fs::write(&path, GARDEN_KUBECONFIG).expect("write kubeconfig");
        Garden { name: "live".to_string(), kubeconfig: path, ..Garden::default() }
    }

    fn client() -> FakeGardenClient {
        FakeGardenClient::new("live")
            .with_project("garden", "garden")
            .with_project("team-a", "garden-team-a")
            .with_seed("aws-eu1")
            .with_seed("mgmt-seed")
            .with_secret(
                "garden",
                "aws-eu1.login",
                gardener::SECRET_KEY_KUBECONFIG,
                SEED_KUBECONFIG.as_bytes(),
            )
            .with_managed_seed("mgmt-seed", "mgmt-seed")
            .with_shoot("garden", "mgmt-seed", "aws-eu1", "1.27.4")
            .with_shoot("garden-team-a", "web", "mgmt-seed", "1.27.4")
            .with_shoot("garden-team-a", "db", "aws-eu1", "1.27.4")
    }

    #[tokio::test]
    async fn test_garden_kubeconfig() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let kubeconfig =
            target_kubeconfig(&client(), &garden(&dir), &Target::new("live", "", "", "", false))
                .await
                .expect("kubeconfig");
        assert_eq!(kubeconfig.current_context.as_deref(), Some("admin"));
        assert_eq!(kubeconfig.contexts.len(), 1);
    }

    #[tokio::test]
    async fn test_project_kubeconfig() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let target = Target::new("live", "team-a", "", "", false);
        let kubeconfig =
            target_kubeconfig(&client(), &garden(&dir), &target).await.expect("kubeconfig");
        assert_eq!(current_namespace(&kubeconfig), Some("garden-team-a"));
    }

    #[tokio::test]
    async fn test_seed_kubeconfig_from_secret() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let target = Target::new("live", "", "aws-eu1", "", false);
        let kubeconfig =
            target_kubeconfig(&client(), &garden(&dir), &target).await.expect("kubeconfig");
        assert_eq!(kubeconfig.current_context.as_deref(), Some("seed"));
    }

    #[tokio::test]
    async fn test_seed_kubeconfig_of_managed_seed() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let kubeconfig =
            seed_kubeconfig(&client(), &garden(&dir), "mgmt-seed").await.expect("kubeconfig");
        assert_eq!(kubeconfig.current_context.as_deref(), Some("garden--mgmt-seed-external"));
    }

    #[tokio::test]
    async fn test_seed_kubeconfig_without_secret() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let client = client().with_seed("gcp-us1");
        let err = seed_kubeconfig(&client, &garden(&dir), "gcp-us1").await.expect_err("no secret");
        assert!(matches!(
            err,
            Error::Kubeconfig { source: kubeconfig::Error::SecretNotFound { .. } }
        ));

        let err = seed_kubeconfig(&client, &garden(&dir), "missing").await.expect_err("no seed");
        assert!(matches!(err, Error::UnknownSeed { .. }));
    }

    #[tokio::test]
    async fn test_shoot_kubeconfig() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let target = Target::new("live", "team-a", "", "db", false);
        let kubeconfig =
            target_kubeconfig(&client(), &garden(&dir), &target).await.expect("kubeconfig");
        assert_eq!(kubeconfig.current_context.as_deref(), Some("garden-team-a--db-external"));

        let value = serde_json::to_value(&kubeconfig).expect("to value");
        assert_eq!(
            value["clusters"][0]["cluster"]["server"],
            json!("https://api.db.team-a.example.com")
        );
    }

    #[tokio::test]
    async fn test_control_plane_kubeconfig_of_managed_seed() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let target = Target::new("live", "team-a", "", "web", true);
        let kubeconfig =
            target_kubeconfig(&client(), &garden(&dir), &target).await.expect("kubeconfig");
        assert_eq!(kubeconfig.current_context.as_deref(), Some("garden--mgmt-seed-external"));
        assert_eq!(current_namespace(&kubeconfig), Some("shoot--team-a--web"));
    }

    #[tokio::test]
    async fn test_control_plane_kubeconfig_of_unscheduled_shoot() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let client = client().with_shoot("garden-team-a", "pending", "", "1.27.4");
        let target = Target::new("live", "team-a", "", "pending", true);
        let err = target_kubeconfig(&client, &garden(&dir), &target).await.expect_err("no seed");
        assert!(matches!(err, Error::ShootNotScheduled { name } if name == "pending"));
    }
}
