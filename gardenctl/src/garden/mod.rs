//! Access to garden clusters.
//!
//! [`GardenClient`] is the subset of the Gardener API that targeting relies
//! on, [`ClientProvider`] turns configured gardens and assembled kubeconfigs
//! into clients. Both are traits so the target logic can run against
//! [`fake`] implementations in tests.

mod client;
mod error;
#[cfg(test)]
pub mod fake;
mod filter;
mod types;

use k8s_openapi::api::core::v1::{Namespace, Secret};
use kube::config::{KubeConfigOptions, Kubeconfig};
use snafu::ResultExt;

pub use self::{
    client::KubeGardenClient,
    error::Error,
    filter::ListFilter,
    types::{ManagedSeed, Project, Seed, Shoot, ShootReference},
};
#[cfg(test)]
pub use self::{
    filter::Constraint,
    types::{
        AdvertisedAddress, KubernetesSettings, ProjectSpec, SeedSelector, ShootSpec, ShootStatus,
    },
};
use crate::config::Garden;

/// Read access to the Gardener resources of one garden cluster.
///
/// `get_*` methods return `Ok(None)` when the object does not exist.
pub trait GardenClient {
    /// Canonical name of the garden this client talks to.
    fn name(&self) -> &str;

    async fn get_project(&self, name: &str) -> Result<Option<Project>, Error>;

    async fn get_project_by_namespace(&self, namespace: &str) -> Result<Option<Project>, Error>;

    async fn get_namespace(&self, name: &str) -> Result<Option<Namespace>, Error>;

    async fn get_seed(&self, name: &str) -> Result<Option<Seed>, Error>;

    async fn get_shoot(&self, namespace: &str, name: &str) -> Result<Option<Shoot>, Error>;

    /// Returns the shoot backing the managed seed `seed_name`, or `None` if
    /// the seed is not a managed seed.
    async fn get_shoot_of_managed_seed(
        &self,
        seed_name: &str,
    ) -> Result<Option<ShootReference>, Error>;

    /// Lists shoots in `namespace`, or across the garden, passing `filter`
    /// to the server where it can be expressed as a field selector.
    async fn list_shoots(
        &self,
        namespace: Option<&str>,
        filter: &ListFilter,
    ) -> Result<Vec<Shoot>, Error>;

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<Secret>, Error>;

    /// Returns the single shoot matching `filter`.
    ///
    /// Results of [`GardenClient::list_shoots`] are filtered again in memory
    /// so the outcome does not depend on server-side field selector support.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownShoot`] if nothing matches and
    /// [`Error::AmbiguousShoot`] if more than one shoot matches.
    async fn find_shoot(&self, filter: &ListFilter) -> Result<Shoot, Error> {
        let project_namespace = match filter.project() {
            Some(project) => Some(
                self.get_project(project)
                    .await?
                    .and_then(|project| project.namespace().map(str::to_string))
                    .ok_or_else(|| Error::ProjectNamespaceNotFound {
                        project: project.to_string(),
                    })?,
            ),
            None => None,
        };

        let mut shoots = self
            .list_shoots(project_namespace.as_deref(), filter)
            .await?
            .into_iter()
            .filter(|shoot| filter.matches(shoot, project_namespace.as_deref()))
            .collect::<Vec<_>>();

        let name = filter.name().unwrap_or_default().to_string();
        match shoots.len() {
            0 => error::UnknownShootSnafu { name }.fail(),
            1 => Ok(shoots.remove(0)),
            _ => {
                let projects = futures::future::try_join_all(
                    shoots.iter().map(|shoot| self.get_project_by_namespace(shoot.namespace())),
                )
                .await?;
                let candidates = shoots
                    .iter()
                    .zip(projects)
                    .map(|(shoot, project)| {
                        let project = project
                            .map_or_else(|| shoot.namespace().to_string(), |p| p.name().to_string());
                        format!(
                            "project '{project}' seed '{}'",
                            shoot.seed_name().unwrap_or("<none>")
                        )
                    })
                    .collect::<Vec<_>>();
                error::AmbiguousShootSnafu { name, candidates }.fail()
            }
        }
    }
}

/// Creates clients for gardens and for assembled kubeconfigs.
pub trait ClientProvider {
    type GardenClient: GardenClient;

    async fn garden_client(&self, garden: &Garden) -> Result<Self::GardenClient, Error>;

    async fn client(&self, kubeconfig: &Kubeconfig) -> Result<kube::Client, Error>;
}

/// [`ClientProvider`] backed by real API servers.
#[derive(Clone, Copy, Debug, Default)]
pub struct KubeClientProvider;

impl ClientProvider for KubeClientProvider {
    type GardenClient = KubeGardenClient;

    async fn garden_client(&self, garden: &Garden) -> Result<Self::GardenClient, Error> {
        let kubeconfig = crate::kubeconfig::load_garden_kubeconfig(garden)?;
        let client = self.client(&kubeconfig).await?;
        Ok(KubeGardenClient::new(garden.name.clone(), client))
    }

    async fn client(&self, kubeconfig: &Kubeconfig) -> Result<kube::Client, Error> {
        let config =
            kube::Config::from_custom_kubeconfig(kubeconfig.clone(), &KubeConfigOptions::default())
                .await
                .context(error::LoadClientConfigSnafu)?;
        kube::Client::try_from(config).context(error::CreateClientSnafu)
    }
}
