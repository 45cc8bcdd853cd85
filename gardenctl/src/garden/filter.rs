use super::Shoot;

/// One field-equality constraint of a [`ListFilter`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Constraint {
    /// `metadata.name` equals the value.
    ByName(String),
    /// `spec.seedName` equals the value.
    BySeed(String),
    /// The shoot lives in the namespace of the named project.
    ByProject(String),
}

/// A conjunction of constraints used to select shoots.
///
/// The server-side form is a field selector, but every consumer also applies
/// [`ListFilter::matches`] to the returned items since not every API
/// implementation honours field selectors.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ListFilter {
    constraints: Vec<Constraint>,
}

impl ListFilter {
    /// A filter matching every shoot of the garden.
    #[must_use]
    pub const fn all() -> Self { Self { constraints: Vec::new() } }

    #[must_use]
    pub fn by_name(mut self, name: impl Into<String>) -> Self {
        self.constraints.push(Constraint::ByName(name.into()));
        self
    }

    #[must_use]
    pub fn by_seed(mut self, seed: impl Into<String>) -> Self {
        self.constraints.push(Constraint::BySeed(seed.into()));
        self
    }

    #[must_use]
    pub fn by_project(mut self, project: impl Into<String>) -> Self {
        self.constraints.push(Constraint::ByProject(project.into()));
        self
    }

    #[cfg(test)]
    #[must_use]
    pub fn constraints(&self) -> &[Constraint] { &self.constraints }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.constraints.iter().find_map(|constraint| match constraint {
            Constraint::ByName(name) => Some(name.as_str()),
            _ => None,
        })
    }

    #[must_use]
    pub fn project(&self) -> Option<&str> {
        self.constraints.iter().find_map(|constraint| match constraint {
            Constraint::ByProject(project) => Some(project.as_str()),
            _ => None,
        })
    }

    /// Renders the name and seed constraints as a field selector.
    #[must_use]
    pub fn field_selector(&self) -> Option<String> {
        let fields = self
            .constraints
            .iter()
            .filter_map(|constraint| match constraint {
                Constraint::ByName(name) => Some(format!("metadata.name={name}")),
                Constraint::BySeed(seed) => Some(format!("spec.seedName={seed}")),
                Constraint::ByProject(_) => None,
            })
            .collect::<Vec<_>>();
        (!fields.is_empty()).then(|| fields.join(","))
    }

    /// Returns whether `shoot` satisfies every constraint.
    ///
    /// `project_namespace` is the namespace of the project constraint; it is
    /// ignored when the filter has none.
    #[must_use]
    pub fn matches(&self, shoot: &Shoot, project_namespace: Option<&str>) -> bool {
        self.constraints.iter().all(|constraint| match constraint {
            Constraint::ByName(name) => shoot.name() == name,
            Constraint::BySeed(seed) => shoot.seed_name() == Some(seed.as_str()),
            Constraint::ByProject(_) => project_namespace == Some(shoot.namespace()),
        })
    }
}
