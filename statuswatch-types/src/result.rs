//! ProviderResult - the normalized outcome of one fetch.

use alloc::string::String;
use alloc::vec::Vec;

use crate::{Component, ComponentBuilder, NormalizedStatus};

/// The normalized outcome of one successful fetch against a page.
///
/// Produced fresh on every fetch and never mutated afterwards; caches hold it
/// by value.
///
/// # Example
///
/// ```rust
/// use statuswatch_types::{NormalizedStatus, ProviderResult};
///
/// let result = ProviderResult::builder("instatus", "linear")
///     .component("Sync", |c| c.status(NormalizedStatus::Operational))
///     .build();
///
/// assert_eq!(result.provider, "instatus");
/// assert_eq!(result.open_incidents, None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProviderResult {
    /// Provider kind, e.g. `statuspage` or `aws_rss`.
    pub provider: String,

    /// The configured page name.
    pub page: String,

    /// Components in the order the upstream listed them. May be empty.
    #[cfg_attr(feature = "serde", serde(default))]
    pub components: Vec<Component>,

    /// Number of open incidents, `None` when the provider does not report it.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub open_incidents: Option<u32>,
}

impl ProviderResult {
    /// Create an empty result for a provider and page.
    pub fn new(provider: impl Into<String>, page: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            page: page.into(),
            ..Default::default()
        }
    }

    /// Create a builder for a result.
    pub fn builder(provider: impl Into<String>, page: impl Into<String>) -> ProviderResultBuilder {
        ProviderResultBuilder::new(provider, page)
    }

    /// Check if the result lists no components.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Number of listed components, duplicates included.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Count components that are not operational and not under maintenance.
    pub fn impacted_components(&self) -> usize {
        self.components
            .iter()
            .filter(|c| {
                !matches!(
                    c.status,
                    NormalizedStatus::Operational | NormalizedStatus::UnderMaintenance
                )
            })
            .count()
    }
}

/// Builder for `ProviderResult`.
#[derive(Debug, Default)]
pub struct ProviderResultBuilder {
    provider: String,
    page: String,
    components: Vec<Component>,
    open_incidents: Option<u32>,
}

impl ProviderResultBuilder {
    /// Create a new builder.
    pub fn new(provider: impl Into<String>, page: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            page: page.into(),
            ..Default::default()
        }
    }

    /// Add a component built using a closure.
    pub fn component<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: FnOnce(ComponentBuilder) -> ComponentBuilder,
    {
        self.components.push(f(ComponentBuilder::new(name)).build());
        self
    }

    /// Add a pre-built component.
    pub fn push(mut self, component: Component) -> Self {
        self.components.push(component);
        self
    }

    /// Set the open incident count.
    pub fn open_incidents(mut self, count: u32) -> Self {
        self.open_incidents = Some(count);
        self
    }

    /// Build the result.
    pub fn build(self) -> ProviderResult {
        ProviderResult {
            provider: self.provider,
            page: self.page,
            components: self.components,
            open_incidents: self.open_incidents,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_builder() {
        let result = ProviderResult::builder("statuspage", "github")
            .component("API", |c| c.status(NormalizedStatus::Operational))
            .component("Actions", |c| {
                c.group("CI").status(NormalizedStatus::PartialOutage)
            })
            .open_incidents(2)
            .build();

        assert_eq!(result.len(), 2);
        assert_eq!(result.open_incidents, Some(2));
        assert_eq!(result.components[1].group, "CI");
    }

    #[test]
    fn new_result_has_no_incident_count() {
        let result = ProviderResult::new("gcp", "cloud");
        assert!(result.is_empty());
        assert_eq!(result.open_incidents, None);
        assert_eq!(result.provider, "gcp");
        assert_eq!(result.page, "cloud");
    }

    #[test]
    fn impacted_components_skip_maintenance() {
        let result = ProviderResult::builder("statuspage", "x")
            .component("a", |c| c.status(NormalizedStatus::Operational))
            .component("b", |c| c.status(NormalizedStatus::UnderMaintenance))
            .component("c", |c| c.status(NormalizedStatus::Degraded))
            .component("d", |c| c.status(NormalizedStatus::Unknown))
            .build();

        assert_eq!(result.impacted_components(), 2);
    }

    #[test]
    fn builder_preserves_component_order() {
        let result = ProviderResult::builder("statusio", "x")
            .push(Component::new("z", NormalizedStatus::Operational))
            .push(Component::new("a", NormalizedStatus::Operational))
            .build();

        let names: Vec<&str> = result.components.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["z", "a"]);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_roundtrip() {
        let result = ProviderResult::builder("azuredevops", "ado")
            .component("Boards", |c| {
                c.region("Europe").status(NormalizedStatus::Operational)
            })
            .build();

        let json = serde_json::to_string(&result).unwrap();
        let parsed: ProviderResult = serde_json::from_str(&json).unwrap();

        assert_eq!(result, parsed);
    }
}
