//! Components - the units a status page reports on.

use alloc::string::String;

use crate::NormalizedStatus;

/// One monitored unit within a page: a named service, product or region.
///
/// `group` and `region` are free-form labels supplied by the adapter's
/// mapping logic. An empty string means "not set".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Component {
    /// Display name of the component.
    pub name: String,

    /// Group the component belongs to, empty when ungrouped.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "String::is_empty"))]
    pub group: String,

    /// Region the component is located in, empty when not regional.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "String::is_empty"))]
    pub region: String,

    /// Normalized status.
    #[cfg_attr(feature = "serde", serde(default))]
    pub status: NormalizedStatus,
}

impl Component {
    /// Create an ungrouped, non-regional component.
    pub fn new(name: impl Into<String>, status: NormalizedStatus) -> Self {
        Self {
            name: name.into(),
            status,
            ..Default::default()
        }
    }

    /// Create a builder for a component.
    pub fn builder(name: impl Into<String>) -> ComponentBuilder {
        ComponentBuilder::new(name)
    }

    /// Set the group label.
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    /// Set the region label.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }
}

/// Builder for `Component`.
#[derive(Debug, Default)]
pub struct ComponentBuilder {
    name: String,
    group: String,
    region: String,
    status: NormalizedStatus,
}

impl ComponentBuilder {
    /// Create a new builder.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the group label.
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    /// Set the region label.
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Set the status.
    pub fn status(mut self, status: NormalizedStatus) -> Self {
        self.status = status;
        self
    }

    /// Build the component.
    pub fn build(self) -> Component {
        Component {
            name: self.name,
            group: self.group,
            region: self.region,
            status: self.status,
        }
    }
}
