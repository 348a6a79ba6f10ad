//! Domain models for the machine conversion pipeline.
//!
//! This module contains the resource envelope shared by both schemas and
//! the two typed schemas themselves:
//!
//! - [`ObjectMeta`] - Name, namespace, labels and annotations of a resource
//! - [`LabelSelector`] - Label selector of a machine group
//! - [`ObjectReference`] / [`LocalObjectReference`] - References between resources
//! - [`mapi`] - Legacy per-machine provider config schema (source)
//! - [`capi`] - Template + group schema (target)
//! - [`Resource`] - Any of the resources above, as read from or written to a document

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod capi;
pub mod mapi;

/// String-keyed map with deterministic iteration order.
pub type Labels = BTreeMap<String, String>;

// =============================================================================
// Envelope
// =============================================================================

/// Generic resource metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: Labels,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: Labels,
}

impl ObjectMeta {
    /// Metadata carrying only a name and namespace.
    pub fn named(name: impl Into<String>, namespace: Option<String>) -> Self {
        Self {
            name: name.into(),
            namespace,
            ..Default::default()
        }
    }

    /// Metadata carrying only labels.
    pub fn with_labels(labels: Labels) -> Self {
        Self {
            labels,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
            && self.namespace.is_none()
            && self.labels.is_empty()
            && self.annotations.is_empty()
    }
}

/// Label selector of a machine group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelSelector {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub match_labels: Labels,
}

/// Reference to another resource by kind and name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectReference {
    #[serde(default)]
    pub api_version: String,

    #[serde(default)]
    pub kind: String,

    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// Reference to another resource in the same namespace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalObjectReference {
    #[serde(default)]
    pub name: String,
}

// =============================================================================
// Resources
// =============================================================================

/// A typed resource the converter reads or writes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Resource {
    /// Source schema single machine.
    MapiMachine(mapi::Machine),
    /// Source schema machine group, provider config inline.
    MapiMachineSet(mapi::MachineSet),
    /// Target schema machine group.
    CapiMachineSet(capi::MachineSet),
    /// Target schema machine template.
    AwsMachineTemplate(capi::AwsMachineTemplate),
}

impl Resource {
    /// Kind with its API group, e.g. `MachineSet.machine.openshift.io`.
    pub fn describe(&self) -> String {
        let (kind, api_version) = match self {
            Resource::MapiMachine(_) => (mapi::MACHINE_KIND, mapi::API_VERSION),
            Resource::MapiMachineSet(_) => (mapi::MACHINE_SET_KIND, mapi::API_VERSION),
            Resource::CapiMachineSet(_) => (capi::MACHINE_SET_KIND, capi::API_VERSION),
            Resource::AwsMachineTemplate(_) => (capi::AWS_MACHINE_TEMPLATE_KIND, capi::INFRASTRUCTURE_API_VERSION),
        };
        let group = api_version.split('/').next().unwrap_or(api_version);
        format!("{}.{}", kind, group)
    }

    pub fn metadata(&self) -> &ObjectMeta {
        match self {
            Resource::MapiMachine(r) => &r.metadata,
            Resource::MapiMachineSet(r) => &r.metadata,
            Resource::CapiMachineSet(r) => &r.metadata,
            Resource::AwsMachineTemplate(r) => &r.metadata,
        }
    }
}
