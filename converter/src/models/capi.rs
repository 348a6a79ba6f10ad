//! Cluster API (target) schema.
//!
//! A machine group is split into a standalone [`AwsMachineTemplate`] and a
//! [`MachineSet`] whose infrastructure reference names the template.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{LabelSelector, ObjectMeta, ObjectReference};

pub const API_VERSION: &str = "cluster.x-k8s.io/v1beta1";
pub const MACHINE_SET_KIND: &str = "MachineSet";

pub const INFRASTRUCTURE_API_VERSION: &str = "infrastructure.cluster.x-k8s.io/v1beta1";
pub const AWS_MACHINE_TEMPLATE_KIND: &str = "AWSMachineTemplate";

/// Secret backend used when none is configured.
pub const SECRET_BACKEND_SECRETS_MANAGER: &str = "secrets-manager";

/// Key-unique tag mapping.
pub type Tags = BTreeMap<String, String>;

// =============================================================================
// Machine spec
// =============================================================================

/// Identity of an AWS resource: by id, by ARN, or by filters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AwsResourceReference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arn: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<Filter>,
}

/// Filter used to look up an AWS resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub name: String,

    #[serde(default)]
    pub values: Vec<String>,
}

/// An EBS volume. The root volume has an empty device name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub device_name: String,

    pub size: i64,

    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub volume_type: String,

    #[serde(default, skip_serializing_if = "is_zero")]
    pub iops: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted: Option<bool>,

    /// KMS key id or ARN; which one it was is not recorded.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub encryption_key: String,
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}

/// Spot instance request options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotMarketOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_price: Option<String>,
}

/// Bootstrap data delivery settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudInit {
    #[serde(default)]
    pub insecure_skip_secrets_manager: bool,

    #[serde(default)]
    pub secure_secrets_backend: String,
}

impl Default for CloudInit {
    fn default() -> Self {
        Self {
            insecure_skip_secrets_manager: false,
            secure_secrets_backend: SECRET_BACKEND_SECRETS_MANAGER.to_string(),
        }
    }
}

/// AWS machine settings carried by a template.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwsMachineSpec {
    #[serde(default)]
    pub ami: AwsResourceReference,

    #[serde(default)]
    pub instance_type: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub additional_tags: Tags,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub iam_instance_profile: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_key_name: Option<String>,

    #[serde(rename = "publicIP", default, skip_serializing_if = "Option::is_none")]
    pub public_ip: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_domain: Option<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tenancy: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_security_groups: Vec<AwsResourceReference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet: Option<AwsResourceReference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spot_market_options: Option<SpotMarketOptions>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_volume: Option<Volume>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub non_root_volumes: Vec<Volume>,

    #[serde(default)]
    pub cloud_init: CloudInit,
}

// =============================================================================
// Template resource
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AwsMachineTemplateResource {
    #[serde(default)]
    pub spec: AwsMachineSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AwsMachineTemplateSpec {
    #[serde(default)]
    pub template: AwsMachineTemplateResource,
}

/// Standalone, reusable AWS machine template.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwsMachineTemplate {
    #[serde(default)]
    pub api_version: String,

    #[serde(default)]
    pub kind: String,

    #[serde(default)]
    pub metadata: ObjectMeta,

    #[serde(default)]
    pub spec: AwsMachineTemplateSpec,
}

impl AwsMachineTemplate {
    /// New template with the canonical apiVersion and kind.
    pub fn new(metadata: ObjectMeta, spec: AwsMachineSpec) -> Self {
        Self {
            api_version: INFRASTRUCTURE_API_VERSION.to_string(),
            kind: AWS_MACHINE_TEMPLATE_KIND.to_string(),
            metadata,
            spec: AwsMachineTemplateSpec {
                template: AwsMachineTemplateResource { spec },
            },
        }
    }

    /// Machine settings carried by this template.
    pub fn machine_spec(&self) -> &AwsMachineSpec {
        &self.spec.template.spec
    }
}

// =============================================================================
// Group resource
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bootstrap {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_secret_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineSpec {
    #[serde(default)]
    pub bootstrap: Bootstrap,

    #[serde(default)]
    pub infrastructure_ref: ObjectReference,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MachineTemplateSpec {
    #[serde(default, skip_serializing_if = "ObjectMeta::is_empty")]
    pub metadata: ObjectMeta,

    #[serde(default)]
    pub spec: MachineSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MachineSetSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,

    #[serde(default)]
    pub selector: LabelSelector,

    #[serde(default)]
    pub template: MachineTemplateSpec,
}

/// Scaling group referencing an [`AwsMachineTemplate`] by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineSet {
    #[serde(default)]
    pub api_version: String,

    #[serde(default)]
    pub kind: String,

    #[serde(default)]
    pub metadata: ObjectMeta,

    #[serde(default)]
    pub spec: MachineSetSpec,
}

impl MachineSet {
    /// New machine set with the canonical apiVersion and kind.
    pub fn new(metadata: ObjectMeta, spec: MachineSetSpec) -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: MACHINE_SET_KIND.to_string(),
            metadata,
            spec,
        }
    }
}
