//! Machine API (source) schema.
//!
//! A machine or machine set embeds its AWS configuration as an opaque
//! [`ProviderSpec`] payload; [`AwsMachineProviderConfig`] is its typed form.

use serde::{Deserialize, Serialize};

use super::{LabelSelector, LocalObjectReference, ObjectMeta};

pub const API_VERSION: &str = "machine.openshift.io/v1beta1";
pub const MACHINE_KIND: &str = "Machine";
pub const MACHINE_SET_KIND: &str = "MachineSet";
pub const PROVIDER_CONFIG_KIND: &str = "AWSMachineProviderConfig";

/// Label carrying the cluster name on machine API resources.
pub const CLUSTER_LABEL: &str = "machine.openshift.io/cluster-api-cluster";

// =============================================================================
// Provider config
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

impl AwsResourceReference {
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Default::default()
        }
    }

    pub fn by_arn(arn: impl Into<String>) -> Self {
        Self {
            arn: Some(arn.into()),
            ..Default::default()
        }
    }

    /// True when none of id, ARN or filters is set.
    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.arn.is_none() && self.filters.is_empty()
    }
}

/// Filter used to look up an AWS resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub name: String,

    #[serde(default)]
    pub values: Vec<String>,
}

/// A single tag. Names are expected to be unique within a config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagSpecification {
    pub name: String,

    #[serde(default)]
    pub value: String,
}

/// Instance tenancy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceTenancy {
    /// Shared hardware.
    #[default]
    #[serde(alias = "")]
    Default,
    /// Dedicated hardware.
    Dedicated,
    /// Dedicated host.
    Host,
}

impl InstanceTenancy {
    /// Parse the canonical value. Returns `None` for anything else.
    pub fn from_value(value: &str) -> Option<Self> {
        match value {
            "default" => Some(Self::Default),
            "dedicated" => Some(Self::Dedicated),
            "host" => Some(Self::Host),
            _ => None,
        }
    }

    /// Canonical value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Dedicated => "dedicated",
            Self::Host => "host",
        }
    }
}

/// Where the instance runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    #[serde(default)]
    pub region: String,

    #[serde(default)]
    pub availability_zone: String,

    #[serde(default)]
    pub tenancy: InstanceTenancy,
}

/// EBS volume settings of a block device.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EbsBlockDeviceSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iops: Option<i64>,

    #[serde(default, skip_serializing_if = "AwsResourceReference::is_empty")]
    pub kms_key: AwsResourceReference,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_size: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_type: Option<String>,
}

/// One block device. The entry without a device name is the root volume.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockDeviceMappingSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ebs: Option<EbsBlockDeviceSpec>,
}

/// Spot instance request options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotMarketOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_price: Option<String>,
}

/// Typed AWS provider payload of a machine API resource.
///
/// The payload's own `apiVersion`/`kind` are handled by the codec and are
/// not part of this struct.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwsMachineProviderConfig {
    #[serde(default)]
    pub ami: AwsResourceReference,

    #[serde(default)]
    pub instance_type: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<TagSpecification>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iam_instance_profile: Option<AwsResourceReference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_data_secret: Option<LocalObjectReference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials_secret: Option<LocalObjectReference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_ip: Option<bool>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security_groups: Vec<AwsResourceReference>,

    #[serde(default)]
    pub subnet: AwsResourceReference,

    #[serde(default)]
    pub placement: Placement,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub block_devices: Vec<BlockDeviceMappingSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spot_market_options: Option<SpotMarketOptions>,
}

// =============================================================================
// Envelopes
// =============================================================================

/// Opaque provider payload, kept as an untyped JSON value until decoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawExtension(pub serde_json::Value);

/// Holder of the provider payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<RawExtension>,
}

/// Desired state of a single machine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineSpec {
    #[serde(default, skip_serializing_if = "ObjectMeta::is_empty")]
    pub metadata: ObjectMeta,

    #[serde(default)]
    pub provider_spec: ProviderSpec,
}

/// A single machine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Machine {
    #[serde(default)]
    pub api_version: String,

    #[serde(default)]
    pub kind: String,

    #[serde(default)]
    pub metadata: ObjectMeta,

    #[serde(default)]
    pub spec: MachineSpec,
}

/// Machine template embedded in a machine set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MachineTemplateSpec {
    #[serde(default, skip_serializing_if = "ObjectMeta::is_empty")]
    pub metadata: ObjectMeta,

    #[serde(default)]
    pub spec: MachineSpec,
}

/// Desired state of a machine set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MachineSetSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,

    #[serde(default)]
    pub selector: LabelSelector,

    #[serde(default)]
    pub template: MachineTemplateSpec,
}

/// A group of identical machines with the provider payload inline.
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tenancy_values() {
        assert_eq!(InstanceTenancy::from_value("dedicated"), Some(InstanceTenancy::Dedicated));
        assert_eq!(InstanceTenancy::from_value("host"), Some(InstanceTenancy::Host));
        assert_eq!(InstanceTenancy::from_value("Dedicated"), None);
        assert_eq!(InstanceTenancy::Host.as_str(), "host");
    }

    #[test]
    fn test_empty_tenancy_deserializes_to_default() {
        let placement: Placement =
            serde_json::from_value(serde_json::json!({ "tenancy": "" })).unwrap();
        assert_eq!(placement.tenancy, InstanceTenancy::Default);
    }

    #[test]
    fn test_reference_emptiness() {
        assert!(AwsResourceReference::default().is_empty());
        assert!(!AwsResourceReference::by_arn("arn:aws:kms:key").is_empty());

        let by_filter = AwsResourceReference {
            filters: vec![Filter { name: "tag:Name".into(), values: vec!["subnet-a".into()] }],
            ..Default::default()
        };
        assert!(!by_filter.is_empty());
    }

    #[test]
    fn test_provider_config_field_names() {
        let config: AwsMachineProviderConfig = serde_json::from_value(serde_json::json!({
            "instanceType": "m5.large",
            "publicIp": true,
            "keyName": "ssh",
            "iamInstanceProfile": { "id": "worker-profile" },
            "blockDevices": [{ "ebs": { "volumeSize": 120, "kmsKey": { "arn": "arn:key" } } }]
        }))
        .unwrap();

        assert_eq!(config.instance_type, "m5.large");
        assert_eq!(config.public_ip, Some(true));
        assert_eq!(config.key_name.as_deref(), Some("ssh"));
        let ebs = config.block_devices[0].ebs.as_ref().unwrap();
        assert_eq!(ebs.volume_size, Some(120));
        assert_eq!(ebs.kms_key.arn.as_deref(), Some("arn:key"));
    }
}
