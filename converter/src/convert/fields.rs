//! Field mapping between the machine API provider config and the cluster API
//! AWS machine spec.
//!
//! Both directions are pure: same input, same output, no state. Every
//! optional input has an explicit policy, either a default or an
//! [`ConversionError::IncompleteData`].
//!
//! # Lossy fields
//!
//! Some information cannot survive a round trip and is reported on the log
//! stream instead of being dropped silently:
//!
//! - duplicate tag names: the last value wins
//! - IAM instance profile ARN: only the id is carried
//! - KMS key: the template keeps one string, converting back always yields
//!   an `id` reference, never an `arn`
//! - placement region and cluster name: supplied again through
//!   [`ClusterContext`] when converting back
//! - unknown tenancy strings: fall back to [`InstanceTenancy::Default`]
//! - absent `userDataSecret`: the group's bootstrap secret defaults to
//!   `worker-user-data`, so converting back sets it explicitly

use crate::error::{ConversionError, ConversionResult};
use crate::logs::log_warning;
use crate::models::capi::{self, AwsMachineSpec, CloudInit, Tags, Volume};
use crate::models::mapi::{
    self, AwsMachineProviderConfig, BlockDeviceMappingSpec, EbsBlockDeviceSpec, InstanceTenancy, Placement,
    TagSpecification,
};

use super::context::ClusterContext;

/// Tenancy used for values outside the recognized set.
pub const FALLBACK_TENANCY: InstanceTenancy = InstanceTenancy::Default;

// =============================================================================
// Forward: machine API -> cluster API
// =============================================================================

/// Map a provider config to the machine spec of a template.
pub fn to_capi(config: &AwsMachineProviderConfig) -> ConversionResult<AwsMachineSpec> {
    if config.ami.is_empty() {
        return Err(ConversionError::incomplete("ami"));
    }

    let additional_security_groups = config
        .security_groups
        .iter()
        .enumerate()
        .map(|(i, sg)| {
            if sg.is_empty() {
                Err(ConversionError::incomplete(format!("securityGroups[{}]", i)))
            } else {
                Ok(reference_to_capi(sg))
            }
        })
        .collect::<ConversionResult<Vec<_>>>()?;

    let (root_volume, non_root_volumes) = block_devices_to_capi(&config.block_devices)?;

    if !config.placement.region.is_empty() {
        log_warning(format!(
            "placement.region '{}' has no counterpart in a machine template, supply it again when converting back",
            config.placement.region
        ));
    }
    if let Some(secret) = &config.credentials_secret {
        log_warning(format!("credentialsSecret '{}' is not carried by a machine template", secret.name));
    }

    Ok(AwsMachineSpec {
        ami: reference_to_capi(&config.ami),
        instance_type: config.instance_type.clone(),
        additional_tags: tags_to_capi(&config.tags),
        iam_instance_profile: iam_instance_profile_to_capi(config.iam_instance_profile.as_ref()),
        ssh_key_name: config.key_name.clone(),
        public_ip: config.public_ip,
        failure_domain: Some(config.placement.availability_zone.clone()).filter(|az| !az.is_empty()),
        tenancy: config.placement.tenancy.as_str().to_string(),
        additional_security_groups,
        subnet: Some(&config.subnet)
            .filter(|subnet| !subnet.is_empty())
            .map(reference_to_capi),
        spot_market_options: config
            .spot_market_options
            .as_ref()
            .map(|spot| capi::SpotMarketOptions { max_price: spot.max_price.clone() }),
        root_volume: Some(root_volume),
        non_root_volumes,
        cloud_init: CloudInit::default(),
    })
}

/// Copy id, ARN and filters verbatim, keeping filter order.
pub fn reference_to_capi(reference: &mapi::AwsResourceReference) -> capi::AwsResourceReference {
    capi::AwsResourceReference {
        id: reference.id.clone(),
        arn: reference.arn.clone(),
        filters: reference
            .filters
            .iter()
            .map(|f| capi::Filter { name: f.name.clone(), values: f.values.clone() })
            .collect(),
    }
}

/// Tag list to tag map. Later duplicates overwrite earlier ones.
pub fn tags_to_capi(tags: &[TagSpecification]) -> Tags {
    let mut map = Tags::new();
    for tag in tags {
        if let Some(previous) = map.insert(tag.name.clone(), tag.value.clone()) {
            log_warning(format!(
                "duplicate tag '{}': value '{}' overwritten by '{}'",
                tag.name, previous, tag.value
            ));
        }
    }
    map
}

/// Unwrap the profile id. The ARN is not representable.
pub fn iam_instance_profile_to_capi(profile: Option<&mapi::AwsResourceReference>) -> String {
    let Some(profile) = profile else {
        return String::new();
    };
    if let Some(arn) = &profile.arn {
        log_warning(format!("iamInstanceProfile ARN '{}' discarded, only the id is carried", arn));
    }
    profile.id.clone().unwrap_or_default()
}

/// Split block devices into the root volume and the ordered non-root volumes.
///
/// The entry without a device name is the root volume. Exactly one is required.
pub fn block_devices_to_capi(devices: &[BlockDeviceMappingSpec]) -> ConversionResult<(Volume, Vec<Volume>)> {
    if devices.is_empty() {
        return Err(ConversionError::incomplete("blockDevices"));
    }

    let mut roots = Vec::new();
    let mut non_root = Vec::new();

    for (i, device) in devices.iter().enumerate() {
        let ebs = device
            .ebs
            .as_ref()
            .ok_or_else(|| ConversionError::incomplete(format!("blockDevices[{}].ebs", i)))?;
        let size = ebs
            .volume_size
            .ok_or_else(|| ConversionError::incomplete(format!("blockDevices[{}].ebs.volumeSize", i)))?;
        // an empty name would render as a second root volume
        if device.device_name.as_deref() == Some("") {
            return Err(ConversionError::incomplete(format!("blockDevices[{}].deviceName", i)));
        }

        let volume = Volume {
            device_name: device.device_name.clone().unwrap_or_default(),
            size,
            volume_type: ebs.volume_type.clone().unwrap_or_default(),
            iops: ebs.iops.unwrap_or_default(),
            encrypted: ebs.encrypted,
            encryption_key: encryption_key_to_capi(&ebs.kms_key),
        };

        match device.device_name {
            None => roots.push(volume),
            Some(_) => non_root.push(volume),
        }
    }

    match roots.len() {
        0 => Err(ConversionError::incomplete("blockDevices[root]")),
        1 => Ok((roots.remove(0), non_root)),
        count => Err(ConversionError::DuplicateRootVolume { count }),
    }
}

/// Flatten a KMS key reference: id, else ARN, else empty.
pub fn encryption_key_to_capi(kms_key: &mapi::AwsResourceReference) -> String {
    if let Some(id) = &kms_key.id {
        return id.clone();
    }
    if let Some(arn) = &kms_key.arn {
        return arn.clone();
    }
    if !kms_key.filters.is_empty() {
        log_warning("kmsKey given by filters cannot be expressed as an encryption key, left empty");
    }
    String::new()
}

// =============================================================================
// Reverse: cluster API -> machine API
// =============================================================================

/// Map the machine spec of a template back to a provider config.
///
/// Region comes from `context`; `userDataSecret` is left for the caller
/// because it lives on the machine set, not the template.
pub fn to_mapi(spec: &AwsMachineSpec, context: &ClusterContext) -> ConversionResult<AwsMachineProviderConfig> {
    let ami = reference_to_mapi(&spec.ami);
    if ami.is_empty() {
        return Err(ConversionError::incomplete("ami"));
    }

    let root_volume = spec
        .root_volume
        .as_ref()
        .ok_or_else(|| ConversionError::incomplete("rootVolume"))?;

    Ok(AwsMachineProviderConfig {
        ami,
        instance_type: spec.instance_type.clone(),
        tags: tags_to_mapi(&spec.additional_tags),
        iam_instance_profile: iam_instance_profile_to_mapi(&spec.iam_instance_profile),
        user_data_secret: None,
        credentials_secret: None,
        key_name: spec.ssh_key_name.clone(),
        public_ip: spec.public_ip,
        security_groups: spec.additional_security_groups.iter().map(reference_to_mapi).collect(),
        subnet: spec.subnet.as_ref().map(reference_to_mapi).unwrap_or_default(),
        placement: Placement {
            region: context.region_or_placeholder(),
            availability_zone: spec.failure_domain.clone().unwrap_or_default(),
            tenancy: tenancy_to_mapi(&spec.tenancy),
        },
        block_devices: block_devices_to_mapi(root_volume, &spec.non_root_volumes)?,
        spot_market_options: spec
            .spot_market_options
            .as_ref()
            .map(|spot| mapi::SpotMarketOptions { max_price: spot.max_price.clone() }),
    })
}

pub fn reference_to_mapi(reference: &capi::AwsResourceReference) -> mapi::AwsResourceReference {
    mapi::AwsResourceReference {
        id: reference.id.clone(),
        arn: reference.arn.clone(),
        filters: reference
            .filters
            .iter()
            .map(|f| mapi::Filter { name: f.name.clone(), values: f.values.clone() })
            .collect(),
    }
}

/// Tag map to tag list, sorted by name.
pub fn tags_to_mapi(tags: &Tags) -> Vec<TagSpecification> {
    tags.iter()
        .map(|(name, value)| TagSpecification { name: name.clone(), value: value.clone() })
        .collect()
}

/// Empty profile means no profile, anything else becomes an `id` reference.
pub fn iam_instance_profile_to_mapi(profile: &str) -> Option<mapi::AwsResourceReference> {
    if profile.is_empty() {
        None
    } else {
        Some(mapi::AwsResourceReference::by_id(profile))
    }
}

/// Parse tenancy, falling back to [`FALLBACK_TENANCY`] for unknown values.
pub fn tenancy_to_mapi(tenancy: &str) -> InstanceTenancy {
    InstanceTenancy::from_value(tenancy).unwrap_or_else(|| {
        log_warning(format!(
            "unrecognized tenancy '{}', using '{}'",
            tenancy,
            FALLBACK_TENANCY.as_str()
        ));
        FALLBACK_TENANCY
    })
}

/// Rebuild the block device list: root volume first, then non-root volumes in order.
pub fn block_devices_to_mapi(root: &Volume, non_root: &[Volume]) -> ConversionResult<Vec<BlockDeviceMappingSpec>> {
    let mut devices = Vec::with_capacity(non_root.len() + 1);
    devices.push(BlockDeviceMappingSpec {
        device_name: None,
        ebs: Some(volume_to_ebs(root)),
    });

    for (i, volume) in non_root.iter().enumerate() {
        // an empty name here would turn the volume into a second root
        if volume.device_name.is_empty() {
            return Err(ConversionError::incomplete(format!("nonRootVolumes[{}].deviceName", i)));
        }
        devices.push(BlockDeviceMappingSpec {
            device_name: Some(volume.device_name.clone()),
            ebs: Some(volume_to_ebs(volume)),
        });
    }

    Ok(devices)
}

fn volume_to_ebs(volume: &Volume) -> EbsBlockDeviceSpec {
    EbsBlockDeviceSpec {
        encrypted: volume.encrypted,
        iops: Some(volume.iops).filter(|iops| *iops != 0),
        kms_key: encryption_key_to_mapi(&volume.encryption_key),
        volume_size: Some(volume.size),
        volume_type: Some(volume.volume_type.clone()).filter(|t| !t.is_empty()),
    }
}

/// Materialize an encryption key as an `id` reference.
///
/// The template does not record whether the key was an id or an ARN. The
/// result is always an `id`, even for values that look like ARNs.
pub fn encryption_key_to_mapi(key: &str) -> mapi::AwsResourceReference {
    if key.is_empty() {
        mapi::AwsResourceReference::default()
    } else {
        mapi::AwsResourceReference::by_id(key)
    }
}
