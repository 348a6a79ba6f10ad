//! Machine group conversion.
//!
//! A machine API `MachineSet` carries its machine configuration inline. On
//! the cluster API side the same group is two resources: an
//! `AWSMachineTemplate` and a `MachineSet` whose infrastructure reference
//! names the template.
//!
//! ```text
//! machine API                      cluster API
//! ┌──────────────────────────┐     ┌──────────────────────────┐
//! │ MachineSet "workers"     │     │ AWSMachineTemplate       │
//! │  replicas, selector      │  →  │  "workers"               │
//! │  template.providerSpec   │     ├──────────────────────────┤
//! └──────────────────────────┘     │ MachineSet "workers"     │
//!                                  │  infrastructureRef ──────┼─▶ "workers"
//!                                  └──────────────────────────┘
//! ```
//!
//! The template name is derived from the group name alone, by
//! [`template_name_for`]. The reverse path matches the two resources through
//! that same function and never by inspecting their contents.

use crate::codec;
use crate::error::{ConversionError, ConversionResult};
use crate::logs::{log_info, log_warning};
use crate::models::capi::{self, AwsMachineTemplate, Bootstrap};
use crate::models::mapi::{self, AwsMachineProviderConfig, CLUSTER_LABEL};
use crate::models::{LabelSelector, Labels, LocalObjectReference, ObjectMeta, ObjectReference};

use super::context::ClusterContext;
use super::fields;

/// Bootstrap secret used when the provider config names none.
pub const DEFAULT_USER_DATA_SECRET: &str = "worker-user-data";

/// Name of the template generated for a group.
///
/// Shared by the forward generator and the reverse matcher.
pub fn template_name_for(group_name: &str) -> String {
    group_name.to_string()
}

// =============================================================================
// Forward
// =============================================================================

/// Split a machine API machine set into `(template, group)`.
pub fn machine_set_to_capi(
    machine_set: &mapi::MachineSet,
) -> ConversionResult<(AwsMachineTemplate, capi::MachineSet)> {
    let name = &machine_set.metadata.name;
    if name.is_empty() {
        return Err(ConversionError::incomplete("metadata.name"));
    }
    let namespace = machine_set.metadata.namespace.clone();

    log_info(format!("Converting MachineSet '{}' to cluster API", name));

    let config: AwsMachineProviderConfig =
        codec::decode(machine_set.spec.template.spec.provider_spec.value.as_ref())?;
    let spec = fields::to_capi(&config)?;

    let template_name = template_name_for(name);
    let template = AwsMachineTemplate::new(ObjectMeta::named(template_name.clone(), namespace.clone()), spec);

    let data_secret_name = match config.user_data_secret.as_ref().filter(|s| !s.name.is_empty()) {
        Some(secret) => secret.name.clone(),
        None => {
            log_warning(format!(
                "userDataSecret not set, bootstrap uses '{}' and converting back will set it explicitly",
                DEFAULT_USER_DATA_SECRET
            ));
            DEFAULT_USER_DATA_SECRET.to_string()
        }
    };

    let group = capi::MachineSet::new(
        ObjectMeta {
            name: name.clone(),
            namespace,
            labels: without_cluster_label(&machine_set.metadata.labels),
            annotations: machine_set.metadata.annotations.clone(),
        },
        capi::MachineSetSpec {
            replicas: machine_set.spec.replicas,
            selector: LabelSelector {
                match_labels: without_cluster_label(&machine_set.spec.selector.match_labels),
            },
            template: capi::MachineTemplateSpec {
                metadata: ObjectMeta::with_labels(without_cluster_label(&machine_set.spec.template.metadata.labels)),
                spec: capi::MachineSpec {
                    bootstrap: Bootstrap { data_secret_name: Some(data_secret_name) },
                    infrastructure_ref: ObjectReference {
                        api_version: capi::INFRASTRUCTURE_API_VERSION.to_string(),
                        kind: capi::AWS_MACHINE_TEMPLATE_KIND.to_string(),
                        name: template_name,
                        namespace: None,
                    },
                },
            },
        },
    );

    Ok((template, group))
}

/// Convert a single machine API machine into a template.
///
/// There is no group to rebuild it from, so this direction is one-way.
pub fn machine_to_capi(machine: &mapi::Machine) -> ConversionResult<AwsMachineTemplate> {
    let name = &machine.metadata.name;
    if name.is_empty() {
        return Err(ConversionError::incomplete("metadata.name"));
    }

    log_info(format!("Converting Machine '{}' to an AWSMachineTemplate", name));

    let config: AwsMachineProviderConfig = codec::decode(machine.spec.provider_spec.value.as_ref())?;
    let spec = fields::to_capi(&config)?;

    Ok(AwsMachineTemplate::new(
        ObjectMeta::named(template_name_for(name), machine.metadata.namespace.clone()),
        spec,
    ))
}

/// Machine API labels carry the cluster name, which has no place on the
/// cluster API side.
fn without_cluster_label(labels: &Labels) -> Labels {
    let mut labels = labels.clone();
    if let Some(cluster) = labels.remove(CLUSTER_LABEL) {
        log_warning(format!(
            "label {}={} dropped, supply the cluster name again when converting back",
            CLUSTER_LABEL, cluster
        ));
    }
    labels
}

// =============================================================================
// Reverse
// =============================================================================

/// Join a template and the group referencing it into a machine API machine set.
///
/// Both artifacts are required. The group's infrastructure reference and the
/// template's name must both equal [`template_name_for`] of the group name.
pub fn machine_set_to_mapi(
    template: Option<&AwsMachineTemplate>,
    group: Option<&capi::MachineSet>,
    context: &ClusterContext,
) -> ConversionResult<mapi::MachineSet> {
    let group = group.ok_or_else(|| ConversionError::MissingArtifact("cluster API MachineSet".to_string()))?;
    let template = template.ok_or_else(|| {
        ConversionError::MissingArtifact(format!("AWSMachineTemplate for MachineSet '{}'", group.metadata.name))
    })?;

    let expected = template_name_for(&group.metadata.name);
    let referenced = &group.spec.template.spec.infrastructure_ref.name;
    if *referenced != expected {
        return Err(ConversionError::MismatchedArtifact {
            expected,
            found: referenced.clone(),
        });
    }
    if template.metadata.name != expected {
        return Err(ConversionError::MismatchedArtifact {
            expected,
            found: template.metadata.name.clone(),
        });
    }

    log_info(format!("Converting MachineSet '{}' back to machine API", group.metadata.name));

    let mut config = fields::to_mapi(template.machine_spec(), context)?;
    config.user_data_secret = group
        .spec
        .template
        .spec
        .bootstrap
        .data_secret_name
        .clone()
        .map(|name| LocalObjectReference { name });
    let payload = codec::encode(&config)?;

    let cluster_name = context.cluster_name_or_placeholder();
    let with_cluster = |labels: &Labels| {
        let mut labels = labels.clone();
        labels.insert(CLUSTER_LABEL.to_string(), cluster_name.clone());
        labels
    };

    Ok(mapi::MachineSet::new(
        ObjectMeta {
            name: group.metadata.name.clone(),
            namespace: group.metadata.namespace.clone(),
            labels: with_cluster(&group.metadata.labels),
            annotations: group.metadata.annotations.clone(),
        },
        mapi::MachineSetSpec {
            replicas: group.spec.replicas,
            selector: LabelSelector {
                match_labels: with_cluster(&group.spec.selector.match_labels),
            },
            template: mapi::MachineTemplateSpec {
                metadata: ObjectMeta::with_labels(with_cluster(&group.spec.template.metadata.labels)),
                spec: mapi::MachineSpec {
                    metadata: ObjectMeta::default(),
                    provider_spec: mapi::ProviderSpec { value: Some(payload) },
                },
            },
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logs::test_support::{capture, has_warning};
    use crate::models::mapi::{
        AwsResourceReference, BlockDeviceMappingSpec, EbsBlockDeviceSpec, Placement, TagSpecification,
    };
    use pretty_assertions::assert_eq;

    fn provider_config() -> AwsMachineProviderConfig {
        AwsMachineProviderConfig {
            ami: AwsResourceReference::by_id("ami-123"),
            instance_type: "m5.large".into(),
            tags: vec![TagSpecification { name: "env".into(), value: "prod".into() }],
            placement: Placement {
                region: "us-east-1".into(),
                availability_zone: "us-east-1a".into(),
                ..Default::default()
            },
            block_devices: vec![BlockDeviceMappingSpec {
                device_name: None,
                ebs: Some(EbsBlockDeviceSpec {
                    volume_size: Some(100),
                    volume_type: Some("gp3".into()),
                    encrypted: Some(true),
                    ..Default::default()
                }),
            }],
            user_data_secret: Some(LocalObjectReference { name: "worker-user-data-managed".into() }),
            ..Default::default()
        }
    }

    fn labels(pairs: &[(&str, &str)]) -> Labels {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn machine_set(config: &AwsMachineProviderConfig) -> mapi::MachineSet {
        let cluster_labels = labels(&[(CLUSTER_LABEL, "prod-x7k2p"), ("role", "worker")]);
        mapi::MachineSet::new(
            ObjectMeta {
                name: "prod-x7k2p-worker-us-east-1a".into(),
                namespace: Some("openshift-machine-api".into()),
                labels: labels(&[(CLUSTER_LABEL, "prod-x7k2p")]),
                annotations: Labels::new(),
            },
            mapi::MachineSetSpec {
                replicas: Some(3),
                selector: LabelSelector { match_labels: cluster_labels.clone() },
                template: mapi::MachineTemplateSpec {
                    metadata: ObjectMeta::with_labels(cluster_labels),
                    spec: mapi::MachineSpec {
                        metadata: ObjectMeta::default(),
                        provider_spec: mapi::ProviderSpec { value: Some(codec::encode(config).unwrap()) },
                    },
                },
            },
        )
    }

    #[test]
    fn test_forward_group_scenario() {
        let (template, group) = machine_set_to_capi(&machine_set(&provider_config())).unwrap();

        let spec = template.machine_spec();
        assert_eq!(spec.ami.id.as_deref(), Some("ami-123"));
        assert_eq!(spec.additional_tags, labels(&[("env", "prod")]));
        assert_eq!(spec.root_volume.as_ref().unwrap().size, 100);
        assert_eq!(template.kind, capi::AWS_MACHINE_TEMPLATE_KIND);
        assert_eq!(template.metadata.namespace.as_deref(), Some("openshift-machine-api"));

        assert_eq!(group.spec.replicas, Some(3));
        assert_eq!(group.kind, capi::MACHINE_SET_KIND);
        assert_eq!(group.api_version, capi::API_VERSION);
        let infra = &group.spec.template.spec.infrastructure_ref;
        assert_eq!(infra.name, template.metadata.name);
        assert_eq!(infra.kind, capi::AWS_MACHINE_TEMPLATE_KIND);
        assert_eq!(infra.api_version, capi::INFRASTRUCTURE_API_VERSION);
        assert_eq!(
            group.spec.template.spec.bootstrap.data_secret_name.as_deref(),
            Some("worker-user-data-managed")
        );
        assert_eq!(group.spec.template.metadata.labels, labels(&[("role", "worker")]));
        assert!(!group.metadata.labels.contains_key(CLUSTER_LABEL));
    }

    #[test]
    fn test_template_name_derived_from_group_name() {
        let (template, group) = machine_set_to_capi(&machine_set(&provider_config())).unwrap();
        assert_eq!(template.metadata.name, template_name_for(&group.metadata.name));
        assert_eq!(template_name_for("a"), template_name_for("a"));
    }

    #[test]
    fn test_default_user_data_secret() {
        let config = AwsMachineProviderConfig { user_data_secret: None, ..provider_config() };
        let (converted, logs) = capture(|| machine_set_to_capi(&machine_set(&config)));
        let (_, group) = converted.unwrap();
        assert_eq!(
            group.spec.template.spec.bootstrap.data_secret_name.as_deref(),
            Some(DEFAULT_USER_DATA_SECRET)
        );
        assert!(has_warning(&logs, "userDataSecret not set"));
    }

    #[test]
    fn test_absent_user_data_secret_comes_back_explicit() {
        let config = AwsMachineProviderConfig { user_data_secret: None, ..provider_config() };
        let (template, group) = machine_set_to_capi(&machine_set(&config)).unwrap();
        let context = ClusterContext::new(Some("cluster-1".into()), Some("us-east-1".into()));
        let back = machine_set_to_mapi(Some(&template), Some(&group), &context).unwrap();

        let decoded: AwsMachineProviderConfig =
            codec::decode(back.spec.template.spec.provider_spec.value.as_ref()).unwrap();
        assert_eq!(
            decoded.user_data_secret,
            Some(LocalObjectReference { name: DEFAULT_USER_DATA_SECRET.to_string() })
        );
        assert_ne!(decoded.user_data_secret, config.user_data_secret);
    }

    #[test]
    fn test_forward_missing_payload() {
        let mut set = machine_set(&provider_config());
        set.spec.template.spec.provider_spec.value = None;
        let err = machine_set_to_capi(&set).unwrap_err();
        assert!(matches!(err, ConversionError::Decode(_)));
    }

    #[test]
    fn test_forward_requires_name() {
        let mut set = machine_set(&provider_config());
        set.metadata.name.clear();
        let err = machine_set_to_capi(&set).unwrap_err();
        assert!(matches!(err, ConversionError::IncompleteData { ref field } if field == "metadata.name"));
    }

    #[test]
    fn test_forward_empty_block_devices() {
        let config = AwsMachineProviderConfig { block_devices: vec![], ..provider_config() };
        let err = machine_set_to_capi(&machine_set(&config)).unwrap_err();
        assert!(matches!(err, ConversionError::IncompleteData { ref field } if field == "blockDevices"));
    }

    #[test]
    fn test_machine_to_template() {
        let machine = mapi::Machine {
            api_version: mapi::API_VERSION.into(),
            kind: mapi::MACHINE_KIND.into(),
            metadata: ObjectMeta::named("bootstrap-0", Some("openshift-machine-api".into())),
            spec: mapi::MachineSpec {
                metadata: ObjectMeta::default(),
                provider_spec: mapi::ProviderSpec { value: Some(codec::encode(&provider_config()).unwrap()) },
            },
        };
        let template = machine_to_capi(&machine).unwrap();
        assert_eq!(template.metadata.name, "bootstrap-0");
        assert_eq!(template.machine_spec().instance_type, "m5.large");
    }

    #[test]
    fn test_round_trip_with_cluster_context() {
        let config = provider_config();
        let original = machine_set(&config);
        let (template, group) = machine_set_to_capi(&original).unwrap();

        let context = ClusterContext::new(Some("prod-x7k2p".into()), Some("us-east-1".into()));
        let back = machine_set_to_mapi(Some(&template), Some(&group), &context).unwrap();

        assert_eq!(back.metadata, original.metadata);
        assert_eq!(back.spec.replicas, original.spec.replicas);
        assert_eq!(back.spec.selector, original.spec.selector);
        assert_eq!(back.spec.template.metadata, original.spec.template.metadata);

        let decoded: AwsMachineProviderConfig =
            codec::decode(back.spec.template.spec.provider_spec.value.as_ref()).unwrap();
        assert_eq!(decoded, config);
    }

    #[test]
    fn test_reverse_without_context_uses_placeholders() {
        let (template, group) = machine_set_to_capi(&machine_set(&provider_config())).unwrap();
        let (back, logs) =
            capture(|| machine_set_to_mapi(Some(&template), Some(&group), &ClusterContext::default()));
        let back = back.unwrap();

        assert_eq!(back.metadata.labels.get(CLUSTER_LABEL).map(String::as_str), Some(""));
        let decoded: AwsMachineProviderConfig =
            codec::decode(back.spec.template.spec.provider_spec.value.as_ref()).unwrap();
        assert_eq!(decoded.placement.region, "");
        assert!(has_warning(&logs, "cluster name not supplied"));
    }

    #[test]
    fn test_reverse_missing_template() {
        let (_, group) = machine_set_to_capi(&machine_set(&provider_config())).unwrap();
        let err = machine_set_to_mapi(None, Some(&group), &ClusterContext::default()).unwrap_err();
        assert!(matches!(err, ConversionError::MissingArtifact(_)));
    }

    #[test]
    fn test_reverse_missing_group() {
        let (template, _) = machine_set_to_capi(&machine_set(&provider_config())).unwrap();
        let err = machine_set_to_mapi(Some(&template), None, &ClusterContext::default()).unwrap_err();
        assert!(matches!(err, ConversionError::MissingArtifact(_)));
    }

    #[test]
    fn test_reverse_mismatched_template_name() {
        let (mut template, group) = machine_set_to_capi(&machine_set(&provider_config())).unwrap();
        template.metadata.name = "some-other-template".into();
        let err = machine_set_to_mapi(Some(&template), Some(&group), &ClusterContext::default()).unwrap_err();
        match err {
            ConversionError::MismatchedArtifact { expected, found } => {
                assert_eq!(expected, group.metadata.name);
                assert_eq!(found, "some-other-template");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_reverse_mismatched_infrastructure_ref() {
        let (template, mut group) = machine_set_to_capi(&machine_set(&provider_config())).unwrap();
        group.spec.template.spec.infrastructure_ref.name = "stale-template".into();
        let err = machine_set_to_mapi(Some(&template), Some(&group), &ClusterContext::default()).unwrap_err();
        assert!(matches!(err, ConversionError::MismatchedArtifact { ref found, .. } if found == "stale-template"));
    }
}
