//! Provider and direction selection.
//!
//! Providers are looked up in a [`ConverterRegistry`] keyed by provider id.
//! Each entry is a [`ProviderStrategy`] exposing both directions, so adding a
//! provider means registering one more strategy.

use once_cell::sync::Lazy;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{ConversionError, ConversionResult};
use crate::models::capi::{AwsMachineTemplate, MachineSet as CapiMachineSet};
use crate::models::Resource;

use super::aggregate;
use super::context::ClusterContext;

/// Conversion direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Machine API → cluster API (`capi`).
    ToCapi,
    /// Cluster API → machine API (`mapi`).
    ToMapi,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::ToCapi => "capi",
            Direction::ToMapi => "mapi",
        }
    }
}

impl FromStr for Direction {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "capi" => Ok(Direction::ToCapi),
            "mapi" => Ok(Direction::ToMapi),
            _ => Err(ConversionError::UnsupportedDirection(s.to_string())),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Forward and reverse conversion for one cloud provider.
pub trait ProviderStrategy: Send + Sync {
    /// Provider id used for lookup, e.g. `aws`.
    fn id(&self) -> &'static str;

    /// Machine API resources → cluster API resources.
    fn to_capi(&self, input: &[Resource]) -> ConversionResult<Vec<Resource>>;

    /// Cluster API resources → machine API resources.
    fn to_mapi(&self, input: &[Resource], context: &ClusterContext) -> ConversionResult<Vec<Resource>>;
}

/// AWS conversion.
///
/// Forward accepts one `MachineSet` (yielding template then group) or one
/// `Machine` (yielding a template). Reverse accepts a template and a group
/// in either order.
pub struct AwsStrategy;

impl ProviderStrategy for AwsStrategy {
    fn id(&self) -> &'static str {
        "aws"
    }

    fn to_capi(&self, input: &[Resource]) -> ConversionResult<Vec<Resource>> {
        match input {
            [] => Err(ConversionError::MissingArtifact(
                "machine API Machine or MachineSet".to_string(),
            )),
            [Resource::MapiMachineSet(machine_set)] => {
                let (template, group) = aggregate::machine_set_to_capi(machine_set)?;
                Ok(vec![Resource::AwsMachineTemplate(template), Resource::CapiMachineSet(group)])
            }
            [Resource::MapiMachine(machine)] => {
                let template = aggregate::machine_to_capi(machine)?;
                Ok(vec![Resource::AwsMachineTemplate(template)])
            }
            [other] => Err(ConversionError::UnexpectedInput(format!(
                "cannot convert {} to cluster API",
                other.describe()
            ))),
            _ => Err(ConversionError::UnexpectedInput(format!(
                "expected a single machine API resource, got {}",
                input.len()
            ))),
        }
    }

    fn to_mapi(&self, input: &[Resource], context: &ClusterContext) -> ConversionResult<Vec<Resource>> {
        let mut template: Option<&AwsMachineTemplate> = None;
        let mut group: Option<&CapiMachineSet> = None;

        for resource in input {
            match resource {
                Resource::AwsMachineTemplate(t) if template.is_none() => template = Some(t),
                Resource::CapiMachineSet(g) if group.is_none() => group = Some(g),
                Resource::AwsMachineTemplate(_) | Resource::CapiMachineSet(_) => {
                    return Err(ConversionError::UnexpectedInput(format!(
                        "more than one {} supplied",
                        resource.describe()
                    )))
                }
                other => {
                    return Err(ConversionError::UnexpectedInput(format!(
                        "cannot convert {} to machine API",
                        other.describe()
                    )))
                }
            }
        }

        let machine_set = aggregate::machine_set_to_mapi(template, group, context)?;
        Ok(vec![Resource::MapiMachineSet(machine_set)])
    }
}

/// Registry of provider strategies.
pub struct ConverterRegistry {
    strategies: BTreeMap<&'static str, Box<dyn ProviderStrategy>>,
}

impl ConverterRegistry {
    /// Registry with no providers.
    pub fn empty() -> Self {
        Self { strategies: BTreeMap::new() }
    }

    /// Registry with every built-in provider.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(AwsStrategy));
        registry
    }

    /// Add or replace a strategy.
    pub fn register(&mut self, strategy: Box<dyn ProviderStrategy>) {
        self.strategies.insert(strategy.id(), strategy);
    }

    /// Registered provider ids, sorted.
    pub fn providers(&self) -> Vec<&'static str> {
        self.strategies.keys().copied().collect()
    }

    /// Look up a strategy by its exact provider id.
    pub fn get(&self, provider: &str) -> ConversionResult<&dyn ProviderStrategy> {
        self.strategies
            .get(provider)
            .map(|s| s.as_ref())
            .ok_or_else(|| ConversionError::UnsupportedProvider(provider.to_string()))
    }

    /// Select provider and direction, then convert.
    ///
    /// The provider is resolved first: an unknown provider is reported as
    /// such whatever the direction.
    pub fn convert(
        &self,
        provider: &str,
        direction: &str,
        input: &[Resource],
        context: &ClusterContext,
    ) -> ConversionResult<Vec<Resource>> {
        let strategy = self.get(provider)?;
        match direction.parse::<Direction>()? {
            Direction::ToCapi => strategy.to_capi(input),
            Direction::ToMapi => strategy.to_mapi(input, context),
        }
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

static DEFAULT_REGISTRY: Lazy<ConverterRegistry> = Lazy::new(ConverterRegistry::new);

/// Convert with the built-in providers.
pub fn convert(
    provider: &str,
    direction: &str,
    input: &[Resource],
    context: &ClusterContext,
) -> ConversionResult<Vec<Resource>> {
    DEFAULT_REGISTRY.convert(provider, direction, input, context)
}

/// Ids of the built-in providers.
pub fn providers() -> Vec<&'static str> {
    DEFAULT_REGISTRY.providers()
}
