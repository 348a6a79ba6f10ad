//! Conversion between machine API and cluster API resources.
//!
//! - Fields: provider config ↔ AWS machine spec
//! - Aggregate: machine set ↔ (template, machine set)
//! - Dispatch: provider and direction selection
//! - Pipeline: YAML in, YAML out

pub mod aggregate;
pub mod context;
pub mod dispatch;
pub mod fields;
pub mod pipeline;

pub use aggregate::{machine_set_to_capi, machine_set_to_mapi, machine_to_capi, template_name_for};
pub use context::ClusterContext;
pub use dispatch::{convert, providers, AwsStrategy, ConverterRegistry, Direction, ProviderStrategy};
pub use pipeline::{convert_bytes, convert_file, ConvertOptions, ConvertOutput};
