//! File-level conversion: YAML in, YAML out.
//!
//! # Example
//!
//! ```rust,ignore
//! use machine_converter::convert::pipeline::{convert_file, ConvertOptions};
//! use std::path::Path;
//!
//! let result = convert_file(Path::new("machineset.yaml"), &ConvertOptions::default())?;
//! for document in &result.documents {
//!     println!("---\n{}", document);
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::document;
use crate::error::PipelineResult;
use crate::logs::{log_error, log_info, log_info_indent, log_success};
use crate::models::Resource;

use super::context::ClusterContext;
use super::dispatch;

/// Options for one conversion run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertOptions {
    /// Cloud provider id.
    pub provider: String,

    /// Target API: `capi` or `mapi`.
    pub direction: String,

    /// Cluster name restored on the reverse path.
    #[serde(default)]
    pub cluster_name: Option<String>,

    /// Region restored on the reverse path.
    #[serde(default)]
    pub region: Option<String>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            provider: "aws".to_string(),
            direction: "capi".to_string(),
            cluster_name: None,
            region: None,
        }
    }
}

impl ConvertOptions {
    pub fn context(&self) -> ClusterContext {
        ClusterContext::new(self.cluster_name.clone(), self.region.clone())
    }
}

/// Outcome of a conversion run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConvertOutput {
    /// Converted resources, in output order.
    pub resources: Vec<Resource>,

    /// Each resource rendered as its own YAML document.
    pub documents: Vec<String>,
}

/// Convert a YAML file.
pub fn convert_file(path: &Path, options: &ConvertOptions) -> PipelineResult<ConvertOutput> {
    log_info(format!("Reading {}", path.display()));
    let bytes = std::fs::read(path).map_err(crate::error::DocumentError::from)?;
    convert_bytes(&bytes, options)
}

/// Convert YAML bytes.
pub fn convert_bytes(bytes: &[u8], options: &ConvertOptions) -> PipelineResult<ConvertOutput> {
    let input = document::parse_bytes(bytes)?;
    log_info(format!(
        "Converting {} document(s) to {} for provider {}",
        input.len(),
        options.direction,
        options.provider
    ));
    for resource in &input {
        log_info_indent(format!("{} {}", resource.describe(), resource.metadata().name), 1);
    }

    let resources = dispatch::convert(&options.provider, &options.direction, &input, &options.context())
        .map_err(|e| {
            log_error(format!("Conversion failed: {}", e));
            e
        })?;

    let documents = resources
        .iter()
        .map(document::render)
        .collect::<Result<Vec<_>, _>>()?;

    log_success(format!("Produced {} document(s)", documents.len()));
    Ok(ConvertOutput { resources, documents })
}
