//! YAML document reading and writing.
//!
//! Input files hold one or more `---` separated documents. Each document is
//! classified by `apiVersion` and `kind` into a typed [`Resource`].

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_yaml::Value;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{DocumentError, DocumentResult};
use crate::models::{capi, mapi, Resource};

/// Parse every document in `content`.
///
/// Empty documents (a bare `---`) are skipped. Input with no documents at all
/// is an error.
pub fn parse_documents(content: &str) -> DocumentResult<Vec<Resource>> {
    let mut resources = Vec::new();

    for (index, document) in serde_yaml::Deserializer::from_str(content).enumerate() {
        let value = Value::deserialize(document)?;
        if value.is_null() {
            continue;
        }
        resources.push(classify(index, value)?);
    }

    if resources.is_empty() {
        return Err(DocumentError::Empty);
    }
    Ok(resources)
}

/// Parse raw bytes. Invalid UTF-8 is replaced rather than rejected.
pub fn parse_bytes(bytes: &[u8]) -> DocumentResult<Vec<Resource>> {
    parse_documents(&String::from_utf8_lossy(bytes))
}

/// Read and parse a file.
pub fn read_file(path: &Path) -> DocumentResult<Vec<Resource>> {
    let bytes = fs::read(path)?;
    parse_bytes(&bytes)
}

fn classify(index: usize, value: Value) -> DocumentResult<Resource> {
    let kind = match value.get("kind").and_then(Value::as_str) {
        Some(kind) => kind.to_string(),
        None => return Err(DocumentError::MissingKind { index }),
    };
    let api_version = value
        .get("apiVersion")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let resource = match (api_version.as_str(), kind.as_str()) {
        (mapi::API_VERSION, mapi::MACHINE_KIND) => Resource::MapiMachine(typed(value)?),
        (mapi::API_VERSION, mapi::MACHINE_SET_KIND) => Resource::MapiMachineSet(typed(value)?),
        (capi::API_VERSION, capi::MACHINE_SET_KIND) => Resource::CapiMachineSet(typed(value)?),
        (capi::INFRASTRUCTURE_API_VERSION, capi::AWS_MACHINE_TEMPLATE_KIND) => {
            Resource::AwsMachineTemplate(typed(value)?)
        }
        _ => {
            return Err(DocumentError::UnknownKind {
                index,
                api_version,
                kind,
            })
        }
    };
    Ok(resource)
}

fn typed<T: DeserializeOwned>(value: Value) -> DocumentResult<T> {
    Ok(serde_yaml::from_value(value)?)
}

/// Render one resource as a YAML document.
pub fn render(resource: &Resource) -> DocumentResult<String> {
    Ok(serde_yaml::to_string(resource)?)
}

/// Write each document to `dir/output-<i>.yaml`, numbered from zero.
///
/// Returns the written paths in order. The directory is created if needed.
pub fn write_outputs(dir: &Path, documents: &[String]) -> DocumentResult<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;

    let mut written = Vec::with_capacity(documents.len());
    for (i, document) in documents.iter().enumerate() {
        let path = dir.join(format!("output-{}.yaml", i));
        fs::write(&path, document)?;
        written.push(path);
    }
    Ok(written)
}
