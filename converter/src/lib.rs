//! # Machine converter - machine API ↔ cluster API for AWS machines
//!
//! Converts a machine API `MachineSet` (provider config inline) into a
//! cluster API `AWSMachineTemplate` plus `MachineSet`, and back.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  YAML file  │────▶│  Document   │────▶│  Dispatch   │────▶│  YAML docs  │
//! │ (multi-doc) │     │ (classify)  │     │ (aws, dir)  │     │ output-N    │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//!                                                │
//!                                   ┌────────────┴────────────┐
//!                                   │ Aggregate ─▶ Fields     │
//!                                   │ Codec (providerSpec)    │
//!                                   └─────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use machine_converter::{convert_file, ConvertOptions};
//! use std::path::Path;
//!
//! let output = convert_file(Path::new("machineset.yaml"), &ConvertOptions::default())?;
//! println!("Produced {} documents", output.documents.len());
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Machine API and cluster API schemas
//! - [`codec`] - Provider config payload encode/decode
//! - [`convert`] - Field mapping, aggregation, dispatch and pipeline
//! - [`document`] - YAML multi-document reading and writing
//! - [`logs`] - Conversion log stream

// Core modules
pub mod error;
pub mod models;

// Payloads and documents
pub mod codec;
pub mod document;

// Conversion
pub mod convert;

// Logging
pub mod logs;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    CodecError,
    ConversionError,
    DocumentError,
    PipelineError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    ObjectMeta,
    Resource,
};

pub use models::mapi::AwsMachineProviderConfig;
pub use models::capi::{AwsMachineSpec, AwsMachineTemplate};

// =============================================================================
// Re-exports - Conversion
// =============================================================================

pub use convert::{
    convert,
    providers,
    ClusterContext,
    ConverterRegistry,
    Direction,
    ProviderStrategy,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use convert::pipeline::{
    convert_bytes,
    convert_file,
    ConvertOptions,
    ConvertOutput,
};

pub use document::{parse_documents, render, write_outputs};
