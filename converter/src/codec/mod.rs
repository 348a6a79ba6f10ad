//! Provider payload codec.
//!
//! Machine API resources embed their provider configuration as an opaque
//! payload (`spec.providerSpec.value`). This module turns that payload into
//! the typed provider config and back. Round trips are structural:
//! `decode(encode(x)) == x`, byte equality of the payload is not preserved.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{CodecError, CodecResult};
use crate::models::mapi::{self, AwsMachineProviderConfig, RawExtension};

/// A typed provider payload with its canonical type meta.
pub trait ProviderPayload: Serialize + DeserializeOwned {
    const API_VERSION: &'static str;
    const KIND: &'static str;
}

impl ProviderPayload for AwsMachineProviderConfig {
    const API_VERSION: &'static str = mapi::API_VERSION;
    const KIND: &'static str = mapi::PROVIDER_CONFIG_KIND;
}

/// Decode an embedded payload into its typed form.
///
/// Fails when the payload is absent, declares another kind, or does not
/// have the expected shape. A payload without a `kind` is accepted.
pub fn decode<T: ProviderPayload>(payload: Option<&RawExtension>) -> CodecResult<T> {
    let RawExtension(value) = payload.ok_or(CodecError::MissingPayload)?;

    if let Some(kind) = value.get("kind").and_then(Value::as_str) {
        if kind != T::KIND {
            return Err(CodecError::UnexpectedKind {
                expected: T::KIND.to_string(),
                found: kind.to_string(),
            });
        }
    }

    Ok(T::deserialize(value)?)
}

/// Encode a typed payload, stamping its canonical apiVersion and kind.
///
/// Only fails if the payload does not serialize to a JSON object, which
/// cannot happen for the provider configs defined in [`crate::models`].
pub fn encode<T: ProviderPayload>(config: &T) -> CodecResult<RawExtension> {
    let mut value = serde_json::to_value(config)?;
    match value.as_object_mut() {
        Some(object) => {
            object.insert("apiVersion".to_string(), Value::String(T::API_VERSION.to_string()));
            object.insert("kind".to_string(), Value::String(T::KIND.to_string()));
        }
        None => {
            return Err(CodecError::Malformed(serde::ser::Error::custom(
                "provider payload must serialize to an object",
            )))
        }
    }
    Ok(RawExtension(value))
}
