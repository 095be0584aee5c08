//! Presentation Exchange documents, as far as a verifier backend needs them.
//!
//! Full grammar validation of these documents is a concern of the caller
//! supplying them; here they are decoded structurally and embedded verbatim in
//! request objects.

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

/// A presentation definition articulates what proofs a
/// [Verifier](https://identity.foundation/presentation-exchange/spec/v2.0.0/#term:verifier)
/// requires of a
/// [Holder](https://identity.foundation/presentation-exchange/spec/v2.0.0/#term:holder).
///
/// See: [https://identity.foundation/presentation-exchange/spec/v2.0.0/#presentation-definition](https://identity.foundation/presentation-exchange/spec/v2.0.0/#presentation-definition)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PresentationDefinition {
    id: String,
    input_descriptors: Vec<InputDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    purpose: Option<String>,
}

impl PresentationDefinition {
    /// Decode a presentation definition from its JSON text form.
    ///
    /// Failure here means the text was present but not a valid document; the
    /// caller is responsible for treating absent input separately.
    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn new(id: String, input_descriptor: InputDescriptor) -> Self {
        Self {
            id,
            input_descriptors: vec![input_descriptor],
            name: None,
            purpose: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn input_descriptors(&self) -> &[InputDescriptor] {
        &self.input_descriptors
    }
}

/// One input the holder must satisfy, with constraints on the claims it
/// carries.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InputDescriptor {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    /// Claim format designations the verifier can process, kept as supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<Json>,
    pub constraints: Constraints,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<ConstraintsField>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit_disclosure: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConstraintsField {
    /// JSONPath expressions locating the claim in a credential.
    pub path: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    /// JSON Schema the located value must match, kept as supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Json>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,
}

/// How the holder's presentation maps back onto the definition it answers.
///
/// See: [https://identity.foundation/presentation-exchange/spec/v2.0.0/#presentation-submission](https://identity.foundation/presentation-exchange/spec/v2.0.0/#presentation-submission)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PresentationSubmission {
    pub id: String,
    pub definition_id: String,
    pub descriptor_map: Vec<DescriptorMap>,
}

impl PresentationSubmission {
    /// Decode a presentation submission from its JSON text form.
    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DescriptorMap {
    pub id: String,
    pub format: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_nested: Option<Box<DescriptorMap>>,
}
