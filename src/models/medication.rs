use serde::{Deserialize, Serialize};

/// One administered medication inside a finalized prescription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicationOrder {
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub duration: String,
}

/// One medication proposed by the generative model.
///
/// `name` and `dosage` are the minimum contract; entries missing either
/// are dropped by the validator. A model that omits frequency or
/// duration still produces a usable entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedMedication {
    pub name: String,
    pub dosage: String,
    #[serde(default)]
    pub frequency: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}
