use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::medication::MedicationOrder;

/// One finalized prescription event. Append-only: written once when the
/// doctor signs off, never mutated or deleted afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrescriptionRecord {
    pub id: Uuid,
    pub doctor_id: String,
    pub patient_id: String,
    pub symptoms: Vec<String>,
    /// What the model proposed before the doctor edited it.
    pub ai_prescription: Vec<MedicationOrder>,
    /// What the doctor actually signed off on.
    pub final_prescription: Vec<MedicationOrder>,
    pub created_at: DateTime<Utc>,
}

/// Caller-supplied payload when a doctor finalizes a prescription.
#[derive(Debug, Clone, Deserialize)]
pub struct PrescriptionInput {
    pub doctor_id: String,
    pub patient_id: String,
    pub symptoms: Vec<String>,
    #[serde(default)]
    pub ai_prescription: Vec<MedicationOrder>,
    pub final_prescription: Vec<MedicationOrder>,
}
