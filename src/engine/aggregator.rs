use chrono::{DateTime, Utc};
use rusqlite::{Connection, TransactionBehavior};
use uuid::Uuid;

use super::EngineError;
use crate::db::repository::{pattern, prescription};
use crate::db::DatabaseError;
use crate::models::{
    DoctorPatterns, MedicationOrder, MedicationPattern, PrescriptionInput, PrescriptionRecord,
    SymptomPattern,
};

/// Fold one finalized prescription into a doctor's pattern document.
///
/// Every symptom gets a SymptomPattern on first observation; every
/// medication matches by exact, case-sensitive name; a previously
/// unseen (dosage, frequency, duration) triple starts a new variant at
/// use count 1.
pub fn fold_prescription(
    patterns: &mut DoctorPatterns,
    symptoms: &[String],
    medications: &[MedicationOrder],
    now: DateTime<Utc>,
) {
    for symptom in symptoms {
        let entry = patterns
            .symptoms
            .entry(symptom.clone())
            .or_insert_with(|| SymptomPattern {
                symptom: symptom.clone(),
                medications: Vec::new(),
            });

        for order in medications {
            match entry.medications.iter_mut().find(|m| m.name == order.name) {
                Some(existing) => existing.record_use(order, now),
                None => entry
                    .medications
                    .push(MedicationPattern::from_order(order, now)),
            }
        }
    }
}

/// Persist a finalized prescription: append the history row and merge
/// it into the doctor's pattern document, in one transaction.
///
/// The immediate transaction serializes concurrent finalizations for
/// the same doctor; either both writes land or neither does. Returns
/// the id of the stored history record.
pub fn record_prescription(
    conn: &mut Connection,
    input: &PrescriptionInput,
) -> Result<Uuid, EngineError> {
    let now = Utc::now();
    let record = PrescriptionRecord {
        id: Uuid::new_v4(),
        doctor_id: input.doctor_id.clone(),
        patient_id: input.patient_id.clone(),
        symptoms: input.symptoms.clone(),
        ai_prescription: input.ai_prescription.clone(),
        final_prescription: input.final_prescription.clone(),
        created_at: now,
    };

    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(DatabaseError::from)?;
    prescription::insert_prescription(&tx, &record)?;
    pattern::update_patterns(&tx, &input.doctor_id, |patterns| {
        fold_prescription(patterns, &input.symptoms, &input.final_prescription, now)
    })?;
    tx.commit().map_err(DatabaseError::from)?;

    tracing::debug!(
        doctor_id = %input.doctor_id,
        prescription_id = %record.id,
        symptoms = record.symptoms.len(),
        "prescription recorded"
    );
    Ok(record.id)
}
