use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::{MedicationOrder, PrescriptionRecord};

/// Append one finalized prescription to the doctor's history.
pub fn insert_prescription(
    conn: &Connection,
    record: &PrescriptionRecord,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO prescriptions (id, doctor_id, patient_id, symptoms, ai_prescription,
         final_prescription, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            record.id.to_string(),
            record.doctor_id,
            record.patient_id,
            serde_json::to_string(&record.symptoms)?,
            serde_json::to_string(&record.ai_prescription)?,
            serde_json::to_string(&record.final_prescription)?,
            record.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

/// The doctor's most recent prescriptions, newest first.
pub fn recent_prescriptions(
    conn: &Connection,
    doctor_id: &str,
    limit: u32,
) -> Result<Vec<PrescriptionRecord>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, doctor_id, patient_id, symptoms, ai_prescription, final_prescription, created_at
         FROM prescriptions WHERE doctor_id = ?1
         ORDER BY created_at DESC LIMIT ?2",
    )?;

    let rows = stmt.query_map(params![doctor_id, limit], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, String>(5)?,
            row.get::<_, String>(6)?,
        ))
    })?;

    let mut records = Vec::new();
    for row in rows {
        let (id, doctor_id, patient_id, symptoms, ai, fin, created_at) = row?;
        records.push(PrescriptionRecord {
            id: Uuid::parse_str(&id)
                .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
            doctor_id,
            patient_id,
            symptoms: serde_json::from_str(&symptoms)?,
            ai_prescription: serde_json::from_str::<Vec<MedicationOrder>>(&ai)?,
            final_prescription: serde_json::from_str::<Vec<MedicationOrder>>(&fin)?,
            created_at: DateTime::parse_from_rfc3339(&created_at)
                .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?
                .with_timezone(&Utc),
        });
    }
    Ok(records)
}
