use std::collections::HashMap;

use rusqlite::Connection;

use super::EngineError;
use crate::db::repository::prescription;

/// How many recent prescriptions feed the preference query.
pub const PREFERENCE_WINDOW: u32 = 10;

/// Frequency-ranked medication names from the doctor's most recent
/// prescriptions. A simpler read path than the symptom-pattern
/// aggregate: it looks only at the raw history window.
///
/// An optional symptom filter restricts the window to prescriptions
/// whose symptom list contains that symptom. Ties rank
/// lexicographically.
pub fn frequent_medications(
    conn: &Connection,
    doctor_id: &str,
    symptom: Option<&str>,
) -> Result<Vec<String>, EngineError> {
    let records = prescription::recent_prescriptions(conn, doctor_id, PREFERENCE_WINDOW)?;

    let mut frequency: HashMap<String, u32> = HashMap::new();
    for record in &records {
        if let Some(filter) = symptom {
            if !record.symptoms.iter().any(|s| s == filter) {
                continue;
            }
        }
        for order in &record.final_prescription {
            *frequency.entry(order.name.clone()).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<(String, u32)> = frequency.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    Ok(ranked.into_iter().map(|(name, _)| name).collect())
}
