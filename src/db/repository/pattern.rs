use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::DoctorPatterns;

/// Load a doctor's pattern document. A doctor with no history gets an
/// empty map, not an error.
pub fn load_patterns(conn: &Connection, doctor_id: &str) -> Result<DoctorPatterns, DatabaseError> {
    let document: Option<String> = conn
        .query_row(
            "SELECT document FROM symptom_patterns WHERE doctor_id = ?1",
            [doctor_id],
            |row| row.get(0),
        )
        .optional()?;

    match document {
        Some(json) => Ok(serde_json::from_str(&json)?),
        None => Ok(DoctorPatterns::default()),
    }
}

/// Current document version for a doctor (None before the first write).
pub(crate) fn pattern_version(
    conn: &Connection,
    doctor_id: &str,
) -> Result<Option<i64>, DatabaseError> {
    let version = conn
        .query_row(
            "SELECT version FROM symptom_patterns WHERE doctor_id = ?1",
            [doctor_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(version)
}

/// Read-modify-write a doctor's pattern document with a compare-and-swap
/// on the version column.
///
/// Does not open its own transaction, so a caller can bundle the write
/// with other statements (the aggregator pairs it with the history
/// insert). Without an enclosing transaction the CAS still holds: if
/// another connection bumped the version between the read and the
/// write, the update matches zero rows and surfaces as WriteConflict
/// instead of silently losing the other update.
pub fn update_patterns<F>(
    conn: &Connection,
    doctor_id: &str,
    apply: F,
) -> Result<(), DatabaseError>
where
    F: FnOnce(&mut DoctorPatterns),
{
    let existing: Option<(String, i64)> = conn
        .query_row(
            "SELECT document, version FROM symptom_patterns WHERE doctor_id = ?1",
            [doctor_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    let now = Utc::now().to_rfc3339();
    match existing {
        Some((json, version)) => {
            let mut patterns: DoctorPatterns = serde_json::from_str(&json)?;
            apply(&mut patterns);
            let updated = conn.execute(
                "UPDATE symptom_patterns SET document = ?1, version = ?2, updated_at = ?3
                 WHERE doctor_id = ?4 AND version = ?5",
                params![
                    serde_json::to_string(&patterns)?,
                    version + 1,
                    now,
                    doctor_id,
                    version
                ],
            )?;
            if updated == 0 {
                return Err(DatabaseError::WriteConflict {
                    doctor_id: doctor_id.to_string(),
                });
            }
        }
        None => {
            let mut patterns = DoctorPatterns::default();
            apply(&mut patterns);
            conn.execute(
                "INSERT INTO symptom_patterns (doctor_id, document, version, updated_at)
                 VALUES (?1, ?2, 1, ?3)",
                params![doctor_id, serde_json::to_string(&patterns)?, now],
            )?;
        }
    }

    Ok(())
}
