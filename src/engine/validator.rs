use serde_json::Value;

use super::EngineError;
use crate::models::SuggestedMedication;

/// Validated output of the diagnosis-oriented prompt path.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DiagnosisAssessment {
    pub diagnosis: String,
    pub medicines: Vec<SuggestedMedication>,
}

/// Strip a leading ```json / ``` fence and a trailing ``` fence.
///
/// Prefix/suffix removal only; anything fancier than one fenced block
/// is left for the JSON parser to reject.
fn strip_code_fence(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```json") {
        text = rest;
    } else if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

fn parse_json(raw: &str, expected: &'static str) -> Result<Value, EngineError> {
    serde_json::from_str(strip_code_fence(raw)).map_err(|e| {
        tracing::warn!(error = %e, raw_len = raw.len(), "generation output failed to parse");
        EngineError::InvalidGenerationOutput {
            expected,
            reason: e.to_string(),
            raw: raw.to_string(),
        }
    })
}

/// Parse elements leniently; anything that fails to deserialize
/// (missing `name` or `dosage`) is dropped rather than failing the
/// batch.
fn parse_medications_lenient(items: &[Value]) -> Vec<SuggestedMedication> {
    let kept: Vec<SuggestedMedication> = items
        .iter()
        .filter_map(|v| serde_json::from_value(v.clone()).ok())
        .collect();
    if kept.len() < items.len() {
        tracing::warn!(
            dropped = items.len() - kept.len(),
            total = items.len(),
            "dropped malformed medication entries from generation output"
        );
    }
    kept
}

/// Parse the personalized path's output: a JSON array of medication
/// objects.
///
/// A zero-survivor array is still a success; an unparseable text never
/// is. The two cases must stay distinguishable for the caller.
pub fn parse_suggestions(raw: &str) -> Result<Vec<SuggestedMedication>, EngineError> {
    let value = parse_json(raw, "suggestion array")?;
    let Value::Array(items) = value else {
        return Err(EngineError::InvalidGenerationOutput {
            expected: "suggestion array",
            reason: "top-level value is not an array".into(),
            raw: raw.to_string(),
        });
    };
    Ok(parse_medications_lenient(&items))
}

/// Parse the diagnosis path's output: an object with a string
/// `diagnosis` and a `medicines` array.
pub fn parse_diagnosis(raw: &str) -> Result<DiagnosisAssessment, EngineError> {
    let value = parse_json(raw, "diagnosis object")?;
    let fields = match &value {
        Value::Object(map) => {
            let diagnosis = map.get("diagnosis").and_then(Value::as_str);
            let medicines = map.get("medicines").and_then(Value::as_array);
            diagnosis.zip(medicines)
        }
        _ => None,
    };

    match fields {
        Some((diagnosis, medicines)) => Ok(DiagnosisAssessment {
            diagnosis: diagnosis.to_string(),
            medicines: parse_medications_lenient(medicines),
        }),
        None => Err(EngineError::InvalidGenerationOutput {
            expected: "diagnosis object",
            reason: "missing `diagnosis` string or `medicines` array".into(),
            raw: raw.to_string(),
        }),
    }
}
