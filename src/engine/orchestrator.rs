use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::aggregator;
use super::gemini::{GenerationClient, GenerationConfig};
use super::preference;
use super::prompt::{build_diagnosis_prompt, build_personalized_prompt};
use super::ranker::rank_medications;
use super::validator::{parse_diagnosis, parse_suggestions};
use super::EngineError;
use crate::db::repository::pattern;
use crate::models::{PrescriptionInput, RecommendationCandidate, SuggestedMedication};

/// A request for AI prescription suggestions.
#[derive(Debug, Clone, Deserialize)]
pub struct SuggestionRequest {
    pub doctor_id: String,
    pub doctor_name: String,
    pub symptoms: Vec<String>,
}

/// Which prompt contract produced the response. The variant is chosen
/// by the engine before the generation call, never inferred from the
/// response shape. Serialized untagged so callers receive the plain
/// `{suggestions}` or `{diagnosis, medicines}` body.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum SuggestionResponse {
    Personalized {
        suggestions: Vec<SuggestedMedication>,
    },
    Diagnosis {
        diagnosis: String,
        medicines: Vec<SuggestedMedication>,
    },
}

/// Facade over the engine: the write path (aggregate a finalized
/// prescription) and the read path (rank, prompt, generate, validate).
/// The two paths share no synchronous dependency; ranking only sees
/// what aggregation has already persisted.
pub struct RecommendationEngine {
    client: Box<dyn GenerationClient + Send + Sync>,
}

impl RecommendationEngine {
    pub fn new(client: Box<dyn GenerationClient + Send + Sync>) -> Self {
        Self { client }
    }

    /// Record a finalized prescription into history and patterns.
    pub fn record_prescription(
        &self,
        conn: &mut Connection,
        input: &PrescriptionInput,
    ) -> Result<Uuid, EngineError> {
        aggregator::record_prescription(conn, input)
    }

    /// Rank the doctor's historical medications for the given symptoms.
    pub fn rank(
        &self,
        conn: &Connection,
        doctor_id: &str,
        symptoms: &[String],
    ) -> Result<Vec<RecommendationCandidate>, EngineError> {
        let patterns = pattern::load_patterns(conn, doctor_id)?;
        Ok(rank_medications(&patterns, symptoms))
    }

    /// Produce a validated suggestion set for the request.
    ///
    /// With personalized history the model is steered by the doctor's
    /// own patterns; a fresh doctor falls back to the symptom-only
    /// diagnosis contract.
    pub fn suggest(
        &self,
        conn: &Connection,
        request: &SuggestionRequest,
    ) -> Result<SuggestionResponse, EngineError> {
        let candidates = self.rank(conn, &request.doctor_id, &request.symptoms)?;

        if candidates.is_empty() {
            tracing::info!(
                doctor_id = %request.doctor_id,
                "no personalized history; using diagnosis prompt"
            );
            let prompt = build_diagnosis_prompt(&request.symptoms);
            let raw = self.client.generate(&prompt, &GenerationConfig::diagnosis())?;
            let assessment = parse_diagnosis(&raw)?;
            return Ok(SuggestionResponse::Diagnosis {
                diagnosis: assessment.diagnosis,
                medicines: assessment.medicines,
            });
        }

        tracing::info!(
            doctor_id = %request.doctor_id,
            candidates = candidates.len(),
            "using personalized prompt"
        );
        let prompt =
            build_personalized_prompt(&request.doctor_name, &request.symptoms, &candidates);
        let raw = self
            .client
            .generate(&prompt, &GenerationConfig::personalized())?;
        let suggestions = parse_suggestions(&raw)?;
        Ok(SuggestionResponse::Personalized { suggestions })
    }

    /// Frequency-ranked medication names from recent history.
    pub fn frequent_medications(
        &self,
        conn: &Connection,
        doctor_id: &str,
        symptom: Option<&str>,
    ) -> Result<Vec<String>, EngineError> {
        preference::frequent_medications(conn, doctor_id, symptom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use crate::engine::gemini::MockGenerationClient;
    use crate::models::MedicationOrder;

    fn request(doctor_id: &str) -> SuggestionRequest {
        SuggestionRequest {
            doctor_id: doctor_id.into(),
            doctor_name: "Chen".into(),
            symptoms: vec!["fever".into()],
        }
    }

    fn fever_prescription(doctor_id: &str) -> PrescriptionInput {
        PrescriptionInput {
            doctor_id: doctor_id.into(),
            patient_id: "pat-1".into(),
            symptoms: vec!["fever".into()],
            ai_prescription: vec![],
            final_prescription: vec![MedicationOrder {
                name: "Paracetamol".into(),
                dosage: "500mg".into(),
                frequency: "6h".into(),
                duration: "3d".into(),
            }],
        }
    }

    #[test]
    fn fresh_doctor_falls_back_to_diagnosis_prompt() {
        let conn = open_memory_database().unwrap();
        let mock = MockGenerationClient::new(
            r#"{"diagnosis":"Viral fever","medicines":[{"name":"Paracetamol","dosage":"500mg"}]}"#,
        );
        let log = mock.prompt_log();
        let engine = RecommendationEngine::new(Box::new(mock));

        let response = engine.suggest(&conn, &request("fresh-doc")).unwrap();
        match response {
            SuggestionResponse::Diagnosis { diagnosis, medicines } => {
                assert_eq!(diagnosis, "Viral fever");
                assert_eq!(medicines.len(), 1);
            }
            other => panic!("expected diagnosis response, got {other:?}"),
        }

        let prompts = log.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("clinical assessment"));
    }

    #[test]
    fn doctor_with_history_gets_personalized_prompt() {
        let mut conn = open_memory_database().unwrap();
        let mock = MockGenerationClient::new(
            "```json\n[{\"name\":\"Paracetamol\",\"dosage\":\"500mg\",\"frequency\":\"6h\",\"duration\":\"3d\"}]\n```",
        );
        let log = mock.prompt_log();
        let engine = RecommendationEngine::new(Box::new(mock));

        engine
            .record_prescription(&mut conn, &fever_prescription("doc-1"))
            .unwrap();

        let response = engine.suggest(&conn, &request("doc-1")).unwrap();
        match response {
            SuggestionResponse::Personalized { suggestions } => {
                assert_eq!(suggestions.len(), 1);
                assert_eq!(suggestions[0].name, "Paracetamol");
            }
            other => panic!("expected personalized response, got {other:?}"),
        }

        let prompts = log.lock().unwrap();
        assert!(prompts[0].contains("Dr. Chen's prescription history"));
        assert!(prompts[0].contains("Prescribed 1 times"));
    }

    #[test]
    fn personalized_path_with_unparseable_output_fails_loudly() {
        let mut conn = open_memory_database().unwrap();
        let engine =
            RecommendationEngine::new(Box::new(MockGenerationClient::new("I am not JSON")));
        engine
            .record_prescription(&mut conn, &fever_prescription("doc-1"))
            .unwrap();

        let err = engine.suggest(&conn, &request("doc-1")).unwrap_err();
        assert!(matches!(err, EngineError::InvalidGenerationOutput { .. }));
    }

    #[test]
    fn transport_failure_propagates_as_unavailable() {
        let conn = open_memory_database().unwrap();
        let engine = RecommendationEngine::new(Box::new(MockGenerationClient::unavailable(
            "connection refused",
        )));

        let err = engine.suggest(&conn, &request("fresh-doc")).unwrap_err();
        assert!(matches!(err, EngineError::GenerationUnavailable(_)));
    }

    #[test]
    fn malformed_element_is_filtered_not_fatal() {
        let mut conn = open_memory_database().unwrap();
        let engine = RecommendationEngine::new(Box::new(MockGenerationClient::new(
            "```json\n[{\"name\":\"X\"}]\n```",
        )));
        engine
            .record_prescription(&mut conn, &fever_prescription("doc-1"))
            .unwrap();

        let response = engine.suggest(&conn, &request("doc-1")).unwrap();
        match response {
            SuggestionResponse::Personalized { suggestions } => assert!(suggestions.is_empty()),
            other => panic!("expected personalized response, got {other:?}"),
        }
    }

    #[test]
    fn responses_serialize_to_the_wire_contracts() {
        let personalized = SuggestionResponse::Personalized {
            suggestions: vec![],
        };
        assert_eq!(
            serde_json::to_string(&personalized).unwrap(),
            r#"{"suggestions":[]}"#
        );

        let diagnosis = SuggestionResponse::Diagnosis {
            diagnosis: "flu".into(),
            medicines: vec![],
        };
        assert_eq!(
            serde_json::to_string(&diagnosis).unwrap(),
            r#"{"diagnosis":"flu","medicines":[]}"#
        );
    }

    #[test]
    fn write_and_read_paths_compose() {
        let mut conn = open_memory_database().unwrap();
        let engine = RecommendationEngine::new(Box::new(MockGenerationClient::new("[]")));

        for _ in 0..3 {
            engine
                .record_prescription(&mut conn, &fever_prescription("doc-1"))
                .unwrap();
        }

        let candidates = engine.rank(&conn, "doc-1", &["fever".into()]).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].count, 3);

        let frequent = engine.frequent_medications(&conn, "doc-1", None).unwrap();
        assert_eq!(frequent, vec!["Paracetamol".to_string()]);
    }
}
