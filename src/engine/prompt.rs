use crate::models::RecommendationCandidate;

/// Prompt for the personalized path: the doctor's historical patterns
/// plus the current symptoms, ending in a literal output contract for a
/// JSON array of medication objects.
///
/// Pure string construction; identical inputs produce identical prompts.
pub fn build_personalized_prompt(
    doctor_name: &str,
    symptoms: &[String],
    candidates: &[RecommendationCandidate],
) -> String {
    let history = candidates
        .iter()
        .map(|c| {
            format!(
                "- {}:\n  * Prescribed {} times\n  * Typical dosage: {}\n  * Usually given: {}\n  * Common duration: {}",
                c.name, c.count, c.dosage, c.frequency, c.duration
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Based on Dr. {doctor_name}'s prescription history:

Current Symptoms: {symptoms}

Most frequently prescribed medications for these symptoms:
{history}

Generate a prescription following these patterns and current medical best practices.
Return ONLY a JSON array with this structure, with no prose before or after it:
[
  {{
    "name": "Medicine Name",
    "dosage": "Dosage",
    "frequency": "Frequency",
    "duration": "Duration",
    "notes": "Special instructions"
  }}
]"#,
        symptoms = symptoms.join(", "),
    )
}

/// Prompt for the diagnosis path, used when no personalized history
/// exists: a symptom-only clinical assessment with an object contract
/// carrying `diagnosis` and `medicines`.
pub fn build_diagnosis_prompt(symptoms: &[String]) -> String {
    format!(
        r#"Given the following symptoms: {symptoms}, provide a clinical assessment that includes:
1. A likely medical diagnosis based on the presented symptoms
2. A list of appropriate medicines with their dosage, frequency, duration, and any specific notes relevant to administration

Format the output strictly as a JSON object using the structure below:
{{
  "diagnosis": "clear and concise medical diagnosis",
  "medicines": [
    {{
      "name": "medicine name",
      "dosage": "e.g. 500mg",
      "frequency": "e.g. twice daily",
      "duration": "e.g. 5 days",
      "notes": "specific administration instructions, if any (avoid general health warnings)"
    }}
  ]
}}

This output will be reviewed by a supervising physician; no general health disclaimers, warnings, or follow-up advice should be included. Respond only with the JSON object and no additional text."#,
        symptoms = symptoms.join(", "),
    )
}
