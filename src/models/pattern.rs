use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::medication::MedicationOrder;

/// One concrete (dosage, frequency, duration) triple and how many times
/// it was prescribed. The triple is unique within its parent
/// MedicationPattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DosagePattern {
    pub dosage: String,
    pub frequency: String,
    pub duration: String,
    pub use_count: u32,
}

impl DosagePattern {
    pub fn matches(&self, order: &MedicationOrder) -> bool {
        self.dosage == order.dosage
            && self.frequency == order.frequency
            && self.duration == order.duration
    }
}

/// Aggregate of one medication's use under a single symptom.
/// Invariant: `count` equals the sum of all variant use counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicationPattern {
    pub name: String,
    pub count: u32,
    pub last_used: DateTime<Utc>,
    pub patterns: Vec<DosagePattern>,
}

impl MedicationPattern {
    pub fn from_order(order: &MedicationOrder, now: DateTime<Utc>) -> Self {
        Self {
            name: order.name.clone(),
            count: 1,
            last_used: now,
            patterns: vec![DosagePattern {
                dosage: order.dosage.clone(),
                frequency: order.frequency.clone(),
                duration: order.duration.clone(),
                use_count: 1,
            }],
        }
    }

    /// Fold one more use of this medication into the aggregate.
    pub fn record_use(&mut self, order: &MedicationOrder, now: DateTime<Utc>) {
        self.count += 1;
        self.last_used = now;
        match self.patterns.iter_mut().find(|p| p.matches(order)) {
            Some(variant) => variant.use_count += 1,
            None => self.patterns.push(DosagePattern {
                dosage: order.dosage.clone(),
                frequency: order.frequency.clone(),
                duration: order.duration.clone(),
                use_count: 1,
            }),
        }
    }
}

/// All medications ever associated with one symptom, for one doctor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymptomPattern {
    pub symptom: String,
    pub medications: Vec<MedicationPattern>,
}

/// The per-doctor pattern document: symptom label to aggregate.
///
/// Stored as a single versioned JSON document per doctor; mutated only
/// by the aggregator under a compare-and-swap write.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DoctorPatterns {
    pub symptoms: BTreeMap<String, SymptomPattern>,
}

impl DoctorPatterns {
    pub fn is_empty(&self) -> bool {
        self.symptoms.is_empty()
    }
}

/// Request-scoped ranker output: one medication relevant to the
/// requested symptoms, with its representative triple and total count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecommendationCandidate {
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub duration: String,
    pub count: u32,
}
