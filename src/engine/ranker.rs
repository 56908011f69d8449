use std::collections::{BTreeMap, BTreeSet};

use crate::models::{DoctorPatterns, DosagePattern, RecommendationCandidate};

/// Upper bound on candidates surfaced to the prompt.
pub const MAX_CANDIDATES: usize = 5;

struct MedicationTotals {
    count: u32,
    // Variants in first-observed order with use counts merged across symptoms.
    variants: Vec<DosagePattern>,
}

/// Rank the medications historically associated with any of the
/// requested symptoms.
///
/// Counts and variants aggregate across the doctor's whole document, so
/// a medication shared by several symptoms carries its true stored
/// total exactly once; the requested symptoms only select which
/// medications qualify (union, de-duplicated by name). Ordering is
/// total count descending, ties broken lexicographically by name. At
/// most MAX_CANDIDATES entries are returned; the representative triple
/// is the variant with the highest use count, first observed winning a
/// tie. A doctor with no history gets an empty list, never an error.
pub fn rank_medications(
    patterns: &DoctorPatterns,
    symptoms: &[String],
) -> Vec<RecommendationCandidate> {
    let mut totals: BTreeMap<&str, MedicationTotals> = BTreeMap::new();
    let mut relevant: BTreeSet<&str> = BTreeSet::new();

    for (symptom, pattern) in &patterns.symptoms {
        let requested = symptoms.iter().any(|s| s == symptom);
        for med in &pattern.medications {
            let entry = totals
                .entry(med.name.as_str())
                .or_insert_with(|| MedicationTotals {
                    count: 0,
                    variants: Vec::new(),
                });
            entry.count += med.count;
            for variant in &med.patterns {
                match entry.variants.iter_mut().find(|v| {
                    v.dosage == variant.dosage
                        && v.frequency == variant.frequency
                        && v.duration == variant.duration
                }) {
                    Some(merged) => merged.use_count += variant.use_count,
                    None => entry.variants.push(variant.clone()),
                }
            }
            if requested {
                relevant.insert(med.name.as_str());
            }
        }
    }

    let mut candidates: Vec<RecommendationCandidate> = relevant
        .into_iter()
        .filter_map(|name| {
            let total = totals.get(name)?;
            let representative = representative_variant(&total.variants)?;
            Some(RecommendationCandidate {
                name: name.to_string(),
                dosage: representative.dosage.clone(),
                frequency: representative.frequency.clone(),
                duration: representative.duration.clone(),
                count: total.count,
            })
        })
        .collect();

    candidates.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    candidates.truncate(MAX_CANDIDATES);
    candidates
}

/// The variant a summary should quote: highest use count, first
/// observed on a tie.
fn representative_variant(variants: &[DosagePattern]) -> Option<&DosagePattern> {
    let mut best: Option<&DosagePattern> = None;
    for variant in variants {
        match best {
            Some(current) if variant.use_count > current.use_count => best = Some(variant),
            None => best = Some(variant),
            _ => {}
        }
    }
    best
}
