//! Relationship denylist: drops low-information edge types before pruning.
//!
//! Identifier/code/URL/image/rate/count-like suffixes, wikidata/wikimedia
//! plumbing, and a fixed set of relation names that never helped a traversal.
//! Applied by relationship search so the oracle only sees edges worth scoring.

use super::Relationship;

/// Suffixes that mark metadata-ish relationships (`"… ID"`, `"… code"`, …).
const NOISE_SUFFIXES: &[&str] = &[
    " ID",
    " code",
    " number",
    "instance of",
    "website",
    "URL",
    "inception",
    "image",
    " rate",
    " count",
];

/// Relation names (compared lowercase) that are known to be uninformative.
const NOISE_RELATIONS: &[&str] = &[
    "category's main topic",
    "topic's main category",
    "stack exchange site",
    "main subject",
    "country of citizenship",
    "commons category",
    "commons gallery",
    "country of origin",
    "country",
    "nationality",
];

/// Returns the relationships worth exploring, preserving input order.
pub fn filter_relationships(relationships: Vec<Relationship>) -> Vec<Relationship> {
    relationships
        .into_iter()
        .filter(|rel| {
            let label = rel.label.as_str();
            let lower = label.to_lowercase();
            !(NOISE_SUFFIXES.iter().any(|s| label.ends_with(s))
                || lower.contains("wikidata")
                || lower.contains("wikimedia")
                || NOISE_RELATIONS.contains(&lower.as_str()))
        })
        .collect()
}
