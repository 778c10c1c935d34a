use std::collections::HashMap;

use crate::parser::candidate::Candidate;

/// Collapse duplicate candidates. Two candidates sharing the dedup key
/// (normalized name, code) merge into one; the richer, higher-confidence
/// side wins the scalar fields and the loser backfills anything optional it
/// alone carries. Commutative and idempotent: the winner is picked by a
/// total order, so input order never changes the result.
pub fn merge(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut by_key: HashMap<(String, String), Candidate> = HashMap::new();

    for candidate in candidates {
        let key = candidate.dedup_key();
        match by_key.remove(&key) {
            Some(existing) => {
                by_key.insert(key, combine(existing, candidate));
            }
            None => {
                by_key.insert(key, candidate);
            }
        }
    }

    let mut merged: Vec<Candidate> = by_key.into_values().collect();
    merged.sort_by(|a, b| {
        a.provenance
            .sort_key()
            .cmp(&b.provenance.sort_key())
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.code.cmp(&b.code))
    });
    merged
}

fn combine(a: Candidate, b: Candidate) -> Candidate {
    // Ranks can tie (same confidence, detail and provenance); fall back to a
    // lexicographic comparison so the winner never depends on argument order.
    let b_wins = match rank(&b).cmp(&rank(&a)) {
        std::cmp::Ordering::Greater => true,
        std::cmp::Ordering::Less => false,
        std::cmp::Ordering::Equal => {
            (b.name.as_str(), b.matched_value.as_str()) < (a.name.as_str(), a.matched_value.as_str())
        }
    };
    let (winner, loser) = if b_wins { (b, a) } else { (a, b) };
    let mut merged = winner;

    merged.known |= loser.known;
    merged.confidence = merged.confidence.max(loser.confidence);
    if merged.pin.is_none() {
        merged.pin = loser.pin;
    }
    if merged.pin_range.is_none() {
        merged.pin_range = loser.pin_range;
    }
    if merged.specification.is_none() {
        merged.specification = loser.specification;
    }
    if merged.quantity.is_none() {
        merged.quantity = loser.quantity;
    }
    // Descriptions are concatenative in spirit: keep the more informative one.
    merged.description = match (merged.description.take(), loser.description) {
        (Some(x), Some(y)) => Some(if chars(&y) > chars(&x) { y } else { x }),
        (x, y) => x.or(y),
    };

    merged
}

/// Total preference order for the winning side of a merge. Earlier
/// provenance breaks ties so the outcome is independent of argument order;
/// the negated sort key makes smaller coordinates rank higher.
fn rank(c: &Candidate) -> (crate::parser::candidate::Confidence, usize, std::cmp::Reverse<(u32, u32, u32, u32)>) {
    (c.confidence, c.detail_score(), std::cmp::Reverse(c.provenance.sort_key()))
}

fn chars(s: &str) -> usize {
    s.chars().count()
}
