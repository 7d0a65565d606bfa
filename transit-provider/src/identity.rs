//! Location identity and suggestion ordering.
//!
//! Suggest and nearby results are deduplicated by the same-place rule of
//! [`Location::is_same_place`]: matching type plus matching id, or, when an
//! id is missing, points at most a metre apart.

use std::cmp::Ordering;

use crate::domain::{Location, LocationType};
use crate::result::SuggestedLocation;

/// Order in which location types are preferred when suggestions tie on priority.
pub const DEFAULT_TYPE_ORDER: [LocationType; 5] = [
    LocationType::Station,
    LocationType::Address,
    LocationType::Poi,
    LocationType::Coord,
    LocationType::Any,
];

/// True if both locations denote the same place.
pub fn same_place(a: &Location, b: &Location) -> bool {
    a.is_same_place(b)
}

/// Remove locations that denote the same place as an earlier one.
///
/// Keeps the first occurrence, so callers sort best-first before calling.
/// Same-place is a tolerance relation and cannot be hashed, so this is
/// quadratic in the number of locations; result lists are short.
pub fn dedup_locations(locations: Vec<Location>) -> Vec<Location> {
    if locations.len() <= 1 {
        return locations;
    }

    let mut result: Vec<Location> = Vec::with_capacity(locations.len());
    for location in locations {
        if !result.iter().any(|kept| kept.is_same_place(&location)) {
            result.push(location);
        }
    }
    result
}

/// Sort suggestions best-first and drop duplicates.
///
/// Suggestions are ranked by:
/// 1. Priority (higher is better)
/// 2. Location type, in `type_order` (types not listed go last)
/// 3. Name length (shorter is more specific)
///
/// When two suggestions denote the same place, the better ranked one is kept.
pub fn rank_suggestions(
    mut suggestions: Vec<SuggestedLocation>,
    type_order: &[LocationType],
) -> Vec<SuggestedLocation> {
    suggestions.sort_by(|a, b| compare_suggestions(a, b, type_order));

    let mut result: Vec<SuggestedLocation> = Vec::with_capacity(suggestions.len());
    for suggestion in suggestions {
        let duplicate = result
            .iter()
            .any(|kept| kept.location.is_same_place(&suggestion.location));
        if !duplicate {
            result.push(suggestion);
        }
    }
    result
}

fn compare_suggestions(
    a: &SuggestedLocation,
    b: &SuggestedLocation,
    type_order: &[LocationType],
) -> Ordering {
    let type_rank = |s: &SuggestedLocation| {
        type_order
            .iter()
            .position(|t| *t == s.location.kind())
            .unwrap_or(type_order.len())
    };
    let name_len = |s: &SuggestedLocation| s.location.name().map_or(usize::MAX, str::len);

    b.priority
        .cmp(&a.priority)
        .then_with(|| type_rank(a).cmp(&type_rank(b)))
        .then_with(|| name_len(a).cmp(&name_len(b)))
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn station() -> impl Strategy<Value = Location> {
        (0u8..8, "[A-Z][a-z]{0,12}").prop_map(|(id, name)| {
            Location::new(
                LocationType::Station,
                Some(id.to_string()),
                None,
                None,
                Some(name),
            )
            .unwrap()
        })
    }

    fn suggestion() -> impl Strategy<Value = SuggestedLocation> {
        (station(), -5i32..5).prop_map(|(location, priority)| SuggestedLocation::new(location, priority))
    }

    proptest! {
        #[test]
        fn dedup_leaves_no_duplicates(locations in prop::collection::vec(station(), 0..20)) {
            let deduped = dedup_locations(locations);
            for (i, a) in deduped.iter().enumerate() {
                for b in &deduped[i + 1..] {
                    prop_assert!(!a.is_same_place(b));
                }
            }
        }

        #[test]
        fn dedup_is_idempotent(locations in prop::collection::vec(station(), 0..20)) {
            let once = dedup_locations(locations);
            let twice = dedup_locations(once.clone());
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn ranked_priorities_descend(suggestions in prop::collection::vec(suggestion(), 0..20)) {
            let ranked = rank_suggestions(suggestions, &DEFAULT_TYPE_ORDER);
            for pair in ranked.windows(2) {
                prop_assert!(pair[0].priority >= pair[1].priority);
            }
        }

        #[test]
        fn ranking_keeps_every_place(suggestions in prop::collection::vec(suggestion(), 0..20)) {
            let ranked = rank_suggestions(suggestions.clone(), &DEFAULT_TYPE_ORDER);
            for s in &suggestions {
                prop_assert!(ranked.iter().any(|r| r.location.is_same_place(&s.location)));
            }
        }
    }
}
