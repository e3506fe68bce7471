//! Completeness validator
//!
//! Pure function over the merged entity set. Issues come out in the fixed
//! required-field order (company, origin, destination, weight, material),
//! so the same set always yields the same first outstanding field.

use dakiya_core::{CompleteEntitySet, EntitySet, FieldKey, FieldStatus};
use serde::{Deserialize, Serialize};

/// Why a field blocks submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueReason {
    /// Never mentioned.
    Missing,
    /// Mentioned but unresolvable; carries the user's original text.
    Invalid(String),
}

/// One field blocking submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldIssue {
    pub key: FieldKey,
    pub reason: IssueReason,
}

/// Validation result.
#[derive(Debug, Clone, PartialEq)]
pub enum Completeness {
    Complete(CompleteEntitySet),
    Incomplete(Vec<FieldIssue>),
}

/// Validate the merged entity set for submission readiness.
pub fn validate(entities: &EntitySet) -> Completeness {
    let mut issues = Vec::new();
    for key in FieldKey::REQUIRED {
        match entities.status_of(key) {
            FieldStatus::Stated => {}
            FieldStatus::Unset => issues.push(FieldIssue {
                key,
                reason: IssueReason::Missing,
            }),
            FieldStatus::Invalid(raw) => issues.push(FieldIssue {
                key,
                reason: IssueReason::Invalid(raw),
            }),
        }
    }

    // An empty issue list means all five statuses were Stated, so the
    // tuple match always succeeds in that case.
    if let (true, Some(company), Some(origin), Some(destination), Some(weight), Some(material)) = (
        issues.is_empty(),
        entities.company.stated_value(),
        entities.origin_city.stated_value(),
        entities.destination_city.stated_value(),
        entities.weight_kg.stated_value(),
        entities.material.stated_value(),
    ) {
        Completeness::Complete(CompleteEntitySet {
            company: company.clone(),
            origin_city: origin.clone(),
            destination_city: destination.clone(),
            weight_kg: *weight,
            material: material.clone(),
        })
    } else {
        Completeness::Incomplete(issues)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use dakiya_core::{CityRef, FieldOrigin, FieldState, MaterialRef, Weight};

    fn stated<T>(value: T) -> FieldState<T> {
        FieldState::Stated {
            value,
            origin: FieldOrigin::Stated,
        }
    }

    fn full_set() -> EntitySet {
        EntitySet {
            company: stated("ABC Company".to_string()),
            origin_city: stated(CityRef {
                canonical_id: "64a1".to_string(),
                display_name: "Jaipur".to_string(),
            }),
            destination_city: stated(CityRef {
                canonical_id: "64a2".to_string(),
                display_name: "Kolkata".to_string(),
            }),
            weight_kg: stated(Weight::new(50.0).unwrap()),
            material: stated(MaterialRef {
                canonical_id: "m01".to_string(),
                display_name: "Paint".to_string(),
            }),
        }
    }

    #[test]
    fn test_full_set_is_complete() {
        match validate(&full_set()) {
            Completeness::Complete(complete) => {
                assert_eq!(complete.company, "ABC Company");
                assert_eq!(complete.weight_kg.kg(), 50.0);
            }
            Completeness::Incomplete(issues) => panic!("unexpected issues: {issues:?}"),
        }
    }

    #[test]
    fn test_empty_set_lists_all_fields_in_order() {
        match validate(&EntitySet::new()) {
            Completeness::Incomplete(issues) => {
                let keys: Vec<FieldKey> = issues.iter().map(|i| i.key).collect();
                assert_eq!(keys, FieldKey::REQUIRED.to_vec());
                assert!(issues.iter().all(|i| i.reason == IssueReason::Missing));
            }
            Completeness::Complete(_) => panic!("empty set validated as complete"),
        }
    }

    #[test]
    fn test_invalid_field_carries_raw_text() {
        let mut set = full_set();
        set.origin_city = FieldState::Invalid {
            raw: "Jaypur".to_string(),
            reason: "city not serviced".to_string(),
        };
        match validate(&set) {
            Completeness::Incomplete(issues) => {
                assert_eq!(issues.len(), 1);
                assert_eq!(issues[0].key, FieldKey::OriginCity);
                assert_eq!(issues[0].reason, IssueReason::Invalid("Jaypur".to_string()));
            }
            Completeness::Complete(_) => panic!("invalid set validated as complete"),
        }
    }

    #[test]
    fn test_order_is_fixed_regardless_of_statement_order() {
        // Only material and company outstanding; company must come first.
        let mut set = full_set();
        set.company = FieldState::Unset;
        set.material = FieldState::Unset;
        match validate(&set) {
            Completeness::Incomplete(issues) => {
                assert_eq!(issues[0].key, FieldKey::Company);
                assert_eq!(issues[1].key, FieldKey::Material);
            }
            Completeness::Complete(_) => panic!("incomplete set validated as complete"),
        }
    }

    mod prop_tests {
        use super::*;
        use proptest::prelude::*;

        fn arb_field_status() -> impl Strategy<Value = u8> {
            0u8..3
        }

        fn invalid<T>(raw: &str) -> FieldState<T> {
            FieldState::Invalid {
                raw: raw.to_string(),
                reason: "test".to_string(),
            }
        }

        fn set_with(statuses: [u8; 5]) -> EntitySet {
            let mut set = full_set();
            if statuses[0] == 0 {
                set.company = FieldState::Unset;
            } else if statuses[0] == 2 {
                set.company = invalid("x");
            }
            if statuses[1] == 0 {
                set.origin_city = FieldState::Unset;
            } else if statuses[1] == 2 {
                set.origin_city = invalid("x");
            }
            if statuses[2] == 0 {
                set.destination_city = FieldState::Unset;
            } else if statuses[2] == 2 {
                set.destination_city = invalid("x");
            }
            if statuses[3] == 0 {
                set.weight_kg = FieldState::Unset;
            } else if statuses[3] == 2 {
                set.weight_kg = invalid("x");
            }
            if statuses[4] == 0 {
                set.material = FieldState::Unset;
            } else if statuses[4] == 2 {
                set.material = invalid("x");
            }
            set
        }

        proptest! {
            #[test]
            fn prop_issue_keys_follow_required_order(
                statuses in [arb_field_status(), arb_field_status(), arb_field_status(),
                             arb_field_status(), arb_field_status()]
            ) {
                let set = set_with(statuses);
                if let Completeness::Incomplete(issues) = validate(&set) {
                    let positions: Vec<usize> = issues
                        .iter()
                        .map(|i| FieldKey::REQUIRED.iter().position(|k| *k == i.key).unwrap())
                        .collect();
                    let mut sorted = positions.clone();
                    sorted.sort_unstable();
                    prop_assert_eq!(positions, sorted);
                }
            }

            #[test]
            fn prop_complete_iff_all_stated(
                statuses in [arb_field_status(), arb_field_status(), arb_field_status(),
                             arb_field_status(), arb_field_status()]
            ) {
                let set = set_with(statuses);
                let all_stated = statuses.iter().all(|s| *s == 1);
                prop_assert_eq!(
                    matches!(validate(&set), Completeness::Complete(_)),
                    all_stated
                );
            }
        }
    }
}
