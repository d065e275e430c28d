//! Property-based tests for scopes and queries using proptest.

use proptest::prelude::*;
use serde_json::{json, Value};
use standout_scope::{Criterion, Evaluate, MemoryBuilder, Operator, Query, Scope, ScopeBuilder};

// ============================================================================
// Test helpers
// ============================================================================

// Strategy to generate records; `year` is sometimes missing
fn record_strategy() -> impl Strategy<Value = Value> {
    (0i64..10, prop::option::of(0i64..10), "[a-c]").prop_map(|(group, year, name)| {
        let mut record = json!({"group": group, "name": name});
        if let Some(year) = year {
            record["year"] = json!(year);
        }
        record
    })
}

fn criterion_strategy() -> impl Strategy<Value = Criterion> {
    (
        "(group|year|name)",
        prop::sample::select(Operator::ALL.to_vec()),
        0i64..10,
    )
        .prop_map(|(attribute, operator, n)| {
            let value = if operator.is_membership() {
                json!([n, n + 1])
            } else {
                json!(n)
            };
            Criterion::new(attribute, operator, value).unwrap()
        })
}

// Scopes built only through the composition algebra; never Null
fn scope_strategy() -> impl Strategy<Value = Scope> {
    let leaf = prop_oneof![
        1 => Just(Scope::All),
        1 => Just(Scope::None),
        6 => criterion_strategy().prop_map(Scope::from),
    ];

    leaf.prop_recursive(4, 32, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(a, b)| a.and(b)),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| a.or(b)),
            inner.prop_map(Scope::invert),
        ]
    })
}

fn is_flat(scope: &Scope) -> bool {
    let nested_same = match scope {
        Scope::Conjunction(children) => children
            .iter()
            .any(|c| matches!(c, Scope::Conjunction(_))),
        Scope::Disjunction(children) => children
            .iter()
            .any(|c| matches!(c, Scope::Disjunction(_))),
        _ => false,
    };
    !nested_same && scope.children().iter().all(is_flat)
}

// ============================================================================
// Composition laws
// ============================================================================

proptest! {
    /// Null, All and None act as identities and absorbers.
    #[test]
    fn identity_and_absorption(scope in scope_strategy()) {
        prop_assert_eq!(Scope::Null.and(scope.clone()), scope.clone());
        prop_assert_eq!(scope.clone().and(Scope::Null), scope.clone());
        prop_assert_eq!(Scope::Null.or(scope.clone()), scope.clone());
        prop_assert_eq!(Scope::All.and(scope.clone()), scope.clone());
        prop_assert_eq!(scope.clone().or(Scope::None), scope.clone());
        prop_assert_eq!(scope.clone().and(Scope::None), Scope::None);
        prop_assert_eq!(scope.or(Scope::All), Scope::All);
    }

    /// AND and OR match exactly the boolean combination of their operands.
    #[test]
    fn composition_matches_boolean_logic(
        a in scope_strategy(),
        b in scope_strategy(),
        records in prop::collection::vec(record_strategy(), 0..20),
    ) {
        let and = a.clone().and(b.clone());
        let or = a.clone().or(b.clone());

        for record in &records {
            prop_assert_eq!(and.matches(record), a.matches(record) && b.matches(record));
            prop_assert_eq!(or.matches(record), a.matches(record) || b.matches(record));
        }
    }

    /// Composition never nests a conjunction in a conjunction, or a
    /// disjunction in a disjunction.
    #[test]
    fn composition_flattens(a in scope_strategy(), b in scope_strategy()) {
        prop_assert!(is_flat(&a.clone().and(b.clone())));
        prop_assert!(is_flat(&a.or(b)));
    }

    /// Inverting complements a scope, and inverting twice restores it.
    #[test]
    fn invert_complements(
        scope in scope_strategy(),
        records in prop::collection::vec(record_strategy(), 0..20),
    ) {
        let inverted = scope.clone().invert();
        let restored = inverted.clone().invert();

        for record in &records {
            prop_assert_eq!(inverted.matches(record), !scope.matches(record));
            prop_assert_eq!(restored.matches(record), scope.matches(record));
        }
    }

    /// Compiled scopes agree with interpreted scopes on every record.
    #[test]
    fn compiled_agrees_with_interpreted(
        scope in scope_strategy(),
        records in prop::collection::vec(record_strategy(), 0..30),
    ) {
        let compiled = MemoryBuilder.transform(scope.clone());
        prop_assert_eq!(compiled.to_scope(), scope.clone());
        prop_assert_eq!(Evaluate::filter(&compiled, &records), scope.filter(&records));
    }
}

// ============================================================================
// Query properties
// ============================================================================

proptest! {
    /// Filter should never return more records than the input.
    #[test]
    fn filter_never_grows_collection(
        records in prop::collection::vec(record_strategy(), 0..50),
        scope in scope_strategy(),
    ) {
        let query = Query::new(&records).scope(scope);
        prop_assert!(query.count() <= records.len());
    }

    /// exists() should return true iff the unpaginated result is non-empty.
    #[test]
    fn exists_consistent_with_results(
        records in prop::collection::vec(record_strategy(), 0..50),
        scope in scope_strategy(),
        offset in 0usize..60,
    ) {
        let query = Query::new(&records).scope(scope);
        let has_any = query.offset(offset).exists();
        prop_assert_eq!(has_any, !query.to_vec().is_empty());
    }

    /// Offset and limit slice the ordered result.
    #[test]
    fn offset_and_limit_slice_results(
        records in prop::collection::vec(record_strategy(), 0..50),
        offset in 0usize..60,
        limit in 0usize..60,
    ) {
        let query = Query::new(&records).order_asc("group");
        let full = query.to_vec();
        let page = query.offset(offset).limit(limit).to_vec();

        let expected: Vec<&Value> = full.iter().skip(offset).take(limit).copied().collect();
        prop_assert!(page.len() <= limit);
        prop_assert_eq!(page.len(), full.len().saturating_sub(offset).min(limit));
        prop_assert_eq!(page, expected);
    }

    /// Lazy iteration yields the same records as eager evaluation.
    #[test]
    fn iter_agrees_with_to_vec(
        records in prop::collection::vec(record_strategy(), 0..50),
        scope in scope_strategy(),
        offset in 0usize..20,
        limit in 0usize..20,
    ) {
        let query = Query::new(&records).scope(scope).offset(offset).limit(limit);
        prop_assert_eq!(query.iter().collect::<Vec<_>>(), query.to_vec());
    }

    /// Ordering should be stable (equal records keep their original order).
    #[test]
    fn ordering_is_stable(records in prop::collection::vec(record_strategy(), 5..30)) {
        let query = Query::new(&records).order_asc("group");
        let results = query.to_vec();

        for i in 1..results.len() {
            let prev = results[i - 1];
            let curr = results[i];
            let (pg, cg) = (prev["group"].as_i64(), curr["group"].as_i64());

            if pg == cg {
                let prev_pos = records.iter().position(|x| std::ptr::eq(x, prev));
                let curr_pos = records.iter().position(|x| std::ptr::eq(x, curr));

                if let (Some(pp), Some(cp)) = (prev_pos, curr_pos) {
                    prop_assert!(pp < cp, "Stable sort violated: equal records reordered");
                }
            } else {
                prop_assert!(pg < cg, "Sort order violated");
            }
        }
    }

    /// Missing values sort after present ones, in ascending order.
    #[test]
    fn missing_values_sort_last(records in prop::collection::vec(record_strategy(), 0..30)) {
        let results = Query::new(&records).order_asc("year").to_vec();
        let first_missing = results.iter().position(|r| r.get("year").is_none());

        if let Some(index) = first_missing {
            prop_assert!(results[index..].iter().all(|r| r.get("year").is_none()));
        }
    }

    /// Re-applying the same ordering doesn't change the result.
    #[test]
    fn ordering_is_idempotent(records in prop::collection::vec(record_strategy(), 0..30)) {
        let once = Query::new(&records).order_asc("name").order_desc("group");
        let sorted: Vec<Value> = once.to_vec().into_iter().cloned().collect();
        let twice = Query::new(&sorted).order_asc("name").order_desc("group");

        let first: Vec<&Value> = once.to_vec();
        let second: Vec<&Value> = twice.to_vec();
        prop_assert_eq!(first, second);
    }

    /// Attributes holding numbers and strings still sort into ordered runs.
    #[test]
    fn mixed_kinds_sort_into_ordered_runs(
        keys in prop::collection::vec(
            prop_oneof![
                (-50i64..50).prop_map(|n| json!(n)),
                "[a-e]{1,3}".prop_map(|s| json!(s)),
            ],
            0..40,
        )
    ) {
        let records: Vec<Value> = keys.into_iter().map(|k| json!({"k": k})).collect();
        let results = Query::new(&records).order_asc("k").to_vec();
        prop_assert_eq!(results.len(), records.len());

        let first_string = results.iter().position(|r| r["k"].is_string());
        if let Some(index) = first_string {
            prop_assert!(results[index..].iter().all(|r| r["k"].is_string()));
        }

        for pair in results.windows(2) {
            let (prev, curr) = (&pair[0]["k"], &pair[1]["k"]);
            match (prev, curr) {
                (Value::Number(a), Value::Number(b)) => {
                    prop_assert!(a.as_i64() <= b.as_i64(), "numbers out of order");
                }
                (Value::String(a), Value::String(b)) => {
                    prop_assert!(a <= b, "strings out of order");
                }
                _ => {}
            }
        }

        let descending = Query::new(&records).order_desc("k").to_vec();
        let reversed: Vec<&Value> = results.iter().rev().copied().collect();
        let keys_desc: Vec<&Value> = descending.iter().map(|r| &r["k"]).collect();
        let keys_rev: Vec<&Value> = reversed.iter().map(|r| &r["k"]).collect();
        prop_assert_eq!(keys_desc, keys_rev);
    }
}

// ============================================================================
// Additional edge case tests
// ============================================================================

#[test]
fn empty_collection_returns_empty() {
    let records: Vec<Value> = vec![];
    let query = Query::new(&records).filter(json!({"group": 1})).unwrap();

    assert!(query.to_vec().is_empty());
    assert_eq!(query.count(), 0);
    assert!(!query.exists());
    assert!(query.first().is_none());
}

#[test]
fn offset_equal_to_length_returns_empty() {
    let records = vec![json!({"n": 1}), json!({"n": 2}), json!({"n": 3})];
    assert!(Query::new(&records).offset(3).to_vec().is_empty());
}

#[test]
fn limit_zero_returns_empty() {
    let records = vec![json!({"n": 1}), json!({"n": 2}), json!({"n": 3})];
    assert!(Query::new(&records).limit(0).to_vec().is_empty());
}
