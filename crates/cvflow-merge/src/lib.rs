//! Path-addressed partial-document merge engine.
//!
//! The platform returns studio inputs as a paginated stream of
//! `(path, fragment)` pairs, where each fragment is an arbitrary JSON value
//! and the path addresses the location the fragment belongs at. [`merge`]
//! folds such a stream back into one document, allocating intermediate
//! containers along the path as needed.
//!
//! The engine is total: any sequence of string segments and any fragment
//! produces a well-formed document. Application order is significant;
//! later fragments at the same path win.

use serde_json::{Map, Value};

use cvflow_types::segment;

/// Merge `fragment` into `root` at `path`, returning the updated document.
///
/// `root` is `None` before the first pair is applied. Walking the path left
/// to right, each index segment forces a list at the current location and
/// each key segment forces an object, discarding whatever incompatible
/// value was there before. Lists are padded with nulls so the addressed
/// index always exists; missing keys are inserted as null.
///
/// At the end of the path, an object fragment landing on an object is
/// shallow-merged into it (the fragment's keys win, one level only). Every
/// other combination replaces the value at the target location wholesale.
/// With an empty path that target is the root itself.
pub fn merge(root: Option<Value>, path: &[String], fragment: Value) -> Value {
    let mut root = root.unwrap_or(Value::Null);
    let mut curr = &mut root;
    for seg in path {
        match segment::parse_index(seg) {
            Some(index) => {
                let items = list_slot(curr);
                while items.len() <= index {
                    items.push(Value::Null);
                }
                curr = &mut items[index];
            }
            None => {
                let fields = object_slot(curr);
                curr = fields.entry(seg.clone()).or_insert(Value::Null);
            }
        }
    }
    match (std::mem::take(curr), fragment) {
        (Value::Object(mut target), Value::Object(updates)) => {
            target.extend(updates);
            *curr = Value::Object(target);
        }
        (_, fragment) => *curr = fragment,
    }
    root
}

/// Read the value at `path`, or `None` if the path does not resolve.
///
/// Key segments only resolve inside objects and index segments only inside
/// lists; there is no coercion on the read side.
pub fn value_at<'a>(root: &'a Value, path: &[String]) -> Option<&'a Value> {
    let mut curr = root;
    for seg in path {
        curr = match segment::parse_index(seg) {
            Some(index) => curr.as_array()?.get(index)?,
            None => curr.as_object()?.get(seg.as_str())?,
        };
    }
    Some(curr)
}

/// Force the slot to hold a list, discarding any non-list value.
fn list_slot(slot: &mut Value) -> &mut Vec<Value> {
    if !slot.is_array() {
        *slot = Value::Array(Vec::new());
    }
    match slot {
        Value::Array(items) => items,
        _ => unreachable!("slot was just coerced to a list"),
    }
}

/// Force the slot to hold an object, discarding any non-object value.
fn object_slot(slot: &mut Value) -> &mut Map<String, Value> {
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    match slot {
        Value::Object(fields) => fields,
        _ => unreachable!("slot was just coerced to an object"),
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use serde_json::{json, Value};

    use super::{merge, value_at};

    fn path(segments: &[&str]) -> Vec<String> {
        segments.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_path_on_unset_root_is_identity() {
        assert_eq!(merge(None, &[], json!("x")), json!("x"));
        assert_eq!(merge(None, &[], json!([1, 2])), json!([1, 2]));
        assert_eq!(merge(None, &[], json!({"a": 1})), json!({"a": 1}));
        assert_eq!(merge(None, &[], Value::Null), Value::Null);
    }

    #[test]
    fn empty_path_merges_object_into_object_root() {
        let root = merge(None, &[], json!({"a": 1, "b": 2}));
        let root = merge(Some(root), &[], json!({"b": 9, "c": 3}));
        assert_eq!(root, json!({"a": 1, "b": 9, "c": 3}));
    }

    #[test]
    fn empty_path_replaces_non_object_root() {
        let root = merge(Some(json!([1, 2, 3])), &[], json!("gone"));
        assert_eq!(root, json!("gone"));
    }

    #[test]
    fn index_growth_pads_with_nulls() {
        let root = merge(None, &path(&["3"]), json!("x"));
        assert_eq!(root, json!([null, null, null, "x"]));
    }

    #[test]
    fn index_segment_converts_object_to_list_discarding_contents() {
        // Coercing a location from object to list is intentional overwrite
        // semantics: the key "b" is gone afterwards, not an error.
        let root = merge(Some(json!({"a": {"b": 1}})), &path(&["a", "0"]), json!("y"));
        assert_eq!(root, json!({"a": ["y"]}));
    }

    #[test]
    fn key_segment_converts_list_to_object_discarding_contents() {
        let root = merge(Some(json!([1, 2, 3])), &path(&["name"]), json!("z"));
        assert_eq!(root, json!({"name": "z"}));
    }

    #[test]
    fn object_merge_is_shallow() {
        let root = merge(
            Some(json!({"x": {"p": 1, "q": 2}})),
            &path(&["x"]),
            json!({"q": 99, "r": 3}),
        );
        assert_eq!(root, json!({"x": {"p": 1, "q": 99, "r": 3}}));
    }

    #[test]
    fn object_merge_does_not_recurse_into_nested_objects() {
        let root = merge(
            Some(json!({"x": {"nested": {"keep": 1, "lose": 2}}})),
            &path(&["x"]),
            json!({"nested": {"new": 3}}),
        );
        // One level only: the whole "nested" value is the fragment's.
        assert_eq!(root, json!({"x": {"nested": {"new": 3}}}));
    }

    #[test]
    fn later_writes_at_same_path_win() {
        let root = merge(None, &path(&["a"]), json!(1));
        let root = merge(Some(root), &path(&["a"]), json!(2));
        assert_eq!(root, json!({"a": 2}));

        let root = merge(None, &path(&["a"]), json!(2));
        let root = merge(Some(root), &path(&["a"]), json!(1));
        assert_eq!(root, json!({"a": 1}));
    }

    #[test]
    fn reapplying_a_pair_is_idempotent() {
        let once = merge(None, &path(&["a", "0"]), json!("x"));
        let twice = merge(Some(once.clone()), &path(&["a", "0"]), json!("x"));
        assert_eq!(once, twice);

        let once = merge(None, &path(&["a"]), json!({"k": 1}));
        let twice = merge(Some(once.clone()), &path(&["a"]), json!({"k": 1}));
        assert_eq!(once, twice);

        let once = merge(None, &path(&["a"]), json!([1, 2]));
        let twice = merge(Some(once.clone()), &path(&["a"]), json!([1, 2]));
        assert_eq!(once, twice);
    }

    #[test]
    fn adjacent_index_segments_nest_lists() {
        let root = merge(None, &path(&["0", "1"]), json!("x"));
        assert_eq!(root, json!([[null, "x"]]));

        // An index segment right after another one still coerces whatever
        // scalar sits at the outer index.
        let root = merge(Some(json!(["a", "b"])), &path(&["1", "0"]), json!("c"));
        assert_eq!(root, json!(["a", ["c"]]));
    }

    #[test]
    fn sign_and_decimal_segments_are_object_keys() {
        let root = merge(None, &path(&["-1"]), json!("k"));
        assert_eq!(root, json!({"-1": "k"}));

        let root = merge(None, &path(&["1.0"]), json!("k"));
        assert_eq!(root, json!({"1.0": "k"}));
    }

    #[test]
    fn scalar_root_is_coerced_by_first_segment() {
        let root = merge(Some(json!(42)), &path(&["0"]), json!("x"));
        assert_eq!(root, json!(["x"]));

        let root = merge(Some(json!(42)), &path(&["k"]), json!("x"));
        assert_eq!(root, json!({"k": "x"}));
    }

    #[test]
    fn paginated_stream_reconstructs_document() {
        let pairs = [
            (path(&["sites", "0", "name"]), json!("NYC")),
            (path(&["sites", "0", "devices", "0", "id"]), json!("dev1")),
        ];
        let mut root = None;
        for (p, fragment) in pairs {
            root = Some(merge(root, &p, fragment));
        }
        assert_eq!(
            root.unwrap(),
            json!({"sites": [{"name": "NYC", "devices": [{"id": "dev1"}]}]})
        );
    }

    #[test]
    fn value_at_reads_back_merged_fragment() {
        let p = path(&["sites", "2", "name"]);
        let root = merge(None, &p, json!("SFO"));
        assert_eq!(value_at(&root, &p), Some(&json!("SFO")));
        assert_eq!(value_at(&root, &path(&["sites", "0"])), Some(&Value::Null));
        assert_eq!(value_at(&root, &path(&["sites", "9"])), None);
        assert_eq!(value_at(&root, &path(&["missing"])), None);
    }

    #[test]
    fn value_at_does_not_coerce() {
        let root = json!({"a": [1, 2]});
        assert_eq!(value_at(&root, &path(&["a", "b"])), None);
        assert_eq!(value_at(&root, &path(&["a", "0", "x"])), None);
    }

    fn scalar() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::from),
            any::<i64>().prop_map(Value::from),
            "[a-z]{0,8}".prop_map(Value::from),
        ]
    }

    fn segments() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec(
            prop_oneof![
                (0usize..5).prop_map(|i| i.to_string()),
                "[a-z]{1,6}",
            ],
            0..5,
        )
    }

    proptest! {
        #[test]
        fn read_back_yields_non_object_fragment(p in segments(), fragment in scalar()) {
            let root = merge(None, &p, fragment.clone());
            prop_assert_eq!(value_at(&root, &p), Some(&fragment));
        }

        #[test]
        fn merge_never_shrinks_addressed_lists(p in segments(), fragment in scalar()) {
            // Every prefix of the path must resolve after the merge.
            let root = merge(None, &p, fragment);
            for end in 0..=p.len() {
                prop_assert!(value_at(&root, &p[..end]).is_some());
            }
        }
    }
}
