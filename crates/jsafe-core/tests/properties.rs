use jsafe_core::{Arena, ValueId};
use proptest::prelude::*;
use serde_json::{Map, Number, Value};

#[derive(Debug, Clone)]
enum Tree {
    Null,
    Bool(bool),
    Num(f64),
    Text(String),
    Arr(Vec<Tree>),
    Obj(Vec<(String, Tree)>),
}

fn tree() -> impl Strategy<Value = Tree> {
    let leaf = prop_oneof![
        Just(Tree::Null),
        any::<bool>().prop_map(Tree::Bool),
        prop_oneof![
            proptest::num::f64::NORMAL | proptest::num::f64::ZERO | proptest::num::f64::SUBNORMAL,
            (-1_000_000i64..1_000_000).prop_map(|n| n as f64),
        ]
        .prop_map(Tree::Num),
        any::<String>().prop_map(Tree::Text),
    ];
    leaf.prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Tree::Arr),
            // A small key alphabet so duplicate keys show up often.
            prop::collection::vec(("[a-e]{1,2}", inner), 0..6).prop_map(Tree::Obj),
        ]
    })
}

fn build(arena: &mut Arena, tree: &Tree) -> ValueId {
    match tree {
        Tree::Null => arena.new_null(),
        Tree::Bool(b) => arena.new_bool(*b),
        Tree::Num(n) => arena.new_number(*n),
        Tree::Text(s) => arena.new_text(s.as_bytes()),
        Tree::Arr(items) => {
            let arr = arena.new_array();
            for item in items {
                let child = build(arena, item);
                arena.push(arr, child).unwrap();
            }
            arr
        }
        Tree::Obj(entries) => {
            let obj = arena.new_object();
            for (key, item) in entries {
                let child = build(arena, item);
                arena.set(obj, key.as_bytes(), child).unwrap();
            }
            obj
        }
    }
}

/// The JSON a tree should produce: later duplicates overwrite in place.
fn expected(tree: &Tree) -> Value {
    match tree {
        Tree::Null => Value::Null,
        Tree::Bool(b) => Value::Bool(*b),
        Tree::Num(n) => float(*n),
        Tree::Text(s) => Value::String(s.clone()),
        Tree::Arr(items) => Value::Array(items.iter().map(expected).collect()),
        Tree::Obj(entries) => {
            let mut map = Map::new();
            for (key, item) in entries {
                map.insert(key.clone(), expected(item));
            }
            Value::Object(map)
        }
    }
}

fn float(n: f64) -> Value {
    Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
}

/// Integers and floats parse into different `Number` variants; compare as f64.
fn normalize(value: Value) -> Value {
    match value {
        Value::Number(n) => float(n.as_f64().unwrap_or(f64::NAN)),
        Value::Array(items) => Value::Array(items.into_iter().map(normalize).collect()),
        Value::Object(map) => Value::Object(map.into_iter().map(|(k, v)| (k, normalize(v))).collect()),
        other => other,
    }
}

proptest! {
    /// Serialized output parses back to the same tree, object order included.
    #[test]
    fn serialize_round_trips(tree in tree()) {
        let mut arena = Arena::new();
        let root = build(&mut arena, &tree);
        let out = arena.serialize(root).unwrap();
        let text = arena.string(out).unwrap();

        let parsed: Value = serde_json::from_slice(text.as_bytes()).unwrap();
        prop_assert_eq!(normalize(parsed), normalize(expected(&tree)));
        prop_assert_eq!(jsafe_core::encoded_len(&arena, root).unwrap(), text.len());
    }

    /// Releasing the root leaves nothing behind, however the tree was built.
    #[test]
    fn free_leaves_no_live_values(tree in tree()) {
        let mut arena = Arena::new();
        let root = build(&mut arena, &tree);
        arena.free(root).unwrap();
        prop_assert_eq!(arena.stats().live_values, 0);
    }

    /// Keys come back in first-insertion order and each key counts once.
    #[test]
    fn object_keys_keep_first_insertion_order(keys in prop::collection::vec("[a-h]", 0..40)) {
        let mut arena = Arena::new();
        let obj = arena.new_object();
        let mut order: Vec<String> = Vec::new();
        for (i, key) in keys.iter().enumerate() {
            let v = arena.new_number(i as f64);
            arena.set(obj, key.as_bytes(), v).unwrap();
            if !order.contains(key) {
                order.push(key.clone());
            }
        }
        prop_assert_eq!(arena.len(obj).unwrap(), order.len());

        let json = arena.to_json_value(obj).unwrap();
        let actual: Vec<String> = json.as_object().unwrap().keys().cloned().collect();
        prop_assert_eq!(&actual, &order);

        // The number stored under each key is the index of its last write.
        for key in &order {
            let last = keys.iter().rposition(|k| k == key).unwrap();
            let child = arena.get(obj, key.as_bytes()).unwrap().unwrap();
            prop_assert_eq!(arena.number(child).unwrap(), last as f64);
        }
        prop_assert_eq!(arena.stats().live_values, order.len() + 1);
    }

    /// Capacity hints never change what a container reports.
    #[test]
    fn reserve_is_unobservable(hint in 0usize..256, n in 0usize..20) {
        let mut plain = Arena::new();
        let mut hinted = Arena::new();
        let a = plain.new_array();
        let b = hinted.new_array();
        hinted.reserve(b, hint).unwrap();
        for i in 0..n {
            let x = plain.new_number(i as f64);
            plain.push(a, x).unwrap();
            let y = hinted.new_number(i as f64);
            hinted.push(b, y).unwrap();
        }
        prop_assert_eq!(plain.len(a).unwrap(), hinted.len(b).unwrap());
        let left = jsafe_core::to_vec(&plain, a).unwrap();
        let right = jsafe_core::to_vec(&hinted, b).unwrap();
        prop_assert_eq!(left, right);
    }
}

#[test]
fn documented_scenario() {
    let mut arena = Arena::new();
    let obj = arena.new_object();
    let one = arena.new_number(1.0);
    arena.set(obj, b"a", one).unwrap();
    let arr = arena.new_array();
    let t = arena.new_bool(true);
    arena.push(arr, t).unwrap();
    let n = arena.new_null();
    arena.push(arr, n).unwrap();
    let x = arena.new_text(b"x");
    arena.push(arr, x).unwrap();
    arena.set(obj, b"b", arr).unwrap();

    let out = arena.serialize(obj).unwrap();
    assert_eq!(arena.string(out).unwrap().as_bytes(), br#"{"a":1,"b":[true,null,"x"]}"#);
}
