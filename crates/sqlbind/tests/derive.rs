//! Behavior of the code generated by `#[derive(Crud)]`, without a database.

use chrono::{DateTime, NaiveDateTime, Utc};
use sqlbind::prelude::*;
use sqlbind::{BindPlan, Slot, generic_scan, scan_all_reusing};

#[derive(Debug, Default, Clone, PartialEq, Crud)]
#[crud(key = "foo_id")]
struct Foo {
    #[crud(column = "foo_time")]
    time: NaiveDateTime,
    #[crud(column = "foo_str")]
    s: String,
    #[crud(column = "FOO_ID")]
    id: i64,
    #[crud(column = "foo_num")]
    num: i64,
    cache: Vec<u8>,
}

#[derive(Debug, Default, Crud)]
#[crud(table = "ofoo")]
struct OptionalFoo {
    #[crud(column = "o_int")]
    int: Option<i32>,
    #[crud(column = "o_string")]
    string: Option<String>,
}

#[derive(Debug, Default, Crud)]
struct Seen {
    #[crud]
    name: String,
    #[crud(column = "seen_at", unix)]
    at: Option<DateTime<Utc>>,
}

#[derive(Crud)]
#[crud(no_fetch)]
struct Empty {}

#[derive(Debug, Default, Crud)]
#[crud(hooks)]
struct Modified {
    #[crud(column = "n")]
    n: i64,
}

impl Hooks for Modified {
    fn deflate(&mut self) -> CrudResult<()> {
        self.n += 10;
        Ok(())
    }

    fn inflate(&mut self) -> CrudResult<()> {
        self.n -= 1;
        Ok(())
    }
}

#[derive(Debug, Default, Crud)]
struct Item {
    #[crud]
    r#type: String,
}

fn columns(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[test]
fn enumerator_is_sorted_by_column() {
    let foo = Foo::default();
    let (names, args) = foo.enumerate_fields();
    assert_eq!(names, vec!["foo_id", "foo_num", "foo_str", "foo_time"]);
    assert_eq!(names.len(), args.len());
}

#[test]
fn enumerator_passes_optionals_by_value() {
    let o = OptionalFoo {
        int: Some(3),
        string: None,
    };
    let (names, args) = o.enumerate_fields();
    assert_eq!(names, vec!["o_int", "o_string"]);
    let values: Vec<Value> = args.iter().map(|a| a.to_value()).collect();
    assert_eq!(values, vec![Value::Integer(3), Value::Null]);
}

#[test]
fn unix_fields_enumerate_as_seconds() {
    let at = DateTime::from_timestamp(1338, 0).unwrap();
    let seen = Seen {
        name: "x".into(),
        at: Some(at),
    };
    let (names, args) = seen.enumerate_fields();
    assert_eq!(names, vec!["name", "seen_at"]);
    assert_eq!(args[1].to_value(), Value::Integer(1338));
}

#[test]
fn binder_leaves_unknown_columns_alone() {
    let mut foo = Foo::default();
    let cols = columns(&["foo_num", "other", "foo_num"]);
    let mut slots: Vec<Slot<'_>> = cols.iter().map(|_| Slot::Unbound).collect();
    foo.bind_fields(&cols, &mut slots);
    assert!(slots[0].is_bound());
    assert!(slots[1].is_unbound());
    assert!(slots[2].is_unbound());
}

#[test]
fn empty_type_binds_and_enumerates_nothing() {
    let mut e = Empty {};
    let cols = columns(&["a"]);
    let mut slots = vec![Slot::Unbound];
    e.bind_fields(&cols, &mut slots);
    assert!(slots[0].is_unbound());

    let (names, args) = e.enumerate_fields();
    assert!(names.is_empty() && args.is_empty());
}

#[test]
fn raw_identifier_fields_use_the_plain_column_name() {
    let item = Item {
        r#type: "widget".into(),
    };
    let (names, _) = item.enumerate_fields();
    assert_eq!(names, vec!["type"]);

    let mut rows = RowSet::new(columns(&["TYPE"]), vec![vec![Value::Text("gadget".into())]]).unwrap();
    assert!(rows.next_row());
    let mut scanned = Item::default();
    generic_scan(&rows, &mut [&mut scanned]).unwrap();
    assert_eq!(scanned.r#type, "gadget");
}

#[test]
fn table_metadata() {
    assert_eq!(<Foo as Table>::NAME, "foo");
    assert_eq!(<Foo as Table>::KEY, "foo_id");
    assert_eq!(<OptionalFoo as Table>::NAME, "ofoo");
    assert_eq!(<OptionalFoo as Table>::KEY, "");
    assert_eq!(<Seen as Table>::NAME, "seen");
}

#[test]
fn scan_fills_matching_fields_and_keeps_the_rest() {
    let mut rows = RowSet::new(
        columns(&["FOO_ID", "foo_num", "foo_str", "foo_time", "extra"]),
        vec![vec![
            Value::Integer(7),
            Value::Integer(42),
            Value::Text("PANIC".into()),
            Value::Text("1970-01-01 00:22:18".into()),
            Value::Blob(vec![0xff]),
        ]],
    )
    .unwrap();
    assert!(rows.next_row());

    let mut foo = Foo {
        cache: vec![1, 2, 3],
        ..Foo::default()
    };
    generic_scan(&rows, &mut [&mut foo]).unwrap();
    assert_eq!(foo.id, 7);
    assert_eq!(foo.num, 42);
    assert_eq!(foo.s, "PANIC");
    assert_eq!(foo.time, DateTime::from_timestamp(1338, 0).unwrap().naive_utc());
    assert_eq!(foo.cache, vec![1, 2, 3]);
}

#[test]
fn hooks_run_around_scan_and_enumeration() {
    let mut m = Modified { n: 2 };
    Enumerable::deflate(&mut m).unwrap();
    assert_eq!(m.n, 12);

    let mut rows = RowSet::new(columns(&["n"]), vec![vec![Value::Integer(12)]]).unwrap();
    rows.next_row();
    let mut scanned = Modified::default();
    generic_scan(&rows, &mut [&mut scanned]).unwrap();
    assert_eq!(scanned.n, 11);
}

#[test]
fn rebind_plan_matches_by_index() {
    let plan: BindPlan = Foo::plan(&columns(&["foo_str", "nope", "foo_id", "foo_str"]));
    let fields: Vec<_> = plan.fields().collect();
    // fields are indexed in column order: foo_id, foo_num, foo_str, foo_time
    assert_eq!(fields, vec![Some(2), None, Some(0), None]);
}

#[test]
fn reuse_path_clones_the_prototype() {
    let mut rows = RowSet::new(
        columns(&["foo_id", "foo_num"]),
        vec![
            vec![Value::Integer(1), Value::Integer(10)],
            vec![Value::Integer(2), Value::Integer(20)],
        ],
    )
    .unwrap();
    let prototype = Foo {
        s: "shared".into(),
        cache: vec![9],
        ..Foo::default()
    };
    let all = scan_all_reusing(&mut rows, &prototype).unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!((all[0].id, all[0].num), (1, 10));
    assert_eq!((all[1].id, all[1].num), (2, 20));
    assert!(all.iter().all(|f| f.s == "shared" && f.cache == vec![9]));
}
