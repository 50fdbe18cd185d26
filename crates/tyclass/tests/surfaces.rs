//! The function and method call surfaces are interchangeable.

mod common;

use common::*;
use serde_json::{json, Value};
use tyclass::{encode, Encode, InstanceTable, Origin, ResolveError, Resolver, Typed};

fn both<T: Typed>(resolver: &Resolver<'_, Json>, value: &T) -> Result<Value, ResolveError> {
    let by_fn = encode(resolver, value);
    let by_method = value.encode(resolver);
    assert_eq!(by_fn, by_method);
    by_fn
}

fn table() -> InstanceTable<Json> {
    let mut table = core_table();
    table.declare_type::<Person>().unwrap();
    table.declare_type::<Account>().unwrap();
    table
}

#[test]
fn surfaces_agree_on_scalars_and_composites() {
    let table = table();
    let resolver = Resolver::new(&table);

    assert_eq!(both(&resolver, &7i64).unwrap(), json!(7));
    assert_eq!(both(&resolver, &"x".to_string()).unwrap(), json!("x"));
    assert_eq!(both(&resolver, &Some(false)).unwrap(), json!(false));
    assert_eq!(
        both(&resolver, &vec![person("a", "a@x"), person("b", "b@x")]).unwrap(),
        json!([{ "name": "a", "email": "a@x" }, { "name": "b", "email": "b@x" }])
    );
    both(
        &resolver,
        &Account {
            owner: person("a", "a@x"),
            balance: 0,
            tags: vec![],
            manager: None,
        },
    )
    .unwrap();
}

#[test]
fn surfaces_agree_on_failures() {
    let mut table = table();
    table
        .register(
            tyclass::Implementation::new("alt", |n: &i64| json!(n.to_string())),
            Origin::builtin("other"),
        )
        .unwrap();
    let resolver = Resolver::new(&table);

    assert!(matches!(both(&resolver, &1.0f64), Err(ResolveError::NoInstanceFound { .. })));
    assert!(matches!(both(&resolver, &3i64), Err(ResolveError::AmbiguousInstance { .. })));
    assert!(matches!(
        both(&resolver, &(1i64, "a".to_string())),
        Err(ResolveError::AmbiguousInstance { .. })
    ));
}

#[test]
fn selection_ignores_runtime_value() {
    let table = table();
    let resolver = Resolver::new(&table);

    let empty: Vec<Person> = vec![];
    let none: Option<Person> = None;
    assert_eq!(both(&resolver, &empty).unwrap(), json!([]));
    assert_eq!(both(&resolver, &none).unwrap(), Value::Null);

    // The type is checked even when no component value would ever be encoded.
    let bare = InstanceTable::<Json>::new();
    let resolver = Resolver::new(&bare);
    assert_eq!(
        both(&resolver, &empty).unwrap_err(),
        ResolveError::NoInstanceFound {
            ty: Vec::<Person>::type_of(),
            missing: Person::type_of(),
        }
    );
}

fn account() -> Account {
    Account {
        owner: person("a", "a@x"),
        balance: 5,
        tags: vec!["vip".into()],
        manager: Some(person("m", "m@x")),
    }
}

/// Encode a sample value of the named type through both surfaces.
fn both_for(resolver: &Resolver<'_, Json>, ty: &str) -> Result<Value, ResolveError> {
    match ty {
        "Int" => both(resolver, &7i64),
        "String" => both(resolver, &"x".to_string()),
        "Bool" => both(resolver, &true),
        "Person" => both(resolver, &person("a", "a@x")),
        "Account" => both(resolver, &account()),
        other => panic!("no sample value for `{}`", other),
    }
}

#[test]
fn surfaces_agree_on_every_reported_type() {
    let mut table = table();
    table.register(person_encoder(), Origin::local("app")).unwrap();
    let resolver = Resolver::new(&table);
    let report = table.report();

    let mut names: Vec<String> = report.instances.iter().map(|entry| entry.ty.clone()).collect();
    names.extend(report.types.iter().map(|def| def.name().to_string()));
    names.sort();
    names.dedup();
    assert_eq!(names, ["Account", "Bool", "Int", "Person", "String"]);

    for name in &names {
        both_for(&resolver, name).unwrap_or_else(|err| panic!("`{}`: {}", name, err));
    }
}
