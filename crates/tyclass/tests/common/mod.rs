//! Shared fixtures: a JSON encoder contract and a few domain types.

#![allow(dead_code)]

use serde_json::{json, Map, Value};
use tyclass::{Contract, Implementation, InstanceSource, InstanceTable, Origin};

/// Encodes values to `serde_json::Value`.
pub struct Json;

impl Contract for Json {
    type Output = Value;

    fn record(_type_name: &str, fields: Vec<(&str, Value)>) -> Value {
        let mut map = Map::new();
        for (name, value) in fields {
            map.insert(name.to_string(), value);
        }
        Value::Object(map)
    }

    fn variant(_type_name: &str, variant: &str, fields: Vec<Value>) -> Value {
        json!({ "tag": variant, "fields": fields })
    }

    fn tuple(items: Vec<Value>) -> Value {
        Value::Array(items)
    }

    fn list(items: Vec<Value>) -> Value {
        Value::Array(items)
    }

    fn option(item: Option<Value>) -> Value {
        item.unwrap_or(Value::Null)
    }
}

tyclass::record! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct Person {
        pub name: String,
        pub email: String,
    }
}

tyclass::record! {
    #[derive(Debug, Clone)]
    pub struct Account {
        pub owner: Person,
        pub balance: i64,
        pub tags: Vec<String>,
        pub manager: Option<Person>,
    }
}

pub fn person(name: &str, email: &str) -> Person {
    Person { name: name.to_string(), email: email.to_string() }
}

pub fn string_encoder() -> Implementation<Json> {
    Implementation::new("stringEncoder", |s: &String| Value::String(s.clone()))
}

pub fn int_encoder() -> Implementation<Json> {
    Implementation::new("intEncoder", |n: &i64| json!(n))
}

pub fn bool_encoder() -> Implementation<Json> {
    Implementation::new("boolEncoder", |b: &bool| Value::Bool(*b))
}

/// Encodes a person as `"name <email>"`.
pub fn person_encoder() -> Implementation<Json> {
    Implementation::new("personEncoder", |p: &Person| {
        Value::String(format!("{} <{}>", p.name, p.email))
    })
}

/// Scalars shipped with the contract.
pub fn core_source() -> InstanceSource<Json> {
    InstanceSource::new("core")
        .with(string_encoder())
        .with(int_encoder())
        .with(bool_encoder())
}

/// A table with the core scalars at builtin priority.
pub fn core_table() -> InstanceTable<Json> {
    let mut table = InstanceTable::new();
    for imp in [string_encoder(), int_encoder(), bool_encoder()] {
        table.register(imp, Origin::builtin("core")).unwrap();
    }
    table
}
