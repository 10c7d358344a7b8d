use pgstmt::prelude::*;
use pgstmt::{ColumnSpec, format, helpers};
use serde_json::{Value, json};

fn users() -> ColumnSet {
    ColumnSet::new(
        vec![
            ColumnSpec::from("?id"),
            ColumnConfig::new("first_name").prop("firstName").into(),
            ColumnConfig::new("profile").modifier(Modifier::Json).into(),
            ColumnConfig::new("created").cast("timestamptz").with_default("now").into(),
        ],
        ColumnSetOptions::new().table(TableName::qualified("app", "users").unwrap()),
    )
    .unwrap()
}

#[test]
fn insert_then_upsert_with_shared_set() {
    let cs = users();
    let row = json!({"id": 1, "firstName": "O'Hara", "profile": {"age": 30}});

    let insert = helpers::insert(&row).columns(&cs).to_sql().unwrap();
    assert_eq!(
        insert,
        r#"INSERT INTO "app"."users" ("id","first_name","profile","created") VALUES (1,'O''Hara','{"age":30}','now'::timestamptz)"#
    );

    let conflict = cs
        .assign_columns(&AssignOptions::new().from_alias("excluded").skip(["created"]))
        .unwrap();
    let sql = format!("{insert} ON CONFLICT(id) DO UPDATE SET {conflict}");
    assert!(sql.ends_with(
        r#"DO UPDATE SET "first_name"=excluded."first_name","profile"=excluded."profile""#
    ));
}

#[test]
fn multi_row_update_with_where_clause() {
    let cs = users();
    let rows = json!([
        {"id": 1, "firstName": "a", "profile": null, "created": "2024-01-01"},
        {"id": 2, "firstName": "b", "profile": [1, 2]},
    ]);
    let sql = helpers::update(&rows).columns(&cs).to_sql().unwrap() + " WHERE v.id = t.id";
    assert_eq!(
        sql,
        concat!(
            r#"UPDATE "app"."users" AS t SET "first_name"=v."first_name","profile"=v."profile","created"=v."created"::timestamptz "#,
            r#"FROM (VALUES(1,'a',null,'2024-01-01'::timestamptz),(2,'b','[1,2]','now'::timestamptz)) "#,
            r#"AS v("id","first_name","profile","created") WHERE v.id = t.id"#
        )
    );
}

#[test]
fn column_set_from_json_configuration() {
    let spec = json!([
        "?id",
        {"name": "payload", "mod": ":json", "cnd": false},
        {"name": "rank", "cast": "int", "def": 0},
    ]);
    let cs = ColumnSet::new(&spec, ColumnSetOptions::new().table("events")).unwrap();
    assert_eq!(cs.len(), 3);
    assert_eq!(cs.placeholders_list(), "${id},${payload:json},${rank}::int");

    let data = json!({"id": 9, "payload": {"k": "v"}});
    assert_eq!(
        helpers::update(&data).columns(&cs).to_sql().unwrap(),
        r#"UPDATE "events" SET "payload"='{"k":"v"}',"rank"=0::int"#
    );
}

#[test]
fn invalid_column_configuration() {
    let err = ColumnSet::new(json!([42]), ColumnSetOptions::new()).unwrap_err();
    assert!(err.is_type_error());

    let err = ColumnSet::new(json!([{"name": "a", "mod": "%"}]), ColumnSetOptions::new())
        .unwrap_err();
    assert!(err.is_value_error());
}

#[test]
fn table_from_json() {
    let t = TableName::from_value(&json!({"table": "logs", "schema": "audit"})).unwrap();
    assert_eq!(t.name(), r#""audit"."logs""#);
    assert_eq!(t.schema(), Some("audit"));

    let t = TableName::from_value(&json!({"table": "logs", "schema": ""})).unwrap();
    assert_eq!(t.to_string(), r#""logs""#);

    let err = TableName::from_value(&json!({"table": "logs", "schema": 1})).unwrap_err();
    assert_eq!(err.message(), "Invalid schema name.");
    assert!(TableName::from_value(&json!("")).unwrap_err().is_type_error());
}

#[test]
fn lowercase_statements() {
    let cs = ColumnSet::new(["?id", "v"], ColumnSetOptions::new().table("t")).unwrap();
    let cfg = StmtConfig::lowercase();
    let one = json!({"id": 1, "v": 2});
    let many = json!([one.clone()]);

    assert_eq!(
        helpers::insert(&one).columns(&cs).config(cfg).to_sql().unwrap(),
        r#"insert into "t" ("id","v") values (1,2)"#
    );
    assert_eq!(
        helpers::update(&one).columns(&cs).config(cfg).to_sql().unwrap(),
        r#"update "t" set "v"=2"#
    );
    assert_eq!(
        helpers::update(&many).columns(&cs).config(cfg).to_sql().unwrap(),
        r#"update "t" as t set "v"=v."v" from (values(1,2)) as v("id","v")"#
    );
}

#[test]
fn formatter_escapes_substituted_values() {
    let sql = format(
        "SELECT ${cols~} FROM $<table~> WHERE name = ${name} AND raw = $[expr^]",
        &json!({"cols": ["a", "b"], "table": "x\"y", "name": "it's", "expr": "1+1"}),
    )
    .unwrap();
    assert_eq!(
        sql,
        r#"SELECT "a","b" FROM "x""y" WHERE name = 'it''s' AND raw = 1+1"#
    );

    let err = format("$1, $2", &json!(["a"])).unwrap_err();
    assert_eq!(
        err.message(),
        "Variable $2 out of range. Parameters array length: 1"
    );
}

#[test]
fn values_with_dollar_signs_are_not_reformatted() {
    let cs = ColumnSet::new(["a", "b"], ColumnSetOptions::new().table("t")).unwrap();
    let data = json!({"a": "${b}", "b": "$1"});
    assert_eq!(
        helpers::insert(&data).columns(&cs).to_sql().unwrap(),
        r#"INSERT INTO "t" ("a","b") VALUES ('${b}','$1')"#
    );
}

#[test]
fn column_set_is_shareable_across_threads() {
    let cs = std::sync::Arc::new(users());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let cs = cs.clone();
            std::thread::spawn(move || {
                let row = json!({"id": i, "firstName": "x", "profile": Value::Null});
                helpers::update(&row).columns(&cs).to_sql().unwrap()
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(
            handle.join().unwrap(),
            r#"UPDATE "app"."users" SET "first_name"='x',"profile"=null,"created"='now'::timestamptz"#
        );
    }
}
