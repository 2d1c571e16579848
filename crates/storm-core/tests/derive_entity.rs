//! Tests for the `#[derive(Entity)]` macro output.
//!
//! These tests verify that the derive macro generates:
//! - the table name, lower-cased or taken from `#[entity(table = ...)]`
//! - the column list without `internal_` and `_` fields
//! - field descriptors whose first entry is the primary key

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use storm_core::ddl::{add_column_sql, create_table_sql};
use storm_core::{ColumnKind, ColumnValue, Entity, GeographyPoint, PostgresNumeric, SqlValue, TableName};
use storm_derive::Entity;

// =============================================================================
// Test: Basic struct with default table name
// =============================================================================

#[allow(dead_code)]
#[derive(Debug, Entity)]
pub struct Person {
    pub id: i64,
    pub name: String,
    pub age: Option<i64>,
    pub internal_cache: Vec<u8>,
    pub _scratch: String,
}

fn alice() -> Person {
    Person {
        id: 5,
        name: "Alice".into(),
        age: None,
        internal_cache: vec![1, 2, 3],
        _scratch: String::new(),
    }
}

#[test]
fn test_person_table_name() {
    assert_eq!(Person::TABLE, "person");
    assert_eq!(Person::table_name(), "person");
}

#[test]
fn test_person_columns_skip_excluded_fields() {
    assert_eq!(Person::COLUMNS, &["id", "name", "age"]);
    assert_eq!(Person::column_names(), Person::COLUMNS);
}

#[test]
fn test_person_fields_in_declaration_order() {
    let person = alice();
    let fields = person.fields();
    let names: Vec<&str> = fields.iter().map(|f| f.name).collect();
    assert_eq!(names, vec!["id", "name", "age"]);

    assert!(fields[0].primary_key);
    assert!(!fields[1].primary_key);
    assert!(!fields[2].primary_key);
}

#[test]
fn test_person_absent_field_is_described() {
    let person = alice();
    let fields = person.fields();
    assert_eq!(fields[2].kind, ColumnKind::Integer);
    assert_eq!(fields[2].render(), None);
    assert_eq!(fields[1].render(), Some(ColumnValue::bound("Alice")));
}

#[test]
fn test_person_primary_key() {
    let person = alice();
    assert_eq!(
        person.primary_key(),
        Some((String::from("id"), Some(SqlValue::Int(5))))
    );
    assert!(!person.key_is_empty());
}

#[test]
fn test_person_create_table() {
    let person = Person {
        id: 0,
        name: String::new(),
        age: None,
        internal_cache: Vec::new(),
        _scratch: String::new(),
    };
    let sql = create_table_sql(&TableName::new(Person::TABLE), &person.fields(), false).unwrap();
    assert_eq!(
        sql,
        "CREATE TABLE IF NOT EXISTS person (id serial NOT NULL, name text, age int8, \
         CONSTRAINT person_key PRIMARY KEY (id) NOT DEFERRABLE INITIALLY IMMEDIATE);"
    );
    assert!(!sql.contains("internal_cache"));
    assert!(!sql.contains("_scratch"));
}

// =============================================================================
// Test: Custom table name and mixed-case field names
// =============================================================================

#[allow(dead_code)]
#[derive(Debug, Entity)]
#[entity(table = "accounts")]
pub struct Account {
    #[allow(non_snake_case)]
    pub Code: String,
    pub active: bool,
    pub tags: Vec<String>,
}

#[test]
fn test_account_custom_table_name() {
    assert_eq!(Account::TABLE, "accounts");
}

#[test]
fn test_account_columns_are_lowercased() {
    assert_eq!(Account::COLUMNS, &["code", "active", "tags"]);

    let account = Account {
        Code: "ab".into(),
        active: true,
        tags: vec!["x".into()],
    };
    let fields = account.fields();
    assert_eq!(fields[0].name, "Code");
    assert_eq!(fields[0].column_name(), "code");
    assert_eq!(fields[0].sql_type(), "text");
    assert_eq!(fields[2].sql_type(), "text");
    assert_eq!(
        fields[2].render(),
        Some(ColumnValue::bound(r#"["x"]"#))
    );
}

#[test]
fn test_account_text_key() {
    let account = Account {
        Code: String::new(),
        active: false,
        tags: Vec::new(),
    };
    assert!(account.key_is_empty());
}

// =============================================================================
// Test: Custom column types and display fields
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Open,
    Closed,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

#[allow(dead_code)]
#[derive(Debug, Entity)]
pub struct Place {
    pub id: i64,
    pub price: PostgresNumeric,
    pub location: Option<GeographyPoint>,
    #[column(display)]
    pub status: Status,
}

fn home() -> Place {
    Place {
        id: 1,
        price: PostgresNumeric::new(10, 2).with_value(Decimal::from_str("9.5").unwrap()),
        location: Some(GeographyPoint::new(48.5, 2.25)),
        status: Status::Open,
    }
}

#[test]
fn test_place_custom_sql_types() {
    let place = home();
    let fields = place.fields();
    assert_eq!(fields[1].sql_type(), "numeric(10,2)");
    assert_eq!(fields[2].sql_type(), "geography(Point,4326)");
    assert_eq!(fields[3].sql_type(), "text");
}

#[test]
fn test_place_rendered_values() {
    let place = home();
    let fields = place.fields();
    assert_eq!(
        fields[1].render(),
        Some(ColumnValue::Bound(SqlValue::Numeric(
            Decimal::from_str("9.50").unwrap()
        )))
    );
    assert_eq!(
        fields[2].render(),
        Some(ColumnValue::raw("ST_SetSRID(ST_MakePoint(2.25,48.5),4326)"))
    );
    assert_eq!(fields[3].render(), Some(ColumnValue::bound("open")));

    let closed = Place {
        status: Status::Closed,
        ..home()
    };
    assert_eq!(closed.fields()[3].render(), Some(ColumnValue::bound("closed")));
}

#[test]
fn test_place_select_expressions() {
    let place = home();
    let fields = place.fields();
    assert_eq!(fields[1].select_expression(), "price");
    assert!(fields[2]
        .select_expression()
        .starts_with("jsonb_build_object('latitude',ST_Y(location::geometry)"));
}

#[test]
fn test_place_add_numeric_column() {
    let place = home();
    let fields = place.fields();
    assert_eq!(
        add_column_sql(&TableName::new(Place::TABLE), &fields[1]),
        "ALTER TABLE place ADD COLUMN price numeric(10,2) DEFAULT 9.50"
    );
}

#[test]
fn test_place_absent_custom_values_keep_their_types() {
    let unplaced = Place {
        location: None,
        ..home()
    };
    let fields = unplaced.fields();
    assert_eq!(fields[2].value, None);
    assert_eq!(fields[2].sql_type(), "geography(Point,4326)");

    let sql = create_table_sql(&TableName::new(Place::TABLE), &fields, false).unwrap();
    assert!(sql.contains("location geography(Point,4326)"));
}

#[allow(dead_code)]
#[derive(Debug, Entity)]
pub struct Quote {
    pub id: i64,
    pub amount: Option<PostgresNumeric>,
}

#[test]
fn test_absent_numeric_is_numeric() {
    let quote = Quote { id: 1, amount: None };
    let fields = quote.fields();
    assert_eq!(fields[1].sql_type(), "numeric");
    assert_eq!(
        add_column_sql(&TableName::new(Quote::TABLE), &fields[1]),
        "ALTER TABLE quote ADD COLUMN amount numeric"
    );
}

// =============================================================================
// Test: Schema attribute
// =============================================================================

#[allow(dead_code)]
#[derive(Debug, Entity)]
#[entity(schema = "billing", table = "invoices")]
pub struct Invoice {
    pub id: i64,
}

#[test]
fn test_schema_attribute() {
    assert_eq!(Invoice::SCHEMA, Some("billing"));
    assert_eq!(Invoice::TABLE, "invoices");
    assert_eq!(Invoice::qualified_table(), "billing.invoices");
    assert_eq!(Person::SCHEMA, None);
    assert_eq!(Invoice { id: 1 }.fields().len(), 1);
}
