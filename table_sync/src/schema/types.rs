//! Type definitions for declared and introspected tables

use indexmap::IndexMap;
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::utils::naming::{field_key, unquote};

/// The attributes of a single column.
///
/// Flags are plain booleans: `false` and "not set" are the same thing, which
/// is also how the store reports them (a NOT NULL column simply has no
/// `nullable`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldAttributes {
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint: Option<u32>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub unsigned: bool,
    #[serde(default, alias = "null", skip_serializing_if = "is_false")]
    pub nullable: bool,
    #[serde(
        default,
        deserialize_with = "deserialize_default",
        skip_serializing_if = "Option::is_none"
    )]
    pub default: Option<String>,
    #[serde(default, alias = "auto_increment", skip_serializing_if = "is_false")]
    pub auto_increment: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub key: bool,
    #[serde(default, alias = "primary_key", skip_serializing_if = "is_false")]
    pub primary_key: bool,
    #[serde(
        default,
        deserialize_with = "deserialize_index",
        skip_serializing_if = "Option::is_none"
    )]
    pub index: Option<IndexName>,
}

impl FieldAttributes {
    /// Create attributes for a column of the given base type
    pub fn new(field_type: &str) -> Self {
        Self {
            field_type: field_type.to_string(),
            ..Default::default()
        }
    }

    pub fn constraint(mut self, constraint: u32) -> Self {
        self.constraint = Some(constraint);
        self
    }

    pub fn unsigned(mut self) -> Self {
        self.unsigned = true;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn default_value(mut self, default: &str) -> Self {
        self.default = Some(default.to_string());
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    pub fn key(mut self) -> Self {
        self.key = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn index(mut self, index: IndexName) -> Self {
        self.index = Some(index);
        self
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Defaults are kept as strings. Numbers and booleans in a schema file are
/// turned into the string the store would report for them.
fn deserialize_default<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(if b { "1" } else { "0" }.to_string())),
        Some(other) => Err(de::Error::custom(format!(
            "default must be a scalar value, got {}",
            other
        ))),
    }
}

fn deserialize_index<'de, D>(deserializer: D) -> Result<Option<IndexName>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) | Some(Value::Bool(false)) => Ok(None),
        Some(Value::Bool(true)) => Ok(Some(IndexName::SameAsField)),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(IndexName::Named(s))),
        Some(other) => Err(de::Error::custom(format!(
            "index must be a name or a boolean, got {}",
            other
        ))),
    }
}

/// Name of a secondary index on one column
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndexName {
    /// The index is named after the column it covers (`index = true`)
    SameAsField,
    Named(String),
}

impl IndexName {
    /// The concrete index name for the given field
    pub fn resolve(&self, field: &str) -> String {
        match self {
            IndexName::SameAsField => unquote(field).to_string(),
            IndexName::Named(name) => name.clone(),
        }
    }
}

impl Serialize for IndexName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            IndexName::SameAsField => serializer.serialize_bool(true),
            IndexName::Named(name) => serializer.serialize_str(name),
        }
    }
}

/// What a definition says about one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSpec {
    /// The field must not exist
    Remove,
    Define(FieldAttributes),
}

impl FieldSpec {
    pub fn attributes(&self) -> Option<&FieldAttributes> {
        match self {
            FieldSpec::Remove => None,
            FieldSpec::Define(attributes) => Some(attributes),
        }
    }

    /// Interpret a loosely typed field value: `false`, `null` and empty
    /// collections mean the field is to be removed
    fn from_value(value: Value) -> std::result::Result<Self, String> {
        match value {
            Value::Null | Value::Bool(false) => Ok(FieldSpec::Remove),
            Value::String(s) if s.is_empty() => Ok(FieldSpec::Remove),
            Value::Array(items) if items.is_empty() => Ok(FieldSpec::Remove),
            Value::Object(map) if map.is_empty() => Ok(FieldSpec::Remove),
            Value::Object(map) => serde_json::from_value(Value::Object(map))
                .map(FieldSpec::Define)
                .map_err(|e| e.to_string()),
            other => Err(format!(
                "expected a table of field attributes or false, got {}",
                other
            )),
        }
    }
}

impl From<FieldAttributes> for FieldSpec {
    fn from(attributes: FieldAttributes) -> Self {
        FieldSpec::Define(attributes)
    }
}

impl<'de> Deserialize<'de> for FieldSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        FieldSpec::from_value(value).map_err(de::Error::custom)
    }
}

impl Serialize for FieldSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldSpec::Remove => serializer.serialize_bool(false),
            FieldSpec::Define(attributes) => attributes.serialize(serializer),
        }
    }
}

/// A table as a name plus its fields in declaration order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDefinition {
    pub name: String,
    fields: IndexMap<String, FieldSpec>,
}

impl TableDefinition {
    /// Create a new table definition with no fields
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            fields: IndexMap::new(),
        }
    }

    /// Add or replace a field. Reserved names are stored backticked.
    pub fn insert(&mut self, field: &str, spec: impl Into<FieldSpec>) {
        self.fields.insert(field_key(field), spec.into());
    }

    /// Builder form of [`TableDefinition::insert`]
    pub fn with_field(mut self, field: &str, spec: impl Into<FieldSpec>) -> Self {
        self.insert(field, spec);
        self
    }

    /// Builder shorthand for a field that must not exist
    pub fn without_field(self, field: &str) -> Self {
        self.with_field(field, FieldSpec::Remove)
    }

    pub fn get(&self, field: &str) -> Option<&FieldSpec> {
        self.fields.get(&field_key(field))
    }

    /// Attributes of a defined field
    pub fn attributes(&self, field: &str) -> Option<&FieldAttributes> {
        self.get(field).and_then(FieldSpec::attributes)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(&field_key(field))
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.fields.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    /// Defined fields only, in declaration order
    pub fn defined_fields(&self) -> impl Iterator<Item = (&str, &FieldAttributes)> {
        self.fields()
            .filter_map(|(name, spec)| spec.attributes().map(|attrs| (name, attrs)))
    }

    /// Every defined field marked as primary key
    pub fn primary_key_fields(&self) -> Vec<&str> {
        self.defined_fields()
            .filter(|(_, attrs)| attrs.primary_key)
            .map(|(name, _)| name)
            .collect()
    }

    /// The primary key field. When several fields claim it the last one wins.
    pub fn primary_key(&self) -> Option<&str> {
        self.primary_key_fields().last().copied()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Column name => index that covers it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexDescriptor(IndexMap<String, IndexName>);

impl IndexDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: &str, index: IndexName) {
        self.0.insert(column.to_string(), index);
    }

    pub fn get(&self, column: &str) -> Option<&IndexName> {
        self.0.get(column)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Every table a component declares, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclaredSchema {
    tables: IndexMap<String, TableDefinition>,
}

impl DeclaredSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table to the schema
    pub fn add_table(&mut self, table: TableDefinition) {
        self.tables.insert(table.name.clone(), table);
    }

    pub fn table(&self, name: &str) -> Option<&TableDefinition> {
        self.tables.get(name)
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableDefinition> {
        self.tables.values()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl FromIterator<TableDefinition> for DeclaredSchema {
    fn from_iter<I: IntoIterator<Item = TableDefinition>>(iter: I) -> Self {
        let mut schema = DeclaredSchema::new();
        for table in iter {
            schema.add_table(table);
        }
        schema
    }
}

impl<'de> Deserialize<'de> for DeclaredSchema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = IndexMap::<String, IndexMap<String, FieldSpec>>::deserialize(deserializer)?;

        Ok(raw
            .into_iter()
            .map(|(table_name, fields)| {
                fields
                    .into_iter()
                    .fold(TableDefinition::new(&table_name), |table, (field, spec)| {
                        table.with_field(&field, spec)
                    })
            })
            .collect())
    }
}

impl Serialize for DeclaredSchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(
            self.tables
                .iter()
                .map(|(name, table)| (name, &table.fields)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const CRYPTO_TOML: &str = r#"
        [crypto_settings]
        legacy = false

        [crypto_settings.site_id]
        type = "int"
        constraint = 4
        default = "1"

        [crypto_settings.key]
        type = "varchar"
        constraint = 255

        [crypto_settings.value]
        type = "text"
        null = true

        [crypto_settings.serialized]
        type = "int"
        constraint = 1
        nullable = true
    "#;

    #[test]
    fn test_declared_schema_from_toml() {
        let schema: DeclaredSchema = toml::from_str(CRYPTO_TOML).unwrap();
        let table = schema.table("crypto_settings").unwrap();

        assert_eq!(
            table.attributes("site_id"),
            Some(&FieldAttributes::new("int").constraint(4).default_value("1"))
        );
        // reserved names are stored quoted and found either way
        assert!(table.contains("key"));
        assert!(table.contains("`key`"));
        assert!(table.attributes("value").unwrap().nullable);
        assert_eq!(table.get("legacy"), Some(&FieldSpec::Remove));
    }

    #[test]
    fn test_declaration_order_is_kept() {
        let schema: DeclaredSchema = toml::from_str(CRYPTO_TOML).unwrap();
        let names: Vec<&str> = schema
            .table("crypto_settings")
            .unwrap()
            .fields()
            .map(|(name, _)| name)
            .collect();

        assert_eq!(names, vec!["legacy", "site_id", "`key`", "value", "serialized"]);
    }

    #[test]
    fn test_falsy_values_mean_remove() {
        let schema: DeclaredSchema = serde_json::from_str(
            r#"{"t": {"a": false, "b": null, "c": {}, "d": [], "e": ""}}"#,
        )
        .unwrap();
        let table = schema.table("t").unwrap();

        assert!(table.fields().all(|(_, spec)| *spec == FieldSpec::Remove));
        assert_eq!(table.len(), 5);
    }

    #[test]
    fn test_attribute_aliases_and_coercion() {
        let schema: DeclaredSchema = serde_json::from_str(
            r#"{"t": {"id": {"type": "int", "unsigned": true, "auto_increment": true,
                              "primary_key": true, "default": 0},
                      "flag": {"type": "tinyint", "default": true, "index": true},
                      "slug": {"type": "varchar", "index": "idx_slug", "key": true}}}"#,
        )
        .unwrap();
        let table = schema.table("t").unwrap();

        let id = table.attributes("id").unwrap();
        assert!(id.auto_increment && id.primary_key && id.unsigned);
        assert_eq!(id.default.as_deref(), Some("0"));

        let flag = table.attributes("flag").unwrap();
        assert_eq!(flag.default.as_deref(), Some("1"));
        assert_eq!(flag.index, Some(IndexName::SameAsField));

        let slug = table.attributes("slug").unwrap();
        assert_eq!(slug.index, Some(IndexName::Named("idx_slug".to_string())));
        assert!(slug.key);
    }

    #[test]
    fn test_missing_type_is_rejected() {
        let result: Result<DeclaredSchema, _> =
            serde_json::from_str(r#"{"t": {"a": {"constraint": 4}}}"#);
        assert!(result.is_err());

        let result: Result<DeclaredSchema, _> = serde_json::from_str(r#"{"t": {"a": true}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_primary_key_last_wins() {
        let table = TableDefinition::new("t")
            .with_field("a", FieldAttributes::new("int").primary_key())
            .with_field("b", FieldAttributes::new("int").primary_key())
            .with_field("c", FieldAttributes::new("int"));

        assert_eq!(table.primary_key_fields(), vec!["a", "b"]);
        assert_eq!(table.primary_key(), Some("b"));
    }

    #[test]
    fn test_serialize_round_trip_through_yaml() {
        let table = TableDefinition::new("t")
            .with_field(
                "id",
                FieldAttributes::new("int")
                    .constraint(10)
                    .unsigned()
                    .auto_increment()
                    .primary_key(),
            )
            .with_field("key", FieldAttributes::new("varchar").index(IndexName::SameAsField))
            .without_field("old");
        let schema: DeclaredSchema = std::iter::once(table).collect();

        let yaml = serde_yaml::to_string(&schema).unwrap();
        let parsed: DeclaredSchema = serde_yaml::from_str(&yaml).unwrap();

        assert_eq!(parsed, schema);
    }

    #[test]
    fn test_index_name_resolution() {
        assert_eq!(IndexName::SameAsField.resolve("`key`"), "key");
        assert_eq!(IndexName::Named("idx".to_string()).resolve("email"), "idx");
    }
}
