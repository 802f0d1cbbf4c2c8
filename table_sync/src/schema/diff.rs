//! Table reconciliation
//!
//! Compares a declared table against what the store currently holds and
//! produces the ordered list of DDL intents that closes the gap. Nothing here
//! touches the store: introspection and the live column check happen before,
//! execution after.

use indexmap::IndexMap;
use std::collections::HashSet;
use std::fmt;

use crate::schema::types::{FieldAttributes, FieldSpec, TableDefinition};
use crate::utils::naming::unquote;

/// A table to be created from scratch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTable {
    pub name: String,
    pub columns: IndexMap<String, FieldAttributes>,
    pub primary_key: Option<String>,
    /// Plain secondary keys created along with the table
    pub keys: Vec<String>,
}

/// A single structural change, not yet applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DdlIntent {
    CreateTable(NewTable),
    AddColumn {
        table: String,
        field: String,
        attributes: FieldAttributes,
    },
    /// Restates the complete column definition, not a delta
    ModifyColumn {
        table: String,
        field: String,
        attributes: FieldAttributes,
    },
    DropColumn {
        table: String,
        field: String,
    },
    CreateIndex {
        table: String,
        field: String,
        name: String,
    },
}

impl DdlIntent {
    pub fn table(&self) -> &str {
        match self {
            DdlIntent::CreateTable(table) => &table.name,
            DdlIntent::AddColumn { table, .. }
            | DdlIntent::ModifyColumn { table, .. }
            | DdlIntent::DropColumn { table, .. }
            | DdlIntent::CreateIndex { table, .. } => table,
        }
    }
}

impl fmt::Display for DdlIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DdlIntent::CreateTable(table) => {
                write!(f, "+ table {} ({} columns", table.name, table.columns.len())?;
                if let Some(pk) = &table.primary_key {
                    write!(f, ", primary key {}", pk)?;
                }
                write!(f, ")")
            }
            DdlIntent::AddColumn {
                table,
                field,
                attributes,
            } => write!(f, "+ {}.{}: {}", table, field, attributes.field_type),
            DdlIntent::ModifyColumn {
                table,
                field,
                attributes,
            } => write!(f, "~ {}.{}: {}", table, field, attributes.field_type),
            DdlIntent::DropColumn { table, field } => write!(f, "- {}.{}", table, field),
            DdlIntent::CreateIndex { table, field, name } => {
                write!(f, "+ index {} on {}.{}", name, table, field)
            }
        }
    }
}

/// One entry of the flat attribute record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    Type,
    Constraint,
    Unsigned,
    Nullable,
    Default,
    AutoIncrement,
    Key,
    PrimaryKey,
    Index,
}

#[derive(Debug, PartialEq, Eq)]
enum AttributeValue {
    Absent,
    Set,
    Number(u32),
    Text(String),
}

impl From<bool> for AttributeValue {
    fn from(flag: bool) -> Self {
        if flag {
            AttributeValue::Set
        } else {
            AttributeValue::Absent
        }
    }
}

impl From<Option<u32>> for AttributeValue {
    fn from(value: Option<u32>) -> Self {
        value.map_or(AttributeValue::Absent, AttributeValue::Number)
    }
}

impl From<Option<String>> for AttributeValue {
    fn from(value: Option<String>) -> Self {
        value.map_or(AttributeValue::Absent, AttributeValue::Text)
    }
}

/// Project a field's attributes onto the flat record used for comparison.
///
/// The store cannot tell a plain key from an index named after its column,
/// so indexing is compared by effective index name: `key` alone means the
/// index named after the field, and any index implies `key`.
fn attribute_record(field: &str, attrs: &FieldAttributes) -> [(Attribute, AttributeValue); 9] {
    let index = match (&attrs.index, attrs.key) {
        (Some(index), _) => Some(index.resolve(field)),
        (None, true) => Some(unquote(field).to_string()),
        (None, false) => None,
    };

    [
        (Attribute::Type, AttributeValue::Text(attrs.field_type.clone())),
        (Attribute::Constraint, attrs.constraint.into()),
        (Attribute::Unsigned, attrs.unsigned.into()),
        (Attribute::Nullable, attrs.nullable.into()),
        (Attribute::Default, attrs.default.clone().into()),
        (Attribute::AutoIncrement, attrs.auto_increment.into()),
        (Attribute::Key, index.is_some().into()),
        (Attribute::PrimaryKey, attrs.primary_key.into()),
        (Attribute::Index, index.into()),
    ]
}

/// Attributes whose values differ between the two sides.
///
/// Shallow, exact comparison per attribute; an attribute set on only one
/// side counts as a difference.
pub fn attribute_difference(
    field: &str,
    declared: &FieldAttributes,
    current: &FieldAttributes,
) -> Vec<Attribute> {
    attribute_record(field, declared)
        .into_iter()
        .zip(attribute_record(field, current))
        .filter(|((_, wanted), (_, actual))| wanted != actual)
        .map(|((attribute, _), _)| attribute)
        .collect()
}

/// The changes needed to bring one table in line with its declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDiff {
    pub table: String,
    pub intents: Vec<DdlIntent>,
}

impl TableDiff {
    /// Reconcile a declared table against the introspected one.
    ///
    /// `current` is `None` when the table does not exist. `physical` holds the
    /// declared field names a live existence check found on the table; it is
    /// consulted alongside `current` because the two reads are not atomic.
    pub fn generate(
        declared: &TableDefinition,
        current: Option<&TableDefinition>,
        physical: &HashSet<String>,
    ) -> Self {
        let intents = match current {
            None => Self::create_table(declared),
            Some(current) => Self::alter_table(declared, current, physical),
        };

        Self {
            table: declared.name.clone(),
            intents,
        }
    }

    fn create_table(declared: &TableDefinition) -> Vec<DdlIntent> {
        let mut columns = IndexMap::new();
        let mut keys = Vec::new();
        let mut indexes = Vec::new();

        for (field, attrs) in declared.defined_fields() {
            match &attrs.index {
                Some(index) => indexes.push(DdlIntent::CreateIndex {
                    table: declared.name.clone(),
                    field: field.to_string(),
                    name: index.resolve(field),
                }),
                // the explicit index already covers the column
                None if attrs.key => keys.push(field.to_string()),
                None => {}
            }
            columns.insert(field.to_string(), attrs.clone());
        }

        let candidates = declared.primary_key_fields();
        if candidates.len() > 1 {
            tracing::warn!(
                table = %declared.name,
                fields = ?candidates,
                "Several fields marked as primary key, using the last one"
            );
        }

        let mut intents = vec![DdlIntent::CreateTable(NewTable {
            name: declared.name.clone(),
            columns,
            primary_key: declared.primary_key().map(str::to_string),
            keys,
        })];
        intents.extend(indexes);
        intents
    }

    fn alter_table(
        declared: &TableDefinition,
        current: &TableDefinition,
        physical: &HashSet<String>,
    ) -> Vec<DdlIntent> {
        let mut intents = Vec::new();

        for (field, spec) in declared.fields() {
            let exists = physical.contains(field);

            match (spec, current.attributes(field)) {
                (FieldSpec::Remove, _) => {
                    if exists {
                        intents.push(DdlIntent::DropColumn {
                            table: declared.name.clone(),
                            field: field.to_string(),
                        });
                    }
                }
                (FieldSpec::Define(attrs), None) => {
                    if exists {
                        tracing::debug!(
                            table = %declared.name,
                            field,
                            "Column appeared after introspection, not adding it"
                        );
                    } else {
                        intents.push(DdlIntent::AddColumn {
                            table: declared.name.clone(),
                            field: field.to_string(),
                            attributes: attrs.clone(),
                        });
                    }
                }
                (FieldSpec::Define(attrs), Some(existing)) => {
                    let changed = attribute_difference(field, attrs, existing);
                    if changed.is_empty() {
                        continue;
                    }

                    if exists {
                        tracing::debug!(
                            table = %declared.name,
                            field,
                            changed = ?changed,
                            "Column differs from declaration"
                        );
                        intents.push(DdlIntent::ModifyColumn {
                            table: declared.name.clone(),
                            field: field.to_string(),
                            attributes: attrs.clone(),
                        });
                    } else {
                        tracing::debug!(
                            table = %declared.name,
                            field,
                            "Column vanished after introspection, not modifying it"
                        );
                    }
                }
            }
        }

        intents
    }

    /// Check if the diff is empty (no changes needed)
    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }

    pub fn len(&self) -> usize {
        self.intents.len()
    }
}
