use crate::TableReference;
use crate::builders::Unset;
use crate::builders::table_field_schema::TableFieldSchemaBuilder;
use crate::util;

/// The subset of the table resource this crate reads and writes.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
#[serde(bound(deserialize = "S: serde::Deserialize<'de>"))]
pub struct Table<S = Box<str>> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<S>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<S>,
    pub table_reference: TableReference<S>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friendly_name: Option<S>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<S>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<TableSchema<S>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "util::uint64::optional"
    )]
    pub num_rows: Option<u64>,
}

impl<S> Table<S> {
    pub const fn new(table_reference: TableReference<S>, schema: TableSchema<S>) -> Self {
        Self {
            id: None,
            etag: None,
            table_reference,
            friendly_name: None,
            description: None,
            schema: Some(schema),
            num_rows: None,
        }
    }
}

/// Ordered column list. Field order is significant, query results are decoded
/// in this order.
#[derive(Debug, Clone, PartialEq, Default, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
#[serde(bound(deserialize = "S: serde::Deserialize<'de>"))]
pub struct TableSchema<S = Box<str>> {
    #[serde(default = "Vec::new")]
    pub fields: Vec<TableFieldSchema<S>>,
}

impl<S> TableSchema<S> {
    pub const fn new(fields: Vec<TableFieldSchema<S>>) -> Self {
        Self { fields }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field_names(&self) -> impl ExactSizeIterator<Item = &S> + '_ {
        self.fields.iter().map(|field| &field.name)
    }
}

impl<S> FromIterator<TableFieldSchema<S>> for TableSchema<S> {
    fn from_iter<I: IntoIterator<Item = TableFieldSchema<S>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
#[serde(bound(deserialize = "S: serde::Deserialize<'de>"))]
pub struct TableFieldSchema<S = Box<str>> {
    pub name: S,
    #[serde(rename = "type")]
    pub ty: FieldType,
    #[serde(default)]
    pub mode: FieldMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<S>,
    /// Sub-fields, only present for [`FieldType::Record`].
    #[serde(default = "Vec::new", skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<TableFieldSchema<S>>,
}

impl<S> TableFieldSchema<S> {
    pub const fn builder(name: S) -> TableFieldSchemaBuilder<S, Unset> {
        TableFieldSchemaBuilder::new(name)
    }

    pub const fn new(name: S, ty: FieldType, mode: FieldMode) -> Self {
        Self {
            name,
            ty,
            mode,
            description: None,
            fields: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldMode {
    #[default]
    Nullable,
    Repeated,
    Required,
}

impl FieldMode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Nullable => "Nullable",
            Self::Repeated => "Repeated",
            Self::Required => "Required",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldType {
    String,
    Bytes,
    #[serde(alias = "INT64")]
    Integer,
    #[serde(alias = "FLOAT64")]
    Float,
    #[serde(rename = "BOOLEAN", alias = "BOOL")]
    Bool,
    Timestamp,
    Date,
    Time,
    DateTime,
    Geography,
    Numeric,
    BigNumeric,
    Json,
    #[serde(alias = "STRUCT")]
    Record,
    Range,
    Interval,
    /// Any type newer than this enum. Cells of this type decode as strings.
    #[serde(other)]
    Unknown,
}

impl FieldType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Bytes => "Bytes",
            Self::Integer => "Int64",
            Self::Float => "Float64",
            Self::Bool => "Bool",
            Self::Timestamp => "Timestamp",
            Self::Date => "Date",
            Self::Time => "Time",
            Self::DateTime => "DateTime",
            Self::Geography => "Geography",
            Self::Numeric => "Numeric",
            Self::BigNumeric => "BigNumeric",
            Self::Json => "Json",
            Self::Record => "Struct",
            Self::Range => "Range",
            Self::Interval => "Interval",
            Self::Unknown => "Unknown",
        }
    }
}
