//! `tabledata.insertAll` payloads (streaming inserts).
use std::collections::HashMap;

use crate::ErrorProto;
use crate::value::Value;

/// A loosely typed record, keyed by column name.
pub type Row = HashMap<String, Value>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertRowOptions {
    #[serde(skip_serializing_if = "crate::util::is_false")]
    pub skip_invalid_rows: bool,
    #[serde(skip_serializing_if = "crate::util::is_false")]
    pub ignore_unknown_values: bool,
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertAllRequest<'a> {
    #[serde(flatten)]
    pub options: InsertRowOptions,
    pub trace_id: uuid::Uuid,
    pub rows: Vec<RowWrapper<'a>>,
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowWrapper<'a> {
    pub insert_id: uuid::Uuid,
    pub json: &'a Row,
}

impl<'a> InsertAllRequest<'a> {
    /// Builds a request for `rows`, giving each row a fresh `insertId` so the
    /// service can de-duplicate retried submissions.
    pub fn new(options: InsertRowOptions, rows: impl IntoIterator<Item = &'a Row>) -> Self {
        Self {
            options,
            trace_id: uuid::Uuid::new_v4(),
            rows: rows
                .into_iter()
                .map(|json| RowWrapper {
                    insert_id: uuid::Uuid::new_v4(),
                    json,
                })
                .collect(),
        }
    }

    #[inline]
    pub fn single(row: &'a Row) -> Self {
        Self::new(InsertRowOptions::default(), [row])
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertAllResponse {
    #[serde(default = "Vec::new")]
    pub insert_errors: Vec<InsertErrors>,
}

impl InsertAllResponse {
    #[inline]
    pub fn is_success(&self) -> bool {
        self.insert_errors.is_empty()
    }
}

/// All rejections reported for a single row of the request.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct InsertErrors {
    /// Index of the rejected row within the request.
    pub index: usize,
    #[serde(default = "Vec::new")]
    pub errors: Vec<ErrorProto>,
}

impl std::fmt::Display for InsertErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "row {}: ", self.index)?;

        let mut first = true;
        for error in &self.errors {
            if !first {
                f.write_str("; ")?;
            }
            first = false;
            write!(f, "{error}")?;
        }

        if first {
            f.write_str("rejected without a reason")?;
        }

        Ok(())
    }
}
