use super::RawRow;
use crate::table::TableSchema;
use crate::value::{DecodeError, Value, unwrap_cell};

/// Decoded query output. Every entry in `rows` has exactly `headers.len()`
/// values, in header order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryResult {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    /// Total number of rows the query produced, which may exceed `rows.len()`
    /// when the result was capped.
    pub total_rows: u64,
}

impl QueryResult {
    /// Decodes up to `limit` raw rows against `schema`.
    ///
    /// Rows are built by walking the schema rather than the cells, so a short row
    /// is padded with [`Value::Null`] and surplus cells are dropped.
    pub fn decode<S: AsRef<str>>(
        schema: &TableSchema<S>,
        raw_rows: &[RawRow],
        total_rows: u64,
        limit: Option<usize>,
    ) -> Result<Self, DecodeError> {
        let headers = schema
            .field_names()
            .map(|name| name.as_ref().to_owned())
            .collect::<Vec<_>>();

        let take = limit.unwrap_or(usize::MAX).min(raw_rows.len());
        let mut rows = Vec::with_capacity(take);

        for raw in &raw_rows[..take] {
            let mut row = Vec::with_capacity(headers.len());

            for (idx, field) in schema.fields.iter().enumerate() {
                let value = match raw.f.get(idx) {
                    Some(cell) => Value::decode(field, unwrap_cell(cell))?,
                    None => Value::Null,
                };
                row.push(value);
            }

            rows.push(row);
        }

        Ok(Self {
            headers,
            rows,
            total_rows,
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.headers.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of the column called `name`, if any.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    pub fn into_parts(self) -> (Vec<String>, Vec<Vec<Value>>) {
        (self.headers, self.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryResponse;
    use crate::table::TableFieldSchema;

    const RESPONSE: &str = r#"{
        "kind": "bigquery#queryResponse",
        "schema": {
            "fields": [
                {"name": "id", "type": "INTEGER", "mode": "NULLABLE"},
                {"name": "amount", "type": "FLOAT", "mode": "NULLABLE"},
                {"name": "note", "type": "STRING", "mode": "NULLABLE"}
            ]
        },
        "jobReference": {"projectId": "proj", "jobId": "job_1", "location": "US"},
        "totalRows": "3",
        "rows": [
            {"f": [{"v": "1"}, {"v": "9.5"}, {"v": "first"}]},
            {"f": [{"v": "2"}, {"v": null}]},
            {"f": [{"v": "3"}, {"v": "0.25"}, {"v": "third"}, {"v": "extra"}]}
        ],
        "totalBytesProcessed": "0",
        "jobComplete": true,
        "cacheHit": false
    }"#;

    #[test]
    fn test_decode_rows_have_header_width() {
        let resp: QueryResponse = serde_json::from_str(RESPONSE).unwrap();
        let schema = resp.schema.as_ref().unwrap();

        let result =
            QueryResult::decode(schema, &resp.rows, resp.total_rows.unwrap(), None).unwrap();

        assert_eq!(result.headers, ["id", "amount", "note"]);
        assert_eq!(result.total_rows, 3);
        assert!(result.rows.iter().all(|row| row.len() == result.width()));

        assert_eq!(
            result.rows[0],
            [Value::Integer(1), Value::Float(9.5), "first".into()]
        );
        assert_eq!(result.rows[1], [Value::Integer(2), Value::Null, Value::Null]);
        assert_eq!(
            result.rows[2],
            [Value::Integer(3), Value::Float(0.25), "third".into()]
        );
        assert_eq!(result.column_index("amount"), Some(1));
    }

    #[test]
    fn test_decode_respects_limit() {
        let resp: QueryResponse = serde_json::from_str(RESPONSE).unwrap();
        let schema = resp.schema.as_ref().unwrap();

        let result = QueryResult::decode(schema, &resp.rows, 3, Some(2)).unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result.total_rows, 3);
    }

    #[test]
    fn test_decode_error_names_column() {
        let schema = TableSchema::new(vec![TableFieldSchema::builder("id").int().required()]);
        let rows = vec![RawRow {
            f: vec![serde_json::json!({"v": "abc"})],
        }];

        let err = QueryResult::decode(&schema, &rows, 1, None).unwrap_err();
        assert!(err.to_string().contains("'id'"));
    }
}
