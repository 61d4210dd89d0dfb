use chrono::{DateTime, Utc};

use crate::models::{BigQueryError, TableCell, TableRow, TableSchema};

/// Declared column types the service can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Integer,
    Float,
    String,
    Boolean,
    Timestamp,
    Record,
}

impl FieldType {
    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "INTEGER" => Some(Self::Integer),
            "FLOAT" => Some(Self::Float),
            "STRING" => Some(Self::String),
            "BOOLEAN" => Some(Self::Boolean),
            "TIMESTAMP" => Some(Self::Timestamp),
            "RECORD" => Some(Self::Record),
            _ => None,
        }
    }
}

/// A decoded cell value.
///
/// RECORD columns decode to `String` holding the JSON re-encoding of the
/// nested value; nested fields surface as opaque text rather than a typed
/// tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Float(f64),
    String(String),
    Bool(bool),
    Timestamp(DateTime<Utc>),
}

/// One column of a [`DecodePlan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanColumn {
    pub name: String,
    pub field_type: FieldType,
}

/// Positional list of per-column conversions derived from a result schema.
/// Plan order matches schema order, which matches cell order in every raw
/// row; rows carry values by position, not by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodePlan {
    columns: Vec<PlanColumn>,
}

impl DecodePlan {
    pub fn columns(&self) -> &[PlanColumn] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Column names in schema order, for labeling assembled results.
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}

/// Derives a [`DecodePlan`] from the schema returned alongside results.
///
/// Fails with `Schema` when the schema is empty, a field is missing its name
/// or type, or a type tag is not one of the recognized set. Unrecognized tags
/// are rejected loudly rather than decoded as a no-op.
pub fn build_decode_plan(schema: &TableSchema) -> Result<DecodePlan, BigQueryError> {
    if schema.fields.is_empty() {
        return Err(BigQueryError::Schema("schema has no fields".into()));
    }

    let mut columns = Vec::with_capacity(schema.fields.len());
    for (index, field) in schema.fields.iter().enumerate() {
        let name = field
            .name
            .as_deref()
            .ok_or_else(|| BigQueryError::Schema(format!("field {index} has no name")))?;
        let tag = field.field_type.as_deref().ok_or_else(|| {
            BigQueryError::Schema(format!("field `{name}` has no declared type"))
        })?;
        let field_type = FieldType::from_tag(tag).ok_or_else(|| {
            BigQueryError::Schema(format!("field `{name}` has unrecognized type `{tag}`"))
        })?;

        columns.push(PlanColumn {
            name: name.to_string(),
            field_type,
        });
    }

    Ok(DecodePlan { columns })
}

/// Applies a decode plan to one raw row, positionally.
///
/// Fails with `RowShape` when the cell count does not match the plan, and
/// with `Decode` when a scalar cell cannot be converted to its declared type.
pub fn decode_row(row: &TableRow, plan: &DecodePlan) -> Result<Vec<Value>, BigQueryError> {
    if row.f.len() != plan.columns.len() {
        return Err(BigQueryError::RowShape {
            expected: plan.columns.len(),
            got: row.f.len(),
        });
    }

    row.f
        .iter()
        .zip(&plan.columns)
        .map(|(cell, column)| decode_cell(cell, column))
        .collect()
}

fn decode_cell(cell: &TableCell, column: &PlanColumn) -> Result<Value, BigQueryError> {
    let decode_err = |message: String| BigQueryError::Decode {
        column: column.name.clone(),
        message,
    };

    // Scalar cells arrive as JSON strings; only RECORD cells carry nested
    // JSON.
    let string_cell = || {
        cell.v
            .as_str()
            .ok_or_else(|| decode_err(format!("expected a string cell, got {}", cell.v)))
    };

    match column.field_type {
        FieldType::Record => serde_json::to_string(&cell.v)
            .map(Value::String)
            .map_err(|e| decode_err(format!("cannot re-encode record: {e}"))),
        FieldType::Integer => {
            let raw = string_cell()?;
            raw.parse::<i64>()
                .map(Value::Integer)
                .map_err(|e| decode_err(format!("`{raw}` is not an integer: {e}")))
        }
        FieldType::Float => {
            let raw = string_cell()?;
            raw.parse::<f64>()
                .map(Value::Float)
                .map_err(|e| decode_err(format!("`{raw}` is not a float: {e}")))
        }
        FieldType::String => Ok(Value::String(string_cell()?.to_string())),
        // Deliberate quirk kept from the original behavior: anything not
        // case-insensitively equal to "TRUE" decodes to false, malformed
        // input included.
        FieldType::Boolean => Ok(Value::Bool(string_cell()?.eq_ignore_ascii_case("TRUE"))),
        FieldType::Timestamp => {
            let raw = string_cell()?;
            let epoch_seconds = raw
                .parse::<f64>()
                .map_err(|e| decode_err(format!("`{raw}` is not an epoch offset: {e}")))?;
            let micros = (epoch_seconds * 1_000_000.0).round() as i64;
            DateTime::from_timestamp_micros(micros)
                .map(Value::Timestamp)
                .ok_or_else(|| decode_err(format!("`{raw}` is out of timestamp range")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TableFieldSchema;

    fn schema(fields: &[(&str, &str)]) -> TableSchema {
        TableSchema {
            fields: fields
                .iter()
                .map(|(name, tag)| TableFieldSchema {
                    name: Some(name.to_string()),
                    field_type: Some(tag.to_string()),
                })
                .collect(),
        }
    }

    fn row(cells: &[serde_json::Value]) -> TableRow {
        TableRow {
            f: cells.iter().cloned().map(|v| TableCell { v }).collect(),
        }
    }

    #[test]
    fn plan_matches_schema_order() {
        let plan = build_decode_plan(&schema(&[
            ("id", "INTEGER"),
            ("score", "FLOAT"),
            ("name", "STRING"),
        ]))
        .unwrap();

        assert_eq!(plan.len(), 3);
        assert_eq!(plan.column_names(), vec!["id", "score", "name"]);
        assert_eq!(plan.columns()[1].field_type, FieldType::Float);
    }

    #[test]
    fn empty_schema_is_rejected() {
        let err = build_decode_plan(&TableSchema { fields: vec![] }).unwrap_err();
        assert!(matches!(err, BigQueryError::Schema(_)));
    }

    #[test]
    fn field_without_name_or_type_is_rejected() {
        let missing_type = TableSchema {
            fields: vec![TableFieldSchema {
                name: Some("id".into()),
                field_type: None,
            }],
        };
        assert!(matches!(
            build_decode_plan(&missing_type).unwrap_err(),
            BigQueryError::Schema(_)
        ));

        let missing_name = TableSchema {
            fields: vec![TableFieldSchema {
                name: None,
                field_type: Some("INTEGER".into()),
            }],
        };
        assert!(matches!(
            build_decode_plan(&missing_name).unwrap_err(),
            BigQueryError::Schema(_)
        ));
    }

    #[test]
    fn unrecognized_type_tag_fails_loudly() {
        let err = build_decode_plan(&schema(&[("blob", "GEOGRAPHY")])).unwrap_err();
        match err {
            BigQueryError::Schema(msg) => assert!(msg.contains("GEOGRAPHY")),
            other => panic!("expected Schema error, got {other:?}"),
        }
    }

    #[test]
    fn decodes_every_declared_type() {
        let plan = build_decode_plan(&schema(&[
            ("n", "INTEGER"),
            ("x", "FLOAT"),
            ("s", "STRING"),
            ("b", "BOOLEAN"),
            ("ts", "TIMESTAMP"),
            ("nested", "RECORD"),
        ]))
        .unwrap();

        let decoded = decode_row(
            &row(&[
                serde_json::json!("42"),
                serde_json::json!("3.5"),
                serde_json::json!("hello"),
                serde_json::json!("true"),
                serde_json::json!("1446854400.0"),
                serde_json::json!({"k": "v"}),
            ]),
            &plan,
        )
        .unwrap();

        assert_eq!(decoded.len(), plan.len());
        assert_eq!(decoded[0], Value::Integer(42));
        assert_eq!(decoded[1], Value::Float(3.5));
        assert_eq!(decoded[2], Value::String("hello".into()));
        assert_eq!(decoded[3], Value::Bool(true));
        assert_eq!(
            decoded[4],
            Value::Timestamp(DateTime::from_timestamp(1_446_854_400, 0).unwrap())
        );
        assert_eq!(decoded[5], Value::String(r#"{"k":"v"}"#.into()));
    }

    #[test]
    fn boolean_quirk_anything_but_true_is_false() {
        let plan = build_decode_plan(&schema(&[("b", "BOOLEAN")])).unwrap();

        for raw in ["TRUE", "true", "True", "tRuE"] {
            let decoded = decode_row(&row(&[serde_json::json!(raw)]), &plan).unwrap();
            assert_eq!(decoded[0], Value::Bool(true), "raw = {raw:?}");
        }
        for raw in ["FALSE", "false", "", "yes", "1", "not even a boolean"] {
            let decoded = decode_row(&row(&[serde_json::json!(raw)]), &plan).unwrap();
            assert_eq!(decoded[0], Value::Bool(false), "raw = {raw:?}");
        }
    }

    #[test]
    fn malformed_integer_is_a_decode_error() {
        let plan = build_decode_plan(&schema(&[("n", "INTEGER")])).unwrap();
        let err = decode_row(&row(&[serde_json::json!("forty-two")]), &plan).unwrap_err();
        match err {
            BigQueryError::Decode { column, .. } => assert_eq!(column, "n"),
            other => panic!("expected Decode error, got {other:?}"),
        }
    }

    #[test]
    fn fractional_timestamp_keeps_subsecond_precision() {
        let plan = build_decode_plan(&schema(&[("ts", "TIMESTAMP")])).unwrap();
        let decoded = decode_row(&row(&[serde_json::json!("1.5")]), &plan).unwrap();
        assert_eq!(
            decoded[0],
            Value::Timestamp(DateTime::from_timestamp_micros(1_500_000).unwrap())
        );
    }

    #[test]
    fn wrong_cell_count_is_a_row_shape_error() {
        let plan = build_decode_plan(&schema(&[("a", "STRING"), ("b", "STRING")])).unwrap();
        let err = decode_row(&row(&[serde_json::json!("only one")]), &plan).unwrap_err();
        assert!(matches!(
            err,
            BigQueryError::RowShape {
                expected: 2,
                got: 1
            }
        ));
    }
}
