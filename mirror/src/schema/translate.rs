use crate::bail;
use crate::error::{ErrorKind, MirrorResult};
use crate::types::{ColumnSchema, SourceColumn, SourceType};

/// Returns the destination column type for a supported source scalar type.
///
/// Returns [`None`] for composite types (`RECORD`, `STRUCT`) and for any
/// type name absent from the mapping; callers turn that into a translation
/// failure that names the column.
pub fn destination_type_for(source_type: &SourceType) -> Option<&'static str> {
    match source_type {
        SourceType::String => Some("String"),
        SourceType::Float => Some("Float32"),
        SourceType::Float64 => Some("Float64"),
        SourceType::Integer | SourceType::Int64 => Some("Int64"),
        SourceType::Timestamp | SourceType::Datetime | SourceType::Time => Some("DateTime"),
        SourceType::Date => Some("Date"),
        // Byte blobs land as opaque strings; the destination has no
        // dedicated blob type over the bulk-load path.
        SourceType::Bytes => Some("String"),
        SourceType::Bool | SourceType::Boolean => Some("Boolean"),
        SourceType::Numeric | SourceType::Decimal => Some("Decimal"),
        SourceType::BigNumeric | SourceType::BigDecimal => Some("Decimal256"),
        SourceType::Json => Some("JSON"),
        SourceType::Record | SourceType::Struct | SourceType::Unknown(_) => None,
    }
}

/// Translates the full source column list into the destination schema.
///
/// Total-or-fail: every column must map, and the first column that does not
/// fails the whole translation with [`ErrorKind::UnsupportedColumnType`],
/// naming the column. This runs strictly before any destination-side
/// mutation, so no partially-shaped staging table is ever created for a
/// doomed sync.
pub fn translate_columns(source_columns: &[SourceColumn]) -> MirrorResult<Vec<ColumnSchema>> {
    let mut columns = Vec::with_capacity(source_columns.len());

    for column in source_columns {
        let Some(dest_type) = destination_type_for(&column.source_type) else {
            bail!(
                ErrorKind::UnsupportedColumnType,
                "Column type is unsupported",
                format!(
                    "column `{}` has unsupported type `{}`",
                    column.name, column.source_type
                )
            );
        };

        columns.push(ColumnSchema {
            name: column.name.clone(),
            source_type: column.source_type.clone(),
            dest_type,
        });
    }

    Ok(columns)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_every_supported_scalar_type() {
        let cases = [
            ("STRING", "String"),
            ("FLOAT", "Float32"),
            ("FLOAT64", "Float64"),
            ("INTEGER", "Int64"),
            ("INT64", "Int64"),
            ("TIMESTAMP", "DateTime"),
            ("DATETIME", "DateTime"),
            ("TIME", "DateTime"),
            ("DATE", "Date"),
            ("BYTES", "String"),
            ("BOOL", "Boolean"),
            ("BOOLEAN", "Boolean"),
            ("NUMERIC", "Decimal"),
            ("DECIMAL", "Decimal"),
            ("BIGNUMERIC", "Decimal256"),
            ("BIGDECIMAL", "Decimal256"),
            ("JSON", "JSON"),
        ];

        for (source, expected) in cases {
            assert_eq!(
                destination_type_for(&SourceType::from_name(source)),
                Some(expected),
                "source type {source}"
            );
        }
    }

    #[test]
    fn translation_is_deterministic_and_ordered() {
        let source = vec![
            SourceColumn::new("id", SourceType::Int64),
            SourceColumn::new("name", SourceType::String),
            SourceColumn::new("score", SourceType::Float64),
        ];

        let first = translate_columns(&source).unwrap();
        let second = translate_columns(&source).unwrap();

        assert_eq!(first, second);
        assert_eq!(
            first.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
            vec!["id", "name", "score"]
        );
        assert_eq!(first[0].dest_type, "Int64");
    }

    #[test]
    fn nested_types_fail_and_name_the_column() {
        for nested in [SourceType::Record, SourceType::Struct] {
            let source = vec![
                SourceColumn::new("id", SourceType::Int64),
                SourceColumn::new("payload", nested.clone()),
            ];

            let error = translate_columns(&source).unwrap_err();
            assert_eq!(error.kind(), ErrorKind::UnsupportedColumnType);
            assert!(error.detail().unwrap().contains("`payload`"));
            assert!(error.detail().unwrap().contains(nested.name()));
        }
    }

    #[test]
    fn unknown_types_fail_and_name_the_column() {
        let source = vec![SourceColumn::new(
            "area",
            SourceType::from_name("GEOGRAPHY"),
        )];

        let error = translate_columns(&source).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::UnsupportedColumnType);
        assert!(error.detail().unwrap().contains("`area`"));
        assert!(error.detail().unwrap().contains("GEOGRAPHY"));
    }
}
