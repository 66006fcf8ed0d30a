//! Data types shared across the sync pipeline.

use std::fmt;

pub use config::shared::{CopyMode, IndexSpec, SourceTableRef};

/// Primitive column type as reported by the source engine's metadata.
///
/// The set is closed over the types the translator knows how to map.
/// Composite types keep their own variants so rejection can name them, and
/// anything else is carried verbatim in [`SourceType::Unknown`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceType {
    String,
    Float,
    Float64,
    Integer,
    Int64,
    Timestamp,
    Datetime,
    Date,
    Time,
    Bytes,
    Bool,
    Boolean,
    Numeric,
    Decimal,
    BigNumeric,
    BigDecimal,
    Json,
    /// Nested record type. Unsupported by the flat destination schema.
    Record,
    /// Nested struct type. Unsupported by the flat destination schema.
    Struct,
    /// A type name the translator has no mapping for.
    Unknown(String),
}

impl SourceType {
    /// Parses the upper-case type name the source metadata API reports.
    pub fn from_name(name: &str) -> SourceType {
        match name {
            "STRING" => SourceType::String,
            "FLOAT" => SourceType::Float,
            "FLOAT64" => SourceType::Float64,
            "INTEGER" => SourceType::Integer,
            "INT64" => SourceType::Int64,
            "TIMESTAMP" => SourceType::Timestamp,
            "DATETIME" => SourceType::Datetime,
            "DATE" => SourceType::Date,
            "TIME" => SourceType::Time,
            "BYTES" => SourceType::Bytes,
            "BOOL" => SourceType::Bool,
            "BOOLEAN" => SourceType::Boolean,
            "NUMERIC" => SourceType::Numeric,
            "DECIMAL" => SourceType::Decimal,
            "BIGNUMERIC" => SourceType::BigNumeric,
            "BIGDECIMAL" => SourceType::BigDecimal,
            "JSON" => SourceType::Json,
            "RECORD" => SourceType::Record,
            "STRUCT" => SourceType::Struct,
            other => SourceType::Unknown(other.to_string()),
        }
    }

    /// Returns the upper-case name of this type as the source reports it.
    pub fn name(&self) -> &str {
        match self {
            SourceType::String => "STRING",
            SourceType::Float => "FLOAT",
            SourceType::Float64 => "FLOAT64",
            SourceType::Integer => "INTEGER",
            SourceType::Int64 => "INT64",
            SourceType::Timestamp => "TIMESTAMP",
            SourceType::Datetime => "DATETIME",
            SourceType::Date => "DATE",
            SourceType::Time => "TIME",
            SourceType::Bytes => "BYTES",
            SourceType::Bool => "BOOL",
            SourceType::Boolean => "BOOLEAN",
            SourceType::Numeric => "NUMERIC",
            SourceType::Decimal => "DECIMAL",
            SourceType::BigNumeric => "BIGNUMERIC",
            SourceType::BigDecimal => "BIGDECIMAL",
            SourceType::Json => "JSON",
            SourceType::Record => "RECORD",
            SourceType::Struct => "STRUCT",
            SourceType::Unknown(name) => name,
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One column as resolved from live source metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceColumn {
    pub name: String,
    pub source_type: SourceType,
}

impl SourceColumn {
    pub fn new(name: impl Into<String>, source_type: SourceType) -> Self {
        Self {
            name: name.into(),
            source_type,
        }
    }
}

/// Schema of one destination column: the source column it mirrors and the
/// destination type it was translated to.
///
/// Derived once per run, strictly before any destination mutation, and
/// immutable thereafter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    pub name: String,
    pub source_type: SourceType,
    pub dest_type: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_names_round_trip() {
        for name in [
            "STRING",
            "FLOAT64",
            "INT64",
            "TIMESTAMP",
            "DATE",
            "BIGNUMERIC",
            "JSON",
            "RECORD",
        ] {
            assert_eq!(SourceType::from_name(name).name(), name);
        }
    }

    #[test]
    fn unknown_types_keep_their_name() {
        let ty = SourceType::from_name("GEOGRAPHY");
        assert_eq!(ty, SourceType::Unknown("GEOGRAPHY".to_string()));
        assert_eq!(ty.name(), "GEOGRAPHY");
    }
}
