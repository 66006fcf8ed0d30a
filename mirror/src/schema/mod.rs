//! Schema translation from source column types to destination column types.

mod translate;

pub use translate::{destination_type_for, translate_columns};
