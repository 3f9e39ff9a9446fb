//! Result column names and types.

use arcstr::ArcStr;
use quiver_common::collections::{QuiverMap, quiver_map_with_capacity};
use quiver_common::types::LogicalType;
use quiver_common::utils::strings::suggest;
use quiver_common::utils::{Error, IndexKind, Result};

use crate::source::ChunkSource;

/// One result column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnInfo {
    /// Column name as reported by the source.
    pub name: ArcStr,
    /// Column type.
    pub logical_type: LogicalType,
}

/// The columns of a result, captured once when reading starts.
#[derive(Debug, Clone)]
pub struct Schema {
    columns: Vec<ColumnInfo>,
    by_name: QuiverMap<ArcStr, usize>,
}

impl Schema {
    /// Builds a schema from `(name, type)` pairs.
    ///
    /// When names repeat, lookups by name resolve to the first occurrence.
    pub fn new(columns: Vec<ColumnInfo>) -> Self {
        let mut by_name = quiver_map_with_capacity(columns.len());
        for (i, col) in columns.iter().enumerate() {
            by_name.entry(col.name.clone()).or_insert(i);
        }
        Self { columns, by_name }
    }

    /// Reads names and types from `source`.
    ///
    /// # Errors
    ///
    /// Whatever the source reports for its column metadata.
    pub fn from_source<S: ChunkSource + ?Sized>(source: &S) -> Result<Self> {
        let columns = (0..source.column_count())
            .map(|i| {
                Ok(ColumnInfo {
                    name: source.column_name(i)?,
                    logical_type: source.column_logical_type(i)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(columns))
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns `true` for a result with no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Column `index`.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfBounds`] for a bad index.
    pub fn column(&self, index: usize) -> Result<&ColumnInfo> {
        self.columns
            .get(index)
            .ok_or_else(|| Error::out_of_bounds(IndexKind::Column, index, self.columns.len()))
    }

    /// All columns in order.
    #[must_use]
    pub fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }

    /// Position of the column called `name`.
    ///
    /// # Errors
    ///
    /// [`Error::ColumnNotFound`], with a close match as a hint if one exists.
    pub fn index_of(&self, name: &str) -> Result<usize> {
        if let Some(&i) = self.by_name.get(name) {
            return Ok(i);
        }
        let names: Vec<&str> = self.columns.iter().map(|c| c.name.as_str()).collect();
        Err(Error::ColumnNotFound {
            name: name.to_string(),
            hint: suggest(name, &names),
        })
    }

    /// Column types in order.
    pub fn types(&self) -> impl ExactSizeIterator<Item = &LogicalType> + '_ {
        self.columns.iter().map(|c| &c.logical_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;

    fn schema() -> Schema {
        let source = MemorySource::new(vec![
            ("user_id", LogicalType::BIGINT),
            ("email", LogicalType::VARCHAR),
            ("email", LogicalType::INTEGER),
        ]);
        Schema::from_source(&source).unwrap()
    }

    #[test]
    fn test_lookup_by_name() {
        let schema = schema();
        assert_eq!(schema.len(), 3);
        assert_eq!(schema.index_of("user_id").unwrap(), 0);
        assert_eq!(schema.index_of("email").unwrap(), 1);
        assert_eq!(schema.column(2).unwrap().logical_type, LogicalType::INTEGER);
    }

    #[test]
    fn test_missing_column_has_hint() {
        let err = schema().index_of("user_di").unwrap_err();
        match err {
            Error::ColumnNotFound { name, hint } => {
                assert_eq!(name, "user_di");
                assert_eq!(hint.as_deref(), Some("Did you mean 'user_id'?"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(matches!(
            schema().index_of("completely_different"),
            Err(Error::ColumnNotFound { hint: None, .. })
        ));
    }

    #[test]
    fn test_column_out_of_bounds() {
        assert_eq!(
            schema().column(3).unwrap_err(),
            Error::out_of_bounds(IndexKind::Column, 3, 3)
        );
    }
}
