use super::connection::{quote_ident, Database};
use crate::error::{Result, RnaseqlError};

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescriptor {
    pub name: String,
    pub declared_type: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableDescriptor {
    pub name: String,
    pub columns: Vec<ColumnDescriptor>,
}

impl TableDescriptor {
    /// Columns with TEXT affinity; these are the ones the value sampler
    /// treats as categorical.
    pub fn text_columns(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.columns.iter().filter(|c| {
            let t = c.declared_type.to_uppercase();
            t.contains("CHAR") || t.contains("TEXT") || t.contains("CLOB")
        })
    }
}

/// Live reflection over the database catalog. Recomputed on every call;
/// nothing here is cached.
pub struct SchemaCatalog<'a> {
    db: &'a Database,
}

impl<'a> SchemaCatalog<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn describe(&self) -> Result<Vec<TableDescriptor>> {
        let table_names = self.table_names()?;
        table_names
            .into_iter()
            .map(|name| {
                let columns = self.columns_of(&name)?;
                Ok(TableDescriptor { name, columns })
            })
            .collect()
    }

    pub fn table_names(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .db
            .conn()
            .prepare(
                "SELECT name FROM sqlite_master \
                 WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
                 ORDER BY name",
            )
            .map_err(|e| RnaseqlError::SchemaUnavailable(e.to_string()))?;

        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
            .map_err(|e| RnaseqlError::SchemaUnavailable(e.to_string()))?;

        Ok(names)
    }

    fn columns_of(&self, table: &str) -> Result<Vec<ColumnDescriptor>> {
        let sql = format!("PRAGMA table_info({})", quote_ident(table));
        let mut stmt = self
            .db
            .conn()
            .prepare(&sql)
            .map_err(|e| RnaseqlError::SchemaUnavailable(e.to_string()))?;

        let columns = stmt
            .query_map([], |row| {
                Ok(ColumnDescriptor {
                    name: row.get(1)?,
                    declared_type: row.get(2)?,
                })
            })
            .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
            .map_err(|e| RnaseqlError::SchemaUnavailable(e.to_string()))?;

        Ok(columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::fixture_db;

    #[test]
    fn test_describe_lists_tables_and_columns() {
        let (_dir, db) = fixture_db();
        let tables = SchemaCatalog::new(&db).describe().unwrap();

        let names: Vec<_> = tables.iter().map(|t| t.name.as_str()).collect();
        assert!(names.contains(&"NS_flattening_yes_vs_no_deseq2"));
        assert!(names.contains(&"CD4_expression"));

        let deseq = tables
            .iter()
            .find(|t| t.name == "NS_flattening_yes_vs_no_deseq2")
            .unwrap();
        let cols: Vec<_> = deseq.columns.iter().map(|c| c.name.as_str()).collect();
        assert!(cols.contains(&"gene_name"));
        assert!(cols.contains(&"log2FoldChange"));
        assert!(cols.contains(&"padj"));
    }

    #[test]
    fn test_describe_is_idempotent() {
        let (_dir, db) = fixture_db();
        let catalog = SchemaCatalog::new(&db);
        let first = catalog.describe().unwrap();
        let second = catalog.describe().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_text_columns_follow_affinity() {
        let (_dir, db) = fixture_db();
        let tables = SchemaCatalog::new(&db).describe().unwrap();
        let expr = tables.iter().find(|t| t.name == "CD4_expression").unwrap();
        let text: Vec<_> = expr.text_columns().map(|c| c.name.as_str()).collect();
        assert!(text.contains(&"batch"));
        assert!(text.contains(&"gene_name"));
        assert!(!text.contains(&"normalized_count"));
    }
}
