mod catalog;
mod connection;
mod executor;
mod sampler;
mod value;

pub use catalog::{ColumnDescriptor, SchemaCatalog, TableDescriptor};
pub use connection::Database;
pub use executor::{QueryExecutor, QueryResult, RowLimit, DEFAULT_ROW_CEILING};
pub use sampler::{ValueSampler, ValueSamples};
pub use value::Value;

#[cfg(test)]
pub(crate) mod test_support {
    use super::Database;
    use tempfile::TempDir;

    /// Writable scratch database, sealed and reopened read-only.
    pub fn db_with(setup: impl FnOnce(&rusqlite::Connection)) -> (TempDir, Database) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rnaseq.db");
        let conn = rusqlite::Connection::open(&path).unwrap();
        setup(&conn);
        drop(conn);
        (dir, Database::open(&path).unwrap())
    }

    /// Standard fixture: one differential-expression table in the
    /// `{sample_subset}_{comparison}_{analysis_type}_{gene_set}` naming
    /// convention, one expression table with categorical batches.
    pub fn fixture_db() -> (TempDir, Database) {
        db_with(|conn| {
            conn.execute_batch(
                r#"
                CREATE TABLE NS_flattening_yes_vs_no_deseq2 (
                    gene_id TEXT,
                    gene_name TEXT,
                    baseMean REAL,
                    log2FoldChange REAL,
                    lfcSE REAL,
                    stat REAL,
                    pvalue REAL,
                    padj REAL
                );
                INSERT INTO NS_flattening_yes_vs_no_deseq2 VALUES
                    ('ENSG01', 'ACTB',  1200.0,  2.4, 0.2,  9.1, 1e-9,  1e-7),
                    ('ENSG02', 'GAPDH',  900.0, -1.8, 0.3, -6.2, 1e-6,  1e-4),
                    ('ENSG03', 'TP53',   300.0,  0.4, 0.1,  1.2, 0.2,   0.4),
                    ('ENSG04', 'MYC',    450.0,  3.1, 0.4,  8.0, 0.0,   0.0),
                    ('ENSG05', 'EGFR',   220.0, -0.2, 0.2, -0.8, 0.5,   0.7);

                CREATE TABLE CD4_expression (
                    gene_name TEXT,
                    batch TEXT,
                    normalized_count REAL
                );
                INSERT INTO CD4_expression VALUES
                    ('ACTB',  'b1', 12847.0),
                    ('GAPDH', 'b1', 12532.0),
                    ('TP53',  'b1',  1020.0),
                    ('ACTB',  'b2', 11900.0),
                    ('GAPDH', 'b2', 12100.0),
                    ('TP53',  'b2',   990.0),
                    ('ACTB',  'b3', 13210.0),
                    ('GAPDH', 'b3', 12844.0),
                    ('TP53',  'b3',  1110.0);
                "#,
            )
            .unwrap();
        })
    }
}
