use super::catalog::SchemaCatalog;
use super::connection::{quote_ident, Database};
use crate::error::Result;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Distinct values reported per column.
const MAX_VALUES_PER_COLUMN: usize = 5;

/// Distinct categorical values, keyed by table then column. Ordered maps so
/// repeated samples of an unchanged database render identically.
pub type ValueSamples = BTreeMap<String, BTreeMap<String, Vec<String>>>;

/// Samples distinct values from every text-typed column in the database.
///
/// The hint is advisory free text and is not parsed: sampling everything is
/// deliberate, so that a natural-language term ("batch 1") can be matched
/// against whatever spelling the data actually stores ("b1") without the
/// caller knowing which column to ask about. An empty result is a valid
/// answer meaning no categorical columns matched, not a failure.
pub struct ValueSampler<'a> {
    db: &'a Database,
    max_values: usize,
}

impl<'a> ValueSampler<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self {
            db,
            max_values: MAX_VALUES_PER_COLUMN,
        }
    }

    pub fn with_max_values(mut self, max_values: usize) -> Self {
        self.max_values = max_values.max(1);
        self
    }

    pub fn sample(&self, hint: &str) -> Result<ValueSamples> {
        debug!(hint = %hint, "sampling categorical column values");

        let tables = SchemaCatalog::new(self.db).describe()?;
        let mut samples = ValueSamples::new();

        for table in &tables {
            let mut columns = BTreeMap::new();
            for column in table.text_columns() {
                match self.distinct_values(&table.name, &column.name) {
                    Ok(values) if !values.is_empty() => {
                        columns.insert(column.name.clone(), values);
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(table = %table.name, column = %column.name, error = %e,
                              "could not sample column");
                    }
                }
            }
            if !columns.is_empty() {
                samples.insert(table.name.clone(), columns);
            }
        }

        Ok(samples)
    }

    fn distinct_values(&self, table: &str, column: &str) -> rusqlite::Result<Vec<String>> {
        let sql = format!(
            "SELECT DISTINCT {col} FROM {table} WHERE {col} IS NOT NULL LIMIT {limit}",
            col = quote_ident(column),
            table = quote_ident(table),
            limit = self.max_values,
        );
        let mut stmt = self.db.conn().prepare(&sql)?;
        let rows = stmt.query_map([], |row| {
            let cell = row.get_ref(0)?;
            Ok(super::value::Value::from(cell).to_string())
        })?;
        rows.collect()
    }
}
