use super::llm::ToolDefinition;
use crate::cache::ResultCache;
use crate::db::{Database, QueryExecutor, QueryResult, SchemaCatalog, ValueSampler};
use crate::error::{Result, RnaseqlError};
use crate::plot::{PlotArtifact, PlotSpec, PlotSynthesizer, PlotType};
use serde_json::{json, Value as Json};
use std::str::FromStr;
use tabled::builder::Builder;
use tabled::settings::Style;
use tracing::info;

/// Rows shown to the model in a tool reply. The cached result keeps up to
/// the row ceiling; the model only needs enough to reason and narrate.
pub const DISPLAY_ROWS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolName {
    DatabaseSchema,
    SqlQuery,
    SampleColumnValues,
    Plot,
}

impl ToolName {
    pub const ALL: [ToolName; 4] = [
        ToolName::DatabaseSchema,
        ToolName::SqlQuery,
        ToolName::SampleColumnValues,
        ToolName::Plot,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::DatabaseSchema => "database_schema_tool",
            ToolName::SqlQuery => "sql_query_tool",
            ToolName::SampleColumnValues => "sample_column_values_tool",
            ToolName::Plot => "plot_tool",
        }
    }
}

impl FromStr for ToolName {
    type Err = RnaseqlError;

    fn from_str(s: &str) -> Result<Self> {
        ToolName::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| RnaseqlError::InvalidToolCall(format!("no such tool '{s}'")))
    }
}

/// The four capabilities the orchestrator can invoke, plus the state they
/// share: the database handle and the single-slot result cache. Strictly
/// sequential; one call completes before the next is dispatched.
pub struct ToolRegistry {
    db: Database,
    synthesizer: PlotSynthesizer,
    cache: ResultCache,
    row_ceiling: usize,
    last_artifact: Option<PlotArtifact>,
}

impl ToolRegistry {
    pub fn new(db: Database, synthesizer: PlotSynthesizer) -> Self {
        Self {
            db,
            synthesizer,
            cache: ResultCache::new(),
            row_ceiling: crate::db::DEFAULT_ROW_CEILING,
            last_artifact: None,
        }
    }

    pub fn with_row_ceiling(mut self, ceiling: usize) -> Self {
        self.row_ceiling = ceiling.max(1);
        self
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// The most recent plot artifact, handed over at most once so each
    /// question surfaces only plots it produced.
    pub fn take_artifact(&mut self) -> Option<PlotArtifact> {
        self.last_artifact.take()
    }

    pub fn definitions() -> Vec<ToolDefinition> {
        vec![
            ToolDefinition {
                name: ToolName::DatabaseSchema.as_str().to_string(),
                description: "List every table in the RNA-seq database with its columns and \
                              declared types. Use this before writing SQL."
                    .to_string(),
                parameters: json!({ "type": "object", "properties": {} }),
            },
            ToolDefinition {
                name: ToolName::SqlQuery.as_str().to_string(),
                description: "Execute a single read-only SQLite SELECT statement and cache the \
                              result for plotting. Results are capped at 50 rows unless \
                              unbounded is set."
                    .to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "sql": {
                            "type": "string",
                            "description": "A single SQLite SELECT statement.",
                        },
                        "unbounded": {
                            "type": "boolean",
                            "description": "Set true only when the user explicitly asked for \
                                            the complete result, or when a plot reported an \
                                            incomplete matrix. Disables the row ceiling.",
                        },
                    },
                    "required": ["sql"],
                }),
            },
            ToolDefinition {
                name: ToolName::SampleColumnValues.as_str().to_string(),
                description: "Sample distinct values from every categorical (text) column. Use \
                              this to match the user's wording against stored spellings, \
                              especially after a filter returned zero rows."
                    .to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "hint": {
                            "type": "string",
                            "description": "Optional free-text note about the term being \
                                            matched; sampling covers all columns regardless.",
                        },
                    },
                }),
            },
            ToolDefinition {
                name: ToolName::Plot.as_str().to_string(),
                description: format!(
                    "Render the cached query result as an interactive chart. Input format: \
                     'type' or 'type|key=value|key=value'. Types: {}. Common keys: title, \
                     x_column, y_column, column, bins, top_n.",
                    PlotType::ALL
                        .iter()
                        .map(|t| t.as_str())
                        .collect::<Vec<_>>()
                        .join(", "),
                ),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "spec": {
                            "type": "string",
                            "description": "Plot request, e.g. 'volcano' or \
                                            'scatter|x_column=baseMean|y_column=log2FoldChange'.",
                        },
                    },
                    "required": ["spec"],
                }),
            },
        ]
    }

    /// Dispatches one tool call. Errors are returned to the caller, which
    /// reports them back across the tool boundary; nothing here retries.
    pub fn call(&mut self, name: &str, arguments: &str) -> Result<String> {
        let tool: ToolName = name.parse()?;
        let args = parse_arguments(arguments)?;
        info!(tool = name, "tool invoked");

        match tool {
            ToolName::DatabaseSchema => self.describe_schema(),
            ToolName::SqlQuery => self.run_query(&args),
            ToolName::SampleColumnValues => self.sample_values(&args),
            ToolName::Plot => self.plot(&args),
        }
    }

    fn describe_schema(&self) -> Result<String> {
        let tables = SchemaCatalog::new(&self.db).describe()?;
        if tables.is_empty() {
            return Ok("The database contains no tables.".to_string());
        }

        let mut output = String::from("Available tables and their schemas:\n");
        for table in &tables {
            output.push_str(&format!("\nTable: {}\nColumns:\n", table.name));
            for column in &table.columns {
                output.push_str(&format!("  - {} ({})\n", column.name, column.declared_type));
            }
            output.push_str(&format!(
                "Sample query: SELECT * FROM \"{}\" LIMIT 5;\n",
                table.name
            ));
        }
        Ok(output)
    }

    fn run_query(&mut self, args: &Json) -> Result<String> {
        let sql = args["sql"].as_str().ok_or_else(|| {
            RnaseqlError::InvalidToolCall("sql_query_tool needs a 'sql' string argument".to_string())
        })?;
        let unbounded = args["unbounded"].as_bool().unwrap_or(false);

        let executor = QueryExecutor::new(&self.db).with_row_ceiling(self.row_ceiling);
        let result = if unbounded {
            executor.execute_unbounded(sql)?
        } else {
            executor.execute(sql)?
        };

        let reply = format_query_reply(&result);
        self.cache.store(result);
        Ok(reply)
    }

    fn sample_values(&self, args: &Json) -> Result<String> {
        let hint = args["hint"].as_str().unwrap_or("");
        let samples = ValueSampler::new(&self.db).sample(hint)?;

        if samples.is_empty() {
            return Ok("No categorical (text) columns were found to sample.".to_string());
        }

        let mut output = String::from("Sample values for categorical columns:\n");
        for (table, columns) in &samples {
            output.push_str(&format!("\nTable: {}\n", table));
            for (column, values) in columns {
                output.push_str(&format!("  {}: [{}]\n", column, values.join(", ")));
            }
        }
        Ok(output)
    }

    fn plot(&mut self, args: &Json) -> Result<String> {
        let spec_text = args["spec"].as_str().ok_or_else(|| {
            RnaseqlError::InvalidToolCall("plot_tool needs a 'spec' string argument".to_string())
        })?;
        let spec = PlotSpec::parse(spec_text)?;
        let artifact = self.synthesizer.render(&spec, &self.cache)?;

        let reply = format!(
            "Created {}. Saved to {}.",
            artifact.summary,
            artifact.path.display()
        );
        self.last_artifact = Some(artifact);
        Ok(reply)
    }
}

fn parse_arguments(arguments: &str) -> Result<Json> {
    let trimmed = arguments.trim();
    if trimmed.is_empty() {
        return Ok(json!({}));
    }
    serde_json::from_str(trimmed)
        .map_err(|e| RnaseqlError::InvalidToolCall(format!("arguments are not valid JSON: {e}")))
}

fn format_query_reply(result: &QueryResult) -> String {
    if result.total_rows == 0 {
        return "Query executed successfully but returned no results. If a filter matched \
                nothing, confirm the stored spellings with sample_column_values_tool."
            .to_string();
    }

    let mut output = format!("Query returned {} rows.", result.total_rows);
    if result.is_truncated() {
        output.push_str(&format!(
            " Retained the first {} (row ceiling); pass unbounded=true to retain everything.",
            result.retained_rows()
        ));
    }
    if !result.tables.is_empty() {
        output.push_str(&format!(" Executed against: {}.", result.tables.join(", ")));
    }
    output.push('\n');

    let shown = result.rows.len().min(DISPLAY_ROWS);
    let mut builder = Builder::default();
    builder.push_record(result.columns.clone());
    for row in result.rows.iter().take(shown) {
        builder.push_record(row.iter().map(|v| v.to_string()));
    }
    output.push_str(&builder.build().with(Style::psql()).to_string());
    output.push('\n');

    if result.retained_rows() > shown {
        output.push_str(&format!(
            "Showing the first {} of {} retained rows.\n",
            shown,
            result.retained_rows()
        ));
    }
    output.push_str("The full retained result is cached and available for plotting.");
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{db_with, fixture_db};
    use tempfile::TempDir;

    fn registry() -> (TempDir, TempDir, ToolRegistry) {
        let (db_dir, db) = fixture_db();
        let plot_dir = TempDir::new().unwrap();
        let synthesizer = PlotSynthesizer::new(plot_dir.path());
        (db_dir, plot_dir, ToolRegistry::new(db, synthesizer))
    }

    #[test]
    fn test_definitions_cover_all_tools() {
        let definitions = ToolRegistry::definitions();
        assert_eq!(definitions.len(), ToolName::ALL.len());
        for tool in ToolName::ALL {
            assert!(definitions.iter().any(|d| d.name == tool.as_str()));
        }
    }

    #[test]
    fn test_schema_tool_lists_tables() {
        let (_db_dir, _plot_dir, mut registry) = registry();
        let reply = registry.call("database_schema_tool", "{}").unwrap();
        assert!(reply.contains("Table: CD4_expression"));
        assert!(reply.contains("log2FoldChange (REAL)"));
    }

    #[test]
    fn test_query_then_plot_flow() {
        let (_db_dir, _plot_dir, mut registry) = registry();

        let reply = registry
            .call(
                "sql_query_tool",
                r#"{"sql": "SELECT gene_name, log2FoldChange, padj FROM NS_flattening_yes_vs_no_deseq2"}"#,
            )
            .unwrap();
        assert!(reply.contains("Query returned 5 rows."));
        assert!(reply.contains("cached"));

        let reply = registry.call("plot_tool", r#"{"spec": "volcano"}"#).unwrap();
        assert!(reply.contains("volcano plot"));

        let artifact = registry.take_artifact().unwrap();
        assert!(artifact.path.exists());
        assert!(registry.take_artifact().is_none());
    }

    #[test]
    fn test_plot_before_query_reports_no_data() {
        let (_db_dir, _plot_dir, mut registry) = registry();
        let err = registry.call("plot_tool", r#"{"spec": "volcano"}"#).unwrap_err();
        assert!(matches!(err, RnaseqlError::NoDataAvailable));
    }

    #[test]
    fn test_zero_row_query_is_narrated_not_an_error() {
        let (_db_dir, _plot_dir, mut registry) = registry();
        let reply = registry
            .call(
                "sql_query_tool",
                r#"{"sql": "SELECT * FROM CD4_expression WHERE batch = '1'"}"#,
            )
            .unwrap();
        assert!(reply.contains("no results"));
        assert!(reply.contains("sample_column_values_tool"));
        // The empty result still supersedes the cache slot.
        assert_eq!(registry.cache().current().unwrap().total_rows, 0);
    }

    #[test]
    fn test_unbounded_flag_lifts_the_ceiling() {
        let (db_dir, db) = db_with(|conn| {
            conn.execute_batch("CREATE TABLE wide (n INTEGER)").unwrap();
            for i in 0..80 {
                conn.execute("INSERT INTO wide (n) VALUES (?1)", [i]).unwrap();
            }
        });
        let plot_dir = TempDir::new().unwrap();
        let mut registry = ToolRegistry::new(db, PlotSynthesizer::new(plot_dir.path()));

        registry
            .call("sql_query_tool", r#"{"sql": "SELECT n FROM wide"}"#)
            .unwrap();
        assert_eq!(registry.cache().current().unwrap().retained_rows(), 50);

        registry
            .call(
                "sql_query_tool",
                r#"{"sql": "SELECT n FROM wide", "unbounded": true}"#,
            )
            .unwrap();
        assert_eq!(registry.cache().current().unwrap().retained_rows(), 80);
        drop(db_dir);
    }

    #[test]
    fn test_sampler_tool_reports_spellings() {
        let (_db_dir, _plot_dir, mut registry) = registry();
        let reply = registry
            .call("sample_column_values_tool", r#"{"hint": "batch 1"}"#)
            .unwrap();
        assert!(reply.contains("batch: [b1, b2, b3]"));
    }

    #[test]
    fn test_unknown_tool_and_bad_arguments() {
        let (_db_dir, _plot_dir, mut registry) = registry();

        let err = registry.call("make_coffee_tool", "{}").unwrap_err();
        assert!(matches!(err, RnaseqlError::InvalidToolCall(_)));

        let err = registry.call("sql_query_tool", "not json").unwrap_err();
        assert!(matches!(err, RnaseqlError::InvalidToolCall(_)));

        let err = registry.call("sql_query_tool", "{}").unwrap_err();
        assert!(matches!(err, RnaseqlError::InvalidToolCall(_)));
    }

    #[test]
    fn test_empty_arguments_default_to_no_args() {
        let (_db_dir, _plot_dir, mut registry) = registry();
        assert!(registry.call("database_schema_tool", "").is_ok());
    }
}
