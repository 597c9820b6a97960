use thiserror::Error;

#[derive(Error, Debug)]
pub enum RnaseqlError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Schema unavailable: {0}")]
    SchemaUnavailable(String),

    #[error("Unsafe statement rejected: {0}")]
    UnsafeStatement(String),

    #[error("Query execution failed: {0}")]
    QueryExecution(String),

    #[error("No data available for plotting; run a SQL query first")]
    NoDataAvailable,

    #[error("Unknown plot type '{0}'. Available: volcano, ma, heatmap, scatter, histogram, boxplot, bar, pathway_enrichment")]
    UnknownPlotType(String),

    #[error("Cached result does not have the columns this plot needs: {0}")]
    SchemaMismatch(String),

    #[error("Correlation matrix is not square ({rows} rows for {cols} sample columns). Re-run the query with unbounded=true so every sample row is retained, then plot again")]
    IncompleteMatrix { rows: usize, cols: usize },

    #[error("Column '{0}' not found in the cached result")]
    ColumnNotFound(String),

    #[error("No rows left after filtering: {0}")]
    EmptyAfterFiltering(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("LLM API error: {0}")]
    LlmApi(String),

    #[error("Invalid tool call: {0}")]
    InvalidToolCall(String),

    #[error("Agent loop error: {0}")]
    AgentLoop(String),

    #[error("Plot rendering failed: {0}")]
    PlotRender(String),
}

pub type Result<T> = std::result::Result<T, RnaseqlError>;
