pub mod agent;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod plot;
pub mod repl;

pub use agent::{Agent, AgentAnswer, ChatModel, MistralClient, ToolName, ToolRegistry};
pub use cache::ResultCache;
pub use config::{Config, LlmSettings};
pub use db::{
    Database, QueryExecutor, QueryResult, RowLimit, SchemaCatalog, TableDescriptor, Value,
    ValueSampler, DEFAULT_ROW_CEILING,
};
pub use error::{Result, RnaseqlError};
pub use plot::{PlotArtifact, PlotSpec, PlotSynthesizer, PlotType, Significance};
pub use repl::InteractiveRepl;
