mod llm;
mod prompt;
mod runner;
mod tools;

pub use llm::{ChatMessage, ChatModel, MistralClient, Role, ToolCall, ToolDefinition};
pub use prompt::SYSTEM_PROMPT;
pub use runner::{Agent, AgentAnswer};
pub use tools::{ToolName, ToolRegistry, DISPLAY_ROWS};
