use super::llm::{ChatMessage, ChatModel, ToolDefinition};
use super::prompt::SYSTEM_PROMPT;
use super::tools::ToolRegistry;
use crate::error::{Result, RnaseqlError};
use crate::plot::PlotArtifact;
use tracing::{info, warn};

const DEFAULT_MAX_ITERATIONS: usize = 15;

#[derive(Debug)]
pub struct AgentAnswer {
    pub text: String,
    pub plot: Option<PlotArtifact>,
}

/// The conversation runner: one question triggers a strictly sequential
/// chain of model turns and tool calls until the model produces a plain
/// text answer. Tool failures are reported back to the model as tool
/// results; deciding whether and how to recover is its job, not ours.
pub struct Agent {
    model: Box<dyn ChatModel>,
    tools: ToolRegistry,
    definitions: Vec<ToolDefinition>,
    history: Vec<ChatMessage>,
    max_iterations: usize,
}

impl Agent {
    pub fn new(model: Box<dyn ChatModel>, tools: ToolRegistry) -> Self {
        Self {
            model,
            tools,
            definitions: ToolRegistry::definitions(),
            history: vec![ChatMessage::system(SYSTEM_PROMPT)],
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    /// Answers one question. History is carried across questions within
    /// the same agent, so follow-ups can refer to earlier answers.
    pub async fn ask(&mut self, question: &str) -> Result<AgentAnswer> {
        info!(question = %question, "question received");
        self.history.push(ChatMessage::user(question));
        // Artifacts from earlier questions are not this answer's plot.
        let _ = self.tools.take_artifact();

        for iteration in 0..self.max_iterations {
            let reply = self.model.chat(&self.history, &self.definitions).await?;

            if reply.tool_calls.is_empty() {
                let text = reply.content.clone();
                self.history.push(reply);
                info!(iterations = iteration + 1, "answer composed");
                return Ok(AgentAnswer {
                    text,
                    plot: self.tools.take_artifact(),
                });
            }

            let calls = reply.tool_calls.clone();
            self.history.push(reply);

            for call in calls {
                let content = match self.tools.call(&call.name, &call.arguments) {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(tool = %call.name, error = %e, "tool call failed");
                        format!("Error: {e}")
                    }
                };
                self.history.push(ChatMessage::tool_result(call.id, content));
            }
        }

        Err(RnaseqlError::AgentLoop(format!(
            "no final answer after {} tool iterations",
            self.max_iterations
        )))
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }
}
