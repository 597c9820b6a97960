use crate::agent::Agent;
use crate::error::{Result, RnaseqlError};
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

/// Interactive chat session over the agent. One question at a time; the
/// next prompt appears only after the previous chain of tool calls has
/// fully completed.
pub struct InteractiveRepl {
    agent: Agent,
}

impl InteractiveRepl {
    pub fn new(agent: Agent) -> Self {
        Self { agent }
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut editor = DefaultEditor::new()
            .map_err(|e| RnaseqlError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?;

        println!(
            "{}",
            "rnaseql - ask questions about your RNA-seq results (exit to quit)".bold()
        );

        loop {
            match editor.readline("rnaseql> ") {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    if line == "exit" || line == "quit" {
                        break;
                    }
                    let _ = editor.add_history_entry(line);

                    match self.agent.ask(line).await {
                        Ok(answer) => {
                            println!("\n{}\n", answer.text);
                            if let Some(plot) = answer.plot {
                                println!(
                                    "{} {}\n",
                                    "plot saved:".cyan(),
                                    plot.path.display()
                                );
                            }
                        }
                        Err(e) => eprintln!("{} {}\n", "error:".red(), e),
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(e) => {
                    return Err(RnaseqlError::Io(std::io::Error::new(
                        std::io::ErrorKind::Other,
                        e,
                    )))
                }
            }
        }

        Ok(())
    }
}
