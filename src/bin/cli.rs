use clap::{Parser, Subcommand};
use colored::Colorize;
use rnaseql::agent::{Agent, MistralClient, ToolRegistry};
use rnaseql::cache::ResultCache;
use rnaseql::config::Config;
use rnaseql::db::{Database, QueryExecutor, QueryResult, SchemaCatalog, ValueSampler};
use rnaseql::plot::{PlotSpec, PlotSynthesizer};
use rnaseql::repl::InteractiveRepl;
use rnaseql::Result;
use std::path::PathBuf;
use tabled::builder::Builder;
use tabled::settings::Style;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "rnaseql",
    about = "Conversational SQL and plotting agent for RNA-seq result databases",
    version
)]
struct Cli {
    /// Config file (defaults to ./rnaseql.yaml, then the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database path (overrides config)
    #[arg(long, env = "RNASEQL_DB", global = true)]
    database: Option<PathBuf>,

    /// Plot output directory (overrides config)
    #[arg(long, env = "RNASEQL_PLOTS_DIR", global = true)]
    plots_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive chat session
    Chat,
    /// Ask a single question and exit
    Ask { question: String },
    /// Print the database schema
    Schema,
    /// Run one SELECT statement and print the result
    Query {
        sql: String,
        /// Disable the row ceiling and retain every row
        #[arg(long)]
        unbounded: bool,
    },
    /// Sample distinct values from categorical columns
    Sample { hint: Option<String> },
    /// Run a SELECT statement and render a plot from its result
    Plot {
        /// Plot request, e.g. "volcano" or "scatter|x_column=baseMean|y_column=log2FoldChange"
        spec: String,
        #[arg(long)]
        sql: String,
        /// Disable the row ceiling for the backing query
        #[arg(long)]
        unbounded: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rnaseql=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if !atty::is(atty::Stream::Stdout) {
        colored::control::set_override(false);
    }

    if let Err(e) = run().await {
        eprintln!("{} {}", "error:".red(), e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(database) = cli.database {
        config.database = database;
    }
    if let Some(plots_dir) = cli.plots_dir {
        config.plots_dir = plots_dir;
    }

    match cli.command {
        Command::Chat => {
            let agent = build_agent(&config)?;
            InteractiveRepl::new(agent).run().await
        }
        Command::Ask { question } => {
            let mut agent = build_agent(&config)?;
            let answer = agent.ask(&question).await?;
            println!("{}", answer.text);
            if let Some(plot) = answer.plot {
                println!("{} {}", "plot saved:".cyan(), plot.path.display());
            }
            Ok(())
        }
        Command::Schema => {
            let db = Database::open(&config.database)?;
            for table in SchemaCatalog::new(&db).describe()? {
                println!("{}", table.name.bold());
                for column in &table.columns {
                    println!("  {} ({})", column.name, column.declared_type);
                }
                println!();
            }
            Ok(())
        }
        Command::Query { sql, unbounded } => {
            let db = Database::open(&config.database)?;
            let executor = QueryExecutor::new(&db).with_row_ceiling(config.row_ceiling);
            let result = if unbounded {
                executor.execute_unbounded(&sql)?
            } else {
                executor.execute(&sql)?
            };
            print_result(&result);
            Ok(())
        }
        Command::Sample { hint } => {
            let db = Database::open(&config.database)?;
            let samples = ValueSampler::new(&db).sample(hint.as_deref().unwrap_or(""))?;
            if samples.is_empty() {
                println!("no categorical columns found");
            }
            for (table, columns) in &samples {
                println!("{}", table.bold());
                for (column, values) in columns {
                    println!("  {}: [{}]", column, values.join(", "));
                }
                println!();
            }
            Ok(())
        }
        Command::Plot {
            spec,
            sql,
            unbounded,
        } => {
            let db = Database::open(&config.database)?;
            let executor = QueryExecutor::new(&db).with_row_ceiling(config.row_ceiling);
            let result = if unbounded {
                executor.execute_unbounded(&sql)?
            } else {
                executor.execute(&sql)?
            };

            let mut cache = ResultCache::new();
            cache.store(result);

            let spec = PlotSpec::parse(&spec)?;
            let synthesizer = PlotSynthesizer::new(config.plots_dir.clone());
            let artifact = synthesizer.render(&spec, &cache)?;
            println!("created {}", artifact.summary);
            println!("{} {}", "plot saved:".cyan(), artifact.path.display());
            Ok(())
        }
    }
}

fn build_agent(config: &Config) -> Result<Agent> {
    let api_key = config.api_key()?;
    let model = MistralClient::new(config.llm.clone(), api_key)?;
    let db = Database::open(&config.database)?;
    let registry = ToolRegistry::new(db, PlotSynthesizer::new(config.plots_dir.clone()))
        .with_row_ceiling(config.row_ceiling);
    Ok(Agent::new(Box::new(model), registry).with_max_iterations(config.max_iterations))
}

fn print_result(result: &QueryResult) {
    if result.total_rows == 0 {
        println!("query returned no rows");
        return;
    }

    let mut builder = Builder::default();
    builder.push_record(result.columns.clone());
    for row in &result.rows {
        builder.push_record(row.iter().map(|v| v.to_string()));
    }
    println!("{}", builder.build().with(Style::psql()));

    if result.is_truncated() {
        println!(
            "retained {} of {} rows (row ceiling); use --unbounded for the full result",
            result.retained_rows(),
            result.total_rows
        );
    }
}
