//! notegraph - a knowledge graph built from `[[concept]]` references in notes.

mod output;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use notegraph_graph::GraphState;
use notegraph_vault::{KnowledgeGraph, VaultConfig, WatchConfig};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "notegraph")]
#[command(version, about = "Build a knowledge graph from [[concept]] references in notes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding concepts.json and connections.json
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// More logging (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Apply every note in a folder
    Ingest {
        /// Notes folder (defaults to the configured one)
        dir: Option<PathBuf>,
    },

    /// Apply a single document
    Add {
        /// Identifier recorded as the connection source
        document_id: String,
        /// File to read the document from
        file: PathBuf,
    },

    /// Show graph statistics
    Stats,

    /// Most connected concepts
    Top {
        /// How many concepts to show
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },

    /// Connections grouped by strength
    Groups,

    /// Clusters of closely related concepts
    Clusters,

    /// Search concepts and connections
    Search { query: String },

    /// Show a concept and its connections
    Concept { name: String },

    /// Set or clear a concept's description
    Describe {
        name: String,
        /// New description; omit to clear it
        text: Option<String>,
    },

    /// Delete a concept and its connections
    Delete { name: String },

    /// Write the graph to a JSON file
    Export { file: PathBuf },

    /// Replace the graph with a JSON file written by `export`
    Import { file: PathBuf },

    /// Watch a notes folder and apply changes until interrupted
    Watch {
        /// Notes folder (defaults to the configured one)
        dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(&cli)?;
    debug!("Using state directory {}", config.state_dir.display());
    let graph = KnowledgeGraph::open(&config)
        .await
        .with_context(|| format!("failed to open graph in {}", config.state_dir.display()))?;

    run(cli, config, graph).await
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<VaultConfig> {
    let config = match &cli.config {
        Some(path) => VaultConfig::load(path)?,
        None => VaultConfig::default(),
    };
    Ok(apply_state_dir(config, cli.state_dir.clone()))
}

/// An explicit `--state-dir` always persists there, even if the config
/// file turned persistence off.
fn apply_state_dir(config: VaultConfig, state_dir: Option<PathBuf>) -> VaultConfig {
    match state_dir {
        Some(dir) => VaultConfig {
            persist: true,
            ..config.with_state_dir(dir)
        },
        None => config,
    }
}

/// Notes folder for `ingest`/`watch`: the argument, else the configured one.
fn notes_config(config: &VaultConfig, dir: Option<PathBuf>) -> Result<WatchConfig> {
    match (dir, &config.notes) {
        (Some(dir), Some(notes)) => Ok(notes.clone().with_path(dir)),
        (Some(dir), None) => Ok(WatchConfig::new(dir)),
        (None, Some(notes)) => Ok(notes.clone()),
        (None, None) => bail!("no notes folder given and none configured"),
    }
}

async fn run(cli: Cli, config: VaultConfig, graph: KnowledgeGraph) -> Result<()> {
    let json = cli.json;

    match cli.command {
        Commands::Ingest { dir } => {
            let notes = notes_config(&config, dir)?;
            let report = graph.ingest_directory(&notes).await?;
            if json {
                output::print_json(&report)?;
            } else {
                for summary in &report.summaries {
                    println!("{}", output::summary(summary));
                }
                for skipped in &report.skipped {
                    println!("skipped {skipped}");
                }
            }
        }

        Commands::Add { document_id, file } => {
            let content = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("failed to read {}", file.display()))?;
            let summary = graph.on_document_changed(&document_id, &content).await?;
            if json {
                output::print_json(&summary)?;
            } else {
                println!("{}", output::summary(&summary));
            }
        }

        Commands::Stats => {
            let stats = graph.stats().await;
            if json {
                output::print_json(&stats)?;
            } else {
                println!("{}", output::stats(&stats));
            }
        }

        Commands::Top { limit } => {
            let ranks = graph.most_connected(Some(limit)).await;
            if json {
                output::print_json(&ranks)?;
            } else {
                print!("{}", output::ranks(&ranks));
            }
        }

        Commands::Groups => {
            let groups = graph.group_by_strength().await;
            if json {
                output::print_json(&groups)?;
            } else {
                print!("{}", output::groups(&groups));
            }
        }

        Commands::Clusters => {
            let clusters = graph.clusters().await;
            if json {
                output::print_json(&clusters)?;
            } else if clusters.is_empty() {
                println!("no clusters");
            } else {
                print!("{}", output::clusters(&clusters));
            }
        }

        Commands::Search { query } => {
            let results = graph.search(&query).await;
            if json {
                output::print_json(&results)?;
            } else if results.is_empty() {
                println!("no matches for {query:?}");
            } else {
                print!("{}", output::search_results(&results));
            }
        }

        Commands::Concept { name } => {
            let Some(concept) = graph.concept(&name).await else {
                bail!("unknown concept: {name}");
            };
            let connections = graph.connections_of(&name).await;
            if json {
                output::print_json(&serde_json::json!({
                    "concept": concept,
                    "connections": connections,
                }))?;
            } else {
                print!("{}", output::concept(&concept, &connections));
            }
        }

        Commands::Describe { name, text } => {
            if !graph.set_description(&name, text).await? {
                bail!("unknown concept: {name}");
            }
            info!("Updated description of {name}");
        }

        Commands::Delete { name } => {
            let Some(concept) = graph.delete_concept(&name).await? else {
                bail!("unknown concept: {name}");
            };
            if json {
                output::print_json(&concept)?;
            } else {
                println!("deleted {}", concept.name);
            }
        }

        Commands::Export { file } => {
            let state = graph.export_state().await;
            tokio::fs::write(&file, state.to_json()?)
                .await
                .with_context(|| format!("failed to write {}", file.display()))?;
            info!("Exported graph to {}", file.display());
        }

        Commands::Import { file } => {
            let content = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("failed to read {}", file.display()))?;
            let state = GraphState::from_json(&content)
                .with_context(|| format!("{} is not a graph export", file.display()))?;
            graph.import_state(state).await?;
            info!("Imported graph from {}", file.display());
        }

        Commands::Watch { dir } => {
            let notes = notes_config(&config, dir)?;
            let report = graph.ingest_directory(&notes).await?;
            eprintln!(
                "Ingested {} notes; watching {} (Ctrl-C to stop)",
                report.summaries.len(),
                notes.path.display()
            );
            let handle = graph.watch(notes)?;
            tokio::signal::ctrl_c().await?;
            handle.stop().await;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "notegraph",
            "top",
            "--limit",
            "3",
            "--json",
            "--state-dir",
            "/tmp/graph",
            "-vv",
        ])
        .unwrap();

        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.state_dir, Some(PathBuf::from("/tmp/graph")));
        assert!(matches!(cli.command, Commands::Top { limit: 3 }));
    }

    #[test]
    fn test_describe_without_text_clears() {
        let cli = Cli::try_parse_from(["notegraph", "describe", "Rust"]).unwrap();
        match cli.command {
            Commands::Describe { name, text } => {
                assert_eq!(name, "Rust");
                assert_eq!(text, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_state_dir_flag_enables_persistence() {
        let config = apply_state_dir(VaultConfig::in_memory(), Some(PathBuf::from("/tmp/graph")));
        assert!(config.persist);
        assert_eq!(config.state_dir, PathBuf::from("/tmp/graph"));

        let config = apply_state_dir(VaultConfig::in_memory(), None);
        assert!(!config.persist);
    }

    #[test]
    fn test_notes_config_resolution() {
        let config = VaultConfig::in_memory();
        assert!(notes_config(&config, None).is_err());

        let notes = notes_config(&config, Some(PathBuf::from("/notes"))).unwrap();
        assert_eq!(notes.path, PathBuf::from("/notes"));

        let config = config.with_notes(WatchConfig::new("/configured").exclude("**/drafts/**"));
        let notes = notes_config(&config, Some(PathBuf::from("/other"))).unwrap();
        assert_eq!(notes.path, PathBuf::from("/other"));
        assert!(notes.exclude_patterns.contains(&"**/drafts/**".to_string()));
        assert_eq!(
            notes_config(&config, None).unwrap().path,
            PathBuf::from("/configured")
        );
    }
}
