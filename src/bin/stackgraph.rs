//! Stackgraph CLI: inspect and restructure template groups.
//!
//! Usage:
//!   stackgraph order <GROUP=FILE>...
//!   stackgraph edges <GROUP=FILE>... [--cross-group]
//!   stackgraph move <GROUP=FILE>... --from group/name --to group/name [--out DIR]

use clap::{Parser, Subcommand};
use stackgraph::document::{self, Format};
use stackgraph::{GraphConfig, GraphStore, GroupId, NodeId};
use std::path::{Path, PathBuf};
use tracing::Level;

#[derive(Parser)]
#[command(
    name = "stackgraph",
    version,
    about = "Dependency graph tooling for infrastructure templates"
)]
struct Cli {
    /// Path to a YAML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print resources in dependency order
    Order {
        /// Templates as GROUP=FILE, or FILE to use the file stem as group
        #[arg(required = true)]
        inputs: Vec<String>,
    },
    /// List edges
    Edges {
        #[arg(required = true)]
        inputs: Vec<String>,
        /// Only show edges crossing a group boundary
        #[arg(long)]
        cross_group: bool,
    },
    /// Move or rename a resource and regenerate every template
    Move {
        #[arg(required = true)]
        inputs: Vec<String>,
        /// Current address, group/name
        #[arg(long)]
        from: String,
        /// New address, group/name
        #[arg(long)]
        to: String,
        /// Directory to write regenerated templates into (stdout if absent)
        #[arg(long)]
        out: Option<PathBuf>,
        /// Output format
        #[arg(long, default_value = "yaml")]
        format: String,
    },
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

/// Get the default config path (~/.config/stackgraph/config.yaml)
fn default_config_path() -> Option<PathBuf> {
    let path = dirs::config_dir()?.join("stackgraph").join("config.yaml");
    path.exists().then_some(path)
}

fn load_config(path: Option<PathBuf>) -> Result<GraphConfig, String> {
    match path.or_else(default_config_path) {
        Some(path) => GraphConfig::load(&path)
            .map_err(|e| format!("Failed to load config '{}': {}", path.display(), e)),
        None => Ok(GraphConfig::default()),
    }
}

/// Split `GROUP=FILE`; a bare `FILE` uses its stem as the group
fn parse_input(input: &str) -> Result<(GroupId, PathBuf), String> {
    if let Some((group, file)) = input.split_once('=') {
        return Ok((GroupId::from(group), PathBuf::from(file)));
    }
    let path = PathBuf::from(input);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| format!("cannot derive a group name from '{}'", input))?;
    Ok((GroupId::from(stem), path))
}

fn open_store(config: GraphConfig, inputs: &[String]) -> Result<GraphStore, String> {
    let mut documents = Vec::with_capacity(inputs.len());
    for input in inputs {
        let (group, path) = parse_input(input)?;
        let template = document::read_template(&path)
            .map_err(|e| format!("Failed to read '{}': {}", path.display(), e))?;
        documents.push((group, template));
    }
    let mut store = GraphStore::with_config(config);
    document::ingest(&mut store, &documents).map_err(|e| format!("Failed to ingest: {}", e))?;
    Ok(store)
}

fn parse_address(address: &str) -> Result<NodeId, String> {
    NodeId::parse(address).ok_or_else(|| format!("invalid address '{}', expected group/name", address))
}

fn cmd_order(store: &GraphStore) -> i32 {
    match store.sorted_nodes() {
        Ok(nodes) => {
            for node in nodes {
                println!("{:<40}  {}", node.id, node.kind);
            }
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_edges(store: &GraphStore, cross_group: bool) -> i32 {
    let edges: Vec<_> = if cross_group {
        store.get_cross_group_edges()
    } else {
        store.edges().collect()
    };
    if edges.is_empty() {
        println!("No edges.");
        return 0;
    }
    for edge in edges {
        println!("{}", edge);
    }
    0
}

fn cmd_move(
    store: &mut GraphStore,
    from: &str,
    to: &str,
    out: Option<&Path>,
    format: Format,
) -> Result<(), String> {
    let from = parse_address(from)?;
    let to = parse_address(to)?;
    let report = store.relocate(&from, &to).map_err(|e| e.to_string())?;

    eprintln!(
        "Moved {} to {} ({} converted, {} restored, {} dropped)",
        report.from,
        report.to,
        report.converted.len(),
        report.restored.len(),
        report.dropped.len()
    );
    for name in &report.exports_created {
        eprintln!("  + export {}", name);
    }
    for name in &report.exports_pruned {
        eprintln!("  - export {}", name);
    }

    if let Some(dir) = out {
        std::fs::create_dir_all(dir)
            .map_err(|e| format!("cannot create '{}': {}", dir.display(), e))?;
    }
    for group in store.groups() {
        let template = document::generate(store, &group);
        match out {
            Some(dir) => {
                let path = dir.join(format!("{}.{}", group, format.extension()));
                document::write_template(&path, &template).map_err(|e| e.to_string())?;
                eprintln!("Wrote {}", path.display());
            }
            None => {
                let text = document::render_template(&template, format).map_err(|e| e.to_string())?;
                println!("# {}", group);
                println!("{}", text);
            }
        }
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match load_config(cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let inputs = match &cli.command {
        Commands::Order { inputs } | Commands::Edges { inputs, .. } | Commands::Move { inputs, .. } => {
            inputs
        }
    };
    let mut store = match open_store(config, inputs) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let code = match cli.command {
        Commands::Order { .. } => cmd_order(&store),
        Commands::Edges { cross_group, .. } => cmd_edges(&store, cross_group),
        Commands::Move { from, to, out, format, .. } => {
            let result = format
                .parse::<Format>()
                .map_err(|e| e.to_string())
                .and_then(|format| cmd_move(&mut store, &from, &to, out.as_deref(), format));
            match result {
                Ok(()) => 0,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    1
                }
            }
        }
    };
    std::process::exit(code);
}
