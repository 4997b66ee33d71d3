//! AgentModel CLI binary.
//!
//! Agent-based modeling harness.
//!
//! # Commands
//!
//! - `run` - Run the two-armed bandit model to convergence
//! - `params` - List model parameters
//! - `topology` - Print the edges of a canonical topology

use std::path::PathBuf;

use agentmodel::{
    model::convergence, AgentModel, BanditConfig, ConvergenceCriterion, GraphType, NodeData,
    SimulationConfig, VERSION,
};
use clap::{Parser, Subcommand};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "agentmodel")]
#[command(version = VERSION)]
#[command(about = "AgentModel - Agent-based modeling harness", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the two-armed bandit model until convergence
    Run {
        /// Number of agents
        #[arg(short, long)]
        nodes: Option<usize>,

        /// Topology (complete, cycle, wheel)
        #[arg(short, long)]
        graph_type: Option<String>,

        /// RNG seed for reproducible runs
        #[arg(short, long)]
        seed: Option<u64>,

        /// Node data field watched for convergence
        #[arg(long)]
        data_key: Option<String>,

        /// Standard deviation threshold for convergence
        #[arg(short, long)]
        threshold: Option<f64>,

        /// Maximum number of timesteps
        #[arg(long)]
        max_timesteps: Option<usize>,

        /// Config file path (default: <config dir>/agentmodel/config.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Enable verbose logging
        #[arg(short, long)]
        verbose: bool,
    },

    /// List model parameters
    Params {
        /// Config file to apply before listing
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print the edges of a topology
    Topology {
        /// Number of nodes
        #[arg(short, long, default_value = "5")]
        nodes: usize,

        /// Topology (complete, cycle, wheel)
        #[arg(short, long, default_value = "complete")]
        graph_type: String,

        /// Emit Graphviz DOT instead of an edge list
        #[arg(long)]
        dot: bool,
    },
}

/// Result of `agentmodel run`
#[derive(Debug, Serialize)]
struct RunSummary {
    timesteps: usize,
    converged: bool,
    data_key: String,
    dispersion: f64,
    threshold: f64,
    graph_type: String,
    nodes: Vec<NodeSummary>,
}

#[derive(Debug, Serialize)]
struct NodeSummary {
    label: usize,
    data: NodeData,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            nodes,
            graph_type,
            seed,
            data_key,
            threshold,
            max_timesteps,
            config,
            json,
            verbose,
        } => {
            init_logging(verbose);
            let mut config = load_config(config)?.with_convergence_fallback("a_expectation", 0.05);
            if let Some(n) = nodes {
                config.model.num_nodes = n;
            }
            if let Some(g) = graph_type {
                config.model.graph_type = g;
            }
            if let Some(s) = seed {
                config.model.seed = Some(s);
            }
            if let Some(k) = data_key {
                config.model.convergence_data_key = Some(k);
            }
            if let Some(t) = threshold {
                config.model.convergence_std_dev = t;
            }
            if let Some(m) = max_timesteps {
                config.model.max_timesteps = m;
            }
            cmd_run(&config, json)
        },
        Commands::Params { config } => cmd_params(config),
        Commands::Topology {
            nodes,
            graph_type,
            dot,
        } => cmd_topology(nodes, &graph_type, dot),
    }
}

fn init_logging(verbose: bool) {
    let log_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// File config (explicit or default location) overlaid with environment
fn load_config(path: Option<PathBuf>) -> anyhow::Result<SimulationConfig> {
    let file = match path {
        Some(path) => SimulationConfig::from_file(path)?,
        None => match SimulationConfig::default_path().filter(|p| p.exists()) {
            Some(path) => {
                tracing::debug!("Loading config from {}", path.display());
                SimulationConfig::from_file(path)?
            },
            None => SimulationConfig::default(),
        },
    };
    Ok(file.merge(SimulationConfig::from_env()))
}

fn cmd_run(config: &SimulationConfig, json: bool) -> anyhow::Result<()> {
    let mut model = AgentModel::new();
    BanditConfig::default().install(&mut model);
    config.apply(&mut model);
    if config.model.seed.is_none() {
        tracing::info!("No seed given, results are not reproducible");
    }

    model.initialize_graph()?;
    let timesteps = model.run_to_convergence()?;

    let criterion = ConvergenceCriterion::from_params(model.params())?;
    let graph = model.graph()?;
    let dispersion = convergence::dispersion(graph, &criterion.data_key)?;
    let summary = RunSummary {
        timesteps,
        converged: criterion.accepts(dispersion),
        data_key: criterion.data_key.clone(),
        dispersion,
        threshold: criterion.std_dev,
        graph_type: model.graph_type()?.to_string(),
        nodes: graph
            .nodes()
            .map(|(label, data)| NodeSummary {
                label,
                data: data.clone(),
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    if summary.converged {
        println!("Converged after {} timesteps", summary.timesteps);
    } else {
        println!(
            "Not converged after {} timesteps (ceiling {})",
            summary.timesteps,
            model.max_timesteps()
        );
    }
    println!(
        "  {} std dev: {:.6} (threshold {})",
        summary.data_key, summary.dispersion, summary.threshold
    );
    println!("  topology: {} ({} nodes)", summary.graph_type, summary.nodes.len());
    println!();
    for node in &summary.nodes {
        let fields: Vec<String> = node
            .data
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        println!("  node {:>3}: {}", node.label, fields.join(" "));
    }

    Ok(())
}

fn cmd_params(config: Option<PathBuf>) -> anyhow::Result<()> {
    let mut model = AgentModel::new();
    if let Some(path) = config {
        SimulationConfig::from_file(path)?.apply(&mut model);
    }

    for (key, value) in model.params().iter() {
        println!("{key:<24} {value}");
    }
    Ok(())
}

fn cmd_topology(nodes: usize, graph_type: &str, dot: bool) -> anyhow::Result<()> {
    if nodes == 0 {
        anyhow::bail!("--nodes must be positive");
    }

    let graph_type = GraphType::parse(graph_type);
    let graph = graph_type.build(nodes);

    if dot {
        print!("{}", graph.to_dot());
        return Ok(());
    }

    println!(
        "{graph_type}: {} nodes, {} edges",
        graph.node_count(),
        graph.edge_count()
    );
    for (a, b) in graph.edges() {
        println!("  {a} -- {b}");
    }
    Ok(())
}
