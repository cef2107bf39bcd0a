//! Arbor CLI - behaviour tree authoring and dry runs.
//!
//! Single binary that provides:
//! - `arbor new` - write a fresh tree file
//! - `arbor inspect` - print a tree's outline and properties
//! - `arbor catalog` - list the built-in node types
//! - `arbor run` - tick a tree against scripted hooks

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, EnvFilter};

use arbor_bt::{share, Category, EngineConfig, Evaluator, NodeId, NodeRegistry, Tree};
use arbor_core::{RunContext, Status};
use arbor_tools::{TraceEvent, TraceSink};

#[derive(Parser)]
#[command(name = "arbor")]
#[command(about = "Behaviour tree authoring and dry runs", version)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a new tree with the default root
    New {
        /// Output file
        path: PathBuf,

        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the outline of a tree file
    Inspect {
        /// Tree file (JSON)
        path: PathBuf,
    },

    /// List the built-in node types
    Catalog,

    /// Tick a tree and report each result
    Run {
        /// Tree file (JSON)
        path: PathBuf,

        /// Number of ticks
        #[arg(long, default_value_t = 10)]
        ticks: u64,

        /// Seconds per tick
        #[arg(long, default_value_t = 0.1)]
        dt: f32,

        /// Engine config (YAML)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Evaluator id used for seeding
        #[arg(long, default_value_t = 1)]
        owner_id: u64,

        /// Script an action function: `id=success|failure|running`
        #[arg(long = "action", value_parser = parse_action)]
        actions: Vec<(String, ScriptedStatus)>,

        /// Script a condition function: `id=true|false`
        #[arg(long = "condition", value_parser = parse_condition)]
        conditions: Vec<(String, bool)>,

        /// Log node start/end events
        #[arg(long)]
        trace: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ScriptedStatus {
    Success,
    Failure,
    Running,
}

impl From<ScriptedStatus> for Status {
    fn from(value: ScriptedStatus) -> Self {
        match value {
            ScriptedStatus::Success => Status::Success,
            ScriptedStatus::Failure => Status::Failure,
            ScriptedStatus::Running => Status::Running,
        }
    }
}

fn split_binding(raw: &str) -> Result<(&str, &str), String> {
    match raw.split_once('=') {
        Some((id, value)) if !id.is_empty() => Ok((id, value)),
        _ => Err(format!("expected `id=value`, got `{raw}`")),
    }
}

fn parse_action(raw: &str) -> Result<(String, ScriptedStatus), String> {
    let (id, value) = split_binding(raw)?;
    let status = ScriptedStatus::from_str(value, true)?;
    Ok((id.to_string(), status))
}

fn parse_condition(raw: &str) -> Result<(String, bool), String> {
    let (id, value) = split_binding(raw)?;
    let passes = value
        .parse()
        .map_err(|_| format!("expected true or false, got `{value}`"))?;
    Ok((id.to_string(), passes))
}

/// Counts hook calls per id so a run can be summarised.
#[derive(Debug, Default)]
struct Console {
    calls: BTreeMap<String, u32>,
}

/// Forwards engine trace events to the log.
struct LogSink;

impl TraceSink for LogSink {
    fn emit(&mut self, event: TraceEvent) {
        tracing::info!(
            tick = event.tick,
            tag = %event.tag,
            node = event.a,
            status = event.b,
            "trace"
        );
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    match cli.command {
        Commands::New { path, force } => new_tree(&path, force),
        Commands::Inspect { path } => inspect(&path),
        Commands::Catalog => {
            catalog();
            Ok(())
        }
        Commands::Run {
            path,
            ticks,
            dt,
            config,
            owner_id,
            actions,
            conditions,
            trace,
        } => {
            let mut config = match config {
                Some(config) => EngineConfig::load(&config)?,
                None => EngineConfig::default(),
            };
            config.trace_nodes |= trace;
            run(&path, ticks, dt, config, owner_id, actions, conditions)
        }
    }
}

fn load_tree(path: &Path) -> Result<Tree> {
    let source =
        std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&source).with_context(|| format!("parse tree {}", path.display()))
}

fn new_tree(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (pass --force to replace it)", path.display());
    }
    let tree = Tree::new();
    let json = serde_json::to_string_pretty(&tree)?;
    std::fs::write(path, json).with_context(|| format!("write {}", path.display()))?;

    tracing::info!(path = %path.display(), version = %tree.version(), "Created tree");
    Ok(())
}

fn inspect(path: &Path) -> Result<()> {
    let tree = load_tree(path)?;

    println!("Tree {}", path.display());
    println!("Version: {}", tree.version());
    println!(
        "Nodes: {} ({} slots)",
        tree.node_count(),
        tree.slot_count()
    );
    println!();
    print_outline(&tree, tree.root(), 0);

    if !tree.properties().is_empty() {
        println!();
        println!("Properties:");
        for property in tree.properties() {
            let value = tree
                .get_field(property.node, &property.field)
                .map(|value| format!("{value:?}"))
                .unwrap_or_else(|err| format!("<{err}>"));
            println!(
                "  {} -> {}.{} = {}",
                property.display_name, property.node, property.field, value
            );
        }
    }
    Ok(())
}

fn print_outline(tree: &Tree, id: NodeId, depth: usize) {
    let Some(node) = tree.node(id) else {
        return;
    };
    let fields: Vec<String> = node
        .bindable_fields()
        .into_iter()
        .filter_map(|info| node.field(info.name).map(|v| format!("{}={v:?}", info.name)))
        .collect();
    let hidden = if node.exposed { "" } else { " [hidden]" };
    println!(
        "{:indent$}{} {} ({}){}{}",
        "",
        id,
        node.name,
        node.category(),
        if fields.is_empty() {
            String::new()
        } else {
            format!(" {}", fields.join(" "))
        },
        hidden,
        indent = depth * 2
    );
    for child in tree.children(id) {
        print_outline(tree, child, depth + 1);
    }
}

fn catalog() {
    let registry = NodeRegistry::builtin();
    for category in [Category::Composite, Category::Decorator, Category::Action] {
        println!("{category}:");
        for name in registry.names_in(category) {
            println!("  {name}");
        }
    }
}

fn run(
    path: &Path,
    ticks: u64,
    dt: f32,
    config: EngineConfig,
    owner_id: u64,
    actions: Vec<(String, ScriptedStatus)>,
    conditions: Vec<(String, bool)>,
) -> Result<()> {
    let tree = load_tree(path)?;
    tracing::info!(path = %path.display(), version = %tree.version(), "Running tree");

    let mut evaluator = Evaluator::new(owner_id)
        .with_config(config)
        .with_blueprint(share(tree))
        .with_trace_sink(Box::new(LogSink));

    let provider = evaluator.hooks.provider("cli");
    for (id, scripted) in actions {
        let key = id.clone();
        let status = Status::from(scripted);
        provider.on_evaluate(id, 0, move |owner: &mut Console, _ctx: &RunContext| {
            *owner.calls.entry(key.clone()).or_default() += 1;
            status
        });
    }
    for (id, passes) in conditions {
        let key = id.clone();
        provider.condition(id, 0, move |owner: &mut Console| {
            *owner.calls.entry(key.clone()).or_default() += 1;
            passes
        });
    }

    let mut owner = Console::default();
    for tick in 1..=ticks {
        let status = evaluator.tick(&mut owner, &RunContext::new(dt).with_tick(tick));
        println!("tick {tick:>4}: {status:?}");
    }
    evaluator.force_stop(&mut owner);

    if !owner.calls.is_empty() {
        println!();
        println!("Hook calls:");
        for (id, count) in &owner.calls {
            println!("  {id}: {count}");
        }
    }
    Ok(())
}
