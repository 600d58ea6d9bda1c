//! tog CLI binary: answer one question over a knowledge graph, or run the
//! HTTP façade.
//!
//! Subcommands: `ask` (one reasoning run, record printed as JSON), `serve`.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tog::reason::reason;
use tog::{ChatOracle, SqliteGraph};

#[derive(Parser, Debug)]
#[command(name = "tog")]
#[command(about = "tog — answer questions by oracle-guided search over a knowledge graph")]
struct Args {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Answer one question and print the run record as pretty JSON
    Ask(AskArgs),
    /// Run the HTTP façade (SSE chat + runtime config)
    Serve(ServeArgs),
}

#[derive(clap::Args, Debug)]
struct AskArgs {
    /// The question to answer
    #[arg(short, long, value_name = "TEXT")]
    prompt: String,

    /// Beam width: how many paths each prune keeps
    #[arg(long, default_value_t = 3)]
    max_paths: usize,

    /// Exploration depth: how many hops before falling back
    #[arg(long, default_value_t = 3)]
    max_depth: usize,

    /// SQLite triplet store path
    #[arg(long, env = "GRAPH_DB", default_value = "graph.db", value_name = "PATH")]
    graph_db: String,

    /// Oracle model name
    #[arg(long, env = "ORACLE_MODEL", default_value = "gpt-4o-mini", value_name = "MODEL")]
    model: String,

    /// Oracle sampling temperature (selection tasks usually want 0)
    #[arg(long, value_name = "T")]
    temperature: Option<f32>,

    /// Seed entity id (repeatable); looked up in the store before the run
    #[arg(long = "seed", value_name = "ID")]
    seeds: Vec<String>,

    /// Derive seed entities from the question when no --seed is given
    #[arg(long)]
    resolve_seeds: bool,

    /// Keep a rolling oracle conversation context across the run's calls
    #[arg(long)]
    use_context: bool,
}

#[derive(clap::Args, Debug)]
struct ServeArgs {
    /// Listen address (default 127.0.0.1:8080)
    #[arg(long, value_name = "ADDR")]
    addr: Option<String>,

    /// Exit after the first chat run is done (used by tests)
    #[arg(long)]
    once: bool,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tog=info,serve=info,cli=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run_ask(args: AskArgs) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(db = %args.graph_db, model = %args.model, "opening graph store");
    let graph = SqliteGraph::new(&args.graph_db)?;
    let mut oracle = ChatOracle::new(args.model);
    if let Some(t) = args.temperature {
        oracle = oracle.with_temperature(t);
    }
    if args.use_context {
        oracle = oracle.with_context();
    }

    let seeds = if args.seeds.is_empty() {
        None
    } else {
        Some(tog::Graph::get_entities(&graph, &args.seeds).await?)
    };

    let record = reason(
        &args.prompt,
        &oracle,
        &graph,
        args.max_paths,
        args.max_depth,
        seeds,
        args.resolve_seeds,
    )
    .await;

    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    config::load_and_apply("tog", None::<&std::path::Path>).ok();
    init_logging();

    let args = Args::parse();
    match args.cmd {
        Command::Ask(ask) => run_ask(ask).await,
        Command::Serve(sa) => {
            if let Err(e) = serve::run_serve(sa.addr.as_deref(), sa.once).await {
                eprintln!("serve error: {}", e);
                std::process::exit(1);
            }
            Ok(())
        }
    }
}
