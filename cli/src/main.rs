//! kiagent CLI binary: operational surface only (§6.4) — `start`, `stop`,
//! `status`. Workflow interaction happens over the WebSocket channel that
//! `start` binds, not through this binary.

mod setup;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use setup::{build_engine, default_bindings_path, default_mcp_registry_path, StartArgs};

#[derive(Parser, Debug)]
#[command(name = "kiagent")]
#[command(about = "kiagent — multi-agent software engineering workflow engine")]
struct Args {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the engine and bind the client channel to a WebSocket address.
    Start(StartCliArgs),
    /// Request a graceful shutdown of a running server.
    Stop(StopArgs),
    /// Report liveness for a server at the given address.
    Status(StatusArgs),
}

#[derive(clap::Args, Debug)]
struct StartCliArgs {
    /// Workspace root; state is persisted under `<workspace>/.ki_autoagent_ws/`.
    #[arg(long, value_name = "DIR")]
    workspace: PathBuf,

    /// Agent bindings JSON (default: `<workspace>/.ki_autoagent_ws/bindings.json`).
    #[arg(long, value_name = "FILE")]
    bindings: Option<PathBuf>,

    /// MCP server registry JSON (default: `<workspace>/.ki_autoagent_ws/mcp_registry.json`).
    #[arg(long, value_name = "FILE")]
    mcp_registry: Option<PathBuf>,

    /// MCP server name used for file writes.
    #[arg(long, value_name = "NAME", default_value = "filesystem")]
    file_server: String,

    /// WebSocket listen address (default 127.0.0.1:8765).
    #[arg(long, value_name = "ADDR")]
    addr: Option<String>,

    /// Keep serving after the first connection closes (default: exit after it).
    #[arg(long)]
    keep_alive: bool,
}

#[derive(clap::Args, Debug)]
struct StopArgs {
    /// Server WebSocket address (default 127.0.0.1:8765).
    #[arg(long, value_name = "ADDR")]
    addr: Option<String>,
}

#[derive(clap::Args, Debug)]
struct StatusArgs {
    /// Server WebSocket address (default 127.0.0.1:8765).
    #[arg(long, value_name = "ADDR")]
    addr: Option<String>,
}

const DEFAULT_ADDR: &str = "127.0.0.1:8765";

#[tokio::main]
async fn main() {
    kiagent_config::load_and_apply("kiagent", None).ok();
    init_logging();

    let args = Args::parse();
    let exit_code = match args.cmd {
        Command::Start(start_args) => run_start(start_args).await,
        Command::Stop(stop_args) => run_stop(stop_args).await,
        Command::Status(status_args) => run_status(status_args).await,
    };
    std::process::exit(exit_code);
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run_start(args: StartCliArgs) -> i32 {
    let bindings_path = args.bindings.clone().unwrap_or_else(|| default_bindings_path(&args.workspace));
    let mcp_registry_path = args.mcp_registry.clone().unwrap_or_else(|| default_mcp_registry_path(&args.workspace));

    let start_args = StartArgs {
        workspace_path: args.workspace.clone(),
        bindings_path,
        mcp_registry_path,
        file_server: args.file_server.clone(),
    };

    let engine = match build_engine(&start_args) {
        Ok(engine) => engine,
        Err(e) => {
            tracing::error!("fatal init error: {e}");
            return 1;
        }
    };

    if let Err(e) = kiagent_serve::run_serve(args.addr.as_deref(), engine, !args.keep_alive).await {
        tracing::error!("unrecoverable runtime error: {e}");
        return 2;
    }
    0
}

/// There is no server-to-server control channel in the client protocol
/// (§6.1 only defines `init`/`chat`/`hitl_response`/`cancel` over an
/// already-established connection), so `stop` verifies the address is
/// reachable and reports that shutdown must be delivered out of band
/// (signal, process manager). A reachable server still exits 0.
async fn run_stop(args: StopArgs) -> i32 {
    let addr = args.addr.as_deref().unwrap_or(DEFAULT_ADDR);
    match tokio::net::TcpStream::connect(addr).await {
        Ok(_) => {
            println!("kiagent at {addr} is running; send SIGTERM to the process to stop it");
            0
        }
        Err(e) => {
            eprintln!("kiagent at {addr} is not reachable: {e}");
            2
        }
    }
}

async fn run_status(args: StatusArgs) -> i32 {
    let addr = args.addr.as_deref().unwrap_or(DEFAULT_ADDR);
    match tokio::net::TcpStream::connect(addr).await {
        Ok(_) => {
            println!("kiagent at {addr}: up");
            0
        }
        Err(_) => {
            println!("kiagent at {addr}: down");
            0
        }
    }
}
