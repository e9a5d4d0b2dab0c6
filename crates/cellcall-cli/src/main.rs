//! cellcall CLI - run a compute server or make one-off remote calls

use std::time::Duration;

use anyhow::{Context, Result};
use cellcall_protocol::{
    ArgumentList, CellError, ClientOptions, RemoteClient, Status, Value, DEFAULT_PORT,
};
use cellcall_server::{FunctionRegistry, FunctionServer, ServerConfig};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "cellcall")]
#[command(author, version, about = "Remote spreadsheet function server and client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the reference compute server with the built-in functions
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "localhost")]
        host: String,

        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,
    },

    /// Call a function on a running server and print the result
    Call {
        /// Function name
        name: String,

        /// Arguments: numbers, TRUE/FALSE, error literals such as #N/A,
        /// "" for empty; anything else is text
        #[arg(allow_negative_numbers = true)]
        args: Vec<String>,

        #[arg(long, default_value = "localhost")]
        host: String,

        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Give up on connecting or on the reply after this many milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "cellcall=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { host, port } => serve(ServerConfig { host, port }),
        Commands::Call {
            name,
            args,
            host,
            port,
            timeout_ms,
        } => call(&name, &args, &host, port, timeout_ms),
    }
}

fn serve(config: ServerConfig) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;

    runtime.block_on(async {
        let server = FunctionServer::bind(&config, FunctionRegistry::with_builtins())
            .await
            .with_context(|| format!("Failed to start server on {}", config.addr()))?;

        server
            .run_until(async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!("Failed to listen for Ctrl-C: {e}");
                }
            })
            .await?;
        Ok::<_, anyhow::Error>(())
    })
}

fn call(
    name: &str,
    raw_args: &[String],
    host: &str,
    port: u16,
    timeout_ms: Option<u64>,
) -> Result<()> {
    let timeout = timeout_ms.map(Duration::from_millis);
    let options = ClientOptions {
        connect_timeout: timeout,
        call_timeout: timeout,
    };

    let args = ArgumentList::new(raw_args.iter().map(|a| parse_arg(a)).collect())
        .context("Too many arguments")?;

    let mut client = RemoteClient::new(options)?;
    client
        .connect(host, port)
        .with_context(|| format!("Could not connect to {host}:{port}"))?;
    let value = client
        .execute_function(name, args)
        .with_context(|| format!("Call to {name} failed"))?;

    println!("{value}");
    if client.last_status() == Some(Status::Error) {
        eprintln!("Server reported an error for {name}");
    }

    client.disconnect();
    Ok(())
}

/// Interpret a command-line argument as a cell value.
fn parse_arg(arg: &str) -> Value {
    if arg.is_empty() {
        return Value::Empty;
    }
    if arg.eq_ignore_ascii_case("TRUE") {
        return Value::Boolean(true);
    }
    if arg.eq_ignore_ascii_case("FALSE") {
        return Value::Boolean(false);
    }
    if let Some(e) = CellError::from_str(arg) {
        return Value::Error(e);
    }
    match arg.trim().parse::<f64>() {
        Ok(n) => Value::Number(n),
        Err(_) => Value::text(arg),
    }
}
