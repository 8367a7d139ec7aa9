//! Line Router Example
//!
//! Reads lines from stdin and routes each one through a mixer tree:
//!
//! ```text
//! root                      (fallback: "unknown command")
//! ├── leaf "ping"           "/ping"        -> "pong"
//! ├── leaf "echo"           "/echo <text>" -> "<text>"
//! └── composite "admin"     (intercept: "!!" -> "blocked")
//!     ├── leaf "shout"      "!shout <text>" -> "<TEXT>"
//!     └── leaf "whoami"     "!whoami"       -> "admin"
//! ```
//!
//! # Usage
//!
//! ```bash
//! printf '/ping\n!shout hi\nnope\n' | cargo run --package line-router -- --diagnostics
//! ```

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use mixer::prelude::*;
use mixer::runtime::RoutingConfig;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Debug, Parser)]
#[command(about = "Route stdin lines through a mixer tree")]
struct Args {
    /// Per-line timeout in milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Log traversal scopes and notes.
    #[arg(long)]
    diagnostics: bool,

    /// Load settings from this file instead of searching for `mixer.toml`.
    #[arg(long)]
    config: Option<std::path::PathBuf>,
}

/// The reply produced by whichever mixer claimed the line.
#[derive(Debug, Clone)]
struct Reply(String);

fn reply(
    f: impl Fn(&str) -> String + Send + Sync + 'static,
) -> impl Fn(&mut ProcessContext<String>) -> MixResult<()> + Send + Sync + 'static {
    move |ctx| {
        let text = f(ctx.item());
        ctx.set_state(Reply(text));
        Ok(())
    }
}

fn build_tree() -> CompositeMixer<String> {
    let admin = CompositeMixer::new("admin")
        .with_child(
            LeafMixer::new("shout")
                .accept_when(|line: &String| line.starts_with("!shout "))
                .process_with(reply(|line| line["!shout ".len()..].to_uppercase())),
        )
        .with_child(
            LeafMixer::new("whoami")
                .accept_when(|line: &String| line == "!whoami")
                .process_with(reply(|_| "admin".to_string())),
        )
        .with_behavior(Intercept::new(
            |line: &String| line.starts_with("!!"),
            reply(|_| "blocked".to_string()),
        ));

    CompositeMixer::new("root")
        .with_child(
            LeafMixer::new("ping")
                .accept_when(|line: &String| line == "/ping")
                .process_with(reply(|_| "pong".to_string())),
        )
        .with_child(
            LeafMixer::new("echo")
                .accept_when(|line: &String| line.starts_with("/echo "))
                .process_with(reply(|line| line["/echo ".len()..].to_string())),
        )
        .with_child(admin)
        .with_behavior(Fallback::new(reply(|line| format!("unknown command: {line}"))))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &args.config {
        loader = loader.file(path);
    }
    let mut settings = loader.load()?;
    if args.diagnostics {
        settings.routing.diagnostics = true;
    }
    if let Some(ms) = args.timeout_ms {
        settings.routing.timeout_ms = Some(ms);
    }
    mixer::runtime::logging::init_from_config(&settings.logging);

    let routing: RoutingConfig = settings.routing;
    let router = Router::from_config(Arc::new(build_tree()), &routing);
    info!(timeout_ms = ?routing.timeout_ms, "Line router ready");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match router.route(line).await {
            Ok(Routed::Processed(ctx)) => {
                let text = ctx.get_state::<Reply>().map(|r| r.0.as_str()).unwrap_or("");
                println!("[{}] {}", ctx.route(), text);
            }
            Ok(Routed::Unclaimed(line)) => println!("(unclaimed) {line}"),
            Err(e) => error!("Failed to route line: {e}"),
        }
    }

    router.shutdown();
    Ok(())
}
