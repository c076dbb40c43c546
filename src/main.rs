use anyhow::Context;
use clap::Parser;
use page_recorder::dom::NodeSpec;
use page_recorder::record::engine::FrameContext;
use page_recorder::server::{routes, AppState};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value_t = 9670)]
    port: u16,

    /// Host component reported as the frame location
    #[arg(long, default_value = "localhost")]
    host: String,

    /// Pathname component reported as the frame location
    #[arg(long, default_value = "/")]
    pathname: String,

    /// Run as a nested-frame instance (attaches iframeInfo to actions)
    #[arg(long)]
    nested: bool,

    /// JSON page description to preload before serving
    #[arg(long)]
    page: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    log::info!("Starting page-recorder harness on port {}", args.port);

    let frame = if args.nested {
        FrameContext::nested(&args.host, &args.pathname)
    } else {
        FrameContext::top(&args.host, &args.pathname)
    };
    let state = AppState::new(frame);

    if let Some(path) = &args.page {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read page file {}", path.display()))?;
        let spec: NodeSpec = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid page description in {}", path.display()))?;
        let nodes = state.load_page(&spec).await;
        log::info!("Preloaded page from {} ({} elements)", path.display(), nodes);
    }

    let api = routes(state);

    // Bind manually to handle "port in use" error gracefully
    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));

    match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => {
            log::info!("Listening on http://{}", addr);
            warp::serve(api)
                .run_incoming(tokio_stream::wrappers::TcpListenerStream::new(listener))
                .await;
            Ok(())
        }
        Err(e) => {
            log::error!("Failed to bind to port {}: {}", args.port, e);
            eprintln!(
                "Error: Port {} is already in use or unavailable.",
                args.port
            );
            std::process::exit(1);
        }
    }
}
