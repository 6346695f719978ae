use clap::Parser;
use std::sync::Arc;
use tokio::net::TcpListener;

use slotgate::backend::{Caller, Flash2db, StubCaller};
use slotgate::config::{BackendMode, Config};
use slotgate::state::AppState;

#[derive(Parser)]
#[command(version, about = "WebSocket gateway between slot game clients and the game backend")]
struct Cli {
    /// Listen port (overrides PORT)
    #[arg(long)]
    port: Option<u16>,
    /// RPC bridge base URL (overrides SLOTGATE_BACKEND_URL)
    #[arg(long)]
    backend_url: Option<String>,
    /// Answer backend calls locally with canned responses
    #[arg(long)]
    stub_backend: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "slotgate=info,tower_http=info".into()),
        )
        .init();

    let mut config = Config::from_env();
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(url) = cli.backend_url {
        config.backend_url = Some(url);
    }
    if cli.stub_backend {
        config.backend = BackendMode::Stub;
    }
    config.validate();

    print_banner(&config);

    let caller: Arc<dyn Caller> = match config.backend {
        BackendMode::Http => Arc::new(
            Flash2db::new(
                config.backend_url.as_deref().unwrap_or_default(),
                config.services.clone(),
                config.backend_timeout,
            )
            .expect("failed to set up backend client"),
        ),
        BackendMode::Stub => Arc::new(StubCaller::demo()),
    };

    let state = AppState::new(caller, config.gateway.clone());
    let app = slotgate::routes::router(state);

    let listener = TcpListener::bind(("0.0.0.0", config.port))
        .await
        .expect("failed to bind");

    let actual_port = listener
        .local_addr()
        .expect("failed to get local address")
        .port();
    eprintln!("  \x1b[32m→ listening on 0.0.0.0:{actual_port}\x1b[0m");
    eprintln!();

    axum::serve(listener, app).await.expect("server error");
}

fn print_banner(config: &Config) {
    let version = env!("CARGO_PKG_VERSION");
    let backend = match (&config.backend, &config.backend_url) {
        (BackendMode::Http, Some(url)) => format!("http ({url})"),
        (BackendMode::Http, None) => "http".to_string(),
        (BackendMode::Stub, _) => "stub".to_string(),
    };
    let gateway = &config.gateway;

    eprintln!();
    eprintln!("  \x1b[1;36mslotgate\x1b[0m \x1b[2mv{version}\x1b[0m");
    eprintln!();
    eprintln!("  \x1b[2mport\x1b[0m         {}", config.port);
    eprintln!("  \x1b[2mbackend\x1b[0m      {backend}");
    eprintln!("  \x1b[2mservices\x1b[0m     {}", config.services.len());
    eprintln!("  \x1b[2mmax sessions\x1b[0m {}", gateway.max_sessions);
    eprintln!(
        "  \x1b[2minbound\x1b[0m      {} frames, {}",
        gateway.inbound_queue, gateway.backpressure
    );

    if !gateway.cleanup_unauthenticated {
        eprintln!();
        eprintln!("  \x1b[33m! disconnect cleanup skipped for sessions that never logged in\x1b[0m");
    }

    eprintln!();
}
