use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use seo_wizard::app::server::{AppState, router};
use seo_wizard::app::store::LocalFsArticleStore;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct ServerArgs {
    #[arg(long, default_value = "127.0.0.1:8080")]
    addr: SocketAddr,

    #[arg(long, default_value = "workspace-server")]
    data_dir: PathBuf,

    /// Base URL clients reach this server at (used in image URLs).
    /// Defaults to `http://<addr>`.
    #[arg(long)]
    public_url: Option<String>,
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return std::process::ExitCode::FAILURE;
    }
    std::process::ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    seo_wizard::logging::init("info,tower_http=debug")?;

    let args = ServerArgs::parse();
    tracing::info!(?args, "starting seo-wizard-server");

    let public_url = match &args.public_url {
        Some(raw) => {
            let url = url::Url::parse(raw.trim())
                .map_err(|err| anyhow::anyhow!("invalid --public-url {raw:?}: {err}"))?;
            url.as_str().to_owned()
        }
        None => format!("http://{}", args.addr),
    };

    let store = Arc::new(LocalFsArticleStore::new(&args.data_dir, &public_url));
    let app = router(AppState { store });

    let listener = tokio::net::TcpListener::bind(args.addr)
        .await
        .map_err(|err| anyhow::anyhow!("bind {}: {err}", args.addr))?;
    tracing::info!(addr = %args.addr, public_url = %public_url, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
