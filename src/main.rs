use clap::Parser; // for cli
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use font_filesize::cache::ResponseCache;
use font_filesize::config::{Cli, Command, SourceArgs};
use font_filesize::error::{Error, Result};
use font_filesize::font::collect_fonts;
use font_filesize::github::{GithubClient, Repository};
use font_filesize::handlers::router;
use font_filesize::rate_limit::RequestGovernor;
use font_filesize::report::{Page, render_pages, write_pages};
use font_filesize::state::AppState;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // parse cli arguments
    let cli = Cli::parse();

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "font-filesize failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> Result<()> {
    match command {
        Command::Generate { source, output } => {
            let pages = build_pages(&source).await?;
            write_pages(&output, &pages).await
        }
        Command::Serve { source, port } => {
            let pages = build_pages(&source).await?;
            let state = Arc::new(AppState::new(pages));
            let app = router(state);

            let addr = format!("0.0.0.0:{}", port);
            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .map_err(|source| Error::Io { path: addr.clone().into(), source })?;
            info!("Reports served on http://localhost:{}", port);
            axum::serve(listener, app)
                .await
                .map_err(|source| Error::Io { path: addr.into(), source })
        }
    }
}

async fn build_pages(source: &SourceArgs) -> Result<Vec<Page>> {
    let governor = Arc::new(RequestGovernor::new(
        source.max_concurrent,
        source.rate_limit,
        Duration::from_secs(source.rate_window),
    ));
    let cache = Arc::new(ResponseCache::new(
        source.cache_dir.clone(),
        source.cache_ttl.map(Duration::from_secs),
    ));
    let client = Arc::new(GithubClient::new(
        reqwest::Client::new(),
        source.api_url.clone(),
        source.token.clone(),
        governor,
        cache,
    ));
    let repo = Repository::new(&source.owner, &source.repo).with_branch(&source.branch);

    info!(
        "Governor: {} concurrent, {} requests per {} seconds",
        source.max_concurrent, source.rate_limit, source.rate_window
    );
    if source.token.is_none() {
        info!("No GITHUB_TOKEN set, using the unauthenticated quota");
    }

    let fonts = collect_fonts(client, &repo, &source.root, source.limit).await?;
    Ok(render_pages(&fonts, &source.axes(), &source.style))
}
