use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    BrowserOptions, HttpBackend, ModelBrowser, SearchOutcome, StreamOutcome, VerificationDashboard,
};
use shared::domain::{Concept, HexagramNumber, Tab, Variant};
use tracing::{info, warn};
use view::MemoryTarget;

mod config;
mod output;

#[derive(Parser, Debug)]
#[command(name = "bagua", about = "Browse Bagua models and run the math verification dashboard")]
struct Args {
    /// Backend base URL; overrides bagua.toml and BAGUA_BASE_URL.
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// Per-request timeout in seconds.
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,
    /// Write each panel to <panel>.html in this directory instead of stdout.
    #[arg(long, global = true)]
    out_dir: Option<PathBuf>,
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the model variants the backend serves.
    Models,
    /// Load one variant and render every browser panel.
    Browse {
        #[arg(long)]
        variant: Option<Variant>,
        /// Hexagram number to select after loading.
        #[arg(long)]
        select: Option<u32>,
        /// Render load failures into the status panel.
        #[arg(long)]
        surface_load_errors: bool,
    },
    /// Search hexagrams of one variant.
    Search {
        query: String,
        #[arg(long)]
        variant: Option<Variant>,
    },
    /// Load the verification summary dashboard.
    Dashboard,
    /// Run one concept's verification.
    Verify {
        concept: Concept,
        /// Decode the returned plots into PNG files here.
        #[arg(long)]
        plots_dir: Option<PathBuf>,
    },
    /// Run every verification and follow the backend's log stream.
    VerifyAll,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose)?;

    let mut settings = config::load_settings();
    if let Some(base_url) = args.base_url.clone() {
        settings.base_url = base_url;
    }
    if let Some(timeout_secs) = args.timeout_secs {
        settings.timeout_secs = timeout_secs.max(1);
    }
    let base_url = config::normalize_base_url(&settings.base_url)?;
    info!(base_url, timeout_secs = settings.timeout_secs, "bagua: starting");

    let backend = Arc::new(
        HttpBackend::with_timeout(&base_url, Duration::from_secs(settings.timeout_secs))
            .with_context(|| format!("invalid backend url '{base_url}'"))?,
    );
    let target = Arc::new(MemoryTarget::new());
    let out_dir = args.out_dir.as_deref();

    match args.command {
        Command::Models => {
            let browser = ModelBrowser::new(backend, target);
            let models = browser.models().await.context("failed to list models")?;
            for model in models {
                println!("{}\t{}\t{}", model.id, model.name, model.description);
            }
        }
        Command::Browse {
            variant,
            select,
            surface_load_errors,
        } => {
            let options = BrowserOptions {
                surface_load_errors: surface_load_errors || settings.surface_load_errors,
            };
            let browser = ModelBrowser::with_options(backend, target.clone(), options);
            let variant = variant.unwrap_or(settings.default_variant);
            let loaded = browser.select_variant(variant).await;

            if let (Ok(()), Some(number)) = (&loaded, select) {
                let snapshot = browser.snapshot().await;
                let hexagram = snapshot
                    .as_deref()
                    .and_then(|snapshot| {
                        snapshot
                            .hexagrams
                            .iter()
                            .find(|hexagram| hexagram.number == HexagramNumber(number))
                    })
                    .cloned();
                match hexagram {
                    Some(hexagram) => browser.select_hexagram(&hexagram).await,
                    None => warn!(number, %variant, "bagua: no such hexagram to select"),
                }
            }

            output::emit_panels(&target, out_dir)?;
            loaded.with_context(|| format!("failed to load the {variant} model"))?;
        }
        Command::Search { query, variant } => {
            let browser = ModelBrowser::new(backend, target.clone());
            browser
                .set_variant(variant.unwrap_or(settings.default_variant))
                .await;
            let outcome = browser.search_hexagrams(&query).await;
            output::emit_panels(&target, out_dir)?;
            if let SearchOutcome::Rendered { hits } = outcome.context("search failed")? {
                info!(hits, "bagua: search rendered");
            }
        }
        Command::Dashboard => {
            let dashboard = VerificationDashboard::new(backend, target.clone());
            dashboard.init();
            let loaded = dashboard.load_dashboard().await;
            output::emit_panels(&target, out_dir)?;
            loaded.context("failed to load the verification dashboard")?;
        }
        Command::Verify { concept, plots_dir } => {
            let dashboard = VerificationDashboard::new(backend, target.clone());
            dashboard.select_tab(Tab::Concept(concept)).await;
            let loaded = dashboard.load_verification(concept).await;
            output::emit_panels(&target, out_dir)?;
            loaded.with_context(|| format!("verification of '{concept}' failed"))?;

            if let Some(plots_dir) = plots_dir {
                let Some(payload) = dashboard.verification_result(concept).await else {
                    bail!("no verification result for '{concept}'");
                };
                let written = output::write_plots(&payload, &plots_dir)?;
                eprintln!("{written} plot(s) written to {}", plots_dir.display());
            }
        }
        Command::VerifyAll => {
            let dashboard = VerificationDashboard::new(backend, target.clone());
            dashboard.init();
            let outcome = dashboard.stream_all_verifications().await;
            output::emit_panels(&target, out_dir)?;
            match outcome {
                StreamOutcome::Completed => {}
                StreamOutcome::Errored => bail!("verification stream failed"),
                StreamOutcome::Superseded => bail!("verification stream was closed"),
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}
