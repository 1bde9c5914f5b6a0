//! gcmd: fetch, list and export GCMD keyword schemes from the local cache.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use gcmd_concepts::Taxonomy;
use gcmd_core::{is_known_scheme, list_schemes, GcmdConfig};
use tokio::io::AsyncWriteExt;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "gcmd")]
#[command(author, version, about = "Local cache of the GCMD keyword management service")]
#[command(propagate_version = true)]
struct Cli {
    /// Cache root (overrides GCMD_CACHE)
    #[arg(long, global = true)]
    cache: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download schemes whose remote copy changed
    Fetch {
        /// Only this scheme (default: root and every registered scheme)
        #[arg(short, long)]
        scheme: Option<String>,
    },

    /// List concepts of a scheme as tab-separated id, label, definition
    List {
        scheme: String,

        /// Case-insensitive label substring
        #[arg(short, long)]
        filter: Option<String>,

        #[arg(long, default_value_t = 0)]
        offset: usize,

        #[arg(long, default_value_t = gcmd_core::defaults::FILTER_LIMIT)]
        limit: usize,
    },

    /// List the scheme entry points from the root document
    Root,

    /// List registered and discovered scheme names
    Schemes,

    /// Write every concept as a JSON document array
    Export {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Initialize tracing.
///
/// Environment variables:
///   LOG_FORMAT  - "json" or "text" (default: "text")
///   LOG_FILE    - path to log file (optional, enables file logging)
///   RUST_LOG    - standard env filter (default: "gcmd=info")
fn init_tracing() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "gcmd=info,gcmd_concepts=info,gcmd_fetch=info,gcmd_cache=info,gcmd_core=warn".into()
    });
    let registry = tracing_subscriber::registry().with(env_filter);

    if let Some(ref path) = log_file {
        let file_dir = Path::new(path).parent().unwrap_or(Path::new("."));
        let file_name = Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("gcmd.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(non_blocking))
                .init();
        } else {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false),
                )
                .init();
        }
        Some(guard)
    } else {
        // stdout carries command output
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        } else {
            registry
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
        None
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let _guard = init_tracing();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let mut config = GcmdConfig::from_env();
    if let Some(cache) = cli.cache {
        config = config.with_cache_dir(cache);
    }
    let taxonomy = Taxonomy::from_config(&config)
        .await
        .context("invalid configuration")?;

    match cli.command {
        Commands::Fetch { scheme: Some(scheme) } => {
            let result = taxonomy
                .fetch_scheme(&scheme)
                .await
                .with_context(|| format!("fetching {}", scheme))?;
            println!("{}\t{}\t{}\t{}", result.scheme, result.status, result.version, result.digest);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Fetch { scheme: None } => {
            let mut failed = 0;
            for outcome in taxonomy.fetch_all().await {
                match outcome.result {
                    Ok(result) => println!(
                        "{}\t{}\t{}\t{}",
                        result.scheme, result.status, result.version, result.digest
                    ),
                    Err(e) => {
                        failed += 1;
                        eprintln!("{}\tfailed\t{}", outcome.scheme, e);
                    }
                }
            }
            info!(failed, "Fetch finished");
            Ok(if failed == 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::List {
            scheme,
            filter,
            offset,
            limit,
        } => {
            let range = offset..offset.saturating_add(limit);
            let triples = taxonomy
                .filter(&scheme, filter.as_deref().unwrap_or(""), Some(range))
                .await
                .with_context(|| format!("listing {}", scheme))?;
            for t in triples {
                println!("{}\t{}\t{}", t.id, t.label, t.definition);
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Root => {
            for t in taxonomy.root().await.context("resolving root")? {
                println!("{}\t{}", t.id, t.label);
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Schemes => {
            let discovered = taxonomy.discovered_schemes().await.unwrap_or_else(|e| {
                info!(error = %e, "Root document unavailable, listing registry only");
                Vec::new()
            });
            for scheme in list_schemes(false) {
                println!("{}", scheme);
            }
            for scheme in discovered
                .iter()
                .filter(|s| !is_known_scheme(s))
            {
                println!("{}\t(unregistered)", scheme);
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Export { output } => {
            let (documents, failures) = taxonomy.export().await;
            for failure in &failures {
                if let Err(e) = &failure.result {
                    eprintln!("{}\tskipped\t{}", failure.scheme, e);
                }
            }
            let json = serde_json::to_vec(&documents)?;
            match output {
                Some(path) => {
                    tokio::fs::write(&path, &json)
                        .await
                        .with_context(|| format!("writing {}", path.display()))?;
                    info!(path = %path.display(), documents = documents.len(), "Export written");
                }
                None => {
                    let mut stdout = tokio::io::stdout();
                    stdout.write_all(&json).await?;
                    stdout.write_all(b"\n").await?;
                    stdout.flush().await?;
                }
            }
            Ok(if failures.is_empty() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}
