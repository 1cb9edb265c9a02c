use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use home_share::catalog::Catalog;
use home_share::config::Config;
use home_share::ident::Ident;
use home_share::share::WalkDepth;
use home_share::{reconcile, scan, share};

/// Administrative front end for the share catalog. The HTTP layer uses the
/// same library calls; this binary exists so a deployment can be inspected
/// and repaired from a shell.
#[derive(Parser)]
#[command(name = "home-share", version, about = "Folder sharing catalog")]
struct Cli {
    /// Catalog database path (overrides HOME_SHARE_DB)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Initialize the catalog database and print its location
    Init,
    /// Create a share from a folder
    Share {
        /// Folder to share
        path: PathBuf,
    },
    /// List all shares
    Shares,
    /// List a share's files the way a viewer sees them
    Files {
        /// Share identifier
        share: String,
    },
    /// Print the folder tree under the media root as JSON
    Tree {
        /// Root to scan (defaults to HOME_SHARE_ROOT)
        root: Option<PathBuf>,
    },
    /// Check catalog/disk drift for one share, or all shares
    Check {
        /// Share identifier (omit to check every share)
        share: Option<String>,
    },
    /// Rebuild catalog entries from disk for one share, or all shares
    Reindex {
        /// Share identifier (omit to reindex every share)
        share: Option<String>,
    },
    /// Delete a share and all of its file entries
    Rm {
        /// Share identifier
        share: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::from_env();
    let db_path = cli.db.unwrap_or(config.db_path);
    let catalog = Catalog::open(&db_path)
        .with_context(|| format!("opening catalog at {}", db_path.display()))?;

    match cli.command {
        Command::Init => {
            println!("catalog ready at {}", db_path.display());
            println!("{} share(s)", catalog.share_count()?);
        }
        Command::Share { path } => {
            let created = share::create_share(&catalog, &path, WalkDepth::Recursive)?;
            let files = catalog.list_files(&created.id)?;
            println!("{}  {}  ({} files)", created.id, created.path, files.len());
        }
        Command::Shares => {
            for s in catalog.list_shares()? {
                println!("{}  {}", s.id, s.path);
            }
        }
        Command::Files { share } => {
            let id = parse_ident(&share)?;
            let media = share::list_media(&catalog, &id)?;
            println!("{}", serde_json::to_string_pretty(&media)?);
        }
        Command::Tree { root } => {
            let root = root.unwrap_or(config.media_root);
            let tree = scan::folder_tree(&catalog, &root);
            println!("{}", serde_json::to_string_pretty(&tree)?);
        }
        Command::Check { share } => match share {
            Some(share) => {
                let id = parse_ident(&share)?;
                let report = reconcile::check(&catalog, &id)?;
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            None => {
                let records = reconcile::check_all(&catalog)?;
                println!("{}", serde_json::to_string_pretty(&records)?);
            }
        },
        Command::Reindex { share } => match share {
            Some(share) => {
                let id = parse_ident(&share)?;
                let outcome = reconcile::reindex(&catalog, &id, WalkDepth::DirectChildren)?;
                println!("removed {}, added {}", outcome.removed, outcome.added);
            }
            None => {
                let records = reconcile::reindex_all(&catalog, WalkDepth::DirectChildren)?;
                println!("{}", serde_json::to_string_pretty(&records)?);
            }
        },
        Command::Rm { share } => {
            let id = parse_ident(&share)?;
            catalog.delete_share(&id)?;
            println!("deleted {id}");
        }
    }

    Ok(())
}

fn parse_ident(s: &str) -> anyhow::Result<Ident> {
    Ident::parse(s).ok_or_else(|| anyhow!("invalid identifier: {s}"))
}
