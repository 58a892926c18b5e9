//! Billing views CLI
//!
//! Renders the bills screen over a seeded in-memory ledger.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use ledgerview_billing::{bill_routes, pay, seed, BillsScreen, PAY_CHOICE};
use ledgerview_core::{MemoryStore, Page, RecordId, ViewsConfig};

#[derive(Parser)]
#[command(name = "ledgerview")]
#[command(about = "Browse patient bills and payment receipts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Mount point of the bills screen (overrides the config)
    #[arg(short, long, global = true)]
    path: Option<String>,

    /// Filter the bills list by provider or procedure code
    #[arg(short, long, global = true)]
    search: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the bills list
    List,

    /// Show one bill
    Show {
        /// Bill record id
        id: String,
    },

    /// Pay a bill, then show it
    Pay {
        /// Bill record id
        id: String,
    },

    /// Render each path in turn
    Browse {
        /// Paths under the mount point
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

fn load_config(cli: &Cli) -> Result<ViewsConfig> {
    let mut config = ViewsConfig::load(cli.config.as_deref())?;
    if let Some(path) = &cli.path {
        config.set_from_string("base_path", path.as_str())?;
        config.validate()?;
    }
    Ok(config)
}

fn init_tracing(config: &ViewsConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter.as_str()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn print_page(screen: &mut BillsScreen<MemoryStore>, path: &str) -> Result<()> {
    match screen.show(path).await {
        Page::Failed(err) => Err(anyhow::Error::new(err).context(format!("Failed to render {path}"))),
        Page::NotFound { path } => bail!("No view at {path}"),
        page => {
            print!("{page}");
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli).context("Invalid configuration")?;
    init_tracing(&config);

    let store = Arc::new(MemoryStore::new());
    seed::sample_ledger(&store)?;

    let mut screen = bill_routes(store.clone(), &config)?;
    if let Some(search) = &cli.search {
        screen.set_search(search.as_str());
    }

    match cli.command {
        Commands::List => {
            let list_url = screen.router().list_url().to_string();
            print_page(&mut screen, &list_url).await?;
        }

        Commands::Show { id } => {
            let url = screen.router().detail_url(&RecordId::new(id));
            print_page(&mut screen, &url).await?;
        }

        Commands::Pay { id } => {
            let record_id = RecordId::new(id);
            let url = screen.router().detail_url(&record_id);
            let Page::Detail(detail) = screen.show(&url).await else {
                bail!("No bill {record_id}");
            };
            let Some(action) = detail.action(PAY_CHOICE) else {
                bail!("Bill {record_id} cannot be paid");
            };
            println!("{}: {}", action.prompt.title, action.prompt.content);

            pay(store.as_ref(), record_id).await?;
            println!("{}", action.success.title);
            println!("{}", action.success.content);
            println!();
            let list_url = screen.router().list_url().to_string();
            print_page(&mut screen, &list_url).await?;
        }

        Commands::Browse { paths } => {
            for path in paths {
                println!("== {path}");
                print_page(&mut screen, &path).await?;
            }
        }
    }

    Ok(())
}
