//! # TrackBack CLI (`trackback`)
//!
//! Report found items from the command line.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `trackback init` | Create the SQLite items table |
//! | `trackback submit ...` | Fill in a found-item report and submit it |
//! | `trackback list` | Show the most recent listings |
//!
//! ## Examples
//!
//! ```bash
//! trackback init --config ./config/trackback.toml
//!
//! trackback submit \
//!     --name "Wallet" --category "Accessories" \
//!     --description "Brown leather, student ID inside" \
//!     --phone 9876543210 --date 08/10/2025 --time "03:00 PM" \
//!     --lat 20.221495 --lon 85.735871 \
//!     --image ./wallet.jpg --user-id 7f3a
//!
//! trackback list --limit 5
//! ```
//!
//! Logging goes to stderr and is controlled with `RUST_LOG`
//! (default `trackback=info`).

use anyhow::bail;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use trackback::config;
use trackback::identity::{EnvIdentity, StaticIdentity};
use trackback::listings;
use trackback::location::{self, Coordinates};
use trackback::migrate;
use trackback::models::{DraftField, Identity, ImageRef};
use trackback::submission::SubmissionController;
use trackback::traits::IdentityProvider;

/// TrackBack: campus lost-and-found reporting.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file.
#[derive(Parser)]
#[command(
    name = "trackback",
    about = "TrackBack: report found items to the campus lost-and-found",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/trackback.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the items table. Safe to run
    /// more than once.
    Init,

    /// Submit a found-item report.
    ///
    /// Every field except the category is required. The photo is uploaded
    /// first, then the record is stored with the photo's public URL.
    Submit(SubmitArgs),

    /// Show the most recent listings.
    List {
        /// Maximum number of listings to show.
        #[arg(long)]
        limit: Option<i64>,
    },
}

#[derive(Args)]
struct SubmitArgs {
    /// What was found (e.g. `Wallet`).
    #[arg(long, default_value = "")]
    name: String,

    #[arg(long, default_value = "")]
    category: String,

    #[arg(long, default_value = "")]
    description: String,

    /// Contact number of the finder.
    #[arg(long, default_value = "")]
    phone: String,

    /// When it was found, free-form (e.g. `08/10/2025`).
    #[arg(long, default_value = "")]
    date: String,

    /// Time it was found, free-form (e.g. `03:00 PM`).
    #[arg(long, default_value = "")]
    time: String,

    /// Where it was found, as text.
    #[arg(long, conflicts_with_all = ["lat", "lon"])]
    location: Option<String>,

    /// Latitude of the place it was found; resolved through `[geocoder]`.
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    lat: Option<f64>,

    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    lon: Option<f64>,

    /// Photo of the item.
    #[arg(long)]
    image: Option<PathBuf>,

    /// Submit as this user instead of reading `TRACKBACK_USER_ID`.
    #[arg(long)]
    user_id: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "trackback=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            if cfg.table.backend != "sqlite" {
                bail!(
                    "init only applies to the sqlite table backend (configured: '{}')",
                    cfg.table.backend
                );
            }
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Submit(args) => {
            run_submit(&cfg, args).await?;
        }
        Commands::List { limit } => {
            listings::run_list(&cfg, limit).await?;
        }
    }

    Ok(())
}

async fn run_submit(cfg: &config::Config, args: SubmitArgs) -> anyhow::Result<()> {
    let controller = SubmissionController::from_config(cfg).await?;

    controller.set_field(DraftField::ItemName, args.name);
    controller.set_field(DraftField::Category, args.category);
    controller.set_field(DraftField::Description, args.description);
    controller.set_field(DraftField::PhoneNumber, args.phone);
    controller.set_field(DraftField::Date, args.date);
    controller.set_field(DraftField::Time, args.time);

    if let (Some(lat), Some(lon)) = (args.lat, args.lon) {
        let resolver = location::create_resolver(&cfg.geocoder)?;
        let place = location::describe_location(resolver.as_ref(), Coordinates::new(lat, lon)).await;
        controller.set_field(DraftField::Location, place);
    } else if let Some(place) = args.location {
        controller.set_field(DraftField::Location, place);
    }

    controller.set_image(args.image.map(ImageRef::new));

    let blank = controller.validate();
    if !blank.is_empty() {
        for field in &blank {
            eprintln!("{} cannot be empty", field.label());
        }
        bail!("{} required field(s) missing", blank.len());
    }

    let identity: Box<dyn IdentityProvider> = match args.user_id {
        Some(id) => Box::new(StaticIdentity::signed_in(Identity::new(id))),
        None => Box::new(EnvIdentity),
    };
    let user = identity.current_user();

    match controller.submit(user.as_ref()).await {
        Ok(record) => {
            if let Some(message) = controller.state().message() {
                println!("{}", message);
            }
            println!("  name: {}", record.name);
            println!("  location: {}", record.location);
            println!("  image: {}", record.image_url);
            println!("  id: {}", record.id);
            Ok(())
        }
        Err(e) => bail!("{}", e),
    }
}
