use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use browser_client::{BrowserSession, LaunchOptions};
use harvest_common::HarvestConfig;
use player_api_client::PlayerApiClient;
use roster_harvest::driver::{InteractiveDriver, InteractiveSettings, PaginatedDriver};
use roster_harvest::run::{self, EXPECTED_MIN_PLAYERS};
use roster_harvest::{DriverKind, OutputFiles};

#[derive(Parser)]
#[command(
    name = "roster-harvest",
    about = "Harvest the BCCI.tv player roster into JSON, CSV and a text list"
)]
struct Cli {
    /// Source to harvest from
    #[arg(long, value_enum, default_value_t = DriverKind::Interactive)]
    driver: DriverKind,

    /// Listing page for the interactive driver
    #[arg(long)]
    listing_url: Option<String>,

    /// Players JSON endpoint for the api driver
    #[arg(long)]
    api_url: Option<String>,

    /// Directory for the output files
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Load-more attempt ceiling
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Page ceiling for the api driver
    #[arg(long)]
    max_pages: Option<u32>,

    /// Show the browser window
    #[arg(long)]
    headed: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn apply(&self, config: &mut HarvestConfig) {
        if let Some(ref url) = self.listing_url {
            config.listing_url = url.clone();
        }
        if let Some(ref url) = self.api_url {
            config.api_url = Some(url.clone());
        }
        if let Some(ref dir) = self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(n) = self.max_attempts {
            config.max_attempts = n;
        }
        if let Some(n) = self.max_pages {
            config.max_pages = n;
        }
        if self.headed {
            config.headless = false;
        }
    }
}

fn init_tracing(json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("roster_harvest=info,browser_client=info,player_api_client=info"))?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.json)?;

    info!("Roster harvest starting...");

    let mut config = HarvestConfig::from_env()?;
    cli.apply(&mut config);
    config.log_summary();

    let files = OutputFiles::in_dir(&config.output_dir);

    let run = match cli.driver {
        DriverKind::Interactive => {
            let options = LaunchOptions {
                headless: config.headless,
                chrome_bin: config.chrome_bin.clone(),
            };
            let session = BrowserSession::launch(&options)
                .await
                .context("Failed to start browser session")?;
            let mut driver = InteractiveDriver::new(session, InteractiveSettings::from_config(&config));
            run::run(&mut driver, config.base_url.clone(), &files).await
        }
        DriverKind::Api => {
            let client = PlayerApiClient::new(config.require_api_url()?, config.http_timeout)
                .context("Failed to build HTTP client")?;
            let mut driver = PaginatedDriver::new(client, config.max_pages);
            run::run(&mut driver, config.base_url.clone(), &files).await
        }
    };

    println!("{}", run.stats);
    if run.records.is_empty() {
        println!("No players were found.");
    } else {
        print!("{}", run.preview(10));
    }

    for write in run.report.failed() {
        if let Err(ref e) = write.result {
            warn!(format = %write.format, error = %e, "Output not written");
        }
    }

    if !run.records.is_empty() && run.below_expected() {
        warn!(
            found = run.records.len(),
            expected = EXPECTED_MIN_PLAYERS,
            "Fewer players than expected; the load-more control may use a different selector"
        );
    }

    Ok(())
}
