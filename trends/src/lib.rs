pub mod analysis;
pub mod catalog;
pub mod client;
pub mod collector;
pub mod fetcher;
pub mod models;
pub mod report;
pub mod table;
pub mod utils;

use common::config::Settings;
use common::{Error, Result};
use tracing::info;

use catalog::Catalog;
use client::{GoogleTrendsClient, choose_identity};
use collector::BatchCollector;
use fetcher::{FetchOptions, ResilientFetcher};
use models::Timeframe;
use utils::TokioSleeper;

fn build_fetcher(settings: &Settings) -> Result<ResilientFetcher<GoogleTrendsClient, TokioSleeper>> {
    let identity = choose_identity(None);
    let client = GoogleTrendsClient::new(&settings.trends, &identity)?;
    info!(identity = %identity, geo = %settings.trends.geo, "Trends client ready");
    Ok(ResilientFetcher::new(
        client,
        identity,
        TokioSleeper,
        FetchOptions::from_settings(settings),
    ))
}

/// Runs one collection pass over every configured country and prints the analysis
pub async fn run_trends_pipeline(config_path: &str, json: bool) -> Result<()> {
    let settings = Settings::new(config_path)?;

    let catalog = Catalog::from_countries(&settings.countries);
    info!(
        countries = catalog.len(),
        phrases = catalog.total_phrases(),
        "Generated query catalog"
    );

    let mut collector = BatchCollector::new(build_fetcher(&settings)?);
    let collection = collector.collect_all(&catalog).await;

    let (valid, unfetchable) = collection.into_partition();
    let bundle = analysis::analyze_all_countries(&valid);
    info!(countries = bundle.countries.len(), "Analyzed countries with valid data");

    if json {
        report::print_json(&bundle, &unfetchable)
    } else {
        report::print_report(&bundle, &unfetchable);
        Ok(())
    }
}

/// Prints the generated query catalog without contacting the upstream.
pub fn print_query_catalog(config_path: &str) -> Result<()> {
    let settings = Settings::new(config_path)?;
    report::print_catalog(&Catalog::from_countries(&settings.countries));
    Ok(())
}

/// Prints the regions with the highest interest for one country's phrases over 3 months.
pub async fn run_region_lookup(config_path: &str, country: &str, limit: usize) -> Result<()> {
    let settings = Settings::new(config_path)?;
    let catalog = Catalog::from_countries(&settings.countries);
    let phrases = catalog
        .phrases_for(country)
        .ok_or_else(|| Error::InvalidInput(format!("country {} is not configured", country)))?
        .to_vec();

    let mut fetcher = build_fetcher(&settings)?;
    let Some(regions) = fetcher.regional_interest(&phrases, Timeframe::ThreeMonths).await else {
        println!("No regional data for {}", country);
        return Ok(());
    };

    for phrase in phrases.iter().take(client::MAX_PHRASES_PER_REQUEST) {
        println!("\n{}:", phrase);
        for (region, interest) in table::top_regions(&regions, phrase, limit)? {
            println!("  {:<30} {:.0}", region, interest);
        }
    }
    Ok(())
}
