use anyhow::Context;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::process;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "config/trends.toml";

fn config_arg() -> Arg {
    Arg::new("config")
        .short('c')
        .long("config")
        .value_name("FILE")
        .help("Sets a custom config file")
}

fn config_path(matches: &ArgMatches) -> &str {
    matches
        .get_one::<String>("config")
        .map(|s| s.as_str())
        .unwrap_or(DEFAULT_CONFIG)
}

async fn run(matches: ArgMatches) -> anyhow::Result<()> {
    match matches.subcommand() {
        Some(("collect", collect_matches)) => {
            let path = config_path(collect_matches);
            let json = collect_matches.get_flag("json");
            trends::run_trends_pipeline(path, json)
                .await
                .with_context(|| format!("trends pipeline failed (config: {})", path))
        }
        Some(("queries", queries_matches)) => {
            let path = config_path(queries_matches);
            trends::print_query_catalog(path)
                .with_context(|| format!("failed to build query catalog (config: {})", path))
        }
        Some(("regions", regions_matches)) => {
            let path = config_path(regions_matches);
            let country = regions_matches
                .get_one::<String>("country")
                .context("missing --country")?;
            let limit = *regions_matches.get_one::<usize>("limit").unwrap_or(&10);
            trends::run_region_lookup(path, country, limit)
                .await
                .with_context(|| format!("region lookup failed for {}", country))
        }
        _ => anyhow::bail!("Please specify a valid subcommand"),
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let matches = Command::new("VPN Location Demand")
        .version("1.0")
        .about("Collects search interest per country and ranks server locations")
        .subcommand(
            Command::new("collect")
                .about("Run the collection and analysis pass")
                .arg(config_arg())
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the analysis as JSON"),
                ),
        )
        .subcommand(
            Command::new("queries")
                .about("Print the generated query catalog")
                .arg(config_arg()),
        )
        .subcommand(
            Command::new("regions")
                .about("Show the regions with the most interest for one country")
                .arg(config_arg())
                .arg(
                    Arg::new("country")
                        .long("country")
                        .value_name("NAME")
                        .required(true),
                )
                .arg(
                    Arg::new("limit")
                        .long("limit")
                        .value_name("N")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("10"),
                ),
        )
        .get_matches();

    if let Err(e) = run(matches).await {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}
