
use common::Result;
use serde::Serialize;

use crate::analysis::{AnalyzedBundle, RankingEntry, Trend};
use crate::catalog::Catalog;
use crate::models::Timeframe;

const WIDTH: usize = 80;
const CRITICAL_INTEREST: f64 = 50.0;

fn banner(title: &str) {
    println!("\n{}", "=".repeat(WIDTH));
    println!("{}", title);
    println!("{}", "=".repeat(WIDTH));
}

fn separator() {
    println!("{}", "-".repeat(WIDTH));
}

/// Arrow marker for a 1-month vs 3-month change.
pub fn trend_marker(change_percent: f64) -> &'static str {
    if change_percent > 5.0 {
        "↑↑↑"
    } else if change_percent > 0.0 {
        "↑↑"
    } else if change_percent < -5.0 {
        "↓↓↓"
    } else if change_percent < 0.0 {
        "↓↓"
    } else {
        "→"
    }
}

pub fn print_catalog(catalog: &Catalog) {
    banner("QUERY CATALOG");
    for entry in catalog.iter() {
        println!("{} ({} phrases)", entry.country, entry.phrases.len());
        for phrase in &entry.phrases {
            println!("  - {}", phrase);
        }
    }
    println!(
        "\n{} countries, {} phrase variations",
        catalog.len(),
        catalog.total_phrases()
    );
}

pub fn print_report(bundle: &AnalyzedBundle, unfetchable: &[String]) {
    print_unfetchable(unfetchable);
    print_top_countries(bundle);
    print_period_comparison(bundle);
    print_trends("COUNTRIES WITH RISING DEMAND (↑)", &bundle.rising_countries(10));
    print_trends("COUNTRIES WITH FALLING DEMAND (↓)", &bundle.falling_countries(10));

    for entry in bundle.top_countries(Timeframe::ThreeMonths, 3) {
        print_country_details(bundle, &entry.country, Timeframe::ThreeMonths);
    }

    print_recommendations(bundle);
    println!(
        "\nAnalysis time: {}",
        bundle.generated_at.format("%Y-%m-%d %H:%M:%S")
    );
}

fn print_unfetchable(unfetchable: &[String]) {
    if unfetchable.is_empty() {
        return;
    }
    println!("\nNo data could be collected for:");
    for country in unfetchable {
        println!("    • {}", country);
    }
}

fn print_top_countries(bundle: &AnalyzedBundle) {
    banner("TOP 20 COUNTRIES BY DEMAND (3 months)");
    println!("{:<4} {:<30} {:<10} {}", "#", "Country", "Queries", "Interest");
    separator();

    for (idx, entry) in bundle.top_countries(Timeframe::ThreeMonths, 20).iter().enumerate() {
        println!(
            "{:<4} {:<30} {:<10} {:.2}",
            idx + 1,
            entry.country,
            bundle.query_count(&entry.country),
            entry.interest
        );
    }
}

fn print_period_comparison(bundle: &AnalyzedBundle) {
    banner("PERIOD COMPARISON: 1 month vs 3 months");
    println!(
        "{:<30} {:<12} {:<12} {:<12} {}",
        "Country", "1 month", "3 months", "Change", "Trend"
    );
    separator();

    let one_month = bundle.ranking(Timeframe::OneMonth);
    for entry in bundle.top_countries(Timeframe::ThreeMonths, 10) {
        let interest_1m = interest_of(one_month, &entry.country);
        if entry.interest <= 0.0 || interest_1m <= 0.0 {
            continue;
        }
        let change = crate::analysis::change_percent(interest_1m, entry.interest);
        println!(
            "{:<30} {:<12.2} {:<12.2} {:<12} {}",
            entry.country,
            interest_1m,
            entry.interest,
            format!("{:+.1}%", change),
            trend_marker(change)
        );
    }
}

fn print_trends(title: &str, trends: &[&Trend]) {
    banner(title);
    if trends.is_empty() {
        println!("No data");
        return;
    }
    println!("{:<30} {:<12} {:<12} {}", "Country", "1 month", "3 months", "Change");
    separator();
    for trend in trends {
        println!(
            "{:<30} {:<12.2} {:<12.2} {:+.1}%",
            trend.country, trend.interest_1m, trend.interest_3m, trend.change_percent
        );
    }
}

fn print_country_details(bundle: &AnalyzedBundle, country: &str, timeframe: Timeframe) {
    banner(&format!("COUNTRY DETAILS: {} ({})", country.to_uppercase(), timeframe));

    let Some(queries) = bundle.all_queries_interest_for(country, timeframe) else {
        println!("No data for {}", country);
        return;
    };

    let positive: Vec<_> = queries.iter().filter(|q| q.interest > 0.0).take(8).collect();
    if positive.is_empty() {
        println!("\nNo queries with non-zero interest");
    } else {
        println!("\nTOP QUERIES:");
        for (idx, query) in positive.iter().enumerate() {
            println!("  {}. {:<30} - {:.2}", idx + 1, query.query, query.interest);
        }
    }

    if let Some(related) = bundle.related_queries_for(country, timeframe, 5) {
        if !related.top.is_empty() || !related.rising.is_empty() {
            println!("\nRELATED QUERIES:");
            if !related.top.is_empty() {
                println!("  Top:");
                for query in &related.top {
                    println!("    • {}", query.query);
                }
            }
            if !related.rising.is_empty() {
                println!("  Rising:");
                for query in &related.rising {
                    println!("    • {}", query.query);
                }
            }
        }
    }
}

fn print_recommendations(bundle: &AnalyzedBundle) {
    banner("SERVER LOCATION PRIORITIES");

    let top = bundle.top_countries(Timeframe::ThreeMonths, 20);
    let mut critical: Vec<(&str, f64, f64)> = bundle
        .rising_countries(10)
        .into_iter()
        .map(|trend| (trend.country.as_str(), interest_of(top, &trend.country), trend.change_percent))
        .filter(|(_, interest, _)| *interest > CRITICAL_INTEREST)
        .collect();
    critical.sort_by(|a, b| b.1.total_cmp(&a.1));

    println!("\nCRITICAL (high demand and growing):");
    if critical.is_empty() {
        println!("  None");
    }
    for (country, interest, change) in &critical {
        println!("  • {:<30} (demand: {:.2}, growth: {:+.1}%)", country, interest, change);
    }

    println!("\nHIGH (high demand):");
    for entry in top.iter().take(10) {
        if critical.iter().any(|(country, _, _)| *country == entry.country) {
            continue;
        }
        println!("  • {:<30} (demand: {:.2})", entry.country, entry.interest);
    }

    println!("\nMEDIUM:");
    for entry in top.iter().skip(10) {
        println!("  • {:<30} (demand: {:.2})", entry.country, entry.interest);
    }
}

fn interest_of(ranking: &[RankingEntry], country: &str) -> f64 {
    ranking
        .iter()
        .find(|entry| entry.country == country)
        .map(|entry| entry.interest)
        .unwrap_or(0.0)
}

#[derive(Serialize)]
struct JsonReport<'a> {
    #[serde(flatten)]
    bundle: &'a AnalyzedBundle,
    unfetchable: &'a [String],
}

pub fn print_json(bundle: &AnalyzedBundle, unfetchable: &[String]) -> Result<()> {
    let report = JsonReport { bundle, unfetchable };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trend_markers() {
        assert_eq!(trend_marker(12.0), "↑↑↑");
        assert_eq!(trend_marker(3.0), "↑↑");
        assert_eq!(trend_marker(0.0), "→");
        assert_eq!(trend_marker(-2.5), "↓↓");
        assert_eq!(trend_marker(-40.0), "↓↓↓");
    }
}
