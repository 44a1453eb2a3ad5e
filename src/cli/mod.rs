use std::path::Path;

use anyhow::{Context, Result};

use crate::config::EloConfig;
use crate::models::{Match, MatchRatingSnapshot};
use crate::services::{export_table, EloCalculator, ExportFormat, FeatureAggregator, MatchLoader};
use crate::utils::{calculate_win_percentage, results_to_form};

/// Load, sort and rate every match in `input`.
async fn rate_matches(
    input: &Path,
    strict: bool,
    config: EloConfig,
) -> Result<(Vec<Match>, Vec<MatchRatingSnapshot>, EloCalculator)> {
    let loader = MatchLoader::new(strict);
    let (matches, report) = loader
        .load_path(input)
        .await
        .with_context(|| format!("Failed to load matches from {}", input.display()))?;

    println!(
        "📥 Loaded {} matches ({} rows read, {} malformed, {} duplicates dropped)",
        report.kept(),
        report.rows_read,
        report.dropped_malformed,
        report.dropped_duplicates
    );

    let mut elo = EloCalculator::new(config);
    let snapshots = elo
        .process(&matches)
        .context("Rating pass aborted; no ratings were produced")?;

    Ok((matches, snapshots, elo))
}

pub async fn build_features(
    input: &Path,
    output: &Path,
    format: &str,
    strict: bool,
    config: EloConfig,
) -> Result<()> {
    let format: ExportFormat = format.parse()?;
    let (matches, snapshots, elo) = rate_matches(input, strict, config).await?;

    println!("🧮 Building feature table...");
    let table = FeatureAggregator::build(&matches, &snapshots, elo.ratings())?;

    export_table(&table, output, format)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "✅ Wrote {} rows x {} columns to {}",
        table.rows(),
        table.columns().len(),
        output.display()
    );

    Ok(())
}

pub async fn show_ratings(input: &Path, top: Option<usize>, strict: bool, config: EloConfig) -> Result<()> {
    let (matches, _, elo) = rate_matches(input, strict, config).await?;

    let standings = elo.standings();
    if standings.is_empty() {
        println!("📭 No matches to rate.");
        return Ok(());
    }

    let last_date = matches.last().map(|m| m.date.format("%Y-%m-%d").to_string());
    println!(
        "\n🏆 ELO ratings as of {} (K = {}, initial = {}):\n",
        last_date.unwrap_or_default(),
        elo.config().k_factor,
        elo.config().initial_rating
    );

    let limit = top.unwrap_or(standings.len());
    for (i, (team, rating)) in standings.iter().take(limit).enumerate() {
        println!("{:>3}. {:<28} {:>8.1}", i + 1, team, rating);
    }

    if limit < standings.len() {
        println!("\n   ... {} more teams", standings.len() - limit);
    }

    Ok(())
}

pub async fn query_team(
    input: &Path,
    team_name: &str,
    against: Option<&str>,
    strict: bool,
    config: EloConfig,
) -> Result<()> {
    let (matches, snapshots, elo) = rate_matches(input, strict, config).await?;

    println!("🔍 Searching for team: {}", team_name);

    let team = match resolve_team(&elo, team_name) {
        Some(team) => team,
        None => {
            println!("❌ No team found matching '{}'", team_name);
            let suggestions = suggest_teams(&elo, team_name, 5);
            if !suggestions.is_empty() {
                println!("\n💡 Did you mean:");
                for name in suggestions {
                    println!("   • {}", name);
                }
            }
            return Ok(());
        }
    };

    let history = elo.rating_history(&team, &matches, &snapshots)?;
    let results: Vec<char> = history.iter().map(|point| point.result).collect();
    let wins = results.iter().filter(|r| **r == 'W').count() as u32;
    let draws = results.iter().filter(|r| **r == 'D').count() as u32;
    let losses = results.iter().filter(|r| **r == 'L').count() as u32;

    println!("📊 Team Details:");
    println!("   Name: {}", team);
    println!("   ELO Rating: {:.1}", elo.ratings().rating_or_initial(&team));
    println!("   Played: {} (W{} D{} L{})", history.len(), wins, draws, losses);
    println!("   Points won: {:.1}%", calculate_win_percentage(wins, draws, losses));
    println!("   Form: {}", results_to_form(&results, 5));

    if let Some(opponent) = against {
        match resolve_team(&elo, opponent) {
            Some(opponent) => println!(
                "   Expected score at home vs {}: {:.1}%",
                opponent,
                elo.win_probability(&team, &opponent) * 100.0
            ),
            None => println!("   ⚠️  Unknown opponent '{}'", opponent),
        }
    }

    println!("\n📅 Recent Matches:");
    if history.is_empty() {
        println!("   No matches found");
    }
    for point in history.iter().rev().take(5) {
        let venue = if point.is_home { "vs" } else { "at" };
        println!(
            "   {} {} {} ({}-{}) {}  {:.1} -> {:.1}",
            point.date.format("%Y-%m-%d"),
            venue,
            point.opponent,
            point.goals_for,
            point.goals_against,
            point.result,
            point.rating_before,
            point.rating_after
        );
    }

    Ok(())
}

/// Exact name first, then a case-insensitive match
fn resolve_team(elo: &EloCalculator, name: &str) -> Option<String> {
    let ratings = elo.ratings();
    if ratings.contains(name) {
        return Some(name.to_string());
    }
    let lowered = name.to_lowercase();
    ratings
        .teams()
        .find(|team| team.to_lowercase() == lowered)
        .map(str::to_string)
}

/// Closest known team names by Jaro-Winkler similarity
fn suggest_teams(elo: &EloCalculator, name: &str, limit: usize) -> Vec<String> {
    let lowered = name.to_lowercase();
    let mut scored: Vec<(f64, &str)> = elo
        .ratings()
        .teams()
        .map(|team| (strsim::jaro_winkler(&lowered, &team.to_lowercase()), team))
        .filter(|(score, _)| *score >= 0.7)
        .collect();
    scored.sort_by(|a, b| {
        b.0.partial_cmp(&a.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.1.cmp(b.1))
    });
    scored.into_iter().take(limit).map(|(_, team)| team.to_string()).collect()
}
