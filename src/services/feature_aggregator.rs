use std::collections::HashMap;

use crate::error::{FeatureError, Result};
use crate::models::{FeatureTable, Match, MatchRatingSnapshot, RatingTable};
use crate::utils::{mean, median, pair_key, ratio};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statistic {
    Mean,
    Median,
}

impl Statistic {
    fn apply(self, values: &[f64]) -> f64 {
        match self {
            Statistic::Mean => mean(values),
            Statistic::Median => median(values),
        }
    }
}

/// How a feature column is derived from columns already in the table
#[derive(Debug, Clone, Copy)]
pub enum Derivation {
    Sum(&'static str, &'static str),
    Difference(&'static str, &'static str),
    Ratio(&'static str, &'static str),
    Group {
        key: &'static str,
        column: &'static str,
        statistic: Statistic,
    },
}

use Derivation::{Difference, Group, Ratio, Sum};
use Statistic::{Mean, Median};

const fn group(key: &'static str, column: &'static str, statistic: Statistic) -> Derivation {
    Group { key, column, statistic }
}

/// Feature columns in output order. Each entry may only reference columns
/// defined by the base table or by an earlier entry.
pub const FEATURES: &[(&str, Derivation)] = &[
    ("Total", Sum("FTHG", "FTAG")),
    ("DifferenceGoals", Difference("FTHG", "FTAG")),
    ("DifferenceELO", Difference("HomeTeamELO", "AwayTeamELO")),
    ("HomeTeamAverageGoals", group("HomeTeam", "FTHG", Mean)),
    ("AwayTeamAverageGoals", group("AwayTeam", "FTAG", Mean)),
    ("HomeTeamMedianGoals", group("HomeTeam", "FTHG", Median)),
    ("AwayTeamMedianGoals", group("AwayTeam", "FTAG", Median)),
    ("DifferenceAverageGoalsHomeAway", Difference("HomeTeamAverageGoals", "AwayTeamAverageGoals")),
    ("DifferenceMedianGoalsHomeAway", Difference("HomeTeamMedianGoals", "AwayTeamMedianGoals")),
    ("DifferenceAverageGoalsByMatch", group("MatchTeams", "DifferenceGoals", Mean)),
    ("DifferenceMedianGoalsByMatch", group("MatchTeams", "DifferenceGoals", Median)),
    ("HomeTeamProportionShotsOnTarget", Ratio("HST", "HS")),
    ("AwayTeamProportionShotsOnTarget", Ratio("AST", "AS")),
    (
        "DifferenceProportionShotsOnTarget",
        Difference("HomeTeamProportionShotsOnTarget", "AwayTeamProportionShotsOnTarget"),
    ),
    ("HomeTeamAverageProportionShotsOnTarget", group("HomeTeam", "HomeTeamProportionShotsOnTarget", Mean)),
    ("AwayTeamAverageProportionShotsOnTarget", group("AwayTeam", "AwayTeamProportionShotsOnTarget", Mean)),
    ("HomeTeamMedianProportionShotsOnTarget", group("HomeTeam", "HomeTeamProportionShotsOnTarget", Median)),
    ("AwayTeamMedianProportionShotsOnTarget", group("AwayTeam", "AwayTeamProportionShotsOnTarget", Median)),
    (
        "DifferenceAverageProportionShotsOnTargetHomeAway",
        Difference("HomeTeamAverageProportionShotsOnTarget", "AwayTeamAverageProportionShotsOnTarget"),
    ),
    (
        "DifferenceMedianProportionShotsOnTargetHomeAway",
        Difference("HomeTeamMedianProportionShotsOnTarget", "AwayTeamMedianProportionShotsOnTarget"),
    ),
    (
        "DifferenceAverageProportionShotsOnTargetByMatch",
        group("MatchTeams", "DifferenceProportionShotsOnTarget", Mean),
    ),
    (
        "DifferenceMedianProportionShotsOnTargetByMatch",
        group("MatchTeams", "DifferenceProportionShotsOnTarget", Median),
    ),
    ("HomeTeamAverageShotsOnTarget", group("HomeTeam", "HST", Mean)),
    ("AwayTeamAverageShotsOnTarget", group("AwayTeam", "AST", Mean)),
    ("HomeTeamMedianShotsOnTarget", group("HomeTeam", "HST", Median)),
    ("AwayTeamMedianShotsOnTarget", group("AwayTeam", "AST", Median)),
    (
        "DifferenceAverageShotsOnTargetHomeAway",
        Difference("HomeTeamAverageShotsOnTarget", "AwayTeamAverageShotsOnTarget"),
    ),
    (
        "DifferenceMedianShotsOnTargetHomeAway",
        Difference("HomeTeamMedianShotsOnTarget", "AwayTeamMedianShotsOnTarget"),
    ),
    ("DifferenceShotsOnTarget", Difference("HST", "AST")),
    ("HomeTeamAverageShotsOnTargetByMatch", group("MatchTeams", "HST", Mean)),
    ("AwayTeamAverageShotsOnTargetByMatch", group("MatchTeams", "AST", Mean)),
    ("HomeTeamMedianShotsOnTargetByMatch", group("MatchTeams", "HST", Median)),
    ("AwayTeamMedianShotsOnTargetByMatch", group("MatchTeams", "AST", Median)),
    ("DifferenceAverageShotsOnTargetByMatch", group("MatchTeams", "DifferenceShotsOnTarget", Mean)),
    ("DifferenceMedianShotsOnTargetByMatch", group("MatchTeams", "DifferenceShotsOnTarget", Median)),
];

/// Joins rating snapshots onto the match table and derives the feature
/// columns. Nothing here depends on row order.
pub struct FeatureAggregator;

impl FeatureAggregator {
    /// Base table: key columns, raw numeric columns and the rating join.
    pub fn base_table(
        matches: &[Match],
        snapshots: &[MatchRatingSnapshot],
        final_ratings: &RatingTable,
    ) -> Result<FeatureTable> {
        if matches.len() != snapshots.len() {
            return Err(FeatureError::LengthMismatch {
                what: "rating snapshots".to_string(),
                expected: matches.len(),
                found: snapshots.len(),
            });
        }

        let mut table = FeatureTable::new(matches.len());
        let strings = |f: fn(&Match) -> String| matches.iter().map(f).collect::<Vec<_>>();
        let numbers = |f: fn(&Match) -> Option<f64>| {
            matches.iter().map(|m| f(m).unwrap_or(f64::NAN)).collect::<Vec<_>>()
        };

        table.insert_key("Date", strings(|m| m.date.format("%Y-%m-%d").to_string()))?;
        table.insert_key("HomeTeam", strings(|m| m.home_team.clone()))?;
        table.insert_key("AwayTeam", strings(|m| m.away_team.clone()))?;
        table.insert_key("MatchTeams", strings(|m| pair_key(&m.home_team, &m.away_team)))?;

        table.insert_column("FTHG", numbers(|m| m.home_goals))?;
        table.insert_column("FTAG", numbers(|m| m.away_goals))?;
        table.insert_column("HS", numbers(|m| m.shots.home_shots))?;
        table.insert_column("AS", numbers(|m| m.shots.away_shots))?;
        table.insert_column("HST", numbers(|m| m.shots.home_shots_on_target))?;
        table.insert_column("AST", numbers(|m| m.shots.away_shots_on_target))?;

        table.insert_column("HomeTeamELO", snapshots.iter().map(|s| s.home_rating).collect())?;
        table.insert_column("AwayTeamELO", snapshots.iter().map(|s| s.away_rating).collect())?;
        table.insert_column(
            "HomeTeamFinalELO",
            matches
                .iter()
                .map(|m| final_ratings.get(&m.home_team).unwrap_or(f64::NAN))
                .collect(),
        )?;
        table.insert_column(
            "AwayTeamFinalELO",
            matches
                .iter()
                .map(|m| final_ratings.get(&m.away_team).unwrap_or(f64::NAN))
                .collect(),
        )?;

        Ok(table)
    }

    /// Full feature table: the base table plus every entry of [`FEATURES`].
    pub fn build(
        matches: &[Match],
        snapshots: &[MatchRatingSnapshot],
        final_ratings: &RatingTable,
    ) -> Result<FeatureTable> {
        let mut table = Self::base_table(matches, snapshots, final_ratings)?;
        Self::derive_all(&mut table, FEATURES)?;
        tracing::info!(
            "Built feature table: {} rows x {} columns",
            table.rows(),
            table.columns().len()
        );
        Ok(table)
    }

    pub fn derive_all(table: &mut FeatureTable, features: &[(&str, Derivation)]) -> Result<()> {
        for (name, derivation) in features {
            let values = Self::derive(table, *derivation)?;
            table.insert_column(name, values)?;
        }
        Ok(())
    }

    pub fn derive(table: &FeatureTable, derivation: Derivation) -> Result<Vec<f64>> {
        match derivation {
            Sum(a, b) => Self::pairwise(table, a, b, |x, y| x + y),
            Difference(a, b) => Self::pairwise(table, a, b, |x, y| x - y),
            Ratio(a, b) => Self::pairwise(table, a, b, ratio),
            Group { key, column, statistic } => Self::group_transform(table, key, column, statistic),
        }
    }

    /// Per-row value of `statistic` over `column` within the row's group.
    pub fn group_transform(
        table: &FeatureTable,
        key: &str,
        column: &str,
        statistic: Statistic,
    ) -> Result<Vec<f64>> {
        let keys = table.key(key)?;
        let values = table.column(column)?;

        let mut groups: HashMap<&str, Vec<f64>> = HashMap::new();
        for (k, v) in keys.iter().zip(values) {
            groups.entry(k.as_str()).or_default().push(*v);
        }

        let stats: HashMap<&str, f64> = groups
            .into_iter()
            .map(|(k, vs)| (k, statistic.apply(&vs)))
            .collect();

        Ok(keys
            .iter()
            .map(|k| stats.get(k.as_str()).copied().unwrap_or(f64::NAN))
            .collect())
    }

    fn pairwise(table: &FeatureTable, a: &str, b: &str, op: impl Fn(f64, f64) -> f64) -> Result<Vec<f64>> {
        let left = table.column(a)?;
        let right = table.column(b)?;
        Ok(left.iter().zip(right).map(|(x, y)| op(*x, *y)).collect())
    }
}
