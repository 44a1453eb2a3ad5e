use crate::config::EloConfig;
use crate::error::{FeatureError, Result};
use crate::models::{Match, MatchRatingSnapshot, Outcome, RatingHistoryPoint, RatingTable};

/// Sequential ELO engine.
///
/// Matches must be fed in chronological order; the engine does not re-sort.
/// Out-of-order input produces well-defined but meaningless ratings.
pub struct EloCalculator {
    config: EloConfig,
    ratings: RatingTable,
}

impl Default for EloCalculator {
    fn default() -> Self {
        Self::new(EloConfig::default())
    }
}

impl EloCalculator {
    pub fn new(config: EloConfig) -> Self {
        Self {
            config,
            ratings: RatingTable::new(config.initial_rating),
        }
    }

    pub fn config(&self) -> &EloConfig {
        &self.config
    }

    /// Calculate expected score based on ELO ratings
    pub fn expected_score(rating_a: f64, rating_b: f64) -> f64 {
        1.0 / (1.0 + 10f64.powf((rating_b - rating_a) / 400.0))
    }

    /// K-scaled rating change for one side
    pub fn rating_change(&self, expected: f64, actual: f64) -> f64 {
        self.config.k_factor * (actual - expected)
    }

    /// New (home, away) ratings after a result. Both sides are computed
    /// from the pre-match ratings.
    pub fn update_ratings(&self, home_rating: f64, away_rating: f64, outcome: Outcome) -> (f64, f64) {
        let expected_home = Self::expected_score(home_rating, away_rating);
        let expected_away = Self::expected_score(away_rating, home_rating);
        let (actual_home, actual_away) = outcome.actual_scores();

        (
            home_rating + self.rating_change(expected_home, actual_home),
            away_rating + self.rating_change(expected_away, actual_away),
        )
    }

    /// Run one full pass over `matches` and return the pre-match snapshot of
    /// every match, in input order.
    ///
    /// The pass is all-or-nothing: it works on a copy of the rating table and
    /// only commits it once every match has been applied. An invalid score
    /// aborts the pass and leaves the current table untouched.
    pub fn process(&mut self, matches: &[Match]) -> Result<Vec<MatchRatingSnapshot>> {
        let mut table = self.ratings.clone();
        let mut snapshots = Vec::with_capacity(matches.len());

        for (index, match_data) in matches.iter().enumerate() {
            let (home_goals, away_goals) = validated_scores(index, match_data)?;

            if match_data.home_team == match_data.away_team {
                tracing::warn!(
                    "Match #{} on {} lists {} on both sides",
                    index,
                    match_data.date,
                    match_data.home_team
                );
            }

            let home_rating = table.get_or_seed(&match_data.home_team);
            let away_rating = table.get_or_seed(&match_data.away_team);

            snapshots.push(MatchRatingSnapshot {
                index,
                home_team: match_data.home_team.clone(),
                away_team: match_data.away_team.clone(),
                home_rating,
                away_rating,
            });

            let outcome = Outcome::from_scores(home_goals, away_goals);
            let (new_home_rating, new_away_rating) =
                self.update_ratings(home_rating, away_rating, outcome);

            table.set(&match_data.home_team, new_home_rating);
            table.set(&match_data.away_team, new_away_rating);

            tracing::debug!(
                "{} {} {}-{} {}: {} ({:.1} -> {:.1}), {} ({:.1} -> {:.1})",
                match_data.date,
                match_data.home_team,
                home_goals,
                away_goals,
                match_data.away_team,
                match_data.home_team,
                home_rating,
                new_home_rating,
                match_data.away_team,
                away_rating,
                new_away_rating
            );
        }

        self.ratings = table;
        tracing::info!(
            "Rated {} matches across {} teams",
            snapshots.len(),
            self.ratings.len()
        );

        Ok(snapshots)
    }

    /// Current ratings (end-of-data after a successful pass)
    pub fn ratings(&self) -> &RatingTable {
        &self.ratings
    }

    /// Final standings, strongest first
    pub fn standings(&self) -> Vec<(String, f64)> {
        self.ratings.sorted()
    }

    /// Probability-like expected score of `home` against `away` given the
    /// current table. Unknown teams are treated as newly seeded.
    pub fn win_probability(&self, home: &str, away: &str) -> f64 {
        Self::expected_score(
            self.ratings.rating_or_initial(home),
            self.ratings.rating_or_initial(away),
        )
    }

    /// Chronological rating trajectory of one team, rebuilt from the
    /// snapshots of a pass over `matches`.
    pub fn rating_history(
        &self,
        team: &str,
        matches: &[Match],
        snapshots: &[MatchRatingSnapshot],
    ) -> Result<Vec<RatingHistoryPoint>> {
        let mut history = Vec::new();

        for snapshot in snapshots {
            let match_data = matches.get(snapshot.index).ok_or_else(|| FeatureError::LengthMismatch {
                what: format!("snapshot #{} match rows", snapshot.index),
                expected: snapshot.index + 1,
                found: matches.len(),
            })?;
            if !match_data.involves(team) {
                continue;
            }

            let (home_goals, away_goals) = validated_scores(snapshot.index, match_data)?;
            let outcome = Outcome::from_scores(home_goals, away_goals);
            let (new_home, new_away) =
                self.update_ratings(snapshot.home_rating, snapshot.away_rating, outcome);

            let is_home = match_data.home_team == team;
            let (goals_for, goals_against, before, after) = if is_home {
                (home_goals, away_goals, snapshot.home_rating, new_home)
            } else {
                (away_goals, home_goals, snapshot.away_rating, new_away)
            };

            history.push(RatingHistoryPoint {
                date: match_data.date,
                opponent: match_data.opponent(team).unwrap_or_default().to_string(),
                is_home,
                goals_for,
                goals_against,
                result: outcome.form_code(is_home),
                rating_before: before,
                rating_after: after,
            });
        }

        Ok(history)
    }
}

/// Scores must be present, finite, non-negative whole numbers.
fn validated_scores(index: usize, match_data: &Match) -> Result<(u32, u32)> {
    let home = validated_score(index, match_data, "home", match_data.home_goals)?;
    let away = validated_score(index, match_data, "away", match_data.away_goals)?;
    Ok((home, away))
}

fn validated_score(index: usize, match_data: &Match, side: &str, score: Option<f64>) -> Result<u32> {
    let invalid = |reason: String| FeatureError::InvalidMatch {
        index,
        home_team: match_data.home_team.clone(),
        away_team: match_data.away_team.clone(),
        reason,
    };

    let value = score.ok_or_else(|| invalid(format!("{} score is missing", side)))?;
    if !value.is_finite() {
        return Err(invalid(format!("{} score is not finite ({})", side, value)));
    }
    if value < 0.0 || value.fract() != 0.0 || value > u32::MAX as f64 {
        return Err(invalid(format!(
            "{} score {} is not a non-negative integer",
            side, value
        )));
    }
    Ok(value as u32)
}
