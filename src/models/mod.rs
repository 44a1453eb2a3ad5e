use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{FeatureError, Result};

/// Shot counts that come with a match row, when the source file has them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ShotStats {
    pub home_shots: Option<f64>,
    pub away_shots: Option<f64>,
    pub home_shots_on_target: Option<f64>,
    pub away_shots_on_target: Option<f64>,
}

/// A single historical match, as normalized by the loader.
///
/// Scores are kept exactly as they were read so the rating engine can
/// reject a missing or non-finite value instead of guessing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub date: NaiveDate,
    pub home_team: String,
    pub away_team: String,
    pub home_goals: Option<f64>,
    pub away_goals: Option<f64>,
    pub shots: ShotStats,
}

impl Match {
    #[cfg(test)]
    pub fn new(date: NaiveDate, home_team: &str, away_team: &str, home_goals: u32, away_goals: u32) -> Self {
        Self {
            date,
            home_team: home_team.to_string(),
            away_team: away_team.to_string(),
            home_goals: Some(home_goals as f64),
            away_goals: Some(away_goals as f64),
            shots: ShotStats::default(),
        }
    }

    pub fn involves(&self, team: &str) -> bool {
        self.home_team == team || self.away_team == team
    }

    pub fn opponent(&self, team: &str) -> Option<&str> {
        if team == self.home_team {
            Some(&self.away_team)
        } else if team == self.away_team {
            Some(&self.home_team)
        } else {
            None
        }
    }
}

/// Result of a match from the home side's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    HomeWin,
    AwayWin,
    Draw,
}

impl Outcome {
    pub fn from_scores(home_goals: u32, away_goals: u32) -> Self {
        match home_goals.cmp(&away_goals) {
            std::cmp::Ordering::Greater => Outcome::HomeWin,
            std::cmp::Ordering::Less => Outcome::AwayWin,
            std::cmp::Ordering::Equal => Outcome::Draw,
        }
    }

    /// Actual scores (home, away) fed into the rating update
    pub fn actual_scores(self) -> (f64, f64) {
        match self {
            Outcome::HomeWin => (1.0, 0.0),
            Outcome::AwayWin => (0.0, 1.0),
            Outcome::Draw => (0.5, 0.5),
        }
    }

    /// Single-letter form code ("W", "L", "D") for the given side
    pub fn form_code(self, is_home: bool) -> char {
        match (self, is_home) {
            (Outcome::Draw, _) => 'D',
            (Outcome::HomeWin, true) | (Outcome::AwayWin, false) => 'W',
            _ => 'L',
        }
    }
}

/// Ratings both sides held immediately before a match was applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRatingSnapshot {
    /// Position of the match in the chronological sequence
    pub index: usize,
    pub home_team: String,
    pub away_team: String,
    pub home_rating: f64,
    pub away_rating: f64,
}

/// Current rating of every entity seen so far.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingTable {
    initial_rating: f64,
    ratings: HashMap<String, f64>,
}

impl RatingTable {
    pub fn new(initial_rating: f64) -> Self {
        Self {
            initial_rating,
            ratings: HashMap::new(),
        }
    }

    /// Look up a rating, seeding it with the initial rating on first sight.
    pub fn get_or_seed(&mut self, team: &str) -> f64 {
        *self
            .ratings
            .entry(team.to_string())
            .or_insert(self.initial_rating)
    }

    pub fn get(&self, team: &str) -> Option<f64> {
        self.ratings.get(team).copied()
    }

    /// Rating for a team, or the initial rating if it has never played.
    pub fn rating_or_initial(&self, team: &str) -> f64 {
        self.get(team).unwrap_or(self.initial_rating)
    }

    pub fn set(&mut self, team: &str, rating: f64) {
        match self.ratings.get_mut(team) {
            Some(slot) => *slot = rating,
            None => {
                self.ratings.insert(team.to_string(), rating);
            }
        }
    }

    pub fn contains(&self, team: &str) -> bool {
        self.ratings.contains_key(team)
    }

    pub fn len(&self) -> usize {
        self.ratings.len()
    }

    pub fn teams(&self) -> impl Iterator<Item = &str> {
        self.ratings.keys().map(String::as_str)
    }

    /// All ratings, strongest first; ties broken by name.
    pub fn sorted(&self) -> Vec<(String, f64)> {
        let mut entries: Vec<(String, f64)> = self
            .ratings
            .iter()
            .map(|(team, rating)| (team.clone(), *rating))
            .collect();
        entries.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        entries
    }
}

/// One step of an entity's rating trajectory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingHistoryPoint {
    pub date: NaiveDate,
    pub opponent: String,
    pub is_home: bool,
    pub goals_for: u32,
    pub goals_against: u32,
    pub result: char,
    pub rating_before: f64,
    pub rating_after: f64,
}

/// Column-oriented feature table: string key columns plus numeric columns
/// in derivation order. Missing numeric values are `NaN`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureTable {
    rows: usize,
    keys: Vec<(String, Vec<String>)>,
    columns: Vec<(String, Vec<f64>)>,
}

impl FeatureTable {
    pub fn new(rows: usize) -> Self {
        Self {
            rows,
            keys: Vec::new(),
            columns: Vec::new(),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn insert_key(&mut self, name: &str, values: Vec<String>) -> Result<()> {
        self.check_len(name, values.len())?;
        match self.keys.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = values,
            None => self.keys.push((name.to_string(), values)),
        }
        Ok(())
    }

    pub fn insert_column(&mut self, name: &str, values: Vec<f64>) -> Result<()> {
        self.check_len(name, values.len())?;
        match self.columns.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = values,
            None => self.columns.push((name.to_string(), values)),
        }
        Ok(())
    }

    pub fn key(&self, name: &str) -> Result<&[String]> {
        self.keys
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
            .ok_or_else(|| FeatureError::UnknownAggregationKey(name.to_string()))
    }

    pub fn column(&self, name: &str) -> Result<&[f64]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
            .ok_or_else(|| FeatureError::UnknownColumn(name.to_string()))
    }

    pub fn key_names(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(|(n, _)| n.as_str())
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    pub fn keys(&self) -> &[(String, Vec<String>)] {
        &self.keys
    }

    pub fn columns(&self) -> &[(String, Vec<f64>)] {
        &self.columns
    }

    fn check_len(&self, name: &str, len: usize) -> Result<()> {
        if len != self.rows {
            return Err(FeatureError::LengthMismatch {
                what: format!("column '{}'", name),
                expected: self.rows,
                found: len,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_seed_inserts_once() {
        let mut table = RatingTable::new(1500.0);
        assert_eq!(table.len(), 0);
        assert_eq!(table.get_or_seed("Arsenal"), 1500.0);
        table.set("Arsenal", 1510.0);
        assert_eq!(table.get_or_seed("Arsenal"), 1510.0);
        assert_eq!(table.len(), 1);
        assert_eq!(table.rating_or_initial("Chelsea"), 1500.0);
        assert!(!table.contains("Chelsea"));
    }

    #[test]
    fn test_get_or_seed_keeps_one_entry_per_team() {
        let mut table = RatingTable::new(1400.0);
        for _ in 0..3 {
            assert_eq!(table.get_or_seed("Leeds"), 1400.0);
        }
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("Leeds"), Some(1400.0));
    }

    #[test]
    fn test_sorted_strongest_first() {
        let mut table = RatingTable::new(1500.0);
        table.set("B", 1490.0);
        table.set("A", 1520.0);
        table.set("C", 1490.0);
        let sorted = table.sorted();
        let names: Vec<&str> = sorted.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_outcome_from_scores() {
        assert_eq!(Outcome::from_scores(2, 0), Outcome::HomeWin);
        assert_eq!(Outcome::from_scores(0, 3), Outcome::AwayWin);
        assert_eq!(Outcome::from_scores(1, 1), Outcome::Draw);
        assert_eq!(Outcome::Draw.actual_scores(), (0.5, 0.5));
        assert_eq!(Outcome::HomeWin.form_code(false), 'L');
        assert_eq!(Outcome::AwayWin.form_code(false), 'W');
    }

    #[test]
    fn test_feature_table_lookup() {
        let mut table = FeatureTable::new(2);
        table
            .insert_key("HomeTeam", vec!["A".to_string(), "B".to_string()])
            .unwrap();
        table.insert_column("FTHG", vec![1.0, 2.0]).unwrap();

        assert_eq!(table.column("FTHG").unwrap(), &[1.0, 2.0]);
        assert!(matches!(
            table.key("Referee"),
            Err(FeatureError::UnknownAggregationKey(_))
        ));
        assert!(matches!(table.column("HS"), Err(FeatureError::UnknownColumn(_))));
        assert!(matches!(
            table.insert_column("Short", vec![1.0]),
            Err(FeatureError::LengthMismatch { expected: 2, found: 1, .. })
        ));
    }
}
