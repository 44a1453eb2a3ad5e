use statrs::statistics::{Data, Median, Statistics};

/// Arithmetic mean of the non-missing values; `NaN` when there are none.
pub fn mean(values: &[f64]) -> f64 {
    let present: Vec<f64> = present_values(values);
    if present.is_empty() {
        return f64::NAN;
    }
    present.iter().mean()
}

/// Median of the non-missing values; `NaN` when there are none.
pub fn median(values: &[f64]) -> f64 {
    let present = present_values(values);
    if present.is_empty() {
        return f64::NAN;
    }
    Data::new(present).median()
}

fn present_values(values: &[f64]) -> Vec<f64> {
    values.iter().copied().filter(|v| !v.is_nan()).collect()
}

/// `a / b`, missing when either side is missing or the divisor is zero
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return f64::NAN;
    }
    numerator / denominator
}

/// Order-independent key for a pairing of two teams.
///
/// The first name is length-prefixed (`"7:Arsenal v Spurs"`) so names that
/// themselves contain `" v "` cannot collide.
pub fn pair_key(team_a: &str, team_b: &str) -> String {
    let (first, second) = if team_a <= team_b { (team_a, team_b) } else { (team_b, team_a) };
    format!("{}:{} v {}", first.len(), first, second)
}

/// Convert a list of W/D/L results into a form string, most recent first
pub fn results_to_form(results: &[char], last: usize) -> String {
    results.iter().rev().take(last).collect()
}

/// Calculate win percentage from wins, draws, and losses (3 points a win)
pub fn calculate_win_percentage(wins: u32, draws: u32, losses: u32) -> f64 {
    let total_games = wins + draws + losses;
    if total_games == 0 {
        return 0.0;
    }

    let points = wins * 3 + draws;
    (points as f64) / ((total_games * 3) as f64) * 100.0
}
