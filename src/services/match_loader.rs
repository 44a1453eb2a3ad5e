use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use csv::StringRecord;

use crate::error::{FeatureError, Result};
use crate::models::{Match, ShotStats};

// Two-digit years first: %Y would read "19" as the year 19.
const DATE_FORMATS: [&str; 3] = ["%d/%m/%y", "%d/%m/%Y", "%Y-%m-%d"];

/// Cells treated as "no value" rather than garbage
const MISSING_MARKERS: [&str; 4] = ["", "NA", "NaN", "nan"];

/// Column positions resolved from the header row
struct Columns {
    date: usize,
    home_team: usize,
    away_team: usize,
    home_goals: usize,
    away_goals: usize,
    home_shots: Option<usize>,
    away_shots: Option<usize>,
    home_shots_on_target: Option<usize>,
    away_shots_on_target: Option<usize>,
}

impl Columns {
    fn resolve(headers: &StringRecord) -> Result<Self> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        let require = |name: &str| find(name).ok_or_else(|| FeatureError::MissingColumn(name.to_string()));

        Ok(Self {
            date: require("Date")?,
            home_team: require("HomeTeam")?,
            away_team: require("AwayTeam")?,
            home_goals: require("FTHG")?,
            away_goals: require("FTAG")?,
            home_shots: find("HS"),
            away_shots: find("AS"),
            home_shots_on_target: find("HST"),
            away_shots_on_target: find("AST"),
        })
    }
}

/// Row counts from one load, for the summary printed by the CLI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub rows_read: usize,
    pub dropped_malformed: usize,
    pub dropped_duplicates: usize,
}

impl LoadReport {
    pub fn kept(&self) -> usize {
        self.rows_read - self.dropped_malformed - self.dropped_duplicates
    }
}

/// Reads a one-row-per-match CSV and yields matches oldest first.
///
/// In lenient mode rows with an unparseable date or a non-numeric score are
/// dropped with a warning; in strict mode they fail the load. Empty score
/// cells are kept as missing and left for the rating engine to reject.
pub struct MatchLoader {
    strict: bool,
}

impl MatchLoader {
    pub fn new(strict: bool) -> Self {
        Self { strict }
    }

    pub async fn load_path(&self, path: &Path) -> Result<(Vec<Match>, LoadReport)> {
        tracing::info!("Loading matches from {}", path.display());
        let bytes = tokio::fs::read(path).await?;
        self.load(bytes.as_slice())
    }

    pub fn load<R: Read>(&self, reader: R) -> Result<(Vec<Match>, LoadReport)> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let columns = Columns::resolve(csv_reader.headers()?)?;

        let mut report = LoadReport::default();
        let mut seen: HashSet<Vec<String>> = HashSet::new();
        let mut matches = Vec::new();

        for (offset, record) in csv_reader.records().enumerate() {
            let record = record?;
            // Header is line 1
            let row = offset + 2;
            report.rows_read += 1;

            let fields: Vec<String> = record.iter().map(str::to_string).collect();
            if !seen.insert(fields) {
                tracing::warn!("Dropping duplicate row {}", row);
                report.dropped_duplicates += 1;
                continue;
            }

            match parse_row(&record, &columns, row) {
                Ok(match_data) => matches.push(match_data),
                Err(e) if self.strict => return Err(e),
                Err(e) => {
                    tracing::warn!("{}; row dropped", e);
                    report.dropped_malformed += 1;
                }
            }
        }

        // Stable: same-day matches keep file order
        matches.sort_by_key(|m| m.date);

        tracing::info!(
            "Loaded {} matches ({} malformed, {} duplicate rows dropped)",
            matches.len(),
            report.dropped_malformed,
            report.dropped_duplicates
        );

        Ok((matches, report))
    }
}

fn parse_row(record: &StringRecord, columns: &Columns, row: usize) -> Result<Match> {
    let malformed = |reason: String| FeatureError::MalformedInputRow { row, reason };
    let field = |idx: usize| record.get(idx).unwrap_or("");

    let date = parse_date(field(columns.date))
        .ok_or_else(|| malformed(format!("unparseable date '{}'", field(columns.date))))?;

    let home_team = field(columns.home_team);
    let away_team = field(columns.away_team);
    if home_team.is_empty() || away_team.is_empty() {
        return Err(malformed("missing team name".to_string()));
    }

    let score = |idx: usize, name: &str| -> Result<Option<f64>> {
        parse_number(field(idx)).map_err(|raw| malformed(format!("non-numeric {} '{}'", name, raw)))
    };

    // A bad shot count only blanks that cell; the result itself still counts.
    let shot = |idx: Option<usize>, name: &str| -> Option<f64> {
        let raw = field(idx?);
        parse_number(raw).unwrap_or_else(|_| {
            tracing::warn!("Row {}: non-numeric {} '{}' treated as missing", row, name, raw);
            None
        })
    };

    Ok(Match {
        date,
        home_team: home_team.to_string(),
        away_team: away_team.to_string(),
        home_goals: score(columns.home_goals, "FTHG")?,
        away_goals: score(columns.away_goals, "FTAG")?,
        shots: ShotStats {
            home_shots: shot(columns.home_shots, "HS"),
            away_shots: shot(columns.away_shots, "AS"),
            home_shots_on_target: shot(columns.home_shots_on_target, "HST"),
            away_shots_on_target: shot(columns.away_shots_on_target, "AST"),
        },
    })
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// `Ok(None)` for a missing cell, `Err(raw)` for text that is not a number.
fn parse_number(raw: &str) -> std::result::Result<Option<f64>, String> {
    if MISSING_MARKERS.contains(&raw) {
        return Ok(None);
    }
    raw.parse::<f64>().map(Some).map_err(|_| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Div,Date,HomeTeam,AwayTeam,FTHG,FTAG,HS,AS,HST,AST,DateConverted
E0,12/08/2023,Burnley,Man City,0,3,6,17,1,8,2023-08-12
E0,11/08/2023,Arsenal,Forest,2,1,15,6,7,2,2023-08-11
E0,12/08/2023,Bournemouth,West Ham,1,1,14,16,5,3,2023-08-12
";

    #[test]
    fn test_sorts_by_date_keeping_file_order_on_ties() {
        let (matches, report) = MatchLoader::new(true).load(SAMPLE.as_bytes()).unwrap();

        assert_eq!(report.rows_read, 3);
        assert_eq!(report.kept(), 3);
        let homes: Vec<&str> = matches.iter().map(|m| m.home_team.as_str()).collect();
        assert_eq!(homes, vec!["Arsenal", "Burnley", "Bournemouth"]);
        assert_eq!(matches[1].away_goals, Some(3.0));
        assert_eq!(matches[0].shots.home_shots_on_target, Some(7.0));
        assert_eq!(matches[0].date, NaiveDate::from_ymd_opt(2023, 8, 11).unwrap());
    }

    #[test]
    fn test_drops_duplicates() {
        let data = format!("{}E0,11/08/2023,Arsenal,Forest,2,1,15,6,7,2,2023-08-11\n", SAMPLE);
        let (matches, report) = MatchLoader::new(false).load(data.as_bytes()).unwrap();
        assert_eq!(matches.len(), 3);
        assert_eq!(report.dropped_duplicates, 1);
    }

    #[test]
    fn test_lenient_drops_malformed_rows() {
        let data = "\
Date,HomeTeam,AwayTeam,FTHG,FTAG
32/13/2023,A,B,1,0
01/09/2023,A,B,two,0
02/09/2023,C,D,1,1
";
        let (matches, report) = MatchLoader::new(false).load(data.as_bytes()).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].home_team, "C");
        assert_eq!(report.dropped_malformed, 2);
        assert_eq!(matches[0].shots, ShotStats::default());
    }

    #[test]
    fn test_strict_rejects_malformed_rows() {
        let data = "Date,HomeTeam,AwayTeam,FTHG,FTAG\n01/09/2023,A,B,two,0\n";
        let result = MatchLoader::new(true).load(data.as_bytes());
        match result {
            Err(FeatureError::MalformedInputRow { row, .. }) => assert_eq!(row, 2),
            other => panic!("expected MalformedInputRow, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_shot_cell_keeps_the_match() {
        let data = "\
Date,HomeTeam,AwayTeam,FTHG,FTAG,HS,AS,HST,AST
01/09/2023,A,B,3,0,x,5,4,1
02/09/2023,A,C,1,1,10,5,4,1
";
        for strict in [false, true] {
            let (matches, report) = MatchLoader::new(strict).load(data.as_bytes()).unwrap();
            assert_eq!(matches.len(), 2);
            assert_eq!(report.dropped_malformed, 0);
            assert_eq!(matches[0].home_goals, Some(3.0));
            assert_eq!(matches[0].shots.home_shots, None);
            assert_eq!(matches[0].shots.away_shots, Some(5.0));

            let snapshots = crate::services::EloCalculator::default().process(&matches).unwrap();
            assert_eq!(snapshots[1].home_rating, 1505.0);
        }
    }

    #[test]
    fn test_empty_score_is_kept_as_missing() {
        let data = "Date,HomeTeam,AwayTeam,FTHG,FTAG\n01/09/2023,A,B,,0\n";
        let (matches, _) = MatchLoader::new(true).load(data.as_bytes()).unwrap();
        assert_eq!(matches[0].home_goals, None);
        assert_eq!(matches[0].away_goals, Some(0.0));
    }

    #[test]
    fn test_missing_required_column() {
        let data = "Date,HomeTeam,AwayTeam,FTHG\n01/09/2023,A,B,1\n";
        let result = MatchLoader::new(false).load(data.as_bytes());
        assert!(matches!(result, Err(FeatureError::MissingColumn(c)) if c == "FTAG"));
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2019, 3, 9);
        assert_eq!(parse_date("09/03/2019"), expected);
        assert_eq!(parse_date("09/03/19"), expected);
        assert_eq!(parse_date("2019-03-09"), expected);
        assert_eq!(parse_date("March 9"), None);
    }

    #[tokio::test]
    async fn test_load_path_missing_file() {
        let result = MatchLoader::new(false)
            .load_path(Path::new("does/not/exist.csv"))
            .await;
        assert!(matches!(result, Err(FeatureError::Io(_))));
    }
}
