//! Typed `.conf` rows and the per-record payoff/strategy artifacts.

use crate::config::{BonusVector, CouplingEffect};
use crate::error::{SetupError, SetupResult};
use crate::keys::is_valid_key;
use crate::payoffs::PayoffPair;
use crate::util::{fmt_num, round_to};
use serde::Serialize;
use std::path::Path;
use std::str::FromStr;

pub const CONF_HEADER: [&str; 19] = [
    "Base",
    "Net_in",
    "TMax",
    "NetDiscount",
    "StratDiscount",
    "NetLearningSpeed",
    "StratLearningSpeed",
    "NetSymmetric",
    "StratSymmetric",
    "NetTremble",
    "StratTremble",
    "CopyProb",
    "CopyError",
    "ExploreProb",
    "InnovNoise",
    "CoupleEffect",
    "Game",
    "OutFolder",
    "Key",
];

/// Number of strategies per role; written as the payoff file's first line.
pub const NUM_STRATS: [u32; 2] = [2, 2];

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConfigRecord {
    pub base: f64,
    pub population: u32,
    pub t_max: u64,
    pub net_discount: f64,
    pub strat_discount: f64,
    pub net_learning_speed: f64,
    pub strat_learning_speed: f64,
    pub net_symmetric: bool,
    pub strat_symmetric: bool,
    pub net_tremble: f64,
    pub strat_tremble: f64,
    pub copy_prob: f64,
    pub copy_error: f64,
    pub explore_prob: f64,
    pub innov_noise: f64,
    pub couple_effect: CouplingEffect,
    pub game: String,
    pub out_folder: String,
    pub key: String,
}

impl ConfigRecord {
    /// The 19 columns in header order.
    pub fn to_row(&self) -> Vec<String> {
        let mut row = self.scalar_fields();
        row.push(self.key.clone());
        row
    }

    /// The 18 columns preceding `Key`.
    pub fn scalar_fields(&self) -> Vec<String> {
        vec![
            fmt_num(self.base),
            self.population.to_string(),
            self.t_max.to_string(),
            fmt_num(self.net_discount),
            fmt_num(self.strat_discount),
            fmt_num(self.net_learning_speed),
            fmt_num(self.strat_learning_speed),
            flag(self.net_symmetric).to_string(),
            flag(self.strat_symmetric).to_string(),
            fmt_num(self.net_tremble),
            fmt_num(self.strat_tremble),
            fmt_num(self.copy_prob),
            fmt_num(self.copy_error),
            fmt_num(self.explore_prob),
            fmt_num(self.innov_noise),
            self.couple_effect.to_string(),
            self.game.clone(),
            self.out_folder.clone(),
        ]
    }

    pub fn to_line(&self) -> String {
        self.to_row().join(" ")
    }

    /// Parses one whitespace-separated data row. `path` and `line` only
    /// feed error messages.
    pub fn parse_row(raw: &str, path: &Path, line: usize) -> SetupResult<Self> {
        let cols: Vec<&str> = raw.split_whitespace().collect();
        if cols.len() != CONF_HEADER.len() {
            return Err(SetupError::malformed(
                path,
                line,
                format!("expected {} columns, found {}", CONF_HEADER.len(), cols.len()),
            ));
        }

        let field = |idx: usize| -> SetupResult<f64> { parse_col(cols[idx], idx, path, line) };
        let key = cols[18].to_string();
        if !is_valid_key(&key) {
            return Err(SetupError::malformed(path, line, format!("invalid key '{key}'")));
        }

        Ok(Self {
            base: field(0)?,
            population: parse_col(cols[1], 1, path, line)?,
            t_max: parse_col(cols[2], 2, path, line)?,
            net_discount: field(3)?,
            strat_discount: field(4)?,
            net_learning_speed: field(5)?,
            strat_learning_speed: field(6)?,
            net_symmetric: parse_flag(cols[7], 7, path, line)?,
            strat_symmetric: parse_flag(cols[8], 8, path, line)?,
            net_tremble: field(9)?,
            strat_tremble: field(10)?,
            copy_prob: field(11)?,
            copy_error: field(12)?,
            explore_prob: field(13)?,
            innov_noise: field(14)?,
            couple_effect: cols[15]
                .parse::<CouplingEffect>()
                .map_err(|err| SetupError::malformed(path, line, err.to_string()))?,
            game: cols[16].to_string(),
            out_folder: cols[17].to_string(),
            key,
        })
    }
}

pub fn header_line() -> String {
    CONF_HEADER.join(" ")
}

fn flag(value: bool) -> u8 {
    u8::from(value)
}

fn parse_col<T: FromStr>(raw: &str, idx: usize, path: &Path, line: usize) -> SetupResult<T> {
    raw.parse::<T>().map_err(|_| {
        SetupError::malformed(
            path,
            line,
            format!("column {} has unparseable value '{raw}'", CONF_HEADER[idx]),
        )
    })
}

fn parse_flag(raw: &str, idx: usize, path: &Path, line: usize) -> SetupResult<bool> {
    match raw {
        "0" => Ok(false),
        "1" => Ok(true),
        other => Err(SetupError::malformed(
            path,
            line,
            format!("column {} must be 0 or 1, found '{other}'", CONF_HEADER[idx]),
        )),
    }
}

/// Uniform initial strategy weights: every agent row is
/// `[hawk_a, total - hawk_a, hawk_b, total - hawk_b]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct StrategyMatrix {
    pub rows: u32,
    pub row: [f64; 4],
}

impl StrategyMatrix {
    pub fn uniform(population: u32, total_weight: f64, hawk_pct_a: f64, hawk_pct_b: f64) -> Self {
        let hawk_a = round_to(total_weight * hawk_pct_a / 100.0, 1);
        let hawk_b = round_to(total_weight * hawk_pct_b / 100.0, 1);
        Self {
            rows: population,
            row: [hawk_a, total_weight - hawk_a, hawk_b, total_weight - hawk_b],
        }
    }

    pub fn row_strings(&self) -> Vec<String> {
        self.row.iter().map(|v| fmt_num(*v)).collect()
    }

    pub fn render(&self) -> String {
        let line = self.row_strings().join(" ");
        let mut out = String::with_capacity((line.len() + 1) * self.rows as usize);
        for _ in 0..self.rows {
            out.push_str(&line);
            out.push('\n');
        }
        out
    }

    /// All cells row-major, as written to disk.
    pub fn flat_strings(&self) -> Vec<String> {
        let row = self.row_strings();
        (0..self.rows).flat_map(|_| row.iter().cloned()).collect()
    }
}

/// Contents of `Payoffs_<Key>.csv`.
pub fn render_payoff_file(payoffs: &PayoffPair, bonus: BonusVector) -> String {
    let render = |values: [f64; 4]| values.iter().map(|v| fmt_num(*v)).collect::<Vec<_>>().join(" ");
    format!(
        "{} {}\n{}\n{}\n{}\n",
        NUM_STRATS[0],
        NUM_STRATS[1],
        render(payoffs.role_a_flat()),
        render(payoffs.role_b_flat()),
        bonus.to_strings().join(" ")
    )
}

/// Artifact values as the loader sees them: payoff cells, then bonus, then
/// strategy cells.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ArtifactValues {
    pub payoffs: Vec<String>,
    pub bonus: Vec<String>,
    pub strategy: Vec<String>,
}

impl ArtifactValues {
    pub fn from_parts(payoffs: &PayoffPair, bonus: BonusVector, strategy: &StrategyMatrix) -> Self {
        Self {
            payoffs: payoffs.flat_strings(),
            bonus: bonus.to_strings().to_vec(),
            strategy: strategy.flat_strings(),
        }
    }

    /// Splits a payoff file into matrix cells (lines 2-3) and bonus (line 4+).
    pub fn parse_payoff_file(raw: &str) -> (Vec<String>, Vec<String>) {
        let mut payoffs = Vec::new();
        let mut bonus = Vec::new();
        for (idx, line) in raw.lines().enumerate() {
            let tokens = line.split_whitespace().map(str::to_string);
            match idx {
                0 => {}
                1 | 2 => payoffs.extend(tokens),
                _ => bonus.extend(tokens),
            }
        }
        (payoffs, bonus)
    }

    pub fn parse_strategy_file(raw: &str) -> Vec<String> {
        raw.split_whitespace().map(str::to_string).collect()
    }
}

/// Identity of a configuration for deduplication: the 18 scalar `.conf`
/// fields followed by every artifact value. Keys never participate.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Fingerprint(Vec<String>);

impl Fingerprint {
    pub fn new(record: &ConfigRecord, artifacts: &ArtifactValues) -> Self {
        let mut values = record.scalar_fields();
        values.extend(artifacts.payoffs.iter().cloned());
        values.extend(artifacts.bonus.iter().cloned());
        values.extend(artifacts.strategy.iter().cloned());
        Self(values)
    }

    pub fn values(&self) -> &[String] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payoffs::user_payoffs;
    use std::path::PathBuf;

    fn sample_record() -> ConfigRecord {
        ConfigRecord {
            base: 0.0001,
            population: 20,
            t_max: 1_000_000,
            net_discount: 0.01,
            strat_discount: 0.01,
            net_learning_speed: 0.0,
            strat_learning_speed: 1.0,
            net_symmetric: false,
            strat_symmetric: true,
            net_tremble: 0.01,
            strat_tremble: 0.01,
            copy_prob: 0.0,
            copy_error: 0.5,
            explore_prob: 0.0,
            innov_noise: 0.0,
            couple_effect: CouplingEffect::Fight,
            game: "HDInnov".to_string(),
            out_folder: "HDInnov_Pop-20".to_string(),
            key: "ABCD1234".to_string(),
        }
    }

    #[test]
    fn row_has_header_order() {
        let row = sample_record().to_row();
        assert_eq!(row.len(), CONF_HEADER.len());
        assert_eq!(row[0], "0.0001");
        assert_eq!(row[2], "1000000");
        assert_eq!(row[8], "1");
        assert_eq!(row[15], "Fight");
        assert_eq!(row[18], "ABCD1234");
    }

    #[test]
    fn parse_row_restores_record() {
        let record = sample_record();
        let parsed = ConfigRecord::parse_row(&record.to_line(), &PathBuf::from("x.conf"), 2).unwrap();
        assert_eq!(parsed, record);
        assert_eq!(parsed.to_row(), record.to_row());
    }

    #[test]
    fn parse_row_reports_bad_columns() {
        let path = PathBuf::from("bad.conf");
        let short = ConfigRecord::parse_row("0.1 20", &path, 3).unwrap_err();
        assert!(matches!(short, SetupError::MalformedRecord { line: 3, .. }));

        let mut row = sample_record().to_row();
        row[7] = "yes".to_string();
        assert!(ConfigRecord::parse_row(&row.join(" "), &path, 4).is_err());
    }

    #[test]
    fn uniform_strategy_splits_total_weight() {
        let even = StrategyMatrix::uniform(20, 2.0, 50.0, 50.0);
        assert_eq!(even.row, [1.0, 1.0, 1.0, 1.0]);
        let dove = StrategyMatrix::uniform(20, 2.0, 0.0, 100.0);
        assert_eq!(dove.row, [0.0, 2.0, 2.0, 0.0]);
        assert_eq!(dove.render().lines().count(), 20);
        assert_eq!(dove.flat_strings().len(), 80);
    }

    #[test]
    fn payoff_file_layout() {
        let text = render_payoff_file(&user_payoffs(0.4, 0.2), BonusVector::from_fraction(0.6));
        assert_eq!(text, "2 2\n0 1 0.4 0.2\n0 0.4 1 0.2\n0.6 0.2\n");
        let (payoffs, bonus) = ArtifactValues::parse_payoff_file(&text);
        assert_eq!(payoffs, user_payoffs(0.4, 0.2).flat_strings());
        assert_eq!(bonus, vec!["0.6", "0.2"]);
    }
}
