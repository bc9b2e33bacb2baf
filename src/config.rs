use crate::error::{SetupError, SetupResult};
use crate::payoffs::PayoffSpec;
use crate::util::{fmt_num, round_to};
use anyhow::{Context, Result};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

pub const DEFAULT_BASE: f64 = 0.0001;
pub const DEFAULT_TOTAL_WEIGHT: f64 = 2.0;
pub const DEFAULT_T_MAX: u64 = 1_000_000;
pub const DEFAULT_NUM_SEEDS: u32 = 4;
pub const DEFAULT_RUGGEDNESS_K: u32 = 7;
pub const DEFAULT_GAME: &str = "HDInnov";

/// How the simulator turns a conflict outcome into a network bonus.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CouplingEffect {
    Fight,
    FightSplit,
    FightRand,
    StagHunt,
    #[serde(rename = "FSH")]
    Fsh,
    None,
}

impl CouplingEffect {
    pub const ALL: [CouplingEffect; 6] = [
        Self::Fight,
        Self::FightSplit,
        Self::FightRand,
        Self::StagHunt,
        Self::Fsh,
        Self::None,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fight => "Fight",
            Self::FightSplit => "FightSplit",
            Self::FightRand => "FightRand",
            Self::StagHunt => "StagHunt",
            Self::Fsh => "FSH",
            Self::None => "None",
        }
    }
}

impl fmt::Display for CouplingEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CouplingEffect {
    type Err = SetupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|effect| effect.as_str() == s)
            .ok_or_else(|| SetupError::UnknownCouplingEffect(s.to_string()))
    }
}

/// Coupling bonus `[primary, secondary]` where the secondary is a third of
/// the primary.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BonusVector {
    pub primary: f64,
    pub secondary: f64,
}

impl BonusVector {
    pub fn from_fraction(fraction: f64) -> Self {
        Self {
            primary: round_to(fraction, 2),
            secondary: round_to(fraction / 3.0, 3),
        }
    }

    pub fn to_strings(self) -> [String; 2] {
        [fmt_num(self.primary), fmt_num(self.secondary)]
    }
}

/// Every experiment parameter of one sweep. List-valued fields are sweep
/// axes; the Cartesian product over them is expanded by [`crate::sweep`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    pub base: f64,
    pub payoff: PayoffSpec,
    pub population: Vec<u32>,
    pub net_discount: Vec<f64>,
    pub strat_discount: Vec<f64>,
    pub hawk_pct_a: Vec<f64>,
    pub hawk_pct_b: Vec<f64>,
    pub net_learning_speed: Vec<f64>,
    pub strat_learning_speed: Vec<f64>,
    #[serde(deserialize_with = "deserialize_flags")]
    pub net_symmetric: Vec<bool>,
    #[serde(deserialize_with = "deserialize_flags")]
    pub strat_symmetric: Vec<bool>,
    pub net_tremble: Vec<f64>,
    pub strat_tremble: Vec<f64>,
    pub copy_prob: Vec<f64>,
    pub copy_error: Vec<f64>,
    pub explore_prob: Vec<f64>,
    pub innov_noise: Vec<f64>,
    pub bonus_fractions: Vec<f64>,
    pub couple_effect: CouplingEffect,
    pub total_weight: f64,
    pub t_max: u64,
    pub run_now: bool,
    pub num_seeds: u32,
    pub ruggedness_k: u32,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            base: DEFAULT_BASE,
            payoff: PayoffSpec::default(),
            population: vec![20],
            net_discount: vec![0.01],
            strat_discount: vec![0.01],
            hawk_pct_a: vec![50.0],
            hawk_pct_b: vec![50.0],
            net_learning_speed: vec![0.0, 1.0],
            strat_learning_speed: vec![1.0],
            net_symmetric: vec![false],
            strat_symmetric: vec![false],
            net_tremble: vec![0.01],
            strat_tremble: vec![0.01],
            copy_prob: vec![0.0],
            copy_error: vec![0.0],
            explore_prob: vec![0.0],
            innov_noise: vec![0.0],
            bonus_fractions: vec![0.6],
            couple_effect: CouplingEffect::Fight,
            total_weight: DEFAULT_TOTAL_WEIGHT,
            t_max: DEFAULT_T_MAX,
            run_now: false,
            num_seeds: DEFAULT_NUM_SEEDS,
            ruggedness_k: DEFAULT_RUGGEDNESS_K,
        }
    }
}

impl SweepConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = fs::read(path)
            .with_context(|| format!("failed reading config {}", path.display()))?;
        serde_json::from_slice(&raw)
            .with_context(|| format!("invalid sweep config {}", path.display()))
    }

    pub fn bonus_vectors(&self) -> Vec<BonusVector> {
        self.bonus_fractions
            .iter()
            .map(|f| BonusVector::from_fraction(*f))
            .collect()
    }

    /// Checks every axis before any file is touched.
    pub fn validate(&self) -> SetupResult<()> {
        non_empty("population", &self.population)?;
        for pop in &self.population {
            if *pop == 0 {
                return Err(SetupError::InvalidAxis {
                    axis: "population",
                    value: pop.to_string(),
                    reason: "population must be a positive integer",
                });
            }
        }

        unit_interval("net_discount", &self.net_discount)?;
        unit_interval("strat_discount", &self.strat_discount)?;
        unit_interval("net_tremble", &self.net_tremble)?;
        unit_interval("strat_tremble", &self.strat_tremble)?;
        unit_interval("copy_prob", &self.copy_prob)?;
        unit_interval("copy_error", &self.copy_error)?;
        unit_interval("explore_prob", &self.explore_prob)?;
        non_negative("net_learning_speed", &self.net_learning_speed)?;
        non_negative("strat_learning_speed", &self.strat_learning_speed)?;
        non_negative("innov_noise", &self.innov_noise)?;
        non_empty("net_symmetric", &self.net_symmetric)?;
        non_empty("strat_symmetric", &self.strat_symmetric)?;
        non_empty("bonus_fractions", &self.bonus_fractions)?;
        for fraction in &self.bonus_fractions {
            if !fraction.is_finite() {
                return Err(SetupError::InvalidAxis {
                    axis: "bonus_fractions",
                    value: fmt_num(*fraction),
                    reason: "bonus fraction must be finite",
                });
            }
        }

        for (axis, values) in [("hawk_pct_a", &self.hawk_pct_a), ("hawk_pct_b", &self.hawk_pct_b)] {
            non_empty(axis, values)?;
            for pct in values.iter() {
                if !(0.0..=100.0).contains(pct) {
                    return Err(SetupError::InvalidAxis {
                        axis,
                        value: fmt_num(*pct),
                        reason: "initial hawk percentage must be in [0, 100]",
                    });
                }
            }
        }

        if !(self.total_weight > 0.0) {
            return Err(SetupError::InvalidAxis {
                axis: "total_weight",
                value: fmt_num(self.total_weight),
                reason: "total weight must be positive",
            });
        }
        if self.t_max == 0 {
            return Err(SetupError::InvalidAxis {
                axis: "t_max",
                value: "0".to_string(),
                reason: "t_max must be positive",
            });
        }

        Ok(())
    }
}

/// Symmetric flags as `true`/`false` or the `.conf` spelling `0`/`1`.
#[derive(Deserialize)]
#[serde(untagged)]
enum FlagValue {
    Bool(bool),
    Int(u64),
}

fn deserialize_flags<'de, D>(deserializer: D) -> std::result::Result<Vec<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Vec::<FlagValue>::deserialize(deserializer)?
        .into_iter()
        .map(|value| match value {
            FlagValue::Bool(flag) => Ok(flag),
            FlagValue::Int(0) => Ok(false),
            FlagValue::Int(1) => Ok(true),
            FlagValue::Int(other) => Err(D::Error::custom(format!(
                "symmetric flag must be 0, 1, true or false, found {other}"
            ))),
        })
        .collect()
}

fn non_empty<T>(axis: &'static str, values: &[T]) -> SetupResult<()> {
    if values.is_empty() {
        return Err(SetupError::EmptyAxis { axis });
    }
    Ok(())
}

fn unit_interval(axis: &'static str, values: &[f64]) -> SetupResult<()> {
    non_empty(axis, values)?;
    for value in values {
        if !(0.0..=1.0).contains(value) {
            return Err(SetupError::InvalidAxis {
                axis,
                value: fmt_num(*value),
                reason: "must be in [0, 1]",
            });
        }
    }
    Ok(())
}

fn non_negative(axis: &'static str, values: &[f64]) -> SetupResult<()> {
    non_empty(axis, values)?;
    for value in values {
        if !(*value >= 0.0 && value.is_finite()) {
            return Err(SetupError::InvalidAxis {
                axis,
                value: fmt_num(*value),
                reason: "must be a finite value >= 0",
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_driver() {
        let cfg = SweepConfig::default();
        assert_eq!(cfg.population, vec![20]);
        assert_eq!(cfg.net_learning_speed, vec![0.0, 1.0]);
        assert_eq!(cfg.couple_effect, CouplingEffect::Fight);
        assert_eq!(cfg.t_max, 1_000_000);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn bonus_vector_is_rounded() {
        let bonus = BonusVector::from_fraction(0.6);
        assert_eq!(bonus.primary, 0.6);
        assert_eq!(bonus.secondary, 0.2);
        assert_eq!(bonus.to_strings(), ["0.6".to_string(), "0.2".to_string()]);
    }

    #[test]
    fn validation_rejects_out_of_range_axes() {
        let mut cfg = SweepConfig::default();
        cfg.net_tremble = vec![1.5];
        assert!(matches!(
            cfg.validate(),
            Err(SetupError::InvalidAxis { axis: "net_tremble", .. })
        ));

        let mut cfg = SweepConfig::default();
        cfg.population = vec![];
        assert!(matches!(
            cfg.validate(),
            Err(SetupError::EmptyAxis { axis: "population" })
        ));

        let mut cfg = SweepConfig::default();
        cfg.strat_learning_speed = vec![-1.0];
        assert!(cfg.validate().is_err());

        let mut cfg = SweepConfig::default();
        cfg.hawk_pct_b = vec![101.0];
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn coupling_effect_names_round_trip() {
        for effect in CouplingEffect::ALL {
            assert_eq!(effect.as_str().parse::<CouplingEffect>().unwrap(), effect);
        }
        assert!(matches!(
            "Hug".parse::<CouplingEffect>(),
            Err(SetupError::UnknownCouplingEffect(_))
        ));
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let cfg: SweepConfig =
            serde_json::from_str(r#"{"population": [50, 200], "couple_effect": "FSH"}"#).unwrap();
        assert_eq!(cfg.population, vec![50, 200]);
        assert_eq!(cfg.couple_effect, CouplingEffect::Fsh);
        assert_eq!(cfg.net_discount, vec![0.01]);
    }

    #[test]
    fn symmetric_flags_accept_conf_integers() {
        let cfg: SweepConfig =
            serde_json::from_str(r#"{"net_symmetric": [0, 1], "strat_symmetric": [true]}"#)
                .unwrap();
        assert_eq!(cfg.net_symmetric, vec![false, true]);
        assert_eq!(cfg.strat_symmetric, vec![true]);

        let bad = serde_json::from_str::<SweepConfig>(r#"{"net_symmetric": [2]}"#);
        assert!(bad.is_err());
    }
}
