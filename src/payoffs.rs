//! Payoff matrices for the two-role, two-strategy games fed to the simulator.
//!
//! Index convention for every matrix: `m[visitor_strategy][host_strategy]`,
//! strategy 0 is the aggressive move (Hawk / Stag / Defect) and 1 the other.

use crate::error::{SetupError, SetupResult};
use crate::util::fmt_num;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type Matrix2 = [[f64; 2]; 2];

/// Role A plays as visitor, role B as host.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PayoffPair {
    pub role_a: Matrix2,
    pub role_b: Matrix2,
}

impl PayoffPair {
    pub fn new(role_a: Matrix2, role_b: Matrix2) -> Self {
        Self { role_a, role_b }
    }

    /// Pair for a game where each player's payoff depends only on
    /// `(own, other)`: the host matrix is the visitor matrix seen from the
    /// other side.
    pub fn from_own_payoffs(own: Matrix2) -> Self {
        let mut role_b = [[0.0; 2]; 2];
        for (visitor, row) in role_b.iter_mut().enumerate() {
            for (host, cell) in row.iter_mut().enumerate() {
                *cell = own[host][visitor];
            }
        }
        Self {
            role_a: own,
            role_b,
        }
    }

    pub fn role_a_flat(&self) -> [f64; 4] {
        flatten(&self.role_a)
    }

    pub fn role_b_flat(&self) -> [f64; 4] {
        flatten(&self.role_b)
    }

    /// Both matrices flattened row-wise, role A first, rendered as strings.
    pub fn flat_strings(&self) -> Vec<String> {
        self.role_a_flat()
            .iter()
            .chain(self.role_b_flat().iter())
            .map(|v| fmt_num(*v))
            .collect()
    }
}

fn flatten(m: &Matrix2) -> [f64; 4] {
    [m[0][0], m[0][1], m[1][0], m[1][1]]
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayoffArchetype {
    User,
    HawkDove,
    HawkDoveGrid,
    StagHunt,
    PrisonersDilemma,
}

impl PayoffArchetype {
    pub const ALL: [PayoffArchetype; 5] = [
        Self::User,
        Self::HawkDove,
        Self::HawkDoveGrid,
        Self::StagHunt,
        Self::PrisonersDilemma,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "User",
            Self::HawkDove => "HawkDove",
            Self::HawkDoveGrid => "HawkDoveGrid",
            Self::StagHunt => "StagHunt",
            Self::PrisonersDilemma => "PrisonersDilemma",
        }
    }
}

impl fmt::Display for PayoffArchetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PayoffArchetype {
    type Err = SetupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|archetype| archetype.as_str() == s)
            .ok_or_else(|| SetupError::UnknownArchetype(s.to_string()))
    }
}

/// A requested payoff archetype together with its parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "archetype")]
pub enum PayoffSpec {
    User { role_a: Matrix2, role_b: Matrix2 },
    HawkDove { value: f64, cost: f64 },
    HawkDoveGrid { dh: Vec<f64>, dd: Vec<f64> },
    StagHunt { hare: f64 },
    PrisonersDilemma {
        temptation: f64,
        reward: f64,
        punishment: f64,
        sucker: f64,
    },
}

impl Default for PayoffSpec {
    fn default() -> Self {
        let pair = user_payoffs(0.4, 0.2);
        Self::User {
            role_a: pair.role_a,
            role_b: pair.role_b,
        }
    }
}

impl PayoffSpec {
    pub fn archetype(&self) -> PayoffArchetype {
        match self {
            Self::User { .. } => PayoffArchetype::User,
            Self::HawkDove { .. } => PayoffArchetype::HawkDove,
            Self::HawkDoveGrid { .. } => PayoffArchetype::HawkDoveGrid,
            Self::StagHunt { .. } => PayoffArchetype::StagHunt,
            Self::PrisonersDilemma { .. } => PayoffArchetype::PrisonersDilemma,
        }
    }

    /// Resolves an archetype by name. `dh`/`dd` are the normalized
    /// dove-vs-hawk and dove-vs-dove payoffs used by the User and grid
    /// archetypes; the other archetypes use their textbook defaults.
    pub fn from_name(name: &str, dh: f64, dd: f64) -> SetupResult<Self> {
        Ok(match name.parse::<PayoffArchetype>()? {
            PayoffArchetype::User => {
                let pair = user_payoffs(dh, dd);
                Self::User {
                    role_a: pair.role_a,
                    role_b: pair.role_b,
                }
            }
            PayoffArchetype::HawkDove => Self::HawkDove {
                value: 2.0,
                cost: 3.0,
            },
            PayoffArchetype::HawkDoveGrid => Self::HawkDoveGrid {
                dh: vec![dh],
                dd: vec![dd],
            },
            PayoffArchetype::StagHunt => Self::StagHunt { hare: 0.5 },
            PayoffArchetype::PrisonersDilemma => Self::PrisonersDilemma {
                temptation: 5.0,
                reward: 3.0,
                punishment: 1.0,
                sucker: 0.0,
            },
        })
    }
}

/// The driver's default user matrices: `[[0,1],[dh,dd]]` for the visitor and
/// `[[0,dh],[1,dd]]` for the host.
pub fn user_payoffs(dh: f64, dd: f64) -> PayoffPair {
    PayoffPair::from_own_payoffs([[0.0, 1.0], [dh, dd]])
}

/// Hawk/dove game from a resource value and a fight cost, shifted so a
/// hawk-hawk fight pays 0 and scaled so hawk-vs-dove pays 1.
pub fn hawk_dove(value: f64, cost: f64) -> SetupResult<PayoffPair> {
    if !(value > 0.0 && cost > 0.0) {
        return Err(SetupError::InvalidPayoff(format!(
            "hawk-dove needs value > 0 and cost > 0 (value={value}, cost={cost})"
        )));
    }
    let hh = (value - cost) / 2.0;
    let span = value - hh;
    let dh = (0.0 - hh) / span;
    let dd = (value / 2.0 - hh) / span;
    Ok(user_payoffs(dh, dd))
}

pub fn stag_hunt(hare: f64) -> SetupResult<PayoffPair> {
    if !(0.0..1.0).contains(&hare) {
        return Err(SetupError::InvalidPayoff(format!(
            "stag hunt hare payoff must be in [0, 1), got {hare}"
        )));
    }
    Ok(PayoffPair::from_own_payoffs([[1.0, 0.0], [hare, hare]]))
}

/// Prisoner's dilemma normalized so mutual defection pays 0 and the
/// temptation payoff pays 1. Strategy 0 is Defect.
pub fn prisoners_dilemma(
    temptation: f64,
    reward: f64,
    punishment: f64,
    sucker: f64,
) -> SetupResult<PayoffPair> {
    if !(temptation > reward && reward > punishment && punishment > sucker) {
        return Err(SetupError::InvalidPayoff(format!(
            "prisoner's dilemma needs T > R > P > S (T={temptation}, R={reward}, P={punishment}, S={sucker})"
        )));
    }
    let span = temptation - punishment;
    let norm = |x: f64| (x - punishment) / span;
    Ok(PayoffPair::from_own_payoffs([
        [0.0, 1.0],
        [norm(sucker), norm(reward)],
    ]))
}

/// Expands a payoff request into one pair per archetype variant.
pub fn build_payoffs(spec: &PayoffSpec) -> SetupResult<Vec<PayoffPair>> {
    match spec {
        PayoffSpec::User { role_a, role_b } => Ok(vec![PayoffPair::new(*role_a, *role_b)]),
        PayoffSpec::HawkDove { value, cost } => Ok(vec![hawk_dove(*value, *cost)?]),
        PayoffSpec::HawkDoveGrid { dh, dd } => {
            if dh.is_empty() || dd.is_empty() {
                return Err(SetupError::InvalidPayoff(
                    "hawk-dove grid needs at least one dh and one dd".to_string(),
                ));
            }
            Ok(dh
                .iter()
                .flat_map(|h| dd.iter().map(move |d| user_payoffs(*h, *d)))
                .collect())
        }
        PayoffSpec::StagHunt { hare } => Ok(vec![stag_hunt(*hare)?]),
        PayoffSpec::PrisonersDilemma {
            temptation,
            reward,
            punishment,
            sucker,
        } => Ok(vec![prisoners_dilemma(
            *temptation,
            *reward,
            *punishment,
            *sucker,
        )?]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_matrices_mirror_roles() {
        let pair = user_payoffs(0.4, 0.2);
        assert_eq!(pair.role_a, [[0.0, 1.0], [0.4, 0.2]]);
        assert_eq!(pair.role_b, [[0.0, 0.4], [1.0, 0.2]]);
    }

    #[test]
    fn user_spec_passes_matrices_through() {
        let spec = PayoffSpec::User {
            role_a: [[1.0, 2.0], [3.0, 4.0]],
            role_b: [[5.0, 6.0], [7.0, 8.0]],
        };
        let pairs = build_payoffs(&spec).unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].role_a, [[1.0, 2.0], [3.0, 4.0]]);
        assert_eq!(pairs[0].role_b, [[5.0, 6.0], [7.0, 8.0]]);
    }

    #[test]
    fn hawk_dove_is_normalized() {
        let pair = hawk_dove(2.0, 4.0).unwrap();
        assert_eq!(pair.role_a[0], [0.0, 1.0]);
        assert!((pair.role_a[1][0] - 1.0 / 3.0).abs() < 1e-12);
        assert!((pair.role_a[1][1] - 2.0 / 3.0).abs() < 1e-12);
        assert!(hawk_dove(0.0, 1.0).is_err());
    }

    #[test]
    fn grid_varies_dd_fastest() {
        let pairs = build_payoffs(&PayoffSpec::HawkDoveGrid {
            dh: vec![0.1, 0.2],
            dd: vec![0.5, 0.6, 0.7],
        })
        .unwrap();
        assert_eq!(pairs.len(), 6);
        assert_eq!(pairs[1].role_a[1], [0.1, 0.6]);
        assert_eq!(pairs[3].role_a[1], [0.2, 0.5]);
    }

    #[test]
    fn unknown_archetype_is_rejected() {
        let err = PayoffSpec::from_name("Chicken", 0.4, 0.2).unwrap_err();
        assert!(matches!(err, SetupError::UnknownArchetype(name) if name == "Chicken"));
        assert!("hawkdove".parse::<PayoffArchetype>().is_err());
    }

    #[test]
    fn named_archetypes_build() {
        for archetype in PayoffArchetype::ALL {
            let spec = PayoffSpec::from_name(archetype.as_str(), 0.4, 0.2).unwrap();
            assert_eq!(spec.archetype(), archetype);
            assert!(!build_payoffs(&spec).unwrap().is_empty());
        }
    }

    #[test]
    fn prisoners_dilemma_requires_ordering() {
        let pair = prisoners_dilemma(5.0, 3.0, 1.0, 0.0).unwrap();
        assert_eq!(pair.role_a[0], [0.0, 1.0]);
        assert_eq!(pair.role_a[1], [-0.25, 0.5]);
        assert!(prisoners_dilemma(1.0, 3.0, 1.0, 0.0).is_err());
    }
}
