//! Cartesian expansion of sweep axes and the sweep description string.
//!
//! Product order is fixed: payoffs, population, net discount, strategy
//! discount, hawk % (A), hawk % (B), net speed, strategy speed, net symmetric,
//! strategy symmetric, net tremble, strategy tremble, copy prob, copy error,
//! explore prob, innovation noise, bonus. The last axis varies fastest.

use crate::config::{BonusVector, SweepConfig};
use crate::keys::KeyGenerator;
use crate::payoffs::PayoffPair;
use crate::records::{ArtifactValues, ConfigRecord, StrategyMatrix};
use crate::util::{join_hyphen, join_hyphen_f64};

const AXIS_COUNT: usize = 17;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParameterCombo {
    pub payoffs: PayoffPair,
    pub population: u32,
    pub net_discount: f64,
    pub strat_discount: f64,
    pub hawk_pct_a: f64,
    pub hawk_pct_b: f64,
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
    pub bonus: BonusVector,
}

/// Lazily walks the product of every axis in [`SweepConfig`] together with
/// the expanded payoff pairs.
pub struct ComboIter<'a> {
    cfg: &'a SweepConfig,
    payoffs: &'a [PayoffPair],
    bonuses: Vec<BonusVector>,
    dims: [usize; AXIS_COUNT],
    next: usize,
    total: usize,
}

impl<'a> ComboIter<'a> {
    pub fn new(cfg: &'a SweepConfig, payoffs: &'a [PayoffPair]) -> Self {
        let bonuses = cfg.bonus_vectors();
        let dims = [
            payoffs.len(),
            cfg.population.len(),
            cfg.net_discount.len(),
            cfg.strat_discount.len(),
            cfg.hawk_pct_a.len(),
            cfg.hawk_pct_b.len(),
            cfg.net_learning_speed.len(),
            cfg.strat_learning_speed.len(),
            cfg.net_symmetric.len(),
            cfg.strat_symmetric.len(),
            cfg.net_tremble.len(),
            cfg.strat_tremble.len(),
            cfg.copy_prob.len(),
            cfg.copy_error.len(),
            cfg.explore_prob.len(),
            cfg.innov_noise.len(),
            bonuses.len(),
        ];
        let total = dims.iter().product();
        Self {
            cfg,
            payoffs,
            bonuses,
            dims,
            next: 0,
            total,
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    fn combo_at(&self, mut index: usize) -> ParameterCombo {
        let mut digits = [0usize; AXIS_COUNT];
        for axis in (0..AXIS_COUNT).rev() {
            digits[axis] = index % self.dims[axis];
            index /= self.dims[axis];
        }
        let cfg = self.cfg;
        ParameterCombo {
            payoffs: self.payoffs[digits[0]],
            population: cfg.population[digits[1]],
            net_discount: cfg.net_discount[digits[2]],
            strat_discount: cfg.strat_discount[digits[3]],
            hawk_pct_a: cfg.hawk_pct_a[digits[4]],
            hawk_pct_b: cfg.hawk_pct_b[digits[5]],
            net_learning_speed: cfg.net_learning_speed[digits[6]],
            strat_learning_speed: cfg.strat_learning_speed[digits[7]],
            net_symmetric: cfg.net_symmetric[digits[8]],
            strat_symmetric: cfg.strat_symmetric[digits[9]],
            net_tremble: cfg.net_tremble[digits[10]],
            strat_tremble: cfg.strat_tremble[digits[11]],
            copy_prob: cfg.copy_prob[digits[12]],
            copy_error: cfg.copy_error[digits[13]],
            explore_prob: cfg.explore_prob[digits[14]],
            innov_noise: cfg.innov_noise[digits[15]],
            bonus: self.bonuses[digits[16]],
        }
    }
}

impl Iterator for ComboIter<'_> {
    type Item = ParameterCombo;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.total {
            return None;
        }
        let combo = self.combo_at(self.next);
        self.next += 1;
        Some(combo)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.total - self.next;
        (left, Some(left))
    }
}

impl ExactSizeIterator for ComboIter<'_> {}

pub fn expand<'a>(cfg: &'a SweepConfig, payoffs: &'a [PayoffPair]) -> ComboIter<'a> {
    ComboIter::new(cfg, payoffs)
}

/// Human-readable sweep identifier. Only the first payoff pair's visitor
/// matrix is named; hawk percentages and the net tremble are not part of it.
pub fn describe(cfg: &SweepConfig, payoffs: &[PayoffPair]) -> String {
    let payoff_str = payoffs
        .first()
        .map(|pair| join_hyphen_f64(&pair.role_a_flat()))
        .unwrap_or_default();
    let bonus_str = join_hyphen_f64(
        &cfg.bonus_vectors()
            .iter()
            .map(|b| b.primary)
            .collect::<Vec<_>>(),
    );
    let flags = |values: &[bool]| join_hyphen(&values.iter().map(|v| u8::from(*v)).collect::<Vec<_>>());

    format!(
        "Pop-{}_Discount-N-{}_S-{}_Tremble-{}_NLS-{}_SLS-{}_SymN-{}_SymS-{}_CopyProb-{}_CopyError-{}_ExpProb-{}_InnovNoise-{}_CoupleFn-{}_P-{}_Bon-{}",
        join_hyphen(&cfg.population),
        join_hyphen_f64(&cfg.net_discount),
        join_hyphen_f64(&cfg.strat_discount),
        join_hyphen_f64(&cfg.strat_tremble),
        join_hyphen_f64(&cfg.net_learning_speed),
        join_hyphen_f64(&cfg.strat_learning_speed),
        flags(&cfg.net_symmetric),
        flags(&cfg.strat_symmetric),
        join_hyphen_f64(&cfg.copy_prob),
        join_hyphen_f64(&cfg.copy_error),
        join_hyphen_f64(&cfg.explore_prob),
        join_hyphen_f64(&cfg.innov_noise),
        cfg.couple_effect,
        payoff_str,
        bonus_str,
    )
}

pub fn data_description(game: &str, description: &str) -> String {
    format!("{game}_{description}")
}

/// Everything derived for one combination: its record and artifacts.
#[derive(Clone, Debug)]
pub struct PreparedCombo {
    pub combo: ParameterCombo,
    pub record: ConfigRecord,
    pub strategy: StrategyMatrix,
    pub artifacts: ArtifactValues,
}

pub fn prepare(
    combo: ParameterCombo,
    cfg: &SweepConfig,
    game: &str,
    out_folder: &str,
    keys: &mut dyn KeyGenerator,
) -> PreparedCombo {
    let strategy = StrategyMatrix::uniform(
        combo.population,
        cfg.total_weight,
        combo.hawk_pct_a,
        combo.hawk_pct_b,
    );
    let record = ConfigRecord {
        base: cfg.base,
        population: combo.population,
        t_max: cfg.t_max,
        net_discount: combo.net_discount,
        strat_discount: combo.strat_discount,
        net_learning_speed: combo.net_learning_speed,
        strat_learning_speed: combo.strat_learning_speed,
        net_symmetric: combo.net_symmetric,
        strat_symmetric: combo.strat_symmetric,
        net_tremble: combo.net_tremble,
        strat_tremble: combo.strat_tremble,
        copy_prob: combo.copy_prob,
        copy_error: combo.copy_error,
        explore_prob: combo.explore_prob,
        innov_noise: combo.innov_noise,
        couple_effect: cfg.couple_effect,
        game: game.to_string(),
        out_folder: out_folder.to_string(),
        key: keys.next_key(),
    };
    let artifacts = ArtifactValues::from_parts(&combo.payoffs, combo.bonus, &strategy);
    PreparedCombo {
        combo,
        record,
        strategy,
        artifacts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::SequentialKeys;
    use crate::payoffs::user_payoffs;

    #[test]
    fn combo_count_is_product_of_axes() {
        let mut cfg = SweepConfig::default();
        cfg.population = vec![20, 50, 200];
        cfg.net_discount = vec![0.0, 0.01];
        cfg.bonus_fractions = vec![0.2, 0.4, 0.6, 0.8];
        let payoffs = vec![user_payoffs(0.4, 0.2), user_payoffs(0.3, 0.1)];
        let iter = expand(&cfg, &payoffs);
        // 2 payoffs * 3 pops * 2 discounts * 2 net speeds * 4 bonuses
        assert_eq!(iter.total(), 96);
        assert_eq!(iter.len(), 96);
        assert_eq!(iter.count(), 96);
    }

    #[test]
    fn last_axis_varies_fastest() {
        let mut cfg = SweepConfig::default();
        cfg.population = vec![20, 40];
        cfg.net_learning_speed = vec![1.0];
        cfg.bonus_fractions = vec![0.1, 0.2];
        let payoffs = vec![user_payoffs(0.4, 0.2)];
        let combos: Vec<_> = expand(&cfg, &payoffs).collect();
        let order: Vec<(u32, f64)> = combos.iter().map(|c| (c.population, c.bonus.primary)).collect();
        assert_eq!(order, vec![(20, 0.1), (20, 0.2), (40, 0.1), (40, 0.2)]);
    }

    #[test]
    fn payoffs_vary_slowest() {
        let cfg = SweepConfig::default();
        let payoffs = vec![user_payoffs(0.4, 0.2), user_payoffs(0.3, 0.1)];
        let combos: Vec<_> = expand(&cfg, &payoffs).collect();
        assert_eq!(combos.len(), 4);
        assert_eq!(combos[0].payoffs, payoffs[0]);
        assert_eq!(combos[1].payoffs, payoffs[0]);
        assert_eq!(combos[1].net_learning_speed, 1.0);
        assert_eq!(combos[2].payoffs, payoffs[1]);
    }

    #[test]
    fn description_for_default_driver() {
        let cfg = SweepConfig::default();
        let payoffs = vec![user_payoffs(0.4, 0.2)];
        let description = describe(&cfg, &payoffs);
        assert_eq!(
            description,
            "Pop-20_Discount-N-0.01_S-0.01_Tremble-0.01_NLS-0-1_SLS-1_SymN-0_SymS-0_CopyProb-0_CopyError-0_ExpProb-0_InnovNoise-0_CoupleFn-Fight_P-0-1-0.4-0.2_Bon-0.6"
        );
        assert_eq!(description, describe(&cfg.clone(), &payoffs));
        assert_eq!(
            data_description("HDInnov", &description),
            format!("HDInnov_{description}")
        );
    }

    #[test]
    fn prepare_fills_record_and_artifacts() {
        let cfg = SweepConfig::default();
        let payoffs = vec![user_payoffs(0.4, 0.2)];
        let combo = expand(&cfg, &payoffs).next().unwrap();
        let mut keys = SequentialKeys::default();
        let prepared = prepare(combo, &cfg, "HDInnov", "HDInnov_x", &mut keys);
        assert_eq!(prepared.record.key, "K0000000");
        assert_eq!(prepared.record.population, 20);
        assert_eq!(prepared.record.out_folder, "HDInnov_x");
        assert_eq!(prepared.strategy.row, [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(prepared.artifacts.strategy.len(), 80);
        assert_eq!(prepared.artifacts.bonus, vec!["0.6", "0.2"]);
    }
}
