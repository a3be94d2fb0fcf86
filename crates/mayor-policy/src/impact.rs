use mayor_cipher::Decimal;
use rand::Rng;

use crate::record::Impact;

/// Assigns happiness/revenue impact scores when a policy is created.
///
/// Scoring lives outside the core; the lifecycle only records whatever the
/// scorer returns and never recomputes it.
pub trait ImpactScorer: Send + Sync {
    fn score(&self, tax_rate: Decimal, tariff: Decimal) -> Impact;
}

/// Uniform scores in `[-10, 9]` for both axes, ignoring the inputs.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomImpactScorer;

impl ImpactScorer for RandomImpactScorer {
    fn score(&self, _tax_rate: Decimal, _tariff: Decimal) -> Impact {
        let mut rng = rand::thread_rng();
        Impact {
            happiness: rng.gen_range(-10..10),
            revenue: rng.gen_range(-10..10),
        }
    }
}

/// Always returns the same scores.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedImpactScorer(pub Impact);

impl ImpactScorer for FixedImpactScorer {
    fn score(&self, _tax_rate: Decimal, _tariff: Decimal) -> Impact {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_scores_in_range() {
        let scorer = RandomImpactScorer;
        for _ in 0..200 {
            let impact = scorer.score(Decimal::ONE, Decimal::ONE);
            assert!((-10..10).contains(&impact.happiness));
            assert!((-10..10).contains(&impact.revenue));
        }
    }

    #[test]
    fn test_fixed_scorer() {
        let scorer = FixedImpactScorer(Impact {
            happiness: 3,
            revenue: -2,
        });
        let impact = scorer.score(Decimal::ZERO, Decimal::ZERO);
        assert_eq!(impact.happiness, 3);
        assert_eq!(impact.revenue, -2);
    }
}
