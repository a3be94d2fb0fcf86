use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

use crate::error::{CipherError, CipherResult};

/// Adjustments a codec can apply to a ciphertext without revealing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// `v * (1 + p / 100)`
    IncreaseByPercent(Decimal),
    /// `v * (1 - p / 100)`
    DecreaseByPercent(Decimal),
    /// `v * k`
    Scale(Decimal),
}

impl Operation {
    /// Plaintext semantics of the operation.
    ///
    /// Schemes must make `decrypt(compute(c, op)) == op.apply(decrypt(c))`.
    pub fn apply(&self, value: Decimal) -> CipherResult<Decimal> {
        value.checked_mul(self.factor()?).ok_or(CipherError::Overflow)
    }

    /// The multiplier this operation applies.
    pub fn factor(&self) -> CipherResult<Decimal> {
        let hundred = Decimal::from(100);
        match self {
            Operation::IncreaseByPercent(p) => p
                .checked_div(hundred)
                .and_then(|f| Decimal::ONE.checked_add(f))
                .ok_or(CipherError::Overflow),
            Operation::DecreaseByPercent(p) => p
                .checked_div(hundred)
                .and_then(|f| Decimal::ONE.checked_sub(f))
                .ok_or(CipherError::Overflow),
            Operation::Scale(k) => Ok(*k),
        }
    }

    /// Short label, e.g. `increase10%` or `scale2`.
    pub fn label(&self) -> String {
        match self {
            Operation::IncreaseByPercent(p) => format!("increase{}%", p.normalize()),
            Operation::DecreaseByPercent(p) => format!("decrease{}%", p.normalize()),
            Operation::Scale(k) => format!("scale{}", k.normalize()),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Operation {
    type Err = CipherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parse = |num: &str| {
            Decimal::from_str(num)
                .map_err(|_| CipherError::InvalidOperation(format!("bad operand in '{}'", s)))
        };

        if s == "double" {
            return Ok(Operation::Scale(Decimal::from(2)));
        }
        if let Some(p) = s.strip_prefix("increase").and_then(|r| r.strip_suffix('%')) {
            return Ok(Operation::IncreaseByPercent(parse(p)?));
        }
        if let Some(p) = s.strip_prefix("decrease").and_then(|r| r.strip_suffix('%')) {
            return Ok(Operation::DecreaseByPercent(parse(p)?));
        }
        if let Some(k) = s.strip_prefix("scale") {
            return Ok(Operation::Scale(parse(k)?));
        }
        Err(CipherError::InvalidOperation(format!(
            "unknown operation '{}'",
            s
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_increase_by_percent() {
        let op = Operation::IncreaseByPercent(d("10"));
        assert_eq!(op.apply(d("12.5")).unwrap(), d("13.75"));
        assert_eq!(op.apply(d("7.0")).unwrap(), d("7.7"));
    }

    #[test]
    fn test_decrease_and_scale() {
        assert_eq!(
            Operation::DecreaseByPercent(d("10")).apply(d("50")).unwrap(),
            d("45")
        );
        assert_eq!(Operation::Scale(d("2")).apply(d("3.3")).unwrap(), d("6.6"));
    }

    #[test]
    fn test_chained_increase_compounds() {
        let op = Operation::IncreaseByPercent(d("10"));
        let once = op.apply(d("100")).unwrap();
        let twice = op.apply(once).unwrap();
        assert_eq!(twice, d("121"));
        assert_ne!(twice, d("120"));
    }

    #[test]
    fn test_overflow_is_reported() {
        let op = Operation::Scale(Decimal::MAX);
        assert_eq!(op.apply(d("2")), Err(CipherError::Overflow));
    }

    #[test]
    fn test_labels_roundtrip_through_parse() {
        for op in [
            Operation::IncreaseByPercent(d("10")),
            Operation::DecreaseByPercent(d("2.5")),
            Operation::Scale(d("3")),
        ] {
            assert_eq!(op.label().parse::<Operation>().unwrap(), op);
        }
        assert_eq!(Operation::IncreaseByPercent(d("10.0")).label(), "increase10%");
    }

    #[test]
    fn test_parse_legacy_names() {
        assert_eq!(
            "double".parse::<Operation>().unwrap(),
            Operation::Scale(d("2"))
        );
        assert_eq!(
            "increase10%".parse::<Operation>().unwrap(),
            Operation::IncreaseByPercent(d("10"))
        );
        assert!("increase10".parse::<Operation>().is_err());
        assert!("halve".parse::<Operation>().is_err());
        assert!("scalex".parse::<Operation>().is_err());
    }
}
