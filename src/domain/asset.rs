//! Tradable asset identity.

/// Broad asset classification. The simulation treats all classes
/// identically for accounting; the class exists so universes and
/// allocation providers can filter on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetClass {
    Equity,
    Etf,
    CashEquivalent,
}

/// A tradable asset. Immutable once referenced by a position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub symbol: String,
    pub class: AssetClass,
}

impl Asset {
    pub fn equity(symbol: impl Into<String>) -> Self {
        Asset {
            symbol: symbol.into(),
            class: AssetClass::Equity,
        }
    }

    pub fn etf(symbol: impl Into<String>) -> Self {
        Asset {
            symbol: symbol.into(),
            class: AssetClass::Etf,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_class() {
        assert_eq!(Asset::equity("AAPL").class, AssetClass::Equity);
        assert_eq!(Asset::etf("SPY").class, AssetClass::Etf);
    }
}
