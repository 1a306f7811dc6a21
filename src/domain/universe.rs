//! Asset universes: which assets are tradable on a given date.
//!
//! Two variants: a static membership fixed for the whole run, and a
//! dynamic membership derived lazily from dated add/remove events.
//! `members_at` never reveals assets added after the query date and never
//! retains assets removed before it.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use super::asset::Asset;
use super::error::PortsimError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Membership {
    Added,
    Removed,
}

/// A dated membership change for one asset.
#[derive(Debug, Clone)]
struct MembershipEvent {
    date: NaiveDate,
    change: Membership,
}

#[derive(Debug, Clone)]
pub struct StaticUniverse {
    assets: Vec<Asset>,
}

impl StaticUniverse {
    /// Assets are held sorted by symbol so membership queries are
    /// deterministic.
    pub fn new(mut assets: Vec<Asset>) -> Self {
        assets.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        assets.dedup_by(|a, b| a.symbol == b.symbol);
        StaticUniverse { assets }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DynamicUniverse {
    assets: BTreeMap<String, (Asset, Vec<MembershipEvent>)>,
}

impl DynamicUniverse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an asset joining the universe on `date`.
    pub fn add(&mut self, asset: Asset, date: NaiveDate) {
        let entry = self
            .assets
            .entry(asset.symbol.clone())
            .or_insert_with(|| (asset, Vec::new()));
        entry.1.push(MembershipEvent {
            date,
            change: Membership::Added,
        });
        entry.1.sort_by_key(|e| e.date);
    }

    /// Record an asset leaving the universe on `date`. Unknown symbols are
    /// a configuration error.
    pub fn remove(&mut self, symbol: &str, date: NaiveDate) -> Result<(), PortsimError> {
        match self.assets.get_mut(symbol) {
            Some((_, events)) => {
                events.push(MembershipEvent {
                    date,
                    change: Membership::Removed,
                });
                events.sort_by_key(|e| e.date);
                Ok(())
            }
            None => Err(PortsimError::config(format!(
                "cannot remove unknown asset {symbol} from universe"
            ))),
        }
    }

    fn is_member(events: &[MembershipEvent], date: NaiveDate) -> bool {
        events
            .iter()
            .take_while(|e| e.date <= date)
            .last()
            .is_some_and(|e| e.change == Membership::Added)
    }
}

/// A closed set of universe variants selected at configuration time.
#[derive(Debug, Clone)]
pub enum Universe {
    Static(StaticUniverse),
    Dynamic(DynamicUniverse),
}

impl Universe {
    pub fn fixed(assets: Vec<Asset>) -> Self {
        Universe::Static(StaticUniverse::new(assets))
    }

    /// The assets whose membership window covers `date`, sorted by symbol.
    pub fn members_at(&self, date: NaiveDate) -> Vec<Asset> {
        match self {
            Universe::Static(u) => u.assets.clone(),
            Universe::Dynamic(u) => u
                .assets
                .values()
                .filter(|(_, events)| DynamicUniverse::is_member(events, date))
                .map(|(asset, _)| asset.clone())
                .collect(),
        }
    }

    pub fn contains_at(&self, symbol: &str, date: NaiveDate) -> bool {
        match self {
            Universe::Static(u) => u.assets.iter().any(|a| a.symbol == symbol),
            Universe::Dynamic(u) => u
                .assets
                .get(symbol)
                .is_some_and(|(_, events)| DynamicUniverse::is_member(events, date)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn symbols(members: &[Asset]) -> Vec<&str> {
        members.iter().map(|a| a.symbol.as_str()).collect()
    }

    #[test]
    fn static_universe_is_date_independent() {
        let u = Universe::fixed(vec![Asset::etf("SPY"), Asset::etf("AGG")]);
        assert_eq!(symbols(&u.members_at(date(1990, 1, 1))), ["AGG", "SPY"]);
        assert_eq!(symbols(&u.members_at(date(2030, 1, 1))), ["AGG", "SPY"]);
    }

    #[test]
    fn static_universe_deduplicates_symbols() {
        let u = Universe::fixed(vec![Asset::etf("SPY"), Asset::etf("SPY")]);
        assert_eq!(u.members_at(date(2020, 1, 1)).len(), 1);
    }

    #[test]
    fn dynamic_membership_starts_at_add_date() {
        let mut d = DynamicUniverse::new();
        d.add(Asset::equity("AAPL"), date(2020, 6, 1));
        let u = Universe::Dynamic(d);

        assert!(!u.contains_at("AAPL", date(2020, 5, 29)));
        assert!(u.contains_at("AAPL", date(2020, 6, 1)));
        assert!(u.contains_at("AAPL", date(2021, 1, 1)));
    }

    #[test]
    fn dynamic_membership_ends_at_remove_date() {
        let mut d = DynamicUniverse::new();
        d.add(Asset::equity("LEHM"), date(2000, 1, 3));
        d.remove("LEHM", date(2008, 9, 15)).unwrap();
        let u = Universe::Dynamic(d);

        assert!(u.contains_at("LEHM", date(2008, 9, 12)));
        assert!(!u.contains_at("LEHM", date(2008, 9, 15)));
        assert!(u.members_at(date(2009, 1, 1)).is_empty());
    }

    #[test]
    fn dynamic_readd_after_removal() {
        let mut d = DynamicUniverse::new();
        d.add(Asset::equity("GM"), date(2000, 1, 3));
        d.remove("GM", date(2009, 6, 1)).unwrap();
        d.add(Asset::equity("GM"), date(2010, 11, 18));
        let u = Universe::Dynamic(d);

        assert!(!u.contains_at("GM", date(2010, 1, 4)));
        assert!(u.contains_at("GM", date(2010, 11, 18)));
    }

    #[test]
    fn removing_unknown_symbol_is_config_error() {
        let mut d = DynamicUniverse::new();
        assert!(d.remove("XYZ", date(2020, 1, 1)).is_err());
    }

    #[test]
    fn replay_with_non_decreasing_dates_is_monotonic() {
        let mut d = DynamicUniverse::new();
        d.add(Asset::equity("AAPL"), date(2020, 3, 2));
        let u = Universe::Dynamic(d);

        let mut seen = false;
        let mut day = date(2020, 2, 24);
        while day <= date(2020, 3, 13) {
            let now = u.contains_at("AAPL", day);
            // once visible, never disappears under forward replay
            assert!(!seen || now);
            seen = now;
            day = day.succ_opt().unwrap();
        }
        assert!(seen);
    }
}
