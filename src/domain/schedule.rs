//! Trading calendar and rebalance schedules.
//!
//! The calendar is Monday-Friday business days with no holiday support,
//! so "last trading day of the month" means the last weekday: a month-end
//! Saturday snaps back to the preceding Friday.

use chrono::{Datelike, Days, Months, NaiveDate, Weekday};
use std::collections::BTreeSet;

use super::error::PortsimError;

pub fn is_trading_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// All trading days in `[start, end]`, ascending.
pub fn trading_days(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut days = Vec::new();
    let mut day = start;
    while day <= end {
        if is_trading_day(day) {
            days.push(day);
        }
        day = match day.succ_opt() {
            Some(d) => d,
            None => break,
        };
    }
    days
}

/// First trading day at or after `date`.
pub fn next_trading_day(mut date: NaiveDate) -> NaiveDate {
    while !is_trading_day(date) {
        date = date.succ_opt().expect("date overflow");
    }
    date
}

/// Last trading day of the month containing `date`.
pub fn last_trading_day_of_month(date: NaiveDate) -> NaiveDate {
    let first_of_month = date.with_day(1).expect("day 1 is always valid");
    let mut last = first_of_month
        .checked_add_months(Months::new(1))
        .and_then(|d| d.checked_sub_days(Days::new(1)))
        .expect("date overflow");
    while !is_trading_day(last) {
        last = last.pred_opt().expect("date underflow");
    }
    last
}

/// Calendar rule deciding which trading days trigger a rebalance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebalanceRule {
    /// A single rebalance on the first trading day of the run.
    BuyAndHold,
    Daily,
    Weekly(Weekday),
    /// Last trading day of each month.
    EndOfMonth,
    /// Every n-th trading day, starting with the first.
    EveryNDays(usize),
}

/// The precomputed set of rebalance dates for a run.
#[derive(Debug, Clone)]
pub struct RebalanceSchedule {
    dates: BTreeSet<NaiveDate>,
}

impl RebalanceSchedule {
    pub fn generate(
        rule: RebalanceRule,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Self, PortsimError> {
        if end < start {
            return Err(PortsimError::config(format!(
                "schedule end date {end} precedes start date {start}"
            )));
        }
        let days = trading_days(start, end);
        let dates: BTreeSet<NaiveDate> = match rule {
            RebalanceRule::BuyAndHold => days.first().copied().into_iter().collect(),
            RebalanceRule::Daily => days.into_iter().collect(),
            RebalanceRule::Weekly(weekday) => {
                if matches!(weekday, Weekday::Sat | Weekday::Sun) {
                    return Err(PortsimError::config(format!(
                        "weekly rebalance weekday {weekday} is not a trading day"
                    )));
                }
                days.into_iter().filter(|d| d.weekday() == weekday).collect()
            }
            RebalanceRule::EndOfMonth => days
                .iter()
                .copied()
                .filter(|d| *d == last_trading_day_of_month(*d))
                .collect(),
            RebalanceRule::EveryNDays(n) => {
                if n == 0 {
                    return Err(PortsimError::config(
                        "rebalance interval must be at least one trading day",
                    ));
                }
                days.into_iter().step_by(n).collect()
            }
        };
        Ok(RebalanceSchedule { dates })
    }

    pub fn is_rebalance_day(&self, date: NaiveDate) -> bool {
        self.dates.contains(&date)
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.dates.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}
