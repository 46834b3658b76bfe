//! OHLCV bar representation and bar intervals.

use chrono::{DateTime, Duration, Utc};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Sort bars ascending by timestamp and drop duplicate timestamps, keeping
/// the last occurrence in input order.
pub fn normalize_bars(mut bars: Vec<Bar>) -> Vec<Bar> {
    // Stable sort keeps input order among equal timestamps.
    bars.sort_by_key(|b| b.timestamp);
    let mut out: Vec<Bar> = Vec::with_capacity(bars.len());
    for bar in bars {
        match out.last_mut() {
            Some(last) if last.timestamp == bar.timestamp => *last = bar,
            _ => out.push(bar),
        }
    }
    out
}

/// Bar aggregation interval such as `1h`, `15m` or `1d`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Interval {
    pub count: u32,
    pub unit: IntervalUnit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntervalUnit {
    Second,
    Minute,
    Hour,
    Day,
    Week,
}

impl IntervalUnit {
    fn seconds(self) -> i64 {
        match self {
            IntervalUnit::Second => 1,
            IntervalUnit::Minute => 60,
            IntervalUnit::Hour => 3_600,
            IntervalUnit::Day => 86_400,
            IntervalUnit::Week => 604_800,
        }
    }

    fn suffix(self) -> char {
        match self {
            IntervalUnit::Second => 's',
            IntervalUnit::Minute => 'm',
            IntervalUnit::Hour => 'h',
            IntervalUnit::Day => 'd',
            IntervalUnit::Week => 'w',
        }
    }
}

const SECONDS_PER_YEAR: f64 = 365.0 * 86_400.0;

impl Interval {
    pub fn duration(&self) -> Duration {
        // u32 counts of at most a week always fit in a TimeDelta.
        Duration::try_seconds(self.unit.seconds() * i64::from(self.count)).unwrap_or(Duration::MAX)
    }

    /// Time covered by `bars` consecutive intervals, `None` on overflow.
    pub fn span(&self, bars: usize) -> Option<Duration> {
        let bars = i32::try_from(bars).ok()?;
        self.duration().checked_mul(bars)
    }

    /// Timestamp `bars` intervals before `end`, `None` when it falls outside
    /// the representable date range.
    pub fn steps_before(&self, end: DateTime<Utc>, bars: usize) -> Option<DateTime<Utc>> {
        end.checked_sub_signed(self.span(bars)?)
    }

    /// Number of bars in a calendar year, used to annualise per-bar returns.
    pub fn periods_per_year(&self) -> f64 {
        SECONDS_PER_YEAR / self.duration().num_seconds() as f64
    }
}

impl FromStr for Interval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let Some(suffix) = s.chars().last() else {
            return Err("empty interval".to_string());
        };
        let unit = match suffix {
            's' => IntervalUnit::Second,
            'm' => IntervalUnit::Minute,
            'h' | 'H' => IntervalUnit::Hour,
            'd' | 'D' => IntervalUnit::Day,
            'w' | 'W' => IntervalUnit::Week,
            other => return Err(format!("unknown interval unit '{other}'")),
        };
        let digits = &s[..s.len() - suffix.len_utf8()];
        let count: u32 = if digits.is_empty() {
            1
        } else {
            digits
                .parse()
                .map_err(|_| format!("invalid interval count '{digits}'"))?
        };
        if count == 0 {
            return Err("interval count must be positive".to_string());
        }
        Ok(Interval { count, unit })
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.count, self.unit.suffix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn bar_at(hour: u32, close: f64) -> Bar {
        Bar {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 10.0,
        }
    }

    #[test]
    fn span_and_steps_before() {
        let hourly: Interval = "1h".parse().unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(hourly.span(3), Some(Duration::hours(3)));
        assert_eq!(
            hourly.steps_before(end, 12),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn steps_before_out_of_range_is_none() {
        let huge: Interval = "100000000w".parse().unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert!(huge.steps_before(end, 9).is_none());
        let weekly: Interval = "1000w".parse().unwrap();
        assert!(weekly.steps_before(end, 19_999).is_none());
        assert!(weekly.span(usize::MAX).is_none());
    }

    #[test]
    fn normalize_sorts_and_keeps_last_duplicate() {
        let bars = vec![bar_at(2, 3.0), bar_at(0, 1.0), bar_at(2, 4.0), bar_at(1, 2.0)];
        let out = normalize_bars(bars);
        let closes: Vec<f64> = out.iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![1.0, 2.0, 4.0]);
    }

    #[test]
    fn parse_common_intervals() {
        assert_eq!("1h".parse::<Interval>().unwrap().duration(), Duration::hours(1));
        assert_eq!("15m".parse::<Interval>().unwrap().duration(), Duration::minutes(15));
        assert_eq!("1d".parse::<Interval>().unwrap().duration(), Duration::days(1));
        assert_eq!("1w".parse::<Interval>().unwrap().duration(), Duration::weeks(1));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("".parse::<Interval>().is_err());
        assert!("1y".parse::<Interval>().is_err());
        assert!("xh".parse::<Interval>().is_err());
        assert!("0h".parse::<Interval>().is_err());
    }

    #[test]
    fn periods_per_year_daily() {
        let daily: Interval = "1d".parse().unwrap();
        assert!((daily.periods_per_year() - 365.0).abs() < 1e-9);
    }

    #[test]
    fn display_round_trips_text() {
        let iv: Interval = "4h".parse().unwrap();
        assert_eq!(iv.to_string(), "4h");
    }
}
