// In crates/strategies/src/ma_crossover.rs

use crate::sma::rolling_mean;
use crate::types::MACrossoverSettings;
use crate::{Error, Result, Strategy};
use core_types::{BarSeries, Signal};
use rust_decimal::Decimal;

/// Simple moving-average crossover strategy.
///
/// A golden cross (short mean rises above the mid mean) is a Buy, a dead
/// cross (short mean falls below the mid mean) is a Sell.
#[derive(Debug, Clone)]
pub struct MACrossover {
    /// The configuration for this strategy instance.
    settings: MACrossoverSettings,
}

impl MACrossover {
    /// Creates a new `MACrossover` strategy instance from its settings.
    ///
    /// Both windows must be at least one bar and the short window must be
    /// strictly smaller than the mid window.
    pub fn new(settings: MACrossoverSettings) -> Result<Self> {
        if settings.short_window == 0 {
            return Err(Error::ZeroWindow { name: "short" });
        }
        if settings.mid_window == 0 {
            return Err(Error::ZeroWindow { name: "mid" });
        }
        if settings.short_window >= settings.mid_window {
            return Err(Error::WindowOrder {
                short: settings.short_window,
                mid: settings.mid_window,
            });
        }
        Ok(Self { settings })
    }

    pub fn settings(&self) -> &MACrossoverSettings {
        &self.settings
    }

    /// Computes the short and mid rolling means, aligned with `series`.
    ///
    /// Means are exact decimals, so equal means compare equal.
    pub fn moving_averages(&self, series: &BarSeries) -> Result<(Vec<Option<Decimal>>, Vec<Option<Decimal>>)> {
        let short = rolling_mean(series.closes(), self.settings.short_window, "short")?.collect::<Result<_>>()?;
        let mid = rolling_mean(series.closes(), self.settings.mid_window, "mid")?.collect::<Result<_>>()?;
        Ok((short, mid))
    }
}

impl Strategy for MACrossover {
    fn name(&self) -> &'static str {
        "ma_crossover"
    }

    fn warmup_bars(&self) -> usize {
        // The first bar that can cross needs a defined mid mean on itself and its predecessor.
        self.settings.mid_window
    }

    fn signals(&self, series: &BarSeries) -> Result<Vec<Signal>> {
        let (short, mid) = self.moving_averages(series)?;
        detect_crossovers(&short, &mid)
    }
}

/// Labels each index with Buy, Sell, or Hold from two aligned rolling means.
///
/// The comparison is strict on the current bar and inclusive on the previous
/// one, so a run of exact ties emits nothing and the cross fires on the first
/// bar where strict inequality resumes. Index 0 and any index whose means (or
/// whose predecessor's means) are absent is Hold.
pub fn detect_crossovers(short: &[Option<Decimal>], mid: &[Option<Decimal>]) -> Result<Vec<Signal>> {
    if short.len() != mid.len() {
        return Err(Error::LengthMismatch {
            short: short.len(),
            mid: mid.len(),
        });
    }

    let mut signals = Vec::with_capacity(short.len());
    if short.is_empty() {
        return Ok(signals);
    }
    signals.push(Signal::Hold);

    for i in 1..short.len() {
        let signal = match (short[i - 1], mid[i - 1], short[i], mid[i]) {
            (Some(prev_short), Some(prev_mid), Some(cur_short), Some(cur_mid)) => {
                if cur_short > cur_mid && prev_short <= prev_mid {
                    Signal::Buy
                } else if cur_short < cur_mid && prev_short >= prev_mid {
                    Signal::Sell
                } else {
                    Signal::Hold
                }
            }
            _ => Signal::Hold,
        };
        signals.push(signal);
    }

    Ok(signals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use core_types::{Bar, ErrorKind};
    use rust_decimal_macros::dec;

    fn series(closes: &[Decimal]) -> BarSeries {
        let start = Utc.with_ymd_and_hms(2024, 3, 20, 0, 0, 0).unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| {
                Bar {
                    open_time: start + Duration::minutes(i as i64),
                    open: close,
                    high: close,
                    low: close,
                    close,
                    volume: Decimal::ONE,
                }
            })
            .collect();
        BarSeries::new(bars).unwrap()
    }

    fn whole(closes: &[i64]) -> Vec<Decimal> {
        closes.iter().map(|&c| Decimal::from(c)).collect()
    }

    fn strategy(short_window: usize, mid_window: usize) -> MACrossover {
        MACrossover::new(MACrossoverSettings { short_window, mid_window }).unwrap()
    }

    #[test]
    fn upward_cross_after_tie_is_a_buy() {
        let short = [None, Some(dec!(1)), Some(dec!(1)), Some(dec!(2))];
        let mid = [None, Some(dec!(1)), Some(dec!(1)), Some(dec!(1))];
        let signals = detect_crossovers(&short, &mid).unwrap();
        assert_eq!(signals, vec![Signal::Hold, Signal::Hold, Signal::Hold, Signal::Buy]);
    }

    #[test]
    fn downward_cross_after_tie_is_a_sell() {
        let short = [Some(dec!(2)), Some(dec!(2)), Some(dec!(1))];
        let mid = [Some(dec!(2)), Some(dec!(2)), Some(dec!(2))];
        let signals = detect_crossovers(&short, &mid).unwrap();
        assert_eq!(signals, vec![Signal::Hold, Signal::Hold, Signal::Sell]);
    }

    #[test]
    fn staying_above_is_not_a_new_cross() {
        let short = [Some(dec!(1)), Some(dec!(3)), Some(dec!(4)), Some(dec!(5))];
        let mid = [Some(dec!(2)), Some(dec!(2)), Some(dec!(2)), Some(dec!(2))];
        let signals = detect_crossovers(&short, &mid).unwrap();
        assert_eq!(signals, vec![Signal::Hold, Signal::Buy, Signal::Hold, Signal::Hold]);
    }

    #[test]
    fn absent_previous_mean_forces_hold() {
        // Would be a cross if the previous mid mean were defined.
        let short = [Some(dec!(1)), Some(dec!(3))];
        let mid = [None, Some(dec!(2))];
        let signals = detect_crossovers(&short, &mid).unwrap();
        assert_eq!(signals, vec![Signal::Hold, Signal::Hold]);
    }

    #[test]
    fn mismatched_lengths_are_an_alignment_error() {
        let err = detect_crossovers(&[Some(dec!(1))], &[Some(dec!(1)), Some(dec!(2))]).unwrap_err();
        assert!(matches!(err, Error::LengthMismatch { short: 1, mid: 2 }));
        assert_eq!(err.kind(), ErrorKind::InputAlignment);
    }

    #[test]
    fn empty_input_gives_no_signals() {
        assert!(detect_crossovers(&[], &[]).unwrap().is_empty());
    }

    #[test]
    fn flat_line_holds_everywhere() {
        let signals = strategy(2, 3).signals(&series(&whole(&[10, 10, 10, 10, 10]))).unwrap();
        assert!(signals.iter().all(|s| *s == Signal::Hold));
    }

    #[test]
    fn golden_cross_is_found_on_the_rebound() {
        let signals = strategy(2, 3).signals(&series(&whole(&[10, 9, 8, 11, 14, 13]))).unwrap();
        assert_eq!(
            signals,
            vec![Signal::Hold, Signal::Hold, Signal::Hold, Signal::Buy, Signal::Hold, Signal::Hold]
        );
    }

    #[test]
    fn series_shorter_than_mid_window_holds() {
        let signals = strategy(2, 5).signals(&series(&whole(&[1, 5, 2, 8]))).unwrap();
        assert_eq!(signals.len(), 4);
        assert!(signals.iter().all(|s| *s == Signal::Hold));
    }

    #[test]
    fn exact_tie_then_fall_is_a_sell() {
        // Bar 3: short (0.3+0.2)/2 = 0.25, mid (0.1+0.4+0.3+0.2)/4 = 0.25.
        // Bar 4: short 0.15 < mid 0.25.
        let bars = series(&[dec!(0.1), dec!(0.4), dec!(0.3), dec!(0.2), dec!(0.1)]);
        let crossover = strategy(2, 4);
        let (short, mid) = crossover.moving_averages(&bars).unwrap();
        assert_eq!(short[3], mid[3]);

        let signals = crossover.signals(&bars).unwrap();
        assert_eq!(signals, vec![Signal::Hold, Signal::Hold, Signal::Hold, Signal::Hold, Signal::Sell]);
    }

    #[test]
    fn exact_tie_then_rise_is_a_buy() {
        // Bar 3: short (0.2+0.3)/2 = 0.25, mid (0.4+0.1+0.2+0.3)/4 = 0.25.
        // Bar 4: short 0.4 > mid 0.275.
        let bars = series(&[dec!(0.4), dec!(0.1), dec!(0.2), dec!(0.3), dec!(0.5)]);
        let crossover = strategy(2, 4);
        let (short, mid) = crossover.moving_averages(&bars).unwrap();
        assert_eq!(short[3], mid[3]);

        let signals = crossover.signals(&bars).unwrap();
        assert_eq!(signals, vec![Signal::Hold, Signal::Hold, Signal::Hold, Signal::Hold, Signal::Buy]);
    }

    #[test]
    fn flat_run_after_noise_holds_until_the_first_tick_up() {
        let mut closes = vec![dec!(0.7), dec!(0.1), dec!(0.9), dec!(0.2), dec!(0.6)];
        closes.extend(std::iter::repeat_n(dec!(0.3), 30));
        closes.push(dec!(0.4));
        let signals = strategy(2, 4).signals(&series(&closes)).unwrap();

        assert_eq!(signals.len(), 36);
        // From bar 8 on both windows sit entirely on the 0.3 run.
        assert!(signals[8..35].iter().all(|s| *s == Signal::Hold));
        assert_eq!(signals[35], Signal::Buy);
    }

    #[test]
    fn window_order_is_a_configuration_error() {
        let err = MACrossover::new(MACrossoverSettings { short_window: 20, mid_window: 20 }).unwrap_err();
        assert!(matches!(err, Error::WindowOrder { short: 20, mid: 20 }));
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn zero_window_is_a_configuration_error() {
        let err = MACrossover::new(MACrossoverSettings { short_window: 0, mid_window: 3 }).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn defaults_match_the_classic_seven_twenty_pair() {
        let settings = MACrossoverSettings::default();
        assert_eq!((settings.short_window, settings.mid_window), (7, 20));
        assert_eq!(MACrossover::new(settings).unwrap().warmup_bars(), 20);
    }
}
