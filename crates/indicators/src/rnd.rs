use crate::error::IndicatorError;
use market_model::{OptionChain, OptionQuote, OptionType};
use rust_decimal::prelude::ToPrimitive;
use statrs::distribution::{ContinuousCDF, FisherSnedecor};

/// Cumulative mass left outside each tail of the price grid.
const TAIL_PROBABILITY: f64 = 0.01;
/// Resolution of the expiry price grid.
const PRICE_STEPS: usize = 500;
/// Contract mids at or below this are quote noise and excluded from spreads.
const NOISE_FLOOR: f64 = 1.0;
/// Upper search limit for the tail bounds.
const MAX_PRICE: f64 = 10_000.0;
/// Tail bounds are located to within this price tolerance.
const BOUND_TOLERANCE: f64 = 0.01;

const DEGREE_CANDIDATES: [f64; 8] = [2.0, 4.0, 8.0, 16.0, 32.0, 64.0, 128.0, 256.0];
const SCALE_STEPS: i32 = 24;
const DEGREE_REFINERS: [f64; 5] = [0.5, 0.75, 1.0, 1.5, 2.0];

/// A risk-neutral distribution of the underlying's price at one expiry,
/// implied by that expiry's option chain.
///
/// The implied cumulative curve is read off bull-spread prices and fitted
/// with a scaled F-distribution; a discrete price grid over the fitted body
/// then prices arbitrary contracts by probability-weighted payoff.
pub struct RndDistribution {
    dist: FisherSnedecor,
    scale: f64,
    strikes: Vec<f64>,
    masses: Vec<f64>,
}

impl RndDistribution {
    /// Fits the distribution to one expiry's chain.
    pub fn fit(chain: &OptionChain) -> Result<Self, IndicatorError> {
        let points = implied_points(chain);
        if points.len() < 3 {
            return Err(IndicatorError::InsufficientData(points.len()));
        }
        let (scale, d1, d2) = fit_parameters(&points)?;
        tracing::debug!("Fitted F-distribution scale {} d1 {} d2 {}", scale, d1, d2);
        let dist = FisherSnedecor::new(d1, d2)
            .map_err(|error| IndicatorError::FitFailed(error.to_string()))?;
        let mut rnd = Self {
            dist,
            scale,
            strikes: Vec::new(),
            masses: Vec::new(),
        };
        rnd.build_grid();
        Ok(rnd)
    }

    /// Fitted probability that the underlying settles at or below `price`.
    pub fn cumulative_probability(&self, price: f64) -> f64 {
        if price <= 0.0 {
            return 0.0;
        }
        self.dist.cdf(price / self.scale)
    }

    /// Probability-weighted dollar profit of buying one contract at mid and
    /// holding it to expiry.
    pub fn expected_return(&self, option: &OptionQuote) -> f64 {
        let strike = option.strike.to_f64().unwrap_or(0.0);
        let premium = option.midprice().to_f64().unwrap_or(0.0);
        let mut total = 0.0;
        for (settle, mass) in self.strikes.iter().zip(&self.masses) {
            if *mass == 0.0 {
                continue;
            }
            let intrinsic = match option.option_type {
                OptionType::Call => (settle - strike).max(0.0),
                OptionType::Put => (strike - settle).max(0.0),
            };
            total += mass * (intrinsic * 100.0 - premium);
        }
        total
    }

    /// Builds the expiry price grid between the 1% tails. Interior masses are
    /// CDF differences between neighboring midpoints; the endpoints carry
    /// none.
    fn build_grid(&mut self) {
        let lower = self.solve_bound(TAIL_PROBABILITY);
        let upper = self.solve_bound(1.0 - TAIL_PROBABILITY);
        let width = (upper - lower) / (PRICE_STEPS - 1) as f64;
        let strikes: Vec<f64> = (0..PRICE_STEPS)
            .map(|step| lower + width * step as f64)
            .collect();
        let mut masses = vec![0.0; PRICE_STEPS];
        for i in 1..PRICE_STEPS - 1 {
            let below = self.cumulative_probability((strikes[i - 1] + strikes[i]) / 2.0);
            let above = self.cumulative_probability((strikes[i] + strikes[i + 1]) / 2.0);
            masses[i] = above - below;
        }
        self.strikes = strikes;
        self.masses = masses;
    }

    /// Price where the fitted cumulative probability crosses `target`,
    /// located by bisection to within a cent.
    fn solve_bound(&self, target: f64) -> f64 {
        let mut low = 0.0;
        let mut high = MAX_PRICE;
        while high - low > BOUND_TOLERANCE {
            let mid = (low + high) / 2.0;
            if self.cumulative_probability(mid) < target {
                low = mid;
            } else {
                high = mid;
            }
        }
        (low + high) / 2.0
    }
}

/// Reads implied cumulative probability points off bull-spread prices.
///
/// For calls, each strike is paired with up to two strikes below it; the
/// spread's price against its width gives the cumulative probability at the
/// strikes' midpoint. Puts mirror the construction with the strikes above.
/// Legs whose contract mid sits at or below the noise floor are skipped.
fn implied_points(chain: &OptionChain) -> Vec<(f64, f64)> {
    let mut points = Vec::new();

    let calls: Vec<&OptionQuote> = chain.calls().collect();
    for i in 1..calls.len() {
        for j in i.saturating_sub(2)..i {
            if let Some(point) = call_spread_point(calls[j], calls[i]) {
                points.push(point);
            }
        }
    }

    let puts: Vec<&OptionQuote> = chain.puts().collect();
    for i in 0..puts.len() {
        for j in (i + 1)..puts.len().min(i + 3) {
            if let Some(point) = put_spread_point(puts[i], puts[j]) {
                points.push(point);
            }
        }
    }

    points
}

fn call_spread_point(low: &OptionQuote, high: &OptionQuote) -> Option<(f64, f64)> {
    let (strike_low, strike_high, mid_low, mid_high, width) = spread_legs(low, high)?;
    let premium = (mid_high - mid_low) / 100.0;
    let cumulative = (premium / width + 1.0).clamp(0.0, 1.0);
    Some(((strike_low + strike_high) / 2.0, cumulative))
}

fn put_spread_point(low: &OptionQuote, high: &OptionQuote) -> Option<(f64, f64)> {
    let (strike_low, strike_high, mid_low, mid_high, width) = spread_legs(low, high)?;
    let premium = (mid_low - mid_high) / 100.0;
    let cumulative = (-premium / width).clamp(0.0, 1.0);
    Some(((strike_low + strike_high) / 2.0, cumulative))
}

fn spread_legs(low: &OptionQuote, high: &OptionQuote) -> Option<(f64, f64, f64, f64, f64)> {
    let mid_low = low.midprice().to_f64()?;
    let mid_high = high.midprice().to_f64()?;
    if mid_low <= NOISE_FLOOR || mid_high <= NOISE_FLOOR {
        return None;
    }
    let strike_low = low.strike.to_f64()?;
    let strike_high = high.strike.to_f64()?;
    let width = strike_high - strike_low;
    if width <= 0.0 {
        return None;
    }
    Some((strike_low, strike_high, mid_low, mid_high, width))
}

/// Least-squares grid search for (scale, d1, d2): a coarse pass over the
/// strike range and doubling degrees of freedom, then a finer pass around
/// the winning cell.
fn fit_parameters(points: &[(f64, f64)]) -> Result<(f64, f64, f64), IndicatorError> {
    let min_strike = points.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
    let max_strike = points.iter().map(|p| p.0).fold(0.0, f64::max);
    let scale_low = 0.5 * min_strike;
    let scale_high = 1.5 * max_strike;

    let mut best: Option<(f64, (f64, f64, f64))> = None;
    for step in 0..=SCALE_STEPS {
        let scale = scale_low + (scale_high - scale_low) * step as f64 / SCALE_STEPS as f64;
        for &d1 in &DEGREE_CANDIDATES {
            for &d2 in &DEGREE_CANDIDATES {
                if let Some(error) = fit_error(points, scale, d1, d2) {
                    if best.map_or(true, |(best_error, _)| error < best_error) {
                        best = Some((error, (scale, d1, d2)));
                    }
                }
            }
        }
    }
    let (coarse_error, (scale, d1, d2)) = best.ok_or_else(|| {
        IndicatorError::FitFailed("no candidate distribution matched the implied curve".to_string())
    })?;

    let span = (scale_high - scale_low) / SCALE_STEPS as f64;
    let mut best_error = coarse_error;
    let mut best_params = (scale, d1, d2);
    for fine in -10..=10 {
        let refined_scale = scale + span * fine as f64 / 10.0;
        if refined_scale <= 0.0 {
            continue;
        }
        for &m1 in &DEGREE_REFINERS {
            for &m2 in &DEGREE_REFINERS {
                let (e1, e2) = (d1 * m1, d2 * m2);
                if e1 < 1.0 || e2 < 1.0 {
                    continue;
                }
                if let Some(error) = fit_error(points, refined_scale, e1, e2) {
                    if error < best_error {
                        best_error = error;
                        best_params = (refined_scale, e1, e2);
                    }
                }
            }
        }
    }
    Ok(best_params)
}

fn fit_error(points: &[(f64, f64)], scale: f64, d1: f64, d2: f64) -> Option<f64> {
    if scale <= 0.0 {
        return None;
    }
    let dist = FisherSnedecor::new(d1, d2).ok()?;
    let mut sum = 0.0;
    for &(strike, observed) in points {
        let residual = dist.cdf(strike / scale) - observed;
        sum += residual * residual;
    }
    sum.is_finite().then_some(sum)
}
