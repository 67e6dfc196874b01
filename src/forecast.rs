//! Savings forecast: a small non-seasonal ARIMA with automatic order search.
//!
//! The differencing order comes from repeated KPSS stationarity tests, then
//! every `(p, q)` up to the configured limits is fitted by conditional sum
//! of squares and the best information criterion wins. Everything here is
//! deterministic: the same series and settings always pick the same model.

use std::fmt;

use anyhow::{bail, ensure, Context};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::models::ForecastPoint;

pub const HORIZON: usize = 3;
pub const MIN_HISTORY: usize = 3;

/// 5% critical value of the KPSS level-stationarity statistic.
const KPSS_CRITICAL: f64 = 0.463;
/// Floor on the residual variance (in standardized units) so an exact fit
/// still has a finite likelihood.
const MIN_SIGMA2: f64 = 1e-8;

// ---------------------------------------------------------------------------
// Configuration and results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Criterion {
    #[default]
    Aic,
    Aicc,
    Bic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastSettings {
    pub max_p: usize,
    pub max_d: usize,
    pub max_q: usize,
    /// Upper bound on `p + q`.
    pub max_order: usize,
    pub criterion: Criterion,
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self {
            max_p: 5,
            max_d: 2,
            max_q: 5,
            max_order: 5,
            criterion: Criterion::Aic,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ArimaOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
}

impl fmt::Display for ArimaOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ARIMA({},{},{})", self.p, self.d, self.q)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Forecast {
    pub order: ArimaOrder,
    pub with_constant: bool,
    pub criterion_value: f64,
    pub last_observed: f64,
    pub points: Vec<ForecastPoint>,
}

impl Forecast {
    /// Next month's prediction minus the last observed month.
    pub fn delta_vs_last(&self) -> f64 {
        self.points
            .first()
            .map(|p| p.predicted_savings - self.last_observed)
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ForecastResult {
    Available(Forecast),
    InsufficientHistory { available: usize, required: usize },
    FittingFailed { reason: String },
}

impl ForecastResult {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    /// Human-readable reason when no forecast was produced.
    pub fn unavailable_reason(&self) -> Option<String> {
        match self {
            Self::Available(_) => None,
            Self::InsufficientHistory { available, required } => Some(format!(
                "Need at least {required} months of data to enable the forecast ({available} available)."
            )),
            Self::FittingFailed { reason } => Some(format!("Forecast not available: {reason}")),
        }
    }
}

/// Forecast the next `HORIZON` months of savings.
///
/// Too little history is a normal state, not an error. Any failure to fit
/// or predict is reported as `FittingFailed` instead of propagating.
pub fn forecast_savings(series: &[f64], settings: &ForecastSettings) -> ForecastResult {
    if series.len() < MIN_HISTORY {
        info!(available = series.len(), "not enough monthly history to forecast");
        return ForecastResult::InsufficientHistory {
            available: series.len(),
            required: MIN_HISTORY,
        };
    }
    match auto_arima(series, settings).and_then(|model| model.forecast(series, HORIZON)) {
        Ok(forecast) => {
            info!(order = %forecast.order, constant = forecast.with_constant, "savings forecast ready");
            ForecastResult::Available(forecast)
        }
        Err(e) => {
            warn!(error = %format!("{e:#}"), "savings forecast skipped");
            ForecastResult::FittingFailed {
                reason: format!("{e:#}"),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Series helpers
// ---------------------------------------------------------------------------

fn mean(x: &[f64]) -> f64 {
    x.iter().sum::<f64>() / x.len() as f64
}

fn std_dev(x: &[f64]) -> f64 {
    let m = mean(x);
    (x.iter().map(|v| (v - m).powi(2)).sum::<f64>() / x.len() as f64).sqrt()
}

fn is_constant(x: &[f64]) -> bool {
    let (min, max) = x
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
    let magnitude = min.abs().max(max.abs()).max(1.0);
    max - min <= 1e-9 * magnitude
}

fn difference(x: &[f64]) -> Vec<f64> {
    x.windows(2).map(|w| w[1] - w[0]).collect()
}

/// KPSS level-stationarity statistic with Bartlett-weighted long-run
/// variance. `None` for a series with no variance.
fn kpss_statistic(x: &[f64]) -> Option<f64> {
    let n = x.len();
    let m = mean(x);
    let e: Vec<f64> = x.iter().map(|v| v - m).collect();

    let mut partial = 0.0;
    let mut eta = 0.0;
    for v in &e {
        partial += v;
        eta += partial * partial;
    }
    eta /= (n * n) as f64;

    let lags = ((3.0 * (n as f64).sqrt() / 13.0).floor() as usize).min(n - 1);
    let mut s2 = e.iter().map(|v| v * v).sum::<f64>() / n as f64;
    for l in 1..=lags {
        let weight = 1.0 - l as f64 / (lags as f64 + 1.0);
        let cov: f64 = (l..n).map(|t| e[t] * e[t - l]).sum::<f64>() / n as f64;
        s2 += 2.0 * weight * cov;
    }
    (s2 > 0.0).then(|| eta / s2)
}

/// Number of differences needed before the KPSS test stops rejecting
/// stationarity. Never leaves fewer than `MIN_HISTORY` points.
fn choose_differencing(x: &[f64], max_d: usize) -> usize {
    let mut d = 0;
    let mut current = x.to_vec();
    while d < max_d && current.len() > MIN_HISTORY {
        match kpss_statistic(&current) {
            Some(stat) if stat > KPSS_CRITICAL => {
                debug!(d, stat, "KPSS rejects stationarity; differencing");
                current = difference(&current);
                d += 1;
            }
            _ => break,
        }
    }
    d
}

/// Map unconstrained values to coefficients of a stationary AR polynomial
/// through partial autocorrelations (Durbin-Levinson recursion).
fn partrans(raw: &[f64]) -> Vec<f64> {
    let mut new: Vec<f64> = raw.iter().map(|v| v.tanh()).collect();
    let mut work = new.clone();
    for j in 1..new.len() {
        let a = new[j];
        for k in 0..j {
            work[k] -= a * new[j - k - 1];
        }
        new[..j].copy_from_slice(&work[..j]);
    }
    new
}

// ---------------------------------------------------------------------------
// Nelder-Mead
// ---------------------------------------------------------------------------

/// Derivative-free simplex minimisation. Returns the best point and value.
fn nelder_mead<F>(f: F, x0: &[f64], step: f64, max_iter: usize, tol: f64) -> (Vec<f64>, f64)
where
    F: Fn(&[f64]) -> f64,
{
    let n = x0.len();
    if n == 0 {
        return (Vec::new(), f(x0));
    }

    let mut simplex: Vec<(Vec<f64>, f64)> = Vec::with_capacity(n + 1);
    simplex.push((x0.to_vec(), f(x0)));
    for i in 0..n {
        let mut x = x0.to_vec();
        x[i] += step;
        let fx = f(&x);
        simplex.push((x, fx));
    }

    let blend = |a: &[f64], b: &[f64], t: f64| -> Vec<f64> {
        a.iter().zip(b).map(|(ai, bi)| ai + t * (bi - ai)).collect()
    };

    for _ in 0..max_iter {
        simplex.sort_by(|a, b| a.1.total_cmp(&b.1));
        let best = simplex[0].1;
        let worst = simplex[n].1;
        if (worst - best).abs() <= tol * (1.0 + best.abs()) {
            break;
        }

        let mut centroid = vec![0.0; n];
        for (x, _) in &simplex[..n] {
            for (c, xi) in centroid.iter_mut().zip(x) {
                *c += xi / n as f64;
            }
        }

        let worst_x = simplex[n].0.clone();
        let reflected = blend(&centroid, &worst_x, -1.0);
        let f_reflected = f(&reflected);

        if f_reflected < best {
            let expanded = blend(&centroid, &worst_x, -2.0);
            let f_expanded = f(&expanded);
            simplex[n] = if f_expanded < f_reflected {
                (expanded, f_expanded)
            } else {
                (reflected, f_reflected)
            };
        } else if f_reflected < simplex[n - 1].1 {
            simplex[n] = (reflected, f_reflected);
        } else {
            let (towards, f_towards) = if f_reflected < worst {
                (reflected, f_reflected)
            } else {
                (worst_x, worst)
            };
            let contracted = blend(&centroid, &towards, 0.5);
            let f_contracted = f(&contracted);
            if f_contracted < f_towards {
                simplex[n] = (contracted, f_contracted);
            } else {
                let best_x = simplex[0].0.clone();
                for entry in simplex.iter_mut().skip(1) {
                    let shrunk = blend(&best_x, &entry.0, 0.5);
                    let fs = f(&shrunk);
                    *entry = (shrunk, fs);
                }
            }
        }
    }

    simplex.sort_by(|a, b| a.1.total_cmp(&b.1));
    let (x, fx) = simplex.swap_remove(0);
    (x, fx)
}

// ---------------------------------------------------------------------------
// ARMA on the differenced series
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct ArmaParams {
    phi: Vec<f64>,
    theta: Vec<f64>,
    mu: f64,
}

impl ArmaParams {
    /// Unpack `[raw_phi.., raw_theta.., mu?]`.
    fn from_raw(raw: &[f64], p: usize, q: usize, with_constant: bool) -> Self {
        Self {
            phi: partrans(&raw[..p]),
            theta: partrans(&raw[p..p + q]).into_iter().map(|v| -v).collect(),
            mu: if with_constant { raw[p + q] } else { 0.0 },
        }
    }

    /// Conditional residuals, starting after the first `p` observations
    /// with pre-sample errors set to zero.
    fn residuals(&self, z: &[f64]) -> Vec<f64> {
        let p = self.phi.len();
        let mut e = vec![0.0; z.len()];
        for t in p..z.len() {
            let mut pred = self.mu;
            for (i, phi) in self.phi.iter().enumerate() {
                pred += phi * (z[t - i - 1] - self.mu);
            }
            for (j, theta) in self.theta.iter().enumerate() {
                if t > j {
                    pred += theta * e[t - j - 1];
                }
            }
            e[t] = z[t] - pred;
        }
        e
    }

    fn css(&self, z: &[f64]) -> f64 {
        let p = self.phi.len();
        self.residuals(z)[p..].iter().map(|v| v * v).sum()
    }
}

#[derive(Debug, Clone)]
struct FittedModel {
    order: ArimaOrder,
    with_constant: bool,
    params: ArmaParams,
    /// Scale the differenced series was divided by before fitting.
    scale: f64,
    criterion_value: f64,
}

fn information_criterion(
    criterion: Criterion,
    loglik: f64,
    k: usize,
    n: usize,
) -> anyhow::Result<f64> {
    let (k, n) = (k as f64, n as f64);
    let aic = -2.0 * loglik + 2.0 * k;
    Ok(match criterion {
        Criterion::Aic => aic,
        Criterion::Aicc => {
            ensure!(n - k - 1.0 > 0.0, "too few observations for AICc");
            aic + 2.0 * k * (k + 1.0) / (n - k - 1.0)
        }
        Criterion::Bic => -2.0 * loglik + k * n.ln(),
    })
}

fn fit_candidate(
    w: &[f64],
    scale: f64,
    order: ArimaOrder,
    with_constant: bool,
    criterion: Criterion,
) -> anyhow::Result<FittedModel> {
    let (p, q) = (order.p, order.q);
    let n_used = w.len().saturating_sub(p);
    let k = p + q + usize::from(with_constant) + 1;
    ensure!(
        n_used > k,
        "{} observations cannot support {} parameters",
        n_used,
        k
    );

    let z: Vec<f64> = w.iter().map(|v| v / scale).collect();
    let mut x0 = vec![0.0; p + q];
    if with_constant {
        x0.push(mean(&z));
    }

    let objective = |raw: &[f64]| {
        let sse = ArmaParams::from_raw(raw, p, q, with_constant).css(&z);
        if sse.is_finite() {
            sse
        } else {
            f64::INFINITY
        }
    };
    let (best, sse) = nelder_mead(objective, &x0, 0.1, 400 * (x0.len() + 1), 1e-10);
    ensure!(sse.is_finite(), "objective did not converge");

    let sigma2 = (sse / n_used as f64).max(MIN_SIGMA2);

    let loglik = -0.5 * n_used as f64 * ((2.0 * std::f64::consts::PI * sigma2).ln() + 1.0)
        - n_used as f64 * scale.ln();
    let criterion_value = information_criterion(criterion, loglik, k, n_used)?;
    ensure!(criterion_value.is_finite(), "information criterion is not finite");

    Ok(FittedModel {
        order,
        with_constant,
        params: ArmaParams::from_raw(&best, p, q, with_constant),
        scale,
        criterion_value,
    })
}

/// Search orders up to the configured limits and keep the best fit.
fn auto_arima(series: &[f64], settings: &ForecastSettings) -> anyhow::Result<FittedModel> {
    ensure!(
        series.iter().all(|v| v.is_finite()),
        "series contains non-finite values"
    );
    if is_constant(series) {
        bail!("monthly savings are constant; no model can be fitted");
    }

    let d = choose_differencing(series, settings.max_d);
    let mut w = series.to_vec();
    for _ in 0..d {
        w = difference(&w);
    }
    let sd = std_dev(&w);
    let scale = if sd > 0.0 { sd } else { mean(&w).abs().max(1.0) };
    // Mean (d = 0) or drift (d = 1) is always fitted; never above that.
    let with_constant = d <= 1;
    debug!(d, points = w.len(), scale, with_constant, "fitting on differenced series");

    let mut best: Option<FittedModel> = None;
    let mut tried = 0usize;
    for p in 0..=settings.max_p {
        for q in 0..=settings.max_q {
            if p + q > settings.max_order {
                continue;
            }
            tried += 1;
            let order = ArimaOrder { p, d, q };
            match fit_candidate(&w, scale, order, with_constant, settings.criterion) {
                Ok(model) => {
                    debug!(%order, with_constant, ic = model.criterion_value, "candidate fitted");
                    let better = best
                        .as_ref()
                        .map_or(true, |b| model.criterion_value < b.criterion_value);
                    if better {
                        best = Some(model);
                    }
                }
                Err(e) => debug!(%order, with_constant, error = %e, "candidate skipped"),
            }
        }
    }

    match best {
        Some(model) => Ok(model),
        None => bail!("no candidate model could be fitted ({tried} tried)"),
    }
}

impl FittedModel {
    fn forecast(&self, series: &[f64], horizon: usize) -> anyhow::Result<Forecast> {
        // levels[k] is the series differenced k times
        let mut levels = vec![series.to_vec()];
        for k in 0..self.order.d {
            let next = difference(&levels[k]);
            levels.push(next);
        }
        let z: Vec<f64> = levels[self.order.d].iter().map(|v| v / self.scale).collect();

        let params = &self.params;
        let mut history = z.clone();
        let mut errors = params.residuals(&z);
        let mut preds = Vec::with_capacity(horizon);
        for _ in 0..horizon {
            let t = history.len();
            let mut pred = params.mu;
            for (i, phi) in params.phi.iter().enumerate() {
                pred += phi * (history[t - i - 1] - params.mu);
            }
            for (j, theta) in params.theta.iter().enumerate() {
                pred += theta * errors[t - j - 1];
            }
            history.push(pred);
            errors.push(0.0);
            preds.push(pred * self.scale);
        }

        for level in levels[..self.order.d].iter().rev() {
            let mut prev = *level.last().context("empty series level")?;
            for v in preds.iter_mut() {
                prev += *v;
                *v = prev;
            }
        }

        if preds.iter().any(|v| !v.is_finite()) {
            bail!("{} produced a non-finite prediction", self.order);
        }

        let last_observed = *series.last().context("empty series")?;
        let points = preds
            .into_iter()
            .enumerate()
            .map(|(i, v)| ForecastPoint {
                horizon_index: i + 1,
                label: format!("Month +{}", i + 1),
                predicted_savings: v,
            })
            .collect();

        Ok(Forecast {
            order: self.order,
            with_constant: self.with_constant,
            criterion_value: self.criterion_value,
            last_observed,
            points,
        })
    }
}
