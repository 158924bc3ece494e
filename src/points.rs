//! Closed-form points estimate from daily trading volume.
//!
//! Rules implemented:
//! - effective volume = daily volume × event multiplier (1x–4x)
//! - daily points = floor(log2(effective / 2)) + 1 once effective >= 2
//! - total points = daily points × 15 (linear 15-day projection)

use thiserror::Error;

const PROJECTION_DAYS: u32 = 15;
const POINTS_THRESHOLD: f64 = 2.0;

/// Event volume multiplier. Upstream campaigns only ever run 1x-4x.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Multiplier {
    X1,
    X2,
    X3,
    X4,
}

impl Multiplier {
    pub fn factor(self) -> f64 {
        match self {
            Self::X1 => 1.0,
            Self::X2 => 2.0,
            Self::X3 => 3.0,
            Self::X4 => 4.0,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum PointsError {
    #[error("invalid or non-positive volume: {0:?}")]
    InvalidVolume(String),
    #[error("unsupported multiplier: {0}")]
    UnsupportedMultiplier(String),
}

/// One settled estimate. Superseded wholesale by the next calculation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalculationResult {
    pub daily_points: u32,
    pub total_points: u32,
    pub effective_volume: f64,
}

pub fn parse_multiplier(input: &str) -> Result<Multiplier, PointsError> {
    match input.trim() {
        "1" => Ok(Multiplier::X1),
        "2" => Ok(Multiplier::X2),
        "3" => Ok(Multiplier::X3),
        "4" => Ok(Multiplier::X4),
        other => Err(PointsError::UnsupportedMultiplier(other.to_string())),
    }
}

/// Estimate points for a daily USD trading volume given as free-form text.
///
/// The input must parse fully as a positive decimal number; there is no
/// upper bound. `f64::log2` keeps exact powers of two on the integer
/// boundary, so an effective volume of exactly 2, 4, 8, ... always lands
/// on the next step.
pub fn calculate(
    daily_volume_input: &str,
    multiplier: Multiplier,
) -> Result<CalculationResult, PointsError> {
    let trimmed = daily_volume_input.trim();
    let daily_volume: f64 = trimmed
        .parse()
        .map_err(|_| PointsError::InvalidVolume(trimmed.to_string()))?;

    if !daily_volume.is_finite() || daily_volume <= 0.0 {
        return Err(PointsError::InvalidVolume(trimmed.to_string()));
    }

    let effective_volume = daily_volume * multiplier.factor();

    let daily_points = if effective_volume < POINTS_THRESHOLD {
        0
    } else {
        (effective_volume / POINTS_THRESHOLD).log2().floor() as u32 + 1
    };

    Ok(CalculationResult {
        daily_points,
        total_points: daily_points.saturating_mul(PROJECTION_DAYS),
        effective_volume,
    })
}
