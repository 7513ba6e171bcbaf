//! Formula library: pure functions over named numeric inputs.
//!
//! Deterministic and side-effect-free. An input combination outside a
//! formula's valid domain is a `FormulaError`, never a silent fallback value.

use crate::tables::TEMP_BANDS;

/// A formula rejected its inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct FormulaError {
    /// Name of the formula that failed.
    pub formula: &'static str,
    pub message: String,
}

impl FormulaError {
    fn new(formula: &'static str, message: impl Into<String>) -> Self {
        Self {
            formula,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FormulaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "formula '{}': {}", self.formula, self.message)
    }
}

impl std::error::Error for FormulaError {}

/// Minimum body wall thickness [mm].
///
/// Barlow-style thin-wall sizing: `t = P·D / (2S − P) + CA`, rounded to two
/// decimals. Fails if allowable stress is non-positive, pressure is negative,
/// or the denominator collapses (pressure at or above twice the stress).
pub fn wall_thickness(
    pressure_mpa: f64,
    bore_mm: f64,
    stress_mpa: f64,
    corrosion_allowance_mm: f64,
) -> Result<f64, FormulaError> {
    if stress_mpa <= 0.0 {
        return Err(FormulaError::new(
            "wall_thickness",
            format!("allowable stress must be positive, got {}", stress_mpa),
        ));
    }
    if pressure_mpa < 0.0 {
        return Err(FormulaError::new(
            "wall_thickness",
            format!("design pressure must not be negative, got {}", pressure_mpa),
        ));
    }
    let denom = 2.0 * stress_mpa - pressure_mpa;
    if denom <= 0.0 {
        return Err(FormulaError::new(
            "wall_thickness",
            format!(
                "pressure {} exceeds the thin-wall limit for stress {}",
                pressure_mpa, stress_mpa
            ),
        ));
    }
    let t = (pressure_mpa * bore_mm) / denom + corrosion_allowance_mm;
    Ok((t * 100.0).round() / 100.0)
}

/// Temperature band code covering a design temperature maximum.
///
/// Returns the coolest band whose bound is at or above the temperature.
/// Fails beyond the hottest defined band.
pub fn temperature_band(max_temp_c: f64) -> Result<&'static str, FormulaError> {
    for (band, bound) in TEMP_BANDS {
        if max_temp_c <= *bound {
            return Ok(*band);
        }
    }
    Err(FormulaError::new(
        "temperature_band",
        format!(
            "design temperature {} exceeds the hottest rated band",
            max_temp_c
        ),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wall_thickness_reference_case() {
        // Class 600 ambient rating over a 2in bore in LF2
        let t = wall_thickness(10.21, 51.0, 248.0, 3.0).unwrap();
        assert_eq!(t, 4.07);
    }

    #[test]
    fn test_wall_thickness_rounds_to_two_decimals() {
        let t = wall_thickness(8.576, 51.0, 248.0, 3.0).unwrap();
        assert_eq!(t, 3.9);
    }

    #[test]
    fn test_wall_thickness_zero_pressure_is_just_allowance() {
        assert_eq!(wall_thickness(0.0, 51.0, 248.0, 3.0).unwrap(), 3.0);
    }

    #[test]
    fn test_wall_thickness_is_deterministic() {
        let a = wall_thickness(15.519, 154.0, 448.5, 6.0).unwrap();
        let b = wall_thickness(15.519, 154.0, 448.5, 6.0).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_wall_thickness_rejects_nonpositive_stress() {
        let err = wall_thickness(10.0, 51.0, 0.0, 3.0).unwrap_err();
        assert_eq!(err.formula, "wall_thickness");
        assert!(err.message.contains("stress"));
        assert!(wall_thickness(10.0, 51.0, -1.0, 3.0).is_err());
    }

    #[test]
    fn test_wall_thickness_rejects_negative_pressure() {
        let err = wall_thickness(-0.1, 51.0, 248.0, 3.0).unwrap_err();
        assert!(err.message.contains("negative"));
    }

    #[test]
    fn test_wall_thickness_rejects_collapsed_denominator() {
        // 2S − P == 0
        let err = wall_thickness(10.0, 51.0, 5.0, 3.0).unwrap_err();
        assert!(err.message.contains("thin-wall limit"));
        assert!(wall_thickness(11.0, 51.0, 5.0, 3.0).is_err());
    }

    #[test]
    fn test_temperature_band_boundaries() {
        assert_eq!(temperature_band(-29.0).unwrap(), "38C");
        assert_eq!(temperature_band(38.0).unwrap(), "38C");
        assert_eq!(temperature_band(38.1).unwrap(), "50C");
        assert_eq!(temperature_band(100.0).unwrap(), "100C");
        assert_eq!(temperature_band(150.0).unwrap(), "150C");
        assert_eq!(temperature_band(151.0).unwrap(), "200C");
        assert_eq!(temperature_band(200.0).unwrap(), "200C");
    }

    #[test]
    fn test_temperature_band_above_hottest_fails() {
        let err = temperature_band(200.5).unwrap_err();
        assert_eq!(err.formula, "temperature_band");
    }
}
