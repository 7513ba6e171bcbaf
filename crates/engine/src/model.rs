//! Compute strategy behind the sheet engine.
//!
//! `ComputeModel` is the swap seam: one method per formula/table. The engine
//! only ever calls through this trait, so the placeholder tables and sizing
//! formulas can be replaced by an accurate engineering model — or a remote
//! compute client — without touching the engine.

use crate::formula::{self, FormulaError};
use crate::param::{ParamValue, Role, ValueType};
use crate::registry::{keys, Derivation, Registry};
use crate::tables::{ReferenceTables, TableMiss, TEMP_BANDS};

/// A model method rejected its inputs.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    /// No table entry for the requested code combination.
    Lookup(TableMiss),
    /// Formula input outside its valid domain.
    Computation(FormulaError),
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelError::Lookup(miss) => write!(f, "{}", miss),
            ModelError::Computation(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for ModelError {}

impl From<TableMiss> for ModelError {
    fn from(miss: TableMiss) -> Self {
        ModelError::Lookup(miss)
    }
}

impl From<FormulaError> for ModelError {
    fn from(err: FormulaError) -> Self {
        ModelError::Computation(err)
    }
}

/// One method per derivation of the sheet.
///
/// Implementations must be deterministic and side-effect-free: identical
/// inputs always produce identical outputs.
pub trait ComputeModel: Send + Sync {
    fn temperature_band(&self, max_temp_c: f64) -> Result<&'static str, ModelError>;
    fn pressure_rating(&self, class: i64, band: &str) -> Result<f64, ModelError>;
    fn bore_diameter(&self, nps: &str) -> Result<f64, ModelError>;
    fn face_to_face(&self, nps: &str, class: i64) -> Result<f64, ModelError>;
    fn allowable_stress(&self, material: &str) -> Result<f64, ModelError>;
    fn wall_thickness(
        &self,
        pressure_mpa: f64,
        bore_mm: f64,
        stress_mpa: f64,
        corrosion_allowance_mm: f64,
    ) -> Result<f64, ModelError>;

    /// Startup self-check: every Enum input combination the registry allows
    /// must resolve. Returns the first hole found.
    fn verify_coverage(&self, registry: &Registry) -> Result<(), TableMiss>;
}

/// The standard model: reference tables plus the formula library.
pub struct StandardModel {
    tables: ReferenceTables,
}

impl StandardModel {
    pub fn new() -> Self {
        Self {
            tables: ReferenceTables::standard(),
        }
    }

    pub fn with_tables(tables: ReferenceTables) -> Self {
        Self { tables }
    }
}

impl Default for StandardModel {
    fn default() -> Self {
        Self::new()
    }
}

impl ComputeModel for StandardModel {
    fn temperature_band(&self, max_temp_c: f64) -> Result<&'static str, ModelError> {
        Ok(formula::temperature_band(max_temp_c)?)
    }

    fn pressure_rating(&self, class: i64, band: &str) -> Result<f64, ModelError> {
        Ok(self.tables.pressure_rating(class, band)?)
    }

    fn bore_diameter(&self, nps: &str) -> Result<f64, ModelError> {
        Ok(self.tables.bore_diameter(nps)?)
    }

    fn face_to_face(&self, nps: &str, class: i64) -> Result<f64, ModelError> {
        Ok(self.tables.face_to_face(nps, class)?)
    }

    fn allowable_stress(&self, material: &str) -> Result<f64, ModelError> {
        Ok(self.tables.allowable_stress(material)?)
    }

    fn wall_thickness(
        &self,
        pressure_mpa: f64,
        bore_mm: f64,
        stress_mpa: f64,
        corrosion_allowance_mm: f64,
    ) -> Result<f64, ModelError> {
        Ok(formula::wall_thickness(
            pressure_mpa,
            bore_mm,
            stress_mpa,
            corrosion_allowance_mm,
        )?)
    }

    fn verify_coverage(&self, registry: &Registry) -> Result<(), TableMiss> {
        // Walk the registry's own Enum domains rather than the table key
        // lists, so a registry/table drift shows up on either side.
        let enum_domain = |key: crate::param::ParamKey| -> Vec<ParamValue> {
            registry
                .get(key)
                .filter(|s| s.role == Role::Input)
                .map(|s| match &s.value_type {
                    ValueType::Enum { allowed } => allowed.clone(),
                    _ => Vec::new(),
                })
                .unwrap_or_default()
        };

        let nps_codes = enum_domain(keys::NOMINAL_PIPE_SIZE);
        let classes = enum_domain(keys::PRESSURE_CLASS);
        let materials = enum_domain(keys::BODY_MATERIAL);

        for spec in registry.specs() {
            match spec.derivation {
                Some(Derivation::PressureRating) => {
                    for class in classes.iter().filter_map(ParamValue::as_i64) {
                        for (band, _) in TEMP_BANDS {
                            self.tables.pressure_rating(class, band)?;
                        }
                    }
                }
                Some(Derivation::BoreDiameter) => {
                    for nps in nps_codes.iter().filter_map(ParamValue::as_text) {
                        self.tables.bore_diameter(nps)?;
                    }
                }
                Some(Derivation::FaceToFace) => {
                    for nps in nps_codes.iter().filter_map(ParamValue::as_text) {
                        for class in classes.iter().filter_map(ParamValue::as_i64) {
                            self.tables.face_to_face(nps, class)?;
                        }
                    }
                }
                Some(Derivation::AllowableStress) => {
                    for material in materials.iter().filter_map(ParamValue::as_text) {
                        self.tables.allowable_stress(material)?;
                    }
                }
                // Pure formulas over numeric inputs; nothing to enumerate
                Some(Derivation::TemperatureBand) | Some(Derivation::WallThickness) | None => {}
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::{ParamKey, ValueType};
    use crate::registry::{ParamSpec, RegistryBuilder};

    #[test]
    fn test_standard_model_covers_standard_registry() {
        let registry = Registry::standard().unwrap();
        let model = StandardModel::new();
        assert!(model.verify_coverage(&registry).is_ok());
    }

    #[test]
    fn test_coverage_detects_registry_table_drift() {
        // A registry that allows an NPS code the tables do not define
        let nps = ParamKey::new("nominal_pipe_size");
        let bore = ParamKey::new("bore_diameter");
        let registry = RegistryBuilder::new()
            .register(ParamSpec::input(
                nps,
                "NPS",
                Some("in"),
                ValueType::Enum {
                    allowed: vec![ParamValue::text("2in"), ParamValue::text("14in")],
                },
                ParamValue::text("2in"),
            ))
            .register(ParamSpec::computed(
                bore,
                "Bore",
                Some("mm"),
                ValueType::Number {
                    min: None,
                    max: None,
                },
                vec![nps],
                Derivation::BoreDiameter,
            ))
            .build()
            .unwrap();

        let model = StandardModel::new();
        let miss = model.verify_coverage(&registry).unwrap_err();
        assert_eq!(miss.table, "bore_diameter");
        assert_eq!(miss.code, "14in");
    }

    #[test]
    fn test_model_delegates_to_tables_and_formulas() {
        let model = StandardModel::new();
        assert_eq!(model.pressure_rating(600, "38C").unwrap(), 10.21);
        assert_eq!(model.bore_diameter("2in").unwrap(), 51.0);
        assert_eq!(model.face_to_face("2in", 600).unwrap(), 295.0);
        assert_eq!(model.temperature_band(150.0).unwrap(), "150C");
        assert_eq!(model.wall_thickness(10.21, 51.0, 248.0, 3.0).unwrap(), 4.07);

        assert!(matches!(
            model.pressure_rating(999, "38C").unwrap_err(),
            ModelError::Lookup(_)
        ));
        assert!(matches!(
            model.wall_thickness(10.0, 51.0, 0.0, 3.0).unwrap_err(),
            ModelError::Computation(_)
        ));
    }
}
