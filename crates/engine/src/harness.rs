//! Test fixtures for engine tests.
//!
//! Provides ready-made engines and a fault-injecting compute model so tests
//! can exercise mid-cascade failure and rollback without hand-building
//! broken reference tables.

use crate::engine::SheetEngine;
use crate::model::{ComputeModel, ModelError, StandardModel};
use crate::registry::Registry;
use crate::tables::{TableMiss, ReferenceTables};

/// Standard registry + standard model.
pub fn standard_engine() -> SheetEngine {
    SheetEngine::standard().unwrap()
}

/// Standard registry over a caller-supplied model.
pub fn engine_with_model(model: Box<dyn ComputeModel>) -> SheetEngine {
    SheetEngine::new(Registry::standard().unwrap(), model).unwrap()
}

/// Standard model that refuses selected requests at evaluation time.
///
/// Coverage verification still passes (the underlying tables are complete);
/// the fault only appears mid-cascade, which is exactly the rollback path
/// under test.
pub struct FlakyModel {
    inner: StandardModel,
    fail_rating_for_class: Option<i64>,
}

impl FlakyModel {
    /// Fail every `pressure_rating` request for the given class.
    pub fn fail_rating_for_class(class: i64) -> Self {
        Self {
            inner: StandardModel::with_tables(ReferenceTables::standard()),
            fail_rating_for_class: Some(class),
        }
    }
}

impl ComputeModel for FlakyModel {
    fn temperature_band(&self, max_temp_c: f64) -> Result<&'static str, ModelError> {
        self.inner.temperature_band(max_temp_c)
    }

    fn pressure_rating(&self, class: i64, band: &str) -> Result<f64, ModelError> {
        if self.fail_rating_for_class == Some(class) {
            return Err(ModelError::Lookup(TableMiss {
                table: "pressure_rating",
                code: format!("({}, {})", class, band),
            }));
        }
        self.inner.pressure_rating(class, band)
    }

    fn bore_diameter(&self, nps: &str) -> Result<f64, ModelError> {
        self.inner.bore_diameter(nps)
    }

    fn face_to_face(&self, nps: &str, class: i64) -> Result<f64, ModelError> {
        self.inner.face_to_face(nps, class)
    }

    fn allowable_stress(&self, material: &str) -> Result<f64, ModelError> {
        self.inner.allowable_stress(material)
    }

    fn wall_thickness(
        &self,
        pressure_mpa: f64,
        bore_mm: f64,
        stress_mpa: f64,
        corrosion_allowance_mm: f64,
    ) -> Result<f64, ModelError> {
        self.inner
            .wall_thickness(pressure_mpa, bore_mm, stress_mpa, corrosion_allowance_mm)
    }

    fn verify_coverage(&self, registry: &Registry) -> Result<(), TableMiss> {
        self.inner.verify_coverage(registry)
    }
}
