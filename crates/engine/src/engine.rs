//! The sheet engine: create, write, read.
//!
//! Holds the frozen registry, the compute model, and nothing mutable — every
//! operation takes the session's `Sheet` explicitly, so one engine instance
//! serves any number of concurrent sessions behind `&self`.
//!
//! # Recompute
//!
//! The computed-parameter order is fixed at construction (topological, ties
//! by registration order). On an input write, exactly the computed
//! parameters whose precedents intersect the changed set are re-evaluated,
//! in that order; propagation stops where a recomputed value equals its
//! previous one. Any error aborts the whole write — the cascade runs on a
//! trial copy and the caller's sheet is only replaced on success.

use std::time::Instant;

use rustc_hash::FxHashMap;

use crate::error::EngineError;
use crate::model::{ComputeModel, ModelError, StandardModel};
use crate::param::{ParamKey, ParamValue, Role};
use crate::recalc::RecalcReport;
use crate::registry::{keys, Derivation, Registry, RegistryError};
use crate::sheet::Sheet;
use crate::tables::TableMiss;

/// Engine construction failed the startup self-check.
#[derive(Debug)]
pub enum BuildError {
    /// The registry declaration set is inconsistent.
    Registry(RegistryError),
    /// A registry Enum domain has no matching reference-table entry.
    Coverage(TableMiss),
}

impl std::fmt::Display for BuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildError::Registry(err) => write!(f, "registry: {}", err),
            BuildError::Coverage(miss) => write!(f, "table coverage: {}", miss),
        }
    }
}

impl std::error::Error for BuildError {}

/// Result of a successful `set_input`.
#[derive(Debug, Clone)]
pub struct WriteOutcome {
    /// Sheet revision after the write.
    pub revision: u64,
    /// Keys whose value changed, in evaluation order. Empty when the write
    /// stored the value the sheet already had.
    pub changed: Vec<ParamKey>,
    pub report: RecalcReport,
}

/// The parameter computation engine.
///
/// `Send + Sync`; share behind `&`. Sheets are owned by their sessions.
pub struct SheetEngine {
    registry: Registry,
    model: Box<dyn ComputeModel>,
}

impl SheetEngine {
    /// Build an engine, running the registry/table coverage self-check.
    pub fn new(registry: Registry, model: Box<dyn ComputeModel>) -> Result<Self, BuildError> {
        model
            .verify_coverage(&registry)
            .map_err(BuildError::Coverage)?;
        Ok(Self { registry, model })
    }

    /// The standard valve sheet over the standard model.
    pub fn standard() -> Result<Self, BuildError> {
        let registry = Registry::standard().map_err(BuildError::Registry)?;
        Self::new(registry, Box::new(StandardModel::new()))
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Initialize a sheet: declared defaults for every input, then every
    /// computed parameter once, in dependency order.
    pub fn create_sheet(&self) -> Result<Sheet, EngineError> {
        let mut sheet = Sheet::new();
        for spec in self.registry.specs() {
            if let Some(default) = &spec.default {
                sheet.set(spec.key, default.clone());
            }
        }
        for &key in self.registry.computed_order() {
            let value = self.compute(&sheet, key)?;
            sheet.set(key, value);
        }
        Ok(sheet)
    }

    /// Validate and store an input value, then recompute its dependents.
    ///
    /// Fails with `RoleError` for computed keys, `ValidationError` for
    /// out-of-domain values, and `LookupError`/`ComputationError` when the
    /// cascade hits a table or formula hole. On any failure the sheet is
    /// untouched.
    pub fn set_input(
        &self,
        sheet: &mut Sheet,
        key: ParamKey,
        value: ParamValue,
    ) -> Result<WriteOutcome, EngineError> {
        self.registry.validate_write(key, &value)?;

        let value_changed = sheet.value(key) != Some(&value);
        let mut trial = sheet.clone();
        trial.set(key, value);

        let report = self.recompute_cascade(&mut trial, value_changed.then_some(key))?;
        if !report.changed.is_empty() {
            trial.bump_revision();
        }

        *sheet = trial;
        Ok(WriteOutcome {
            revision: sheet.revision(),
            changed: report.changed.clone(),
            report,
        })
    }

    /// Current value of a registered parameter.
    pub fn get<'a>(&self, sheet: &'a Sheet, key: ParamKey) -> Result<&'a ParamValue, EngineError> {
        if self.registry.get(key).is_none() {
            return Err(EngineError::UnknownParameter {
                key: key.as_str().to_string(),
            });
        }
        sheet
            .value(key)
            .ok_or_else(|| EngineError::UnknownParameter {
                key: key.as_str().to_string(),
            })
    }

    /// Read-only view of the full sheet, in registration order.
    pub fn snapshot(&self, sheet: &Sheet) -> Vec<(ParamKey, ParamValue)> {
        self.registry
            .all_keys()
            .filter_map(|key| sheet.value(key).map(|v| (key, v.clone())))
            .collect()
    }

    /// Resolve a wire name to its key.
    pub fn resolve(&self, name: &str) -> Result<ParamKey, EngineError> {
        self.registry
            .resolve(name)
            .ok_or_else(|| EngineError::UnknownParameter {
                key: name.to_string(),
            })
    }

    /// Recompute, in the fixed order, every computed parameter whose
    /// precedents intersect the changed set. `seed` is the written input, or
    /// `None` when the write stored an unchanged value.
    fn recompute_cascade(
        &self,
        sheet: &mut Sheet,
        seed: Option<ParamKey>,
    ) -> Result<RecalcReport, EngineError> {
        let start = Instant::now();
        let mut report = RecalcReport::new();

        let mut changed: Vec<ParamKey> = Vec::new();
        if let Some(seed) = seed {
            changed.push(seed);
        }

        let mut depths: FxHashMap<ParamKey, usize> = FxHashMap::default();

        for &key in self.registry.computed_order() {
            let stale = self
                .registry
                .graph()
                .precedents(key)
                .any(|pred| changed.contains(&pred));
            if !stale {
                continue;
            }

            let mut depth = 0;
            for pred in self.registry.graph().precedents(key) {
                depth = depth.max(depths.get(&pred).copied().unwrap_or(0));
            }
            let depth = depth + 1;
            depths.insert(key, depth);
            report.max_depth = report.max_depth.max(depth);

            let value = self.compute(sheet, key)?;
            report.params_recomputed += 1;

            if sheet.value(key) != Some(&value) {
                sheet.set(key, value);
                changed.push(key);
            }
        }

        report.changed = changed;
        report.duration_ms = start.elapsed().as_millis() as u64;
        Ok(report)
    }

    /// Evaluate one computed parameter from the sheet's current values.
    fn compute(&self, sheet: &Sheet, key: ParamKey) -> Result<ParamValue, EngineError> {
        let spec = self
            .registry
            .get(key)
            .ok_or_else(|| EngineError::UnknownParameter {
                key: key.as_str().to_string(),
            })?;
        let derivation = match (spec.role, spec.derivation) {
            (Role::Computed, Some(derivation)) => derivation,
            _ => {
                return Err(EngineError::Computation {
                    key,
                    message: "parameter has no derivation".to_string(),
                })
            }
        };

        let value = match derivation {
            Derivation::TemperatureBand => {
                let max_temp = self.num(sheet, keys::DESIGN_TEMP_MAX, key)?;
                let band = self
                    .model
                    .temperature_band(max_temp)
                    .map_err(|e| keyed(key, e))?;
                ParamValue::text(band)
            }
            Derivation::PressureRating => {
                let class = self.int(sheet, keys::PRESSURE_CLASS, key)?;
                let band = self.text(sheet, keys::TEMPERATURE_BAND, key)?;
                let mpa = self
                    .model
                    .pressure_rating(class, &band)
                    .map_err(|e| keyed(key, e))?;
                ParamValue::number(mpa)
            }
            Derivation::BoreDiameter => {
                let nps = self.text(sheet, keys::NOMINAL_PIPE_SIZE, key)?;
                let mm = self.model.bore_diameter(&nps).map_err(|e| keyed(key, e))?;
                ParamValue::number(mm)
            }
            Derivation::FaceToFace => {
                let nps = self.text(sheet, keys::NOMINAL_PIPE_SIZE, key)?;
                let class = self.int(sheet, keys::PRESSURE_CLASS, key)?;
                let mm = self
                    .model
                    .face_to_face(&nps, class)
                    .map_err(|e| keyed(key, e))?;
                ParamValue::number(mm)
            }
            Derivation::AllowableStress => {
                let material = self.text(sheet, keys::BODY_MATERIAL, key)?;
                let mpa = self
                    .model
                    .allowable_stress(&material)
                    .map_err(|e| keyed(key, e))?;
                ParamValue::number(mpa)
            }
            Derivation::WallThickness => {
                let pressure = self.num(sheet, keys::OPERATING_PRESSURE, key)?;
                let bore = self.num(sheet, keys::BORE_DIAMETER, key)?;
                let stress = self.num(sheet, keys::ALLOWABLE_STRESS, key)?;
                let allowance = self.num(sheet, keys::CORROSION_ALLOWANCE, key)?;
                let mm = self
                    .model
                    .wall_thickness(pressure, bore, stress, allowance)
                    .map_err(|e| keyed(key, e))?;
                ParamValue::number(mm)
            }
        };

        Ok(value)
    }

    fn num(&self, sheet: &Sheet, operand: ParamKey, key: ParamKey) -> Result<f64, EngineError> {
        sheet
            .value(operand)
            .and_then(ParamValue::as_f64)
            .ok_or_else(|| missing_operand(key, operand))
    }

    fn int(&self, sheet: &Sheet, operand: ParamKey, key: ParamKey) -> Result<i64, EngineError> {
        sheet
            .value(operand)
            .and_then(ParamValue::as_i64)
            .ok_or_else(|| missing_operand(key, operand))
    }

    fn text(&self, sheet: &Sheet, operand: ParamKey, key: ParamKey) -> Result<String, EngineError> {
        sheet
            .value(operand)
            .and_then(|v| v.as_text().map(str::to_string))
            .ok_or_else(|| missing_operand(key, operand))
    }
}

fn missing_operand(key: ParamKey, operand: ParamKey) -> EngineError {
    EngineError::Computation {
        key,
        message: format!("operand '{}' is missing or mistyped", operand),
    }
}

fn keyed(key: ParamKey, err: ModelError) -> EngineError {
    match err {
        ModelError::Lookup(miss) => EngineError::Lookup {
            key,
            message: miss.to_string(),
        },
        ModelError::Computation(formula) => EngineError::Computation {
            key,
            message: formula.to_string(),
        },
    }
}
