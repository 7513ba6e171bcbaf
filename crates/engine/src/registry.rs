//! Parameter registry: every parameter's identity, role, constraints,
//! dependencies, and derivation.
//!
//! Built once at process start via `RegistryBuilder` and immutable for the
//! process lifetime. Construction fails fast on any inconsistency — duplicate
//! keys, dangling dependencies, role/derivation mismatches, defaults outside
//! their own domain, or a dependency cycle. Write-boundary validation lives
//! here, not in the sheet engine.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::dep_graph::DepGraph;
use crate::error::EngineError;
use crate::param::{ParamKey, ParamValue, Role, ValueType};
use crate::recalc::CycleReport;
use crate::tables::{NPS_CODES, PRESSURE_CLASSES, TEMP_BANDS};

/// Well-known keys of the standard valve sheet.
pub mod keys {
    use crate::param::ParamKey;

    pub const NOMINAL_PIPE_SIZE: ParamKey = ParamKey::new("nominal_pipe_size");
    pub const PRESSURE_CLASS: ParamKey = ParamKey::new("pressure_class");
    pub const DESIGN_TEMP_MIN: ParamKey = ParamKey::new("design_temp_min");
    pub const DESIGN_TEMP_MAX: ParamKey = ParamKey::new("design_temp_max");
    pub const CORROSION_ALLOWANCE: ParamKey = ParamKey::new("corrosion_allowance");
    pub const BODY_MATERIAL: ParamKey = ParamKey::new("body_material");
    pub const BALL_SEAT_MATERIAL: ParamKey = ParamKey::new("ball_seat_material");
    pub const STEM_MATERIAL: ParamKey = ParamKey::new("stem_material");
    pub const BOLTS_MATERIAL: ParamKey = ParamKey::new("bolts_material");
    pub const FLANGE_ENDS: ParamKey = ParamKey::new("flange_ends");
    pub const TEMPERATURE_BAND: ParamKey = ParamKey::new("temperature_band");
    pub const OPERATING_PRESSURE: ParamKey = ParamKey::new("operating_pressure");
    pub const BORE_DIAMETER: ParamKey = ParamKey::new("bore_diameter");
    pub const FACE_TO_FACE: ParamKey = ParamKey::new("face_to_face");
    pub const ALLOWABLE_STRESS: ParamKey = ParamKey::new("allowable_stress");
    pub const WALL_THICKNESS: ParamKey = ParamKey::new("wall_thickness");
}

/// Which compute-model method produces a computed parameter's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Derivation {
    TemperatureBand,
    PressureRating,
    BoreDiameter,
    FaceToFace,
    AllowableStress,
    WallThickness,
}

/// Declaration of one sheet parameter.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub key: ParamKey,
    /// Display label; presentation-facing only.
    pub label: &'static str,
    /// Display unit; presentation-facing only.
    pub unit: Option<&'static str>,
    pub role: Role,
    pub value_type: ValueType,
    /// Initial value. Required for inputs, forbidden for computed parameters.
    pub default: Option<ParamValue>,
    /// Parameters this value is derived from. Empty for inputs.
    pub dependencies: Vec<ParamKey>,
    /// Required for computed parameters, forbidden for inputs.
    pub derivation: Option<Derivation>,
}

impl ParamSpec {
    /// Declare an input parameter.
    pub fn input(
        key: ParamKey,
        label: &'static str,
        unit: Option<&'static str>,
        value_type: ValueType,
        default: ParamValue,
    ) -> Self {
        Self {
            key,
            label,
            unit,
            role: Role::Input,
            value_type,
            default: Some(default),
            dependencies: Vec::new(),
            derivation: None,
        }
    }

    /// Declare a computed parameter.
    pub fn computed(
        key: ParamKey,
        label: &'static str,
        unit: Option<&'static str>,
        value_type: ValueType,
        dependencies: Vec<ParamKey>,
        derivation: Derivation,
    ) -> Self {
        Self {
            key,
            label,
            unit,
            role: Role::Computed,
            value_type,
            default: None,
            dependencies,
            derivation: Some(derivation),
        }
    }
}

/// A registry declaration the builder refused.
#[derive(Debug, Clone)]
pub enum RegistryError {
    DuplicateKey(ParamKey),
    UnknownDependency { key: ParamKey, dependency: ParamKey },
    InputWithDependencies(ParamKey),
    InputWithDerivation(ParamKey),
    MissingDefault(ParamKey),
    DefaultOutsideDomain { key: ParamKey, message: String },
    ComputedWithDefault(ParamKey),
    ComputedWithoutDerivation(ParamKey),
    Cycle(CycleReport),
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::DuplicateKey(key) => {
                write!(f, "parameter '{}' registered twice", key)
            }
            RegistryError::UnknownDependency { key, dependency } => {
                write!(f, "parameter '{}' depends on unregistered '{}'", key, dependency)
            }
            RegistryError::InputWithDependencies(key) => {
                write!(f, "input parameter '{}' declares dependencies", key)
            }
            RegistryError::InputWithDerivation(key) => {
                write!(f, "input parameter '{}' declares a derivation", key)
            }
            RegistryError::MissingDefault(key) => {
                write!(f, "input parameter '{}' has no default", key)
            }
            RegistryError::DefaultOutsideDomain { key, message } => {
                write!(f, "default for '{}' violates its own domain: {}", key, message)
            }
            RegistryError::ComputedWithDefault(key) => {
                write!(f, "computed parameter '{}' declares a default", key)
            }
            RegistryError::ComputedWithoutDerivation(key) => {
                write!(f, "computed parameter '{}' has no derivation", key)
            }
            RegistryError::Cycle(report) => write!(f, "{}", report),
        }
    }
}

impl std::error::Error for RegistryError {}

/// Accumulates `ParamSpec`s; all cross-parameter checks run in `build`.
#[derive(Default)]
pub struct RegistryBuilder {
    specs: Vec<ParamSpec>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one parameter. Order of calls is the registry's stable order.
    pub fn register(mut self, spec: ParamSpec) -> Self {
        self.specs.push(spec);
        self
    }

    /// Validate the full declaration set and freeze it.
    pub fn build(self) -> Result<Registry, RegistryError> {
        let mut index: FxHashMap<&'static str, usize> = FxHashMap::default();
        for (i, spec) in self.specs.iter().enumerate() {
            if index.insert(spec.key.as_str(), i).is_some() {
                return Err(RegistryError::DuplicateKey(spec.key));
            }
        }

        for spec in &self.specs {
            match spec.role {
                Role::Input => {
                    if !spec.dependencies.is_empty() {
                        return Err(RegistryError::InputWithDependencies(spec.key));
                    }
                    if spec.derivation.is_some() {
                        return Err(RegistryError::InputWithDerivation(spec.key));
                    }
                    let default = spec
                        .default
                        .as_ref()
                        .ok_or(RegistryError::MissingDefault(spec.key))?;
                    spec.value_type.check(default).map_err(|message| {
                        RegistryError::DefaultOutsideDomain {
                            key: spec.key,
                            message,
                        }
                    })?;
                }
                Role::Computed => {
                    if spec.default.is_some() {
                        return Err(RegistryError::ComputedWithDefault(spec.key));
                    }
                    if spec.derivation.is_none() {
                        return Err(RegistryError::ComputedWithoutDerivation(spec.key));
                    }
                    for dep in &spec.dependencies {
                        if !index.contains_key(dep.as_str()) {
                            return Err(RegistryError::UnknownDependency {
                                key: spec.key,
                                dependency: *dep,
                            });
                        }
                    }
                }
            }
        }

        let mut graph = DepGraph::new();
        for spec in &self.specs {
            if spec.role == Role::Computed {
                let preds: FxHashSet<ParamKey> = spec.dependencies.iter().copied().collect();
                graph.replace_edges(spec.key, preds);
            }
        }

        let registration: Vec<ParamKey> = self.specs.iter().map(|s| s.key).collect();
        let computed_order = graph
            .topo_order(&registration)
            .map_err(RegistryError::Cycle)?;

        Ok(Registry {
            specs: self.specs,
            index,
            graph,
            computed_order,
        })
    }
}

/// The frozen parameter registry.
///
/// Read-only after `build`; safe to share across concurrent sessions.
#[derive(Debug)]
pub struct Registry {
    specs: Vec<ParamSpec>,
    index: FxHashMap<&'static str, usize>,
    graph: DepGraph,
    /// Computed parameters in dependency order, ties broken by registration.
    computed_order: Vec<ParamKey>,
}

impl Registry {
    /// Spec for a key, if registered.
    pub fn get(&self, key: ParamKey) -> Option<&ParamSpec> {
        self.index.get(key.as_str()).map(|&i| &self.specs[i])
    }

    /// Resolve a wire name to its key.
    pub fn resolve(&self, name: &str) -> Option<ParamKey> {
        self.index.get(name).map(|&i| self.specs[i].key)
    }

    /// All keys in registration order.
    pub fn all_keys(&self) -> impl Iterator<Item = ParamKey> + '_ {
        self.specs.iter().map(|s| s.key)
    }

    /// All specs in registration order.
    pub fn specs(&self) -> impl Iterator<Item = &ParamSpec> {
        self.specs.iter()
    }

    /// Computed parameters in deterministic recompute order.
    pub fn computed_order(&self) -> &[ParamKey] {
        &self.computed_order
    }

    pub fn graph(&self) -> &DepGraph {
        &self.graph
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Gate an input write: role first, then type/domain.
    pub fn validate_write(&self, key: ParamKey, value: &ParamValue) -> Result<(), EngineError> {
        let spec = self.get(key).ok_or_else(|| EngineError::UnknownParameter {
            key: key.as_str().to_string(),
        })?;
        if spec.role != Role::Input {
            return Err(EngineError::Role {
                key,
                message: "computed parameters are not writable".to_string(),
            });
        }
        spec.value_type
            .check(value)
            .map_err(|message| EngineError::Validation { key, message })
    }

    /// The standard trunnion ball valve data sheet, top-to-bottom in the
    /// order the sheet displays it.
    pub fn standard() -> Result<Self, RegistryError> {
        use keys::*;

        let nps_domain = ValueType::Enum {
            allowed: NPS_CODES.iter().map(|c| ParamValue::text(*c)).collect(),
        };
        let class_domain = ValueType::Enum {
            allowed: PRESSURE_CLASSES
                .iter()
                .map(|c| ParamValue::Integer(*c))
                .collect(),
        };
        let band_domain = ValueType::Enum {
            allowed: TEMP_BANDS
                .iter()
                .map(|(band, _)| ParamValue::text(*band))
                .collect(),
        };
        let material_domain = ValueType::Enum {
            allowed: [
                "ASTM A105N",
                "ASTM A350 LF2 CL.1",
                "ASTM A182 F316",
                "ASTM A182 F316L",
                "ASTM A182 F304",
                "ASTM A182 F304L",
                "ASTM A182 F51",
                "ASTM A182 F53/55",
                "ASTM A182 F6NM",
                "ASTM B564 UNS N06625",
            ]
            .iter()
            .map(|m| ParamValue::text(*m))
            .collect(),
        };

        RegistryBuilder::new()
            .register(ParamSpec::input(
                NOMINAL_PIPE_SIZE,
                "Nominal Pipe Size (NPS)",
                Some("in"),
                nps_domain,
                ParamValue::text("2in"),
            ))
            .register(ParamSpec::input(
                PRESSURE_CLASS,
                "ASME Class",
                None,
                class_domain,
                ParamValue::Integer(600),
            ))
            .register(ParamSpec::input(
                DESIGN_TEMP_MIN,
                "Design Temperature Min",
                Some("°C"),
                ValueType::Number {
                    min: Some(-196.0),
                    max: Some(100.0),
                },
                ParamValue::number(-29.0),
            ))
            .register(ParamSpec::input(
                DESIGN_TEMP_MAX,
                "Design Temperature Max",
                Some("°C"),
                ValueType::Number {
                    min: Some(-29.0),
                    max: Some(200.0),
                },
                ParamValue::number(150.0),
            ))
            .register(ParamSpec::input(
                CORROSION_ALLOWANCE,
                "Corrosion Allowance CA",
                Some("mm"),
                ValueType::Number {
                    min: Some(0.0),
                    max: Some(12.0),
                },
                ParamValue::number(3.0),
            ))
            .register(ParamSpec::input(
                BODY_MATERIAL,
                "Body / Closure Material",
                None,
                material_domain,
                ParamValue::text("ASTM A350 LF2 CL.1"),
            ))
            .register(ParamSpec::input(
                BALL_SEAT_MATERIAL,
                "Ball / Seat Material",
                None,
                ValueType::Text,
                ParamValue::text("ASTM A479 UNS S31600"),
            ))
            .register(ParamSpec::input(
                STEM_MATERIAL,
                "Stem Material",
                None,
                ValueType::Text,
                ParamValue::text("ASTM A479 UNS S31803"),
            ))
            .register(ParamSpec::input(
                BOLTS_MATERIAL,
                "Bolts Material",
                None,
                ValueType::Text,
                ParamValue::text("ASTM A193 B7M / ASTM A194 2HM"),
            ))
            .register(ParamSpec::input(
                FLANGE_ENDS,
                "Flange Ends",
                None,
                ValueType::Text,
                ParamValue::text("RTJ"),
            ))
            .register(ParamSpec::computed(
                TEMPERATURE_BAND,
                "Rating Temperature Band",
                None,
                band_domain,
                vec![DESIGN_TEMP_MAX],
                Derivation::TemperatureBand,
            ))
            .register(ParamSpec::computed(
                OPERATING_PRESSURE,
                "Operating Pressure",
                Some("MPa"),
                ValueType::Number {
                    min: None,
                    max: None,
                },
                vec![PRESSURE_CLASS, TEMPERATURE_BAND],
                Derivation::PressureRating,
            ))
            .register(ParamSpec::computed(
                BORE_DIAMETER,
                "Bore Diameter",
                Some("mm"),
                ValueType::Number {
                    min: None,
                    max: None,
                },
                vec![NOMINAL_PIPE_SIZE],
                Derivation::BoreDiameter,
            ))
            .register(ParamSpec::computed(
                FACE_TO_FACE,
                "Face to Face",
                Some("mm"),
                ValueType::Number {
                    min: None,
                    max: None,
                },
                vec![NOMINAL_PIPE_SIZE, PRESSURE_CLASS],
                Derivation::FaceToFace,
            ))
            .register(ParamSpec::computed(
                ALLOWABLE_STRESS,
                "Allowable Stress S",
                Some("MPa"),
                ValueType::Number {
                    min: None,
                    max: None,
                },
                vec![BODY_MATERIAL],
                Derivation::AllowableStress,
            ))
            .register(ParamSpec::computed(
                WALL_THICKNESS,
                "Body Wall Thickness",
                Some("mm"),
                ValueType::Number {
                    min: None,
                    max: None,
                },
                vec![
                    OPERATING_PRESSURE,
                    BORE_DIAMETER,
                    ALLOWABLE_STRESS,
                    CORROSION_ALLOWANCE,
                ],
                Derivation::WallThickness,
            ))
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number_input(key: ParamKey) -> ParamSpec {
        ParamSpec::input(
            key,
            "n",
            None,
            ValueType::Number {
                min: None,
                max: None,
            },
            ParamValue::number(0.0),
        )
    }

    #[test]
    fn test_standard_registry_shape() {
        let registry = Registry::standard().unwrap();
        assert_eq!(registry.len(), 16);

        let keys: Vec<&str> = registry.all_keys().map(|k| k.as_str()).collect();
        assert_eq!(keys[0], "nominal_pipe_size");
        assert_eq!(keys[1], "pressure_class");
        assert_eq!(keys[10], "temperature_band");
        assert_eq!(keys[15], "wall_thickness");

        let inputs = registry
            .specs()
            .filter(|s| s.role == Role::Input)
            .count();
        assert_eq!(inputs, 10);
        assert_eq!(registry.computed_order().len(), 6);
    }

    #[test]
    fn test_standard_computed_order_respects_dependencies() {
        let registry = Registry::standard().unwrap();
        let order = registry.computed_order();
        let pos = |key: ParamKey| order.iter().position(|&k| k == key).unwrap();

        assert!(pos(keys::TEMPERATURE_BAND) < pos(keys::OPERATING_PRESSURE));
        assert!(pos(keys::OPERATING_PRESSURE) < pos(keys::WALL_THICKNESS));
        assert!(pos(keys::BORE_DIAMETER) < pos(keys::WALL_THICKNESS));
        assert!(pos(keys::ALLOWABLE_STRESS) < pos(keys::WALL_THICKNESS));
    }

    #[test]
    fn test_resolve() {
        let registry = Registry::standard().unwrap();
        assert_eq!(registry.resolve("face_to_face"), Some(keys::FACE_TO_FACE));
        assert_eq!(registry.resolve("bogus"), None);
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let a = ParamKey::new("a");
        let err = RegistryBuilder::new()
            .register(number_input(a))
            .register(number_input(a))
            .build()
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateKey(k) if k == a));
    }

    #[test]
    fn test_unknown_dependency_rejected() {
        let a = ParamKey::new("a");
        let err = RegistryBuilder::new()
            .register(ParamSpec::computed(
                a,
                "a",
                None,
                ValueType::Number {
                    min: None,
                    max: None,
                },
                vec![ParamKey::new("ghost")],
                Derivation::BoreDiameter,
            ))
            .build()
            .unwrap_err();
        assert!(matches!(err, RegistryError::UnknownDependency { .. }));
    }

    #[test]
    fn test_input_with_dependencies_rejected() {
        let a = ParamKey::new("a");
        let b = ParamKey::new("b");
        let mut spec = number_input(b);
        spec.dependencies = vec![a];
        let err = RegistryBuilder::new()
            .register(number_input(a))
            .register(spec)
            .build()
            .unwrap_err();
        assert!(matches!(err, RegistryError::InputWithDependencies(k) if k == b));
    }

    #[test]
    fn test_default_outside_domain_rejected() {
        let a = ParamKey::new("a");
        let err = RegistryBuilder::new()
            .register(ParamSpec::input(
                a,
                "a",
                None,
                ValueType::Enum {
                    allowed: vec![ParamValue::Integer(150)],
                },
                ParamValue::Integer(999),
            ))
            .build()
            .unwrap_err();
        assert!(matches!(err, RegistryError::DefaultOutsideDomain { .. }));
    }

    #[test]
    fn test_cycle_fails_fast() {
        let a = ParamKey::new("a");
        let b = ParamKey::new("b");
        let err = RegistryBuilder::new()
            .register(ParamSpec::computed(
                a,
                "a",
                None,
                ValueType::Number {
                    min: None,
                    max: None,
                },
                vec![b],
                Derivation::BoreDiameter,
            ))
            .register(ParamSpec::computed(
                b,
                "b",
                None,
                ValueType::Number {
                    min: None,
                    max: None,
                },
                vec![a],
                Derivation::BoreDiameter,
            ))
            .build()
            .unwrap_err();
        match err {
            RegistryError::Cycle(report) => {
                assert_eq!(report.keys, vec![a, b]);
            }
            other => panic!("expected cycle error, got {:?}", other),
        }
    }

    #[test]
    fn test_self_dependency_fails_fast() {
        let a = ParamKey::new("a");
        let err = RegistryBuilder::new()
            .register(ParamSpec::computed(
                a,
                "a",
                None,
                ValueType::Number {
                    min: None,
                    max: None,
                },
                vec![a],
                Derivation::BoreDiameter,
            ))
            .build()
            .unwrap_err();
        assert!(matches!(err, RegistryError::Cycle(_)));
    }

    #[test]
    fn test_validate_write_role_protection() {
        let registry = Registry::standard().unwrap();
        let err = registry
            .validate_write(keys::OPERATING_PRESSURE, &ParamValue::number(500.0))
            .unwrap_err();
        assert_eq!(err.kind(), "role");
        assert_eq!(err.key(), "operating_pressure");
    }

    #[test]
    fn test_validate_write_domain() {
        let registry = Registry::standard().unwrap();

        let err = registry
            .validate_write(keys::PRESSURE_CLASS, &ParamValue::Integer(999))
            .unwrap_err();
        assert_eq!(err.kind(), "validation");

        assert!(registry
            .validate_write(keys::PRESSURE_CLASS, &ParamValue::Integer(300))
            .is_ok());

        let err = registry
            .validate_write(keys::CORROSION_ALLOWANCE, &ParamValue::number(99.0))
            .unwrap_err();
        assert_eq!(err.kind(), "validation");
    }

    #[test]
    fn test_validate_write_unknown_key() {
        let registry = Registry::standard().unwrap();
        let err = registry
            .validate_write(ParamKey::new("bogus"), &ParamValue::Integer(1))
            .unwrap_err();
        assert_eq!(err.kind(), "unknown_parameter");
    }
}
