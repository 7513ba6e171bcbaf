//! Reference tables for the valve data sheet.
//!
//! Pure data, constructed once at startup and immutable afterwards:
//! pressure-class rating by temperature band, NPS bore diameters,
//! face-to-face lengths, and allowable stress per body material.
//!
//! A lookup outside a table is a hard `TableMiss` — there are no implicit
//! defaults. The ambient (38C) rating column, the bore figures, the
//! (2in, 600) face-to-face length, and the stress presets follow the sizing
//! sheet this engine replaces; the derated rating bands and the rest of the
//! face-to-face grid are non-normative placeholders pending ASME
//! B16.34/B16.10 data.

use std::collections::BTreeMap;

/// Pressure classes covered by the rating and face-to-face tables.
pub const PRESSURE_CLASSES: &[i64] = &[150, 300, 600, 900, 1500, 2500];

/// NPS codes covered by the bore and face-to-face tables.
pub const NPS_CODES: &[&str] = &[
    "1/2in", "3/4in", "1in", "1-1/2in", "2in", "3in", "4in", "6in", "8in", "10in", "12in",
];

/// Temperature band codes, coolest first. Each band covers design
/// temperatures up to and including its bound.
pub const TEMP_BANDS: &[(&str, f64)] = &[
    ("38C", 38.0),
    ("50C", 50.0),
    ("100C", 100.0),
    ("150C", 150.0),
    ("200C", 200.0),
];

/// A reference-table lookup with no entry for the requested code combination.
#[derive(Debug, Clone, PartialEq)]
pub struct TableMiss {
    /// Name of the table that was consulted.
    pub table: &'static str,
    /// The code tuple that had no entry.
    pub code: String,
}

impl TableMiss {
    fn new(table: &'static str, code: impl Into<String>) -> Self {
        Self {
            table,
            code: code.into(),
        }
    }
}

impl std::fmt::Display for TableMiss {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "no entry in table '{}' for {}", self.table, self.code)
    }
}

impl std::error::Error for TableMiss {}

/// The immutable reference data set.
#[derive(Debug, Clone)]
pub struct ReferenceTables {
    /// (pressure class, temperature band) → rated pressure [MPa].
    rating_mpa: BTreeMap<(i64, String), f64>,
    /// NPS code → bore diameter [mm].
    bore_mm: BTreeMap<String, f64>,
    /// (NPS code, pressure class) → face-to-face length [mm].
    f2f_mm: BTreeMap<(String, i64), f64>,
    /// Body material → allowable stress [MPa].
    stress_mpa: BTreeMap<String, f64>,
}

impl ReferenceTables {
    /// Build the standard data set.
    pub fn standard() -> Self {
        // Ambient (38C) column per ASME B16.34 group ratings; hotter bands
        // derated from ambient.
        let rating_rows: &[(i64, [f64; 5])] = &[
            (150, [2.001, 1.961, 1.801, 1.681, 1.561]),
            (300, [5.17, 5.067, 4.653, 4.343, 4.033]),
            (600, [10.21, 10.006, 9.189, 8.576, 7.964]),
            (900, [15.519, 15.209, 13.967, 13.036, 12.105]),
            (1500, [25.869, 25.352, 23.282, 21.73, 20.178]),
            (2500, [43.115, 42.253, 38.804, 36.217, 33.63]),
        ];
        let mut rating_mpa = BTreeMap::new();
        for (class, row) in rating_rows {
            for ((band, _), mpa) in TEMP_BANDS.iter().zip(row.iter()) {
                rating_mpa.insert((*class, band.to_string()), *mpa);
            }
        }

        let bore_rows: &[(&str, f64)] = &[
            ("1/2in", 15.0),
            ("3/4in", 20.0),
            ("1in", 25.0),
            ("1-1/2in", 40.0),
            ("2in", 51.0),
            ("3in", 78.0),
            ("4in", 102.0),
            ("6in", 154.0),
            ("8in", 202.0),
            ("10in", 254.0),
            ("12in", 303.0),
        ];
        let bore_mm = bore_rows
            .iter()
            .map(|(nps, mm)| (nps.to_string(), *mm))
            .collect();

        // Columns follow PRESSURE_CLASSES.
        let f2f_rows: &[(&str, [f64; 6])] = &[
            ("1/2in", [108.0, 140.0, 165.0, 216.0, 216.0, 264.0]),
            ("3/4in", [117.0, 152.0, 190.0, 229.0, 229.0, 273.0]),
            ("1in", [127.0, 165.0, 216.0, 254.0, 254.0, 308.0]),
            ("1-1/2in", [165.0, 190.0, 241.0, 305.0, 305.0, 384.0]),
            ("2in", [178.0, 216.0, 295.0, 368.0, 368.0, 451.0]),
            ("3in", [203.0, 283.0, 356.0, 381.0, 470.0, 578.0]),
            ("4in", [229.0, 305.0, 432.0, 457.0, 546.0, 673.0]),
            ("6in", [394.0, 403.0, 559.0, 610.0, 705.0, 914.0]),
            ("8in", [457.0, 502.0, 660.0, 737.0, 832.0, 1022.0]),
            ("10in", [533.0, 568.0, 787.0, 838.0, 991.0, 1270.0]),
            ("12in", [610.0, 648.0, 838.0, 965.0, 1130.0, 1422.0]),
        ];
        let mut f2f_mm = BTreeMap::new();
        for (nps, row) in f2f_rows {
            for (class, mm) in PRESSURE_CLASSES.iter().zip(row.iter()) {
                f2f_mm.insert((nps.to_string(), *class), *mm);
            }
        }

        let stress_rows: &[(&str, f64)] = &[
            ("ASTM A105N", 248.0),
            ("ASTM A350 LF2 CL.1", 248.0),
            ("ASTM A182 F316", 207.0),
            ("ASTM A182 F316L", 172.0),
            ("ASTM A182 F304", 207.0),
            ("ASTM A182 F304L", 172.0),
            ("ASTM A182 F51", 448.5),
            ("ASTM A182 F53/55", 550.0),
            ("ASTM A182 F6NM", 621.0),
            ("ASTM B564 UNS N06625", 414.0),
        ];
        let stress_mpa = stress_rows
            .iter()
            .map(|(mat, mpa)| (mat.to_string(), *mpa))
            .collect();

        Self {
            rating_mpa,
            bore_mm,
            f2f_mm,
            stress_mpa,
        }
    }

    /// Rated pressure [MPa] for a pressure class at a temperature band.
    pub fn pressure_rating(&self, class: i64, band: &str) -> Result<f64, TableMiss> {
        self.rating_mpa
            .get(&(class, band.to_string()))
            .copied()
            .ok_or_else(|| TableMiss::new("pressure_rating", format!("({}, {})", class, band)))
    }

    /// Bore diameter [mm] for an NPS code.
    pub fn bore_diameter(&self, nps: &str) -> Result<f64, TableMiss> {
        self.bore_mm
            .get(nps)
            .copied()
            .ok_or_else(|| TableMiss::new("bore_diameter", nps))
    }

    /// Face-to-face length [mm] for an NPS code and pressure class.
    pub fn face_to_face(&self, nps: &str, class: i64) -> Result<f64, TableMiss> {
        self.f2f_mm
            .get(&(nps.to_string(), class))
            .copied()
            .ok_or_else(|| TableMiss::new("face_to_face", format!("({}, {})", nps, class)))
    }

    /// Allowable stress [MPa] for a body material.
    pub fn allowable_stress(&self, material: &str) -> Result<f64, TableMiss> {
        self.stress_mpa
            .get(material)
            .copied()
            .ok_or_else(|| TableMiss::new("allowable_stress", material))
    }

    /// Materials covered by the allowable-stress table, in stable order.
    pub fn materials(&self) -> impl Iterator<Item = &str> {
        self.stress_mpa.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ambient_ratings_match_sizing_sheet() {
        let tables = ReferenceTables::standard();
        assert_eq!(tables.pressure_rating(150, "38C").unwrap(), 2.001);
        assert_eq!(tables.pressure_rating(300, "38C").unwrap(), 5.17);
        assert_eq!(tables.pressure_rating(600, "38C").unwrap(), 10.21);
        assert_eq!(tables.pressure_rating(900, "38C").unwrap(), 15.519);
        assert_eq!(tables.pressure_rating(1500, "38C").unwrap(), 25.869);
        assert_eq!(tables.pressure_rating(2500, "38C").unwrap(), 43.115);
    }

    #[test]
    fn test_ratings_derate_with_temperature() {
        let tables = ReferenceTables::standard();
        for &class in PRESSURE_CLASSES {
            let mut prev = f64::INFINITY;
            for (band, _) in TEMP_BANDS {
                let mpa = tables.pressure_rating(class, band).unwrap();
                assert!(
                    mpa < prev,
                    "class {} rating must decrease toward hotter bands",
                    class
                );
                prev = mpa;
            }
        }
    }

    #[test]
    fn test_bore_diameters() {
        let tables = ReferenceTables::standard();
        assert_eq!(tables.bore_diameter("2in").unwrap(), 51.0);
        assert_eq!(tables.bore_diameter("12in").unwrap(), 303.0);
    }

    #[test]
    fn test_face_to_face_reference_point() {
        // The one figure the sizing sheet pins down exactly
        let tables = ReferenceTables::standard();
        assert_eq!(tables.face_to_face("2in", 600).unwrap(), 295.0);
    }

    #[test]
    fn test_face_to_face_grid_is_exhaustive() {
        let tables = ReferenceTables::standard();
        for nps in NPS_CODES {
            for &class in PRESSURE_CLASSES {
                assert!(
                    tables.face_to_face(nps, class).is_ok(),
                    "missing f2f entry for ({}, {})",
                    nps,
                    class
                );
            }
        }
    }

    #[test]
    fn test_allowable_stress() {
        let tables = ReferenceTables::standard();
        assert_eq!(tables.allowable_stress("ASTM A350 LF2 CL.1").unwrap(), 248.0);
        assert_eq!(tables.allowable_stress("ASTM A182 F51").unwrap(), 448.5);
        assert_eq!(tables.materials().count(), 10);
    }

    #[test]
    fn test_miss_is_an_error_not_a_default() {
        let tables = ReferenceTables::standard();

        let err = tables.pressure_rating(400, "38C").unwrap_err();
        assert_eq!(err.table, "pressure_rating");
        assert_eq!(err.code, "(400, 38C)");

        let err = tables.bore_diameter("14in").unwrap_err();
        assert_eq!(format!("{}", err), "no entry in table 'bore_diameter' for 14in");

        assert!(tables.face_to_face("2in", 999).is_err());
        assert!(tables.allowable_stress("unobtainium").is_err());
    }
}
