//! Patient record schema and validation for heart-disease risk scoring.
//!
//! The wire schema is a flat JSON object with the thirteen UCI heart-disease
//! attributes under their lowercase names. Each attribute also answers to its
//! upper-case dataset column header (`AGE`, `TRESTBPS`, ...). Unknown keys are
//! rejected, never ignored.

use crate::error::{FieldIssue, ValidationError};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Number of attributes in a patient record (and in the model's feature vector).
pub const PATIENT_FIELD_COUNT: usize = 13;

/// Value domain of a single patient attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Whole number, zero or greater
    NonNegative,
    /// Whole number, strictly greater than zero
    Positive,
    /// Any finite real number, fractions allowed
    Signed,
    /// Whole number, 0 or 1
    Binary,
    /// Whole-number category code, 0..=255
    Code,
}

impl FieldKind {
    /// Coerce a raw JSON value into this kind, or describe why it cannot be.
    pub fn coerce(self, raw: &Value) -> Result<f64, String> {
        let value = coerce_number(raw)?;

        if self != FieldKind::Signed && value.fract() != 0.0 {
            return Err(format!("must be a whole number, got {value}"));
        }

        match self {
            FieldKind::Signed => Ok(value),
            FieldKind::NonNegative if value >= 0.0 => Ok(value),
            FieldKind::NonNegative => Err(format!("must be zero or greater, got {value}")),
            FieldKind::Positive if value > 0.0 => Ok(value),
            FieldKind::Positive => Err(format!("must be greater than zero, got {value}")),
            FieldKind::Binary if value == 0.0 || value == 1.0 => Ok(value),
            FieldKind::Binary => Err(format!("must be 0 or 1, got {value}")),
            FieldKind::Code if (0.0..=255.0).contains(&value) => Ok(value),
            FieldKind::Code => Err(format!("must be a code between 0 and 255, got {value}")),
        }
    }
}

/// Schema entry for one attribute.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Canonical wire name
    pub name: &'static str,
    /// Dataset column header accepted as an alternative key
    pub alias: &'static str,
    pub kind: FieldKind,
}

/// The record schema, in the order the model expects its features.
pub const PATIENT_FIELDS: [FieldSpec; PATIENT_FIELD_COUNT] = [
    FieldSpec { name: "age", alias: "AGE", kind: FieldKind::NonNegative },
    FieldSpec { name: "sex", alias: "SEX", kind: FieldKind::Binary },
    FieldSpec { name: "cp", alias: "CP", kind: FieldKind::Code },
    FieldSpec { name: "trestbps", alias: "TRESTBPS", kind: FieldKind::Positive },
    FieldSpec { name: "chol", alias: "CHOL", kind: FieldKind::Positive },
    FieldSpec { name: "fbs", alias: "FBS", kind: FieldKind::Binary },
    FieldSpec { name: "restecg", alias: "RESTECG", kind: FieldKind::Code },
    FieldSpec { name: "thalach", alias: "THALACH", kind: FieldKind::Positive },
    FieldSpec { name: "exang", alias: "EXANG", kind: FieldKind::Binary },
    FieldSpec { name: "oldpeak", alias: "OLDPEAK", kind: FieldKind::Signed },
    FieldSpec { name: "slope", alias: "SLOPE", kind: FieldKind::Code },
    FieldSpec { name: "ca", alias: "CA", kind: FieldKind::Code },
    FieldSpec { name: "thal", alias: "THAL", kind: FieldKind::Code },
];

/// Position of a wire key in [`PATIENT_FIELDS`], accepting either spelling.
pub fn field_index(key: &str) -> Option<usize> {
    PATIENT_FIELDS
        .iter()
        .position(|f| f.name == key || f.alias == key)
}

fn coerce_number(raw: &Value) -> Result<f64, String> {
    let value = match raw {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| format!("number {n} is out of range"))?,
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("expected a number, got string {s:?}"))?,
        Value::Null => return Err("expected a number, got null".to_string()),
        Value::Bool(_) => return Err("expected a number, got a boolean".to_string()),
        Value::Array(_) => return Err("expected a number, got an array".to_string()),
        Value::Object(_) => return Err("expected a number, got an object".to_string()),
    };

    if value.is_finite() {
        Ok(value)
    } else {
        Err(format!("expected a finite number, got {value}"))
    }
}

/// One patient's clinical snapshot for a single prediction request.
///
/// Only constructible from validated input (or directly in code), so every
/// instance satisfies the schema's domain checks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PatientRecord {
    /// Age in years
    pub age: f64,
    /// Sex (1 = male, 0 = female)
    pub sex: u8,
    /// Chest pain type
    pub cp: u8,
    /// Resting blood pressure (mm Hg)
    pub trestbps: f64,
    /// Serum cholesterol (mg/dl)
    pub chol: f64,
    /// Fasting blood sugar > 120 mg/dl (1 = true)
    pub fbs: u8,
    /// Resting electrocardiographic result
    pub restecg: u8,
    /// Maximum heart rate achieved
    pub thalach: f64,
    /// Exercise-induced angina (1 = yes)
    pub exang: u8,
    /// ST depression induced by exercise relative to rest
    pub oldpeak: f64,
    /// Slope of the peak exercise ST segment
    pub slope: u8,
    /// Number of major vessels colored by fluoroscopy
    pub ca: u8,
    /// Thalassemia code
    pub thal: u8,
}

impl PatientRecord {
    /// Validate an untyped payload into a record.
    ///
    /// Every problem in the payload is reported, not only the first one:
    /// unknown keys, keys supplied twice under both spellings, malformed
    /// values and missing fields.
    pub fn from_json(payload: &Value) -> Result<Self, ValidationError> {
        let Some(object) = payload.as_object() else {
            return Err(ValidationError::body("expected a JSON object"));
        };

        let mut values = [0.0_f64; PATIENT_FIELD_COUNT];
        let mut seen: [Option<&str>; PATIENT_FIELD_COUNT] = [None; PATIENT_FIELD_COUNT];
        let mut issues = Vec::new();

        for (key, raw) in object {
            let Some(index) = field_index(key) else {
                issues.push(FieldIssue::new(key.as_str(), "unknown field"));
                continue;
            };

            if let Some(previous) = seen[index] {
                issues.push(FieldIssue::new(
                    key.as_str(),
                    format!("duplicates field `{previous}`"),
                ));
                continue;
            }
            seen[index] = Some(key.as_str());

            match PATIENT_FIELDS[index].kind.coerce(raw) {
                Ok(value) => values[index] = value,
                Err(message) => issues.push(FieldIssue::new(key.as_str(), message)),
            }
        }

        for (field, seen) in PATIENT_FIELDS.iter().zip(seen.iter()) {
            if seen.is_none() {
                issues.push(FieldIssue::new(field.name, "field required"));
            }
        }

        if issues.is_empty() {
            Ok(Self::from_validated(values))
        } else {
            Err(ValidationError::new(issues))
        }
    }

    // Codes and flags were range-checked by `FieldKind::coerce`, so the
    // narrowing casts are exact.
    fn from_validated(v: [f64; PATIENT_FIELD_COUNT]) -> Self {
        Self {
            age: v[0],
            sex: v[1] as u8,
            cp: v[2] as u8,
            trestbps: v[3],
            chol: v[4],
            fbs: v[5] as u8,
            restecg: v[6] as u8,
            thalach: v[7],
            exang: v[8] as u8,
            oldpeak: v[9],
            slope: v[10] as u8,
            ca: v[11] as u8,
            thal: v[12] as u8,
        }
    }

    /// Attribute values in schema order.
    pub fn values(&self) -> [f64; PATIENT_FIELD_COUNT] {
        [
            self.age,
            f64::from(self.sex),
            f64::from(self.cp),
            self.trestbps,
            self.chol,
            f64::from(self.fbs),
            f64::from(self.restecg),
            self.thalach,
            f64::from(self.exang),
            self.oldpeak,
            f64::from(self.slope),
            f64::from(self.ca),
            f64::from(self.thal),
        ]
    }
}

impl<'de> Deserialize<'de> for PatientRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let payload = Value::deserialize(deserializer)?;
        PatientRecord::from_json(&payload).map_err(serde::de::Error::custom)
    }
}
