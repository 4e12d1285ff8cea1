//! Declarative form schema and the single routine that validates against it.

use std::collections::HashMap;
use std::fmt;

use crate::record::{
    Contract, CustomerRecord, EncodeError, Gender, InternetAddon, InternetService, PaymentMethod,
    PhoneLines, SeniorCitizen, YesNo,
};

/// Value domain and constraints of one form field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    /// Closed set of submitted values, with the caption shown for each option.
    Choice {
        /// Accepted submitted values in display order.
        values: &'static [&'static str],
        /// Option captions, parallel to `values`.
        captions: &'static [&'static str],
    },
    /// Whole number within `min..=max`.
    Integer {
        /// Inclusive lower bound.
        min: i64,
        /// Inclusive upper bound.
        max: i64,
    },
    /// Finite real number no smaller than `min`.
    Real {
        /// Inclusive lower bound.
        min: f64,
    },
}

/// Describes one required form field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    /// Form field name, also the feature name expected by the model.
    pub name: &'static str,
    /// Human-readable label.
    pub label: &'static str,
    /// Domain and constraints.
    pub kind: FieldKind,
}

impl FieldSpec {
    const fn choice(
        name: &'static str,
        label: &'static str,
        values: &'static [&'static str],
    ) -> Self {
        Self::captioned(name, label, values, values)
    }

    const fn captioned(
        name: &'static str,
        label: &'static str,
        values: &'static [&'static str],
        captions: &'static [&'static str],
    ) -> Self {
        Self {
            name,
            label,
            kind: FieldKind::Choice { values, captions },
        }
    }

    /// Checks one submitted value, returning the cleaned value or a user-facing message.
    pub fn check(&self, submitted: Option<&str>) -> Result<String, String> {
        let value = submitted.map(str::trim).unwrap_or_default();
        if value.is_empty() {
            return Err(MSG_REQUIRED.to_string());
        }
        match self.kind {
            FieldKind::Choice { values, .. } => {
                if values.contains(&value) {
                    Ok(value.to_string())
                } else {
                    Err(MSG_CHOICE.to_string())
                }
            }
            FieldKind::Integer { min, max } => {
                let parsed: i64 = value.parse().map_err(|_| MSG_INTEGER.to_string())?;
                if parsed < min {
                    return Err(format!("Number must be at least {min}."));
                }
                if parsed > max {
                    return Err(format!("Number must be at most {max}."));
                }
                Ok(parsed.to_string())
            }
            FieldKind::Real { min } => {
                let parsed: f64 = value.parse().map_err(|_| MSG_FLOAT.to_string())?;
                if !parsed.is_finite() {
                    return Err(MSG_FLOAT.to_string());
                }
                if parsed < min {
                    return Err(format!("Number must be at least {min}."));
                }
                // `-0` would otherwise reach the encoder as negative zero.
                if parsed == 0.0 {
                    return Ok("0".to_string());
                }
                Ok(value.to_string())
            }
        }
    }
}

const MSG_REQUIRED: &str = "This field is required.";
const MSG_CHOICE: &str = "Not a valid choice.";
const MSG_INTEGER: &str = "Not a valid integer value.";
const MSG_FLOAT: &str = "Not a valid float value.";

/// Every form field, in the order the model consumes them.
pub const FIELDS: [FieldSpec; 16] = [
    FieldSpec::choice("gender", "Gender", Gender::LABELS),
    FieldSpec::captioned(
        "SeniorCitizen",
        "Senior Citizen",
        SeniorCitizen::LABELS,
        &["No", "Yes"],
    ),
    FieldSpec::choice("Partner", "Partner", YesNo::LABELS),
    FieldSpec::choice("Dependents", "Dependents", YesNo::LABELS),
    FieldSpec {
        name: "tenure",
        label: "Tenure (months)",
        kind: FieldKind::Integer {
            min: 0,
            max: u32::MAX as i64,
        },
    },
    FieldSpec::choice("PhoneService", "Phone Service", YesNo::LABELS),
    FieldSpec::choice("MultipleLines", "Multiple Lines", PhoneLines::LABELS),
    FieldSpec::choice("InternetService", "Internet Service", InternetService::LABELS),
    FieldSpec::choice("OnlineSecurity", "Online Security", InternetAddon::LABELS),
    FieldSpec::choice("OnlineBackup", "Online Backup", InternetAddon::LABELS),
    FieldSpec::choice("TechSupport", "Tech Support", InternetAddon::LABELS),
    FieldSpec::choice("Contract", "Contract", Contract::LABELS),
    FieldSpec::choice("PaperlessBilling", "Paperless Billing", YesNo::LABELS),
    FieldSpec::choice("PaymentMethod", "Payment Method", PaymentMethod::LABELS),
    FieldSpec {
        name: "MonthlyCharges",
        label: "Monthly Charges",
        kind: FieldKind::Real { min: 0.0 },
    },
    FieldSpec {
        name: "TotalCharges",
        label: "Total Charges",
        kind: FieldKind::Real { min: 0.0 },
    },
];

/// Field names in feature order.
pub fn feature_names() -> impl Iterator<Item = &'static str> {
    FIELDS.iter().map(|spec| spec.name)
}

/// Cleaned values for all sixteen fields, ready for encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedForm {
    values: HashMap<String, String>,
}

impl ValidatedForm {
    /// Cleaned value of a field.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Converts the cleaned strings into a typed record.
    pub fn to_record(&self) -> Result<CustomerRecord, EncodeError> {
        CustomerRecord::from_fields(&self.values)
    }
}

/// Collected field-level and form-level validation messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: Vec<(&'static str, String)>,
    form: Vec<String>,
}

impl ValidationErrors {
    /// Records a message that is not tied to a single field.
    pub fn push_form(&mut self, message: impl Into<String>) {
        self.form.push(message.into());
    }

    /// Message for the named field, if it failed.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, message)| message.as_str())
    }

    /// Names of the failing fields, in schema order.
    pub fn failed_fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|(field, _)| *field)
    }

    /// Form-level messages.
    pub fn form(&self) -> &[String] {
        &self.form
    }

    /// True when nothing failed.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.form.is_empty()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for message in &self.form {
            if !first {
                f.write_str("; ")?;
            }
            f.write_str(message)?;
            first = false;
        }
        for (field, message) in &self.fields {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Validates a submitted form against [`FIELDS`].
///
/// All fields are checked so every problem is reported at once. Unknown keys are
/// ignored. Any failure rejects the whole submission.
pub fn validate(submitted: &HashMap<String, String>) -> Result<ValidatedForm, ValidationErrors> {
    let mut errors = ValidationErrors::default();
    let mut values = HashMap::with_capacity(FIELDS.len());
    for spec in &FIELDS {
        match spec.check(submitted.get(spec.name).map(String::as_str)) {
            Ok(value) => {
                values.insert(spec.name.to_string(), value);
            }
            Err(message) => errors.fields.push((spec.name, message)),
        }
    }
    if errors.is_empty() {
        Ok(ValidatedForm { values })
    } else {
        Err(errors)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// The documented sample customer, as submitted by a browser.
    pub(crate) fn sample_submission() -> HashMap<String, String> {
        [
            ("gender", "Female"),
            ("SeniorCitizen", "0"),
            ("Partner", "Yes"),
            ("Dependents", "No"),
            ("tenure", "12"),
            ("PhoneService", "Yes"),
            ("MultipleLines", "No"),
            ("InternetService", "DSL"),
            ("OnlineSecurity", "Yes"),
            ("OnlineBackup", "No"),
            ("TechSupport", "No"),
            ("Contract", "One year"),
            ("PaperlessBilling", "No"),
            ("PaymentMethod", "Mailed check"),
            ("MonthlyCharges", "55.5"),
            ("TotalCharges", "660.0"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn accepts_complete_submission() {
        let form = validate(&sample_submission()).expect("valid");
        assert_eq!(form.get("Contract"), Some("One year"));
        assert_eq!(form.get("tenure"), Some("12"));
    }

    #[test]
    fn missing_tenure_is_required() {
        let mut submitted = sample_submission();
        submitted.remove("tenure");
        let errors = validate(&submitted).expect_err("tenure missing");
        assert_eq!(errors.failed_fields().collect::<Vec<_>>(), vec!["tenure"]);
        assert_eq!(errors.field("tenure"), Some("This field is required."));
    }

    #[test]
    fn negative_numbers_fail_range_check() {
        for field in ["tenure", "MonthlyCharges", "TotalCharges"] {
            let mut submitted = sample_submission();
            submitted.insert(field.to_string(), "-5".to_string());
            let errors = validate(&submitted).expect_err("negative rejected");
            assert_eq!(errors.field(field), Some("Number must be at least 0."));
        }
    }

    #[test]
    fn tenure_above_u32_fails_upper_bound() {
        let mut submitted = sample_submission();
        submitted.insert("tenure".into(), "4294967296".into());
        let errors = validate(&submitted).expect_err("too large");
        assert_eq!(
            errors.field("tenure"),
            Some("Number must be at most 4294967295.")
        );
    }

    #[test]
    fn zero_is_within_range() {
        let mut submitted = sample_submission();
        submitted.insert("tenure".into(), "0".into());
        submitted.insert("MonthlyCharges".into(), "0".into());
        assert!(validate(&submitted).is_ok());
    }

    #[test]
    fn negative_zero_charges_are_cleaned_to_zero() {
        let mut submitted = sample_submission();
        submitted.insert("MonthlyCharges".into(), "-0".into());
        submitted.insert("TotalCharges".into(), "-0.0".into());
        let form = validate(&submitted).expect("negative zero is in range");
        assert_eq!(form.get("MonthlyCharges"), Some("0"));
        assert_eq!(form.get("TotalCharges"), Some("0"));
        let record = form.to_record().expect("encodes");
        assert!(record.monthly_charges.is_sign_positive());
        assert!(record.total_charges.is_sign_positive());
    }

    #[test]
    fn reports_every_failing_field() {
        let mut submitted = sample_submission();
        submitted.insert("gender".into(), "Other".into());
        submitted.insert("tenure".into(), "12.5".into());
        submitted.insert("TotalCharges".into(), "NaN".into());
        submitted.insert("Contract".into(), "   ".into());
        let errors = validate(&submitted).expect_err("invalid");
        assert_eq!(
            errors.failed_fields().collect::<Vec<_>>(),
            vec!["gender", "tenure", "Contract", "TotalCharges"]
        );
        assert_eq!(errors.field("gender"), Some("Not a valid choice."));
        assert_eq!(errors.field("tenure"), Some("Not a valid integer value."));
        assert_eq!(errors.field("Contract"), Some("This field is required."));
        assert_eq!(errors.field("TotalCharges"), Some("Not a valid float value."));
    }

    #[test]
    fn trims_values_and_ignores_unknown_keys() {
        let mut submitted = sample_submission();
        submitted.insert("tenure".into(), " 7 ".into());
        submitted.insert("submit".into(), "Predict Churn".into());
        let form = validate(&submitted).expect("valid");
        assert_eq!(form.get("tenure"), Some("7"));
        assert_eq!(form.get("submit"), None);
    }

    #[test]
    fn schema_order_matches_feature_order() {
        let names: Vec<&str> = feature_names().collect();
        assert_eq!(
            names,
            vec![
                "gender",
                "SeniorCitizen",
                "Partner",
                "Dependents",
                "tenure",
                "PhoneService",
                "MultipleLines",
                "InternetService",
                "OnlineSecurity",
                "OnlineBackup",
                "TechSupport",
                "Contract",
                "PaperlessBilling",
                "PaymentMethod",
                "MonthlyCharges",
                "TotalCharges",
            ]
        );
    }

    #[test]
    fn every_choice_value_builds_a_record() {
        for spec in &FIELDS {
            if let FieldKind::Choice { values, captions } = spec.kind {
                assert_eq!(values.len(), captions.len(), "{}", spec.name);
                for value in values {
                    let mut submitted = sample_submission();
                    submitted.insert(spec.name.to_string(), value.to_string());
                    let form = validate(&submitted).expect("declared value validates");
                    form.to_record().expect("declared value encodes");
                }
            }
        }
    }
}
