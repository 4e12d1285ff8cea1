//! Fixed-order numeric encoding of a customer record.

use std::ops::Index;

use crate::record::CustomerRecord;

/// Number of features the classifier consumes.
pub const FEATURE_COUNT: usize = 16;

/// Sixteen numeric features in model order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    /// Wraps raw feature values already in model order.
    pub fn from_array(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    /// Borrows the values.
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// True when every value is a finite number.
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|value| value.is_finite())
    }
}

impl Index<usize> for FeatureVector {
    type Output = f64;

    fn index(&self, idx: usize) -> &f64 {
        &self.0[idx]
    }
}

/// Encodes a record into the vector the model was trained on.
///
/// Order: gender, SeniorCitizen, Partner, Dependents, tenure, PhoneService,
/// MultipleLines, InternetService, OnlineSecurity, OnlineBackup, TechSupport,
/// Contract, PaperlessBilling, PaymentMethod, MonthlyCharges, TotalCharges.
pub fn encode(record: &CustomerRecord) -> FeatureVector {
    FeatureVector([
        f64::from(record.gender.code()),
        f64::from(record.senior_citizen.code()),
        f64::from(record.partner.code()),
        f64::from(record.dependents.code()),
        f64::from(record.tenure),
        f64::from(record.phone_service.code()),
        f64::from(record.multiple_lines.code()),
        f64::from(record.internet_service.code()),
        f64::from(record.online_security.code()),
        f64::from(record.online_backup.code()),
        f64::from(record.tech_support.code()),
        f64::from(record.contract.code()),
        f64::from(record.paperless_billing.code()),
        f64::from(record.payment_method.code()),
        record.monthly_charges,
        record.total_charges,
    ])
}
