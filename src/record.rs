//! Typed customer record built from the sixteen form fields.

use std::collections::HashMap;
use std::fmt;

/// Generates a closed categorical domain with its form labels and model codes.
///
/// Each variant lists the exact string the form submits and the numeric code the
/// classifier was trained on. `code` is an exhaustive match, so adding a variant
/// without a code does not compile.
macro_rules! categorical {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => ($label:literal, $code:literal) ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[doc = concat!("Submitted as `", $label, "`.")]
                $variant
            ),+
        }

        impl $name {
            /// Every value in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Form labels in declaration order.
            pub const LABELS: &'static [&'static str] = &[$($label),+];

            /// Parses the exact string submitted by the form.
            pub fn from_label(label: &str) -> Option<Self> {
                match label {
                    $($label => Some(Self::$variant),)+
                    _ => None,
                }
            }

            /// Label submitted by the form for this value.
            pub fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }

            /// Numeric code consumed by the classifier.
            pub fn code(self) -> u8 {
                match self {
                    $(Self::$variant => $code),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

categorical! {
    /// Customer gender.
    Gender {
        Male => ("Male", 0),
        Female => ("Female", 1),
    }
}

categorical! {
    /// Whether the customer is a senior citizen. The form submits `0`/`1`.
    SeniorCitizen {
        No => ("0", 0),
        Yes => ("1", 1),
    }
}

categorical! {
    /// Plain yes/no answer.
    YesNo {
        Yes => ("Yes", 1),
        No => ("No", 0),
    }
}

categorical! {
    /// Multiple lines answer, which depends on having phone service.
    PhoneLines {
        Yes => ("Yes", 1),
        No => ("No", 0),
        NoPhoneService => ("No phone service", 2),
    }
}

categorical! {
    /// Internet service kind.
    InternetService {
        Dsl => ("DSL", 0),
        FiberOptic => ("Fiber optic", 1),
        No => ("No", 2),
    }
}

categorical! {
    /// Answer for an internet add-on (security, backup, tech support).
    InternetAddon {
        Yes => ("Yes", 1),
        No => ("No", 0),
        NoInternetService => ("No internet service", 2),
    }
}

categorical! {
    /// Contract term.
    Contract {
        MonthToMonth => ("Month-to-month", 0),
        OneYear => ("One year", 1),
        TwoYear => ("Two year", 2),
    }
}

categorical! {
    /// Billing payment method.
    PaymentMethod {
        ElectronicCheck => ("Electronic check", 0),
        MailedCheck => ("Mailed check", 1),
        BankTransfer => ("Bank transfer (automatic)", 2),
        CreditCard => ("Credit card (automatic)", 3),
    }
}

/// One validated customer, transient per request.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerRecord {
    /// `gender`
    pub gender: Gender,
    /// `SeniorCitizen`
    pub senior_citizen: SeniorCitizen,
    /// `Partner`
    pub partner: YesNo,
    /// `Dependents`
    pub dependents: YesNo,
    /// `tenure`, months with the company.
    pub tenure: u32,
    /// `PhoneService`
    pub phone_service: YesNo,
    /// `MultipleLines`
    pub multiple_lines: PhoneLines,
    /// `InternetService`
    pub internet_service: InternetService,
    /// `OnlineSecurity`
    pub online_security: InternetAddon,
    /// `OnlineBackup`
    pub online_backup: InternetAddon,
    /// `TechSupport`
    pub tech_support: InternetAddon,
    /// `Contract`
    pub contract: Contract,
    /// `PaperlessBilling`
    pub paperless_billing: YesNo,
    /// `PaymentMethod`
    pub payment_method: PaymentMethod,
    /// `MonthlyCharges`
    pub monthly_charges: f64,
    /// `TotalCharges`
    pub total_charges: f64,
}

impl CustomerRecord {
    /// Builds a typed record from a field-name → submitted-string map.
    ///
    /// This is the last point where raw strings meet the typed domains, so an
    /// unmapped value surfaces here as an [`EncodeError`] instead of a panic.
    pub fn from_fields(fields: &HashMap<String, String>) -> Result<Self, EncodeError> {
        let lookup = Lookup(fields);
        Ok(Self {
            gender: lookup.choice("gender", Gender::from_label)?,
            senior_citizen: lookup.choice("SeniorCitizen", SeniorCitizen::from_label)?,
            partner: lookup.choice("Partner", YesNo::from_label)?,
            dependents: lookup.choice("Dependents", YesNo::from_label)?,
            tenure: lookup.number("tenure")?,
            phone_service: lookup.choice("PhoneService", YesNo::from_label)?,
            multiple_lines: lookup.choice("MultipleLines", PhoneLines::from_label)?,
            internet_service: lookup.choice("InternetService", InternetService::from_label)?,
            online_security: lookup.choice("OnlineSecurity", InternetAddon::from_label)?,
            online_backup: lookup.choice("OnlineBackup", InternetAddon::from_label)?,
            tech_support: lookup.choice("TechSupport", InternetAddon::from_label)?,
            contract: lookup.choice("Contract", Contract::from_label)?,
            paperless_billing: lookup.choice("PaperlessBilling", YesNo::from_label)?,
            payment_method: lookup.choice("PaymentMethod", PaymentMethod::from_label)?,
            monthly_charges: lookup.number("MonthlyCharges")?,
            total_charges: lookup.number("TotalCharges")?,
        })
    }
}

struct Lookup<'a>(&'a HashMap<String, String>);

impl Lookup<'_> {
    fn raw(&self, field: &'static str) -> Result<&str, EncodeError> {
        self.0
            .get(field)
            .map(|value| value.trim())
            .ok_or(EncodeError::MissingField(field))
    }

    fn choice<T>(
        &self,
        field: &'static str,
        parse: impl Fn(&str) -> Option<T>,
    ) -> Result<T, EncodeError> {
        let raw = self.raw(field)?;
        parse(raw).ok_or_else(|| EncodeError::UnknownValue {
            field,
            value: raw.to_string(),
        })
    }

    fn number<T: std::str::FromStr>(&self, field: &'static str) -> Result<T, EncodeError> {
        let raw = self.raw(field)?;
        raw.parse().map_err(|_| EncodeError::InvalidNumber {
            field,
            value: raw.to_string(),
        })
    }
}

/// Failures turning submitted strings into a typed record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// The field was not present at all.
    MissingField(&'static str),
    /// The value is outside the field's mapping.
    UnknownValue {
        /// Field name.
        field: &'static str,
        /// Offending value.
        value: String,
    },
    /// A numeric field could not be parsed.
    InvalidNumber {
        /// Field name.
        field: &'static str,
        /// Offending value.
        value: String,
    },
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "missing field '{field}'"),
            Self::UnknownValue { field, value } => {
                write!(f, "no encoding for '{value}' in field '{field}'")
            }
            Self::InvalidNumber { field, value } => {
                write!(f, "'{value}' is not a valid number for field '{field}'")
            }
        }
    }
}

impl std::error::Error for EncodeError {}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    fn assert_codes_distinct<T: Copy>(all: &[T], code: impl Fn(T) -> u8) {
        let codes: Vec<u8> = all.iter().map(|value| code(*value)).collect();
        let unique: HashSet<u8> = codes.iter().copied().collect();
        assert_eq!(unique.len(), codes.len(), "duplicate codes {codes:?}");
        let expected: Vec<u8> = (0..codes.len() as u8).collect();
        let mut sorted = codes.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, expected, "codes must be contiguous from 0");
    }

    #[test]
    fn every_domain_has_distinct_contiguous_codes() {
        assert_codes_distinct(Gender::ALL, Gender::code);
        assert_codes_distinct(SeniorCitizen::ALL, SeniorCitizen::code);
        assert_codes_distinct(YesNo::ALL, YesNo::code);
        assert_codes_distinct(PhoneLines::ALL, PhoneLines::code);
        assert_codes_distinct(InternetService::ALL, InternetService::code);
        assert_codes_distinct(InternetAddon::ALL, InternetAddon::code);
        assert_codes_distinct(Contract::ALL, Contract::code);
        assert_codes_distinct(PaymentMethod::ALL, PaymentMethod::code);
    }

    #[test]
    fn labels_parse_back_to_their_variant() {
        for method in PaymentMethod::ALL {
            assert_eq!(PaymentMethod::from_label(method.label()), Some(*method));
        }
        assert_eq!(PhoneLines::from_label("No phone service"), Some(PhoneLines::NoPhoneService));
        assert_eq!(InternetService::from_label("fiber optic"), None);
    }

    #[test]
    fn from_fields_reports_unmapped_value() {
        let mut fields: HashMap<String, String> = HashMap::new();
        fields.insert("gender".into(), "Other".into());
        let err = CustomerRecord::from_fields(&fields).expect_err("unmapped gender");
        assert_eq!(
            err,
            EncodeError::UnknownValue {
                field: "gender",
                value: "Other".into()
            }
        );
    }

    #[test]
    fn from_fields_reports_missing_field() {
        let fields: HashMap<String, String> = HashMap::new();
        let err = CustomerRecord::from_fields(&fields).expect_err("empty map");
        assert_eq!(err, EncodeError::MissingField("gender"));
    }
}
