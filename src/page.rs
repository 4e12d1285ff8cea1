//! HTML rendering for the single prediction page.

use std::collections::HashMap;
use std::fmt::Write as _;

use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::classifier::Prediction;
use crate::csrf;
use crate::schema::{FieldKind, FieldSpec, ValidationErrors, FIELDS};

/// Result shown beneath the form after a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The classifier produced a label.
    Prediction(Prediction),
    /// Encoding or prediction failed; the message is shown as-is.
    Error(String),
}

impl Outcome {
    /// Text placed in the result block.
    pub fn text(&self) -> String {
        match self {
            Self::Prediction(prediction) => prediction.as_str().to_string(),
            Self::Error(message) => format!("Error: {message}"),
        }
    }
}

/// Everything needed to render one response.
#[derive(Debug, Clone, Copy)]
pub struct PageView<'a> {
    /// Previously submitted values to keep in the form.
    pub values: Option<&'a HashMap<String, String>>,
    /// Validation messages from the last submission.
    pub errors: Option<&'a ValidationErrors>,
    /// Prediction or error to display.
    pub outcome: Option<&'a Outcome>,
    /// Token echoed in the hidden CSRF field.
    pub csrf_token: &'a str,
}

impl<'a> PageView<'a> {
    /// An empty form.
    pub fn blank(csrf_token: &'a str) -> Self {
        Self {
            values: None,
            errors: None,
            outcome: None,
            csrf_token,
        }
    }

    fn value(&self, name: &str) -> Option<&'a str> {
        self.values
            .and_then(|values| values.get(name))
            .map(|value| value.trim())
    }

    fn error(&self, name: &str) -> Option<&'a str> {
        self.errors.and_then(|errors| errors.field(name))
    }
}

const HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Customer Churn Prediction</title>
<style>
body { font-family: sans-serif; max-width: 40rem; margin: 2rem auto; }
.field { margin-bottom: 0.75rem; }
.field label { display: block; font-weight: bold; }
.field-error, .form-error { color: #b00020; }
#prediction { font-size: 1.4rem; font-weight: bold; }
</style>
</head>
<body>
<h1>Customer Churn Prediction</h1>
"#;

const TAIL: &str = "</body>\n</html>\n";

/// Renders the whole page.
pub fn render(view: &PageView<'_>) -> String {
    let mut out = String::with_capacity(8 * 1024);
    out.push_str(HEAD);

    if let Some(errors) = view.errors {
        for message in errors.form() {
            let _ = writeln!(out, r#"<p class="form-error">{}</p>"#, encode_text(message));
        }
    }

    out.push_str("<form method=\"post\" action=\"/\">\n");
    let _ = writeln!(
        out,
        r#"<input type="hidden" name="{}" value="{}">"#,
        csrf::FIELD_NAME,
        encode_double_quoted_attribute(view.csrf_token)
    );
    for spec in &FIELDS {
        render_field(&mut out, view, spec);
    }
    out.push_str("<button type=\"submit\" name=\"submit\" value=\"Predict Churn\">Predict Churn</button>\n");
    out.push_str("</form>\n");

    if let Some(outcome) = view.outcome {
        let class = match outcome {
            Outcome::Prediction(_) => "prediction",
            Outcome::Error(_) => "prediction error",
        };
        let _ = writeln!(
            out,
            r#"<section class="result"><h2>Prediction</h2><p id="prediction" class="{class}">{}</p></section>"#,
            encode_text(&outcome.text())
        );
    }

    out.push_str(TAIL);
    out
}

fn render_field(out: &mut String, view: &PageView<'_>, spec: &FieldSpec) {
    let name = spec.name;
    out.push_str("<div class=\"field\">\n");
    let _ = writeln!(
        out,
        r#"<label for="{name}">{}</label>"#,
        encode_text(spec.label)
    );
    let current = view.value(name);
    match spec.kind {
        FieldKind::Choice { values, captions } => {
            let _ = writeln!(out, r#"<select id="{name}" name="{name}" required>"#);
            for (value, caption) in values.iter().zip(captions) {
                let selected = if current == Some(*value) { " selected" } else { "" };
                let _ = writeln!(
                    out,
                    r#"<option value="{}"{selected}>{}</option>"#,
                    encode_double_quoted_attribute(value),
                    encode_text(caption)
                );
            }
            out.push_str("</select>\n");
        }
        FieldKind::Integer { min, .. } => {
            number_input(out, name, &min.to_string(), "1", current);
        }
        FieldKind::Real { min } => {
            number_input(out, name, &min.to_string(), "any", current);
        }
    }
    if let Some(message) = view.error(name) {
        let _ = writeln!(
            out,
            r#"<span class="field-error">{}</span>"#,
            encode_text(message)
        );
    }
    out.push_str("</div>\n");
}

fn number_input(out: &mut String, name: &str, min: &str, step: &str, current: Option<&str>) {
    let _ = writeln!(
        out,
        r#"<input type="number" id="{name}" name="{name}" min="{min}" step="{step}" value="{}" required>"#,
        encode_double_quoted_attribute(current.unwrap_or_default())
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::validate;

    #[test]
    fn blank_page_has_every_field_and_no_result() {
        let html = render(&PageView::blank("tok"));
        for spec in &FIELDS {
            assert!(html.contains(&format!(r#"name="{}""#, spec.name)), "{}", spec.name);
        }
        assert!(html.contains(r#"name="csrf_token" value="tok""#));
        assert!(!html.contains(r#"id="prediction""#));
    }

    #[test]
    fn retains_values_and_shows_field_errors() {
        let mut values = HashMap::new();
        values.insert("Contract".to_string(), "Two year".to_string());
        values.insert("tenure".to_string(), "-5".to_string());
        let errors = validate(&values).expect_err("incomplete");
        let html = render(&PageView {
            values: Some(&values),
            errors: Some(&errors),
            outcome: None,
            csrf_token: "tok",
        });
        assert!(html.contains(r#"<option value="Two year" selected>Two year</option>"#));
        assert!(html.contains(r#"value="-5""#));
        assert!(html.contains("Number must be at least 0."));
        assert!(html.contains("This field is required."));
    }

    #[test]
    fn senior_citizen_options_use_captions() {
        let html = render(&PageView::blank("tok"));
        assert!(html.contains(r#"<option value="0">No</option>"#));
        assert!(html.contains(r#"<option value="1">Yes</option>"#));
    }

    #[test]
    fn escapes_error_outcome() {
        let outcome = Outcome::Error("<bad> & worse".to_string());
        let html = render(&PageView {
            outcome: Some(&outcome),
            ..PageView::blank("tok")
        });
        assert!(html.contains("Error: &lt;bad&gt; &amp; worse"));
    }

    #[test]
    fn prediction_text_is_exact() {
        let outcome = Outcome::Prediction(Prediction::NoChurn);
        let html = render(&PageView {
            outcome: Some(&outcome),
            ..PageView::blank("tok")
        });
        assert!(html.contains(r#"class="prediction">No Churn</p>"#));
    }
}
