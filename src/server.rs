//! HTTP surface: one page served by `GET /` and `POST /`, plus a health check.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Form, Router};
use tracing::{debug, info, warn};

use crate::classifier::{predict, Classifier};
use crate::config::ServerConfig;
use crate::csrf;
use crate::encoder;
use crate::page::{self, Outcome, PageView};
use crate::schema::{self, ValidatedForm, ValidationErrors};

/// State shared by every request: the read-only classifier.
#[derive(Clone)]
pub struct AppState {
    classifier: Arc<dyn Classifier>,
}

impl AppState {
    /// Wraps a loaded classifier.
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self { classifier }
    }
}

/// Builds the application router.
pub fn router(classifier: Arc<dyn Classifier>) -> Router {
    Router::new()
        .route("/", get(show_form).post(submit_form))
        .route("/healthz", get(healthz))
        .with_state(AppState::new(classifier))
}

/// Binds the configured address and serves until the process stops.
pub async fn serve(config: &ServerConfig, classifier: Arc<dyn Classifier>) -> Result<()> {
    let addr = config.bind();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("churnform listening on http://{addr}");
    axum::serve(listener, router(classifier))
        .await
        .context("server shutdown")?;
    Ok(())
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

async fn show_form(headers: HeaderMap) -> Response {
    let (token, fresh) = session_token(csrf::cookie_token(&headers));
    let html = page::render(&PageView::blank(&token));
    respond(html, fresh.then_some(token.as_str()))
}

async fn submit_form(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(submitted): Form<HashMap<String, String>>,
) -> Response {
    let cookie = csrf::cookie_token(&headers);
    let csrf_check = csrf::verify(
        cookie.as_deref(),
        submitted.get(csrf::FIELD_NAME).map(String::as_str),
    );
    let (token, fresh) = session_token(cookie);

    let validated = match (csrf_check, schema::validate(&submitted)) {
        (Ok(()), Ok(form)) => Ok(form),
        (Ok(()), Err(errors)) => Err(errors),
        (Err(failure), Ok(_)) => {
            let mut errors = ValidationErrors::default();
            errors.push_form(failure.to_string());
            Err(errors)
        }
        (Err(failure), Err(mut errors)) => {
            errors.push_form(failure.to_string());
            Err(errors)
        }
    };

    let html = match validated {
        Ok(form) => {
            let outcome = run_prediction(Arc::clone(&state.classifier), &form).await;
            page::render(&PageView {
                values: Some(&submitted),
                errors: None,
                outcome: Some(&outcome),
                csrf_token: &token,
            })
        }
        Err(errors) => {
            debug!(
                fields = ?errors.failed_fields().collect::<Vec<_>>(),
                form = ?errors.form(),
                "submission rejected"
            );
            page::render(&PageView {
                values: Some(&submitted),
                errors: Some(&errors),
                outcome: None,
                csrf_token: &token,
            })
        }
    };
    respond(html, fresh.then_some(token.as_str()))
}

/// Encodes a validated form and asks the classifier for a label.
///
/// Every failure becomes an [`Outcome::Error`]; nothing here fails the request.
pub async fn run_prediction(model: Arc<dyn Classifier>, form: &ValidatedForm) -> Outcome {
    let record = match form.to_record() {
        Ok(record) => record,
        Err(err) => {
            warn!("encoding failed: {err}");
            return Outcome::Error(err.to_string());
        }
    };
    let features = encoder::encode(&record);
    let result = tokio::task::spawn_blocking(move || predict(model.as_ref(), features)).await;
    match result {
        Ok(Ok(prediction)) => {
            info!(%prediction, "prediction served");
            Outcome::Prediction(prediction)
        }
        Ok(Err(err)) => {
            warn!("prediction failed: {err}");
            Outcome::Error(err.to_string())
        }
        Err(err) => {
            warn!("prediction task aborted: {err}");
            Outcome::Error("classifier task aborted".to_string())
        }
    }
}

fn session_token(cookie: Option<String>) -> (String, bool) {
    match cookie {
        Some(token) => (token, false),
        None => (csrf::new_token(), true),
    }
}

fn respond(html: String, new_token: Option<&str>) -> Response {
    let mut response = Html(html).into_response();
    if let Some(token) = new_token {
        match HeaderValue::from_str(&csrf::set_cookie(token)) {
            Ok(value) => {
                response.headers_mut().insert(SET_COOKIE, value);
            }
            Err(err) => warn!("could not encode csrf cookie: {err}"),
        }
    }
    response
}
