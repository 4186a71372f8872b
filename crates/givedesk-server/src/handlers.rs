//! HTTP Handlers

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use givedesk_payments::{DonationRequest, PaymentError, WebhookEvent, WebhookHandler};
use givedesk_qr::{OutputFormat, QrError, QrOptions, QrRequest};

use crate::config::flag;
use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub stripe_configured: bool,
    pub email_configured: bool,
    pub email_backend: &'static str,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: impl Into<String>, code: &str) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: code.into(),
        }),
    )
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentIntentResponse {
    #[serde(rename = "clientSecret")]
    pub client_secret: String,
}

/// Query string of `GET /api/qr`, straight from the widget's form fields
#[derive(Debug, Default, Deserialize)]
pub struct QrQuery {
    #[serde(default)]
    pub text: String,
    pub size: Option<String>,
    pub margin: Option<String>,
    pub ecc: Option<String>,
    pub dark: Option<String>,
    pub light: Option<String>,
    pub format: Option<String>,
    pub download: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        stripe_configured: state.stripe.is_some(),
        email_configured: state.notifier.delivers(),
        email_backend: state.notifier.name(),
    })
}

/// Create a Stripe payment intent for a donation
pub async fn create_payment_intent(
    State(state): State<AppState>,
    payload: Result<Json<DonationRequest>, JsonRejection>,
) -> Result<Json<PaymentIntentResponse>, ApiError> {
    let stripe = state.stripe.as_ref().ok_or_else(|| {
        api_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "Payments not configured",
            "PAYMENTS_DISABLED",
        )
    })?;

    let Json(request) = payload.map_err(|e| {
        api_error(StatusCode::BAD_REQUEST, e.body_text(), "INVALID_REQUEST")
    })?;

    let created = stripe
        .create_payment_intent(&request, &state.intent_options)
        .await
        .map_err(|e| match e {
            PaymentError::InvalidRequest(_) => {
                api_error(StatusCode::BAD_REQUEST, e.user_message(), "INVALID_REQUEST")
            }
            _ => {
                tracing::error!("Payment intent error: {}", e);
                api_error(StatusCode::BAD_GATEWAY, e.user_message(), "PAYMENT_ERROR")
            }
        })?;

    if state.notify_on_intent {
        let message = state.templates.intent_created(&request, chrono::Utc::now());
        if let Err(e) = state.notifier.send(&message).await {
            tracing::error!(payment_intent = %created.id, "Donation email failed: {}", e);
        }
    }

    Ok(Json(PaymentIntentResponse {
        client_secret: created.client_secret,
    }))
}

/// Stripe webhook handler
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let Some(stripe) = state.stripe.as_ref() else {
        return api_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "Payments not configured",
            "PAYMENTS_DISABLED",
        )
        .into_response();
    };

    let Some(signature) = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
    else {
        return (
            StatusCode::BAD_REQUEST,
            "Webhook Error: Missing Stripe signature",
        )
            .into_response();
    };

    let handler = WebhookHandler::new(
        state.notifier.clone(),
        state.templates.clone(),
        stripe.webhook_secret(),
    );

    let event = match handler.construct_event(&body, signature) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!("Webhook rejected: {}", e);
            return (StatusCode::BAD_REQUEST, format!("Webhook Error: {e}")).into_response();
        }
    };

    match handler.handle(event).await {
        Ok(WebhookEvent::PaymentSucceeded(summary)) => {
            tracing::debug!(donor = %summary.name, "Donation received");
            (StatusCode::OK, "Received").into_response()
        }
        Ok(WebhookEvent::Other { .. }) => (StatusCode::OK, "Received").into_response(),
        Err(e) => {
            tracing::error!("Webhook processing error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Webhook Error: {e}")).into_response()
        }
    }
}

/// Render a QR code as PNG or SVG
pub async fn qr_image(
    query: Result<Query<QrQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query.map_err(|e| {
        api_error(StatusCode::BAD_REQUEST, e.body_text(), "INVALID_OPTION")
    })?;

    let download = match query.download.as_deref().map(str::trim) {
        None | Some("") => false,
        Some(value) => flag(value).ok_or_else(|| {
            api_error(
                StatusCode::BAD_REQUEST,
                format!("invalid download flag {value:?}"),
                "INVALID_OPTION",
            )
        })?,
    };

    let format = query
        .format
        .as_deref()
        .filter(|f| !f.trim().is_empty())
        .map(str::parse::<OutputFormat>)
        .transpose()
        .map_err(qr_error)?
        .unwrap_or_default();

    let options = QrOptions::from_raw(
        query.size.as_deref(),
        query.margin.as_deref(),
        query.ecc.as_deref(),
        query.dark.as_deref(),
        query.light.as_deref(),
    )
    .map_err(qr_error)?;
    let request = QrRequest::new(&query.text, options).map_err(qr_error)?;

    let rendered = tokio::task::spawn_blocking(move || givedesk_qr::render(&request, format))
        .await
        .map_err(|e| {
            tracing::error!("QR render task failed: {}", e);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Rendering failed", "IMAGE_FAILED")
        })?
        .map_err(qr_error)?;

    let mut response = rendered.bytes.into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(rendered.content_type),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    if download {
        let disposition =
            HeaderValue::from_str(&format!("attachment; filename=\"{}\"", rendered.file_name))
                .map_err(|_| {
                    api_error(StatusCode::INTERNAL_SERVER_ERROR, "Rendering failed", "IMAGE_FAILED")
                })?;
        headers.insert(header::CONTENT_DISPOSITION, disposition);
    }

    Ok(response)
}

fn qr_error(e: QrError) -> ApiError {
    let status = if e.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        tracing::error!("QR render error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    };
    api_error(status, e.to_string(), e.code())
}
