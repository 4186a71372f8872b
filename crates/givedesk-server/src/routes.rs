//! Router

use std::path::Path;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::handlers::{create_payment_intent, health_check, qr_image, stripe_webhook};
use crate::state::AppState;

pub fn router(state: AppState, static_dir: &Path) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        // Payments
        .route("/api/create-payment-intent", post(create_payment_intent))
        .route("/api/webhook", post(stripe_webhook))
        .route("/webhook/stripe", post(stripe_webhook))
        // QR widget
        .route("/api/qr", get(qr_image))
        // Static files (WASM frontend)
        .fallback_service(ServeDir::new(static_dir))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        response::Response,
        Json,
    };
    use givedesk_payments::{
        EmailMessage, IntentOptions, LogNotifier, NotificationTemplate, Notifier, PaymentError,
        Result as PaymentResult, Sender, StripeClient,
    };
    use hmac::{Hmac, Mac};
    use sha2::Sha256;
    use tower::ServiceExt;

    use super::*;

    const WEBHOOK_SECRET: &str = "whsec_routes_test";

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<EmailMessage>>,
        fail: bool,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, message: &EmailMessage) -> PaymentResult<()> {
            self.sent.lock().unwrap().push(message.clone());
            if self.fail {
                return Err(PaymentError::Email("503: mail api unavailable".into()));
            }
            Ok(())
        }

        fn name(&self) -> &'static str {
            "recording"
        }
    }

    fn state_with(stripe: Option<StripeClient>, notifier: Arc<dyn Notifier>) -> AppState {
        AppState {
            stripe: stripe.map(Arc::new),
            notifier,
            templates: Arc::new(NotificationTemplate::new(
                "board@example.org",
                Sender::default(),
            )),
            intent_options: Arc::new(IntentOptions::default()),
            notify_on_intent: true,
        }
    }

    fn app(with_stripe: bool) -> (Router, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::default());
        let stripe = with_stripe.then(|| StripeClient::new("sk_test_routes", WEBHOOK_SECRET));
        let state = state_with(stripe, notifier.clone());
        (router(state, Path::new("static")), notifier)
    }

    /// Router backed by a local Stripe mock answering intents with `status`
    async fn app_with_stripe_api(
        status: StatusCode,
        notifier: Arc<RecordingNotifier>,
    ) -> Router {
        let stripe_api = Router::new().route(
            "/v1/payment_intents",
            post(move || async move {
                let body = if status.is_success() {
                    serde_json::json!({
                        "id": "pi_route",
                        "object": "payment_intent",
                        "amount": 5000,
                        "amount_capturable": 0,
                        "amount_received": 0,
                        "capture_method": "automatic",
                        "confirmation_method": "automatic",
                        "created": 1_700_000_000,
                        "currency": "usd",
                        "livemode": false,
                        "metadata": {},
                        "payment_method_types": ["card", "us_bank_account"],
                        "status": "requires_payment_method",
                        "client_secret": "pi_route_secret_456"
                    })
                } else {
                    serde_json::json!({
                        "error": { "type": "api_error", "message": "stripe is down" }
                    })
                };
                (status, Json(body))
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, stripe_api).await.unwrap();
        });

        let stripe = StripeClient::with_api_base(
            "sk_test_routes",
            WEBHOOK_SECRET,
            &format!("http://{addr}/"),
        )
        .unwrap();
        router(state_with(Some(stripe), notifier), Path::new("static"))
    }

    fn donation_request() -> Request<Body> {
        let body = serde_json::json!({
            "amount": 5000,
            "name": "Grace Hopper",
            "email": "grace@example.com",
            "method": "card",
            "address": {
                "line1": "1 Navy Way",
                "city": "Arlington",
                "state": "VA",
                "postal_code": "22202"
            }
        });
        Request::post("/api/create-payment-intent")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_string(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn sign(payload: &str) -> String {
        let timestamp = chrono::Utc::now().timestamp();
        let mut mac = Hmac::<Sha256>::new_from_slice(WEBHOOK_SECRET.as_bytes()).unwrap();
        mac.update(format!("{timestamp}.{payload}").as_bytes());
        format!("t={timestamp},v1={}", hex::encode(mac.finalize().into_bytes()))
    }

    fn webhook_request(payload: &str, signature: Option<&str>) -> Request<Body> {
        let mut builder = Request::post("/api/webhook").header(header::CONTENT_TYPE, "application/json");
        if let Some(signature) = signature {
            builder = builder.header("stripe-signature", signature);
        }
        builder.body(Body::from(payload.to_string())).unwrap()
    }

    fn succeeded_payload() -> String {
        serde_json::json!({
            "id": "evt_route",
            "type": "payment_intent.succeeded",
            "data": {
                "object": {
                    "id": "pi_route",
                    "amount_received": 10_000,
                    "created": 1_700_000_000,
                    "metadata": {
                        "name": "Katherine Johnson",
                        "email": "kj@example.com",
                        "phone": "555-0199",
                        "method": "ach_credit_transfer",
                        "address": "1 Orbit Rd, Hampton, VA 23666"
                    }
                }
            }
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app(false);
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["stripe_configured"], false);
        assert_eq!(body["email_configured"], true);
        assert_eq!(body["email_backend"], "recording");
    }

    #[tokio::test]
    async fn test_health_with_log_only_email() {
        let app = router(state_with(None, Arc::new(LogNotifier)), Path::new("static"));
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["email_configured"], false);
        assert_eq!(body["email_backend"], "log");
    }

    #[tokio::test]
    async fn test_payment_intent_returns_client_secret_and_emails_board() {
        let notifier = Arc::new(RecordingNotifier::default());
        let app = app_with_stripe_api(StatusCode::OK, notifier.clone()).await;

        let response = app.oneshot(donation_request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body, serde_json::json!({ "clientSecret": "pi_route_secret_456" }));

        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "board@example.org");
        assert_eq!(sent[0].subject, "New Donation (Card) from Grace Hopper");
        assert!(sent[0].body.starts_with("A new donation has been initiated:"));
        assert!(sent[0].body.contains("Amount: $50.00"));
    }

    #[tokio::test]
    async fn test_payment_intent_succeeds_when_email_fails() {
        let notifier = Arc::new(RecordingNotifier {
            fail: true,
            ..RecordingNotifier::default()
        });
        let app = app_with_stripe_api(StatusCode::OK, notifier.clone()).await;

        let response = app.oneshot(donation_request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_string(response).await.contains("pi_route_secret_456"));
        assert_eq!(notifier.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_payment_intent_stripe_failure_is_bad_gateway() {
        let notifier = Arc::new(RecordingNotifier::default());
        let app = app_with_stripe_api(StatusCode::INTERNAL_SERVER_ERROR, notifier.clone()).await;

        let response = app.oneshot(donation_request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["code"], "PAYMENT_ERROR");
        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_payment_intent_without_stripe_is_unavailable() {
        let (app, _) = app(false);
        let response = app
            .oneshot(
                Request::post("/api/create-payment-intent")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"amount":100,"name":"A","email":"a@b.c"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(body_string(response).await.contains("PAYMENTS_DISABLED"));
    }

    #[tokio::test]
    async fn test_payment_intent_rejects_bad_body() {
        let (app, notifier) = app(true);
        let response = app
            .oneshot(
                Request::post("/api/create-payment-intent")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"amount":"lots"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_string(response).await.contains("INVALID_REQUEST"));
        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_payment_intent_rejects_zero_amount() {
        let (app, _) = app(true);
        let response = app
            .oneshot(
                Request::post("/api/create-payment-intent")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"amount":0,"name":"A","email":"a@b.c"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_string(response).await.contains("must be positive"));
    }

    #[tokio::test]
    async fn test_webhook_requires_signature() {
        let (app, _) = app(true);
        let response = app.oneshot(webhook_request("{}", None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_string(response).await.starts_with("Webhook Error:"));
    }

    #[tokio::test]
    async fn test_webhook_rejects_bad_signature() {
        let (app, notifier) = app(true);
        let payload = succeeded_payload();
        let response = app
            .oneshot(webhook_request(&payload, Some("t=1,v1=00")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_string(response).await.starts_with("Webhook Error: Webhook signature invalid"));
        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_webhook_succeeded_notifies_board() {
        let (app, notifier) = app(true);
        let payload = succeeded_payload();
        let signature = sign(&payload);
        let response = app
            .oneshot(webhook_request(&payload, Some(&signature)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "Received");

        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0].subject,
            "New Donation (ACH Credit Transfer) from Katherine Johnson"
        );
        assert!(sent[0].body.contains("Amount: $100.00"));
        assert!(sent[0].body.contains("Phone: 555-0199"));
    }

    #[tokio::test]
    async fn test_webhook_alias_route_and_other_events() {
        let (app, notifier) = app(true);
        let payload = r#"{"id":"evt_o","type":"customer.created","data":{"object":{}}}"#;
        let signature = sign(payload);
        let request = Request::post("/webhook/stripe")
            .header("stripe-signature", signature)
            .body(Body::from(payload))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_qr_png_download() {
        let (app, _) = app(false);
        let response = app
            .oneshot(
                Request::get("/api/qr?text=https%3A%2F%2Fexample.com&format=png&download=true")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"qr.png\""
        );
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..4], b"\x89PNG");
    }

    #[tokio::test]
    async fn test_qr_download_flag_forms() {
        let (app, _) = app(false);

        for (flag, attached) in [("1", true), ("yes", true), ("0", false), ("", false)] {
            let uri = format!("/api/qr?text=hi&format=svg&download={flag}");
            let response = app
                .clone()
                .oneshot(Request::get(uri.as_str()).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{uri}");
            assert_eq!(
                response.headers().get(header::CONTENT_DISPOSITION).is_some(),
                attached,
                "{uri}"
            );
        }
    }

    #[tokio::test]
    async fn test_qr_svg_preview() {
        let (app, _) = app(false);
        let response = app
            .oneshot(
                Request::get("/api/qr?text=HELLO&format=svg&size=512&dark=%23112233")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/svg+xml");
        assert!(response.headers().get(header::CONTENT_DISPOSITION).is_none());

        let svg = body_string(response).await;
        assert!(svg.contains(r#"width="512""#));
        assert!(svg.contains("#112233"));
    }

    #[tokio::test]
    async fn test_qr_errors() {
        let (app, _) = app(false);

        for (uri, code) in [
            ("/api/qr?text=%20%20", "EMPTY_TEXT"),
            ("/api/qr?text=hi&ecc=Z", "INVALID_OPTION"),
            ("/api/qr?text=hi&format=gif", "INVALID_OPTION"),
            ("/api/qr?text=hi&download=maybe", "INVALID_OPTION"),
        ] {
            let response = app
                .clone()
                .oneshot(Request::get(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
            assert!(body_string(response).await.contains(code), "{uri}");
        }
    }
}
