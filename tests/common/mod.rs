#![allow(dead_code)]

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use txguard::domain::risk::{
    FrictionDirective, FrictionKind, RecommendedAction, RiskLevel, RiskReason, RiskResult,
    Severity,
};

pub fn low_risk() -> RiskResult {
    RiskResult::new(
        12,
        RiskLevel::Low,
        RecommendedAction::Allow,
        FrictionDirective::new(FrictionKind::None, 0),
    )
}

pub fn warning_risk() -> RiskResult {
    RiskResult::new(
        38,
        RiskLevel::Medium,
        RecommendedAction::Warn,
        FrictionDirective::new(FrictionKind::Toast, 0),
    )
}

pub fn delayed_risk(seconds: u32) -> RiskResult {
    RiskResult::new(
        58,
        RiskLevel::Medium,
        RecommendedAction::Warn,
        FrictionDirective::new(FrictionKind::Delay, seconds),
    )
}

pub fn blocked_risk() -> RiskResult {
    RiskResult::new(
        91,
        RiskLevel::High,
        RecommendedAction::Block,
        FrictionDirective::new(FrictionKind::Block, 10),
    )
    .with_reason(RiskReason {
        rule_id: "SCAM_KEYWORD".to_string(),
        title: "OTP mentioned in remarks".to_string(),
        description: "Remarks ask for a one-time password.".to_string(),
        severity: Severity::High,
        score_added: 40,
        contribution_percent: Some(44.0),
    })
}

/// Scripted stand-in for the risk and transaction services.
///
/// Clones share state, so a test keeps one handle while the server runs on another.
#[derive(Clone)]
pub struct MockServices {
    inner: Arc<Inner>,
}

struct Inner {
    analyze_status: Mutex<StatusCode>,
    analyze_body: Mutex<Value>,
    analyze_delay: Mutex<Option<Duration>>,
    send_status: Mutex<StatusCode>,
    analyze_calls: AtomicUsize,
    sent: Mutex<Vec<Value>>,
}

impl MockServices {
    pub fn new(risk: RiskResult) -> Self {
        Self {
            inner: Arc::new(Inner {
                analyze_status: Mutex::new(StatusCode::OK),
                analyze_body: Mutex::new(serde_json::to_value(risk).unwrap()),
                analyze_delay: Mutex::new(None),
                send_status: Mutex::new(StatusCode::OK),
                analyze_calls: AtomicUsize::new(0),
                sent: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn with_analyze_status(self, status: StatusCode) -> Self {
        *self.inner.analyze_status.lock().unwrap() = status;
        self
    }

    pub fn with_analyze_body(self, body: Value) -> Self {
        *self.inner.analyze_body.lock().unwrap() = body;
        self
    }

    pub fn with_analyze_delay(self, delay: Duration) -> Self {
        *self.inner.analyze_delay.lock().unwrap() = Some(delay);
        self
    }

    pub fn set_send_status(&self, status: StatusCode) {
        *self.inner.send_status.lock().unwrap() = status;
    }

    pub fn analyze_calls(&self) -> usize {
        self.inner.analyze_calls.load(Ordering::SeqCst)
    }

    /// Bodies received on `/api/send`, in arrival order.
    pub fn sent(&self) -> Vec<Value> {
        self.inner.sent.lock().unwrap().clone()
    }

    /// Serves on an ephemeral local port and returns the base URL.
    pub async fn spawn(&self) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new()
            .route("/api/analyze", post(analyze))
            .route("/api/send", post(send))
            .with_state(self.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    /// Serves from a dedicated runtime thread, for tests that are not async.
    pub fn spawn_in_background(&self) -> String {
        let services = self.clone();
        let (tx, rx) = std::sync::mpsc::channel();
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().unwrap();
            runtime.block_on(async move {
                tx.send(services.spawn().await).unwrap();
                std::future::pending::<()>().await;
            });
        });
        rx.recv().unwrap()
    }
}

async fn analyze(
    State(services): State<MockServices>,
    Json(_body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    services.inner.analyze_calls.fetch_add(1, Ordering::SeqCst);
    let delay = *services.inner.analyze_delay.lock().unwrap();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    let status = *services.inner.analyze_status.lock().unwrap();
    let body = services.inner.analyze_body.lock().unwrap().clone();
    (status, Json(body))
}

async fn send(
    State(services): State<MockServices>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    services.inner.sent.lock().unwrap().push(body);
    let status = *services.inner.send_status.lock().unwrap();
    let count = services.inner.sent.lock().unwrap().len();
    (
        status,
        Json(json!({ "id": format!("TXN{count:04}"), "status": "completed" })),
    )
}
