#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use hospital_api::auth::{Identity, Role, Signup};
use hospital_api::config::AppConfig;
use hospital_api::database::MemoryStore;
use hospital_api::{app, AppState};

pub const PASSWORD: &str = "correct-horse-battery";

// ---- router harness ----

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.security.jwt_secret = "router-test-secret".to_string();
    config.query.max_limit = Some(50);
    config
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
}

impl TestApp {
    pub fn new() -> Self {
        let (state, store) = AppState::in_memory(&test_config());
        Self::from_state(state, store)
    }

    pub fn from_state(state: AppState, store: Arc<MemoryStore>) -> Self {
        Self { router: app(state.clone()), state, store }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.expect("router is infallible")
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder().method(Method::GET).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(&self, uri: &str, fields: &[(&str, &str)], cookie: Option<&str>) -> Response {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body)).unwrap()).await
    }

    /// Register through POST /signup and return the `jwt=...` cookie pair
    pub async fn signup(&self, name: &str, email: &str, role: &str) -> String {
        let res = self
            .post_form(
                "/signup",
                &[
                    ("name", name),
                    ("email", email),
                    ("password", PASSWORD),
                    ("password_confirm", PASSWORD),
                    ("role", role),
                ],
                None,
            )
            .await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER, "signup failed for {}", email);
        session_cookie(&res).expect("signup sets the session cookie")
    }

    /// Create an identity directly, bypassing the self-registration rules
    pub async fn provision(&self, email: &str, role: Role) -> Identity {
        self.state
            .credentials
            .provision(Signup {
                name: format!("{} account", role),
                email: email.to_string(),
                password: PASSWORD.to_string(),
                password_confirm: PASSWORD.to_string(),
                role,
            })
            .await
            .expect("provision identity")
    }

    pub async fn login(&self, email: &str, role: &str) -> String {
        let res = self
            .post_form("/login", &[("email", email), ("password", PASSWORD), ("role", role)], None)
            .await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER, "login failed for {}", email);
        session_cookie(&res).expect("login sets the session cookie")
    }
}

/// `jwt=<token>` from a response's Set-Cookie headers
pub fn session_cookie(res: &Response) -> Option<String> {
    res.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("jwt="))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

pub fn location(res: &Response) -> Option<&str> {
    res.headers().get(header::LOCATION).and_then(|v| v.to_str().ok())
}

pub async fn body_json(res: Response) -> Value {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

// ---- spawned binary harness ----

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut cmd = Command::new(env!("CARGO_BIN_EXE_hospital-api"));
        cmd.args(["--memory", "--port", &port.to_string()])
            .env("JWT_SECRET", "spawned-server-secret")
            .env("APP_ENV", "development")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == reqwest::StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}
