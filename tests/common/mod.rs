#![allow(dead_code)]

use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};
use uuid::Uuid;

use daycare_api::auth::{generate_jwt_with_secret, Claims};
use daycare_api::types::Role;

/// Secret handed to the spawned server so tests can mint their own tokens
pub const TEST_JWT_SECRET: &str = "integration-test-secret";

static SERVER: OnceLock<TestServer> = OnceLock::new();
static DB_SERVER: OnceLock<Option<TestServer>> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
    // The server exits when this pipe closes, i.e. when the test binary exits
    _stdin: Option<ChildStdin>,
    _images: tempfile::TempDir,
}

impl TestServer {
    fn spawn(database_url: Option<&str>) -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);
        let images = tempfile::tempdir().context("failed to create image dir")?;

        let mut cmd = Command::new(env!("CARGO_BIN_EXE_daycare-api"));
        cmd.env("DAYCARE_API_PORT", port.to_string())
            .env("APP_ENV", "development")
            .env("JWT_SECRET", TEST_JWT_SECRET)
            .env("STORAGE_IMAGE_DIR", images.path())
            .env("STORAGE_PUBLIC_BASE_URL", format!("{}/images/", base_url))
            .env("DAYCARE_API_EXIT_ON_STDIN_EOF", "1")
            .stdin(Stdio::piped())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        match database_url {
            Some(url) => cmd.env("DATABASE_URL", url),
            None => cmd.env_remove("DATABASE_URL"),
        };

        let mut child = cmd.spawn().context("failed to spawn server binary")?;
        let stdin = child.stdin.take();

        Ok(Self {
            port,
            base_url,
            child,
            _stdin: stdin,
            _images: images,
        })
    }

    async fn wait_ready(&self, timeout: Duration, wanted: &[StatusCode]) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if wanted.contains(&resp.status()) {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// A server of its own, not shared with other tests
    pub async fn start_private() -> Result<Self> {
        let server = Self::spawn(None)?;
        server
            .wait_ready(Duration::from_secs(10), &[StatusCode::OK, StatusCode::SERVICE_UNAVAILABLE])
            .await?;
        Ok(server)
    }

    /// Close stdin as the exiting test process would, then wait for the server to stop
    pub async fn close_stdin_and_wait(mut self, timeout: Duration) -> Result<ExitStatus> {
        drop(self._stdin.take());
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(status) = self.child.try_wait()? {
                return Ok(status);
            }
            if Instant::now() > deadline {
                let _ = self.child.kill();
                anyhow::bail!("server on {} still running {:?} after stdin closed", self.base_url, timeout);
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }
}

/// Server without a database: everything that fails before the first query
pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn(None).expect("failed to spawn server binary"));
    server
        .wait_ready(Duration::from_secs(10), &[StatusCode::OK, StatusCode::SERVICE_UNAVAILABLE])
        .await?;
    Ok(server)
}

/// Server backed by `DATABASE_URL`, with the schema applied. `None` when the
/// variable is unset, in which case database tests skip themselves.
pub async fn ensure_db_server() -> Result<Option<&'static TestServer>> {
    let server = DB_SERVER.get_or_init(|| {
        let url = std::env::var("DATABASE_URL").ok().filter(|url| !url.is_empty())?;
        let status = Command::new(env!("CARGO_BIN_EXE_daycare-admin"))
            .env("DATABASE_URL", &url)
            .env("APP_ENV", "development")
            .arg("init-schema")
            .stdin(Stdio::null())
            .status()
            .expect("failed to run daycare-admin init-schema");
        assert!(status.success(), "daycare-admin init-schema failed: {}", status);
        Some(TestServer::spawn(Some(&url)).expect("failed to spawn server binary"))
    });

    match server {
        Some(server) => {
            server.wait_ready(Duration::from_secs(15), &[StatusCode::OK]).await?;
            Ok(Some(server))
        }
        None => {
            eprintln!("DATABASE_URL not set, skipping database test");
            Ok(None)
        }
    }
}

/// Bearer token the spawned server will accept
pub fn token_for(roles: &[Role], daycare_id: Option<Uuid>) -> Result<String> {
    let claims = Claims::with_expiry(Uuid::new_v4(), "tester@daycare.example".to_string(), roles, daycare_id, 1);
    Ok(generate_jwt_with_secret(&claims, TEST_JWT_SECRET)?)
}

/// Assert an error envelope with the given status and code, returning the body
pub async fn assert_error(res: reqwest::Response, status: StatusCode, code: &str) -> Result<Value> {
    assert_eq!(res.status(), status);
    let body = res.json::<Value>().await?;
    assert_eq!(body["error"], true, "unexpected body: {}", body);
    assert_eq!(body["code"], code, "unexpected body: {}", body);
    Ok(body)
}

/// Assert a success envelope with the given status, returning `data`
pub async fn assert_data(res: reqwest::Response, status: StatusCode) -> Result<Value> {
    assert_eq!(res.status(), status);
    let body = res.json::<Value>().await?;
    assert_eq!(body["success"], true, "unexpected body: {}", body);
    Ok(body["data"].clone())
}

/// Admin-side client for setting up fixtures
pub struct Api {
    client: reqwest::Client,
    server: &'static TestServer,
    token: String,
}

impl Api {
    pub fn admin(server: &'static TestServer) -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::new(),
            server,
            token: token_for(&[Role::Admin], None)?,
        })
    }

    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.get(self.server.url(path)).bearer_auth(&self.token)
    }

    pub fn post(&self, path: &str, body: &Value) -> reqwest::RequestBuilder {
        self.client.post(self.server.url(path)).bearer_auth(&self.token).json(body)
    }

    pub fn patch(&self, path: &str, body: &Value) -> reqwest::RequestBuilder {
        self.client.patch(self.server.url(path)).bearer_auth(&self.token).json(body)
    }

    pub fn delete(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.delete(self.server.url(path)).bearer_auth(&self.token)
    }

    /// POST expecting 201, returning the new row's `id`
    pub async fn create(&self, path: &str, body: Value) -> Result<Uuid> {
        let data = assert_data(self.post(path, &body).send().await?, StatusCode::CREATED).await?;
        let id = data["id"]
            .as_str()
            .or_else(|| data["child"]["id"].as_str())
            .with_context(|| format!("no id in {}", data))?;
        Ok(Uuid::parse_str(id)?)
    }

    pub async fn daycare(&self) -> Result<Uuid> {
        let tag = Uuid::new_v4().simple().to_string();
        self.create(
            "/api/daycares",
            json!({ "name": format!("Sunny Days {}", &tag[..8]), "address": "12 Rue des Lilas" }),
        )
        .await
    }

    pub async fn responsible(&self, daycare_id: Uuid) -> Result<Uuid> {
        let tag = Uuid::new_v4().simple().to_string();
        self.create(
            "/api/responsibles",
            json!({
                "email": format!("parent-{}@daycare.example", tag),
                "password": "correct-horse",
                "first_name": "Claire",
                "last_name": "Dubois",
                "gender": "female",
                "daycare_id": daycare_id,
            }),
        )
        .await
    }
}
