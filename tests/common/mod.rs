#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use serde_json::Value;
use tower::ServiceExt;

use evote_admin::auth::password::hash_password;
use evote_admin::auth::TokenKeys;
use evote_admin::database::models::{AccountStatus, Identity, UserLogin, UserRecord};
use evote_admin::database::{HealthProbe, LifecycleState, Page, StoreFault, UserStore};
use evote_admin::{router, AppState};

pub const SECRET: &[u8] = b"integration-test-secret-0123456789";
pub const PASSWORD: &str = "correct horse battery staple";

pub const ADMIN_ID: u64 = 1;
pub const OFFICER_ID: u64 = 2;
pub const VOTER_ID: u64 = 3;
pub const INACTIVE_ID: u64 = 4;

struct StoredUser {
    record: UserRecord,
    password_hash: String,
}

/// In-memory user table that counts every store access
pub struct MemoryUserStore {
    users: Mutex<Vec<StoredUser>>,
    accesses: AtomicUsize,
    broken: Mutex<Option<StoreFault>>,
}

impl MemoryUserStore {
    pub fn seeded() -> Self {
        let hash = hash_password(PASSWORD).expect("hash");
        let now = Utc::now();
        let users = [
            (ADMIN_ID, "admin", "active"),
            (OFFICER_ID, "officer", "active"),
            (VOTER_ID, "voter", "active"),
            (INACTIVE_ID, "officer", "inactive"),
        ]
        .into_iter()
        .map(|(id, role, status)| StoredUser {
            record: UserRecord {
                identity: Identity {
                    id,
                    email: format!("{}{}@example.org", role, id),
                    name: format!("Test {} {}", role, id),
                    role: role.to_string(),
                    status: status.to_string(),
                },
                created_at: now,
                updated_at: now,
            },
            password_hash: hash.clone(),
        })
        .collect();

        Self {
            users: Mutex::new(users),
            accesses: AtomicUsize::new(0),
            broken: Mutex::new(None),
        }
    }

    pub fn accesses(&self) -> usize {
        self.accesses.load(Ordering::SeqCst)
    }

    /// Make every subsequent call fail with `fault`
    pub fn break_with(&self, fault: StoreFault) {
        *self.broken.lock().unwrap() = Some(fault);
    }

    fn touch(&self) -> Result<(), StoreFault> {
        self.accesses.fetch_add(1, Ordering::SeqCst);
        match self.broken.lock().unwrap().clone() {
            Some(fault) => Err(fault),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_identity(&self, id: u64) -> Result<Option<Identity>, StoreFault> {
        self.touch()?;
        let users = self.users.lock().unwrap();
        Ok(users
            .iter()
            .find(|u| u.record.identity.id == id)
            .map(|u| u.record.identity.clone()))
    }

    async fn find_login(&self, email: &str) -> Result<Option<UserLogin>, StoreFault> {
        self.touch()?;
        let users = self.users.lock().unwrap();
        Ok(users
            .iter()
            .find(|u| u.record.identity.email == email)
            .map(|u| UserLogin {
                identity: u.record.identity.clone(),
                password_hash: u.password_hash.clone(),
            }))
    }

    async fn list_users(&self, page: Page) -> Result<Vec<UserRecord>, StoreFault> {
        self.touch()?;
        let users = self.users.lock().unwrap();
        Ok(users
            .iter()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .map(|u| u.record.clone())
            .collect())
    }

    async fn find_user(&self, id: u64) -> Result<Option<UserRecord>, StoreFault> {
        self.touch()?;
        let users = self.users.lock().unwrap();
        Ok(users
            .iter()
            .find(|u| u.record.identity.id == id)
            .map(|u| u.record.clone()))
    }

    async fn set_status(
        &self,
        id: u64,
        status: AccountStatus,
    ) -> Result<Option<UserRecord>, StoreFault> {
        self.touch()?;
        let mut users = self.users.lock().unwrap();
        Ok(users
            .iter_mut()
            .find(|u| u.record.identity.id == id)
            .map(|u| {
                u.record.identity.status = status.as_str().to_string();
                u.record.updated_at = Utc::now();
                u.record.clone()
            }))
    }
}

/// Health probe with a switchable outcome
pub struct FakeProbe {
    pub fault: Mutex<Option<StoreFault>>,
}

#[async_trait]
impl HealthProbe for FakeProbe {
    async fn health_check(&self) -> Result<(), StoreFault> {
        match self.fault.lock().unwrap().clone() {
            Some(fault) => Err(fault),
            None => Ok(()),
        }
    }

    async fn state(&self) -> LifecycleState {
        LifecycleState::Healthy
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryUserStore>,
    pub probe: Arc<FakeProbe>,
    pub keys: Arc<TokenKeys>,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryUserStore::seeded());
        let probe = Arc::new(FakeProbe {
            fault: Mutex::new(None),
        });
        let keys = Arc::new(TokenKeys::new(SECRET, Duration::hours(1)));
        let state = AppState::new(keys.clone(), store.clone(), probe.clone());

        Self {
            router: router(state),
            store,
            probe,
            keys,
        }
    }

    /// Token for a seeded user, regardless of that user's status
    pub fn token_for(&self, id: u64) -> String {
        let identity = Identity {
            id,
            email: String::new(),
            name: String::new(),
            role: String::new(),
            status: "active".to_string(),
        };
        self.keys.issue(&identity).expect("sign").token
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, body)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(request(Method::GET, uri, token, None)).await
    }
}

pub fn request(method: Method, uri: &str, token: Option<&str>, json: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match json {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}
