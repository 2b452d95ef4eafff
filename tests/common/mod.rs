#![allow(dead_code)]

use async_trait::async_trait;
use axum_test::TestServer;
use chrono::Utc;
use serde_json::{Value, json};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use waste_exchange::config::{Config, TierLimit};
use waste_exchange::domain::entities::{
    NewUser, NewWasteListing, ProfileUpdate, StatusChange, User, WasteListing, WasteSearch,
};
use waste_exchange::domain::rate_limit::Tier;
use waste_exchange::domain::repositories::{UserRepository, WasteRepository};
use waste_exchange::error::AppError;
use waste_exchange::infrastructure::clock::ManualClock;
use waste_exchange::infrastructure::counter::{
    CounterError, CounterResult, CounterSnapshot, CounterStore, MemoryCounterStore, WindowHit,
};
use waste_exchange::routes::{RouterConfig, app_router};
use waste_exchange::server::build_state;
use waste_exchange::state::AppState;

pub const JWT_SECRET: &str = "integration-test-secret";
pub const PASSWORD: &str = "Str0ng!Pass";
pub const CLIENT_IP: &str = "203.0.113.7";

/// Users kept in a vector. `fail` makes every call return a database error.
#[derive(Default)]
pub struct FakeUserRepository {
    users: Mutex<Vec<User>>,
    next_id: AtomicI64,
    pub fail: AtomicBool,
}

impl FakeUserRepository {
    fn check(&self) -> Result<(), AppError> {
        if self.fail.load(Ordering::SeqCst) {
            Err(AppError::internal("Database error"))
        } else {
            Ok(())
        }
    }

    fn with_user<T>(&self, id: i64, f: impl FnOnce(&mut User) -> T) -> Option<T> {
        let mut users = self.users.lock().unwrap();
        users.iter_mut().find(|u| u.id == id).map(f)
    }

    pub fn get(&self, id: i64) -> Option<User> {
        self.with_user(id, |u| u.clone())
    }
}

#[async_trait]
impl UserRepository for FakeUserRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        self.check()?;
        Ok(self.get(id))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.check()?;
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User, AppError> {
        self.check()?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let now = Utc::now();
        let user = User {
            id,
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            company: user.company,
            location: user.location,
            role: user.role,
            impact_score: 0,
            total_waste_listed: 0,
            badges: Vec::new(),
            login_attempts: 0,
            last_login: None,
            created_at: now,
            updated_at: now,
        };
        self.users.lock().unwrap().push(user.clone());
        Ok(user)
    }

    async fn update_profile(
        &self,
        id: i64,
        update: ProfileUpdate,
    ) -> Result<Option<User>, AppError> {
        self.check()?;
        Ok(self.with_user(id, |u| {
            if let Some(name) = update.name {
                u.name = name;
            }
            if let Some(company) = update.company {
                u.company = Some(company);
            }
            if let Some(location) = update.location {
                u.location = Some(location);
            }
            u.updated_at = Utc::now();
            u.clone()
        }))
    }

    async fn record_failed_login(&self, id: i64) -> Result<(), AppError> {
        self.check()?;
        self.with_user(id, |u| u.login_attempts += 1);
        Ok(())
    }

    async fn record_successful_login(&self, id: i64) -> Result<(), AppError> {
        self.check()?;
        self.with_user(id, |u| {
            u.login_attempts = 0;
            u.last_login = Some(Utc::now());
        });
        Ok(())
    }

    async fn increment_waste_listed(&self, id: i64) -> Result<(), AppError> {
        self.check()?;
        self.with_user(id, |u| u.total_waste_listed += 1);
        Ok(())
    }

    async fn health_check(&self) -> bool {
        !self.fail.load(Ordering::SeqCst)
    }
}

/// Listings kept in a vector, newest last.
#[derive(Default)]
pub struct FakeWasteRepository {
    listings: Mutex<Vec<WasteListing>>,
    next_id: AtomicI64,
}

fn newest_first(mut listings: Vec<WasteListing>) -> Vec<WasteListing> {
    listings.reverse();
    listings
}

#[async_trait]
impl WasteRepository for FakeWasteRepository {
    async fn create(&self, listing: NewWasteListing) -> Result<WasteListing, AppError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let now = Utc::now();
        let listing = WasteListing {
            id,
            title: listing.title,
            description: listing.description,
            quantity: listing.quantity,
            unit: listing.unit,
            waste_type: listing.waste_type,
            location: listing.location,
            availability: listing.availability,
            scheduled_date: listing.scheduled_date,
            image_url: listing.image_url,
            status: Default::default(),
            notes: None,
            owner_id: listing.owner_id,
            collector_id: None,
            recycler_id: None,
            created_at: now,
            updated_at: now,
        };
        self.listings.lock().unwrap().push(listing.clone());
        Ok(listing)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<WasteListing>, AppError> {
        let listings = self.listings.lock().unwrap();
        Ok(listings.iter().find(|l| l.id == id).cloned())
    }

    async fn update_status(
        &self,
        id: i64,
        change: StatusChange,
    ) -> Result<Option<WasteListing>, AppError> {
        let mut listings = self.listings.lock().unwrap();
        Ok(listings.iter_mut().find(|l| l.id == id).map(|l| {
            l.status = change.status;
            if change.notes.is_some() {
                l.notes = change.notes;
            }
            if change.collector_id.is_some() {
                l.collector_id = change.collector_id;
            }
            if change.recycler_id.is_some() {
                l.recycler_id = change.recycler_id;
            }
            l.updated_at = Utc::now();
            l.clone()
        }))
    }

    async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<WasteListing>, AppError> {
        let listings = self.listings.lock().unwrap();
        Ok(newest_first(
            listings
                .iter()
                .filter(|l| l.owner_id == owner_id)
                .cloned()
                .collect(),
        ))
    }

    async fn search(&self, filter: WasteSearch) -> Result<Vec<WasteListing>, AppError> {
        let query = filter.query.map(|q| q.to_lowercase());
        let listings = self.listings.lock().unwrap();
        Ok(newest_first(
            listings
                .iter()
                .filter(|l| {
                    query.as_ref().is_none_or(|q| {
                        l.title.to_lowercase().contains(q)
                            || l.description.to_lowercase().contains(q)
                    })
                })
                .filter(|l| filter.waste_type.is_none_or(|t| l.waste_type == t))
                .filter(|l| filter.status.is_none_or(|s| l.status == s))
                .cloned()
                .collect(),
        ))
    }
}

/// Counter store that is always unreachable.
pub struct DownCounterStore;

#[async_trait]
impl CounterStore for DownCounterStore {
    async fn hit(&self, _key: &str, _limit: u64, _window: Duration) -> CounterResult<WindowHit> {
        Err(CounterError::Connection("connection refused".to_string()))
    }

    async fn peek(&self, _key: &str) -> CounterResult<Option<CounterSnapshot>> {
        Err(CounterError::Connection("connection refused".to_string()))
    }

    async fn reset(&self, _key: &str) -> CounterResult<()> {
        Err(CounterError::Connection("connection refused".to_string()))
    }

    async fn health_check(&self) -> bool {
        false
    }
}

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://localhost/waste_exchange_test".to_string(),
        redis_url: None,
        listen_addr: "127.0.0.1:0".to_string(),
        log_level: "warn".to_string(),
        log_format: "text".to_string(),
        behind_proxy: true,
        frontend_url: None,
        uploads_dir: "uploads".to_string(),
        jwt_secret: JWT_SECRET.to_string(),
        jwt_ttl_seconds: 3600,
        bcrypt_cost: 4,
        general_limit: TierLimit::default_for(Tier::General),
        login_limit: TierLimit::default_for(Tier::Login),
        account_limit: TierLimit::default_for(Tier::AccountCreation),
        counter_store_timeout_ms: 100,
        counter_store_max_attempts: 1,
        user_lookup_timeout_ms: 500,
        max_body_bytes: 10 * 1024,
        sanitize_max_depth: 32,
        db_max_connections: 1,
        db_connect_timeout: 1,
    }
}

/// A running router over fake repositories and an in-process counter store
/// driven by a manual clock.
pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub users: Arc<FakeUserRepository>,
    pub listings: Arc<FakeWasteRepository>,
    pub clock: ManualClock,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: Config) -> Self {
        Self::build(config, None)
    }

    /// Like [`TestApp::new`] but the primary counter store is unreachable.
    pub fn with_counter_store_down() -> Self {
        Self::build(test_config(), Some(Arc::new(DownCounterStore)))
    }

    fn build(config: Config, primary: Option<Arc<dyn CounterStore>>) -> Self {
        let clock = ManualClock::new();
        let memory: Arc<dyn CounterStore> =
            Arc::new(MemoryCounterStore::with_clock(Arc::new(clock.clone())));
        let primary = primary.unwrap_or_else(|| memory.clone());

        let users = Arc::new(FakeUserRepository::default());
        let listings = Arc::new(FakeWasteRepository::default());

        let state = build_state(&config, users.clone(), listings.clone(), primary, memory);
        let app = app_router(state.clone(), &RouterConfig::from_config(&config));
        let server = TestServer::new(app).unwrap();

        Self {
            server,
            state,
            users,
            listings,
            clock,
        }
    }

    /// Registers a user from `ip` and returns `(id, token)`.
    pub async fn register_from(&self, ip: &str, email: &str, role: &str) -> (i64, String) {
        let response = self
            .server
            .post("/api/users/register")
            .add_header("x-forwarded-for", ip)
            .json(&registration(email, role))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);

        let json = response.json::<Value>();
        (
            json["user"]["id"].as_i64().unwrap(),
            json["token"].as_str().unwrap().to_string(),
        )
    }

    pub async fn register(&self, email: &str, role: &str) -> (i64, String) {
        self.register_from(CLIENT_IP, email, role).await
    }

    /// Creates a listing owned by the token holder and returns its id.
    pub async fn create_listing(&self, token: &str, body: Value) -> i64 {
        let response = self
            .server
            .post("/api/waste")
            .add_header("x-forwarded-for", CLIENT_IP)
            .authorization_bearer(token)
            .json(&body)
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        response.json::<Value>()["data"]["id"].as_i64().unwrap()
    }
}

pub fn registration(email: &str, role: &str) -> Value {
    json!({
        "name": "Test User",
        "email": email,
        "password": PASSWORD,
        "company": "Acme Recycling",
        "location": "Rotterdam",
        "role": role,
    })
}

pub fn listing_body(title: &str) -> Value {
    json!({
        "title": title,
        "description": "Clean sorted material ready for pickup",
        "quantity": 120.5,
        "unit": "kg",
        "wasteType": "plastic",
        "location": "Dock 7, Rotterdam",
        "availability": "immediate",
    })
}
