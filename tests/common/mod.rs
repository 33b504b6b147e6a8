//! Test harness: temp-dir libsql store, fake integrations, seeded profiles.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use learnhub::adapters::http::{AppState, Integrations, SharedState};
use learnhub::adapters::meetings::LocalMeetingAdapter;
use learnhub::adapters::persistence::SqliteRepo;
use learnhub::domain::{AccountStatus, DomainError, Gateway, Profile, Role};
use learnhub::ports::{
    CheckoutRequest, CheckoutSession, GatewayNotification, GatewayVerdict, MailerPort,
    PaymentGatewayPort, ProfileRepo,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use uuid::Uuid;

pub const SHARE: i64 = 80;

/// Gateway double. The verdict follows `reported_success` (missing = paid); a
/// checksum of "bad" is rejected. Checkout fails while `fail_checkout` is set.
pub struct FakeGateway {
    gateway: Gateway,
    pub checkouts: Mutex<Vec<CheckoutRequest>>,
    pub fail_checkout: AtomicBool,
}

impl FakeGateway {
    pub fn new(gateway: Gateway) -> Self {
        Self {
            gateway,
            checkouts: Mutex::new(Vec::new()),
            fail_checkout: AtomicBool::new(false),
        }
    }

    pub fn reference_for(payment_id: Uuid) -> String {
        format!("ref-{payment_id}")
    }
}

#[async_trait]
impl PaymentGatewayPort for FakeGateway {
    fn gateway(&self) -> Gateway {
        self.gateway
    }

    async fn create_checkout(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, DomainError> {
        self.checkouts.lock().unwrap().push(request.clone());
        if self.fail_checkout.load(Ordering::SeqCst) {
            return Err(DomainError::Gateway("upstream returned 502".to_string()));
        }
        Ok(CheckoutSession {
            gateway_ref: Self::reference_for(request.payment_id),
            payment_url: format!("https://pay.test/{}", request.payment_id),
        })
    }

    async fn confirm(
        &self,
        notification: &GatewayNotification,
    ) -> Result<GatewayVerdict, DomainError> {
        if notification.checksum.as_deref() == Some("bad") {
            return Err(DomainError::InvalidSignature);
        }
        Ok(match notification.reported_success {
            Some(false) => GatewayVerdict::Failed,
            _ => GatewayVerdict::Paid,
        })
    }
}

#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl MailerPort for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, _body: &str) -> Result<(), DomainError> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string()));
        Ok(())
    }
}

pub struct World {
    _dir: TempDir,
    pub repo: Arc<SqliteRepo>,
    pub state: SharedState,
    pub paymee: Arc<FakeGateway>,
    pub mailer: Arc<RecordingMailer>,
}

impl World {
    /// Store plus services with a fake Paymee gateway. Flouci is left unconfigured.
    pub async fn new() -> Self {
        let paymee = Arc::new(FakeGateway::new(Gateway::Paymee));
        let gateways: Vec<Arc<dyn PaymentGatewayPort>> = vec![paymee.clone()];
        Self::with_gateways(gateways, paymee).await
    }

    pub async fn with_gateways(
        gateways: Vec<Arc<dyn PaymentGatewayPort>>,
        paymee: Arc<FakeGateway>,
    ) -> Self {
        let dir = TempDir::new().unwrap();
        let repo = Arc::new(SqliteRepo::connect(dir.path()).await.unwrap());
        let mailer = Arc::new(RecordingMailer::default());
        let state = AppState::assemble(
            repo.clone(),
            Integrations {
                gateways,
                meetings: Arc::new(LocalMeetingAdapter::default()),
                mailer: mailer.clone(),
            },
            SHARE,
        );
        Self {
            _dir: dir,
            repo,
            state,
            paymee,
            mailer,
        }
    }

    pub async fn profile(&self, role: Role, status: AccountStatus) -> Profile {
        let id = Uuid::new_v4();
        let profile = Profile {
            id,
            email: format!("{}-{}@learnhub.test", role.as_str(), &id.simple().to_string()[..8]),
            full_name: format!("Test {}", role.as_str()),
            role,
            status,
            created_at: Utc::now(),
        };
        self.repo.insert_profile(&profile).await.unwrap();
        profile
    }

    pub async fn student(&self) -> Profile {
        self.profile(Role::Student, AccountStatus::Active).await
    }

    pub async fn instructor(&self) -> Profile {
        self.profile(Role::Instructor, AccountStatus::Active).await
    }

    pub async fn admin(&self) -> Profile {
        self.profile(Role::Admin, AccountStatus::Active).await
    }

    pub async fn token_for(&self, profile: &Profile) -> String {
        self.state.auth.issue_session(profile.id).await.unwrap()
    }
}
