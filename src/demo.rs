//! Simulated user service driven through the instrumenter.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use invocation_instrumenter::{args, CallSite, Instrumenter};

#[derive(Clone, Serialize)]
pub struct User {
    pub id: u32,
    pub user_name: String,
    #[serde(skip_serializing)]
    #[allow(dead_code)]
    pub pass_word: String,
    pub real_name: String,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("user_name", &self.user_name)
            .field("pass_word", &"<redacted>")
            .field("real_name", &self.real_name)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum UserError {
    #[error("user {0} not found")]
    NotFound(u32),
    #[error("user name '{0}' already taken")]
    Conflict(String),
}

pub struct UserService {
    instrumenter: Instrumenter,
    users: DashMap<u32, User>,
    next_id: AtomicU32,
    failure_rate: f64,
}

impl UserService {
    pub fn new(instrumenter: Instrumenter, failure_rate: f64) -> Self {
        Self {
            instrumenter,
            users: DashMap::new(),
            next_id: AtomicU32::new(1),
            failure_rate: failure_rate.clamp(0.0, 1.0),
        }
    }

    pub async fn create_user(&self, user_name: String, real_name: String) -> Result<u32, UserError> {
        let user = User {
            id: 0,
            user_name,
            pass_word: format!("{:016x}", fastrand::u64(..)),
            real_name,
        };
        let site = CallSite::new("createUser").log_kind("INSERT").operate_kind("CREATE");

        self.instrumenter
            .instrument_async(site, args![user], async {
                simulate_latency().await;
                if self.should_fail() {
                    return Err(UserError::Conflict(user.user_name.clone()));
                }
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                self.users.insert(id, User { id, ..user.clone() });
                Ok(id)
            })
            .await
    }

    /// Metadata comes from the registry, if configured.
    pub async fn find_user(&self, id: u32) -> Result<User, UserError> {
        self.instrumenter
            .instrument_async(CallSite::new("findUser"), args![id], async {
                simulate_latency().await;
                self.users
                    .get(&id)
                    .map(|r| r.value().clone())
                    .ok_or(UserError::NotFound(id))
            })
            .await
    }

    pub async fn delete_user(&self, id: u32) -> Result<(), UserError> {
        self.instrumenter
            .instrument_async(CallSite::new("deleteUser"), args![id], async {
                simulate_latency().await;
                self.users
                    .remove(&id)
                    .map(|_| ())
                    .ok_or(UserError::NotFound(id))
            })
            .await
    }

    fn should_fail(&self) -> bool {
        fastrand::f64() < self.failure_rate
    }

    fn known_id(&self) -> u32 {
        let upper = self.next_id.load(Ordering::Relaxed).max(2);
        fastrand::u32(1..upper)
    }
}

async fn simulate_latency() {
    tokio::time::sleep(Duration::from_millis(fastrand::u64(1..20))).await;
}

/// Run `invocations` calls with at most `concurrency` in flight.
///
/// Calls are spawned into `tasks`, which the caller owns. If this future is
/// dropped early, the caller must still shut `tasks` down so the cancelled
/// invocations reach the sink.
pub async fn run_workload(
    service: Arc<UserService>,
    tasks: &mut JoinSet<()>,
    invocations: usize,
    concurrency: usize,
) {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));

    for i in 0..invocations {
        let Ok(permit) = semaphore.clone().acquire_owned().await else {
            break;
        };
        let service = service.clone();
        tasks.spawn(async move {
            let _permit = permit;
            // Outcomes are already recorded by the instrumenter.
            let _ = match i % 3 {
                0 => service
                    .create_user(format!("user{i}"), format!("User {i}"))
                    .await
                    .map(|_| ()),
                1 => service.find_user(service.known_id()).await.map(|_| ()),
                _ => service.delete_user(service.known_id()).await,
            };
        });
    }

    while let Some(res) = tasks.join_next().await {
        if let Err(e) = res {
            tracing::error!(error = %e, "Workload task failed");
        }
    }
    tracing::info!(invocations, concurrency, "Workload finished");
}
