/// Best-effort replication to the mirror store.
///
/// Every mutation that succeeded on the primary store is described as a
/// `Mutation` and handed to `Mirror::apply`, which probes the mirror before
/// each attempt and never reports failure as an error. Update-type mutations
/// retry with a fixed delay; inserts and deletes get a single attempt.
use super::models::{LoginLog, Sale, User};
use super::{bounded, Database, DbPool};
use crate::error::StoreResult;
use std::time::Duration;

/// Default number of attempts for update-type mutations
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(2);
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// Fixed-delay bounded retry policy for mirror writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
    pub probe_timeout: Duration,
    pub write_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_RETRY_DELAY,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }
}

impl RetryPolicy {
    /// Number of attempts a mutation gets under this policy.
    pub fn attempts_for(&self, mutation: &Mutation) -> u32 {
        if mutation.is_update() {
            self.max_attempts.max(1)
        } else {
            1
        }
    }
}

/// A write already applied to the primary store, to be mirrored.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    InsertUser(User),
    UpdateUser(User),
    TouchLastSession {
        cedula: String,
        ultima_sesion: String,
    },
    DeleteUser(String),
    InsertSale(Sale),
    InsertLoginLog(LoginLog),
}

impl Mutation {
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::InsertUser(_) => "insert user",
            Mutation::UpdateUser(_) => "update user",
            Mutation::TouchLastSession { .. } => "update last session",
            Mutation::DeleteUser(_) => "delete user",
            Mutation::InsertSale(_) => "insert sale",
            Mutation::InsertLoginLog(_) => "insert login log",
        }
    }

    pub fn is_update(&self) -> bool {
        matches!(
            self,
            Mutation::UpdateUser(_) | Mutation::TouchLastSession { .. }
        )
    }

    async fn apply_to(&self, pool: &DbPool) -> StoreResult<()> {
        match self {
            Mutation::InsertUser(user) => Database::insert_user(pool, user).await,
            Mutation::UpdateUser(user) => Database::update_user(pool, user).await.map(|_| ()),
            Mutation::TouchLastSession {
                cedula,
                ultima_sesion,
            } => Database::touch_last_session(pool, cedula, ultima_sesion)
                .await
                .map(|_| ()),
            Mutation::DeleteUser(cedula) => Database::delete_user(pool, cedula).await.map(|_| ()),
            Mutation::InsertSale(sale) => Database::insert_sale(pool, sale).await.map(|_| ()),
            Mutation::InsertLoginLog(entry) => Database::insert_login_log(pool, entry).await,
        }
    }
}

/// What happened to a mutation on the mirror. Only ever logged by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplicationOutcome {
    Applied,
    /// Every attempt was skipped because the liveness probe failed.
    Unreachable,
    /// The mirror answered the probe but rejected or timed out the write.
    Failed,
    /// No mirror is configured.
    Disabled,
}

pub struct Mirror {
    pool: DbPool,
    policy: RetryPolicy,
}

impl Mirror {
    pub fn new(pool: DbPool, policy: RetryPolicy) -> Self {
        Mirror { pool, policy }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub async fn probe(&self) -> StoreResult<()> {
        bounded("mirror probe", self.policy.probe_timeout, Database::ping(&self.pool)).await
    }

    pub async fn apply(&self, mutation: &Mutation) -> ReplicationOutcome {
        let attempts = self.policy.attempts_for(mutation);
        let mut outcome = ReplicationOutcome::Unreachable;

        for attempt in 1..=attempts {
            if attempt > 1 {
                tokio::time::sleep(self.policy.delay).await;
            }

            if let Err(e) = self.probe().await {
                log::info!(
                    "Mirror not available for {} (attempt {} of {}): {}",
                    mutation.name(),
                    attempt,
                    attempts,
                    e
                );
                continue;
            }

            match bounded(
                mutation.name(),
                self.policy.write_timeout,
                mutation.apply_to(&self.pool),
            )
            .await
            {
                Ok(()) => {
                    log::info!("Mirror {} applied", mutation.name());
                    return ReplicationOutcome::Applied;
                }
                Err(e) => {
                    log::warn!(
                        "Mirror {} failed (attempt {} of {}): {}",
                        mutation.name(),
                        attempt,
                        attempts,
                        e
                    );
                    outcome = ReplicationOutcome::Failed;
                }
            }
        }

        if attempts > 1 {
            log::info!(
                "Mirror {} not applied after {} attempts",
                mutation.name(),
                attempts
            );
        }
        outcome
    }
}
