//! Sync scheduler - turns time and user requests into sync passes
//!
//! The [`SyncScheduler`] drives a [`Syncer`](crate::syncer::Syncer) on a
//! fixed interval and on demand. A shared atomic flag carries "sync now"
//! requests from the CLI or UI into the run loop.
//!
//! ## Flow
//!
//! ```text
//! interval tick ──┐
//!                 ├──→ SyncScheduler ──→ Syncer::perform_sync()
//! sync_requested ─┘
//! ```
//!
//! Passes for the same account never overlap: each account has a
//! `tokio::sync::Mutex` that a pass holds for its whole duration. A
//! trigger that fires while a pass is running waits its turn instead of
//! starting a second pass.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use tracing::{debug, info, warn};

use vaultsync_core::domain::record::AccountContext;

use crate::report::{SyncError, SyncReport};
use crate::syncer::Syncer;

/// How often the run loop checks the `sync_requested` flag
const REQUEST_POLL_INTERVAL: Duration = Duration::from_millis(250);

// ============================================================================
// SyncScheduler struct
// ============================================================================

/// Schedules sync passes for an account
///
/// ## User-Initiated Sync
///
/// Calling [`request_sync()`](SyncScheduler::request_sync) sets the
/// `sync_requested` flag; the run loop picks it up within
/// `REQUEST_POLL_INTERVAL` without waiting for the next periodic tick.
pub struct SyncScheduler {
    /// The engine driven by this scheduler
    syncer: Arc<dyn Syncer>,
    /// Interval between periodic passes
    poll_interval: Duration,
    /// Shared flag indicating that a pass should start now
    sync_requested: Arc<AtomicBool>,
    /// Flag that makes the run loop exit
    shutdown: Arc<AtomicBool>,
    /// Per-account pass locks, created on first use
    account_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl SyncScheduler {
    /// Creates a new `SyncScheduler`
    ///
    /// # Returns
    /// A tuple of `(SyncScheduler, Arc<AtomicBool>)`. Setting the
    /// `AtomicBool` to `true` (or calling `request_sync()`) makes the run
    /// loop start a pass without waiting for the periodic tick.
    pub fn new(syncer: Arc<dyn Syncer>, poll_interval: Duration) -> (Self, Arc<AtomicBool>) {
        let sync_requested = Arc::new(AtomicBool::new(false));
        let flag = sync_requested.clone();

        info!(
            poll_interval_s = poll_interval.as_secs(),
            "Creating sync scheduler"
        );

        let scheduler = Self {
            syncer,
            poll_interval,
            sync_requested,
            shutdown: Arc::new(AtomicBool::new(false)),
            account_locks: Mutex::new(HashMap::new()),
        };

        (scheduler, flag)
    }

    /// Requests an immediate sync pass
    pub fn request_sync(&self) {
        info!("User-initiated sync requested");
        self.sync_requested.store(true, Ordering::Release);
    }

    /// Returns whether a sync has been requested but not yet started
    pub fn is_sync_requested(&self) -> bool {
        self.sync_requested.load(Ordering::Acquire)
    }

    /// Makes the run loop exit after the current pass, if one is running
    pub fn stop(&self) {
        info!("Sync scheduler stop requested");
        self.shutdown.store(true, Ordering::Release);
    }

    fn account_lock(&self, account: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = match self.account_locks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        locks.entry(account.to_string()).or_default().clone()
    }

    // ========================================================================
    // Pass execution
    // ========================================================================

    /// Runs one pass for the account, waiting for any in-flight pass first
    pub async fn sync_account(&self, ctx: &AccountContext) -> Result<SyncReport, SyncError> {
        let lock = self.account_lock(&ctx.account);
        let _guard = lock.lock().await;
        self.syncer.perform_sync(ctx).await
    }

    /// Runs one pass for the account unless one is already in flight
    ///
    /// Returns `None` when the pass was skipped because another is running.
    pub async fn try_sync_account(
        &self,
        ctx: &AccountContext,
    ) -> Option<Result<SyncReport, SyncError>> {
        let lock = self.account_lock(&ctx.account);
        let _guard = lock.try_lock().ok()?;
        Some(self.syncer.perform_sync(ctx).await)
    }

    // ========================================================================
    // Run loop
    // ========================================================================

    /// Main loop: periodic passes plus on-demand passes via the flag
    ///
    /// Runs until [`stop()`](SyncScheduler::stop) is called. An
    /// authorization failure stops the loop too, since every further pass
    /// would fail the same way until the host renews consent.
    pub async fn run(&self, ctx: &AccountContext) {
        info!(account = %ctx.account, "Sync scheduler starting");

        let mut periodic = tokio::time::interval(self.poll_interval);
        let mut request_poll = tokio::time::interval(REQUEST_POLL_INTERVAL);
        // The first tick of an interval fires immediately; for the request
        // poll that is fine, for the periodic timer it gives us the
        // startup pass.

        loop {
            if self.shutdown.load(Ordering::Acquire) {
                break;
            }

            let triggered = tokio::select! {
                _ = periodic.tick() => {
                    debug!(account = %ctx.account, "Periodic sync tick");
                    true
                }
                _ = request_poll.tick() => {
                    self.sync_requested.swap(false, Ordering::AcqRel)
                }
            };

            if !triggered {
                continue;
            }

            match self.sync_account(ctx).await {
                Ok(report) if report.is_clean_noop() => {
                    debug!(account = %ctx.account, "Sync pass made no changes");
                }
                Ok(report) => {
                    info!(
                        account = %ctx.account,
                        downloaded = report.downloaded,
                        uploaded = report.uploaded,
                        errors = report.errors.len(),
                        "Sync pass finished"
                    );
                }
                Err(SyncError::AuthorizationRequired { resume_token }) => {
                    warn!(
                        account = %ctx.account,
                        resume_token = %resume_token,
                        "Authorization required, scheduler stopping"
                    );
                    break;
                }
                Err(err) => {
                    warn!(account = %ctx.account, error = %err, "Sync pass failed");
                }
            }
        }

        info!(account = %ctx.account, "Sync scheduler stopped");
    }
}

// ============================================================================
// Unit tests
// ============================================================================
