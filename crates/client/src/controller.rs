//! Single authority for whether chat is permitted.
//!
//! [`ConfigController`] owns the [`SystemState`] snapshot, performs
//! configuration mutations against the backend, and keeps the snapshot in step
//! with the backend afterwards. Every status fetch is tagged with a sequence
//! number; only the result of the latest issued fetch is applied, so a slow
//! response can never overwrite newer state (including an optimistic reset).

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use proto::{ApiError, SetupRequest, SystemStatus, UpdateRequest};
use tracing::{debug, info, warn};

use crate::api::{ApiClient, AuthSync};
use crate::state::{Phase, SystemState};

#[derive(Debug, Default)]
struct Shared {
    state: Option<SystemState>,
    /// Sequence number of the most recently issued fetch.
    issued: u64,
    /// Sequence number of the most recently resolved latest fetch.
    settled: u64,
}

impl Shared {
    fn phase(&self) -> Phase {
        if self.issued > self.settled {
            return Phase::Loading;
        }
        match &self.state {
            None => Phase::Uninitialized,
            Some(state) => state.phase(),
        }
    }
}

/// Cheap, clonable handle; all clones share one snapshot.
#[derive(Clone)]
pub struct ConfigController {
    api: ApiClient,
    shared: Arc<Mutex<Shared>>,
}

impl ConfigController {
    /// `api` is used for status and config calls; it should not carry a
    /// resync handler pointing back at this controller.
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            shared: Arc::new(Mutex::new(Shared::default())),
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Last applied snapshot, `None` before the first successful fetch.
    pub fn state(&self) -> Option<SystemState> {
        self.shared.lock().state.clone()
    }

    pub fn phase(&self) -> Phase {
        self.shared.lock().phase()
    }

    pub fn chat_enabled(&self) -> bool {
        self.shared
            .lock()
            .state
            .as_ref()
            .is_some_and(SystemState::chat_enabled)
    }

    /// Fetches `/status` and replaces the snapshot if this is still the
    /// latest fetch. Errors are not recovered from.
    pub async fn refresh(&self) -> Result<Phase, ApiError> {
        let seq = self.begin_fetch();
        let result = self.api.status().await;
        self.finish_fetch(seq, result)
    }

    /// Sends the first-time configuration, then refreshes.
    pub async fn setup(&self, request: SetupRequest) -> Result<Phase, ApiError> {
        if self.state().is_some_and(|s| s.configured) {
            warn!(
                provider = %request.provider,
                "Setup requested while already configured; backend will overwrite"
            );
        }
        info!(
            provider = %request.provider,
            model = %request.model_id,
            api_key = request.api_key.is_some(),
            "Submitting initial configuration"
        );
        self.api.setup(&request).await?;
        self.refresh().await
    }

    /// Sends a partial update, asks the backend to verify credentials, then
    /// refreshes whether or not verification passed.
    ///
    /// A verification failure is logged and absorbed: the refreshed state
    /// carries the failed auth status, which locks chat.
    pub async fn update_config(&self, request: UpdateRequest) -> Result<Phase, ApiError> {
        info!(
            model = ?request.model_id,
            api_key = request.api_key.is_some(),
            "Updating configuration"
        );
        self.api.update_config(&request).await?;

        match self.api.verify().await {
            Ok(_) => debug!("Credential verification passed"),
            Err(err) => warn!(
                error = %err,
                auth_failure = err.is_auth_failure(),
                "Credential verification failed; chat stays locked"
            ),
        }

        self.refresh().await
    }

    /// Clears the backend configuration and immediately drops back to the
    /// unconfigured snapshot without fetching. Any fetch still in flight is
    /// invalidated.
    pub async fn reset(&self) -> Result<(), ApiError> {
        self.api.reset().await?;

        let mut shared = self.shared.lock();
        shared.issued += 1;
        shared.settled = shared.issued;
        shared.state = Some(SystemState::unknown());
        info!(seq = shared.issued, "Configuration reset");
        Ok(())
    }

    fn begin_fetch(&self) -> u64 {
        let mut shared = self.shared.lock();
        shared.issued += 1;
        debug!(seq = shared.issued, "Status fetch issued");
        shared.issued
    }

    fn finish_fetch(
        &self,
        seq: u64,
        result: Result<SystemStatus, ApiError>,
    ) -> Result<Phase, ApiError> {
        let mut shared = self.shared.lock();

        // Stale results never surface as errors.
        if seq != shared.issued {
            match result {
                Ok(_) => debug!(seq, latest = shared.issued, "Discarding stale status fetch"),
                Err(err) => debug!(
                    seq,
                    latest = shared.issued,
                    error = %err,
                    "Discarding stale failed status fetch"
                ),
            }
            return Ok(shared.phase());
        }

        shared.settled = seq;
        match result {
            Ok(status) => {
                shared.state = Some(SystemState::from(status));
                let phase = shared.phase();
                debug!(seq, phase = %phase, "Status fetch applied");
                Ok(phase)
            }
            Err(err) => {
                warn!(seq, error = %err, "Status fetch failed");
                Err(err)
            }
        }
    }
}

#[async_trait]
impl AuthSync for ConfigController {
    async fn resync(&self) -> Result<(), ApiError> {
        debug!("Resyncing status after failed chat call");
        self.refresh().await.map(|_| ())
    }
}
