//! Application state management

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tollgate_core::SessionStore;

use crate::auth::SessionCoordinator;
use crate::validation::RequestValidator;

/// Application state shared across handlers
pub struct AppState {
    /// Session lifecycle service
    pub coordinator: Arc<SessionCoordinator>,
    /// Store handle, used directly only for readiness checks
    pub store: Arc<dyn SessionStore>,
    /// Request validation gate
    pub validator: RequestValidator,
    /// Server start time
    pub start_time: Instant,
    /// Request counter
    pub request_count: AtomicU64,
}

impl AppState {
    pub fn new(
        coordinator: Arc<SessionCoordinator>,
        store: Arc<dyn SessionStore>,
        validator: RequestValidator,
    ) -> Self {
        Self {
            coordinator,
            store,
            validator,
            start_time: Instant::now(),
            request_count: AtomicU64::new(0),
        }
    }

    /// Increment request counter
    pub fn increment_requests(&self) -> u64 {
        self.request_count.fetch_add(1, Ordering::SeqCst)
    }

    /// Get total request count
    pub fn get_request_count(&self) -> u64 {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Access token lifetime in seconds, as advertised in token responses
    pub fn access_ttl_secs(&self) -> i64 {
        self.coordinator.tokens().access_ttl().num_seconds()
    }
}
