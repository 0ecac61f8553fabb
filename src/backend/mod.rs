//! # Backend HTTP Collaborator
//!
//! Narrow contract around the ride-hailing backend's HTTP API: simulated
//! login for drivers and customers, plus the driver shift endpoints. The
//! engine never asserts anything about backend responses beyond
//! success/failure; a `status != true` response surfaces as
//! [`SimError::Backend`] carrying the backend's message.
//!
//! The trait seam exists so actors can be tested against [`MockBackend`]
//! without any HTTP server, mirroring how the registry is injected.

mod http;

pub use http::HttpBackend;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::SimError;
use crate::model::Identity;

/// The backend's uniform response wrapper.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub status: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Unwraps the payload of a successful response, or maps a
    /// `status != true` response to a backend error with its message.
    pub fn into_data(self) -> Result<T, SimError> {
        if !self.status {
            return Err(SimError::Backend(
                self.message.unwrap_or_else(|| "unknown backend error".to_string()),
            ));
        }
        self.data
            .ok_or_else(|| SimError::Backend("response carried no data".to_string()))
    }
}

#[derive(Debug, Deserialize)]
pub struct ShiftStatusData {
    pub has_active_shift: bool,
}

#[derive(Debug, Deserialize)]
pub struct NewShiftData {
    pub new_shift_started: bool,
}

/// Request/response collaborator for the backend HTTP API.
#[async_trait]
pub trait BackendApi: Send + Sync {
    async fn driver_login(&self, phone_number: &str) -> Result<Identity, SimError>;
    async fn customer_login(&self, phone_number: &str) -> Result<Identity, SimError>;
    /// Whether the driver identified by `token` has an active shift.
    async fn shift_status(&self, token: &str) -> Result<bool, SimError>;
    /// Requests a new shift; returns whether one was started.
    async fn start_shift(&self, token: &str) -> Result<bool, SimError>;
}

/// In-memory backend for tests: logins mint identities deterministically
/// and the shift endpoints follow two preset flags.
#[derive(Debug)]
pub struct MockBackend {
    pub has_active_shift: bool,
    pub shift_starts: bool,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self {
            has_active_shift: false,
            shift_starts: true,
        }
    }
}

impl MockBackend {
    fn identity(role: &str, phone_number: &str) -> Identity {
        Identity {
            id: format!("{role}-{phone_number}"),
            name: format!("sim {role} {phone_number}"),
            phone_number: phone_number.to_string(),
            access_token: format!("token-{phone_number}"),
        }
    }
}

#[async_trait]
impl BackendApi for MockBackend {
    async fn driver_login(&self, phone_number: &str) -> Result<Identity, SimError> {
        Ok(Self::identity("driver", phone_number))
    }

    async fn customer_login(&self, phone_number: &str) -> Result<Identity, SimError> {
        Ok(Self::identity("customer", phone_number))
    }

    async fn shift_status(&self, _token: &str) -> Result<bool, SimError> {
        Ok(self.has_active_shift)
    }

    async fn start_shift(&self, _token: &str) -> Result<bool, SimError> {
        Ok(self.shift_starts)
    }
}
