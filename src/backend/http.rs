//! reqwest implementation of the backend collaborator.

use async_trait::async_trait;
use serde_json::json;

use super::{ApiResponse, BackendApi, NewShiftData, ShiftStatusData};
use crate::config::HTTP_TIMEOUT;
use crate::error::SimError;
use crate::model::Identity;

/// Fixed client identifier sent with every request so the backend can tell
/// simulated traffic from real devices.
const CLIENT_HEADER: &str = "X-Sim-Client";
const CLIENT_NAME: &str = "simulation";

pub struct HttpBackend {
    http: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> Result<Self, SimError> {
        let http = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn login(&self, path: &str, phone_number: &str) -> Result<Identity, SimError> {
        let response: ApiResponse<Identity> = self
            .http
            .post(self.url(path))
            .header(CLIENT_HEADER, CLIENT_NAME)
            .json(&json!({ "phone_number": phone_number }))
            .send()
            .await?
            .json()
            .await?;
        response.into_data()
    }
}

#[async_trait]
impl BackendApi for HttpBackend {
    async fn driver_login(&self, phone_number: &str) -> Result<Identity, SimError> {
        self.login("/api/v1/admin/simulate/driver", phone_number).await
    }

    async fn customer_login(&self, phone_number: &str) -> Result<Identity, SimError> {
        self.login("/api/v1/admin/simulate/customer", phone_number).await
    }

    async fn shift_status(&self, token: &str) -> Result<bool, SimError> {
        let response: ApiResponse<ShiftStatusData> = self
            .http
            .get(self.url("/api/v1/driver/shift_status"))
            .bearer_auth(token)
            .header(CLIENT_HEADER, CLIENT_NAME)
            .send()
            .await?
            .json()
            .await?;
        Ok(response.into_data()?.has_active_shift)
    }

    async fn start_shift(&self, token: &str) -> Result<bool, SimError> {
        let response: ApiResponse<NewShiftData> = self
            .http
            .post(self.url("/api/v1/driver/go_online"))
            .bearer_auth(token)
            .header(CLIENT_HEADER, CLIENT_NAME)
            .send()
            .await?
            .json()
            .await?;
        Ok(response.into_data()?.new_shift_started)
    }
}
