//! Test doubles for services and the API test suite

pub mod fixture;

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use condomi_core::models::{PixCharge, PixChargeRequest};
use condomi_core::AppError;

use crate::services::clock::Clock;
use crate::services::gateway::PaymentGateway;

/// Clock pinned to a settable instant. Defaults to 2024-06-15 12:00 UTC.
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap() = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Default for FixedClock {
    fn default() -> Self {
        Self::at(Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Payment gateway double that records requests.
pub struct StubGateway {
    fail: bool,
    calls: Mutex<Vec<PixChargeRequest>>,
}

impl StubGateway {
    pub fn succeeding() -> Self {
        Self {
            fail: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<PixChargeRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for StubGateway {
    async fn create_pix_charge(&self, request: &PixChargeRequest) -> Result<PixCharge, AppError> {
        self.calls.lock().unwrap().push(request.clone());
        if self.fail {
            return Err(AppError::RemoteUnavailable(
                "stub gateway offline".to_string(),
            ));
        }
        Ok(PixCharge {
            qr_code: format!("00020126-PIX-{}", request.invoice_id),
            qr_code_base64: "iVBORw0KGgo=".to_string(),
        })
    }
}
