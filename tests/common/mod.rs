//! Test doubles shared by the integration suites.
#![allow(dead_code)]

use async_trait::async_trait;
use petpal::backend::{AppointmentStore, StoreError};
use petpal::notify::{NotificationOptions, NotificationPlatform, Permission};
use petpal::reminders::Clock;
use petpal::types::{Appointment, Pet};
use std::sync::Mutex;
use time::OffsetDateTime;

pub struct FixedClock(pub OffsetDateTime);

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.0
    }
}

/// Notification platform that records everything it is asked to do.
pub struct RecordingPlatform {
    permission: Option<Permission>,
    grant_on_request: Permission,
    pub requests: Mutex<usize>,
    pub shown: Mutex<Vec<(String, NotificationOptions)>>,
}

impl RecordingPlatform {
    pub fn with_permission(permission: Option<Permission>) -> Self {
        Self {
            permission,
            grant_on_request: Permission::Granted,
            requests: Mutex::new(0),
            shown: Mutex::new(Vec::new()),
        }
    }

    pub fn granted() -> Self {
        Self::with_permission(Some(Permission::Granted))
    }

    pub fn shown(&self) -> Vec<(String, NotificationOptions)> {
        self.shown.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        *self.requests.lock().unwrap()
    }
}

impl NotificationPlatform for RecordingPlatform {
    fn permission(&self) -> Option<Permission> {
        self.permission
    }

    fn request_permission(&self) -> Permission {
        *self.requests.lock().unwrap() += 1;
        self.grant_on_request
    }

    fn show(&self, title: &str, options: &NotificationOptions) {
        self.shown
            .lock()
            .unwrap()
            .push((title.to_string(), options.clone()));
    }
}

/// Store whose reads come back empty and whose writes are all refused.
pub struct FailingStore;

fn refused<T>() -> Result<T, StoreError> {
    Err(StoreError::Status {
        status: reqwest::StatusCode::UNAUTHORIZED,
        body: "JWT expired".into(),
    })
}

#[async_trait]
impl AppointmentStore for FailingStore {
    async fn insert_appointment(&self, _appointment: &Appointment) -> Result<(), StoreError> {
        refused()
    }

    async fn list_appointments(&self, _owner_id: &str) -> Result<Vec<Appointment>, StoreError> {
        Ok(Vec::new())
    }

    async fn delete_appointment(&self, _appointment_id: &str) -> Result<(), StoreError> {
        refused()
    }

    async fn list_pets(&self, _owner_id: &str) -> Result<Vec<Pet>, StoreError> {
        Ok(Vec::new())
    }

    async fn insert_pet(&self, _pet: &Pet) -> Result<(), StoreError> {
        refused()
    }

    async fn update_pet(&self, _pet: &Pet) -> Result<(), StoreError> {
        refused()
    }

    async fn delete_pet(&self, _pet_id: &str) -> Result<(), StoreError> {
        refused()
    }
}
