//! Hosted backend access.
//!
//! Appointments and pets live in a PostgREST-style service (Supabase). Row-level
//! authorization is the service's job; this side only issues the queries.

use crate::config::SupabaseConfig;
use crate::types::{Appointment, Pet};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("backend request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend error {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("unexpected backend response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// The hosted `appointments` and `pets` tables.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn insert_appointment(&self, appointment: &Appointment) -> Result<(), StoreError>;

    /// Appointments owned by `owner_id`, earliest date first.
    async fn list_appointments(&self, owner_id: &str) -> Result<Vec<Appointment>, StoreError>;

    async fn delete_appointment(&self, appointment_id: &str) -> Result<(), StoreError>;

    async fn list_pets(&self, owner_id: &str) -> Result<Vec<Pet>, StoreError>;

    async fn insert_pet(&self, pet: &Pet) -> Result<(), StoreError>;

    /// Overwrite the row whose id is `pet.id`.
    async fn update_pet(&self, pet: &Pet) -> Result<(), StoreError>;

    /// Remove a pet and its appointments. Appointments go first; if that fails
    /// the pet row is left alone.
    async fn delete_pet(&self, pet_id: &str) -> Result<(), StoreError>;
}

/// REST client for the hosted tables.
pub struct SupabaseClient {
    client: reqwest::Client,
    rest_url: String,
    anon_key: String,
    access_token: Option<String>,
}

impl SupabaseClient {
    pub fn new(config: &SupabaseConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            rest_url: format!("{}/rest/v1", config.url.trim_end_matches('/')),
            anon_key: config.anon_key.clone(),
            access_token: None,
        }
    }

    /// Send requests as a signed-in user instead of the anonymous role.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    fn request(&self, method: reqwest::Method, table: &str) -> reqwest::RequestBuilder {
        let bearer = self.access_token.as_deref().unwrap_or(&self.anon_key);
        self.client
            .request(method, format!("{}/{}", self.rest_url, table))
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer)
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, StoreError> {
        let response = self
            .request(reqwest::Method::GET, table)
            .query(query)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(StoreError::Status { status, body });
        }
        Ok(serde_json::from_str(&body)?)
    }

    /// Send a write and keep only its status.
    async fn write(&self, request: reqwest::RequestBuilder) -> Result<(), StoreError> {
        let response = request.header("Prefer", "return=minimal").send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Status { status, body });
        }
        Ok(())
    }

    async fn delete_where(&self, table: &str, column: &str, value: &str) -> Result<(), StoreError> {
        let filter = [(column, format!("eq.{value}"))];
        self.write(self.request(reqwest::Method::DELETE, table).query(&filter))
            .await
    }
}

#[async_trait]
impl AppointmentStore for SupabaseClient {
    async fn insert_appointment(&self, appointment: &Appointment) -> Result<(), StoreError> {
        self.write(
            self.request(reqwest::Method::POST, "appointments")
                .json(&[appointment]),
        )
        .await
    }

    async fn list_appointments(&self, owner_id: &str) -> Result<Vec<Appointment>, StoreError> {
        self.select(
            "appointments",
            &[
                ("select", "*".to_string()),
                ("owner_id", format!("eq.{owner_id}")),
                ("order", "date.asc".to_string()),
            ],
        )
        .await
    }

    async fn delete_appointment(&self, appointment_id: &str) -> Result<(), StoreError> {
        self.delete_where("appointments", "id", appointment_id).await
    }

    async fn list_pets(&self, owner_id: &str) -> Result<Vec<Pet>, StoreError> {
        self.select(
            "pets",
            &[
                ("select", "*".to_string()),
                ("owner_id", format!("eq.{owner_id}")),
            ],
        )
        .await
    }

    async fn insert_pet(&self, pet: &Pet) -> Result<(), StoreError> {
        self.write(self.request(reqwest::Method::POST, "pets").json(&[pet]))
            .await
    }

    async fn update_pet(&self, pet: &Pet) -> Result<(), StoreError> {
        let filter = [("id", format!("eq.{}", pet.id))];
        self.write(
            self.request(reqwest::Method::PATCH, "pets")
                .query(&filter)
                .json(pet),
        )
        .await
    }

    async fn delete_pet(&self, pet_id: &str) -> Result<(), StoreError> {
        self.delete_where("appointments", "pet_id", pet_id).await?;
        self.delete_where("pets", "id", pet_id).await
    }
}

/// In-process store used when no hosted backend is configured.
#[derive(Default)]
pub struct MemoryStore {
    appointments: Mutex<Vec<Appointment>>,
    pets: Mutex<Vec<Pet>>,
}

impl MemoryStore {
    pub fn with_pets(pets: Vec<Pet>) -> Self {
        Self {
            appointments: Mutex::new(Vec::new()),
            pets: Mutex::new(pets),
        }
    }

    fn appointments(&self) -> MutexGuard<'_, Vec<Appointment>> {
        self.appointments
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn pets(&self) -> MutexGuard<'_, Vec<Pet>> {
        self.pets.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl AppointmentStore for MemoryStore {
    async fn insert_appointment(&self, appointment: &Appointment) -> Result<(), StoreError> {
        self.appointments().push(appointment.clone());
        Ok(())
    }

    async fn list_appointments(&self, owner_id: &str) -> Result<Vec<Appointment>, StoreError> {
        let mut rows: Vec<Appointment> = self
            .appointments()
            .iter()
            .filter(|a| a.owner_id == owner_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.date.cmp(&b.date));
        Ok(rows)
    }

    async fn delete_appointment(&self, appointment_id: &str) -> Result<(), StoreError> {
        self.appointments().retain(|a| a.id != appointment_id);
        Ok(())
    }

    async fn list_pets(&self, owner_id: &str) -> Result<Vec<Pet>, StoreError> {
        Ok(self
            .pets()
            .iter()
            .filter(|p| p.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn insert_pet(&self, pet: &Pet) -> Result<(), StoreError> {
        self.pets().push(pet.clone());
        Ok(())
    }

    async fn update_pet(&self, pet: &Pet) -> Result<(), StoreError> {
        if let Some(row) = self.pets().iter_mut().find(|p| p.id == pet.id) {
            *row = pet.clone();
        }
        Ok(())
    }

    async fn delete_pet(&self, pet_id: &str) -> Result<(), StoreError> {
        self.appointments().retain(|a| a.pet_id != pet_id);
        self.pets().retain(|p| p.id != pet_id);
        Ok(())
    }
}
