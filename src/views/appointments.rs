use crate::backend::{AppointmentStore, StoreError};
use crate::notify::{NotificationPlatform, Permission};
use crate::reminders::{ReminderScheduler, ScheduleOutcome};
use crate::types::{Appointment, Pet};
use std::sync::Arc;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime, Time, format_description::well_known::Rfc3339};

const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");
const TIME_FORMAT: &[FormatItem<'static>] = format_description!("[hour]:[minute]");
const TIME_WITH_SECONDS_FORMAT: &[FormatItem<'static>] =
    format_description!("[hour]:[minute]:[second]");

pub const UNKNOWN_PET: &str = "Unknown Pet";

#[derive(Debug, thiserror::Error)]
pub enum FormError {
    #[error("You must be logged in to add an appointment")]
    NotLoggedIn,

    #[error("Failed to add appointment. Please try again.")]
    SaveFailed(#[source] StoreError),

    #[error("Failed to delete appointment")]
    DeleteFailed(#[source] StoreError),
}

pub fn parse_date(value: &str) -> Option<Date> {
    Date::parse(value.trim(), DATE_FORMAT).ok()
}

pub fn parse_time(value: &str) -> Option<Time> {
    let value = value.trim();
    Time::parse(value, TIME_FORMAT)
        .or_else(|_| Time::parse(value, TIME_WITH_SECONDS_FORMAT))
        .ok()
}

pub fn format_date(date: Date) -> String {
    date.format(DATE_FORMAT).unwrap_or_default()
}

/// Fields of the add-appointment form.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AppointmentForm {
    pub name: String,
    pub description: String,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`
    pub time: String,
    pub pet_id: String,
}

impl AppointmentForm {
    /// Blank form with the date preset to `today`.
    pub fn new(today: Date) -> Self {
        Self {
            date: format_date(today),
            ..Self::default()
        }
    }

    fn to_appointment(&self, owner_id: &str, now: OffsetDateTime) -> Appointment {
        let stamp = now.format(&Rfc3339).unwrap_or_default();
        let description = self.description.trim();
        Appointment {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            pet_id: self.pet_id.clone(),
            name: self.name.clone(),
            description: (!description.is_empty()).then(|| description.to_string()),
            date: self.date.clone(),
            time: self.time.clone(),
            created_at: stamp.clone(),
            updated_at: stamp,
        }
    }

    /// Save the appointment, then schedule its reminder.
    ///
    /// The reminder is only attempted once the store confirmed the insert, and
    /// its outcome never turns a successful save into an error.
    pub async fn submit(
        &self,
        user: Option<&str>,
        store: &dyn AppointmentStore,
        scheduler: &ReminderScheduler,
    ) -> Result<Appointment, FormError> {
        let owner_id = user.ok_or(FormError::NotLoggedIn)?;
        let appointment = self.to_appointment(owner_id, OffsetDateTime::now_utc());

        if let Err(err) = store.insert_appointment(&appointment).await {
            tracing::error!(error = %err, "error adding appointment");
            return Err(FormError::SaveFailed(err));
        }
        tracing::info!(id = %appointment.id, name = %appointment.name, "appointment saved");

        match (parse_date(&self.date), parse_time(&self.time)) {
            (Some(date), Some(time)) => {
                if let ScheduleOutcome::Scheduled(task) = scheduler.schedule(&self.name, date, time)
                {
                    tracing::debug!(task, "reminder attached to appointment");
                }
            }
            _ => tracing::warn!(
                date = %self.date,
                time = %self.time,
                "unreadable appointment time, no reminder"
            ),
        }

        Ok(appointment)
    }
}

/// The appointments screen: list, pet names, and the add form.
pub struct AppointmentsPage {
    store: Arc<dyn AppointmentStore>,
    scheduler: ReminderScheduler,
    user: Option<String>,
    appointments: Vec<Appointment>,
    pets: Vec<Pet>,
}

impl AppointmentsPage {
    pub fn new(
        store: Arc<dyn AppointmentStore>,
        scheduler: ReminderScheduler,
        user: Option<String>,
    ) -> Self {
        Self {
            store,
            scheduler,
            user,
            appointments: Vec::new(),
            pets: Vec::new(),
        }
    }

    /// Page activation: prompt for notification permission if never asked,
    /// then load appointments and pets.
    pub async fn mount(&mut self) {
        request_permission_if_undetermined(self.scheduler.platform().as_ref());
        self.refresh().await;
    }

    pub async fn refresh(&mut self) {
        let Some(user) = self.user.as_deref() else {
            return;
        };
        match self.store.list_appointments(user).await {
            Ok(rows) => self.appointments = rows,
            Err(err) => tracing::error!(error = %err, "error fetching appointments"),
        }
        match self.store.list_pets(user).await {
            Ok(rows) => self.pets = rows,
            Err(err) => tracing::error!(error = %err, "error fetching pets"),
        }
    }

    pub async fn add(&mut self, form: &AppointmentForm) -> Result<Appointment, FormError> {
        let saved = form
            .submit(self.user.as_deref(), self.store.as_ref(), &self.scheduler)
            .await?;
        self.refresh().await;
        Ok(saved)
    }

    /// Delete one appointment. A reminder already scheduled for it still fires.
    pub async fn delete(&mut self, appointment_id: &str) -> Result<(), FormError> {
        if let Err(err) = self.store.delete_appointment(appointment_id).await {
            tracing::error!(error = %err, appointment_id, "error deleting appointment");
            return Err(FormError::DeleteFailed(err));
        }
        self.appointments.retain(|appt| appt.id != appointment_id);
        Ok(())
    }

    pub fn appointments(&self) -> &[Appointment] {
        &self.appointments
    }

    /// `(pet id, pet name)` choices for the form's pet select.
    pub fn pet_options(&self) -> Vec<(String, String)> {
        self.pets
            .iter()
            .map(|pet| (pet.id.clone(), pet.name.clone()))
            .collect()
    }

    pub fn pet_name(&self, pet_id: &str) -> &str {
        self.pets
            .iter()
            .find(|pet| pet.id == pet_id)
            .map(|pet| pet.name.as_str())
            .unwrap_or(UNKNOWN_PET)
    }

    pub fn scheduler(&self) -> &ReminderScheduler {
        &self.scheduler
    }
}

/// Ask for notification permission only when it has never been decided.
pub fn request_permission_if_undetermined(platform: &dyn NotificationPlatform) -> Option<Permission> {
    match platform.permission()? {
        Permission::Undetermined => Some(platform.request_permission()),
        decided => Some(decided),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, time};

    #[test]
    fn parses_form_values() {
        assert_eq!(parse_date("2025-03-14"), Some(date!(2025 - 03 - 14)));
        assert_eq!(parse_date("14/03/2025"), None);
        assert_eq!(parse_time("09:30"), Some(time!(9:30)));
        assert_eq!(parse_time("09:30:15"), Some(time!(9:30:15)));
        assert_eq!(parse_time("9am"), None);
    }

    #[test]
    fn new_form_defaults_to_today() {
        let form = AppointmentForm::new(date!(2025 - 01 - 05));
        assert_eq!(form.date, "2025-01-05");
        assert!(form.name.is_empty());
    }

    #[test]
    fn blank_description_is_not_stored() {
        let form = AppointmentForm {
            name: "Vaccination".into(),
            description: "  ".into(),
            date: "2025-03-14".into(),
            time: "09:30".into(),
            pet_id: "p1".into(),
        };
        let row = form.to_appointment("u1", OffsetDateTime::UNIX_EPOCH);
        assert_eq!(row.description, None);
        assert_eq!(row.owner_id, "u1");
        assert_eq!(row.created_at, "1970-01-01T00:00:00Z");
        assert_eq!(row.id.len(), 36);
    }
}
