use crate::backend::{AppointmentStore, StoreError};
use crate::types::{Pet, PetKind, Sex};
use std::sync::Arc;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

#[derive(Debug, thiserror::Error)]
pub enum PetFormError {
    #[error("You must be logged in to add a pet")]
    NotLoggedIn,

    #[error("Please enter your pet's name")]
    MissingName,

    #[error("Unknown pet type \"{0}\"")]
    UnknownKind(String),

    #[error("\"{breed}\" is not a {kind} breed")]
    UnknownBreed { kind: PetKind, breed: String },

    #[error("{0} must be a number")]
    InvalidNumber(&'static str),

    #[error("Failed to save pet. Please try again.")]
    SaveFailed(#[source] StoreError),

    #[error("Failed to delete pet")]
    DeleteFailed(#[source] StoreError),
}

/// Fields of the add/edit pet form, as typed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PetForm {
    pub name: String,
    /// One of `Dog`, `Cat`, `Parrot`, `Turtle`.
    pub kind: String,
    /// Must be one of the kind's catalog breeds.
    pub breed: String,
    pub weight: String,
    pub height: String,
    pub age: String,
    pub sex: String,
}

impl PetForm {
    /// Form prefilled from an existing pet, for editing.
    pub fn from_pet(pet: &Pet) -> Self {
        let number = |value: Option<f64>| value.map(|v| v.to_string()).unwrap_or_default();
        Self {
            name: pet.name.clone(),
            kind: pet.kind.to_string(),
            breed: pet.breed.clone(),
            weight: number(pet.weight),
            height: number(pet.height),
            age: pet.age.map(|age| age.to_string()).unwrap_or_default(),
            sex: format!("{:?}", pet.sex),
        }
    }

    /// Validate the form into a row. `existing` keeps its id and creation time.
    pub fn to_pet(
        &self,
        owner_id: &str,
        existing: Option<&Pet>,
        now: OffsetDateTime,
    ) -> Result<Pet, PetFormError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(PetFormError::MissingName);
        }
        let kind = PetKind::parse(&self.kind)
            .ok_or_else(|| PetFormError::UnknownKind(self.kind.trim().to_string()))?;
        let breed = kind
            .find_breed(&self.breed)
            .ok_or_else(|| PetFormError::UnknownBreed {
                kind,
                breed: self.breed.trim().to_string(),
            })?;

        let stamp = now.format(&Rfc3339).unwrap_or_default();
        Ok(Pet {
            id: existing
                .map(|pet| pet.id.clone())
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            owner_id: owner_id.to_string(),
            name: name.to_string(),
            kind,
            breed: breed.to_string(),
            weight: parse_optional(&self.weight, "Weight")?,
            height: parse_optional(&self.height, "Height")?,
            age: parse_optional(&self.age, "Age")?,
            sex: Sex::parse(&self.sex).unwrap_or_default(),
            image_url: existing.and_then(|pet| pet.image_url.clone()),
            created_at: existing
                .map(|pet| pet.created_at.clone())
                .unwrap_or_else(|| stamp.clone()),
            updated_at: stamp,
        })
    }

    /// Insert a new pet, or update `existing` in place.
    pub async fn submit(
        &self,
        user: Option<&str>,
        store: &dyn AppointmentStore,
        existing: Option<&Pet>,
    ) -> Result<Pet, PetFormError> {
        let owner_id = user.ok_or(PetFormError::NotLoggedIn)?;
        let pet = self.to_pet(owner_id, existing, OffsetDateTime::now_utc())?;

        let saved = match existing {
            Some(_) => store.update_pet(&pet).await,
            None => store.insert_pet(&pet).await,
        };
        if let Err(err) = saved {
            tracing::error!(error = %err, "error saving pet");
            return Err(PetFormError::SaveFailed(err));
        }
        tracing::info!(id = %pet.id, name = %pet.name, updated = existing.is_some(), "pet saved");
        Ok(pet)
    }
}

fn parse_optional<T: std::str::FromStr>(
    value: &str,
    field: &'static str,
) -> Result<Option<T>, PetFormError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| PetFormError::InvalidNumber(field))
}

/// The pet list with add, edit and delete.
pub struct PetsPage {
    store: Arc<dyn AppointmentStore>,
    user: Option<String>,
    pets: Vec<Pet>,
}

impl PetsPage {
    pub fn new(store: Arc<dyn AppointmentStore>, user: Option<String>) -> Self {
        Self {
            store,
            user,
            pets: Vec::new(),
        }
    }

    pub async fn refresh(&mut self) {
        let Some(user) = self.user.as_deref() else {
            return;
        };
        match self.store.list_pets(user).await {
            Ok(rows) => self.pets = rows,
            Err(err) => tracing::error!(error = %err, "error fetching pets"),
        }
    }

    pub fn pets(&self) -> &[Pet] {
        &self.pets
    }

    pub fn pet(&self, pet_id: &str) -> Option<&Pet> {
        self.pets.iter().find(|pet| pet.id == pet_id)
    }

    pub async fn add(&mut self, form: &PetForm) -> Result<Pet, PetFormError> {
        let saved = form
            .submit(self.user.as_deref(), self.store.as_ref(), None)
            .await?;
        self.refresh().await;
        Ok(saved)
    }

    /// Edit a listed pet. An id that is not listed saves as a new pet.
    pub async fn edit(&mut self, pet_id: &str, form: &PetForm) -> Result<Pet, PetFormError> {
        let existing = self.pet(pet_id).cloned();
        let saved = form
            .submit(self.user.as_deref(), self.store.as_ref(), existing.as_ref())
            .await?;
        self.refresh().await;
        Ok(saved)
    }

    /// Delete a pet together with its appointments.
    pub async fn delete(&mut self, pet_id: &str) -> Result<(), PetFormError> {
        if let Err(err) = self.store.delete_pet(pet_id).await {
            tracing::error!(error = %err, pet_id, "error deleting pet");
            return Err(PetFormError::DeleteFailed(err));
        }
        self.pets.retain(|pet| pet.id != pet_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(kind: &str, breed: &str) -> PetForm {
        PetForm {
            name: "Rex".into(),
            kind: kind.into(),
            breed: breed.into(),
            ..PetForm::default()
        }
    }

    #[test]
    fn breed_must_belong_to_kind() {
        let err = form("Cat", "Beagle")
            .to_pet("u1", None, OffsetDateTime::UNIX_EPOCH)
            .unwrap_err();
        assert!(matches!(err, PetFormError::UnknownBreed { kind: PetKind::Cat, .. }));
        assert_eq!(err.to_string(), "\"Beagle\" is not a Cat breed");

        let pet = form("dog", "beagle")
            .to_pet("u1", None, OffsetDateTime::UNIX_EPOCH)
            .unwrap();
        assert_eq!(pet.kind, PetKind::Dog);
        assert_eq!(pet.breed, "Beagle");
        assert_eq!(pet.sex, Sex::Unknown);
    }

    #[test]
    fn rejects_unknown_kind_and_bad_numbers() {
        let err = form("Hamster", "Syrian")
            .to_pet("u1", None, OffsetDateTime::UNIX_EPOCH)
            .unwrap_err();
        assert!(matches!(err, PetFormError::UnknownKind(ref kind) if kind == "Hamster"));

        let mut heavy = form("Dog", "Boxer");
        heavy.weight = "heavy".into();
        assert!(matches!(
            heavy.to_pet("u1", None, OffsetDateTime::UNIX_EPOCH),
            Err(PetFormError::InvalidNumber("Weight"))
        ));

        let mut blank = form("Dog", "Boxer");
        blank.name = "  ".into();
        assert!(matches!(
            blank.to_pet("u1", None, OffsetDateTime::UNIX_EPOCH),
            Err(PetFormError::MissingName)
        ));
    }

    #[test]
    fn editing_keeps_identity() {
        let original = PetForm {
            weight: "12.5".into(),
            age: "3".into(),
            sex: "Male".into(),
            ..form("Dog", "Boxer")
        }
        .to_pet("u1", None, OffsetDateTime::UNIX_EPOCH)
        .unwrap();
        assert_eq!(original.weight, Some(12.5));
        assert_eq!(original.age, Some(3));

        let mut edit = PetForm::from_pet(&original);
        assert_eq!(edit.sex, "Male");
        edit.name = "Rexy".into();
        let later = OffsetDateTime::UNIX_EPOCH + time::Duration::days(1);
        let updated = edit.to_pet("u1", Some(&original), later).unwrap();

        assert_eq!(updated.id, original.id);
        assert_eq!(updated.created_at, original.created_at);
        assert_eq!(updated.updated_at, "1970-01-02T00:00:00Z");
        assert_eq!(updated.name, "Rexy");
        assert_eq!(updated.weight, Some(12.5));
    }
}
