use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    /// Highlighted assistant reply. Rendered differently, otherwise an assistant turn.
    Answer,
}

impl Role {
    pub fn is_assistant(self) -> bool {
        matches!(self, Role::Assistant | Role::Answer)
    }
}

/// Opaque handle to a locally previewed image. Never persisted or re-fetched.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PreviewRef(String);

impl PreviewRef {
    pub fn new() -> Self {
        Self(format!("blob:petpal/{}", uuid::Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for PreviewRef {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub created_at: OffsetDateTime,
    pub image: Option<PreviewRef>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>, image: Option<PreviewRef>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            created_at: OffsetDateTime::now_utc(),
            image,
        }
    }

    pub fn answer(content: impl Into<String>) -> Self {
        Self {
            role: Role::Answer,
            content: content.into(),
            created_at: OffsetDateTime::now_utc(),
            image: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PetKind {
    Dog,
    Cat,
    Parrot,
    Turtle,
}

impl PetKind {
    pub const ALL: [PetKind; 4] = [PetKind::Dog, PetKind::Cat, PetKind::Parrot, PetKind::Turtle];

    pub fn as_str(self) -> &'static str {
        match self {
            PetKind::Dog => "Dog",
            PetKind::Cat => "Cat",
            PetKind::Parrot => "Parrot",
            PetKind::Turtle => "Turtle",
        }
    }

    /// Case-insensitive lookup by name.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(value))
    }

    /// The catalog spelling of `breed`, if it is one of this kind's breeds.
    pub fn find_breed(self, breed: &str) -> Option<&'static str> {
        let breed = breed.trim();
        self.breeds()
            .iter()
            .copied()
            .find(|known| known.eq_ignore_ascii_case(breed))
    }

    /// Breed choices offered for this kind. The last entry is always `Mixed/Other`.
    pub fn breeds(self) -> &'static [&'static str] {
        match self {
            PetKind::Dog => &[
                "Labrador Retriever",
                "German Shepherd",
                "Golden Retriever",
                "Bulldog",
                "Beagle",
                "Poodle",
                "Rottweiler",
                "Yorkshire Terrier",
                "Boxer",
                "Dachshund",
                "Shih Tzu",
                "Mixed/Other",
            ],
            PetKind::Cat => &[
                "Persian",
                "Maine Coon",
                "Siamese",
                "Ragdoll",
                "Bengal",
                "Sphynx",
                "British Shorthair",
                "Abyssinian",
                "Scottish Fold",
                "Bombay",
                "Siberian",
                "Mixed/Other",
            ],
            PetKind::Parrot => &[
                "African Grey",
                "Cockatoo",
                "Macaw",
                "Cockatiel",
                "Budgerigar",
                "Conure",
                "Lovebird",
                "Amazon",
                "Eclectus",
                "Pionus",
                "Lory",
                "Mixed/Other",
            ],
            PetKind::Turtle => &[
                "Red-Eared Slider",
                "Box Turtle",
                "Painted Turtle",
                "Map Turtle",
                "Mud Turtle",
                "Musk Turtle",
                "Spotted Turtle",
                "Wood Turtle",
                "Softshell Turtle",
                "Snapping Turtle",
                "Cooter",
                "Mixed/Other",
            ],
        }
    }
}

impl fmt::Display for PetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    Male,
    Female,
    #[default]
    Unknown,
}

impl Sex {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => Some(Sex::Male),
            "female" | "f" => Some(Sex::Female),
            "unknown" => Some(Sex::Unknown),
            _ => None,
        }
    }
}

/// Row of the hosted `pets` table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pet {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: PetKind,
    pub breed: String,
    pub weight: Option<f64>,
    pub height: Option<f64>,
    pub age: Option<u32>,
    #[serde(default)]
    pub sex: Sex,
    pub image_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Row of the hosted `appointments` table. `date` is `YYYY-MM-DD`, `time` is `HH:MM`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub owner_id: String,
    pub pet_id: String,
    pub name: String,
    pub description: Option<String>,
    pub date: String,
    pub time: String,
    pub created_at: String,
    pub updated_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_ends_with_mixed_breed() {
        for kind in PetKind::ALL {
            let breeds = kind.breeds();
            assert_eq!(breeds.len(), 12);
            assert_eq!(breeds.last(), Some(&"Mixed/Other"));
        }
    }

    #[test]
    fn kinds_and_breeds_parse_loosely() {
        assert_eq!(PetKind::parse(" parrot "), Some(PetKind::Parrot));
        assert_eq!(PetKind::parse("hamster"), None);
        assert_eq!(PetKind::Dog.find_breed("golden retriever"), Some("Golden Retriever"));
        assert_eq!(PetKind::Cat.find_breed("Beagle"), None);
        assert_eq!(Sex::parse("F"), Some(Sex::Female));
        assert_eq!(Sex::parse("other"), None);
    }

    #[test]
    fn pet_row_uses_type_column() {
        let row = r#"{
            "id": "p1", "owner_id": "u1", "name": "Rex", "type": "Dog",
            "breed": "Beagle", "weight": 12.5, "height": null, "age": 3,
            "sex": "Male", "image_url": null,
            "created_at": "2024-01-01T00:00:00Z", "updated_at": "2024-01-01T00:00:00Z"
        }"#;
        let pet: Pet = serde_json::from_str(row).unwrap();
        assert_eq!(pet.kind, PetKind::Dog);
        assert_eq!(pet.sex, Sex::Male);
        assert_eq!(pet.age, Some(3));
    }

    #[test]
    fn answer_counts_as_assistant() {
        assert!(Role::Answer.is_assistant());
        assert!(Role::Assistant.is_assistant());
        assert!(!Role::User.is_assistant());
    }
}
