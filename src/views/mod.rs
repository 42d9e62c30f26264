pub mod appointments;
pub mod chat;
pub mod pets;

pub use appointments::{AppointmentForm, AppointmentsPage, FormError};
pub use chat::{Composer, TranscriptView};
pub use pets::{PetForm, PetFormError, PetsPage};
