use anyhow::Context;
use petpal::ai::{ChatSession, GeminiClient, ImageAttachment};
use petpal::backend::{AppointmentStore, MemoryStore, SupabaseClient};
use petpal::config::{Config, load_dotenv};
use petpal::notify::ConsoleNotifier;
use petpal::reminders::{ReminderScheduler, TaskRegistry};
use petpal::types::PetKind;
use petpal::views::{
    AppointmentForm, AppointmentsPage, Composer, PetForm, PetFormError, PetsPage, TranscriptView,
};
use std::path::Path;
use std::sync::Arc;
use time::UtcOffset;
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "\
Type a message to ask the pet assistant.
  /image <path>                                  attach an image to the next message
  /noimage                                       remove the attached image
  /appointment <pet-id> <YYYY-MM-DD> <HH:MM> <name>  save an appointment with a reminder
  /appointments                                  list saved appointments
  /pet [edit <pet-id>] <type> <name> <breed>     add a pet, or edit one
  /pets                                          list your pets
  /delete pet <pet-id>                           delete a pet and its appointments
  /delete appointment <appointment-id>           delete one appointment
  /help                                          show this help
  /quit                                          exit (pending reminders are dropped)";

fn main() -> anyhow::Result<()> {
    // Must happen before the runtime starts threads, otherwise the local offset
    // cannot be determined and everything falls back to UTC.
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    load_dotenv();
    tracing_subscriber::fmt::init();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    runtime.block_on(run(offset))
}

async fn run(offset: UtcOffset) -> anyhow::Result<()> {
    let config = Config::from_env()?;

    let store: Arc<dyn AppointmentStore> = match &config.supabase {
        Some(supabase) => Arc::new(SupabaseClient::new(supabase)),
        None => {
            tracing::info!("no hosted backend configured, keeping appointments in memory");
            Arc::new(MemoryStore::default())
        }
    };

    let scheduler = ReminderScheduler::new(Arc::new(ConsoleNotifier::default()), offset);
    let mut pets = PetsPage::new(store.clone(), Some(config.owner_id.clone()));
    pets.refresh().await;
    let mut page = AppointmentsPage::new(store, scheduler, Some(config.owner_id.clone()));
    page.mount().await;

    let session = ChatSession::new(Arc::new(GeminiClient::new(&config.gemini)));
    let mut composer = Composer::default();
    let mut transcript = TranscriptView::default();

    println!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        match command {
            "/quit" => break,
            "/help" => println!("{HELP}"),
            "/image" => match ImageAttachment::from_path(Path::new(rest.trim())) {
                Ok(image) => {
                    println!("attached {} ({})", rest.trim(), image.mime_type());
                    composer.attach_image(image);
                }
                Err(err) => println!("could not read image: {err}"),
            },
            "/noimage" => {
                composer.remove_image();
            }
            "/appointment" => add_appointment(&mut page, rest).await,
            "/appointments" => {
                for appt in page.appointments() {
                    println!(
                        "{} {}  {} ({})  [{}]",
                        appt.date,
                        appt.time,
                        appt.name,
                        page.pet_name(&appt.pet_id),
                        appt.id
                    );
                }
            }
            "/pet" => {
                save_pet(&mut pets, rest).await;
                page.refresh().await;
            }
            "/pets" => {
                for pet in pets.pets() {
                    println!("{}  {} ({}, {})", pet.id, pet.name, pet.kind, pet.breed);
                }
            }
            "/delete" => {
                delete(&mut pets, &mut page, rest).await;
                page.refresh().await;
            }
            _ => {
                composer.set_input(line);
                composer.send(&session).await;
                for rendered in transcript.render_new(&session) {
                    println!("{rendered}");
                }
            }
        }
    }

    TaskRegistry::global().discard_all();
    Ok(())
}

async fn add_appointment(page: &mut AppointmentsPage, args: &str) {
    let mut fields = args.split_whitespace();
    let (Some(pet_id), Some(date), Some(time)) = (fields.next(), fields.next(), fields.next())
    else {
        println!("usage: /appointment <pet-id> <YYYY-MM-DD> <HH:MM> <name>");
        return;
    };
    let name = fields.collect::<Vec<_>>().join(" ");
    if name.is_empty() {
        println!("an appointment needs a name");
        return;
    }
    let options = page.pet_options();
    if !options.iter().any(|(id, _)| id == pet_id) {
        println!("unknown pet \"{pet_id}\", choose one of:");
        for (id, name) in options {
            println!("  {id}  {name}");
        }
        return;
    }

    let form = AppointmentForm {
        name,
        pet_id: pet_id.to_string(),
        date: date.to_string(),
        time: time.to_string(),
        ..AppointmentForm::default()
    };
    match page.add(&form).await {
        Ok(saved) => println!("saved \"{}\" on {} at {}", saved.name, saved.date, saved.time),
        Err(err) => println!("{err}"),
    }
}

fn print_pet_usage(kind: Option<PetKind>) {
    println!("usage: /pet [edit <pet-id>] <type> <name> <breed>");
    match kind {
        Some(kind) => println!("{kind} breeds: {}", kind.breeds().join(", ")),
        None => {
            let kinds: Vec<&str> = PetKind::ALL.iter().map(|kind| kind.as_str()).collect();
            println!("types: {}", kinds.join(", "));
        }
    }
}

async fn save_pet(pets: &mut PetsPage, args: &str) {
    let mut fields = args.split_whitespace().peekable();
    let editing = match fields.peek() {
        Some(&"edit") => {
            fields.next();
            match fields.next() {
                Some(id) => Some(id.to_string()),
                None => return print_pet_usage(None),
            }
        }
        _ => None,
    };
    let (Some(kind), Some(name)) = (fields.next(), fields.next()) else {
        return print_pet_usage(None);
    };
    let breed = fields.collect::<Vec<_>>().join(" ");
    if breed.is_empty() {
        return print_pet_usage(PetKind::parse(kind));
    }

    let mut form = match editing.as_deref().and_then(|id| pets.pet(id)) {
        Some(existing) => PetForm::from_pet(existing),
        None => PetForm::default(),
    };
    form.kind = kind.to_string();
    form.name = name.to_string();
    form.breed = breed;

    let saved = match editing.as_deref() {
        Some(id) => pets.edit(id, &form).await,
        None => pets.add(&form).await,
    };
    match saved {
        Ok(pet) => println!("saved {} ({}, {})  [{}]", pet.name, pet.kind, pet.breed, pet.id),
        Err(PetFormError::UnknownBreed { kind, breed }) => {
            println!("\"{breed}\" is not a {kind} breed");
            print_pet_usage(Some(kind));
        }
        Err(err @ PetFormError::UnknownKind(_)) => {
            println!("{err}");
            print_pet_usage(None);
        }
        Err(err) => println!("{err}"),
    }
}

async fn delete(pets: &mut PetsPage, page: &mut AppointmentsPage, args: &str) {
    let result = match args.split_whitespace().collect::<Vec<_>>().as_slice() {
        ["pet", id] => pets.delete(id).await.map_err(|err| err.to_string()),
        ["appointment", id] => page.delete(id).await.map_err(|err| err.to_string()),
        _ => {
            println!("usage: /delete pet <pet-id> | /delete appointment <appointment-id>");
            return;
        }
    };
    match result {
        Ok(()) => println!("deleted"),
        Err(message) => println!("{message}"),
    }
}
