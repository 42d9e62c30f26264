//! Appointment reminders.
//!
//! A reminder is an explicit [`ScheduledTask`] held in a [`TaskRegistry`] until it
//! fires. Tasks are registered at schedule time, removed when they fire, and gone
//! when the process exits; nothing is persisted.

use crate::notify::{NotificationOptions, NotificationPlatform, Permission};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

pub const REMINDER_TITLE: &str = "Pet Appointment Reminder";
pub const REMINDER_ICON: &str = "/pet-icon.svg";

pub type TaskId = u64;

pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReminderRequest {
    pub label: String,
    pub fire_at: OffsetDateTime,
}

impl ReminderRequest {
    /// Combine a calendar date and a wall-clock time in `offset`.
    pub fn new(label: impl Into<String>, date: Date, time: Time, offset: UtcOffset) -> Self {
        Self {
            label: label.into(),
            fire_at: PrimitiveDateTime::new(date, time).assume_offset(offset),
        }
    }

    pub fn notification(&self) -> NotificationOptions {
        NotificationOptions {
            body: format!("Your appointment \"{}\" is scheduled now!", self.label),
            icon: REMINDER_ICON.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScheduledTask {
    pub id: TaskId,
    /// `due - now` as computed when the task was registered.
    pub delay: std::time::Duration,
    pub reminder: ReminderRequest,
}

impl ScheduledTask {
    pub fn due(&self) -> OffsetDateTime {
        self.reminder.fire_at
    }
}

// ============================================
// Task registry
// ============================================

static GLOBAL_REGISTRY: Lazy<Arc<TaskRegistry>> = Lazy::new(|| Arc::new(TaskRegistry::default()));

pub struct TaskRegistry {
    counter: AtomicU64,
    tasks: Mutex<HashMap<TaskId, ScheduledTask>>,
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self {
            counter: AtomicU64::new(1),
            tasks: Mutex::new(HashMap::new()),
        }
    }
}

impl TaskRegistry {
    /// The process-wide registry.
    pub fn global() -> Arc<TaskRegistry> {
        Arc::clone(&GLOBAL_REGISTRY)
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<TaskId, ScheduledTask>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn register(&self, reminder: ReminderRequest, delay: std::time::Duration) -> TaskId {
        let id = self.counter.fetch_add(1, Ordering::Relaxed);
        let task = ScheduledTask {
            id,
            delay,
            reminder,
        };
        self.entries().insert(id, task);
        id
    }

    /// Pending tasks ordered by due time.
    pub fn pending(&self) -> Vec<ScheduledTask> {
        let mut tasks: Vec<ScheduledTask> = self.entries().values().cloned().collect();
        tasks.sort_by(|a, b| a.due().cmp(&b.due()).then(a.id.cmp(&b.id)));
        tasks
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Run task `id` if it is still pending. A task fires at most once.
    pub fn fire(&self, id: TaskId, platform: &dyn NotificationPlatform) -> bool {
        let Some(task) = self.entries().remove(&id) else {
            return false;
        };
        tracing::info!(task = id, label = %task.reminder.label, "reminder due");
        platform.show(REMINDER_TITLE, &task.reminder.notification());
        true
    }

    /// Fire every task due at or before `now`, earliest first.
    pub fn fire_due(&self, now: OffsetDateTime, platform: &dyn NotificationPlatform) -> usize {
        let due: Vec<TaskId> = self
            .pending()
            .into_iter()
            .take_while(|task| task.due() <= now)
            .map(|task| task.id)
            .collect();
        due.into_iter().filter(|id| self.fire(*id, platform)).count()
    }

    /// Drop everything still pending, as happens when the process goes away.
    pub fn discard_all(&self) -> usize {
        let mut entries = self.entries();
        let dropped = entries.len();
        entries.clear();
        if dropped > 0 {
            tracing::info!(dropped, "discarded pending reminders");
        }
        dropped
    }
}

// ============================================
// Scheduler
// ============================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScheduleOutcome {
    Scheduled(TaskId),
    /// No notification capability, or permission not granted.
    PermissionUnavailable,
    /// The fire time is not in the future.
    PastDeadline,
}

/// Best-effort local reminders for saved appointments.
pub struct ReminderScheduler {
    platform: Arc<dyn NotificationPlatform>,
    registry: Arc<TaskRegistry>,
    clock: Arc<dyn Clock>,
    offset: UtcOffset,
}

impl ReminderScheduler {
    /// Scheduler on the global registry and the system clock.
    ///
    /// `offset` is the local UTC offset used to interpret appointment times.
    pub fn new(platform: Arc<dyn NotificationPlatform>, offset: UtcOffset) -> Self {
        Self {
            platform,
            registry: TaskRegistry::global(),
            clock: Arc::new(SystemClock),
            offset,
        }
    }

    pub fn with_registry(mut self, registry: Arc<TaskRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn registry(&self) -> &Arc<TaskRegistry> {
        &self.registry
    }

    pub fn platform(&self) -> &Arc<dyn NotificationPlatform> {
        &self.platform
    }

    pub fn schedule(&self, label: &str, date: Date, time: Time) -> ScheduleOutcome {
        self.schedule_request(ReminderRequest::new(label, date, time, self.offset))
    }

    /// Register `request` if permission is granted and its fire time is ahead.
    ///
    /// Inside a tokio runtime a timer task fires the reminder when due; outside
    /// one the task stays pending until [`TaskRegistry::fire_due`] runs it.
    pub fn schedule_request(&self, request: ReminderRequest) -> ScheduleOutcome {
        if self.platform.permission() != Some(Permission::Granted) {
            tracing::debug!(label = %request.label, "notifications unavailable, skipping reminder");
            return ScheduleOutcome::PermissionUnavailable;
        }

        let remaining = request.fire_at - self.clock.now();
        let delay = match std::time::Duration::try_from(remaining) {
            Ok(delay) if !delay.is_zero() => delay,
            _ => {
                tracing::debug!(label = %request.label, "reminder time already passed");
                return ScheduleOutcome::PastDeadline;
            }
        };

        let label = request.label.clone();
        let id = self.registry.register(request, delay);
        tracing::info!(task = id, %label, delay_secs = delay.as_secs(), "reminder scheduled");

        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            let registry = Arc::clone(&self.registry);
            let platform = Arc::clone(&self.platform);
            runtime.spawn(async move {
                tokio::time::sleep(delay).await;
                registry.fire(id, platform.as_ref());
            });
        }

        ScheduleOutcome::Scheduled(id)
    }
}
