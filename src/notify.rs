//! Local notification platform.
//!
//! The reminder scheduler only ever talks to [`NotificationPlatform`]; the
//! terminal build ships [`ConsoleNotifier`].

use std::sync::{Mutex, PoisonError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Permission {
    Undetermined,
    Granted,
    Denied,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NotificationOptions {
    pub body: String,
    pub icon: String,
}

pub trait NotificationPlatform: Send + Sync {
    /// `None` when the host has no notification capability at all.
    fn permission(&self) -> Option<Permission>;

    fn request_permission(&self) -> Permission;

    fn show(&self, title: &str, options: &NotificationOptions);
}

/// Prints notifications to stdout.
///
/// Starts out `Undetermined`; a permission request resolves to whatever the
/// notifier was built with.
pub struct ConsoleNotifier {
    permission: Mutex<Permission>,
    answer: Permission,
}

impl ConsoleNotifier {
    pub fn new(answer: Permission) -> Self {
        Self {
            permission: Mutex::new(Permission::Undetermined),
            answer,
        }
    }
}

impl Default for ConsoleNotifier {
    fn default() -> Self {
        Self::new(Permission::Granted)
    }
}

impl NotificationPlatform for ConsoleNotifier {
    fn permission(&self) -> Option<Permission> {
        Some(*self.permission.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn request_permission(&self) -> Permission {
        let mut current = self.permission.lock().unwrap_or_else(PoisonError::into_inner);
        if *current == Permission::Undetermined {
            *current = self.answer;
            tracing::info!(permission = ?self.answer, "notification permission resolved");
        }
        *current
    }

    fn show(&self, title: &str, options: &NotificationOptions) {
        tracing::info!(title, body = %options.body, "showing notification");
        println!("\n[{title}] {}", options.body);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_resolves_once() {
        let notifier = ConsoleNotifier::new(Permission::Denied);
        assert_eq!(notifier.permission(), Some(Permission::Undetermined));
        assert_eq!(notifier.request_permission(), Permission::Denied);
        assert_eq!(notifier.permission(), Some(Permission::Denied));
    }

    #[test]
    fn default_grants() {
        let notifier = ConsoleNotifier::default();
        assert_eq!(notifier.request_permission(), Permission::Granted);
        assert_eq!(notifier.request_permission(), Permission::Granted);
    }
}
