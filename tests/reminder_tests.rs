//! Integration tests for appointment reminders
//!
//! Timer-driven tests run on a paused tokio clock, so hours of delay elapse
//! instantly.

mod common;

use common::{FixedClock, RecordingPlatform};
use petpal::notify::Permission;
use petpal::reminders::{
    REMINDER_ICON, REMINDER_TITLE, ReminderScheduler, ScheduleOutcome, TaskRegistry,
};
use std::sync::Arc;
use std::time::Duration;
use time::macros::{date, datetime, time};
use time::{OffsetDateTime, UtcOffset};

const NOW: OffsetDateTime = datetime!(2025-03-14 8:00 UTC);

fn scheduler_with(platform: Arc<RecordingPlatform>) -> (ReminderScheduler, Arc<TaskRegistry>) {
    let registry = Arc::new(TaskRegistry::default());
    let scheduler = ReminderScheduler::new(platform, UtcOffset::UTC)
        .with_registry(registry.clone())
        .with_clock(Arc::new(FixedClock(NOW)));
    (scheduler, registry)
}

mod timer_tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn fires_exactly_once_when_due() {
        let platform = Arc::new(RecordingPlatform::granted());
        let (scheduler, registry) = scheduler_with(platform.clone());

        let outcome = scheduler.schedule("Vet Checkup", date!(2025 - 03 - 14), time!(8:30));
        assert!(matches!(outcome, ScheduleOutcome::Scheduled(_)));

        let pending = registry.pending();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].delay, Duration::from_secs(30 * 60));
        assert_eq!(pending[0].due(), datetime!(2025-03-14 8:30 UTC));

        tokio::time::sleep(Duration::from_secs(30 * 60 - 1)).await;
        assert!(platform.shown().is_empty());
        assert_eq!(registry.len(), 1);

        tokio::time::sleep(Duration::from_secs(2)).await;
        let shown = platform.shown();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].0, REMINDER_TITLE);
        assert!(shown[0].1.body.contains("Vet Checkup"));
        assert_eq!(shown[0].1.icon, REMINDER_ICON);
        assert!(registry.is_empty());

        tokio::time::sleep(Duration::from_secs(24 * 60 * 60)).await;
        assert_eq!(platform.shown().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn independent_reminders_fire_in_due_order() {
        let platform = Arc::new(RecordingPlatform::granted());
        let (scheduler, registry) = scheduler_with(platform.clone());

        scheduler.schedule("Grooming", date!(2025 - 03 - 14), time!(10:00));
        scheduler.schedule("Vaccination", date!(2025 - 03 - 14), time!(9:00));
        assert_eq!(registry.len(), 2);

        tokio::time::sleep(Duration::from_secs(3 * 60 * 60)).await;
        let bodies: Vec<String> = platform.shown().into_iter().map(|(_, o)| o.body).collect();
        assert_eq!(bodies.len(), 2);
        assert!(bodies[0].contains("Vaccination"));
        assert!(bodies[1].contains("Grooming"));
    }

    #[tokio::test(start_paused = true)]
    async fn discarded_reminders_never_fire() {
        let platform = Arc::new(RecordingPlatform::granted());
        let (scheduler, registry) = scheduler_with(platform.clone());

        scheduler.schedule("Dental", date!(2025 - 03 - 14), time!(9:00));
        assert_eq!(registry.discard_all(), 1);

        tokio::time::sleep(Duration::from_secs(2 * 60 * 60)).await;
        assert!(platform.shown().is_empty());
    }
}

mod gating_tests {
    use super::*;

    #[test]
    fn past_or_present_times_are_skipped() {
        for permission in [
            None,
            Some(Permission::Undetermined),
            Some(Permission::Granted),
            Some(Permission::Denied),
        ] {
            let platform = Arc::new(RecordingPlatform::with_permission(permission));
            let (scheduler, registry) = scheduler_with(platform);

            let at_now = scheduler.schedule("Now", date!(2025 - 03 - 14), time!(8:00));
            let earlier = scheduler.schedule("Earlier", date!(2025 - 03 - 13), time!(23:59));
            assert!(!matches!(at_now, ScheduleOutcome::Scheduled(_)));
            assert!(!matches!(earlier, ScheduleOutcome::Scheduled(_)));
            assert!(registry.is_empty(), "{permission:?}");
        }
    }

    #[test]
    fn permission_other_than_granted_skips() {
        for permission in [None, Some(Permission::Undetermined), Some(Permission::Denied)] {
            let platform = Arc::new(RecordingPlatform::with_permission(permission));
            let (scheduler, registry) = scheduler_with(platform.clone());

            let outcome = scheduler.schedule("Vet", date!(2025 - 12 - 01), time!(10:00));
            assert_eq!(outcome, ScheduleOutcome::PermissionUnavailable);
            assert!(registry.is_empty());
            assert_eq!(platform.request_count(), 0);
        }
    }

    #[test]
    fn granted_but_elapsed_is_past_deadline() {
        let platform = Arc::new(RecordingPlatform::granted());
        let (scheduler, _) = scheduler_with(platform);
        assert_eq!(
            scheduler.schedule("Late", date!(2025 - 03 - 14), time!(7:59)),
            ScheduleOutcome::PastDeadline
        );
    }

    #[test]
    fn local_offset_shifts_the_fire_time() {
        let platform = Arc::new(RecordingPlatform::granted());
        let registry = Arc::new(TaskRegistry::default());
        let offset = UtcOffset::from_hms(-5, 0, 0).unwrap();
        let scheduler = ReminderScheduler::new(platform, offset)
            .with_registry(registry.clone())
            .with_clock(Arc::new(FixedClock(NOW)));

        // 04:00 at -05:00 is 09:00 UTC, one hour after NOW.
        let outcome = scheduler.schedule("Walk", date!(2025 - 03 - 14), time!(4:00));
        assert!(matches!(outcome, ScheduleOutcome::Scheduled(_)));
        assert_eq!(registry.pending()[0].delay, Duration::from_secs(60 * 60));
    }
}
