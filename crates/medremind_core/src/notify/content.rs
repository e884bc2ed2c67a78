//! Notification text for reminders.

use crate::model::reminder::Reminder;

/// Title used for schedules issued by the lifecycle coordinator.
pub const SCHEDULED_TITLE: &str = "Medicine Reminder";

/// Title and body handed to the delivery collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationContent {
    pub title: String,
    pub body: String,
}

impl NotificationContent {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }

    /// Content for a schedule programmed on add/update.
    ///
    /// `Time to take Aspirin (1 pill)`, or without the parenthesis when no
    /// dosage is recorded.
    pub fn scheduled(reminder: &Reminder) -> Self {
        let body = match reminder.dosage_label() {
            Some(dosage) => format!("Time to take {} ({dosage})", reminder.medicine_name),
            None => format!("Time to take {}", reminder.medicine_name),
        };
        Self::new(SCHEDULED_TITLE, body)
    }

    /// Content for a delivery triggered by the due scan.
    pub fn due(reminder: &Reminder) -> Self {
        let body = match reminder.dosage_label() {
            Some(dosage) => format!("Time to take your medicine: {dosage}"),
            None => "Time to take your medicine".to_string(),
        };
        Self::new(reminder.medicine_name.clone(), body)
    }
}

#[cfg(test)]
mod tests {
    use super::{NotificationContent, SCHEDULED_TITLE};
    use crate::model::reminder::{ReminderDraft, TimeOfDay};
    use chrono::NaiveDate;

    fn aspirin() -> ReminderDraft {
        ReminderDraft::new(
            "Aspirin",
            TimeOfDay::new(8, 30).unwrap(),
            NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
        )
    }

    #[test]
    fn scheduled_content_mentions_name_and_dosage() {
        let reminder = aspirin().with_dosage("1 pill").into_reminder();
        let content = NotificationContent::scheduled(&reminder);
        assert_eq!(content.title, SCHEDULED_TITLE);
        assert_eq!(content.body, "Time to take Aspirin (1 pill)");
    }

    #[test]
    fn due_content_is_titled_with_medicine_name() {
        let with_dosage = NotificationContent::due(&aspirin().with_dosage("2 ml").into_reminder());
        assert_eq!(with_dosage.title, "Aspirin");
        assert_eq!(with_dosage.body, "Time to take your medicine: 2 ml");

        let bare = NotificationContent::due(&aspirin().into_reminder());
        assert_eq!(bare.body, "Time to take your medicine");
    }
}
