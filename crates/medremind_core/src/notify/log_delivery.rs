use super::{DeliveryError, NotificationContent, NotificationDelivery, NotificationId};
use chrono::NaiveDateTime;
use log::info;

/// Delivery collaborator that only writes log events.
///
/// Used by headless tools where no notification center exists. Titles and
/// bodies are user text, so only their lengths are logged.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDelivery;

impl NotificationDelivery for LogDelivery {
    fn show(
        &self,
        id: NotificationId,
        content: &NotificationContent,
    ) -> Result<(), DeliveryError> {
        info!(
            "event=delivery_show module=notify status=ok id={} title_len={} body_len={}",
            id,
            content.title.chars().count(),
            content.body.chars().count()
        );
        Ok(())
    }

    fn schedule_exact(
        &self,
        id: NotificationId,
        _content: &NotificationContent,
        at: NaiveDateTime,
    ) -> Result<(), DeliveryError> {
        info!("event=delivery_schedule module=notify status=ok id={id} at={at}");
        Ok(())
    }

    fn cancel(&self, id: NotificationId) -> Result<(), DeliveryError> {
        info!("event=delivery_cancel module=notify status=ok id={id}");
        Ok(())
    }

    fn cancel_all(&self) -> Result<(), DeliveryError> {
        info!("event=delivery_cancel_all module=notify status=ok");
        Ok(())
    }
}
