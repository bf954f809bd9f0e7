//! Event sink forwarding world events to the log.

use merge_farm_core::{Event, EventSink};

/// Logs every event; clock ticks at trace level, failures as warnings.
#[derive(Debug, Default)]
pub(crate) struct LoggingSink;

impl EventSink for LoggingSink {
    fn notify(&mut self, event: &Event) {
        match event {
            Event::TimeAdvanced { .. } => log::trace!("{event:?}"),
            Event::PersistenceFailed { message } => log::warn!("progress not saved: {message}"),
            Event::LedgerChanged { .. } | Event::AchievementProgressed { .. } => {
                log::debug!("{event:?}");
            }
            _ => log::info!("{event:?}"),
        }
    }
}
