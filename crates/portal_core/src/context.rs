use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::warn;

use crate::{
    config::PortalSettings,
    error::PortalResult,
    events::PortalEvent,
    notifier::{Notice, NoticeKind, Notifier, TracingNotifier},
    transport::{HttpPortalApi, PortalApi},
};

/// Collaborators shared by every controller of a dashboard.
#[derive(Clone)]
pub struct PortalContext {
    api: Arc<dyn PortalApi>,
    notifier: Arc<dyn Notifier>,
    settings: Arc<PortalSettings>,
    events: broadcast::Sender<PortalEvent>,
}

impl PortalContext {
    pub fn new(
        api: Arc<dyn PortalApi>,
        notifier: Arc<dyn Notifier>,
        settings: PortalSettings,
    ) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            api,
            notifier,
            settings: Arc::new(settings),
            events,
        }
    }

    /// Context talking to the configured backend over HTTP.
    pub fn connect(settings: PortalSettings) -> anyhow::Result<Self> {
        let base_url = settings.parsed_base_url()?;
        let api = HttpPortalApi::new(base_url)?;
        Ok(Self::new(Arc::new(api), Arc::new(TracingNotifier), settings))
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn api(&self) -> &dyn PortalApi {
        self.api.as_ref()
    }

    pub fn settings(&self) -> &PortalSettings {
        &self.settings
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PortalEvent> {
        self.events.subscribe()
    }

    pub(crate) fn publish(&self, event: PortalEvent) {
        // No subscribers is fine: rendering is optional.
        let _ = self.events.send(event);
    }

    pub(crate) fn notify(&self, kind: NoticeKind, message: impl Into<String>) {
        let notice = Notice::new(kind, message);
        self.notifier.show(&notice);
        self.publish(PortalEvent::Notice(notice));
    }

    /// Surfaces a failed operation to the operator and hands the error back.
    pub(crate) fn surface<T>(&self, result: PortalResult<T>, fallback: &str) -> PortalResult<T> {
        result.map_err(|err| {
            let err = err.or_message(fallback);
            if !err.is_local() {
                warn!(%err, "portal operation failed");
            }
            self.notify(NoticeKind::Error, err.to_string());
            err
        })
    }
}

