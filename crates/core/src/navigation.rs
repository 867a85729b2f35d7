//! Cross-view routing requests.
//!
//! Any component may emit a [`NavigationSignal`]; the [`AppShell`] is the one
//! listener and owns the decision of which page is shown.

use serde::Serialize;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;
use tracing::{debug, warn};

const SIGNAL_CAPACITY: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationSignal {
    NavigateToQuoteRequest,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    #[default]
    Home,
    Profile,
    QuoteRequest,
    Admin,
}

impl Page {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Profile => "profile",
            Self::QuoteRequest => "quote_request",
            Self::Admin => "admin",
        }
    }
}

#[derive(Clone)]
pub struct SignalBus {
    sender: broadcast::Sender<NavigationSignal>,
}

impl Default for SignalBus {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(SIGNAL_CAPACITY);
        Self { sender }
    }

    /// Fire and forget; an emission with no listener is dropped.
    pub fn emit(&self, signal: NavigationSignal) {
        let _ = self.sender.send(signal);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NavigationSignal> {
        self.sender.subscribe()
    }
}

pub struct AppShell {
    page: Page,
    signals: broadcast::Receiver<NavigationSignal>,
}

impl AppShell {
    pub fn new(bus: &SignalBus) -> Self {
        Self { page: Page::default(), signals: bus.subscribe() }
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn navigate(&mut self, page: Page) {
        if self.page != page {
            debug!(
                event_name = "navigation.changed",
                correlation_id = "shell",
                from = self.page.as_str(),
                to = page.as_str(),
                "page changed"
            );
        }
        self.page = page;
    }

    /// Drains queued signals and returns the page now shown.
    pub fn process_signals(&mut self) -> Page {
        loop {
            match self.signals.try_recv() {
                Ok(NavigationSignal::NavigateToQuoteRequest) => self.navigate(Page::QuoteRequest),
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(
                        event_name = "navigation.signals_lagged",
                        correlation_id = "shell",
                        skipped,
                        "shell fell behind, older navigation signals dropped"
                    );
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return self.page,
            }
        }
    }
}
