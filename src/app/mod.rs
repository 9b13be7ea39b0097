pub mod state;
mod sync;

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::channel::ChangeChannel;
use crate::config::Config;
use crate::poll::{Poll, PollFilters};
use crate::reconciler::Reconciler;
use crate::service::{HttpPollStore, MemoryPollStore, PollStore};
use crate::storage::{FileMirror, LocalMirror};
use crate::ui::Theme;
use crate::view::{self, Banner, PollDetails};

pub use state::{next_status_filter, PendingDelete, StatusMessage, ViewMode};

const DEBUG_LOG_LIMIT: usize = 100;

pub struct App {
    pub view_mode: ViewMode,
    pub selected: usize,
    pub details: Option<PollDetails>,
    pub pending_delete: Option<PendingDelete>,

    // Core components
    pub reconciler: Reconciler,
    /// Set in demo mode so the outage switch can reach the store.
    pub demo_store: Option<Arc<MemoryPollStore>>,
    pub debug_log: VecDeque<String>,

    pub config: Config,
    pub theme: Theme,

    // Debug log visibility (hidden by default)
    pub show_debug: bool,

    // Status bar message (for displaying errors/info)
    pub status_message: Option<StatusMessage>,
}

impl App {
    pub async fn new() -> Result<Self> {
        let mut startup = vec!["Starting pollsync...".to_string()];

        let config = match Config::load() {
            Ok(cfg) => {
                startup.push("Configuration loaded".to_string());
                cfg
            }
            Err(e) => {
                tracing::warn!("Failed to load config: {:#}", e);
                startup.push(format!("Failed to load config: {}, using defaults", e));
                Config::default()
            }
        };

        let (store, demo_store): (Arc<dyn PollStore>, Option<Arc<MemoryPollStore>>) =
            match config.remote.base_url {
                Some(ref base_url) => {
                    startup.push(format!("Poll store: {}", base_url));
                    let http = HttpPollStore::new(base_url, config.remote.api_token.clone());
                    (Arc::new(http) as Arc<dyn PollStore>, None)
                }
                None => {
                    startup.push("No remote configured, using demo polls".to_string());
                    let demo = Arc::new(MemoryPollStore::demo());
                    (demo.clone() as Arc<dyn PollStore>, Some(demo))
                }
            };

        let cache_path = config.cache.resolved_path()?;
        let mut mirror = FileMirror::new(cache_path.clone())
            .with_context(|| format!("Failed to open poll cache at {}", cache_path.display()))?;
        mirror.watch(config.cache.watch_interval());
        startup.push(format!("Cache: {}", cache_path.display()));

        let mut app = Self::with_parts(config, store, demo_store, Arc::new(mirror));
        for line in startup {
            app.add_debug(line);
        }
        Ok(app)
    }

    /// Assemble an app from already-built parts and start the first fetch.
    pub fn with_parts(
        config: Config,
        store: Arc<dyn PollStore>,
        demo_store: Option<Arc<MemoryPollStore>>,
        mirror: Arc<dyn LocalMirror>,
    ) -> Self {
        let channel = ChangeChannel::new(config.sync.channel_capacity.max(1));
        let mut reconciler = Reconciler::new(store, mirror, channel, config.sync.tick_interval());
        reconciler.set_filters(PollFilters::default());

        let theme = Theme::from_config(&config.ui);

        Self {
            view_mode: ViewMode::List,
            selected: 0,
            details: None,
            pending_delete: None,
            reconciler,
            demo_store,
            debug_log: VecDeque::new(),
            config,
            theme,
            show_debug: false,
            status_message: None,
        }
    }

    pub fn polls(&self) -> &[Poll] {
        self.reconciler.polls()
    }

    pub fn banner(&self) -> Banner {
        Banner::from_state(self.reconciler.state())
    }

    pub fn selected_poll(&self) -> Option<&Poll> {
        self.polls().get(self.selected)
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.polls().len() {
            self.selected += 1;
        }
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Advance the status filter and refetch.
    pub fn cycle_status_filter(&mut self) {
        let filters = PollFilters {
            status: next_status_filter(self.reconciler.filters().status),
            ..self.reconciler.filters().clone()
        };
        self.add_debug(format!("Filter: {}", filters.describe()));
        self.selected = 0;
        self.reconciler.set_filters(filters);
    }

    pub fn refresh(&mut self) {
        self.add_debug("Refreshing polls".to_string());
        self.reconciler.refresh();
    }

    /// Open the drill-down view for the selected poll.
    pub async fn open_selected(&mut self) {
        let Some(poll) = self.selected_poll().cloned() else {
            return;
        };
        self.load_details(&poll.id, Some(&poll)).await;
    }

    /// Reload the open drill-down view.
    pub async fn reload_details(&mut self) {
        let Some(id) = self.details.as_ref().map(|d| d.id.clone()) else {
            return;
        };
        let known = self.polls().iter().find(|p| p.id == id).cloned();
        self.load_details(&id, known.as_ref()).await;
    }

    async fn load_details(&mut self, id: &str, known: Option<&Poll>) {
        let store = Arc::clone(self.reconciler.store());
        match view::load_details(store.as_ref(), id, known, self.theme.palette_size()).await {
            Ok(details) => {
                if let view::ResultsSource::ListFallback(ref reason) = details.source {
                    self.add_debug(format!("Results for {} from list counts: {}", id, reason));
                }
                self.details = Some(details);
                self.view_mode = ViewMode::Details;
            }
            Err(e) => {
                self.set_status_error(format!("Could not open poll {}: {}", id, e));
            }
        }
    }

    pub fn close_details(&mut self) {
        self.view_mode = ViewMode::List;
        self.details = None;
    }

    /// Ask for confirmation before deleting the poll in view.
    pub fn request_delete(&mut self) {
        let target = match self.view_mode {
            ViewMode::Details => self.details.as_ref().map(|d| PendingDelete {
                id: d.id.clone(),
                question: d.question.clone(),
            }),
            ViewMode::List => self.selected_poll().map(|p| PendingDelete {
                id: p.id.clone(),
                question: p.question.clone(),
            }),
        };
        self.pending_delete = target;
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    pub async fn confirm_delete(&mut self) {
        let Some(pending) = self.pending_delete.take() else {
            return;
        };
        match self.reconciler.remove(&pending.id).await {
            Ok(()) => {
                self.set_status_info(format!("Deleted '{}'", pending.question));
                if self.details.as_ref().is_some_and(|d| d.id == pending.id) {
                    self.close_details();
                }
                self.clamp_selection();
            }
            Err(e) => self.set_status_error(e.to_string()),
        }
    }

    /// Flip the simulated outage of the demo store. No-op with a real remote.
    pub fn toggle_outage(&mut self) {
        let Some(ref store) = self.demo_store else {
            self.set_status_info("Outage simulation is only available in demo mode".to_string());
            return;
        };
        let offline = !store.is_offline();
        store.set_offline(offline);
        if offline {
            self.set_status_info("Simulated outage started".to_string());
        } else {
            self.set_status_info("Simulated outage ended".to_string());
        }
        self.refresh();
    }

    pub fn outage_active(&self) -> Option<bool> {
        self.demo_store.as_ref().map(|s| s.is_offline())
    }

    pub fn clamp_selection(&mut self) {
        let len = self.polls().len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }

    pub fn add_debug(&mut self, msg: String) {
        tracing::debug!("{}", msg);
        self.debug_log.push_back(msg);
        while self.debug_log.len() > DEBUG_LOG_LIMIT {
            self.debug_log.pop_front();
        }
    }

    pub fn set_status_error(&mut self, msg: String) {
        self.status_message = Some(StatusMessage {
            message: msg.clone(),
            is_error: true,
            timestamp: std::time::Instant::now(),
        });
        self.add_debug(msg);
    }

    pub fn set_status_info(&mut self, msg: String) {
        self.status_message = Some(StatusMessage {
            message: msg,
            is_error: false,
            timestamp: std::time::Instant::now(),
        });
    }

    pub fn clear_expired_status(&mut self) {
        let timeout = Duration::from_secs(self.config.ui.status_timeout_secs);
        if let Some(ref msg) = self.status_message {
            if msg.timestamp.elapsed() > timeout {
                self.status_message = None;
            }
        }
    }

    pub fn shutdown(&mut self) {
        self.reconciler.shutdown();
    }
}
