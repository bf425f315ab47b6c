/*
[INPUT]:  Session manager, initial filter state, log buffer, debounced filter channel
[OUTPUT]: AppState with filter inputs, focus, and session controls for the TUI
[POS]:    TUI app state
[UPDATE]: When adding TUI controls or editable fields
*/

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info};
use tui_input::{Input, InputRequest};

use crate::debounce::Debouncer;
use crate::filter::FilterState;
use crate::render::RenderSink;
use crate::session::{LiveSessionManager, SessionState};
use crate::tui::LogBufferHandle;
use crate::view::LogView;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Focus {
    Table,
    Services,
    Keywords,
}

/// Debounced filter edit, tagged with the control epoch it was typed in
#[derive(Debug, Clone)]
pub(super) struct FilterChange {
    pub(super) epoch: u64,
    pub(super) filter: FilterState,
}

pub(super) struct AppState {
    pub(super) manager: LiveSessionManager<LogView>,
    pub(super) filter: FilterState,
    pub(super) services: Input,
    pub(super) keywords: Input,
    pub(super) focus: Focus,
    pub(super) log_buffer: LogBufferHandle,
    pub(super) status_message: String,
    debouncer: Debouncer<FilterChange>,
    /// Bumped by manual session controls; older filter changes are ignored
    control_epoch: u64,
}

impl AppState {
    pub(super) fn new(
        manager: LiveSessionManager<LogView>,
        filter: FilterState,
        filter_tx: mpsc::UnboundedSender<FilterChange>,
        debounce: Duration,
        log_buffer: LogBufferHandle,
    ) -> Self {
        let services = Input::new(filter.services().to_string());
        let keywords = Input::new(filter.message_keywords().to_string());
        let debouncer = Debouncer::new(debounce, move |change| {
            let _ = filter_tx.send(change);
        });

        Self {
            manager,
            filter,
            services,
            keywords,
            focus: Focus::Table,
            log_buffer,
            status_message: "Ready".to_string(),
            debouncer,
            control_epoch: 0,
        }
    }

    pub(super) async fn start_session(&mut self) {
        let registered = self.manager.start(self.filter.clone()).await;
        self.status_message = format!(
            "streaming from {registered}/{} hosts",
            self.filter.hosts().len()
        );
    }

    /// Debounced filter change: restart with the new values, or start when idle.
    ///
    /// Changes typed before the last toggle/restart are dropped, even when the
    /// timer already fired.
    pub(super) async fn apply_filters(&mut self, change: FilterChange) {
        if change.epoch != self.control_epoch {
            debug!(
                epoch = change.epoch,
                current = self.control_epoch,
                "ignoring filter change queued before a session control"
            );
            return;
        }
        let filter = change.filter;
        if self.manager.state() != SessionState::Idle
            && self.manager.filter() == Some(&filter)
        {
            return;
        }
        info!(
            services = %filter.services(),
            message_keywords = %filter.message_keywords(),
            "filters changed"
        );
        self.filter = filter;
        self.start_session().await;
    }

    pub(super) async fn toggle_live(&mut self) {
        self.discard_pending_filters();
        self.manager.toggle_live(self.filter.clone()).await;
        self.status_message = match self.manager.state() {
            SessionState::Idle => "paused".to_string(),
            _ => "live".to_string(),
        };
    }

    pub(super) async fn restart(&mut self) {
        self.discard_pending_filters();
        self.manager.restart(self.filter.clone()).await;
        self.status_message = "restarted".to_string();
    }

    pub(super) async fn shutdown(&mut self) {
        self.discard_pending_filters();
        self.manager.stop().await;
    }

    pub(super) fn focus(&mut self, focus: Focus) {
        self.focus = focus;
    }

    /// Apply an edit to the focused input; value changes schedule a restart
    pub(super) fn edit_focused(&mut self, request: InputRequest) {
        let input = match self.focus {
            Focus::Services => &mut self.services,
            Focus::Keywords => &mut self.keywords,
            Focus::Table => return,
        };
        let changed = input.handle(request).is_some_and(|change| change.value);
        if !changed {
            return;
        }

        self.filter.set_services(self.services.value());
        self.filter.set_message_keywords(self.keywords.value());
        self.debouncer.call(FilterChange {
            epoch: self.control_epoch,
            filter: self.filter.clone(),
        });
    }

    fn discard_pending_filters(&mut self) {
        self.debouncer.cancel();
        self.control_epoch += 1;
    }

    pub(super) fn filter_change_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    pub(super) fn scroll_by(&mut self, delta: isize) {
        self.manager.sink_mut().scroll_by(delta);
    }

    pub(super) fn page_up(&mut self) {
        self.manager.sink_mut().page_up();
    }

    pub(super) fn page_down(&mut self) {
        self.manager.sink_mut().page_down();
    }

    pub(super) fn scroll_to_bottom(&mut self) {
        self.manager.sink_mut().scroll_to_bottom();
    }

    pub(super) fn scroll_to_top(&mut self) {
        self.manager.sink_mut().scroll_to_top();
    }

    pub(super) fn clear_view(&mut self) {
        self.manager.clear_view();
        self.status_message = "view cleared".to_string();
    }

    pub(super) fn toggle_autoscroll(&mut self) {
        let autoscroll = !self.manager.autoscroll();
        self.manager.set_autoscroll(autoscroll);
        self.status_message = format!(
            "autoscroll {}",
            if autoscroll { "on" } else { "off" }
        );
    }
}
