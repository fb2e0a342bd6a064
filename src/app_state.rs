//! Application state: the single owner of everything the UI context mutates.
//!
//! Every OS callback arrives as an [`AppEvent`] on the UI queue and is handled
//! here, one at a time. Commands tagged with a session that is no longer open
//! are dropped.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::dispatch::UiSender;
use crate::error::{Result, ResultExt};
use crate::hotkeys::{HotkeyBackend, HotkeyHandler, HotkeyRegistrationService};
use crate::input_router::{CommandSink, PanelCommand};
use crate::insertion::{ClipboardWriter, SymbolInsertionService};
use crate::logging;
use crate::panel::{
    FooterAction, PanelDeps, PanelHit, PanelLifecycleController, PanelViewModel, Point,
    SessionId, ToggleOutcome,
};
use crate::settings::SettingsOpener;
use crate::symbols::{Symbol, SymbolCatalog};

/// Everything that can happen to the application, marshalled onto the UI context.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// OS hotkey press, by registration id
    HotkeyFired(u32),
    /// Status item left click, or the hotkey handler
    TogglePanel,
    /// Routed input for a specific panel session
    Panel {
        session: SessionId,
        command: PanelCommand,
    },
    /// Primary click inside the panel, flipped view coordinates
    PanelClicked { session: SessionId, point: Point },
    ConfigReloaded(Box<Config>),
    OpenSettings,
    Quit,
}

/// OS collaborators handed to [`AppState::new`]
pub struct AppServices {
    pub hotkeys: Box<dyn HotkeyBackend>,
    pub panel: PanelDeps,
    pub clipboard: Box<dyn ClipboardWriter>,
    pub settings: Box<dyn SettingsOpener>,
    /// Stops the run loop
    pub on_quit: Box<dyn FnMut()>,
}

pub struct AppState {
    config: Config,
    catalog: SymbolCatalog,
    hotkeys: HotkeyRegistrationService,
    panel: PanelLifecycleController,
    insertion: SymbolInsertionService,
    settings: Box<dyn SettingsOpener>,
    events: UiSender<AppEvent>,
    on_quit: Option<Box<dyn FnMut()>>,
}

impl AppState {
    pub fn new(config: Config, services: AppServices, events: UiSender<AppEvent>) -> Self {
        let panel = PanelLifecycleController::new(
            services.panel,
            config.get_panel_width(),
            config.get_panel_height(),
        );
        Self {
            catalog: SymbolCatalog::new(config.symbols.clone()),
            config,
            hotkeys: HotkeyRegistrationService::new(services.hotkeys),
            panel,
            insertion: SymbolInsertionService::new(services.clipboard),
            settings: services.settings,
            events,
            on_quit: Some(services.on_quit),
        }
    }

    /// Register the panel hotkey. A failure is reported but leaves the
    /// application usable from the status item.
    pub fn start(&mut self) -> Result<()> {
        let events = self.events.clone();
        let handler: HotkeyHandler = Arc::new(move || {
            events.post(AppEvent::TogglePanel);
        });
        self.hotkeys.register(self.config.hotkey, handler)
    }

    pub fn handle(&mut self, event: AppEvent) {
        match event {
            AppEvent::HotkeyFired(id) => {
                self.hotkeys.handle_fired(id);
            }
            AppEvent::TogglePanel => self.toggle_panel(),
            AppEvent::Panel { session, command } => self.handle_command(session, command),
            AppEvent::PanelClicked { session, point } => self.handle_click(session, point),
            AppEvent::ConfigReloaded(config) => self.apply_config(*config),
            AppEvent::OpenSettings => self.open_settings(),
            AppEvent::Quit => self.quit(),
        }
    }

    fn command_sink(&self) -> CommandSink {
        let events = self.events.clone();
        Arc::new(move |session, command| {
            events.post(AppEvent::Panel { session, command });
        })
    }

    fn toggle_panel(&mut self) {
        let commands = self.command_sink();
        match self.panel.toggle(self.catalog.symbols(), commands) {
            Ok(ToggleOutcome::Opened(_)) => self.render(),
            Ok(ToggleOutcome::Closed(id)) => debug!(session = %id, "Panel toggled closed"),
            Err(e) => logging::log_error("PANEL", &e.to_string(), Some("toggle")),
        }
    }

    fn handle_command(&mut self, session: SessionId, command: PanelCommand) {
        if !self.panel.is_current(session) {
            debug!(
                session = %session,
                command = command.as_str(),
                "Discarding command for closed session"
            );
            return;
        }

        match command {
            PanelCommand::Close | PanelCommand::DismissIfOutside => self.dismiss(),
            PanelCommand::OpenSettings => self.open_settings(),
            PanelCommand::Quit => self.quit(),
            PanelCommand::MoveUp | PanelCommand::MoveDown => {
                let symbols = self.catalog.symbols();
                if let Some(session) = self.panel.session_mut() {
                    if command == PanelCommand::MoveUp {
                        session.selection.move_up(symbols);
                    } else {
                        session.selection.move_down(symbols);
                    }
                }
                self.render();
            }
            PanelCommand::CommitSelected => {
                let symbol = self
                    .panel
                    .session()
                    .and_then(|s| s.selection.commit(self.catalog.symbols()));
                match symbol {
                    Some(symbol) => self.commit(symbol),
                    None => debug!("Commit with no selection ignored"),
                }
            }
            PanelCommand::CommitSlot(slot) => {
                let catalog = &self.catalog;
                let symbol = self.panel.session_mut().and_then(|session| {
                    session.selection.select_slot(catalog.symbols(), slot);
                    catalog.symbol_for_slot(slot).cloned()
                });
                match symbol {
                    Some(symbol) => self.commit(symbol),
                    None => debug!(slot, "No symbol in slot"),
                }
            }
        }
    }

    fn handle_click(&mut self, session: SessionId, point: Point) {
        if !self.panel.is_current(session) {
            debug!(session = %session, "Discarding click for closed session");
            return;
        }
        match self.panel.layout().hit_test(point) {
            Some(PanelHit::Symbol(index)) => {
                if let Some(symbol) = self.catalog.symbols().get(index).cloned() {
                    self.commit(symbol);
                }
            }
            Some(PanelHit::Footer(FooterAction::Settings)) => self.open_settings(),
            Some(PanelHit::Footer(FooterAction::Quit)) => self.quit(),
            None => {}
        }
    }

    /// Close, write the clipboard, then hand focus back.
    fn commit(&mut self, symbol: Symbol) {
        let session = self.panel.close();
        self.insertion.insert(&symbol);

        let Some(app) = session.and_then(|s| s.previous_app) else {
            return;
        };
        match self.panel.focus_registry().activate(&app) {
            Ok(()) => debug!(app = %app.name, "Restored focus"),
            Err(e) => warn!(app = %app.name, error = %e, "Could not restore focus"),
        }
    }

    /// Close without committing. Focus stays wherever the OS leaves it.
    fn dismiss(&mut self) {
        self.panel.close();
    }

    fn open_settings(&mut self) {
        self.panel.close();
        self.settings.open_settings().warn_on_err();
    }

    fn quit(&mut self) {
        let Some(mut on_quit) = self.on_quit.take() else {
            return;
        };
        info!(event_type = "app_lifecycle", action = "quit", "Quitting");
        self.panel.close();
        self.hotkeys.unregister();
        on_quit();
    }

    fn apply_config(&mut self, config: Config) {
        // Compare against what is registered so a previously declined combo is retried
        if self.hotkeys.current_combo() != Some(config.hotkey) {
            if let Err(e) = self.hotkeys.update_combo(config.hotkey) {
                warn!(
                    requested = %config.hotkey,
                    error = %e,
                    "New hotkey rejected, keeping the previous one"
                );
            }
        }

        if self.catalog.replace(config.symbols.clone()) {
            info!(symbols = self.catalog.len(), "Symbol list reloaded");
            let symbols = self.catalog.symbols();
            if let Some(session) = self.panel.session_mut() {
                session.selection.revalidate(symbols);
            }
            if self.panel.is_open() {
                self.panel.refit(self.catalog.len());
            }
        }

        if config.get_panel_width() != self.config.get_panel_width()
            || config.get_panel_height() != self.config.get_panel_height()
        {
            self.panel
                .set_size(config.get_panel_width(), config.get_panel_height());
        }

        self.config = config;
        self.render();
    }

    /// Push the current state to the panel surface.
    fn render(&mut self) {
        let hint = self
            .hotkeys
            .current_combo()
            .map(|c| c.display_string())
            .unwrap_or_default();
        let Some(session) = self.panel.session() else {
            return;
        };
        let model = PanelViewModel::build(
            self.catalog.symbols(),
            &session.selection,
            hint,
            self.panel.layout(),
        );
        self.panel.render(&model);
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn catalog(&self) -> &SymbolCatalog {
        &self.catalog
    }

    pub fn panel(&self) -> &PanelLifecycleController {
        &self.panel
    }

    pub fn hotkeys(&self) -> &HotkeyRegistrationService {
        &self.hotkeys
    }
}

#[cfg(test)]
#[path = "app_state_tests.rs"]
mod tests;
