use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::error;

use kiwa::config::{self, Config};
use kiwa::logging;

/// Paired punctuation and symbols from the menu bar
#[derive(Parser, Debug)]
#[command(name = "kiwa")]
#[command(version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
struct Args {
    /// Path to config file (default: ~/.kiwa/config.json)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the default configuration as JSON and exit
    #[arg(long)]
    print_default_config: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_default_config {
        println!("{}", Config::default().to_pretty_json());
        return Ok(());
    }

    // Kept alive until main returns so the file writer flushes
    let _logging_guard = logging::init();

    let config_path = args.config.unwrap_or_else(config::config_path);
    let loaded = config::load_config(Some(&config_path));

    run(loaded, config_path)
}

#[cfg(not(target_os = "macos"))]
fn run(_config: Config, _config_path: PathBuf) -> Result<()> {
    error!(os = std::env::consts::OS, "Kiwa only runs on macOS");
    anyhow::bail!("unsupported platform: {}", std::env::consts::OS)
}

#[cfg(target_os = "macos")]
fn run(config: Config, config_path: PathBuf) -> Result<()> {
    use std::sync::Arc;

    use kiwa::app_state::AppEvent;
    use kiwa::dispatch::ui_channel;
    use kiwa::platform;

    platform::configure_as_accessory_app();
    if !platform::accessibility_trusted() {
        tracing::warn!(
            "Accessibility permission not granted; keys typed while another app is focused will not reach the panel"
        );
    }

    let (events, queue) = ui_channel::<AppEvent>(Arc::new(|| {
        platform::dispatch_to_main(ui::drain_ui_queue)
    }));

    // The tray and hotkey manager need the run loop, so build everything on
    // its first turn
    platform::dispatch_to_main(move || match ui::start(config, config_path, events, queue) {
        Ok(()) => tracing::info!(event_type = "app_lifecycle", action = "ready", "Kiwa ready"),
        Err(e) => {
            error!(error = %e, "Startup failed");
            platform::stop_application();
        }
    });

    platform::run_application();

    ui::shutdown();
    tracing::info!(event_type = "app_lifecycle", action = "exit", "Kiwa exiting");
    Ok(())
}

#[cfg(target_os = "macos")]
mod ui {
    use std::cell::RefCell;
    use std::path::PathBuf;
    use std::sync::Arc;

    use anyhow::{Context, Result};
    use tracing::{info, warn};

    use kiwa::app_state::{AppEvent, AppServices, AppState};
    use kiwa::config::Config;
    use kiwa::dispatch::{UiQueue, UiSender};
    use kiwa::hotkeys::{self, GlobalHotkeyBackend};
    use kiwa::insertion::ArboardClipboard;
    use kiwa::panel::{PanelDeps, StatusIndicator};
    use kiwa::platform::{self, MacFocusRegistry, MacInputHook, MacPanel, MacScreen};
    use kiwa::settings::ConfigFileSettings;
    use kiwa::tray::TrayManager;
    use kiwa::watcher::{self, ConfigWatcher};

    /// State owned by the main thread for the lifetime of the run loop
    struct UiContext {
        queue: UiQueue<AppEvent>,
        app: AppState,
        _watcher: Option<ConfigWatcher>,
    }

    thread_local! {
        static UI: RefCell<Option<UiContext>> = const { RefCell::new(None) };
    }

    /// Stand-in when the status item cannot be created
    struct NoStatusItem;

    impl StatusIndicator for NoStatusItem {
        fn set_active(&mut self, _active: bool) {}
    }

    pub(super) fn drain_ui_queue() {
        UI.with(|cell| {
            // Already draining further up the stack; that loop picks the event up
            let Ok(mut slot) = cell.try_borrow_mut() else {
                return;
            };
            if let Some(UiContext { queue, app, .. }) = slot.as_mut() {
                queue.drain(|event| app.handle(event));
            }
        });
    }

    pub(super) fn start(
        config: Config,
        config_path: PathBuf,
        events: UiSender<AppEvent>,
        queue: UiQueue<AppEvent>,
    ) -> Result<()> {
        let hotkey_backend = GlobalHotkeyBackend::new().context("Failed to create hotkey manager")?;

        let click_events = events.clone();
        let surface = MacPanel::new(move |session, point| {
            click_events.post(AppEvent::PanelClicked { session, point });
        })
        .context("Failed to create panel window")?;

        let indicator: Box<dyn StatusIndicator> = match TrayManager::new(events.clone()) {
            Ok(tray) => Box::new(tray),
            Err(e) => {
                warn!(error = %e, "Status item unavailable, hotkey is the only way to open the panel");
                Box::new(NoStatusItem)
            }
        };

        let services = AppServices {
            hotkeys: Box::new(hotkey_backend),
            panel: PanelDeps {
                surface: Box::new(surface),
                screen: Box::new(MacScreen),
                indicator,
                input: Box::new(MacInputHook::new()),
                focus: Arc::new(MacFocusRegistry),
            },
            clipboard: Box::new(ArboardClipboard::new()),
            settings: Box::new(ConfigFileSettings::new(config_path.clone())),
            on_quit: Box::new(platform::stop_application),
        };

        let mut app = AppState::new(config, services, events.clone());
        if let Err(e) = app.start() {
            warn!(error = %e, "Hotkey not registered, the status item still opens the panel");
        }

        let hotkey_events = events.clone();
        hotkeys::start_hotkey_listener(move |id| {
            hotkey_events.post(AppEvent::HotkeyFired(id));
        })
        .context("Failed to spawn hotkey listener")?;

        let watcher = start_config_watcher(config_path, events);

        UI.with(|cell| {
            *cell.borrow_mut() = Some(UiContext {
                queue,
                app,
                _watcher: watcher,
            });
        });

        // Anything posted while wiring up
        drain_ui_queue();
        Ok(())
    }

    /// Reload on file changes and hand the parsed config to the UI context.
    fn start_config_watcher(config_path: PathBuf, events: UiSender<AppEvent>) -> Option<ConfigWatcher> {
        let (mut config_watcher, reloads) = ConfigWatcher::new(config_path.clone());
        if let Err(e) = config_watcher.start() {
            warn!(error = %e, path = %config_path.display(), "Config watcher not started, edits need a restart");
            return None;
        }

        let bridge = watcher::spawn_reload_bridge(config_path, reloads, move |config| {
            events.post(AppEvent::ConfigReloaded(Box::new(config)))
        });
        if let Err(e) = bridge {
            warn!(error = %e, "Failed to spawn config reload thread");
            return None;
        }

        info!(event_type = "config", action = "watching", "Watching config for changes");
        Some(config_watcher)
    }

    /// Tear down panel, monitors and hotkey before the process exits.
    pub(super) fn shutdown() {
        UI.with(|cell| {
            if let Ok(mut slot) = cell.try_borrow_mut() {
                slot.take();
            }
        });
    }
}
