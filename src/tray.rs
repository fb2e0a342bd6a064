//! Status bar item for Kiwa
//!
//! Left click toggles the panel; right click opens a menu with Settings and
//! Quit. The icon is rendered from SVG as a template image so it adapts to
//! light/dark menu bars, and switches to a filled variant while the panel is
//! open.

use anyhow::{Context, Result};
use tray_icon::{
    menu::{IconMenuItem, Menu, MenuEvent, NativeIcon, PredefinedMenuItem},
    Icon, MouseButton, MouseButtonState, TrayIcon, TrayIconBuilder, TrayIconEvent,
};
use tracing::{debug, warn};

use crate::app_state::AppEvent;
use crate::dispatch::UiSender;
use crate::panel::StatusIndicator;

/// Corner brackets, 32x32, monochrome
const IDLE_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="32" height="32" viewBox="0 0 32 32">
  <path d="M14 6H8v14" fill="none" stroke="black" stroke-width="3" stroke-linecap="round" stroke-linejoin="round"/>
  <path d="M18 26h6V12" fill="none" stroke="black" stroke-width="3" stroke-linecap="round" stroke-linejoin="round"/>
</svg>"#;

/// Corner brackets on a filled tile, shown while the panel is open
const ACTIVE_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="32" height="32" viewBox="0 0 32 32">
  <rect x="1" y="1" width="30" height="30" rx="7" fill="black" fill-opacity="0.35"/>
  <path d="M14 6H8v14" fill="none" stroke="black" stroke-width="3" stroke-linecap="round" stroke-linejoin="round"/>
  <path d="M18 26h6V12" fill="none" stroke="black" stroke-width="3" stroke-linecap="round" stroke-linejoin="round"/>
</svg>"#;

/// Menu item identifiers for matching events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayMenuAction {
    Settings,
    Quit,
}

#[derive(Debug, Clone)]
struct MenuIds {
    settings: String,
    quit: String,
}

impl MenuIds {
    fn action_for(&self, id: &str) -> Option<TrayMenuAction> {
        if id == self.settings {
            Some(TrayMenuAction::Settings)
        } else if id == self.quit {
            Some(TrayMenuAction::Quit)
        } else {
            None
        }
    }
}

/// RGBA pixels for one icon variant
struct RenderedIcon {
    rgba: Vec<u8>,
    width: u32,
    height: u32,
}

impl RenderedIcon {
    fn to_icon(&self) -> Result<Icon> {
        Icon::from_rgba(self.rgba.clone(), self.width, self.height)
            .context("Failed to create icon from RGBA data")
    }
}

/// Owns the status item. Implements [`StatusIndicator`] for the panel.
pub struct TrayManager {
    tray_icon: TrayIcon,
    idle: RenderedIcon,
    active: RenderedIcon,
    showing_active: bool,
}

impl TrayManager {
    /// Creates the status item and routes its events onto `events`.
    ///
    /// Must run on the main thread with the run loop already started.
    ///
    /// # Errors
    /// Returns an error if SVG parsing, PNG rendering, or tray icon creation fails
    pub fn new(events: UiSender<AppEvent>) -> Result<Self> {
        let idle = Self::render_svg(IDLE_SVG)?;
        let active = Self::render_svg(ACTIVE_SVG)?;
        let (menu, ids) = Self::create_menu()?;

        let tray_icon = TrayIconBuilder::new()
            .with_icon(idle.to_icon()?)
            .with_tooltip("Kiwa")
            .with_menu(Box::new(menu))
            .with_menu_on_left_click(false)
            .with_icon_as_template(true) // macOS: adapt to light/dark menu bar
            .build()
            .context("Failed to create tray icon")?;

        Self::install_event_handlers(events, ids);

        Ok(Self {
            tray_icon,
            idle,
            active,
            showing_active: false,
        })
    }

    /// Converts an embedded SVG to RGBA pixels
    fn render_svg(svg: &str) -> Result<RenderedIcon> {
        let opts = usvg::Options::default();
        let tree = usvg::Tree::from_str(svg, &opts).context("Failed to parse SVG")?;

        let size = tree.size();
        let width = size.width() as u32;
        let height = size.height() as u32;

        let mut pixmap =
            tiny_skia::Pixmap::new(width, height).context("Failed to create pixmap")?;

        // Template images only use the alpha channel
        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

        Ok(RenderedIcon {
            rgba: pixmap.take(),
            width,
            height,
        })
    }

    /// Menu structure:
    /// 1. Settings…
    /// 2. ---
    /// 3. Quit Kiwa
    fn create_menu() -> Result<(Menu, MenuIds)> {
        let menu = Menu::new();

        let settings_item = IconMenuItem::with_native_icon(
            "Settings…",
            true,
            Some(NativeIcon::PreferencesGeneral),
            None,
        );
        let quit_item =
            IconMenuItem::with_native_icon("Quit Kiwa", true, Some(NativeIcon::Remove), None);

        let ids = MenuIds {
            settings: settings_item.id().0.clone(),
            quit: quit_item.id().0.clone(),
        };

        menu.append(&settings_item)
            .context("Failed to add Settings item")?;
        menu.append(&PredefinedMenuItem::separator())
            .context("Failed to add separator")?;
        menu.append(&quit_item).context("Failed to add Quit item")?;

        Ok((menu, ids))
    }

    fn install_event_handlers(events: UiSender<AppEvent>, ids: MenuIds) {
        let menu_events = events.clone();
        MenuEvent::set_event_handler(Some(move |event: MenuEvent| {
            match ids.action_for(&event.id.0) {
                Some(TrayMenuAction::Settings) => {
                    menu_events.post(AppEvent::OpenSettings);
                }
                Some(TrayMenuAction::Quit) => {
                    menu_events.post(AppEvent::Quit);
                }
                None => debug!(id = %event.id.0, "Unknown menu event"),
            }
        }));

        TrayIconEvent::set_event_handler(Some(move |event: TrayIconEvent| {
            // Toggle on press: while the panel is open the press is consumed by the
            // outside-click interceptor and only the matching release would arrive here
            if let TrayIconEvent::Click {
                button: MouseButton::Left,
                button_state: MouseButtonState::Down,
                ..
            } = event
            {
                events.post(AppEvent::TogglePanel);
            }
        }));
    }
}

impl StatusIndicator for TrayManager {
    fn set_active(&mut self, active: bool) {
        if self.showing_active == active {
            return;
        }
        let variant = if active { &self.active } else { &self.idle };
        let icon = match variant.to_icon() {
            Ok(icon) => icon,
            Err(e) => {
                warn!(error = %e, "Could not build status icon");
                return;
            }
        };
        if let Err(e) = self.tray_icon.set_icon(Some(icon)) {
            warn!(error = %e, "Could not update status icon");
            return;
        }
        self.tray_icon.set_icon_as_template(true);
        self.showing_active = active;
    }
}
