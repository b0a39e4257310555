use crate::domain::models::{
    ControlSurface, EndpointAddress, MessageSeverity, Operator, SessionState, StatusMessage, Tab,
};
use crate::domain::settings::{ControlSettings, Settings, SettingsService};
use crate::domain::telemetry::TelemetrySample;
use crate::infrastructure::session::{DeviceSession, SessionHandle, SessionSnapshot, WsConnector};
use crate::presentation::joystick::Joystick;
use crate::presentation::pad::{PadDirection, PadState};
use eframe::egui;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PadStyle {
    #[default]
    Buttons,
    Stick,
}

pub struct WheelchairApp {
    // Services
    pub(crate) settings: Arc<Mutex<SettingsService>>,
    pub(crate) session: SessionHandle,

    // Session view, refreshed every frame
    pub(crate) snapshot: SessionSnapshot,
    pub(crate) telemetry: TelemetrySample,
    pub(crate) status_message: Option<StatusMessage>,

    // UI State
    pub(crate) selected_tab: Tab,
    pub(crate) name_input: String,
    pub(crate) host_input: String,
    pub(crate) port_input: String,
    /// Endpoint to save once the session reports `Connected`.
    pub(crate) pending_endpoint: Option<EndpointAddress>,

    // Remote controls
    pub(crate) pad_style: PadStyle,
    pub(crate) pad: PadState,
    pub(crate) drive_stick: Joystick,
    pub(crate) pad_stick: Joystick,
    pub(crate) light_on: bool,
    pub(crate) alarm_on: bool,
    pub(crate) mode_input: String,

    // UI Options
    pub(crate) is_dark_mode: bool,

    // Logging guard
    pub(crate) _logging_guard: Option<crate::infrastructure::logging::LoggingGuard>,
}

impl WheelchairApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        crate::presentation::theme::configure_neubrutalism(&cc.egui_ctx, false);

        let settings_service = SettingsService::new().unwrap_or_else(|e| {
            eprintln!("Settings unavailable, using defaults: {}", e);
            SettingsService::in_memory(Settings::default())
        });

        let logging_guard =
            crate::infrastructure::logging::init_logger(&settings_service.get().log_settings)
                .map_err(|e| eprintln!("Failed to initialize logging: {}", e))
                .ok();

        info!("Starting Wheelchair Remote");

        let controls = settings_service.get().controls.clone();
        let (session, actor) = DeviceSession::new(WsConnector::new(), controls);

        std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("Failed to create tokio runtime for the device session");
            rt.block_on(actor.run());
        });

        let (name_input, host_input, port_input) = match settings_service.last_endpoint() {
            Some(endpoint) => (
                endpoint.name.clone(),
                endpoint.host.clone(),
                endpoint.port.to_string(),
            ),
            None => (String::new(), String::new(), "8080".to_string()),
        };

        Self {
            settings: Arc::new(Mutex::new(settings_service)),
            snapshot: session.snapshot(),
            telemetry: session.telemetry().latest(),
            session,
            status_message: None,
            selected_tab: Tab::Home,
            name_input,
            host_input,
            port_input,
            pending_endpoint: None,
            pad_style: PadStyle::default(),
            pad: PadState::default(),
            drive_stick: Joystick::new(ControlSurface::Joystick, 90.0),
            pad_stick: Joystick::new(ControlSurface::Pad, 70.0),
            light_on: false,
            alarm_on: false,
            mode_input: String::new(),
            is_dark_mode: false,
            _logging_guard: logging_guard,
        }
    }

    pub(crate) fn controls(&self) -> ControlSettings {
        self.settings
            .lock()
            .map(|s| s.get().controls.clone())
            .unwrap_or_default()
    }

    pub(crate) fn set_status(&mut self, message: impl Into<String>, severity: MessageSeverity) {
        self.status_message = Some(StatusMessage {
            message: message.into(),
            severity,
        });
    }

    pub(crate) fn connect(&mut self, target: EndpointAddress) {
        let operator = match self.settings.lock() {
            Ok(settings) => {
                let s = settings.get();
                Operator::new(s.operator_role, s.access_token.clone())
            }
            Err(_) => Operator::default(),
        };

        match self.session.connect(target.clone(), operator) {
            Ok(()) => {
                self.set_status(format!("Connecting to {}...", target.name), MessageSeverity::Info);
                self.pending_endpoint = Some(target);
            }
            Err(e) => {
                self.pending_endpoint = None;
                self.set_status(e.to_string(), MessageSeverity::Error);
            }
        }
    }

    pub(crate) fn update_pad(&mut self, held: Option<PadDirection>) {
        for input in self.pad.update(held) {
            self.session.control(input);
        }
    }

    fn refresh_session(&mut self) {
        let snapshot = self.session.snapshot();
        self.telemetry = self.session.telemetry().latest();

        match session_change(&self.snapshot, &snapshot) {
            Some(SessionChange::Connected) => self.on_connected(),
            Some(SessionChange::Failed) => {
                self.pending_endpoint = None;
                self.pad.clear();
                if let Some(e) = &snapshot.last_error {
                    self.set_status(e.to_string(), MessageSeverity::Error);
                }
            }
            Some(SessionChange::Closed) => {
                self.pending_endpoint = None;
                self.pad.clear();
                self.set_status("Disconnected from device", MessageSeverity::Info);
            }
            None => {
                if snapshot.last_error != self.snapshot.last_error {
                    if let Some(e) = &snapshot.last_error {
                        self.set_status(e.to_string(), MessageSeverity::Warning);
                    }
                }
            }
        }

        self.snapshot = snapshot;
    }

    fn on_connected(&mut self) {
        let Some(target) = self.pending_endpoint.take() else {
            return;
        };
        self.set_status(format!("Connected to {}", target.name), MessageSeverity::Success);

        let Ok(port) = target.port.trim().parse::<u16>() else {
            return;
        };
        let Ok(mut settings) = self.settings.lock() else {
            return;
        };
        let saved = settings
            .remember_endpoint(&target.name, target.host.trim(), port)
            .and_then(|endpoint| settings.mark_connected(endpoint.id, now_millis()));
        if let Err(e) = saved {
            warn!("Could not save device endpoint: {}", e);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionChange {
    Connected,
    Failed,
    Closed,
}

/// What the UI has to react to between two polled snapshots. A new link
/// generation counts as a change even when the state reads the same, since
/// a whole connect can complete between two frames.
fn session_change(previous: &SessionSnapshot, current: &SessionSnapshot) -> Option<SessionChange> {
    let new_link = current.generation != previous.generation;
    if current.state == previous.state && !new_link {
        return None;
    }
    match current.state {
        SessionState::Connected => Some(SessionChange::Connected),
        SessionState::Disconnected(_) => Some(SessionChange::Failed),
        SessionState::Idle if previous.state.is_active() || new_link => {
            Some(SessionChange::Closed)
        }
        _ => None,
    }
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

impl Drop for WheelchairApp {
    fn drop(&mut self) {
        if let Err(e) = self.session.shutdown() {
            error!("Session shutdown failed: {}", e);
        }
    }
}

impl eframe::App for WheelchairApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.refresh_session();

        // Session and telemetry updates arrive off the UI thread.
        ctx.request_repaint_after(Duration::from_millis(50));

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.selectable_value(&mut self.selected_tab, Tab::Home, "Home");
                ui.selectable_value(&mut self.selected_tab, Tab::Remote, "Remote");
                ui.selectable_value(&mut self.selected_tab, Tab::Settings, "Settings");

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let switch_icon = if self.is_dark_mode {
                        "☀ Light"
                    } else {
                        "🌙 Dark"
                    };
                    if ui.button(switch_icon).clicked() {
                        self.is_dark_mode = !self.is_dark_mode;
                        crate::presentation::theme::configure_neubrutalism(ctx, self.is_dark_mode);
                    }
                    ui.label(self.snapshot.state.label());
                });
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.vertical_centered(|ui| {
                    ui.set_max_width(800.0);
                    ui.add_space(20.0);

                    use crate::presentation::tabs;
                    match self.selected_tab {
                        Tab::Home => tabs::home::render(self, ui),
                        Tab::Remote => tabs::remote::render(self, ui),
                        Tab::Settings => tabs::settings::render(self, ui),
                    }

                    ui.add_space(50.0);
                });
            });
        });
    }
}
