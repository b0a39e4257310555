use crate::domain::dispatcher::ReversalPolicy;
use crate::domain::models::{ControlSurface, DeviceEndpoint, OperatorRole};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSettings {
    #[serde(default = "default_level")]
    pub level: String, // "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_true")]
    pub file_logging_enabled: bool,
    #[serde(default = "default_true")]
    pub console_logging_enabled: bool,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    #[serde(default = "default_prefix")]
    pub file_name_prefix: String,
    #[serde(default = "default_true")]
    pub show_file_line: bool,
    #[serde(default = "default_false")]
    pub show_thread_ids: bool,
    #[serde(default = "default_true")]
    pub show_target: bool,
    #[serde(default = "default_true")]
    pub ansi_colors: bool,
    #[serde(default = "default_rotation")]
    pub rotation: String, // "daily", "hourly", "minutely", "never"
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            file_logging_enabled: default_true(),
            console_logging_enabled: default_true(),
            log_dir: default_log_dir(),
            file_name_prefix: default_prefix(),
            show_file_line: default_true(),
            show_thread_ids: default_false(),
            show_target: default_true(),
            ansi_colors: default_true(),
            rotation: default_rotation(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_log_dir() -> String {
    "logs".to_string()
}
fn default_prefix() -> String {
    "wheelchair_remote".to_string()
}
fn default_rotation() -> String {
    "daily".to_string()
}

/// Joystick tuning shared by the dispatcher and the settings tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlSettings {
    /// Neutral band half-width for the main drive joystick.
    #[serde(default = "default_joystick_threshold")]
    pub joystick_threshold: f64,
    /// Neutral band half-width for the joystick that replaces the pad. It is
    /// smaller and travels less, hence the narrower band.
    #[serde(default = "default_pad_threshold")]
    pub pad_threshold: f64,
    #[serde(default)]
    pub reversal_policy: ReversalPolicy,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            joystick_threshold: default_joystick_threshold(),
            pad_threshold: default_pad_threshold(),
            reversal_policy: ReversalPolicy::default(),
        }
    }
}

impl ControlSettings {
    pub const MIN_THRESHOLD: f64 = 0.05;
    pub const MAX_THRESHOLD: f64 = 0.95;

    pub fn threshold_for(&self, surface: ControlSurface) -> f64 {
        let raw = match surface {
            ControlSurface::Joystick => self.joystick_threshold,
            ControlSurface::Pad => self.pad_threshold,
        };
        if raw.is_finite() {
            raw.clamp(Self::MIN_THRESHOLD, Self::MAX_THRESHOLD)
        } else {
            Self::MAX_THRESHOLD
        }
    }
}

fn default_joystick_threshold() -> f64 {
    0.4
}
fn default_pad_threshold() -> f64 {
    0.3
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub operator_role: OperatorRole,

    /// Never written to disk.
    #[serde(skip)]
    pub access_token: Option<String>,

    #[serde(default)]
    pub controls: ControlSettings,

    // Saved endpoints
    #[serde(default)]
    pub endpoints: Vec<DeviceEndpoint>,
    #[serde(default)]
    pub last_endpoint_id: Option<u64>,

    // Logging Settings
    #[serde(default)]
    pub log_settings: LogSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            operator_role: OperatorRole::default(),
            access_token: None,
            controls: ControlSettings::default(),
            endpoints: Vec::new(),
            last_endpoint_id: None,
            log_settings: LogSettings::default(),
        }
    }
}

pub struct SettingsService {
    settings: Settings,
    /// `None` keeps everything in memory.
    settings_path: Option<PathBuf>,
}

impl SettingsService {
    pub fn new() -> anyhow::Result<Self> {
        let settings_path = Self::get_settings_path()?;
        let settings = match Self::load_from_file(&settings_path) {
            Ok(settings) => settings,
            Err(e) => {
                if settings_path.exists() {
                    warn!("Ignoring unreadable settings file: {}", e);
                }
                Settings::default()
            }
        };

        Ok(Self {
            settings,
            settings_path: Some(settings_path),
        })
    }

    pub fn in_memory(settings: Settings) -> Self {
        Self {
            settings,
            settings_path: None,
        }
    }

    fn get_settings_path() -> anyhow::Result<PathBuf> {
        let mut path = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        path.push("WheelchairRemote");
        fs::create_dir_all(&path)?;
        path.push("settings.json");
        Ok(path)
    }

    fn load_from_file(path: &PathBuf) -> anyhow::Result<Settings> {
        let contents = fs::read_to_string(path)?;
        let settings = serde_json::from_str(&contents)?;
        Ok(settings)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let Some(path) = &self.settings_path else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(&self.settings)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn get(&self) -> &Settings {
        &self.settings
    }

    pub fn get_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn endpoints(&self) -> &[DeviceEndpoint] {
        &self.settings.endpoints
    }

    pub fn last_endpoint(&self) -> Option<&DeviceEndpoint> {
        let id = self.settings.last_endpoint_id?;
        self.settings.endpoints.iter().find(|e| e.id == id)
    }

    /// Store an endpoint, reusing the entry that already has this host and
    /// port. The display name is refreshed either way.
    pub fn remember_endpoint(
        &mut self,
        name: &str,
        host: &str,
        port: u16,
    ) -> anyhow::Result<DeviceEndpoint> {
        let endpoints = &mut self.settings.endpoints;
        let endpoint = match endpoints
            .iter_mut()
            .find(|e| e.host == host && e.port == port)
        {
            Some(existing) => {
                existing.name = name.to_string();
                existing.clone()
            }
            None => {
                let id = endpoints.iter().map(|e| e.id).max().map_or(1, |m| m + 1);
                let endpoint = DeviceEndpoint {
                    id,
                    name: name.to_string(),
                    host: host.to_string(),
                    port,
                    last_connected_at: None,
                };
                info!("Saving new device endpoint {} ({}:{})", name, host, port);
                endpoints.push(endpoint.clone());
                endpoint
            }
        };
        self.save()?;
        Ok(endpoint)
    }

    pub fn mark_connected(&mut self, id: u64, at_millis: i64) -> anyhow::Result<()> {
        let endpoint = self
            .settings
            .endpoints
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| anyhow::anyhow!("Unknown endpoint id {}", id))?;
        endpoint.last_connected_at = Some(at_millis);
        self.settings.last_endpoint_id = Some(id);
        self.save()
    }

    /// Returns whether an endpoint was removed.
    pub fn remove_endpoint(&mut self, id: u64) -> anyhow::Result<bool> {
        let before = self.settings.endpoints.len();
        self.settings.endpoints.retain(|e| e.id != id);
        let removed = self.settings.endpoints.len() != before;
        if removed {
            if self.settings.last_endpoint_id == Some(id) {
                self.settings.last_endpoint_id = None;
            }
            self.save()?;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> SettingsService {
        SettingsService::in_memory(Settings::default())
    }

    #[test]
    fn test_defaults_from_empty_document() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.controls, ControlSettings::default());
        assert_eq!(settings.controls.joystick_threshold, 0.4);
        assert_eq!(settings.controls.pad_threshold, 0.3);
        assert_eq!(settings.operator_role, OperatorRole::Controlling);
        assert_eq!(settings.log_settings.file_name_prefix, "wheelchair_remote");
        assert!(settings.endpoints.is_empty());
    }

    #[test]
    fn test_access_token_is_not_serialized() {
        let mut settings = Settings::default();
        settings.access_token = Some("do-not-persist".into());
        settings.operator_role = OperatorRole::Controlled;

        let json = serde_json::to_string(&settings).unwrap();
        assert!(!json.contains("do-not-persist"));
        assert!(json.contains("\"controlled\""));

        let back: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.access_token, None);
    }

    #[test]
    fn test_reversal_policy_names() {
        let controls: ControlSettings =
            serde_json::from_str(r#"{"reversal_policy":"stop_then_restart"}"#).unwrap();
        assert_eq!(controls.reversal_policy, ReversalPolicy::StopThenRestart);
        assert_eq!(
            ControlSettings::default().reversal_policy,
            ReversalPolicy::ContinueMotion
        );
        assert_eq!(controls.joystick_threshold, 0.4);
    }

    #[test]
    fn test_threshold_is_kept_in_range() {
        let controls = ControlSettings {
            joystick_threshold: 3.0,
            pad_threshold: -1.0,
            ..ControlSettings::default()
        };
        assert_eq!(
            controls.threshold_for(ControlSurface::Joystick),
            ControlSettings::MAX_THRESHOLD
        );
        assert_eq!(
            controls.threshold_for(ControlSurface::Pad),
            ControlSettings::MIN_THRESHOLD
        );
    }

    #[test]
    fn test_remember_endpoint_assigns_ids_and_dedupes() {
        let mut svc = service();
        let desk = svc.remember_endpoint("Desk", "192.168.1.5", 8080).unwrap();
        let hall = svc.remember_endpoint("Hall", "192.168.1.6", 8080).unwrap();
        assert_eq!(desk.id, 1);
        assert_eq!(hall.id, 2);

        let renamed = svc.remember_endpoint("Office", "192.168.1.5", 8080).unwrap();
        assert_eq!(renamed.id, 1);
        assert_eq!(svc.endpoints().len(), 2);
        assert_eq!(svc.endpoints()[0].name, "Office");
    }

    #[test]
    fn test_mark_connected_and_remove() {
        let mut svc = service();
        let desk = svc.remember_endpoint("Desk", "192.168.1.5", 8080).unwrap();

        svc.mark_connected(desk.id, 1_700_000_000_000).unwrap();
        let last = svc.last_endpoint().unwrap();
        assert_eq!(last.last_connected_at, Some(1_700_000_000_000));

        assert!(svc.mark_connected(99, 0).is_err());

        assert!(svc.remove_endpoint(desk.id).unwrap());
        assert!(!svc.remove_endpoint(desk.id).unwrap());
        assert!(svc.last_endpoint().is_none());
    }
}
