use crate::controller::{ButtonSet, LogicalButton};
use crate::mapping::{KeyAction, KeyMap, MappingError, PresetAction};
use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const CONFIG_ENV: &str = "PADBRIDGE_CONFIG";
const CONFIG_DIR: &str = "padbridge";
const CONFIG_FILE: &str = "config.toml";

/// USB identity and polling behaviour of the gamepad transport
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct DeviceConfig {
    pub vendor_id: u16,
    pub product_id: u16,
    /// Upper bound for one blocking read; also how quickly shutdown is noticed
    pub read_timeout_ms: i32,
    pub reconnect_interval_ms: u64,
    pub report_buffer_size: usize,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            vendor_id: 0x057E,
            product_id: 0x2009,
            read_timeout_ms: 50,
            reconnect_interval_ms: 1000,
            report_buffer_size: 64,
        }
    }
}

/// One `[mapping]` entry, either a preset by name or a raw key action
///
/// ```toml
/// [mapping]
/// ZL = { preset = "Escape" }
/// B = { key_code = 48, label = "Tab" }
/// ```
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(untagged)]
pub enum MappingEntry {
    Preset { preset: String },
    Action(KeyAction),
}

impl MappingEntry {
    fn resolve(&self, button: LogicalButton) -> Result<KeyAction, MappingError> {
        match self {
            MappingEntry::Preset { preset } => Ok(preset.parse::<PresetAction>()?.key_action()),
            MappingEntry::Action(action) => {
                let unknown = action.modifiers.unknown_bits();
                if unknown != 0 {
                    return Err(MappingError::InvalidMapping {
                        button: button.to_string(),
                        reason: format!("unsupported modifier bits {unknown:#x}"),
                    });
                }
                Ok(action.clone())
            }
        }
    }
}

impl From<&KeyAction> for MappingEntry {
    fn from(action: &KeyAction) -> Self {
        let preset = PresetAction::ALL
            .into_iter()
            .find(|preset| &preset.key_action() == action);
        match preset {
            Some(preset) => MappingEntry::Preset {
                preset: format!("{preset:?}"),
            },
            None => MappingEntry::Action(action.clone()),
        }
    }
}

/// Contents of `config.toml`
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    pub device: DeviceConfig,
    /// Keyed by button display name; buttons left out keep their default
    pub mapping: BTreeMap<String, MappingEntry>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::with_key_map(DeviceConfig::default(), &KeyMap::defaults())
    }
}

impl AppConfig {
    pub fn with_key_map(device: DeviceConfig, map: &KeyMap) -> Self {
        let mapping = map
            .iter()
            .map(|(button, action)| (button.name().to_string(), MappingEntry::from(action)))
            .collect();
        Self { device, mapping }
    }

    /// Builds the mapping table, rejecting unknown buttons, presets and modifier bits
    ///
    /// Names match case-insensitively, so `ZL` and `zl` in one file conflict.
    pub fn key_map(&self) -> Result<KeyMap, MappingError> {
        let mut map = KeyMap::defaults();
        let mut seen = ButtonSet::empty();
        for (name, entry) in &self.mapping {
            let button: LogicalButton = name.parse()?;
            if seen.contains(button) {
                return Err(MappingError::InvalidMapping {
                    button: button.to_string(),
                    reason: format!("listed more than once (as \"{name}\")"),
                });
            }
            seen.insert(button);
            map.set(button, entry.resolve(button)?);
        }
        Ok(map)
    }

    /// `$PADBRIDGE_CONFIG`, or `<config dir>/padbridge/config.toml`
    pub fn path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Ok(PathBuf::from(path));
        }
        let mut path =
            dirs::config_dir().ok_or_else(|| eyre!("No configuration directory on this platform"))?;
        path.push(CONFIG_DIR);
        path.push(CONFIG_FILE);
        Ok(path)
    }

    /// Reads and parses `path`; mapping entries are checked by [`Self::key_map`]
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;
        let config: AppConfig = toml::from_str(&content)
            .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Loads `path`, writing the defaults there first if it does not exist
    pub async fn load_or_create(path: &Path) -> Result<Self> {
        if tokio::fs::try_exists(path)
            .await
            .map_err(|e| eyre!("Failed to check if config file exists: {}", e))?
        {
            return Self::load(path).await;
        }

        info!("No config at {}, creating default", path.display());
        let config = AppConfig::default();
        config.save(path).await?;
        Ok(config)
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| eyre!("Failed to create config directory: {}", e))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| eyre!("Failed to serialize config: {}", e))?;
        tokio::fs::write(path, content)
            .await
            .map_err(|e| eyre!("Failed to write config file: {}", e))?;

        info!("Config saved to {}", path.display());
        Ok(())
    }
}
