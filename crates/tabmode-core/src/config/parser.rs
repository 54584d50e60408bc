// Tabmode Config Parser - TOML with Serde
// Parses the optional daemon configuration file

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::Deserialize;

use crate::input::{
    Classifier, DeviceMatch, BUS_BLUETOOTH, BUS_HOST, BUS_I2C, BUS_I8042, BUS_USB, BUS_VIRTUAL,
    DEFAULT_RELAY_KEYS,
};
use crate::output::DEFAULT_DEVICE_NAME;

/// Configuration parser errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Invalid bus type: {0}")]
    InvalidBus(String),

    #[error("relay.match entry {0} has no fields set")]
    EmptyMatch(usize),

    #[error("Virtual device name must not be empty")]
    EmptyDeviceName,
}

/// Root TOML table
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigToml {
    #[serde(default)]
    pub device: Option<DeviceConfig>,

    #[serde(default)]
    pub relay: Option<RelayConfig>,
}

/// Virtual device settings
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceConfig {
    pub name: Option<String>,
}

/// Volume-key relay settings
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelayConfig {
    /// Key names or numeric codes to relay
    pub keys: Option<Vec<KeyToml>>,

    /// Allow-list of relay devices; an explicit empty list disables relay
    #[serde(rename = "match")]
    pub matches: Option<Vec<MatchToml>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum KeyToml {
    Name(String),
    Code(u16),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum BusToml {
    Name(String),
    Code(u16),
}

/// One allow-list entry as written in TOML
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatchToml {
    pub name: Option<String>,
    pub path: Option<String>,
    pub bus: Option<BusToml>,
    pub vendor: Option<u16>,
    pub product: Option<u16>,
    pub version: Option<u16>,
}

/// Resolved configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Name of the virtual device
    pub device_name: String,
    /// Key codes relayed through the virtual device
    pub relay_keys: Vec<u16>,
    /// Relay device allow-list
    pub relay_matches: Vec<DeviceMatch>,
    /// File this configuration was read from
    pub source: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device_name: DEFAULT_DEVICE_NAME.to_string(),
            relay_keys: DEFAULT_RELAY_KEYS.to_vec(),
            relay_matches: vec![DeviceMatch::internal_keyboard()],
            source: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file path
    pub fn from_toml_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(&path)?;
        let mut config = Self::from_toml(&content)?;
        config.source = Some(path.as_ref().to_path_buf());
        Ok(config)
    }

    /// Load configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let parsed: ConfigToml =
            toml::from_str(content).map_err(|e| ConfigError::TomlParse(e.to_string()))?;

        let mut config = Self::default();

        if let Some(device) = parsed.device {
            if let Some(name) = device.name {
                if name.trim().is_empty() {
                    return Err(ConfigError::EmptyDeviceName);
                }
                config.device_name = name;
            }
        }

        if let Some(relay) = parsed.relay {
            if let Some(keys) = relay.keys {
                config.relay_keys.clear();
                for key in &keys {
                    let code = parse_key(key)?;
                    if !config.relay_keys.contains(&code) {
                        config.relay_keys.push(code);
                    }
                }
            }
            if let Some(matches) = relay.matches {
                config.relay_matches = matches
                    .iter()
                    .enumerate()
                    .map(|(i, m)| parse_match(i, m))
                    .collect::<Result<_, _>>()?;
            }
        }

        Ok(config)
    }

    /// Candidate locations, in lookup order
    pub fn default_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("tabmode").join("config.toml"));
        }
        paths.push(PathBuf::from("/etc/tabmode/config.toml"));
        paths
    }

    /// Load an explicit file, else the first existing default path, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_toml_path(path);
        }
        for path in Self::default_paths() {
            if path.exists() {
                return Self::from_toml_path(path);
            }
            debug!("No configuration at {}", path.display());
        }
        Ok(Self::default())
    }

    /// Classifier for the device monitor
    pub fn classifier(&self) -> Classifier {
        Classifier::new(
            self.relay_matches.clone(),
            self.relay_keys.clone(),
            &self.device_name,
        )
    }
}

/// Parse a key given by name ("VOLUMEDOWN", "KEY_VOLUMEDOWN") or code
fn parse_key(key: &KeyToml) -> Result<u16, ConfigError> {
    match key {
        KeyToml::Code(code) => Ok(*code),
        KeyToml::Name(name) => {
            let upper = name.trim().to_uppercase();
            let bare = upper.strip_prefix("KEY_").unwrap_or(upper.as_str());
            let code = match bare {
                "MUTE" => 113,
                "VOLUMEDOWN" => 114,
                "VOLUMEUP" => 115,
                "POWER" => 116,
                "NEXTSONG" => 163,
                "PLAYPAUSE" => 164,
                "PREVIOUSSONG" => 165,
                "BRIGHTNESSDOWN" => 224,
                "BRIGHTNESSUP" => 225,
                _ => bare
                    .parse::<u16>()
                    .map_err(|_| ConfigError::InvalidKey(name.clone()))?,
            };
            Ok(code)
        }
    }
}

fn parse_bus(bus: &BusToml) -> Result<u16, ConfigError> {
    match bus {
        BusToml::Code(code) => Ok(*code),
        BusToml::Name(name) => match name.to_lowercase().trim_start_matches("bus_") {
            "usb" => Ok(BUS_USB),
            "bluetooth" => Ok(BUS_BLUETOOTH),
            "virtual" => Ok(BUS_VIRTUAL),
            "i8042" => Ok(BUS_I8042),
            "i2c" => Ok(BUS_I2C),
            "host" => Ok(BUS_HOST),
            _ => Err(ConfigError::InvalidBus(name.clone())),
        },
    }
}

fn parse_match(index: usize, entry: &MatchToml) -> Result<DeviceMatch, ConfigError> {
    let device_match = DeviceMatch {
        name: entry.name.clone(),
        path: entry.path.clone(),
        bus: entry.bus.as_ref().map(parse_bus).transpose()?,
        vendor: entry.vendor,
        product: entry.product,
        version: entry.version,
    };
    if device_match.is_empty() {
        return Err(ConfigError::EmptyMatch(index));
    }
    Ok(device_match)
}
