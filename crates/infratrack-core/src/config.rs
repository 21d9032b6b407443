use crate::error::{InfraTrackError, Result};
use crate::geo::{Hemisphere, UtmZone};
use crate::models::NetworkContext;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Layered configuration for InfraTrack
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub utm_zone: ConfigValue<u8>,
    pub utm_hemisphere: ConfigValue<Hemisphere>,
    pub coincidence_tolerance_m: ConfigValue<f64>,
    pub degenerate_tolerance_m: ConfigValue<f64>,
    pub max_segment_length_m: ConfigValue<f64>,
    pub network: ConfigValue<NetworkContext>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            utm_zone: ConfigValue::new(37, ConfigSource::Default),
            utm_hemisphere: ConfigValue::new(Hemisphere::North, ConfigSource::Default),
            coincidence_tolerance_m: ConfigValue::new(1.0, ConfigSource::Default),
            degenerate_tolerance_m: ConfigValue::new(0.1, ConfigSource::Default),
            max_segment_length_m: ConfigValue::new(2000.0, ConfigSource::Default),
            network: ConfigValue::new(NetworkContext::Mixed, ConfigSource::Default),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| InfraTrackError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| InfraTrackError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(zone) = file_config.utm_zone {
            self.utm_zone.update(parse_utm_zone(&zone.to_string())?, ConfigSource::File);
        }

        if let Some(hemisphere) = file_config.utm_hemisphere {
            self.utm_hemisphere.update(parse_hemisphere(&hemisphere)?, ConfigSource::File);
        }

        if let Some(tol) = file_config.coincidence_tolerance_m {
            self.coincidence_tolerance_m
                .update(check_positive("coincidence_tolerance_m", tol)?, ConfigSource::File);
        }

        if let Some(tol) = file_config.degenerate_tolerance_m {
            self.degenerate_tolerance_m
                .update(check_positive("degenerate_tolerance_m", tol)?, ConfigSource::File);
        }

        if let Some(max) = file_config.max_segment_length_m {
            self.max_segment_length_m
                .update(check_positive("max_segment_length_m", max)?, ConfigSource::File);
        }

        if let Some(network) = file_config.network {
            self.network.update(network.parse()?, ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        // INFRATRACK_UTM_ZONE
        if let Ok(zone_str) = env::var("INFRATRACK_UTM_ZONE") {
            match parse_utm_zone(&zone_str) {
                Ok(zone) => self.utm_zone.update(zone, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid INFRATRACK_UTM_ZONE value '{}': expected a zone number between 1 and 60",
                    zone_str
                ),
            }
        }

        // INFRATRACK_UTM_HEMISPHERE
        if let Ok(hemi_str) = env::var("INFRATRACK_UTM_HEMISPHERE") {
            match parse_hemisphere(&hemi_str) {
                Ok(h) => self.utm_hemisphere.update(h, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid INFRATRACK_UTM_HEMISPHERE value '{}': expected north or south",
                    hemi_str
                ),
            }
        }

        for (var, key, target) in [
            (
                "INFRATRACK_COINCIDENCE_TOLERANCE",
                "coincidence_tolerance_m",
                &mut self.coincidence_tolerance_m,
            ),
            (
                "INFRATRACK_DEGENERATE_TOLERANCE",
                "degenerate_tolerance_m",
                &mut self.degenerate_tolerance_m,
            ),
            (
                "INFRATRACK_MAX_SEGMENT_LENGTH",
                "max_segment_length_m",
                &mut self.max_segment_length_m,
            ),
        ] {
            if let Ok(raw) = env::var(var) {
                match parse_meters(key, &raw) {
                    Ok(v) => target.update(v, ConfigSource::Environment),
                    Err(_) => tracing::warn!(
                        "Invalid {} value '{}': expected a positive distance in meters",
                        var,
                        raw
                    ),
                }
            }
        }

        // INFRATRACK_NETWORK
        if let Ok(network_str) = env::var("INFRATRACK_NETWORK") {
            match network_str.parse::<NetworkContext>() {
                Ok(n) => self.network.update(n, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid INFRATRACK_NETWORK value '{}': expected water, sewage, or mixed",
                    network_str
                ),
            }
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(zone) = overrides.utm_zone {
            self.utm_zone.update(zone, ConfigSource::Cli);
        }

        if let Some(hemisphere) = overrides.utm_hemisphere {
            self.utm_hemisphere.update(hemisphere, ConfigSource::Cli);
        }

        if let Some(tol) = overrides.coincidence_tolerance_m {
            self.coincidence_tolerance_m.update(tol, ConfigSource::Cli);
        }

        if let Some(tol) = overrides.degenerate_tolerance_m {
            self.degenerate_tolerance_m.update(tol, ConfigSource::Cli);
        }

        if let Some(max) = overrides.max_segment_length_m {
            self.max_segment_length_m.update(max, ConfigSource::Cli);
        }

        if let Some(network) = overrides.network {
            self.network.update(network, ConfigSource::Cli);
        }
    }

    /// The projected zone assumed for out-of-range coordinates
    pub fn zone(&self) -> UtmZone {
        UtmZone::new(self.utm_zone.value, self.utm_hemisphere.value)
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        map.insert(
            "utm_zone".to_string(),
            (self.utm_zone.value.to_string(), self.utm_zone.source),
        );

        map.insert(
            "utm_hemisphere".to_string(),
            (self.utm_hemisphere.value.to_string(), self.utm_hemisphere.source),
        );

        map.insert(
            "coincidence_tolerance_m".to_string(),
            (
                format!("{} m", self.coincidence_tolerance_m.value),
                self.coincidence_tolerance_m.source,
            ),
        );

        map.insert(
            "degenerate_tolerance_m".to_string(),
            (
                format!("{} m", self.degenerate_tolerance_m.value),
                self.degenerate_tolerance_m.source,
            ),
        );

        map.insert(
            "max_segment_length_m".to_string(),
            (
                format!("{} m", self.max_segment_length_m.value),
                self.max_segment_length_m.source,
            ),
        );

        map.insert(
            "network".to_string(),
            (self.network.value.to_string(), self.network.source),
        );

        map
    }
}

impl Default for LayeredConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    utm_zone: Option<u8>,
    utm_hemisphere: Option<String>,
    coincidence_tolerance_m: Option<f64>,
    degenerate_tolerance_m: Option<f64>,
    max_segment_length_m: Option<f64>,
    network: Option<String>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub utm_zone: Option<u8>,
    pub utm_hemisphere: Option<Hemisphere>,
    pub coincidence_tolerance_m: Option<f64>,
    pub degenerate_tolerance_m: Option<f64>,
    pub max_segment_length_m: Option<f64>,
    pub network: Option<NetworkContext>,
}

/// Parse a UTM zone number (1-60)
pub fn parse_utm_zone(s: &str) -> Result<u8> {
    match s.trim().parse::<u8>() {
        Ok(zone @ 1..=60) => Ok(zone),
        _ => Err(InfraTrackError::ConfigInvalid {
            key: "utm_zone".to_string(),
            reason: format!("Invalid UTM zone: {}. Use a number between 1 and 60", s),
        }),
    }
}

/// Parse hemisphere from string
pub fn parse_hemisphere(s: &str) -> Result<Hemisphere> {
    match s.trim().to_lowercase().as_str() {
        "north" | "n" => Ok(Hemisphere::North),
        "south" | "s" => Ok(Hemisphere::South),
        _ => Err(InfraTrackError::ConfigInvalid {
            key: "utm_hemisphere".to_string(),
            reason: format!("Invalid hemisphere: {}. Use north or south", s),
        }),
    }
}

/// Parse a strictly positive distance in meters
pub fn parse_meters(key: &str, s: &str) -> Result<f64> {
    let value = s.trim().parse::<f64>().map_err(|_| InfraTrackError::ConfigInvalid {
        key: key.to_string(),
        reason: format!("Invalid distance: {}", s),
    })?;
    check_positive(key, value)
}

fn check_positive(key: &str, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(InfraTrackError::ConfigInvalid {
            key: key.to_string(),
            reason: format!("Expected a positive distance in meters, got {}", value),
        })
    }
}
