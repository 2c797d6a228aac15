//! Room configuration models.

use serde::{Deserialize, Serialize};
use std::{env, str::FromStr, time::Duration};

use crate::game::GameSettings;

/// Room speed variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomSpeed {
    Normal,
    Turbo,
    Hyper,
}

impl std::fmt::Display for RoomSpeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoomSpeed::Normal => write!(f, "normal"),
            RoomSpeed::Turbo => write!(f, "turbo"),
            RoomSpeed::Hyper => write!(f, "hyper"),
        }
    }
}

impl FromStr for RoomSpeed {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(RoomSpeed::Normal),
            "turbo" => Ok(RoomSpeed::Turbo),
            "hyper" => Ok(RoomSpeed::Hyper),
            other => Err(format!("Unknown room speed: {other}")),
        }
    }
}

/// Room configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Room name
    pub name: String,

    /// Seat count, buys and hand size
    pub settings: GameSettings,

    /// Room speed
    pub speed: RoomSpeed,

    /// Overrides the speed's buy window (milliseconds)
    pub buy_window_ms: Option<u64>,

    /// Overrides the speed's discard window (milliseconds)
    pub discard_window_ms: Option<u64>,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            name: "May I".to_string(),
            settings: GameSettings::default(),
            speed: RoomSpeed::Normal,
            buy_window_ms: None,
            discard_window_ms: None,
        }
    }
}

impl RoomConfig {
    /// Load configuration from `MAYI_*` environment variables. Missing or
    /// unparsable values fall back to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            name: lookup("MAYI_ROOM_NAME")
                .filter(|name| !name.trim().is_empty())
                .unwrap_or(defaults.name),
            settings: parse_var(&lookup, "MAYI_PLAYER_COUNT")
                .map(GameSettings::new)
                .unwrap_or(defaults.settings),
            speed: lookup("MAYI_ROOM_SPEED")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.speed),
            buy_window_ms: parse_var(&lookup, "MAYI_BUY_WINDOW_MS").or(defaults.buy_window_ms),
            discard_window_ms: parse_var(&lookup, "MAYI_DISCARD_WINDOW_MS")
                .or(defaults.discard_window_ms),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Room name must not be empty".to_string());
        }

        self.settings.validate()?;

        if self.buy_window_ms == Some(0) || self.discard_window_ms == Some(0) {
            return Err("Window durations must be positive".to_string());
        }

        Ok(())
    }

    /// How long other players get to ask for the latest discard
    pub fn buy_window(&self) -> Duration {
        let default_ms = match self.speed {
            RoomSpeed::Normal => 10_000,
            RoomSpeed::Turbo => 5_000,
            RoomSpeed::Hyper => 2_000,
        };
        Duration::from_millis(self.buy_window_ms.unwrap_or(default_ms))
    }

    /// How long the acting player has before a card is discarded for them
    pub fn discard_window(&self) -> Duration {
        let default_ms = match self.speed {
            RoomSpeed::Normal => 30_000,
            RoomSpeed::Turbo => 15_000,
            RoomSpeed::Hyper => 5_000,
        };
        Duration::from_millis(self.discard_window_ms.unwrap_or(default_ms))
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = RoomConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.settings.player_count, 4);
        assert_eq!(config.buy_window(), Duration::from_secs(10));
        assert_eq!(config.discard_window(), Duration::from_secs(30));
    }

    #[test]
    fn test_speed_selects_windows() {
        let config = RoomConfig {
            speed: RoomSpeed::Hyper,
            ..RoomConfig::default()
        };
        assert_eq!(config.buy_window(), Duration::from_secs(2));
        assert_eq!(config.discard_window(), Duration::from_secs(5));
    }

    #[test]
    fn test_overrides_win_over_speed() {
        let config = RoomConfig {
            speed: RoomSpeed::Turbo,
            buy_window_ms: Some(250),
            ..RoomConfig::default()
        };
        assert_eq!(config.buy_window(), Duration::from_millis(250));
        assert_eq!(config.discard_window(), Duration::from_secs(15));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let empty_name = RoomConfig {
            name: "  ".to_string(),
            ..RoomConfig::default()
        };
        assert!(empty_name.validate().is_err());

        let too_many = RoomConfig {
            settings: GameSettings::new(9),
            ..RoomConfig::default()
        };
        assert!(too_many.validate().is_err());

        let too_few = RoomConfig {
            settings: GameSettings::new(1),
            ..RoomConfig::default()
        };
        assert!(too_few.validate().is_err());

        let zero_window = RoomConfig {
            discard_window_ms: Some(0),
            ..RoomConfig::default()
        };
        assert!(zero_window.validate().is_err());
    }

    #[test]
    fn test_lookup_reads_all_keys() {
        let config = RoomConfig::from_lookup(lookup_from(&[
            ("MAYI_ROOM_NAME", "Kitchen Table"),
            ("MAYI_PLAYER_COUNT", "6"),
            ("MAYI_ROOM_SPEED", "Turbo"),
            ("MAYI_BUY_WINDOW_MS", "1500"),
            ("MAYI_DISCARD_WINDOW_MS", "9000"),
        ]));
        assert_eq!(config.name, "Kitchen Table");
        assert_eq!(config.settings.player_count, 6);
        assert_eq!(config.speed, RoomSpeed::Turbo);
        assert_eq!(config.buy_window(), Duration::from_millis(1500));
        assert_eq!(config.discard_window(), Duration::from_millis(9000));
    }

    #[test]
    fn test_lookup_falls_back_on_garbage() {
        let config = RoomConfig::from_lookup(lookup_from(&[
            ("MAYI_PLAYER_COUNT", "lots"),
            ("MAYI_ROOM_SPEED", "ludicrous"),
            ("MAYI_BUY_WINDOW_MS", "-5"),
        ]));
        assert_eq!(config, RoomConfig::default());
    }

    #[test]
    fn test_speed_serde_lowercase() {
        let json = serde_json::to_string(&RoomSpeed::Hyper).unwrap();
        assert_eq!(json, "\"hyper\"");
        assert_eq!("turbo".parse::<RoomSpeed>(), Ok(RoomSpeed::Turbo));
    }
}
