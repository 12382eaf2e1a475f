use std::fmt;
use std::str::FromStr;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Device-style preferences stored per user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingKey {
    DailyReminderEnabled,
    ReminderTime,
    SelectedTheme,
}

pub const THEMES: [&str; 3] = ["Green", "Dark", "Default"];

impl SettingKey {
    pub const ALL: [SettingKey; 3] = [
        SettingKey::DailyReminderEnabled,
        SettingKey::ReminderTime,
        SettingKey::SelectedTheme,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SettingKey::DailyReminderEnabled => "daily_reminder_enabled",
            SettingKey::ReminderTime => "reminder_time",
            SettingKey::SelectedTheme => "selected_theme",
        }
    }

    pub fn default_value(&self) -> Value {
        match self {
            SettingKey::DailyReminderEnabled => json!(false),
            SettingKey::ReminderTime => Value::Null,
            SettingKey::SelectedTheme => json!("Green"),
        }
    }

    /// Checks that `value` has the shape this key expects.
    pub fn validate(&self, value: &Value) -> Result<(), String> {
        match self {
            SettingKey::DailyReminderEnabled => {
                if value.is_boolean() {
                    Ok(())
                } else {
                    Err("daily_reminder_enabled must be a boolean".into())
                }
            }
            SettingKey::ReminderTime => match value {
                Value::Null => Ok(()),
                Value::String(s) if NaiveTime::parse_from_str(s, "%H:%M").is_ok() => Ok(()),
                _ => Err("reminder_time must be \"HH:MM\" or null".into()),
            },
            SettingKey::SelectedTheme => match value.as_str() {
                Some(theme) if THEMES.contains(&theme) => Ok(()),
                _ => Err(format!("selected_theme must be one of {}", THEMES.join(", "))),
            },
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SettingKey::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("Unknown setting: {}", s))
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateSettingRequest {
    pub value: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_parse() {
        assert_eq!("reminder_time".parse::<SettingKey>(), Ok(SettingKey::ReminderTime));
        assert!("volume".parse::<SettingKey>().is_err());
    }

    #[test]
    fn test_reminder_time_validation() {
        let key = SettingKey::ReminderTime;
        assert!(key.validate(&json!("07:45")).is_ok());
        assert!(key.validate(&Value::Null).is_ok());
        assert!(key.validate(&json!("7pm")).is_err());
    }

    #[test]
    fn test_theme_validation() {
        assert!(SettingKey::SelectedTheme.validate(&json!("Dark")).is_ok());
        assert!(SettingKey::SelectedTheme.validate(&json!("Neon")).is_err());
        assert!(SettingKey::SelectedTheme.validate(&json!(1)).is_err());
    }

    #[test]
    fn test_defaults_pass_validation() {
        for key in SettingKey::ALL {
            assert!(key.validate(&key.default_value()).is_ok(), "{key}");
        }
    }
}
