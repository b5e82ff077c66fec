use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Green,
    Light,
}

/// Boolean preferences that can be flipped individually
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Display, EnumString)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum SettingKey {
    AudioEnabled,
    VoiceEnabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub audio_enabled: bool,
    pub voice_enabled: bool,
    pub theme: Theme,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            audio_enabled: true,
            voice_enabled: true,
            theme: Theme::Dark,
        }
    }
}

impl Settings {
    /// Flips one preference and returns its new value
    pub fn toggle(&mut self, key: SettingKey) -> bool {
        let flag = match key {
            SettingKey::AudioEnabled => &mut self.audio_enabled,
            SettingKey::VoiceEnabled => &mut self.voice_enabled,
        };
        *flag = !*flag;
        *flag
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ThemeRequest {
    pub theme: Theme,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn defaults_enable_feedback_with_dark_theme() {
        let settings = Settings::default();

        assert!(settings.audio_enabled);
        assert!(settings.voice_enabled);
        assert_eq!(settings.theme, Theme::Dark);
    }

    #[test]
    fn partial_record_falls_back_to_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"theme":"light"}"#).unwrap();

        assert!(settings.audio_enabled);
        assert_eq!(settings.theme, Theme::Light);
    }

    #[test]
    fn toggle_flips_only_the_named_flag() {
        let mut settings = Settings::default();

        assert!(!settings.toggle(SettingKey::AudioEnabled));
        assert!(settings.voice_enabled);
        assert!(settings.toggle(SettingKey::AudioEnabled));
    }

    #[rstest]
    #[case("audioEnabled", SettingKey::AudioEnabled)]
    #[case("voiceEnabled", SettingKey::VoiceEnabled)]
    fn setting_keys_parse_from_path(#[case] raw: &str, #[case] expected: SettingKey) {
        assert_eq!(SettingKey::from_str(raw).unwrap(), expected);
    }

    #[test]
    fn every_theme_round_trips_through_its_name() {
        for theme in Theme::iter() {
            assert_eq!(Theme::from_str(&theme.to_string()).unwrap(), theme);
        }
        assert!(Theme::from_str("neon").is_err());
    }
}
