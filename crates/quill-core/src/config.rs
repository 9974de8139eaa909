use serde::{Deserialize, Serialize};

/// Built-in dark theme. A custom dark theme is loaded through the mode link.
pub const DEFAULT_DARK_THEME: &str = "midnight";
/// Built-in light theme.
pub const DEFAULT_LIGHT_THEME: &str = "daylight";

/// Server-reported application configuration.
///
/// Only the fields the sync engine reads are modelled; everything else the
/// server sends is kept verbatim in `extra` so a `setConf` round-trips.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub editor: EditorConfig,
    pub appearance: AppearanceConfig,
    /// Publish / read-only service mode. Disables cloud features.
    pub readonly: bool,
    pub system: SystemConfig,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    pub read_only: bool,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppearanceConfig {
    pub mode: AppearanceMode,
    pub theme_dark: String,
    pub theme_light: String,
    pub lang: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Default for AppearanceConfig {
    fn default() -> Self {
        Self {
            mode: AppearanceMode::Light,
            theme_dark: DEFAULT_DARK_THEME.into(),
            theme_light: DEFAULT_LIGHT_THEME.into(),
            lang: "en_US".into(),
            extra: serde_json::Map::new(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SystemConfig {
    pub id: String,
    pub os: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Appearance mode, encoded on the wire as `0` (light) or `1` (dark).
/// Any other value is kept as `Other` and round-trips unchanged.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum AppearanceMode {
    #[default]
    Light,
    Dark,
    Other(u8),
}

impl From<u8> for AppearanceMode {
    fn from(v: u8) -> Self {
        match v {
            0 => Self::Light,
            1 => Self::Dark,
            other => Self::Other(other),
        }
    }
}

impl From<AppearanceMode> for u8 {
    fn from(mode: AppearanceMode) -> Self {
        match mode {
            AppearanceMode::Light => 0,
            AppearanceMode::Dark => 1,
            AppearanceMode::Other(v) => v,
        }
    }
}

/// The two stylesheet links a theme refresh can target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThemeLink {
    /// Link for the custom theme of the current mode.
    Mode,
    /// Link for the built-in default theme.
    Default,
}

impl ThemeLink {
    /// Element id of the link in the host document.
    pub fn element_id(self) -> &'static str {
        match self {
            Self::Mode => "themeStyle",
            Self::Default => "themeDefaultStyle",
        }
    }
}

impl AppConfig {
    /// Pick the link a `refreshtheme` push should update: the mode link when
    /// the current mode runs a non-default theme, the default link otherwise.
    pub fn theme_link_for_refresh(&self) -> ThemeLink {
        let a = &self.appearance;
        let custom = match a.mode {
            AppearanceMode::Dark => a.theme_dark != DEFAULT_DARK_THEME,
            AppearanceMode::Light => a.theme_light != DEFAULT_LIGHT_THEME,
            // Unrecognised modes have no custom theme slot.
            AppearanceMode::Other(_) => false,
        };
        if custom {
            ThemeLink::Mode
        } else {
            ThemeLink::Default
        }
    }
}
