//! Light/dark desktop theme detection.
//!
//! The theme is re-read on every indicator swap so live theme changes are
//! picked up the next time the trash state flips.

use std::process::Command;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Theme of the panel hosting the indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorTheme {
    /// Light panel, dark glyph.
    Light,
    /// Dark panel, light glyph.
    Dark,
}

/// User preference for indicator theme selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemePreference {
    /// Follow the desktop setting.
    #[default]
    Auto,
    /// Always use the light variant.
    Light,
    /// Always use the dark variant.
    Dark,
}

/// Source of the current theme. Implementations must not fail.
pub trait ThemeDetector: Send + Sync {
    /// Whether the desktop currently uses a dark theme.
    fn is_dark_theme(&self) -> bool;

    /// Current theme as an [`IndicatorTheme`].
    fn current(&self) -> IndicatorTheme {
        if self.is_dark_theme() {
            IndicatorTheme::Dark
        } else {
            IndicatorTheme::Light
        }
    }
}

/// Detector that asks the desktop environment, honoring a forced preference.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemThemeDetector {
    preference: ThemePreference,
}

impl SystemThemeDetector {
    /// Create a detector with the given preference.
    pub fn new(preference: ThemePreference) -> Self {
        Self { preference }
    }
}

impl ThemeDetector for SystemThemeDetector {
    fn is_dark_theme(&self) -> bool {
        match self.preference {
            ThemePreference::Light => false,
            ThemePreference::Dark => true,
            ThemePreference::Auto => {
                let dark = query_desktop_dark().unwrap_or(false);
                debug!(dark, "Desktop theme queried");
                dark
            }
        }
    }
}

#[cfg(all(unix, not(target_os = "macos")))]
fn query_desktop_dark() -> Option<bool> {
    if let Ok(theme) = std::env::var("GTK_THEME")
        && !theme.trim().is_empty()
    {
        return Some(theme.to_ascii_lowercase().contains("dark"));
    }

    let output = Command::new("gsettings")
        .args(["get", "org.gnome.desktop.interface", "color-scheme"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    Some(parse_color_scheme(&String::from_utf8_lossy(&output.stdout)))
}

#[cfg(target_os = "macos")]
fn query_desktop_dark() -> Option<bool> {
    // Exits non-zero when the key is absent, which means light mode.
    let output = Command::new("defaults")
        .args(["read", "-g", "AppleInterfaceStyle"])
        .output()
        .ok()?;
    Some(output.status.success() && String::from_utf8_lossy(&output.stdout).contains("Dark"))
}

#[cfg(windows)]
fn query_desktop_dark() -> Option<bool> {
    let output = Command::new("reg")
        .args([
            "query",
            r"HKCU\Software\Microsoft\Windows\CurrentVersion\Themes\Personalize",
            "/v",
            "SystemUsesLightTheme",
        ])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    parse_reg_dword(&String::from_utf8_lossy(&output.stdout)).map(|light| light == 0)
}

#[cfg(not(any(unix, windows)))]
fn query_desktop_dark() -> Option<bool> {
    None
}

/// Interpret `gsettings get org.gnome.desktop.interface color-scheme` output.
#[cfg_attr(any(target_os = "macos", windows), allow(dead_code))]
pub(crate) fn parse_color_scheme(raw: &str) -> bool {
    raw.trim().trim_matches('\'') == "prefer-dark"
}

/// Extract the value of a `REG_DWORD` line from `reg query` output.
#[cfg_attr(not(windows), allow(dead_code))]
pub(crate) fn parse_reg_dword(raw: &str) -> Option<u32> {
    raw.lines()
        .find(|line| line.contains("REG_DWORD"))
        .and_then(|line| line.split_whitespace().last())
        .and_then(|value| u32::from_str_radix(value.trim_start_matches("0x"), 16).ok())
}
