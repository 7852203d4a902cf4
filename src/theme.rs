//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Colours used by the HUD, the grid and the overlays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    /// Screen background.
    pub bg: Color,
    /// Unlit cell.
    pub cell: Color,
    /// Lit cell.
    pub active: Color,
    /// Scanline and lit cells under it.
    pub scan: Color,
    /// Borders.
    pub div_line: Color,
    /// Text.
    pub main_fg: Color,
    /// Titles, score.
    pub title: Color,
    /// Labels.
    pub inactive_fg: Color,
    /// Health above half.
    pub good: Color,
    /// Health above a fifth.
    pub warn: Color,
    /// Low health, game over banner.
    pub danger: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            bg: Color::Rgb(0x05, 0x05, 0x05),
            cell: Color::Rgb(0x15, 0x15, 0x15),
            active: Color::Rgb(0xF7, 0xDF, 0x1E),
            scan: Color::Rgb(0xFF, 0xFF, 0xFF),
            div_line: Color::Rgb(0x1F, 0x29, 0x37),
            main_fg: Color::Rgb(0xE5, 0xE7, 0xEB),
            title: Color::Rgb(0xF7, 0xDF, 0x1E),
            inactive_fg: Color::Rgb(0x6B, 0x72, 0x80),
            good: Color::Rgb(0x22, 0xC5, 0x5E),
            warn: Color::Rgb(0xF7, 0xDF, 0x1E),
            danger: Color::Rgb(0xEF, 0x44, 0x44),
        }
    }
}

impl Theme {
    /// Load from a btop-style file; keys missing from the file keep their defaults.
    /// `None` or a missing file gives the default theme.
    pub fn load(path: Option<&Path>) -> Result<Self, ThemeError> {
        let path = match path {
            Some(p) if p.exists() => p,
            _ => return Ok(Self::default()),
        };
        let s = std::fs::read_to_string(path)?;
        Ok(Self::from_map(&parse_theme_file(&s)))
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str, fallback: Color| {
            map.get(key)
                .and_then(|v| parse_hex(v).ok())
                .unwrap_or(fallback)
        };
        let d = Self::default();
        Self {
            bg: get("main_bg", d.bg),
            cell: get("meter_bg", d.cell),
            active: get("hi_fg", d.active),
            scan: get("selected_fg", d.scan),
            div_line: get("div_line", d.div_line),
            main_fg: get("main_fg", d.main_fg),
            title: get("title", d.title),
            inactive_fg: get("inactive_fg", d.inactive_fg),
            good: get("cpu_start", d.good),
            warn: get("cpu_mid", d.warn),
            danger: get("cpu_end", d.danger),
        }
    }

    /// Health bar colour: good above 50, warn above 20, danger otherwise.
    pub fn health_color(&self, health: f64) -> Color {
        if health > 50.0 {
            self.good
        } else if health > 20.0 {
            self.warn
        } else {
            self.danger
        }
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(stripped) = line.strip_prefix("theme[") else {
            continue;
        };
        let Some((key, rest)) = stripped.split_once(']') else {
            continue;
        };
        let Some((_, value)) = rest.split_once('=') else {
            continue;
        };
        let value = value.trim().trim_matches('"').trim_matches('\'');
        if !value.is_empty() {
            map.insert(key.trim().to_string(), value.to_string());
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let hex = s.trim().trim_start_matches('#');
    let invalid = || ThemeError::InvalidHex(s.to_string());
    let channel = |range: std::ops::Range<usize>| {
        hex.get(range)
            .and_then(|c| u8::from_str_radix(c, 16).ok())
            .ok_or_else(invalid)
    };
    match hex.len() {
        6 => Ok(Color::Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
        3 => Ok(Color::Rgb(
            channel(0..1)? * 17,
            channel(1..2)? * 17,
            channel(2..3)? * 17,
        )),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_6() {
        let c = parse_hex("#F7DF1E").unwrap();
        assert!(matches!(c, Color::Rgb(0xF7, 0xDF, 0x1E)));
    }

    #[test]
    fn test_parse_hex_3() {
        let c = parse_hex("#FFF").unwrap();
        assert!(matches!(c, Color::Rgb(255, 255, 255)));
    }

    #[test]
    fn test_parse_hex_rejects_garbage() {
        assert!(parse_hex("#12345").is_err());
        assert!(parse_hex("#GGGGGG").is_err());
    }

    #[test]
    fn test_parse_theme_line() {
        let map = parse_theme_file(r##"theme[hi_fg]="#00FF41""##);
        assert_eq!(map.get("hi_fg"), Some(&"#00FF41".to_string()));
    }

    #[test]
    fn test_partial_theme_keeps_defaults() {
        let map = parse_theme_file("# green phosphor\ntheme[hi_fg]='#00FF41'\ntheme[title]=\"#bogus\"\n");
        let t = Theme::from_map(&map);
        assert_eq!(t.active, Color::Rgb(0x00, 0xFF, 0x41));
        assert_eq!(t.title, Theme::default().title);
        assert_eq!(t.bg, Theme::default().bg);
    }

    #[test]
    fn test_health_color_thresholds() {
        let t = Theme::default();
        assert_eq!(t.health_color(100.0), t.good);
        assert_eq!(t.health_color(50.0), t.warn);
        assert_eq!(t.health_color(20.5), t.warn);
        assert_eq!(t.health_color(20.0), t.danger);
        assert_eq!(t.health_color(0.0), t.danger);
    }

    #[test]
    fn test_missing_file_is_default() {
        let t = Theme::load(Some(Path::new("/nonexistent/matrixfeed.theme"))).unwrap();
        assert_eq!(t, Theme::default());
    }
}
