use std::fs;
use std::path::PathBuf;

use ratatui::style::Color;
use rust_embed::Embed;
use serde::{Deserialize, Serialize};

#[derive(Embed)]
#[folder = "assets/themes/"]
struct ThemeAssets;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,
    #[serde(default)]
    pub colors: ThemeColors,
}

/// Declares the palette once. Each row yields the struct field, its
/// default hex value, and the parsed accessor.
macro_rules! theme_colors {
    ($($field:ident => $default:literal),+ $(,)?) => {
        /// Color roles as hex strings. Every field defaults individually,
        /// so a user theme only has to name the colors it changes.
        #[derive(Clone, Debug, Serialize, Deserialize)]
        #[serde(default)]
        pub struct ThemeColors {
            $(pub $field: String,)+
        }

        impl Default for ThemeColors {
            fn default() -> Self {
                Self {
                    $($field: $default.to_string(),)+
                }
            }
        }

        impl ThemeColors {
            $(pub fn $field(&self) -> Color {
                parse_color(&self.$field)
            })+
        }
    };
}

// Field defaults carry the same palette as the bundled catppuccin-mocha file.
theme_colors! {
    bg => "#1e1e2e",
    fg => "#cdd6f4",
    text_correct => "#a6e3a1",
    text_incorrect => "#f38ba8",
    text_incorrect_bg => "#45273a",
    text_pending => "#585b70",
    text_cursor_bg => "#f5e0dc",
    text_cursor_fg => "#1e1e2e",
    accent => "#89b4fa",
    accent_dim => "#45475a",
    border => "#45475a",
    border_focused => "#89b4fa",
    header_bg => "#313244",
    header_fg => "#cdd6f4",
    bar_filled => "#89b4fa",
    bar_empty => "#313244",
    error => "#f38ba8",
    warning => "#f9e2af",
    success => "#a6e3a1",
}

impl Theme {
    /// Resolve `name` against the user themes directory first, then the
    /// bundled set.
    pub fn load(name: &str) -> Option<Self> {
        Self::read_user_theme(name).or_else(|| Self::read_bundled_theme(name))
    }

    fn read_user_theme(name: &str) -> Option<Self> {
        let path = user_theme_dir()?.join(format!("{name}.toml"));
        let text = fs::read_to_string(path).ok()?;
        toml::from_str(&text).ok()
    }

    fn read_bundled_theme(name: &str) -> Option<Self> {
        let asset = ThemeAssets::get(&format!("{name}.toml"))?;
        let text = std::str::from_utf8(asset.data.as_ref()).ok()?;
        toml::from_str(text).ok()
    }

    /// Bundled theme names, sorted for stable listings.
    pub fn available_themes() -> Vec<String> {
        let mut names: Vec<String> = ThemeAssets::iter()
            .filter_map(|path| path.strip_suffix(".toml").map(str::to_string))
            .collect();
        names.sort();
        names
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::load("catppuccin-mocha").unwrap_or_else(|| Self {
            name: "catppuccin-mocha".to_string(),
            colors: ThemeColors::default(),
        })
    }
}

/// Directory scanned for user themes, shadowing bundled names.
fn user_theme_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("copytype").join("themes"))
}

/// Parse `#rrggbb` or `#rgb` into a terminal color; anything malformed
/// maps to the terminal default.
fn parse_color(hex: &str) -> Color {
    let Some(digits) = hex.strip_prefix('#') else {
        return Color::Reset;
    };
    if !digits.is_ascii() {
        return Color::Reset;
    }
    let channel = |a: usize, b: usize| u8::from_str_radix(&digits[a..b], 16).ok();
    let parsed = match digits.len() {
        6 => (channel(0, 2), channel(2, 4), channel(4, 6)),
        // Shorthand doubles each digit: #abc reads as #aabbcc.
        3 => (
            channel(0, 1).map(|v| v * 17),
            channel(1, 2).map(|v| v * 17),
            channel(2, 3).map(|v| v * 17),
        ),
        _ => return Color::Reset,
    };
    match parsed {
        (Some(r), Some(g), Some(b)) => Color::Rgb(r, g, b),
        _ => Color::Reset,
    }
}
