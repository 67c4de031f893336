//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.
//! A theme is the presentation half of the rank table: one colour per rank.

use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

const fn rgb(hex: u32) -> Color {
    Color::Rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
}

/// Classic tile colours, 2 through 2048; higher ranks reuse the last entry.
const CLASSIC_TILES: [Color; 11] = [
    rgb(0xEEE4DA),
    rgb(0xEDE0C8),
    rgb(0xF2B179),
    rgb(0xF59563),
    rgb(0xF67C5F),
    rgb(0xF65E3B),
    rgb(0xEDCF72),
    rgb(0xEDCC61),
    rgb(0xEDC850),
    rgb(0xEDC53F),
    rgb(0xEDC22E),
];

const HIGH_CONTRAST_TILES: [Color; 11] = [
    rgb(0xFFFFFF),
    rgb(0xFFFF00),
    rgb(0x00FF00),
    rgb(0x00FFFF),
    rgb(0x0088FF),
    rgb(0xFF00FF),
    rgb(0xFF0000),
    rgb(0xFF8800),
    rgb(0x88FF00),
    rgb(0x00FF88),
    rgb(0xFFD700),
];

/// Blue/orange ramp; avoids red/green pairs.
const COLORBLIND_TILES: [Color; 11] = [
    rgb(0xDDEEFF),
    rgb(0xBBDDEE),
    rgb(0x88CCEE),
    rgb(0x44AA99),
    rgb(0x0077BB),
    rgb(0x004488),
    rgb(0xFFE0B0),
    rgb(0xEECC66),
    rgb(0xEE9944),
    rgb(0xEE7733),
    rgb(0xCC3311),
];

/// Board and tile colours.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Tile background per rank; ranks past the end use the last colour.
    pub tiles: Vec<Color>,
    /// Label colour on light tiles (low ranks).
    pub text_dark: Color,
    /// Label colour on saturated tiles.
    pub text_light: Color,
    /// Board background.
    pub bg: Color,
    /// Empty cell.
    pub empty: Color,
    /// Grid / border.
    pub div_line: Color,
    /// Text (score, moves).
    pub main_fg: Color,
    /// Highlight / titles.
    pub title: Color,
    /// Secondary text (key hints).
    pub inactive_fg: Color,
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
        Self::classic()
    }
}

impl Theme {
    pub fn classic() -> Self {
        Self {
            tiles: CLASSIC_TILES.to_vec(),
            text_dark: rgb(0x776E65),
            text_light: rgb(0xF9F6F2),
            bg: rgb(0xBBADA0),
            empty: rgb(0xCDC1B4),
            div_line: rgb(0x8F7A66),
            main_fg: rgb(0xEEE4DA),
            title: rgb(0xEDC22E),
            inactive_fg: rgb(0x776E65),
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Falls back to the classic theme if path is None or the file is missing.
    pub fn load(path: Option<&Path>, palette: crate::Palette) -> Result<Self, ThemeError> {
        let path = match path {
            Some(p) if p.exists() => p,
            _ => return Ok(Self::default_for_palette(palette)),
        };
        let s = std::fs::read_to_string(path)?;
        let map = parse_theme_file(&s);
        let mut theme = Self::from_map(&map)?;
        theme.apply_palette(palette);
        Ok(theme)
    }

    fn default_for_palette(palette: crate::Palette) -> Self {
        let mut t = Self::classic();
        t.apply_palette(palette);
        t
    }

    /// Override tile colours for high-contrast or colorblind play.
    pub fn apply_palette(&mut self, palette: crate::Palette) {
        match palette {
            crate::Palette::Normal => {}
            crate::Palette::HighContrast => {
                self.tiles = HIGH_CONTRAST_TILES.to_vec();
                self.text_dark = Color::Black;
                self.text_light = Color::Black;
                self.bg = Color::Black;
                self.empty = rgb(0x202020);
            }
            crate::Palette::Colorblind => {
                self.tiles = COLORBLIND_TILES.to_vec();
                self.text_light = rgb(0x101010);
            }
        }
    }

    /// Keys: `tile_0`, `tile_1`, ... (consecutive), `text_dark`, `text_light`,
    /// `main_bg`, `empty`, `div_line`, `main_fg`, `title`, `inactive_fg`.
    fn from_map(map: &HashMap<String, String>) -> Result<Self, ThemeError> {
        let base = Self::classic();
        let get = |key: &str, fallback: Color| -> Result<Color, ThemeError> {
            map.get(key).map_or(Ok(fallback), |v| parse_hex(v))
        };
        let mut tiles = Vec::new();
        while let Some(v) = map.get(&format!("tile_{}", tiles.len())) {
            tiles.push(parse_hex(v)?);
        }
        if tiles.is_empty() {
            tiles = base.tiles.clone();
        }
        Ok(Self {
            tiles,
            text_dark: get("text_dark", base.text_dark)?,
            text_light: get("text_light", base.text_light)?,
            bg: get("main_bg", base.bg)?,
            empty: get("empty", base.empty)?,
            div_line: get("div_line", base.div_line)?,
            main_fg: get("main_fg", base.main_fg)?,
            title: get("title", base.title)?,
            inactive_fg: get("inactive_fg", base.inactive_fg)?,
        })
    }

    /// (background, label) colours for a tile of `rank`.
    pub fn tile_colors(&self, rank: usize) -> (Color, Color) {
        let bg = self
            .tiles
            .get(rank)
            .or_else(|| self.tiles.last())
            .copied()
            .unwrap_or(self.empty);
        let fg = if rank < 2 {
            self.text_dark
        } else {
            self.text_light
        };
        (bg, fg)
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(stripped) = line.strip_prefix("theme[") {
            if let Some(end) = stripped.find(']') {
                let key = stripped[..end].trim();
                let rest = stripped[end + 1..].trim();
                if let Some(eq) = rest.find('=') {
                    let value = rest[eq + 1..]
                        .trim()
                        .trim_matches('"')
                        .trim_matches('\'')
                        .to_string();
                    if !value.is_empty() {
                        map.insert(key.to_string(), value);
                    }
                }
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let invalid = || ThemeError::InvalidHex(s.to_string());
    let channel = |range: std::ops::Range<usize>| {
        s.get(range)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .ok_or_else(invalid)
    };
    let (r, g, b) = match s.len() {
        6 => (channel(0..2)?, channel(2..4)?, channel(4..6)?),
        3 => (channel(0..1)? * 17, channel(1..2)? * 17, channel(2..3)? * 17),
        _ => return Err(invalid()),
    };
    Ok(Color::Rgb(r, g, b))
}
