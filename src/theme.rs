//! Colors for segments and the preview chrome.
//!
//! A [`Palette`] maps severities to colors and is handed to each renderer;
//! nothing reads colors from global state.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;

use barline_types::Severity;

use crate::config::{ConfigError, ThemeConfig};

/// A 24-bit color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Parse `#RRGGBB`. Named and indexed colors are rejected.
    pub fn parse_hex(s: &str) -> Option<Self> {
        match s.parse::<Color>() {
            Ok(Color::Rgb(r, g, b)) => Some(Rgb(r, g, b)),
            _ => None,
        }
    }
}

impl From<Rgb> for Color {
    fn from(rgb: Rgb) -> Self {
        Color::Rgb(rgb.0, rgb.1, rgb.2)
    }
}

impl From<Rgb> for crossterm::style::Color {
    fn from(rgb: Rgb) -> Self {
        crossterm::style::Color::Rgb {
            r: rgb.0,
            g: rgb.1,
            b: rgb.2,
        }
    }
}

/// Severity colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub good: Rgb,
    pub degraded: Rgb,
    pub bad: Rgb,
    pub neutral: Option<Rgb>,
}

impl Palette {
    pub fn from_config(config: &ThemeConfig) -> Result<Self, ConfigError> {
        let parse = |s: &str| Rgb::parse_hex(s).ok_or_else(|| ConfigError::Color(s.to_string()));
        Ok(Self {
            good: parse(&config.good)?,
            degraded: parse(&config.degraded)?,
            bad: parse(&config.bad)?,
            neutral: config.neutral.as_deref().map(parse).transpose()?,
        })
    }

    /// The color for a severity, or `None` for the terminal default.
    pub fn color(&self, severity: Severity) -> Option<Rgb> {
        match severity {
            Severity::Good => Some(self.good),
            Severity::Degraded => Some(self.degraded),
            Severity::Bad => Some(self.bad),
            Severity::Neutral | Severity::Suppressed => self.neutral,
        }
    }

    /// A ratatui style for a severity.
    pub fn style(&self, severity: Severity) -> Style {
        let style = match self.color(severity) {
            Some(rgb) => Style::default().fg(rgb.into()),
            None => Style::default(),
        };
        if severity == Severity::Bad {
            style.add_modifier(Modifier::BOLD)
        } else {
            style
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            good: Rgb(0x9F, 0xCA, 0x56),
            degraded: Rgb(0xE6, 0xCD, 0x69),
            bad: Rgb(0xCD, 0x3F, 0x45),
            neutral: None,
        }
    }
}

/// Color and style theme for the preview.
///
/// Use [`Theme::auto_detect()`] for automatic selection based on the
/// terminal background, or [`Theme::dark()`]/[`Theme::light()`] explicitly.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Accent color for highlights and active elements.
    pub highlight: Color,
    /// Color for borders and separators.
    pub border: Color,
    /// Style for header rows in tables.
    pub header: Style,
    /// Style for the selected row.
    pub selected: Style,
    /// Border style (rounded, plain, etc.).
    pub border_type: BorderType,
    /// Segment colors.
    pub palette: Palette,
}

impl Theme {
    /// Create a dark theme suitable for dark terminal backgrounds.
    pub fn dark(palette: Palette) -> Self {
        Self {
            highlight: Color::Cyan,
            border: Color::Gray,
            header: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD),
            border_type: BorderType::Rounded,
            palette,
        }
    }

    /// Create a light theme suitable for light terminal backgrounds.
    pub fn light(palette: Palette) -> Self {
        Self {
            highlight: Color::Blue,
            border: Color::DarkGray,
            header: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::LightBlue).add_modifier(Modifier::BOLD),
            border_type: BorderType::Rounded,
            palette,
        }
    }

    /// Auto-detect based on terminal background
    pub fn auto_detect(palette: Palette) -> Self {
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(palette),
            _ => Self::dark(palette),
        }
    }

    pub fn severity_style(&self, severity: Severity) -> Style {
        self.palette.style(severity)
    }
}
