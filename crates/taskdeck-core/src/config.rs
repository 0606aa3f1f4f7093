use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Canvas placement geometry. Values mirror the card footprint used by the
/// grid placement algorithm: cards advance through grid cells of
/// `card_width x card_height` separated by `grid_spacing`, two per row,
/// starting from `(start_x, start_y)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanvasConfig {
    #[serde(default = "default_card_width")]
    pub card_width: f64,
    #[serde(default = "default_card_height")]
    pub card_height: f64,
    #[serde(default = "default_grid_spacing")]
    pub grid_spacing: f64,
    #[serde(default = "default_start_x")]
    pub start_x: f64,
    #[serde(default = "default_start_y")]
    pub start_y: f64,
    #[serde(default = "default_cards_per_row")]
    pub cards_per_row: usize,
    /// Bounded retry count for the overlap-avoidance scan.
    #[serde(default = "default_placement_attempts")]
    pub placement_attempts: usize,
    #[serde(default = "default_stagger_x")]
    pub stagger_x: f64,
    #[serde(default = "default_stagger_y")]
    pub stagger_y: f64,
    /// Cards per diagonal-stagger row in the fallback layout.
    #[serde(default = "default_stagger_per_row")]
    pub stagger_per_row: usize,
}

fn default_card_width() -> f64 {
    250.0
}
fn default_card_height() -> f64 {
    150.0
}
fn default_grid_spacing() -> f64 {
    20.0
}
fn default_start_x() -> f64 {
    20.0
}
fn default_start_y() -> f64 {
    20.0
}
fn default_cards_per_row() -> usize {
    2
}
fn default_placement_attempts() -> usize {
    50
}
fn default_stagger_x() -> f64 {
    60.0
}
fn default_stagger_y() -> f64 {
    40.0
}
fn default_stagger_per_row() -> usize {
    5
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            card_width: default_card_width(),
            card_height: default_card_height(),
            grid_spacing: default_grid_spacing(),
            start_x: default_start_x(),
            start_y: default_start_y(),
            cards_per_row: default_cards_per_row(),
            placement_attempts: default_placement_attempts(),
            stagger_x: default_stagger_x(),
            stagger_y: default_stagger_y(),
            stagger_per_row: default_stagger_per_row(),
        }
    }
}

impl CanvasConfig {
    pub fn config_path() -> Option<PathBuf> {
        #[cfg(target_os = "macos")]
        {
            dirs::home_dir().map(|home| home.join(".config/taskdeck/config.toml"))
        }
        #[cfg(target_os = "linux")]
        {
            dirs::config_dir().map(|config| config.join("taskdeck/config.toml"))
        }
        #[cfg(target_os = "windows")]
        {
            dirs::config_dir().map(|config| config.join("taskdeck\\config.toml"))
        }
        #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
        {
            None
        }
    }

    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    pub fn load_from(path: &std::path::Path) -> Self {
        if path.exists() {
            if let Ok(content) = std::fs::read_to_string(path) {
                if let Ok(config) = toml::from_str(&content) {
                    return config;
                }
            }
        }
        Self::default()
    }

    /// Horizontal distance between adjacent grid columns.
    pub fn column_step(&self) -> f64 {
        self.card_width + self.grid_spacing
    }

    /// Vertical distance between adjacent grid rows.
    pub fn row_step(&self) -> f64 {
        self.card_height + self.grid_spacing
    }

    /// Top-left corner of the grid cell at `index`.
    pub fn grid_cell(&self, index: usize) -> (f64, f64) {
        let row = index / self.cards_per_row;
        let col = index % self.cards_per_row;
        (
            self.start_x + col as f64 * self.column_step(),
            self.start_y + row as f64 * self.row_step(),
        )
    }
}
