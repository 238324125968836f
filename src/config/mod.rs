pub mod actions;
pub mod key;
pub mod keybindings;
pub mod loader;
pub mod resolver;

use std::path::PathBuf;

pub use actions::*;
use keybindings::KeybindingsConfig;
pub use loader::{load, save_last_page, save_theme};
pub use resolver::KeyResolver;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeConfig {
    pub name: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            name: "Catppuccin Mocha".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub page_size: usize,
    /// Where exports are written. Defaults to the download directory.
    pub export_dir: Option<PathBuf>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            export_dir: None,
        }
    }
}

impl BrowserConfig {
    pub fn export_dir(&self) -> PathBuf {
        self.export_dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DataConfig {
    /// Simulated latency of every data source call.
    pub latency_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub theme: ThemeConfig,
    #[serde(default)]
    pub keybindings: KeybindingsConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub last_page: Option<String>,
}
