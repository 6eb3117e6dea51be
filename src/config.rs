use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const CONFIG_DIR_NAME: &str = "grass-reaper-overlay";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelWindowConfig {
    pub width: f32,
    pub height: f32,
    pub pos_x: Option<f32>,
    pub pos_y: Option<f32>,
}

impl Default for PanelWindowConfig {
    fn default() -> Self {
        Self {
            width: 420.0,
            height: 520.0,
            pos_x: None,
            pos_y: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub endpoint_url: String,
    pub poll_minutes: u64,
    pub overlay_enabled: bool,
    #[serde(default)]
    pub panel_window: PanelWindowConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            endpoint_url: "https://git-p5.vercel.app/api/monster".to_owned(),
            poll_minutes: 15,
            overlay_enabled: true,
            panel_window: PanelWindowConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn load_or_create() -> Result<(Self, PathBuf)> {
        let config_dir = dirs::config_dir()
            .context("unable to locate OS config directory")?
            .join(CONFIG_DIR_NAME);
        fs::create_dir_all(&config_dir)
            .with_context(|| format!("failed creating config dir at {}", config_dir.display()))?;

        let config_path = config_dir.join("config.json");
        if !config_path.exists() {
            let default = Self::default();
            default.save(&config_path)?;
            return Ok((default, config_path));
        }

        let text = fs::read_to_string(&config_path)
            .with_context(|| format!("failed reading {}", config_path.display()))?;
        let config = serde_json::from_str::<Self>(&text)
            .with_context(|| format!("invalid json in {}", config_path.display()))?;
        Ok((config, config_path))
    }

    pub fn save(&self, path: &PathBuf) -> Result<()> {
        let payload = serde_json::to_string_pretty(self).context("failed serializing config")?;
        fs::write(path, payload).with_context(|| format!("failed writing {}", path.display()))?;
        Ok(())
    }

    // The config file is hand-editable JSON; scheduling only trusts 1..=1440.
    pub fn poll_minutes_clamped(&self) -> u64 {
        self.poll_minutes.clamp(1, 1440)
    }
}

#[cfg(test)]
mod tests {
    use super::AppConfig;

    #[test]
    fn parses_partial_config_with_defaults() {
        let raw = r#"{
            "endpoint_url": "http://127.0.0.1:9000/api/monster"
        }"#;
        let parsed: AppConfig = serde_json::from_str(raw).expect("config should parse");
        assert_eq!(parsed.endpoint_url, "http://127.0.0.1:9000/api/monster");
        assert_eq!(parsed.poll_minutes, 15);
        assert!(parsed.overlay_enabled);
        assert_eq!(parsed.panel_window.width, 420.0);
        assert_eq!(parsed.panel_window.pos_x, None);
    }

    #[test]
    fn zero_poll_minutes_is_clamped_for_scheduling() {
        let raw = r#"{ "poll_minutes": 0 }"#;
        let parsed: AppConfig = serde_json::from_str(raw).expect("config should parse");
        assert_eq!(parsed.poll_minutes_clamped(), 1);
    }

    #[test]
    fn huge_poll_minutes_is_capped_for_scheduling() {
        let raw = format!(r#"{{ "poll_minutes": {} }}"#, u64::MAX);
        let parsed: AppConfig = serde_json::from_str(&raw).expect("config should parse");
        assert_eq!(parsed.poll_minutes_clamped(), 1440);
    }

    #[test]
    fn round_trips_window_geometry() {
        let mut config = AppConfig::default();
        config.panel_window.pos_x = Some(120.0);
        config.panel_window.pos_y = Some(64.0);
        let payload = serde_json::to_string(&config).expect("config should serialize");
        let parsed: AppConfig = serde_json::from_str(&payload).expect("config should parse");
        assert_eq!(parsed.panel_window.pos_x, Some(120.0));
        assert_eq!(parsed.panel_window.pos_y, Some(64.0));
    }
}
