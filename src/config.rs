use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    pub logging: LoggingConfig,
    pub focus: FocusConfig,
    pub backend: BackendConfig,
    pub remote: RemoteConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

/// Настройки политики перемещения указателя
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FocusConfig {
    pub enable_debugging: bool,
    /// Окна меньше этого размера по обеим осям игнорируются
    pub minimum_size_trigger: i32,
    pub motion_event_timeout_ms: u64,
    pub top_bar_height: i32,
    pub bottom_bar_height: i32,
    pub warp_to_last_position: bool,
    /// Проверять обзор и минимальный размер до перехода между мониторами
    #[serde(default)]
    pub suppress_before_monitor_switch: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    pub mode: String,
    pub polling_interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RemoteConfig {
    pub enabled: bool,
    pub bus_name: String,
    pub object_path: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            enable_debugging: false,
            minimum_size_trigger: 100,
            motion_event_timeout_ms: 100,
            top_bar_height: 32,
            bottom_bar_height: 0,
            warp_to_last_position: false,
            suppress_before_monitor_switch: false,
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            mode: "x11".to_string(),
            polling_interval_ms: 25,
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bus_name: "io.github.MouseFollowsFocus".to_string(),
            object_path: "/io/github/MouseFollowsFocus".to_string(),
        }
    }
}

impl FocusConfig {
    pub fn motion_event_timeout(&self) -> Duration {
        Duration::from_millis(self.motion_event_timeout_ms)
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        // Отсутствующий файл не ошибка: остаются значения по умолчанию
        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("MFF_").split("__"));

        let config: Config = figment
            .extract()
            .with_context(|| format!("Не удалось загрузить конфигурацию из {:?}", config_path))?;

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Неверный уровень логирования: {}", self.logging.level),
        }

        match self.logging.format.as_str() {
            "pretty" | "compact" => {}
            _ => anyhow::bail!("Неверный формат логирования: {}", self.logging.format),
        }

        if self.focus.motion_event_timeout_ms == 0 {
            anyhow::bail!("motion_event_timeout_ms должно быть больше 0");
        }

        if self.focus.minimum_size_trigger < 0 {
            anyhow::bail!("minimum_size_trigger не может быть отрицательным");
        }

        if self.focus.top_bar_height < 0 || self.focus.bottom_bar_height < 0 {
            anyhow::bail!("Высота панелей не может быть отрицательной");
        }

        match self.backend.mode.as_str() {
            "x11" | "dry-run" => {}
            _ => anyhow::bail!("Неверный режим бэкенда: {}", self.backend.mode),
        }

        if self.backend.polling_interval_ms < 5 {
            anyhow::bail!("polling_interval_ms должно быть минимум 5");
        }

        if self.remote.enabled {
            if self.remote.bus_name.is_empty() {
                anyhow::bail!("Пустое имя шины D-Bus");
            }
            if !self.remote.object_path.starts_with('/') {
                anyhow::bail!("Неверный путь объекта D-Bus: {}", self.remote.object_path);
            }
        }

        Ok(())
    }

    /// Итоговый уровень логирования: enable_debugging принудительно включает debug
    pub fn effective_log_level(&self) -> &str {
        if self.focus.enable_debugging {
            "debug"
        } else {
            self.logging.level.as_str()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.focus.motion_event_timeout(), Duration::from_millis(100));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = Config::default();
        config.focus.motion_event_timeout_ms = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.backend.mode = "wayland".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.focus.top_bar_height = -1;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.remote.object_path = "no-slash".to_string();
        assert!(config.validate().is_err());

        config.remote.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_enable_debugging_forces_debug_level() {
        let mut config = Config::default();
        assert_eq!(config.effective_log_level(), "info");

        config.focus.enable_debugging = true;
        assert_eq!(config.effective_log_level(), "debug");
    }

    #[test]
    fn test_load_partial_toml_keeps_defaults() {
        let path = std::env::temp_dir().join(format!("mff-config-test-{}.toml", std::process::id()));
        std::fs::write(
            &path,
            "[focus]\nwarp_to_last_position = true\ntop_bar_height = 40\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert!(config.focus.warp_to_last_position);
        assert_eq!(config.focus.top_bar_height, 40);
        assert_eq!(config.focus.minimum_size_trigger, 100);
        assert_eq!(config.backend.mode, "x11");
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = Config::load("/nonexistent/mff.toml").unwrap();
        assert_eq!(config.focus.bottom_bar_height, 0);
        assert!(config.remote.enabled);
    }
}
