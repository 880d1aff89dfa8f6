use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::event::EventKind;

const CONFIG_FILE: &str = ".datebook.toml";
const CONFIG_ENV_VAR: &str = "DATEBOOK_CONFIG";

/// The reference date the sample data set is built around. Sessions
/// compare "today" against this unless the config picks another date or
/// the live clock.
const FROZEN_TODAY: (i32, u32, u32) = (2025, 5, 24);

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    today: Option<String>,
    color: Option<bool>,
    default_type: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub today: NaiveDate,
    pub color: bool,
    pub default_kind: EventKind,
    pub loaded_file: Option<PathBuf>,
}

impl Config {
    pub fn load(override_path: Option<&Path>) -> anyhow::Result<Self> {
        let path = resolve_config_path(override_path);

        let (raw, loaded_file) = match path {
            Some(path) if path.exists() => {
                info!(file = %path.display(), "loading config");
                let text = fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                let raw = parse_raw(&text)
                    .with_context(|| format!("failed to parse {}", path.display()))?;
                (raw, Some(path))
            }
            Some(path) => {
                debug!(file = %path.display(), "config file not found; using defaults");
                (RawConfig::default(), None)
            }
            None => {
                warn!("cannot determine home directory; using default config");
                (RawConfig::default(), None)
            }
        };

        let mut cfg = Self {
            today: frozen_today()?,
            color: true,
            default_kind: EventKind::Meeting,
            loaded_file,
        };
        cfg.apply_raw(raw)?;
        Ok(cfg)
    }

    /// CLI `--set key=value` pairs, applied after the file.
    #[tracing::instrument(skip(self, overrides))]
    pub fn apply_overrides<I>(&mut self, overrides: I) -> anyhow::Result<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in overrides {
            debug!(key = %key, value = %value, "applying override");
            match key.as_str() {
                "today" => self.today = parse_today(&value)?,
                "color" => self.color = parse_bool(&value),
                "default_type" | "type" => {
                    self.default_kind = EventKind::parse(&value)
                        .ok_or_else(|| anyhow!("unknown event type: {value}"))?;
                }
                other => return Err(anyhow!("unknown config key: {other}")),
            }
        }
        Ok(())
    }

    fn apply_raw(&mut self, raw: RawConfig) -> anyhow::Result<()> {
        if let Some(today) = raw.today {
            self.today = parse_today(&today)?;
        }
        if let Some(color) = raw.color {
            self.color = color;
        }
        if let Some(default_type) = raw.default_type {
            self.default_kind = EventKind::parse(&default_type)
                .ok_or_else(|| anyhow!("unknown event type: {default_type}"))?;
        }
        Ok(())
    }
}

fn parse_raw(text: &str) -> anyhow::Result<RawConfig> {
    toml::from_str(text).map_err(|err| anyhow!("{err}"))
}

fn resolve_config_path(override_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = override_path {
        return Some(path.to_path_buf());
    }

    if let Ok(raw) = std::env::var(CONFIG_ENV_VAR) {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }

    dirs::home_dir().map(|home| home.join(CONFIG_FILE))
}

fn frozen_today() -> anyhow::Result<NaiveDate> {
    let (year, month, day) = FROZEN_TODAY;
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| anyhow!("invalid frozen reference date"))
}

/// "now" selects the live clock; anything else must be "YYYY-MM-DD".
fn parse_today(raw: &str) -> anyhow::Result<NaiveDate> {
    let token = raw.trim();
    if token.eq_ignore_ascii_case("now") {
        return Ok(Local::now().date_naive());
    }
    NaiveDate::parse_from_str(token, "%Y-%m-%d")
        .map_err(|_| anyhow!("invalid today value: {raw} (expected YYYY-MM-DD or \"now\")"))
}

fn parse_bool(s: &str) -> bool {
    matches!(
        s.trim().to_ascii_lowercase().as_str(),
        "1" | "y" | "yes" | "on" | "true"
    )
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::event::EventKind;

    use super::{Config, frozen_today, parse_bool, parse_raw, parse_today};

    fn defaults() -> Config {
        Config {
            today: frozen_today().expect("frozen today"),
            color: true,
            default_kind: EventKind::Meeting,
            loaded_file: None,
        }
    }

    #[test]
    fn frozen_reference_is_the_default() {
        let cfg = defaults();
        assert_eq!(
            cfg.today,
            NaiveDate::from_ymd_opt(2025, 5, 24).expect("valid date")
        );
        assert!(cfg.color);
        assert_eq!(cfg.default_kind, EventKind::Meeting);
    }

    #[test]
    fn toml_keys_override_defaults() {
        let raw = parse_raw("today = \"2026-01-15\"\ncolor = false\ndefault_type = \"review\"\n")
            .expect("parse toml");
        let mut cfg = defaults();
        cfg.apply_raw(raw).expect("apply raw");
        assert_eq!(
            cfg.today,
            NaiveDate::from_ymd_opt(2026, 1, 15).expect("valid date")
        );
        assert!(!cfg.color);
        assert_eq!(cfg.default_kind, EventKind::Review);
    }

    #[test]
    fn today_accepts_now_and_rejects_garbage() {
        assert!(parse_today("now").is_ok());
        assert!(parse_today("NOW").is_ok());
        assert!(parse_today("2025-05-24").is_ok());
        assert!(parse_today("05/24/2025").is_err());
        assert!(parse_today("tomorrow").is_err());
    }

    #[test]
    fn overrides_apply_after_the_file() {
        let mut cfg = defaults();
        cfg.apply_overrides([
            ("today".to_string(), "2030-12-01".to_string()),
            ("color".to_string(), "off".to_string()),
            ("type".to_string(), "deadline".to_string()),
        ])
        .expect("apply overrides");
        assert_eq!(
            cfg.today,
            NaiveDate::from_ymd_opt(2030, 12, 1).expect("valid date")
        );
        assert!(!cfg.color);
        assert_eq!(cfg.default_kind, EventKind::Deadline);

        let err = cfg
            .apply_overrides([("week_start".to_string(), "monday".to_string())])
            .expect_err("unknown key");
        assert!(err.to_string().contains("unknown config key"));
    }

    #[test]
    fn bool_tokens_are_lenient() {
        assert!(parse_bool("on"));
        assert!(parse_bool("Yes"));
        assert!(!parse_bool("off"));
        assert!(!parse_bool("definitely"));
    }

    #[test]
    fn malformed_event_type_is_an_error() {
        let raw = parse_raw("default_type = \"standup\"\n").expect("parse toml");
        let mut cfg = defaults();
        assert!(cfg.apply_raw(raw).is_err());
    }
}
