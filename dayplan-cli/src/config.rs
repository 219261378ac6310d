use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fs;

use crate::state::Store;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub profile: ProfileSection,
    #[serde(default)]
    pub checkin: CheckinSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSection {
    /// IANA timezone used to decide which calendar day "today" is.
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckinSection {
    /// Used when `checkin --hours` is omitted.
    #[serde(default = "default_hours")]
    pub default_hours: f64,
}

fn default_timezone() -> String {
    "America/Chicago".to_string()
}

fn default_hours() -> f64 {
    8.0
}

impl Default for ProfileSection {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
        }
    }
}

impl Default for CheckinSection {
    fn default() -> Self {
        Self {
            default_hours: default_hours(),
        }
    }
}

impl Config {
    pub fn tz(&self) -> Result<Tz> {
        self.profile
            .timezone
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid timezone in config: {}", self.profile.timezone))
    }

    /// The local calendar date at `now` in the configured timezone.
    pub fn today(&self, now: DateTime<Utc>) -> Result<NaiveDate> {
        Ok(now.with_timezone(&self.tz()?).date_naive())
    }
}

pub fn load_config(store: &Store) -> Result<Config> {
    let p = store.config_path();
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    let cfg: Config = toml::from_str(&s).context("parse config.toml")?;
    cfg.tz()?;
    Ok(cfg)
}

pub fn save_config(store: &Store, cfg: &Config) -> Result<()> {
    let p = store.config_path();
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config(store: &Store) -> Result<()> {
    let p = store.config_path();
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(store, &Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn partial_file_fills_defaults() {
        let cfg: Config = toml::from_str("[profile]\ntimezone = \"Europe/Berlin\"\n").unwrap();
        assert_eq!(cfg.profile.timezone, "Europe/Berlin");
        assert_eq!(cfg.checkin.default_hours, 8.0);
    }

    #[test]
    fn today_follows_timezone() {
        let cfg = Config::default();
        // 03:30 UTC is still the previous evening in Chicago.
        let now = Utc.with_ymd_and_hms(2026, 3, 3, 3, 30, 0).unwrap();
        assert_eq!(cfg.today(now).unwrap(), NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());
        let mut cfg = Config::default();
        cfg.checkin.default_hours = 6.5;
        save_config(&store, &cfg).unwrap();
        assert_eq!(load_config(&store).unwrap(), cfg);
    }

    #[test]
    fn bad_timezone_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());
        fs::write(store.config_path(), "[profile]\ntimezone = \"Mars/Olympus\"\n").unwrap();
        assert!(load_config(&store).is_err());
    }
}
