use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::chain::PointerChain;
use crate::error::{Error, Result};
use crate::input::PotionKey;

/// Contents of `autopot.toml`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub game: GameSettings,
    pub pointer: PointerSettings,
    pub potion: PotionSettings,
    pub timing: TimingSettings,
    pub debug: DebugSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    pub process_name: String,
    pub window_title: String,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            process_name: "Last Epoch.exe".to_string(),
            window_title: "Last Epoch".to_string(),
        }
    }
}

/// HP location for game version 1.2.4.1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointerSettings {
    pub module: String,
    pub base_offset: u64,
    pub hops: Vec<u64>,
}

impl Default for PointerSettings {
    fn default() -> Self {
        Self {
            module: "GameAssembly.dll".to_string(),
            base_offset: 0x0407_1400,
            hops: vec![0xC0, 0x1F8, 0x30, 0xB8, 0x00, 0x88, 0x6C],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PotionSettings {
    pub key: String,
    pub cooldown_secs: f64,
    pub threshold_pct: f32,
}

impl Default for PotionSettings {
    fn default() -> Self {
        Self {
            key: "1".to_string(),
            cooldown_secs: 0.2,
            threshold_pct: 0.6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingSettings {
    pub quick_stable_secs: f64,
    pub required_stable_secs: f64,
    pub poll_interval_ms: u64,
    pub process_wait_secs: f64,
    pub memory_wait_secs: f64,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            quick_stable_secs: 1.0,
            required_stable_secs: 5.0,
            poll_interval_ms: 100,
            process_wait_secs: 5.0,
            memory_wait_secs: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugSettings {
    pub developer_debug: bool,
}

impl Settings {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    /// Load `path`, writing a commented default file first if it does not exist.
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, default_config_text())?;
            info!("Created default config at {}", path.display());
        }
        Self::load(path)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(Error::InvalidConfig(msg));

        if self.game.process_name.trim().is_empty() {
            return invalid("game.process_name must not be empty".to_string());
        }
        if self.game.window_title.trim().is_empty() {
            return invalid("game.window_title must not be empty".to_string());
        }
        if self.pointer.module.trim().is_empty() {
            return invalid("pointer.module must not be empty".to_string());
        }
        if self.pointer.hops.is_empty() {
            return invalid("pointer.hops must contain at least one offset".to_string());
        }
        self.potion.key.parse::<PotionKey>()?;

        let pct = self.potion.threshold_pct;
        if !(pct > 0.0 && pct <= 1.0) {
            return invalid(format!("potion.threshold_pct must be in (0, 1], got {}", pct));
        }
        if self.timing.poll_interval_ms == 0 {
            return invalid("timing.poll_interval_ms must be positive".to_string());
        }

        let quick = secs("timing.quick_stable_secs", self.timing.quick_stable_secs)?;
        let required = secs("timing.required_stable_secs", self.timing.required_stable_secs)?;
        if quick > required {
            return invalid(format!(
                "timing.quick_stable_secs ({}) must not exceed timing.required_stable_secs ({})",
                self.timing.quick_stable_secs, self.timing.required_stable_secs
            ));
        }
        secs("potion.cooldown_secs", self.potion.cooldown_secs)?;
        positive_secs("timing.process_wait_secs", self.timing.process_wait_secs)?;
        positive_secs("timing.memory_wait_secs", self.timing.memory_wait_secs)?;

        Ok(())
    }

    /// Validate and convert into the worker's typed configuration.
    pub fn worker_config(&self) -> Result<WorkerConfig> {
        self.validate()?;
        Ok(WorkerConfig {
            chain: PointerChain::new(
                self.pointer.module.clone(),
                self.pointer.base_offset,
                self.pointer.hops.clone(),
            ),
            process_name: self.game.process_name.clone(),
            window_title: self.game.window_title.clone(),
            potion_key: self.potion.key.parse()?,
            cooldown: secs("potion.cooldown_secs", self.potion.cooldown_secs)?,
            threshold_pct: self.potion.threshold_pct,
            quick_stable: secs("timing.quick_stable_secs", self.timing.quick_stable_secs)?,
            required_stable: secs(
                "timing.required_stable_secs",
                self.timing.required_stable_secs,
            )?,
            poll_interval: Duration::from_millis(self.timing.poll_interval_ms),
            process_wait: secs("timing.process_wait_secs", self.timing.process_wait_secs)?,
            memory_wait: secs("timing.memory_wait_secs", self.timing.memory_wait_secs)?,
        })
    }
}

fn secs(field: &str, value: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(value).map_err(|_| {
        Error::InvalidConfig(format!(
            "{} must be a non-negative number of seconds, got {}",
            field, value
        ))
    })
}

/// Retry waits: zero would turn a retry into a busy loop.
fn positive_secs(field: &str, value: f64) -> Result<Duration> {
    let duration = secs(field, value)?;
    if duration.is_zero() {
        return Err(Error::InvalidConfig(format!(
            "{} must be positive, got {}",
            field, value
        )));
    }
    Ok(duration)
}

/// Everything the worker needs, already validated.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerConfig {
    pub chain: PointerChain,
    pub process_name: String,
    pub window_title: String,
    pub potion_key: PotionKey,
    pub cooldown: Duration,
    pub threshold_pct: f32,
    pub quick_stable: Duration,
    pub required_stable: Duration,
    pub poll_interval: Duration,
    pub process_wait: Duration,
    pub memory_wait: Duration,
}

/// The file written by [`Settings::load_or_create`].
pub fn default_config_text() -> String {
    let d = Settings::default();
    let hops = d
        .pointer
        .hops
        .iter()
        .map(|h| format!("{:#X}", h))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"# autopot configuration

[game]
# Executable name of the game process
process_name = "{process_name}"
# Title of the game window (potions are only used while it has focus)
window_title = "{window_title}"

[pointer]
# HP pointer chain: module base + base_offset, then one dereference per hop
module = "{module}"
base_offset = 0x{base_offset:08X}
hops = [{hops}]

[potion]
# Key bound to the potion: 0-9, a-z, f1-f12, num0-num9, space, enter, tab
key = "{key}"
# Seconds between potion uses
cooldown_secs = {cooldown:?}
# Use a potion below this fraction of max HP
threshold_pct = {threshold:?}

[timing]
# Seconds a higher HP value must hold before it becomes the new max
quick_stable_secs = {quick:?}
# Seconds any HP value must hold before it replaces the max
required_stable_secs = {required:?}
# Milliseconds between HP reads
poll_interval_ms = {poll}
# Seconds between attempts to find the game process
process_wait_secs = {process_wait:?}
# Seconds between attempts to resolve the HP pointer
memory_wait_secs = {memory_wait:?}

[debug]
developer_debug = {developer_debug}
"#,
        process_name = d.game.process_name,
        window_title = d.game.window_title,
        module = d.pointer.module,
        base_offset = d.pointer.base_offset,
        hops = hops,
        key = d.potion.key,
        cooldown = d.potion.cooldown_secs,
        threshold = d.potion.threshold_pct,
        quick = d.timing.quick_stable_secs,
        required = d.timing.required_stable_secs,
        poll = d.timing.poll_interval_ms,
        process_wait = d.timing.process_wait_secs,
        memory_wait = d.timing.memory_wait_secs,
        developer_debug = d.debug.developer_debug,
    )
}
