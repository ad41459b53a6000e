//! Settings file persistence.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use mapscrip_core::Settings;

const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug)]
pub struct Storage {
    path: PathBuf,
}

impl Storage {
    pub fn open(dir: impl AsRef<Path>) -> anyhow::Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("create settings dir {}", dir.display()))?;
        Ok(Self {
            path: dir.join(SETTINGS_FILE),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file gives defaults. A file that does not parse is reported
    /// in the log and replaced by defaults rather than stopping startup.
    pub fn load_settings(&self) -> anyhow::Result<Settings> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                log::info!("no settings at {}, using defaults", self.path.display());
                return Ok(Settings::default());
            }
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("read settings {}", self.path.display()));
            }
        };

        let mut settings = serde_json::from_str::<Settings>(&raw).unwrap_or_else(|err| {
            log::warn!(
                "ignoring unreadable settings {}: {err}",
                self.path.display()
            );
            Settings::default()
        });
        settings.normalize();
        Ok(settings)
    }

    pub fn save_settings(&self, settings: &Settings) -> anyhow::Result<()> {
        let mut settings = settings.clone();
        settings.normalize();
        let json = serde_json::to_string_pretty(&settings)?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).with_context(|| format!("write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("replace settings {}", self.path.display()))?;
        Ok(())
    }
}
