use std::{
    env,
    fs::File,
    io,
    path::{Path, PathBuf},
};

use cadence_core::{error::Error, view::RowClasses};
use platform_dirs::AppDirs;
use serde::Deserialize;

const APP_NAME: &str = "Cadence";
const CONFIG_FILENAME: &str = "config.json";
const CONFIG_ENV_VAR: &str = "CADENCE_CONFIG";

#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// JSON array of songs to list when none is given on the command line.
    pub library: Option<PathBuf>,
    pub playing_class: String,
    pub paused_class: String,
}

impl Default for Config {
    fn default() -> Self {
        let classes = RowClasses::default();
        Self {
            library: None,
            playing_class: classes.playing,
            paused_class: classes.paused,
        }
    }
}

impl Config {
    fn app_dirs() -> Option<AppDirs> {
        const USE_XDG_ON_MACOS: bool = false;

        AppDirs::new(Some(APP_NAME), USE_XDG_ON_MACOS)
    }

    pub fn config_dir() -> Option<PathBuf> {
        Self::app_dirs().map(|dirs| dirs.config_dir)
    }

    /// `$CADENCE_CONFIG` if set, otherwise `config.json` in the platform
    /// config directory.
    pub fn config_path() -> Option<PathBuf> {
        match env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Some(PathBuf::from(path)),
            None => Self::config_dir().map(|dir| dir.join(CONFIG_FILENAME)),
        }
    }

    pub fn load() -> Result<Option<Config>, Error> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(None),
        }
    }

    /// `Ok(None)` when there is no file at `path`.
    pub fn load_from(path: &Path) -> Result<Option<Config>, Error> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        log::info!("loading config: {:?}", path);
        Ok(Some(serde_json::from_reader(file)?))
    }

    pub fn row_classes(&self) -> RowClasses {
        RowClasses {
            playing: self.playing_class.clone(),
            paused: self.paused_class.clone(),
        }
    }
}
