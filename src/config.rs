use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{LauncherError, Result};

/// Port the CodeLive backend listens on.
pub const DEFAULT_PORT: u16 = 2150;

pub const DEFAULT_REPO_URL: &str = "https://github.com/srcbookdev/srcbook.git";

/// Removed on its own before the rest of the install tree.
pub const DEFAULT_PRECLEAN_SUBDIR: &str = "node_modules";

const CONFIG_FILE: &str = "launcher.toml";

/// Launcher settings. Every field has a fixed default; the optional config
/// file only exists to redirect them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    pub repo_url: String,
    pub install_dir: PathBuf,
    pub preclean_subdir: String,
    pub port: u16,
    pub connectivity_url: String,
    pub connectivity_timeout_secs: u64,
    /// `pnpm --filter` selectors passed to the build step
    pub build_filters: Vec<String>,
    pub backend_command: Vec<String>,
    pub frontend_command: Vec<String>,
    pub ready_timeout_secs: u64,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            repo_url: DEFAULT_REPO_URL.into(),
            install_dir: default_install_dir(),
            preclean_subdir: DEFAULT_PRECLEAN_SUBDIR.into(),
            port: DEFAULT_PORT,
            connectivity_url: "https://www.google.com".into(),
            connectivity_timeout_secs: 10,
            build_filters: vec!["./packages/*".into()],
            backend_command: ["pnpm", "--filter", "api", "dev"].map(String::from).to_vec(),
            frontend_command: ["pnpm", "--filter", "web", "dev"].map(String::from).to_vec(),
            ready_timeout_secs: 60,
        }
    }
}

fn default_install_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("codelive")
}

/// `<config_dir>/codelive/launcher.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("codelive").join(CONFIG_FILE))
}

impl LauncherConfig {
    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, the default location is
    /// read if present and fixed defaults are used otherwise.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => {
                    log::debug!("No launcher config found, using defaults");
                    Self::default()
                }
            },
        };

        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| LauncherError::Config(format!("failed to read {}: {e}", path.display())))?;
        let config = Self::parse(&content)
            .map_err(|e| LauncherError::Config(format!("{}: {e}", path.display())))?;
        log::info!("Using launcher config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Self::parse(content).map_err(|e| LauncherError::Config(e.to_string()))
    }

    fn parse(content: &str) -> Result<Self, toml::de::Error> {
        let mut config: Self = toml::from_str(content)?;
        config.install_dir = expand_tilde(config.install_dir);
        Ok(config)
    }

    /// Environment overrides: `CODELIVE_INSTALL_DIR` and `CODELIVE_READY_TIMEOUT` (seconds).
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup("CODELIVE_INSTALL_DIR").filter(|d| !d.is_empty()) {
            self.install_dir = expand_tilde(PathBuf::from(dir));
        }
        if let Some(secs) = lookup("CODELIVE_READY_TIMEOUT").and_then(|s| s.parse::<u64>().ok()) {
            self.ready_timeout_secs = secs;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.repo_url.trim().is_empty() {
            return Err(LauncherError::Config("repo_url must not be empty".into()));
        }
        if self.backend_command.is_empty() || self.frontend_command.is_empty() {
            return Err(LauncherError::Config(
                "backend_command and frontend_command must name a program".into(),
            ));
        }
        if self.port == 0 {
            return Err(LauncherError::Config("port must be non-zero".into()));
        }
        check_install_dir(&self.install_dir, dirs::home_dir().as_deref())?;
        let subdir = Path::new(&self.preclean_subdir);
        if subdir.is_absolute() || subdir.components().any(|c| c.as_os_str() == "..") {
            return Err(LauncherError::Config(
                "preclean_subdir must be a path inside the install directory".into(),
            ));
        }
        Ok(())
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_secs(self.ready_timeout_secs)
    }

    pub fn connectivity_timeout(&self) -> Duration {
        Duration::from_secs(self.connectivity_timeout_secs)
    }
}

/// The install step deletes `dir` recursively, so it must be a directory of
/// its own: not a filesystem root, and not the home directory or any parent.
fn check_install_dir(dir: &Path, home: Option<&Path>) -> Result<()> {
    if dir.parent().is_none() {
        return Err(LauncherError::Config(format!(
            "install_dir {} must not be a filesystem root",
            dir.display()
        )));
    }
    if let Some(home) = home
        && home.starts_with(dir)
    {
        return Err(LauncherError::Config(format!(
            "install_dir {} would contain the home directory",
            dir.display()
        )));
    }
    Ok(())
}

fn expand_tilde(path: PathBuf) -> PathBuf {
    if let (Ok(rest), Some(home)) = (path.strip_prefix("~"), dirs::home_dir()) {
        return home.join(rest);
    }
    path
}
