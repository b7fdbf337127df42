//! Configuration vault: reads and writes `~/.plastey/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use plastey_middleware::transport::DEFAULT_MAX_MESSAGE_BYTES;
use plastey_runtime::SessionConfig;
use plastey_types::{MountMode, PlasteyError};
use serde::{Deserialize, Serialize};

/// Which end of the peer link this process is, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Offline,
    Server,
    Client,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Offline => write!(f, "offline"),
            Role::Server => write!(f, "server"),
            Role::Client => write!(f, "client"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "offline" => Ok(Role::Offline),
            "server" => Ok(Role::Server),
            "client" => Ok(Role::Client),
            other => Err(format!("unknown role `{other}`")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub role: Role,
    /// Address the server listens on.
    pub this_host: String,
    pub this_port: u16,
    /// Address the client connects to.
    pub other_host: String,
    pub other_port: u16,
    /// Connect, read and write timeout.
    pub timeout_ms: u64,
    /// How long to keep waiting for the peer to show up.  Zero waits until
    /// Ctrl-C.
    pub connect_patience_ms: u64,
    pub max_message_bytes: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            role: Role::default(),
            this_host: "0.0.0.0".to_string(),
            this_port: 7717,
            other_host: "127.0.0.1".to_string(),
            other_port: 7717,
            timeout_ms: 2000,
            connect_patience_ms: 30_000,
            max_message_bytes: DEFAULT_MAX_MESSAGE_BYTES,
        }
    }
}

/// Size of the simulated sculpting surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshConfig {
    pub cols: u32,
    pub rows: u32,
    pub spacing: f32,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            cols: 9,
            rows: 9,
            spacing: 4.0,
        }
    }
}

/// Persisted user configuration stored in `~/.plastey/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Seconds a status message stays on the HUD.
    #[serde(default = "default_hud_interval")]
    pub hud_interval: f64,

    /// Recorded tracking frames to play back.  The built-in demo script runs
    /// when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replay: Option<PathBuf>,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub mesh: MeshConfig,
}

fn default_hud_interval() -> f64 {
    5.0
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hud_interval: default_hud_interval(),
            replay: None,
            session: SessionConfig::default(),
            network: NetworkConfig::default(),
            mesh: MeshConfig::default(),
        }
    }
}

/// Return the path to `~/.plastey/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".plastey").join("config.toml")
}

/// How [`resolve`] came by the configuration it returned.
#[derive(Debug)]
pub enum Origin {
    Loaded,
    /// No file existed; the defaults were written, unless saving failed.
    Created(Option<PlasteyError>),
    /// The file could not be read or parsed; the defaults are used.
    Fallback(PlasteyError),
}

/// Load the config at `path`, writing the defaults when it is missing and
/// falling back to them when it is unreadable.  Environment overrides are
/// applied last, whichever way the config was obtained.
pub fn resolve(path: &Path) -> (Config, Origin) {
    let (mut cfg, origin) = match load_from(path) {
        Ok(Some(cfg)) => (cfg, Origin::Loaded),
        Ok(None) => {
            let cfg = Config::default();
            let saved = save_to(&cfg, path).err();
            (cfg, Origin::Created(saved))
        }
        Err(e) => (Config::default(), Origin::Fallback(e)),
    };
    apply_env_overrides(&mut cfg);
    (cfg, origin)
}

/// Parse the config file.  Returns `None` if the file does not exist.
pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, PlasteyError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| config_err(format!("failed to read {}: {e}", path.display())))?;
    let cfg = toml::from_str(&raw).map_err(|e| config_err(format!("failed to parse config: {e}")))?;
    Ok(Some(cfg))
}

/// Apply `PLASTEY_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `PLASTEY_ROLE` | `network.role` |
/// | `PLASTEY_THIS_PORT` | `network.this_port` |
/// | `PLASTEY_OTHER_HOST` | `network.other_host` |
/// | `PLASTEY_OTHER_PORT` | `network.other_port` |
/// | `PLASTEY_MOUNT` | `session.mount` (`desk` or `head`) |
/// | `PLASTEY_REPLAY` | `replay` |
///
/// Unparseable values are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("PLASTEY_ROLE")
        && let Ok(role) = v.parse()
    {
        cfg.network.role = role;
    }
    if let Ok(v) = std::env::var("PLASTEY_THIS_PORT")
        && let Ok(port) = v.parse::<u16>()
    {
        cfg.network.this_port = port;
    }
    if let Ok(v) = std::env::var("PLASTEY_OTHER_HOST") {
        cfg.network.other_host = v;
    }
    if let Ok(v) = std::env::var("PLASTEY_OTHER_PORT")
        && let Ok(port) = v.parse::<u16>()
    {
        cfg.network.other_port = port;
    }
    if let Ok(v) = std::env::var("PLASTEY_MOUNT") {
        match v.trim().to_ascii_lowercase().as_str() {
            "desk" => cfg.session.mount = MountMode::Desk,
            "head" => cfg.session.mount = MountMode::Head,
            _ => {}
        }
    }
    if let Ok(v) = std::env::var("PLASTEY_REPLAY") {
        cfg.replay = Some(PathBuf::from(v));
    }
}

/// Save the config to disk, creating the parent directory if necessary.
pub(crate) fn save_to(cfg: &Config, path: &Path) -> Result<(), PlasteyError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| config_err(format!("failed to create config directory: {e}")))?;
        // Owner-only (rwx------) on Unix.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))
                .map_err(|e| config_err(format!("failed to set config directory permissions: {e}")))?;
        }
    }
    let raw = toml::to_string_pretty(cfg).map_err(|e| config_err(format!("failed to serialize config: {e}")))?;
    #[cfg(unix)]
    {
        use std::io::Write;
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| f.write_all(raw.as_bytes()))
            .map_err(|e| config_err(format!("failed to write {}: {e}", path.display())))?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw).map_err(|e| config_err(format!("failed to write {}: {e}", path.display())))?;
    Ok(())
}

fn config_err(message: String) -> PlasteyError {
    PlasteyError::Config(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use plastey_runtime::GestureMode;
    use std::sync::Mutex;

    /// Serializes the tests that touch `PLASTEY_*` variables.
    static ENV: Mutex<()> = Mutex::new(());

    fn with_env<R>(vars: &[(&str, &str)], body: impl FnOnce() -> R) -> R {
        let _guard = ENV.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        // SAFETY: every test that reads or writes these variables holds `ENV`.
        unsafe {
            for (key, value) in vars {
                std::env::set_var(key, value);
            }
        }
        let result = body();
        unsafe {
            for (key, _) in vars {
                std::env::remove_var(key);
            }
        }
        result
    }

    #[cfg(unix)]
    #[test]
    fn config_file_has_restrictive_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        save_to(&Config::default(), &path).expect("save");

        let file_mode = fs::metadata(&path).expect("file metadata").permissions().mode() & 0o777;
        assert_eq!(file_mode, 0o600);
        let dir_mode = fs::metadata(path.parent().unwrap()).expect("dir metadata").permissions().mode() & 0o777;
        assert_eq!(dir_mode, 0o700);
    }

    #[test]
    fn roundtrip_default_config() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        save_to(&Config::default(), &path).expect("save");

        let loaded = load_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded.session.history_capacity, 64);
        assert_eq!(loaded.session.gesture.swipe_distance, 135.0);
        assert_eq!(loaded.network.timeout_ms, 2000);
        assert_eq!(loaded.network.connect_patience_ms, 30_000);
        assert_eq!(loaded.mesh, MeshConfig::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "hud_interval = 2.5\n\n[session.gesture]\nmode = \"pinch\"\n\n[network]\nrole = \"client\"\n",
        )
        .unwrap();

        let cfg = load_from(&path).expect("load ok").expect("some");
        assert_eq!(cfg.hud_interval, 2.5);
        assert_eq!(cfg.session.gesture.mode, GestureMode::Pinch);
        assert_eq!(cfg.session.gesture.pick_hold_distance, 3.5);
        assert_eq!(cfg.network.role, Role::Client);
        assert_eq!(cfg.network.other_port, 7717);
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "hud_interval = \"soon\"").unwrap();
        assert!(matches!(load_from(&path), Err(PlasteyError::Config(_))));
    }

    #[test]
    fn config_path_points_to_plastey_dir() {
        let p = config_path_for_home("/home/sculptor");
        assert!(p.to_string_lossy().contains(".plastey"));
        assert!(p.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn load_from_returns_none_when_missing() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        assert!(load_from(&path).expect("no error").is_none());
    }

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!("Server".parse::<Role>(), Ok(Role::Server));
        assert!("peer".parse::<Role>().is_err());
    }

    #[test]
    fn apply_env_overrides_changes_network() {
        let vars = [
            ("PLASTEY_ROLE", "server"),
            ("PLASTEY_OTHER_HOST", "10.0.0.2"),
            ("PLASTEY_OTHER_PORT", "not-a-port"),
        ];
        let cfg = with_env(&vars, || {
            let mut cfg = Config::default();
            apply_env_overrides(&mut cfg);
            cfg
        });
        assert_eq!(cfg.network.role, Role::Server);
        assert_eq!(cfg.network.other_host, "10.0.0.2");
        assert_eq!(cfg.network.other_port, 7717);
    }

    #[test]
    fn apply_env_overrides_changes_mount_and_replay() {
        let vars = [("PLASTEY_MOUNT", "HEAD"), ("PLASTEY_REPLAY", "/tmp/session.ndjson")];
        let cfg = with_env(&vars, || {
            let mut cfg = Config::default();
            apply_env_overrides(&mut cfg);
            cfg
        });
        assert_eq!(cfg.session.mount, MountMode::Head);
        assert_eq!(cfg.replay, Some(PathBuf::from("/tmp/session.ndjson")));
    }

    #[test]
    fn resolve_applies_overrides_even_to_a_broken_file() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "hud_interval = \"soon\"").unwrap();

        let (cfg, origin) = with_env(&[("PLASTEY_MOUNT", "head"), ("PLASTEY_ROLE", "client")], || resolve(&path));
        assert!(matches!(origin, Origin::Fallback(PlasteyError::Config(_))), "{origin:?}");
        assert_eq!(cfg.session.mount, MountMode::Head);
        assert_eq!(cfg.network.role, Role::Client);
    }

    #[test]
    fn resolve_writes_plain_defaults_then_overrides() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        let (cfg, origin) = with_env(&[("PLASTEY_ROLE", "server")], || resolve(&path));
        assert!(matches!(origin, Origin::Created(None)), "{origin:?}");
        assert_eq!(cfg.network.role, Role::Server);

        let written = load_from(&path).expect("load ok").expect("some");
        assert_eq!(written.network.role, Role::Offline, "overrides are not persisted");
    }
}
