//! Configuration discovery and effective settings resolution.
//!
//! cfgsplice reads `cfgsplice.toml|yaml|yml` from the project root (the
//! closest ancestor holding a config file or a `.git` directory) and merges it
//! with CLI flags to produce an `Effective` config.
//! Defaults:
//! - `output`: `human`
//! - `log`: `warn`
//! - `preserve`: empty
//!
//! Overrides precedence: CLI > config file > defaults.

use crate::error::ConfigError;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Config file names, in lookup order.
pub const CONFIG_FILES: [&str; 3] = ["cfgsplice.toml", "cfgsplice.yaml", "cfgsplice.yml"];

#[derive(Debug, Default, Deserialize, Clone)]
/// Root configuration loaded from `cfgsplice.toml|yaml`.
pub struct CfgspliceConfig {
    pub output: Option<String>,
    pub log: Option<String>,
    /// Section name -> child keys preserved by default (`[preserve]`).
    #[serde(default)]
    pub preserve: HashMap<String, Vec<String>>,
}

#[derive(Debug, Clone)]
/// Fully-resolved configuration used by commands after applying precedence.
pub struct Effective {
    pub root: PathBuf,
    pub config_file: Option<PathBuf>,
    pub output: String,
    pub log: String,
    pub preserve: HashMap<String, Vec<String>>,
    /// Set when a config file was found but could not be loaded.
    pub load_error: Option<String>,
}

impl Effective {
    /// Default preserved child keys for `section`.
    pub fn preserve_for(&self, section: &str) -> &[String] {
        self.preserve
            .get(section)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Walk upward from `start` to detect the project root.
///
/// Stops when a `cfgsplice.toml|yaml|yml` or a `.git` directory is found.
pub fn detect_root(start: &Path) -> PathBuf {
    let mut cur = start;
    loop {
        if CONFIG_FILES.iter().any(|f| cur.join(f).exists()) || cur.join(".git").exists() {
            return cur.to_path_buf();
        }
        match cur.parent() {
            Some(p) => cur = p,
            None => return start.to_path_buf(),
        }
    }
}

/// First config file present in `root`.
pub fn find_config(root: &Path) -> Option<PathBuf> {
    CONFIG_FILES
        .iter()
        .map(|f| root.join(f))
        .find(|p| p.is_file())
}

/// Load the config file from `root`, if any.
pub fn load_config(root: &Path) -> Result<Option<(PathBuf, CfgspliceConfig)>, ConfigError> {
    let Some(path) = find_config(root) else {
        return Ok(None);
    };
    let s = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    let cfg = if path.extension().is_some_and(|e| e == "toml") {
        toml::from_str(&s)?
    } else {
        serde_yaml::from_str(&s)?
    };
    Ok(Some((path, cfg)))
}

/// Resolve `Effective` by merging CLI flags, discovered config, and defaults.
/// A config file that fails to load is recorded in `load_error` and ignored.
pub fn resolve_effective(start: &Path, cli_output: Option<&str>) -> Effective {
    let root = detect_root(start);
    let (config_file, cfg, load_error) = match load_config(&root) {
        Ok(Some((path, cfg))) => (Some(path), cfg, None),
        Ok(None) => (None, CfgspliceConfig::default(), None),
        Err(e) => (find_config(&root), CfgspliceConfig::default(), Some(e.to_string())),
    };

    let output = cli_output
        .map(|s| s.to_string())
        .or(cfg.output)
        .unwrap_or_else(|| "human".to_string());
    let log = cfg.log.unwrap_or_else(|| "warn".to_string());

    Effective {
        root,
        config_file,
        output,
        log,
        preserve: cfg.preserve,
        load_error,
    }
}

/// Append the keys of `extra` missing from `keys`, keeping first-seen order.
pub fn merge_preserve(keys: &mut Vec<String>, extra: &[String]) {
    for k in extra {
        if !keys.contains(k) {
            keys.push(k.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_detect_and_load_toml() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let mut f = fs::File::create(root.join("cfgsplice.toml")).unwrap();
        writeln!(
            f,
            "{}",
            r#"
output = "json"
log = "debug"
[preserve]
appearance = ["dashboard"]
    "#
        )
        .unwrap();

        let nested = root.join("conf").join("deep");
        fs::create_dir_all(&nested).unwrap();
        let eff = resolve_effective(&nested, None);
        assert_eq!(eff.root, root);
        assert_eq!(eff.output, "json");
        assert_eq!(eff.log, "debug");
        assert_eq!(eff.preserve_for("appearance"), ["dashboard".to_string()]);
        assert!(eff.preserve_for("general").is_empty());
        assert!(eff.load_error.is_none());
    }

    #[test]
    fn test_load_yaml_and_defaults() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("cfgsplice.yaml"), "output: human\n").unwrap();

        let eff = resolve_effective(root, None);
        assert_eq!(eff.output, "human");
        assert_eq!(eff.log, "warn");
        assert!(eff.preserve.is_empty());
        assert_eq!(eff.config_file, Some(root.join("cfgsplice.yaml")));
    }

    #[test]
    fn test_cli_precedence() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("cfgsplice.toml"), "output = \"json\"\n").unwrap();
        let eff = resolve_effective(root, Some("human"));
        assert_eq!(eff.output, "human");
    }

    #[test]
    fn test_git_dir_stops_walk() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join(".git")).unwrap();
        let sub = root.join("a");
        fs::create_dir_all(&sub).unwrap();
        assert_eq!(detect_root(&sub), root);
        let eff = resolve_effective(&sub, None);
        assert!(eff.config_file.is_none());
        assert_eq!(eff.output, "human");
    }

    #[test]
    fn test_malformed_config_falls_back() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("cfgsplice.toml"), "output = [unclosed\n").unwrap();
        assert!(matches!(load_config(root), Err(ConfigError::Toml(_))));

        let eff = resolve_effective(root, None);
        assert_eq!(eff.output, "human");
        assert!(eff.load_error.is_some());
    }

    #[test]
    fn test_merge_preserve_union() {
        let mut keys = vec!["dashboard".to_string()];
        merge_preserve(&mut keys, &["widgets".to_string(), "dashboard".to_string()]);
        assert_eq!(keys, vec!["dashboard".to_string(), "widgets".to_string()]);
    }
}
