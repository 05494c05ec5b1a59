// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration loading from files.
//!
//! Handles loading configuration from JSON and YAML files in various locations.

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

use super::types::WorkflowConfig;

/// Config file names to search for (in order).
pub const CONFIG_FILES: &[&str] = &[".giga.json", ".giga/config.json", "giga.config.json"];

/// Local config file name (for per-directory overrides).
pub const LOCAL_CONFIG_FILE: &str = ".giga.local.json";

/// Global config directory name.
pub const GLOBAL_CONFIG_DIR: &str = ".giga";

/// Global config file name.
pub const GLOBAL_CONFIG_FILE: &str = "config.json";

/// Get the global config directory path.
pub fn get_global_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(GLOBAL_CONFIG_DIR))
}

/// Get the global config file path.
pub fn get_global_config_path() -> Option<PathBuf> {
    get_global_config_dir().map(|dir| dir.join(GLOBAL_CONFIG_FILE))
}

/// Load global configuration from ~/.giga/config.json.
pub fn load_global_config() -> Result<Option<WorkflowConfig>, ConfigError> {
    let path = match get_global_config_path() {
        Some(p) => p,
        None => return Ok(None),
    };

    load_optional(&path)
}

/// Load workspace configuration from the workspace root.
///
/// Searches for config files in the following order:
/// 1. .giga.json
/// 2. .giga/config.json
/// 3. giga.config.json
pub fn load_workspace_config(workspace_root: &Path) -> Result<Option<WorkflowConfig>, ConfigError> {
    for filename in CONFIG_FILES {
        let path = workspace_root.join(filename);
        if path.exists() {
            return load_config_file(&path).map(Some);
        }
    }
    Ok(None)
}

/// Load local configuration from .giga.local.json.
pub fn load_local_config(workspace_root: &Path) -> Result<Option<WorkflowConfig>, ConfigError> {
    load_optional(&workspace_root.join(LOCAL_CONFIG_FILE))
}

fn load_optional(path: &Path) -> Result<Option<WorkflowConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    load_config_file(path).map(Some)
}

/// Load a configuration file (JSON or YAML).
pub fn load_config_file(path: &Path) -> Result<WorkflowConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&content).map_err(ConfigError::from),
        _ => serde_json::from_str(&content).map_err(ConfigError::from),
    }
}

/// Save workspace configuration to a file.
pub fn save_workspace_config(
    workspace_root: &Path,
    config: &WorkflowConfig,
    filename: Option<&str>,
) -> Result<PathBuf, ConfigError> {
    let filename = filename.unwrap_or(CONFIG_FILES[0]);
    let path = workspace_root.join(filename);

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(&path, content)?;

    Ok(path)
}

/// Initialize a new config file with default or provided configuration.
pub fn init_config(
    workspace_root: &Path,
    config: Option<WorkflowConfig>,
) -> Result<PathBuf, ConfigError> {
    let config = config.unwrap_or_else(get_example_config);
    save_workspace_config(workspace_root, &config, None)
}

/// Find the workspace root by searching for config files.
///
/// Walks up the directory tree from `start` until it finds a directory
/// containing a config file or reaches the filesystem root.
pub fn find_workspace_root(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        if CONFIG_FILES.iter().any(|f| current.join(f).exists()) {
            return Some(current);
        }

        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => return None,
        }
    }
}

/// Get an example configuration.
pub fn get_example_config() -> WorkflowConfig {
    WorkflowConfig {
        runner_url: Some(crate::runner::DEFAULT_RUNNER_URL.to_string()),
        default_cli: Some(crate::types::CliType::Claude),
        default_model: Some(crate::types::DEFAULT_MODEL.to_string()),
        allowed_tools: Some(vec![
            "Read".to_string(),
            "Glob".to_string(),
            "Grep".to_string(),
        ]),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CliType;
    use tempfile::TempDir;

    #[test]
    fn test_config_files_order() {
        assert_eq!(CONFIG_FILES.len(), 3);
        assert_eq!(CONFIG_FILES[0], ".giga.json");
    }

    #[test]
    fn test_global_config_dir() {
        if let Some(dir) = get_global_config_dir() {
            assert!(dir.ends_with(".giga"));
        }
    }

    #[test]
    fn test_load_workspace_config_not_found() {
        let temp = TempDir::new().unwrap();
        let result = load_workspace_config(temp.path());
        assert!(result.unwrap().is_none());
    }

    #[test]
    fn test_load_workspace_config_json() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(".giga.json"),
            r#"{"runnerUrl": "http://runner:4000", "defaultCli": "grok"}"#,
        )
        .unwrap();

        let config = load_workspace_config(temp.path()).unwrap().unwrap();
        assert_eq!(config.runner_url.as_deref(), Some("http://runner:4000"));
        assert_eq!(config.default_cli, Some(CliType::Grok));
    }

    #[test]
    fn test_load_config_file_yaml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("workflow.yaml");
        std::fs::write(&path, "defaultModel: opus\nallowedTools:\n  - Read\n  - Edit\n").unwrap();

        let config = load_config_file(&path).unwrap();
        assert_eq!(config.default_model.as_deref(), Some("opus"));
        assert_eq!(
            config.allowed_tools,
            Some(vec!["Read".to_string(), "Edit".to_string()])
        );
    }

    #[test]
    fn test_load_invalid_json() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(".giga.json"), "{not json").unwrap();
        assert!(matches!(
            load_workspace_config(temp.path()),
            Err(ConfigError::JsonError(_))
        ));
    }

    #[test]
    fn test_save_into_config_dir() {
        let temp = TempDir::new().unwrap();
        let config = WorkflowConfig {
            reject_cycles: Some(true),
            ..Default::default()
        };

        let saved = save_workspace_config(temp.path(), &config, Some(".giga/config.json")).unwrap();
        assert!(saved.exists());
        assert_eq!(load_workspace_config(temp.path()).unwrap(), Some(config));
    }

    #[test]
    fn test_find_workspace_root() {
        let temp = TempDir::new().unwrap();
        let subdir = temp.path().join("a").join("b").join("c");
        std::fs::create_dir_all(&subdir).unwrap();

        // Create config in temp root
        std::fs::write(temp.path().join(".giga.json"), "{}").unwrap();

        let found = find_workspace_root(&subdir);
        assert_eq!(found.unwrap(), temp.path());
    }

    #[test]
    fn test_init_config() {
        let temp = TempDir::new().unwrap();
        let path = init_config(temp.path(), None).unwrap();
        assert_eq!(path.file_name().unwrap(), ".giga.json");

        let written = load_config_file(&path).unwrap();
        assert_eq!(written, get_example_config());
    }
}
