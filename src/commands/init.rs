/*!
 * Manifest creation for `dxtpack init`
 *
 * Asks for the identity fields and entry point of an extension and writes a
 * `manifest.json` that passes validation. With `--yes` every answer comes
 * from the directory name and the defaults below.
 */

use anyhow::{bail, Context, Result};
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli_style::{print_info, print_success, section_header};
use crate::config::MANIFEST_FILE;
use crate::error::PackError;
use crate::manifest::{self, Author, McpConfig, Manifest, ServerConfig, ServerType};
use crate::output::Reporter;
use crate::pack::ManifestInitializer;
use crate::report::slug_or_fallback;

/// Everything the wizard asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitAnswers {
    pub name: String,
    pub display_name: Option<String>,
    pub version: String,
    pub description: Option<String>,
    pub author_name: String,
    pub author_email: Option<String>,
    pub server_type: ServerType,
    pub entry_point: String,
}

impl InitAnswers {
    /// Answers used by `--yes`
    pub fn defaults_for(dir: &Path) -> Self {
        let dir_name = dir
            .canonicalize()
            .ok()
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .unwrap_or_default();
        let name = slug_or_fallback(&dir_name);

        Self {
            name,
            display_name: None,
            version: "0.1.0".to_string(),
            description: None,
            author_name: "Unknown".to_string(),
            author_email: None,
            server_type: ServerType::Node,
            entry_point: default_entry_point(ServerType::Node).to_string(),
        }
    }
}

/// Conventional entry point for each server type
pub fn default_entry_point(server_type: ServerType) -> &'static str {
    match server_type {
        ServerType::Python => "server/main.py",
        ServerType::Node => "server/index.js",
        ServerType::Binary => "server/extension",
    }
}

/// Launch command for the entry point, relative to the unpacked extension
pub fn mcp_config_for(server_type: ServerType, entry_point: &str) -> McpConfig {
    let script = format!("${{__dirname}}/{}", entry_point);
    match server_type {
        ServerType::Python => McpConfig {
            command: Some("python".to_string()),
            args: vec![script],
            ..McpConfig::default()
        },
        ServerType::Node => McpConfig {
            command: Some("node".to_string()),
            args: vec![script],
            ..McpConfig::default()
        },
        ServerType::Binary => McpConfig {
            command: Some(script),
            ..McpConfig::default()
        },
    }
}

/// Build the manifest document from wizard answers
pub fn manifest_from_answers(answers: &InitAnswers) -> Manifest {
    Manifest {
        name: answers.name.clone(),
        version: answers.version.clone(),
        display_name: answers.display_name.clone(),
        description: answers.description.clone(),
        author: Some(Author {
            name: answers.author_name.clone(),
            email: answers.author_email.clone(),
            url: None,
        }),
        server: ServerConfig {
            server_type: answers.server_type,
            entry_point: answers.entry_point.clone(),
            mcp_config: Some(mcp_config_for(answers.server_type, &answers.entry_point)),
        },
        user_config: Default::default(),
        tools: Vec::new(),
        license: None,
        homepage: None,
    }
}

/// Write `manifest.json` into `dir` after checking it against the schema
pub fn write_manifest(dir: &Path, manifest: &Manifest) -> Result<PathBuf> {
    let mut json = serde_json::to_string_pretty(manifest)?;
    json.push('\n');

    if let Err(issues) = manifest::check(json.as_bytes()) {
        let listed: Vec<String> = issues.iter().map(ToString::to_string).collect();
        bail!("Generated manifest is invalid:\n  - {}", listed.join("\n  - "));
    }

    let path = dir.join(MANIFEST_FILE);
    fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// Run `dxtpack init`. Returns the written path, or `None` when the user
/// kept an existing manifest.
pub fn run_init(dir: &Path, assume_yes: bool) -> Result<Option<PathBuf>> {
    if !dir.is_dir() {
        bail!("Not a directory: {}", dir.display());
    }

    let path = dir.join(MANIFEST_FILE);
    if path.exists() {
        if assume_yes {
            bail!("{} already exists", path.display());
        }
        let overwrite = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("{} already exists. Overwrite?", MANIFEST_FILE))
            .default(false)
            .interact()?;
        if !overwrite {
            print_info("Manifest unchanged.");
            return Ok(None);
        }
    }

    let answers = if assume_yes {
        InitAnswers::defaults_for(dir)
    } else {
        prompt_answers(dir)?
    };

    let written = write_manifest(dir, &manifest_from_answers(&answers))?;
    print_success(&format!("Created {}", written.display()));
    Ok(Some(written))
}

fn prompt_answers(dir: &Path) -> Result<InitAnswers> {
    let defaults = InitAnswers::defaults_for(dir);
    let theme = ColorfulTheme::default();

    section_header("Extension Manifest");

    let name: String = Input::with_theme(&theme)
        .with_prompt("Extension name")
        .default(defaults.name)
        .validate_with(|input: &String| -> std::result::Result<(), &'static str> {
            if input.trim().is_empty() {
                Err("name must not be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let display_name: String = Input::with_theme(&theme)
        .with_prompt("Display name")
        .default(name.clone())
        .interact_text()?;

    let version: String = Input::with_theme(&theme)
        .with_prompt("Version")
        .default(defaults.version)
        .interact_text()?;

    let description: String = Input::with_theme(&theme)
        .with_prompt("Description")
        .allow_empty(true)
        .interact_text()?;

    let author_name: String = Input::with_theme(&theme)
        .with_prompt("Author name")
        .default(defaults.author_name)
        .interact_text()?;

    let author_email: String = Input::with_theme(&theme)
        .with_prompt("Author email")
        .allow_empty(true)
        .interact_text()?;

    let server_types: Vec<&str> = ServerType::ALL.iter().map(ServerType::as_str).collect();
    let selection = Select::with_theme(&theme)
        .with_prompt("Server type")
        .default(1)
        .items(&server_types)
        .interact()?;
    let server_type = ServerType::ALL[selection];

    let entry_point: String = Input::with_theme(&theme)
        .with_prompt("Entry point")
        .default(default_entry_point(server_type).to_string())
        .interact_text()?;

    Ok(InitAnswers {
        display_name: Some(display_name).filter(|d| *d != name),
        name,
        version,
        description: non_empty(description),
        author_name,
        author_email: non_empty(author_email),
        server_type,
        entry_point,
    })
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Initializer used by `pack` when the directory has no manifest
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptInitializer {
    /// Skip the confirmation and use default answers
    pub assume_yes: bool,
}

impl ManifestInitializer for PromptInitializer {
    fn create_manifest(&self, dir: &Path, reporter: &dyn Reporter) -> crate::error::Result<bool> {
        if !self.assume_yes {
            let create = Confirm::with_theme(&ColorfulTheme::default())
                .with_prompt("Create one now?")
                .default(true)
                .interact()
                .map_err(|e| PackError::Other(e.to_string()))?;
            if !create {
                return Ok(false);
            }
        }

        match run_init(dir, self.assume_yes) {
            Ok(Some(path)) => {
                reporter.log(&format!("Created {}", path.display()));
                Ok(true)
            }
            Ok(None) => Ok(false),
            Err(e) => Err(PackError::Other(format!("Failed to create manifest: {:#}", e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn answers() -> InitAnswers {
        InitAnswers {
            name: "weather".to_string(),
            display_name: Some("Weather".to_string()),
            version: "1.0.0".to_string(),
            description: Some("Forecasts".to_string()),
            author_name: "Jane".to_string(),
            author_email: None,
            server_type: ServerType::Python,
            entry_point: "server/main.py".to_string(),
        }
    }

    #[test]
    fn test_manifest_from_answers_validates() {
        let manifest = manifest_from_answers(&answers());
        let json = serde_json::to_vec(&manifest).unwrap();
        let parsed = manifest::check(&json).unwrap();
        assert_eq!(parsed, manifest);
        assert_eq!(
            parsed.server.mcp_config.unwrap().args,
            vec!["${__dirname}/server/main.py"]
        );
    }

    #[test]
    fn test_binary_entry_point_is_the_command() {
        let config = mcp_config_for(ServerType::Binary, "server/ext");
        assert_eq!(config.command.as_deref(), Some("${__dirname}/server/ext"));
        assert!(config.args.is_empty());
    }

    #[test]
    fn test_defaults_use_directory_name() {
        let parent = tempdir().unwrap();
        let dir = parent.path().join("My Cool Tool");
        fs::create_dir(&dir).unwrap();

        let defaults = InitAnswers::defaults_for(&dir);
        assert_eq!(defaults.name, "my-cool-tool");
        assert_eq!(defaults.version, "0.1.0");
        assert_eq!(defaults.entry_point, "server/index.js");
    }

    #[test]
    fn test_run_init_with_yes_writes_valid_manifest() {
        let dir = tempdir().unwrap();
        let written = run_init(dir.path(), true).unwrap().unwrap();
        assert!(manifest::validate(&written).unwrap().is_valid());

        assert!(run_init(dir.path(), true).is_err());
    }

    #[test]
    fn test_write_manifest_rejects_invalid() {
        let dir = tempdir().unwrap();
        let mut bad = answers();
        bad.version = String::new();
        assert!(write_manifest(dir.path(), &manifest_from_answers(&bad)).is_err());
        assert!(!dir.path().join(MANIFEST_FILE).exists());
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty("  ".to_string()), None);
        assert_eq!(non_empty(" a ".to_string()), Some("a".to_string()));
    }
}
