// src/models.rs

use crate::core::placeholder;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write;
use std::fs;
use std::io;
use std::path::PathBuf;

// --- TARGETS (what discovery modules produce) ---

/// A single selectable entry produced by a discovery module.
///
/// The serialized field names are the on-disk cache format and must stay stable.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Target {
    pub provider_name: String,
    pub provider_type: String,
    pub id: String,
    pub display_name: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub web: String,
    /// Placeholder template. Never stored resolved.
    #[serde(default)]
    pub start_directory: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Values the owning module needs after selection. Never rendered in previews.
    #[serde(default)]
    pub module_context: BTreeMap<String, String>,
}

impl Target {
    /// The start directory with `name`, `displayName` and context placeholders expanded,
    /// but `~` and environment variables left untouched.
    pub fn start_directory_template(&self) -> String {
        let template = if self.start_directory.is_empty() {
            "~"
        } else {
            self.start_directory.as_str()
        };

        let mut pairs: Vec<(&str, &str)> = vec![
            ("name", self.name.as_str()),
            ("displayName", self.display_name.as_str()),
        ];
        pairs.extend(self.context.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        placeholder::expand_all(template, &pairs)
    }

    /// Fully resolved start directory: placeholders, `~` and `$VARS` expanded.
    pub fn resolve_start_directory(&self) -> PathBuf {
        let template = self.start_directory_template();
        let expanded = match shellexpand::full(&template) {
            Ok(value) => value.into_owned(),
            Err(e) => {
                log::debug!("Could not expand variables in '{}': {}", template, e);
                shellexpand::tilde(&template).into_owned()
            }
        };
        PathBuf::from(expanded)
    }

    /// Creates the start directory when the target points somewhere that does not exist yet.
    pub fn create_start_directory_if_missing(&self) -> io::Result<()> {
        if self.start_directory.is_empty() || self.start_directory == "~" {
            return Ok(());
        }

        let dir = self.resolve_start_directory();
        if !dir.exists() {
            log::debug!("Creating missing start directory '{}'", dir.display());
            fs::create_dir_all(&dir)?;
        }
        Ok(())
    }

    /// Expands every `{{key}}` / `{{!key}}` placeholder known for this target.
    ///
    /// Lookup order: `id`, `name`, `displayName`, `startDirectory`, module context, context.
    pub fn resolve_placeholders(&self, input: &str) -> String {
        let start_directory = self.resolve_start_directory().to_string_lossy().to_string();

        let mut pairs: Vec<(&str, &str)> = vec![
            ("id", self.id.as_str()),
            ("name", self.name.as_str()),
            ("displayName", self.display_name.as_str()),
            ("startDirectory", start_directory.as_str()),
        ];
        pairs.extend(
            self.module_context
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str())),
        );
        pairs.extend(self.context.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        placeholder::expand_all(input, &pairs)
    }

    /// Adds a tag unless it is already present.
    pub fn add_tag(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
    }

    /// Renders the detail view shown next to the finder.
    pub fn render_preview(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# {}\n", self.display_name);
        let _ = writeln!(
            out,
            "Provider: {} [TYPE: {}]",
            self.provider_name, self.provider_type
        );
        let _ = writeln!(
            out,
            "Directory: {} [{}]",
            self.resolve_start_directory().display(),
            self.start_directory
        );

        if !self.tags.is_empty() {
            out.push_str("\nTags:\n");
            for tag in &self.tags {
                let _ = writeln!(out, "- {}", tag);
            }
        }

        let visible: Vec<_> = self
            .context
            .iter()
            .filter(|(k, _)| k.as_str() != "preview" && k.as_str() != "description")
            .collect();
        if !visible.is_empty() {
            out.push_str("\nContext:\n");
            for (key, value) in visible {
                let _ = writeln!(out, "  {}: {}", key, value);
            }
        }

        if !self.web.is_empty() {
            let _ = writeln!(out, "\nURL: {}", self.web);
        }

        let description = if self.description.is_empty() {
            self.context.get("description").map(String::as_str).unwrap_or("")
        } else {
            self.description.as_str()
        };
        if !description.is_empty() {
            let _ = writeln!(out, "\n\n{}", description);
        }

        if let Some(preview) = self.context.get("preview") {
            let _ = writeln!(out, "\n{}", preview);
        }

        out
    }
}

/// A column of the tabular export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub key: String,
    pub name: String,
    pub hidden: bool,
}

impl Column {
    pub fn new(key: &str, name: &str) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
            hidden: false,
        }
    }

    pub fn hidden(key: &str, name: &str) -> Self {
        Self {
            hidden: true,
            ..Self::new(key, name)
        }
    }

    /// Columns every module shares.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("module", "Module"),
            Self::hidden("id", "ID"),
            Self::hidden("name", "Name"),
            Self::new("display_name", "Display Name"),
        ]
    }
}

// --- LAYOUTS (what the user declares) ---

/// A named template describing which windows/apps to start for a target.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct Layout {
    #[serde(default)]
    pub apps: Vec<App>,
    /// At least one must match for the layout to be auto-selected.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<String>,
    /// Compositor backends only: close every window of the workspace first.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub clear_workspace: bool,
}

/// One window's worth of commands.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct App {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<Command>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub default: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<String>,
    /// Launch directly instead of inside a terminal emulator.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub gui: bool,
    /// Only the first matching app of a group survives filtering.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub group: String,
}

impl App {
    pub fn command_templates(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().map(|c| c.command.as_str())
    }
}

/// A command template, optionally guarded by rules.
///
/// Accepts either a plain string or `{ command, rules }` in YAML.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(from = "CommandDef")]
pub struct Command {
    pub command: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<String>,
}

impl Command {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            rules: Vec::new(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CommandDef {
    Simple(String),
    Extended {
        command: String,
        #[serde(default)]
        rules: Vec<String>,
    },
}

impl From<CommandDef> for Command {
    fn from(def: CommandDef) -> Self {
        match def {
            CommandDef::Simple(command) => Self {
                command,
                rules: Vec::new(),
            },
            CommandDef::Extended { command, rules } => Self { command, rules },
        }
    }
}

// --- CONFIGURATION FILE MODELS ---

/// Represents the deserialized `muxpick.yaml` (optionally merged with `muxpick.user.yaml`).
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub modules: Vec<ModuleConfig>,
    /// Sorted by name, which makes layout auto-detection deterministic.
    #[serde(default)]
    pub layouts: BTreeMap<String, Layout>,
    #[serde(default)]
    pub finder: FinderConfig,
    #[serde(default)]
    pub tmux: TmuxConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FinderKind {
    /// `fzf` when it is on `PATH`, the embedded picker otherwise.
    #[default]
    Auto,
    Fzf,
    Embedded,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct FinderConfig {
    #[serde(default)]
    pub executable: FinderKind,
    #[serde(default = "default_true")]
    pub preview: bool,
    #[serde(default = "default_fzf_delimiter")]
    pub fzf_delimiter: String,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            executable: FinderKind::Auto,
            preview: true,
            fzf_delimiter: default_fzf_delimiter(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_fzf_delimiter() -> String {
    "\x1F".to_string()
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct TmuxConfig {
    /// Must match the `base-index` option of the tmux server.
    #[serde(default = "default_base_index")]
    pub base_index: u32,
}

impl Default for TmuxConfig {
    fn default() -> Self {
        Self {
            base_index: default_base_index(),
        }
    }
}

fn default_base_index() -> u32 {
    1
}

/// Discovery module configuration, discriminated by its `type` field.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ModuleConfig {
    Project(ProjectModuleConfig),
    Ssh(SshModuleConfig),
    Static(StaticModuleConfig),
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct ProjectModuleConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub directories: Vec<SourceDirectory>,
    /// Files or directories that mark a project root, e.g. ".git".
    #[serde(default)]
    pub checks: Vec<String>,
    #[serde(default)]
    pub display_format: ProjectDisplayFormat,
    #[serde(default)]
    pub start_directory: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SourceDirectory {
    pub path: String,
    #[serde(default = "default_depth")]
    pub depth: usize,
    /// Regular expressions matched against directory names.
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_depth() -> usize {
    1
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProjectDisplayFormat {
    #[default]
    Base,
    Relative,
    Absolute,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct SshModuleConfig {
    #[serde(default)]
    pub name: Option<String>,
    /// Defaults to `~/.ssh/config`.
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub start_directory: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct StaticModuleConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub options: Vec<StaticEntry>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct StaticEntry {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub web: String,
    #[serde(default)]
    pub start_directory: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Overrides the layout picked for this entry.
    #[serde(default)]
    pub layout: String,
    #[serde(default)]
    pub preview: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_target() -> Target {
        Target {
            provider_name: "ssh".into(),
            provider_type: "ssh".into(),
            id: "db1".into(),
            name: "db1".into(),
            display_name: "db1 [root@10.0.0.5]".into(),
            start_directory: "/srv/{{name}}".into(),
            context: BTreeMap::from([
                ("host".to_string(), "10.0.0.5".to_string()),
                ("user".to_string(), "root".to_string()),
            ]),
            module_context: BTreeMap::from([("token".to_string(), "s3cr3t".to_string())]),
            ..Default::default()
        }
    }

    #[test]
    fn test_start_directory_expands_name_and_context() {
        let target = sample_target();
        assert_eq!(target.start_directory_template(), "/srv/db1");
        assert_eq!(target.resolve_start_directory(), PathBuf::from("/srv/db1"));
    }

    #[test]
    fn test_empty_start_directory_defaults_to_home() {
        let target = Target::default();
        assert_eq!(target.start_directory_template(), "~");
        assert!(!target.resolve_start_directory().to_string_lossy().contains('~'));
    }

    #[test]
    fn test_resolve_placeholders_uses_all_sources() {
        let target = sample_target();
        assert_eq!(
            target.resolve_placeholders("ssh {{user}}@{{host}} -o T={{!token}} # {{id}}"),
            "ssh root@10.0.0.5 -o T=s3cr3t # db1"
        );
        assert_eq!(
            target.resolve_placeholders("cd {{startDirectory}}"),
            "cd /srv/db1"
        );
    }

    #[test]
    fn test_context_keys_with_spaces_and_slashes_resolve() {
        let mut target = sample_target();
        target.context.insert("db host".into(), "db1".into());
        target.context.insert("k8s/ns".into(), "prod".into());
        assert_eq!(
            target.resolve_placeholders("ssh {{db host}} -n {{k8s/ns}}"),
            "ssh db1 -n prod"
        );
    }

    #[test]
    fn test_preview_hides_module_context() {
        let preview = sample_target().render_preview();
        assert!(preview.starts_with("# db1 [root@10.0.0.5]"));
        assert!(preview.contains("host: 10.0.0.5"));
        assert!(!preview.contains("s3cr3t"));
    }

    #[test]
    fn test_command_accepts_string_or_struct() {
        let yaml = r#"
name: editor
commands:
  - nvim .
  - command: cargo watch
    rules: ['has_tag("language-rust")']
"#;
        let app: App = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(app.commands.len(), 2);
        assert_eq!(app.commands[0], Command::new("nvim ."));
        assert_eq!(app.commands[1].rules.len(), 1);
    }

    #[test]
    fn test_module_config_is_discriminated_by_type() {
        let yaml = r#"
- type: project
  directories:
    - path: ~/src
      depth: 2
- type: ssh
- type: static
  options:
    - id: notes
      name: notes
"#;
        let modules: Vec<ModuleConfig> = serde_yaml::from_str(yaml).unwrap();
        assert!(matches!(modules[0], ModuleConfig::Project(ref p) if p.directories[0].depth == 2));
        assert!(matches!(modules[1], ModuleConfig::Ssh(_)));
        assert!(matches!(modules[2], ModuleConfig::Static(ref s) if s.options.len() == 1));
    }

    #[test]
    fn test_unknown_module_type_is_rejected() {
        let yaml = "- type: gopher\n";
        assert!(serde_yaml::from_str::<Vec<ModuleConfig>>(yaml).is_err());
    }
}
