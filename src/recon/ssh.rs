// src/recon/ssh.rs

use super::{Discovery, ReconError};
use crate::core::paths;
use crate::models::{Column, SshModuleConfig, Target};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_SSH_CONFIG: &str = "~/.ssh/config";
const DEFAULT_USER: &str = "root";
const MAX_INCLUDE_DEPTH: usize = 16;

/// A concrete (non-wildcard) host alias from an ssh config.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SshHost {
    pub alias: String,
    pub hostname: String,
    pub user: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SshModule {
    name: String,
    config: SshModuleConfig,
}

impl SshModule {
    pub fn new(config: SshModuleConfig) -> Self {
        let name = config.name.clone().unwrap_or_else(|| "ssh".to_string());
        Self { name, config }
    }

    fn config_path(&self) -> Result<PathBuf, ReconError> {
        let file = self.config.file.as_deref().unwrap_or(DEFAULT_SSH_CONFIG);
        Ok(paths::expand_path(file)?)
    }

    fn to_target(&self, host: SshHost) -> Target {
        Target {
            provider_name: self.name.clone(),
            provider_type: self.module_type().to_string(),
            id: host.alias.clone(),
            display_name: format!("{} [{}@{}]", host.alias, host.user, host.hostname),
            name: host.alias,
            start_directory: self.config.start_directory.clone().unwrap_or_default(),
            tags: host.tags,
            context: BTreeMap::from([
                ("host".to_string(), host.hostname),
                ("user".to_string(), host.user),
            ]),
            ..Default::default()
        }
    }
}

impl Discovery for SshModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn module_type(&self) -> &'static str {
        "ssh"
    }

    fn options(&self) -> Result<Vec<Target>, ReconError> {
        let path = self.config_path()?;
        let content = read_with_includes(&path, 0)?;
        let hosts = parse_hosts(&content);
        log::debug!("Found {} ssh hosts in '{}'", hosts.len(), path.display());
        Ok(hosts.into_iter().map(|h| self.to_target(h)).collect())
    }

    fn select_option(&self, target: &mut Target) -> Result<(), ReconError> {
        target
            .create_start_directory_if_missing()
            .map_err(|e| ReconError::StartDirectory {
                path: target.resolve_start_directory().display().to_string(),
                source: e,
            })
    }

    fn columns(&self) -> Vec<Column> {
        let mut columns = Column::defaults();
        columns.push(Column::new("host", "Host"));
        columns.push(Column::new("user", "User"));
        columns
    }
}

/// Reads an ssh config and inlines every `Include`, recursively.
///
/// Relative include paths resolve against the directory of the including file.
pub fn read_with_includes(path: &Path, depth: usize) -> Result<String, ReconError> {
    let content = fs::read_to_string(path).map_err(|e| ReconError::SshConfig {
        path: path.display().to_string(),
        source: e,
    })?;
    if depth >= MAX_INCLUDE_DEPTH {
        log::warn!("Ignoring includes below '{}': nested too deeply", path.display());
        return Ok(content);
    }

    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut resolved = Vec::new();

    for line in content.lines() {
        let Some((keyword, rest)) = split_keyword(line) else {
            resolved.push(line.to_string());
            continue;
        };
        if !keyword.eq_ignore_ascii_case("include") {
            resolved.push(line.to_string());
            continue;
        }

        let targets: Vec<&str> = rest.split_whitespace().collect();
        if targets.is_empty() {
            return Err(ReconError::SshIncludeMissingPath {
                path: path.display().to_string(),
            });
        }
        for target in targets {
            let mut include = paths::expand_path(target)?;
            if include.is_relative() {
                include = base_dir.join(include);
            }
            resolved.push(read_with_includes(&include, depth + 1)?);
        }
    }

    Ok(resolved.join("\n"))
}

/// Splits `Keyword value` or `Keyword=value`.
fn split_keyword(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let idx = line
        .find(|c: char| c.is_whitespace() || c == '=')
        .unwrap_or(line.len());
    let (keyword, rest) = line.split_at(idx);
    let rest = rest.trim_start().trim_start_matches('=').trim();
    Some((keyword, rest))
}

/// Extracts the concrete host aliases of an (include-resolved) ssh config.
///
/// Patterns containing `*` or `?` are skipped. `# tag: x` comments inside a
/// `Host` block tag every alias of that block.
pub fn parse_hosts(content: &str) -> Vec<SshHost> {
    let mut hosts = Vec::new();
    let mut block: Option<(Vec<String>, SshHost)> = None;

    let mut flush = |block: &mut Option<(Vec<String>, SshHost)>| {
        if let Some((aliases, template)) = block.take() {
            for alias in aliases {
                let hostname = if template.hostname.is_empty() {
                    alias.clone()
                } else {
                    template.hostname.clone()
                };
                hosts.push(SshHost {
                    alias,
                    hostname,
                    ..template.clone()
                });
            }
        }
    };

    for line in content.lines() {
        let trimmed = line.trim();
        if let Some(tag) = trimmed.strip_prefix("# tag:") {
            if let Some((_, host)) = block.as_mut() {
                let tag = tag.trim();
                if !tag.is_empty() {
                    host.tags.push(tag.to_string());
                }
            }
            continue;
        }

        let Some((keyword, value)) = split_keyword(trimmed) else {
            continue;
        };
        match keyword.to_ascii_lowercase().as_str() {
            "host" => {
                flush(&mut block);
                let aliases = value
                    .split_whitespace()
                    .filter(|p| !p.contains('*') && !p.contains('?') && !p.starts_with('!'))
                    .map(str::to_string)
                    .collect();
                block = Some((
                    aliases,
                    SshHost {
                        user: DEFAULT_USER.to_string(),
                        ..Default::default()
                    },
                ));
            }
            "match" => flush(&mut block),
            "hostname" => {
                if let Some((_, host)) = block.as_mut() {
                    host.hostname = value.to_string();
                }
            }
            "user" => {
                if let Some((_, host)) = block.as_mut() {
                    host.user = value.to_string();
                }
            }
            _ => {}
        }
    }
    flush(&mut block);

    hosts
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    const CONFIG: &str = "\
Host *
    ServerAliveInterval 60

Host db1 db1-alias
    # tag: database
    # tag: prod
    HostName 10.0.0.5
    User postgres

Host web?
    User nobody

Host bastion
    Hostname=bastion.example.com
";

    #[test]
    fn test_parse_hosts() {
        let hosts = parse_hosts(CONFIG);
        let aliases: Vec<_> = hosts.iter().map(|h| h.alias.as_str()).collect();
        assert_eq!(aliases, vec!["db1", "db1-alias", "bastion"]);

        assert_eq!(hosts[0].hostname, "10.0.0.5");
        assert_eq!(hosts[0].user, "postgres");
        assert_eq!(hosts[0].tags, vec!["database", "prod"]);
        assert_eq!(hosts[1].tags, hosts[0].tags);

        assert_eq!(hosts[2].hostname, "bastion.example.com");
        assert_eq!(hosts[2].user, "root");
        assert!(hosts[2].tags.is_empty());
    }

    #[test]
    fn test_includes_are_inlined() {
        // --- Setup ---
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("conf.d")).unwrap();
        fs::write(dir.path().join("conf.d/work"), "Host work\n    HostName work.internal\n").unwrap();
        fs::write(dir.path().join("config"), "Include conf.d/work\nHost home\n").unwrap();

        // --- Execute ---
        let content = read_with_includes(&dir.path().join("config"), 0).unwrap();
        let hosts = parse_hosts(&content);

        // --- Assert ---
        let aliases: Vec<_> = hosts.iter().map(|h| h.alias.as_str()).collect();
        assert_eq!(aliases, vec!["work", "home"]);
        assert_eq!(hosts[1].hostname, "home");
    }

    #[test]
    fn test_include_without_path_is_an_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("config"), "Include\n").unwrap();
        assert!(matches!(
            read_with_includes(&dir.path().join("config"), 0),
            Err(ReconError::SshIncludeMissingPath { .. })
        ));
    }

    #[test]
    fn test_module_targets_and_columns() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("config");
        fs::write(&file, CONFIG).unwrap();

        let module = SshModule::new(SshModuleConfig {
            file: Some(file.display().to_string()),
            ..Default::default()
        });
        let options = module.options().unwrap();
        assert_eq!(options[0].display_name, "db1 [postgres@10.0.0.5]");
        assert_eq!(options[0].context.get("host").map(String::as_str), Some("10.0.0.5"));
        assert_eq!(options[0].provider_name, "ssh");

        let keys: Vec<_> = module.columns().into_iter().map(|c| c.key).collect();
        assert_eq!(keys, vec!["module", "id", "name", "display_name", "host", "user"]);
    }

    #[test]
    fn test_select_creates_start_directory() {
        let dir = tempdir().unwrap();
        let module = SshModule::new(SshModuleConfig::default());
        let mut target = Target {
            name: "db1".into(),
            start_directory: format!("{}/hosts/{{{{name}}}}", dir.path().display()),
            ..Default::default()
        };
        module.select_option(&mut target).unwrap();
        assert!(dir.path().join("hosts/db1").is_dir());
    }
}
