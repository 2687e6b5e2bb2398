// src/recon/project.rs

use super::{Discovery, ReconError};
use crate::constants::DEFAULT_PROJECT_CHECKS;
use crate::core::paths;
use crate::models::{ProjectDisplayFormat, ProjectModuleConfig, SourceDirectory, Target};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use walkdir::WalkDir;

/// Marker files and the tags they add to a selected project.
const PROJECT_MARKERS: &[(&str, &[&str])] = &[
    ("Cargo.toml", &["language-rust", "buildsystem-cargo"]),
    ("go.mod", &["language-go", "buildsystem-gomod"]),
    ("package.json", &["language-javascript", "buildsystem-npm"]),
    ("tsconfig.json", &["language-typescript"]),
    ("pom.xml", &["language-java", "buildsystem-maven"]),
    ("build.gradle", &["language-java", "buildsystem-gradle"]),
    ("build.gradle.kts", &["language-kotlin", "buildsystem-gradle"]),
    ("pyproject.toml", &["language-python", "buildsystem-python"]),
    ("requirements.txt", &["language-python", "buildsystem-python"]),
    ("setup.py", &["language-python", "buildsystem-python"]),
    ("Gemfile", &["language-ruby", "buildsystem-bundler"]),
    ("composer.json", &["language-php", "buildsystem-composer"]),
    ("mix.exs", &["language-elixir", "buildsystem-mix"]),
    ("CMakeLists.txt", &["language-cpp", "buildsystem-cmake"]),
    ("Makefile", &["buildsystem-make"]),
    ("Dockerfile", &["container-docker"]),
];

/// A project root found during a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub name: String,
    pub path: PathBuf,
    pub relative_path: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ProjectModule {
    name: String,
    checks: Vec<String>,
    config: ProjectModuleConfig,
}

impl ProjectModule {
    pub fn new(config: ProjectModuleConfig) -> Self {
        let name = config.name.clone().unwrap_or_else(|| "project".to_string());
        let checks = if config.checks.is_empty() {
            DEFAULT_PROJECT_CHECKS.iter().map(|c| (*c).to_string()).collect()
        } else {
            config.checks.clone()
        };
        Self { name, checks, config }
    }

    fn to_target(&self, project: Project) -> Target {
        let display_name = match self.config.display_format {
            ProjectDisplayFormat::Base => project.name.clone(),
            ProjectDisplayFormat::Relative => project.relative_path.clone(),
            ProjectDisplayFormat::Absolute => project.path.display().to_string(),
        };
        let path = project.path.display().to_string();

        Target {
            provider_name: self.name.clone(),
            provider_type: self.module_type().to_string(),
            id: path.clone(),
            display_name,
            name: project.name,
            start_directory: self.config.start_directory.clone().unwrap_or(path),
            tags: project.tags,
            ..Default::default()
        }
    }
}

impl Discovery for ProjectModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn module_type(&self) -> &'static str {
        "project"
    }

    fn options(&self) -> Result<Vec<Target>, ReconError> {
        let projects = scan_sources(&self.config.directories, &self.checks)?;
        Ok(projects.into_iter().map(|p| self.to_target(p)).collect())
    }

    fn select_option(&self, target: &mut Target) -> Result<(), ReconError> {
        let dir = target.resolve_start_directory();
        for tag in detect_tags(&dir) {
            target.add_tag(tag);
        }
        log::debug!("Tags for '{}' after analysis: {:?}", target.id, target.tags);
        Ok(())
    }
}

/// Tags derived from the marker files present directly inside `dir`.
pub fn detect_tags(dir: &Path) -> Vec<&'static str> {
    let mut tags = Vec::new();
    for (marker, marker_tags) in PROJECT_MARKERS {
        if dir.join(marker).exists() {
            for tag in *marker_tags {
                if !tags.contains(tag) {
                    tags.push(*tag);
                }
            }
        }
    }
    tags
}

/// Scans every source root in parallel, one task per root.
///
/// The first failing root fails the whole scan.
pub fn scan_sources(sources: &[SourceDirectory], checks: &[String]) -> Result<Vec<Project>, ReconError> {
    log::debug!("Scanning {} source directories for projects", sources.len());
    let (tx, rx) = mpsc::sync_channel(sources.len().max(1));

    rayon::scope(|s| {
        for source in sources {
            let tx = tx.clone();
            s.spawn(move |_| {
                let result = scan_source(source, checks);
                if tx.send(result).is_err() {
                    log::trace!("Scan result for '{}' dropped", source.path);
                }
            });
        }
    });
    drop(tx);

    let mut projects = Vec::new();
    for result in rx {
        projects.extend(result?);
    }
    projects.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(projects)
}

/// Walks one source root. A directory containing any `checks` entry is a project and is not descended into.
pub fn scan_source(source: &SourceDirectory, checks: &[String]) -> Result<Vec<Project>, ReconError> {
    // 1. Resolve the root and compile the exclusions
    let root = paths::expand_path(&source.path)?;
    // A missing root is reported by the walker below.
    let root = dunce::canonicalize(&root).unwrap_or(root);

    let excludes = source
        .exclude
        .iter()
        .map(|pattern| {
            Regex::new(pattern).map_err(|e| ReconError::InvalidExclude {
                pattern: pattern.clone(),
                source: e,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    // 2. Walk
    let mut projects = Vec::new();
    let mut walker = WalkDir::new(&root)
        .max_depth(source.depth)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter();

    while let Some(entry) = walker.next() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                return Err(ReconError::Scan {
                    root: root.display().to_string(),
                    source: e,
                });
            }
            Err(e) => {
                log::debug!("Skipping unreadable entry below '{}': {}", root.display(), e);
                continue;
            }
        };

        if !entry.file_type().is_dir() {
            continue;
        }

        let dir_name = entry.file_name().to_string_lossy();
        if entry.depth() > 0 && excludes.iter().any(|re| re.is_match(&dir_name)) {
            walker.skip_current_dir();
            continue;
        }

        let path = entry.path();
        if checks.iter().any(|check| path.join(check).exists()) {
            let relative_path = path
                .strip_prefix(&root)
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            projects.push(Project {
                name: dir_name.to_string(),
                path: path.to_path_buf(),
                relative_path: if relative_path.is_empty() {
                    ".".to_string()
                } else {
                    relative_path
                },
                tags: source.tags.clone(),
            });
            walker.skip_current_dir();
        }
    }

    log::debug!("Found {} projects below '{}'", projects.len(), root.display());
    Ok(projects)
}
