//! `pyproject.toml` metadata used when assembling distribution artifacts.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use toml_edit::{DocumentMut, Item, Table};

#[derive(Clone, Debug)]
pub struct ProjectMetadata {
    pub name: String,
    pub normalized_name: String,
    pub version: String,
    pub requires_python: Option<String>,
    pub requires_dist: Vec<String>,
    pub optional_requires: BTreeMap<String, Vec<String>>,
    pub summary: Option<String>,
    pub entry_points: BTreeMap<String, BTreeMap<String, String>>,
}

/// Loads distribution metadata from `<project_root>/pyproject.toml`.
///
/// # Errors
/// Returns an error if the manifest is missing, is not valid TOML, or lacks
/// `[project].name` / `[project].version`.
pub fn load_project_metadata(project_root: &Path) -> Result<ProjectMetadata> {
    let pyproject_path = project_root.join("pyproject.toml");
    let contents = fs::read_to_string(&pyproject_path)
        .with_context(|| format!("reading {}", pyproject_path.display()))?;
    let doc: DocumentMut = contents
        .parse()
        .with_context(|| format!("parsing {}", pyproject_path.display()))?;
    let project = project_table(&doc)?;
    let name = required_str(project, "name")?;
    let version = required_str(project, "version")?;
    let requires_python = project
        .get("requires-python")
        .and_then(Item::as_str)
        .map(ToString::to_string);
    let requires_dist = string_array(project, "dependencies");
    let summary = project
        .get("description")
        .and_then(Item::as_str)
        .map(ToString::to_string);
    let entry_points = collect_entry_points(project);
    let optional_requires = collect_optional_dependencies(project);
    let normalized_name = normalize_package_name(&name);

    Ok(ProjectMetadata {
        name,
        normalized_name,
        version,
        requires_python,
        requires_dist,
        optional_requires,
        summary,
        entry_points,
    })
}

fn project_table(doc: &DocumentMut) -> Result<&Table> {
    doc.get("project")
        .and_then(Item::as_table)
        .ok_or_else(|| anyhow!("pyproject missing [project] table"))
}

fn required_str(project: &Table, key: &str) -> Result<String> {
    project
        .get(key)
        .and_then(Item::as_str)
        .map(ToString::to_string)
        .ok_or_else(|| anyhow!("pyproject missing [project].{key}"))
}

fn string_array(project: &Table, key: &str) -> Vec<String> {
    project
        .get(key)
        .and_then(Item::as_array)
        .map(|array| {
            array
                .iter()
                .filter_map(|value| value.as_str().map(ToString::to_string))
                .collect()
        })
        .unwrap_or_default()
}

fn collect_entry_points(project: &Table) -> BTreeMap<String, BTreeMap<String, String>> {
    let mut groups = BTreeMap::new();
    collect_entry_point_group(project, "scripts", "console_scripts", &mut groups);
    collect_entry_point_group(project, "gui-scripts", "gui_scripts", &mut groups);
    if let Some(ep_table) = project.get("entry-points").and_then(Item::as_table) {
        for (group, table) in ep_table.iter() {
            if let Some(entries) = table.as_table() {
                let mut mapped = BTreeMap::new();
                for (name, value) in entries.iter() {
                    if let Some(target) = value.as_str() {
                        mapped.insert(name.to_string(), target.to_string());
                    }
                }
                if !mapped.is_empty() {
                    groups.insert(group.to_string(), mapped);
                }
            }
        }
    }
    groups
}

fn collect_entry_point_group(
    project: &Table,
    project_key: &str,
    entry_point_group: &str,
    groups: &mut BTreeMap<String, BTreeMap<String, String>>,
) {
    if let Some(scripts) = project.get(project_key).and_then(Item::as_table) {
        let mut mapped = BTreeMap::new();
        for (name, value) in scripts.iter() {
            if let Some(target) = value.as_str() {
                mapped.insert(name.to_string(), target.to_string());
            }
        }
        if !mapped.is_empty() {
            groups.insert(entry_point_group.to_string(), mapped);
        }
    }
}

fn collect_optional_dependencies(project: &Table) -> BTreeMap<String, Vec<String>> {
    let mut extras = BTreeMap::new();
    if let Some(optional) = project
        .get("optional-dependencies")
        .and_then(Item::as_table)
    {
        for (name, array) in optional.iter() {
            if let Some(values) = array.as_array() {
                let deps: Vec<String> = values
                    .iter()
                    .filter_map(|value| value.as_str().map(ToString::to_string))
                    .collect();
                if !deps.is_empty() {
                    extras.insert(name.to_string(), deps);
                }
            }
        }
    }
    extras
}

/// Normalizes a distribution name for use in wheel filenames and module
/// directories (`-`, `.`, and spaces become `_`).
#[must_use]
pub fn normalize_package_name(name: &str) -> String {
    name.chars()
        .map(|ch| if matches!(ch, '-' | '.' | ' ') { '_' } else { ch })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write_pyproject(dir: &Path, body: &str) {
        fs::write(dir.join("pyproject.toml"), body).expect("write pyproject");
    }

    #[test]
    fn loads_core_fields_and_extras() -> Result<()> {
        let root = tempdir()?;
        write_pyproject(
            root.path(),
            r#"
[project]
name = "scan-folder-plugins"
version = "1.2.3"
description = "Folder scanning plugins"
requires-python = ">=3.9"
dependencies = ["apache-airflow>=2.0"]

[project.optional-dependencies]
dev = ["pytest"]

[project.scripts]
scan = "scan_folder_plugins.cli:main"
"#,
        );

        let metadata = load_project_metadata(root.path())?;
        assert_eq!(metadata.name, "scan-folder-plugins");
        assert_eq!(metadata.normalized_name, "scan_folder_plugins");
        assert_eq!(metadata.version, "1.2.3");
        assert_eq!(metadata.requires_python.as_deref(), Some(">=3.9"));
        assert_eq!(metadata.requires_dist, vec!["apache-airflow>=2.0"]);
        assert_eq!(
            metadata.optional_requires.get("dev"),
            Some(&vec!["pytest".to_string()])
        );
        let console = metadata
            .entry_points
            .get("console_scripts")
            .expect("console scripts");
        assert_eq!(
            console.get("scan").map(String::as_str),
            Some("scan_folder_plugins.cli:main")
        );
        Ok(())
    }

    #[test]
    fn missing_version_is_an_error() {
        let root = tempdir().expect("tempdir");
        write_pyproject(root.path(), "[project]\nname = \"demo\"\n");

        let err = load_project_metadata(root.path()).unwrap_err();
        assert!(err.to_string().contains("[project].version"));
    }

    #[test]
    fn missing_project_table_is_an_error() {
        let root = tempdir().expect("tempdir");
        write_pyproject(root.path(), "[build-system]\nrequires = []\n");

        let err = load_project_metadata(root.path()).unwrap_err();
        assert!(err.to_string().contains("[project] table"));
    }

    #[test]
    fn normalizes_separators() {
        assert_eq!(normalize_package_name("a-b.c d"), "a_b_c_d");
        assert_eq!(normalize_package_name("plain"), "plain");
    }
}
