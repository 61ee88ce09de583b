use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use flate2::{write::GzEncoder, Compression};
use serde::Serialize;
use serde_json::json;
use sha2::Digest;
use tar::Builder;
use walkdir::{DirEntry, WalkDir};
use zip::{write::FileOptions, CompressionMethod, ZipWriter};

use shipwheel_domain::{load_project_metadata, ProjectMetadata};

use crate::context::CommandContext;
use crate::outcome::{ExecutionOutcome, StepUserError};
use crate::SHIPWHEEL_VERSION;

#[derive(Clone, Debug)]
pub struct BuildRequest {
    pub include_sdist: bool,
    pub include_wheel: bool,
    pub out: Option<PathBuf>,
    pub dry_run: bool,
}

impl Default for BuildRequest {
    fn default() -> Self {
        Self {
            include_sdist: false,
            include_wheel: true,
            out: None,
            dry_run: false,
        }
    }
}

#[derive(Clone, Debug)]
struct SourceAsset {
    relative: String,
    path: PathBuf,
}

/// Builds the configured distribution artifacts from `pyproject.toml` and
/// the source tree.
///
/// # Errors
/// Returns an error if project metadata is missing or invalid, no package
/// sources exist, or an archive cannot be written.
pub fn build_project(ctx: &CommandContext, request: &BuildRequest) -> Result<ExecutionOutcome> {
    let root = ctx.project_root()?;
    // metadata is validated before any output path is touched
    let metadata = load_project_metadata(&root)?;
    let targets = build_targets_from_request(request);
    let out_dir = resolve_output_dir(ctx, &root, request.out.as_deref());

    if request.dry_run {
        let artifacts = collect_artifact_summaries(&out_dir, &root)?;
        let message = format!(
            "dry-run (format={}, out={})",
            targets.label(),
            relative_path_str(&out_dir, &root)
        );
        return Ok(ExecutionOutcome::success(
            message,
            json!({
                "artifacts": artifacts,
                "out_dir": relative_path_str(&out_dir, &root),
                "format": targets.label(),
                "dry_run": true,
            }),
        ));
    }

    let assets = collect_source_assets(&root, &metadata)?;
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating output directory at {}", out_dir.display()))?;

    let mut produced = Vec::new();
    if targets.sdist {
        produced.push(write_sdist(&root, &out_dir, &metadata, &assets)?);
    }
    if targets.wheel {
        produced.push(write_wheel(&root, &out_dir, &metadata, &assets)?);
    }

    let artifacts = summarize_selected_artifacts(&produced, &root)?;
    let Some(first) = artifacts.last() else {
        return Ok(ExecutionOutcome::failure(
            "build completed but produced no artifacts",
            json!({
                "out_dir": relative_path_str(&out_dir, &root),
                "format": targets.label(),
            }),
        ));
    };
    let sha_short: String = first.sha256.chars().take(12).collect();
    let message = if artifacts.len() == 1 {
        format!(
            "wrote {} ({}, sha256={}…)",
            first.path,
            format_bytes(first.bytes),
            sha_short
        )
    } else {
        format!(
            "wrote {} artifacts ({}, sha256={}…)",
            artifacts.len(),
            format_bytes(first.bytes),
            sha_short
        )
    };
    tracing::debug!(
        count = artifacts.len(),
        out_dir = %out_dir.display(),
        "build finished"
    );
    Ok(ExecutionOutcome::success(
        message,
        json!({
            "artifacts": artifacts,
            "out_dir": relative_path_str(&out_dir, &root),
            "format": targets.label(),
            "dry_run": false,
        }),
    ))
}

#[derive(Clone, Serialize)]
pub(crate) struct ArtifactSummary {
    pub path: String,
    pub bytes: u64,
    pub sha256: String,
}

#[derive(Clone, Copy)]
struct BuildTargets {
    sdist: bool,
    wheel: bool,
}

impl BuildTargets {
    fn label(self) -> &'static str {
        match (self.sdist, self.wheel) {
            (true, true) => "both",
            (true, false) => "sdist",
            (false, _) => "wheel",
        }
    }
}

fn build_targets_from_request(request: &BuildRequest) -> BuildTargets {
    // the wheel is the artifact the publish flow requires
    if !request.include_sdist && !request.include_wheel {
        return BuildTargets {
            sdist: false,
            wheel: true,
        };
    }
    BuildTargets {
        sdist: request.include_sdist,
        wheel: request.include_wheel,
    }
}

fn write_wheel(
    root: &Path,
    out_dir: &Path,
    metadata: &ProjectMetadata,
    assets: &[SourceAsset],
) -> Result<PathBuf> {
    let filename = format!(
        "{}-{}-py3-none-any.whl",
        metadata.normalized_name, metadata.version
    );
    let path = out_dir.join(&filename);
    let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut records = Vec::new();
    for asset in assets {
        let data =
            fs::read(&asset.path).with_context(|| format!("reading {}", asset.path.display()))?;
        zip.start_file(&asset.relative, options)?;
        zip.write_all(&data)?;
        records.push(record_entry(&asset.relative, &data));
    }

    let dist_info = format!("{}-{}.dist-info", metadata.normalized_name, metadata.version);
    let metadata_path = format!("{dist_info}/METADATA");
    let metadata_body = render_metadata(metadata, long_description(root).as_deref());
    zip.start_file(&metadata_path, options)?;
    zip.write_all(metadata_body.as_bytes())?;
    records.push(record_entry(&metadata_path, metadata_body.as_bytes()));

    let wheel_path = format!("{dist_info}/WHEEL");
    let wheel_body = format!(
        "Wheel-Version: 1.0\nGenerator: shipwheel {SHIPWHEEL_VERSION}\nRoot-Is-Purelib: true\nTag: py3-none-any\n"
    );
    zip.start_file(&wheel_path, options)?;
    zip.write_all(wheel_body.as_bytes())?;
    records.push(record_entry(&wheel_path, wheel_body.as_bytes()));

    if let Some(entry_points_body) = render_entry_points(metadata) {
        let ep_path = format!("{dist_info}/entry_points.txt");
        zip.start_file(&ep_path, options)?;
        zip.write_all(entry_points_body.as_bytes())?;
        records.push(record_entry(&ep_path, entry_points_body.as_bytes()));
    }

    let record_path = format!("{dist_info}/RECORD");
    records.push(format!("{record_path},,")); // RECORD has no hash/size
    let mut record_body = records.join("\n");
    record_body.push('\n');
    zip.start_file(&record_path, options)?;
    zip.write_all(record_body.as_bytes())?;

    zip.finish()?;
    Ok(path)
}

fn write_sdist(
    root: &Path,
    out_dir: &Path,
    metadata: &ProjectMetadata,
    assets: &[SourceAsset],
) -> Result<PathBuf> {
    let filename = format!("{}-{}.tar.gz", metadata.normalized_name, metadata.version);
    let path = out_dir.join(filename);
    let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut tar = Builder::new(encoder);
    let base = format!("{}-{}", metadata.normalized_name, metadata.version);

    let pyproject = root.join("pyproject.toml");
    tar.append_path_with_name(&pyproject, format!("{base}/pyproject.toml"))?;
    for candidate in ["README.md", "README.rst", "LICENSE", "LICENSE.txt"] {
        let doc = root.join(candidate);
        if doc.is_file() {
            tar.append_path_with_name(&doc, format!("{base}/{candidate}"))?;
        }
    }

    let pkg_info = render_metadata(metadata, long_description(root).as_deref());
    append_inline(&mut tar, &format!("{base}/PKG-INFO"), pkg_info.as_bytes())?;

    for asset in assets {
        let data =
            fs::read(&asset.path).with_context(|| format!("reading {}", asset.path.display()))?;
        append_inline(&mut tar, &format!("{base}/{}", asset.relative), &data)?;
    }

    tar.finish()?;
    let encoder = tar.into_inner()?;
    encoder.finish()?;
    Ok(path)
}

fn append_inline(tar: &mut Builder<GzEncoder<File>>, path: &str, data: &[u8]) -> Result<()> {
    let mut header = tar::Header::new_gnu();
    header.set_size(data.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    tar.append_data(&mut header, path, data)?;
    Ok(())
}

fn collect_source_assets(root: &Path, metadata: &ProjectMetadata) -> Result<Vec<SourceAsset>> {
    let mut assets = Vec::new();
    let mut seen = HashSet::new();
    let src = root.join("src");
    if src.is_dir() {
        add_tree_assets(&src, &src, &mut assets, &mut seen)?;
    }
    let pkg_root = root.join(&metadata.normalized_name);
    if pkg_root.is_dir() {
        add_tree_assets(&pkg_root, root, &mut assets, &mut seen)?;
    }
    assets.sort_by(|a, b| a.relative.cmp(&b.relative));
    if assets.is_empty() {
        return Err(StepUserError::new(
            format!(
                "no package sources found (expected src/ or {}/)",
                metadata.normalized_name
            ),
            json!({
                "reason": "missing_sources",
                "hint": "Put package modules under src/ or a directory named after the package.",
            }),
        )
        .into());
    }
    Ok(assets)
}

fn add_tree_assets(
    tree: &Path,
    strip_prefix: &Path,
    assets: &mut Vec<SourceAsset>,
    seen: &mut HashSet<String>,
) -> Result<()> {
    let walker = WalkDir::new(tree)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_excluded(entry));
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(strip_prefix).unwrap_or(entry.path());
        let rel = normalize_archive_path(relative);
        if seen.insert(rel.clone()) {
            assets.push(SourceAsset {
                relative: rel,
                path: entry.path().to_path_buf(),
            });
        }
    }
    Ok(())
}

fn is_excluded(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.') || name == "__pycache__")
}

fn long_description(root: &Path) -> Option<String> {
    fs::read_to_string(root.join("README.rst")).ok()
}

fn render_metadata(metadata: &ProjectMetadata, long_description: Option<&str>) -> String {
    let mut lines = Vec::new();
    lines.push("Metadata-Version: 2.1".to_string());
    lines.push(format!("Name: {}", metadata.name));
    lines.push(format!("Version: {}", metadata.version));
    if let Some(summary) = &metadata.summary {
        lines.push(format!("Summary: {summary}"));
    }
    if let Some(rp) = &metadata.requires_python {
        lines.push(format!("Requires-Python: {rp}"));
    }
    for extra in metadata.optional_requires.keys() {
        lines.push(format!("Provides-Extra: {extra}"));
    }
    for req in &metadata.requires_dist {
        lines.push(format!("Requires-Dist: {req}"));
    }
    for (extra, reqs) in &metadata.optional_requires {
        for req in reqs {
            lines.push(format!(r#"Requires-Dist: {req} ; extra == "{extra}""#));
        }
    }
    if let Some(body) = long_description {
        lines.push("Description-Content-Type: text/x-rst".to_string());
        lines.push(String::new());
        lines.push(body.trim_end().to_string());
    }
    lines.push(String::new());
    lines.join("\n")
}

fn render_entry_points(metadata: &ProjectMetadata) -> Option<String> {
    if metadata.entry_points.is_empty() {
        return None;
    }
    let mut sections = Vec::new();
    for (group, entries) in &metadata.entry_points {
        sections.push(format!("[{group}]"));
        for (name, target) in entries {
            sections.push(format!("{name} = {target}"));
        }
        sections.push(String::new());
    }
    Some(sections.join("\n"))
}

fn record_entry(path: &str, data: &[u8]) -> String {
    let mut hasher = sha2::Sha256::new();
    hasher.update(data);
    let digest = hasher.finalize();
    let hash = URL_SAFE_NO_PAD.encode(digest);
    format!("{path},sha256={hash},{}", data.len())
}

pub(crate) fn collect_artifact_summaries(dir: &Path, root: &Path) -> Result<Vec<ArtifactSummary>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let bytes = fs::metadata(&path)?.len();
        let sha256 = compute_file_sha256(&path)?;
        entries.push(ArtifactSummary {
            path: relative_path_str(&path, root),
            bytes,
            sha256,
        });
    }
    entries.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(entries)
}

fn summarize_selected_artifacts(paths: &[PathBuf], root: &Path) -> Result<Vec<ArtifactSummary>> {
    let mut entries = Vec::new();
    for path in paths {
        let bytes = fs::metadata(path)?.len();
        let sha256 = compute_file_sha256(path)?;
        entries.push(ArtifactSummary {
            path: relative_path_str(path, root),
            bytes,
            sha256,
        });
    }
    Ok(entries)
}

fn compute_file_sha256(path: &Path) -> Result<String> {
    use sha2::{Digest, Sha256};

    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}

fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    fn format_scaled(value: u64, unit: u64, suffix: &str) -> String {
        let whole = value / unit;
        let remainder = value % unit;
        let tenths = (remainder * 10) / unit;
        format!("{whole}.{tenths} {suffix}")
    }

    if bytes >= MB {
        format_scaled(bytes, MB, "MB")
    } else if bytes >= KB {
        format_scaled(bytes, KB, "KB")
    } else {
        format!("{bytes} B")
    }
}

fn normalize_archive_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

pub(crate) fn resolve_output_dir(ctx: &CommandContext, root: &Path, out: Option<&Path>) -> PathBuf {
    match out {
        Some(path) if path.is_absolute() => path.to_path_buf(),
        Some(path) => root.join(path),
        None => root.join(&ctx.config().dist().dir),
    }
}

pub(crate) fn relative_path_str(path: &Path, root: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(rel) if rel.as_os_str().is_empty() => ".".to_string(),
        Ok(rel) => normalize_archive_path(rel),
        Err(_) => path.display().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GlobalOptions;
    use tempfile::tempdir;

    fn seed_project(root: &Path) {
        fs::write(
            root.join("pyproject.toml"),
            "[project]\nname = \"demo-pkg\"\nversion = \"0.3.1\"\ndescription = \"Demo\"\n",
        )
        .expect("write pyproject");
        fs::create_dir_all(root.join("src/demo_pkg")).expect("mkdir");
        fs::write(root.join("src/demo_pkg/__init__.py"), b"__version__ = \"0.3.1\"\n")
            .expect("write module");
    }

    #[test]
    fn wheel_filename_encodes_name_and_version() -> Result<()> {
        let root = tempdir()?;
        seed_project(root.path());
        let global = GlobalOptions::default();
        let ctx = CommandContext::testing(&global, root.path().to_path_buf());

        let outcome = build_project(&ctx, &BuildRequest::default())?;
        assert!(outcome.is_ok());
        let wheel = root.path().join("dist/demo_pkg-0.3.1-py3-none-any.whl");
        assert!(wheel.is_file());
        Ok(())
    }

    #[test]
    fn wheel_contains_dist_info_and_record() -> Result<()> {
        let root = tempdir()?;
        seed_project(root.path());
        let global = GlobalOptions::default();
        let ctx = CommandContext::testing(&global, root.path().to_path_buf());
        build_project(&ctx, &BuildRequest::default())?;

        let wheel = root.path().join("dist/demo_pkg-0.3.1-py3-none-any.whl");
        let mut archive = zip::ZipArchive::new(File::open(wheel)?)?;
        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).map(|f| f.name().to_string()))
            .collect::<Result<_, _>>()?;
        assert!(names.contains(&"demo_pkg/__init__.py".to_string()));
        assert!(names.contains(&"demo_pkg-0.3.1.dist-info/METADATA".to_string()));
        assert!(names.contains(&"demo_pkg-0.3.1.dist-info/WHEEL".to_string()));
        assert!(names.contains(&"demo_pkg-0.3.1.dist-info/RECORD".to_string()));
        Ok(())
    }

    #[test]
    fn missing_sources_is_a_user_error() -> Result<()> {
        let root = tempdir()?;
        fs::write(
            root.path().join("pyproject.toml"),
            "[project]\nname = \"demo\"\nversion = \"1.0\"\n",
        )?;
        let global = GlobalOptions::default();
        let ctx = CommandContext::testing(&global, root.path().to_path_buf());

        let err = build_project(&ctx, &BuildRequest::default()).unwrap_err();
        assert!(err.downcast_ref::<StepUserError>().is_some());
        assert!(!root.path().join("dist").exists());
        Ok(())
    }

    #[test]
    fn invalid_metadata_fails_before_output_dir_is_created() -> Result<()> {
        let root = tempdir()?;
        fs::write(root.path().join("pyproject.toml"), "[project]\nname = \"demo\"\n")?;
        let global = GlobalOptions::default();
        let ctx = CommandContext::testing(&global, root.path().to_path_buf());

        let err = build_project(&ctx, &BuildRequest::default()).unwrap_err();
        assert!(err.to_string().contains("[project].version"));
        assert!(!root.path().join("dist").exists());
        Ok(())
    }

    #[test]
    fn sdist_and_wheel_both_build() -> Result<()> {
        let root = tempdir()?;
        seed_project(root.path());
        let global = GlobalOptions::default();
        let ctx = CommandContext::testing(&global, root.path().to_path_buf());

        let request = BuildRequest {
            include_sdist: true,
            include_wheel: true,
            out: None,
            dry_run: false,
        };
        build_project(&ctx, &request)?;
        assert!(root.path().join("dist/demo_pkg-0.3.1.tar.gz").is_file());
        assert!(root
            .path()
            .join("dist/demo_pkg-0.3.1-py3-none-any.whl")
            .is_file());
        Ok(())
    }

    #[test]
    fn targets_default_to_wheel_when_none_selected() {
        let request = BuildRequest {
            include_sdist: false,
            include_wheel: false,
            out: None,
            dry_run: false,
        };
        let targets = build_targets_from_request(&request);
        assert!(targets.wheel);
        assert!(!targets.sdist);
    }

    #[test]
    fn record_entries_carry_urlsafe_hashes() {
        let entry = record_entry("demo/__init__.py", b"data");
        assert!(entry.starts_with("demo/__init__.py,sha256="));
        assert!(entry.ends_with(",4"));
        let hash = entry.split(',').nth(1).expect("hash field");
        let digest = hash.trim_start_matches("sha256=");
        assert!(!digest.contains('=') && !digest.contains('+') && !digest.contains('/'));
    }

    #[test]
    fn format_bytes_scales_values() {
        assert_eq!(format_bytes(500), "500 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(1_572_864), "1.5 MB");
    }
}
