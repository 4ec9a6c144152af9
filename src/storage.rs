//! Media directories: listing, upload saving, and filename allocation.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::error::Error;

/// Which media family a directory holds; decides the allowed extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Image,
}

impl MediaKind {
    /// Allowed extensions, lowercase and without the dot.
    #[must_use]
    pub fn allowed_extensions(self) -> &'static [&'static str] {
        match self {
            MediaKind::Video => &["mp4", "avi", "mkv", "mov"],
            MediaKind::Image => &["jpg", "jpeg", "png", "gif"],
        }
    }

    /// Return `true` if `path` carries one of this kind's extensions
    /// (case-insensitive).
    #[must_use]
    pub fn matches(self, path: &Path) -> bool {
        path.extension().and_then(|s| s.to_str()).is_some_and(|ext| {
            let ext = ext.to_ascii_lowercase();
            self.allowed_extensions().iter().any(|e| *e == ext)
        })
    }
}

/// One stored file, as reported by the listing endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct MediaFile {
    pub name: String,
    pub path: PathBuf,
}

/// Create the media directories if they are missing. Called once at startup.
pub fn ensure_directories(dirs: &[&Path]) -> Result<(), Error> {
    for dir in dirs {
        if !dir.exists() {
            info!(dir = %dir.display(), "creating media directory");
            fs::create_dir_all(dir)?;
        }
    }
    Ok(())
}

/// List the files in `dir` whose extension matches `kind`, in directory
/// iteration order (not sorted).
pub fn list_files(dir: &Path, kind: MediaKind) -> Result<Vec<MediaFile>, Error> {
    let mut out = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file()
            && kind.matches(&path)
            && let Some(name) = path.file_name().and_then(|n| n.to_str())
        {
            out.push(MediaFile {
                name: name.to_string(),
                path: path.clone(),
            });
        }
    }
    Ok(out)
}

/// Reduce a client-supplied filename to a safe basename: path components
/// are dropped, anything outside `[A-Za-z0-9._-]` becomes `_`, and
/// leading dots are stripped.
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    cleaned.trim_start_matches('.').to_string()
}

/// Store uploaded bytes under `dir`, never clobbering an existing file.
///
/// Videos uploaded without an extension default to `.mp4`. The existence
/// check and the write are not atomic; concurrent uploads of the same
/// name can race, which is accepted behavior.
pub fn save_upload(
    dir: &Path,
    kind: MediaKind,
    original_name: &str,
    bytes: &[u8],
) -> Result<MediaFile, Error> {
    let sanitized = sanitize_filename(original_name);
    if sanitized.is_empty() {
        return Err(Error::Validation("No usable filename".into()));
    }
    let (base, mut ext) = split_name(&sanitized);
    if ext.is_empty() && kind == MediaKind::Video {
        ext = "mp4".to_string();
    }
    let stored = allocate_name(dir, &base, &ext);
    let path = dir.join(&stored);
    fs::write(&path, bytes)?;
    debug!(name = %stored, path = %path.display(), "stored upload");
    Ok(MediaFile { name: stored, path })
}

/// Split `name` at its last dot; a leading dot does not count.
fn split_name(name: &str) -> (String, String) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => (name[..idx].to_string(), name[idx + 1..].to_string()),
        _ => (name.to_string(), String::new()),
    }
}

/// First free name in `dir`: the literal name, then `base_1.ext`,
/// `base_2.ext`, and so on.
fn allocate_name(dir: &Path, base: &str, ext: &str) -> String {
    let with_ext = |b: &str| {
        if ext.is_empty() {
            b.to_string()
        } else {
            format!("{b}.{ext}")
        }
    };
    let mut candidate = with_ext(base);
    let mut counter = 1u32;
    while dir.join(&candidate).exists() {
        candidate = with_ext(&format!("{base}_{counter}"));
        counter += 1;
    }
    candidate
}
