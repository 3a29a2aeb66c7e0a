//! Directory scanning for templates and example screenshots.

use std::io;
use std::path::{Path, PathBuf};

use hudmatch::io::load_gray_image;
use hudmatch::{HudMatchError, TemplateSource};

/// Lists regular files in `dir`, optionally filtered by extension, sorted by
/// path.
pub fn list_files(dir: &Path, extension: Option<&str>) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        if let Some(ext) = extension {
            let matches = path
                .extension()
                .and_then(|s| s.to_str())
                .is_some_and(|s| s.eq_ignore_ascii_case(ext));
            if !matches {
                continue;
            }
        }
        files.push(path);
    }
    files.sort();
    Ok(files)
}

/// File name used as the example id and output file name.
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Template name: the file name up to its first `.` (`ammo.hd.png` is `ammo`).
pub fn template_name(path: &Path) -> String {
    let name = file_name(path);
    match name.split_once('.') {
        Some((stem, _)) => stem.to_string(),
        None => name,
    }
}

/// Decodes one template file; failures travel inside the source so the store
/// reports them against the template.
pub fn template_source(path: &Path) -> TemplateSource {
    let name = template_name(path);
    match load_gray_image(path) {
        Ok(image) => TemplateSource::new(name, image),
        Err(error) => TemplateSource::failed(name, error),
    }
}

/// Lists the template files, mapping a missing directory to a load error.
pub fn template_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, HudMatchError> {
    list_files(dir, Some(extension)).map_err(|err| HudMatchError::load(dir.display().to_string(), err))
}
