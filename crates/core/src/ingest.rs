use crate::error::IngestError;
use crate::models::PdfUpload;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub fn discover_pdf_files(folder: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .into_iter()
        .filter_map(|item| item.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let is_pdf = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

        if is_pdf {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_unstable();
    files
}

pub fn load_pdf_upload(path: &Path) -> Result<PdfUpload, IngestError> {
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            IngestError::InvalidArgument(format!("path missing filename: {}", path.display()))
        })?;

    let bytes = fs::read(path)?;
    Ok(PdfUpload::new(name, bytes))
}

/// Reads explicit files first, in the given order, then every PDF found under
/// each folder.
pub fn collect_uploads(files: &[PathBuf], folders: &[PathBuf]) -> Result<Vec<PdfUpload>, IngestError> {
    let mut paths = files.to_vec();

    for folder in folders {
        let discovered = discover_pdf_files(folder);
        if discovered.is_empty() {
            return Err(IngestError::InvalidArgument(format!(
                "no pdf files found in {}",
                folder.display()
            )));
        }
        paths.extend(discovered);
    }

    paths.iter().map(|path| load_pdf_upload(path)).collect()
}
