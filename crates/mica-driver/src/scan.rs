//! Builds the virtual file table the resolver consumes.
//!
//! The directory containing the entry file becomes the virtual root
//! `/`; every file under it with the entry's extension is read into the
//! table under its `/`-rooted relative path.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

pub struct ScannedProject {
    pub files: HashMap<String, String>,
    /// Entry file's virtual path.
    pub entry: String,
}

pub async fn scan_project(entry: &Path) -> io::Result<ScannedProject> {
    let entry = entry.canonicalize()?;
    let root = entry.parent().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "entry file has no parent directory")
    })?;
    let extension = entry.extension().map(|e| e.to_owned());

    let mut files = HashMap::new();
    let mut pending: Vec<PathBuf> = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(item) = entries.next_entry().await? {
            let path = item.path();
            let kind = item.file_type().await?;
            if kind.is_dir() {
                pending.push(path);
            } else if kind.is_file() && path.extension() == extension.as_deref() {
                let text = tokio::fs::read_to_string(&path).await?;
                files.insert(virtual_path(root, &path)?, text);
            }
        }
    }

    Ok(ScannedProject {
        files,
        entry: virtual_path(root, &entry)?,
    })
}

fn virtual_path(root: &Path, path: &Path) -> io::Result<String> {
    let relative = path.strip_prefix(root).map_err(|_| {
        io::Error::new(io::ErrorKind::InvalidInput, "file escapes project root")
    })?;
    let mut virtual_path = String::from("/");
    let mut first = true;
    for component in relative.components() {
        if !first {
            virtual_path.push('/');
        }
        virtual_path.push_str(&component.as_os_str().to_string_lossy());
        first = false;
    }
    Ok(virtual_path)
}
