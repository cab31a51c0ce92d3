use ignore::WalkBuilder;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::CONFIG_FILE_NAME;

/// Walk paths and yield lintable file paths, respecting gitignore.
///
/// With a non-empty `extensions` list only files whose extension is in it
/// are yielded. Configuration files are never yielded.
pub fn walk_paths(paths: &[String], extensions: &[String]) -> impl Iterator<Item = io::Result<PathBuf>> {
    let mut all_files = vec![];

    for path in paths {
        let walker = WalkBuilder::new(path)
            .hidden(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .build();

        for entry in walker {
            match entry {
                Ok(entry) => {
                    let is_file = entry.file_type().is_some_and(|ft| ft.is_file());
                    if is_file && wanted(entry.path(), extensions) {
                        all_files.push(Ok(entry.into_path()));
                    }
                }
                Err(e) => {
                    all_files.push(Err(io::Error::other(e.to_string())));
                }
            }
        }
    }

    all_files.into_iter()
}

fn wanted(path: &Path, extensions: &[String]) -> bool {
    if path.file_name().is_some_and(|n| n == CONFIG_FILE_NAME) {
        return false;
    }
    if extensions.is_empty() {
        return true;
    }
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|want| want.trim_start_matches('.') == ext))
}
