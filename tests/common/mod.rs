use std::fs;
use std::path::{Path, PathBuf};

pub fn stage_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}
