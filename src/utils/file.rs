use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Names of the regular files directly inside `dir`. No recursion.
pub fn list_dir_files(dir: &Path) -> io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    Ok(names)
}


/// Abbreviates a file path to its two enclosing directories, `.../run_01/reads`.
///
/// # Arguments
///
/// * `path` - Path to a file.
///
/// # Returns
/// String for log lines; the full path when it has fewer components.
pub fn short_display(path: &Path) -> String {
    let parts: Vec<String> = path
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.len() < 4 {
        return path.display().to_string();
    }
    format!(".../{}", parts[parts.len() - 3..parts.len() - 1].join("/"))
}


/// Resolves `path` against `cwd` unless it is already absolute.
pub fn absolute_from(path: &Path, cwd: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::tempdir;

    #[test]
    fn test_list_dir_files_skips_dirs() -> io::Result<()> {
        let dir = tempdir()?;
        File::create(dir.path().join("a.fastq"))?;
        fs::create_dir(dir.path().join("nested"))?;
        File::create(dir.path().join("nested").join("b.fastq"))?;

        let names = list_dir_files(dir.path())?;
        assert_eq!(names, vec!["a.fastq".to_string()]);
        Ok(())
    }

    #[test]
    fn test_short_display() {
        assert_eq!(short_display(Path::new("/data/run_01/reads/S1.fastq")), ".../run_01/reads");
        assert_eq!(short_display(Path::new("reads/S1.fastq")), "reads/S1.fastq");
    }

    #[test]
    fn test_absolute_from() {
        let cwd = Path::new("/work");
        assert_eq!(absolute_from(Path::new("out"), cwd), PathBuf::from("/work/out"));
        assert_eq!(absolute_from(Path::new("/tmp/out"), cwd), PathBuf::from("/tmp/out"));
    }
}
