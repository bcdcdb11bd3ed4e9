// src/utils/manifest.rs: the read-path list consumed by input.R

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::utils::sample::Sample;

/// Writes one path per line, forward then reverse, for each sample in order.
pub fn write_manifest(path: &Path, samples: &[&Sample]) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for sample in samples {
        writeln!(writer, "{}", sample.forward_path().display())?;
        writeln!(writer, "{}", sample.reverse_path().display())?;
    }
    writer.flush()
}

/// Reads a manifest back into ordered (forward, reverse) pairs.
pub fn read_manifest(path: &Path) -> io::Result<Vec<(PathBuf, PathBuf)>> {
    let reader = BufReader::new(File::open(path)?);
    let lines: Vec<String> = reader
        .lines()
        .collect::<io::Result<Vec<_>>>()?
        .into_iter()
        .filter(|line| !line.is_empty())
        .collect();

    if lines.len() % 2 != 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("{} has {} paths; expected forward/reverse pairs", path.display(), lines.len()),
        ));
    }

    Ok(lines
        .chunks(2)
        .map(|pair| (PathBuf::from(&pair[0]), PathBuf::from(&pair[1])))
        .collect())
}


#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use crate::utils::sample::SampleMatcher;
    use crate::utils::selection::SelectionSet;

    #[test]
    fn test_manifest_round_trip_in_selection_order() -> io::Result<()> {
        let reads = tempdir()?;
        for name in ["S3", "S1", "S2"] {
            File::create(reads.path().join(format!("{}_x_pair1.truncated.fq", name)))?;
            File::create(reads.path().join(format!("{}_x_pair2.truncated.fq", name)))?;
        }
        let samples = SampleMatcher::default()
            .discover(reads.path())
            .map_err(|e| io::Error::other(e.to_string()))?;
        let mut set = SelectionSet::new(samples);
        set.move_to_selected(["S3", "S1"]).map_err(|e| io::Error::other(e.to_string()))?;

        let out = tempdir()?;
        let manifest = out.path().join("inputPaths.txt");
        let selected = set.snapshot_selected_ordered();
        write_manifest(&manifest, &selected)?;

        let expected: Vec<(PathBuf, PathBuf)> = selected
            .iter()
            .map(|s| (s.forward_path().to_path_buf(), s.reverse_path().to_path_buf()))
            .collect();
        assert_eq!(read_manifest(&manifest)?, expected);
        assert_eq!(expected[0].0, reads.path().join("S1_x_pair1.truncated.fq"));
        Ok(())
    }

    #[test]
    fn test_odd_line_count_rejected() -> io::Result<()> {
        let out = tempdir()?;
        let manifest = out.path().join("inputPaths.txt");
        std::fs::write(&manifest, "/a_pair1.fq\n/a_pair2.fq\n/b_pair1.fq\n")?;
        assert_eq!(read_manifest(&manifest).unwrap_err().kind(), io::ErrorKind::InvalidData);
        Ok(())
    }
}
