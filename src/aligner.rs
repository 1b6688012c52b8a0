// simplecov: Per-base target coverage from minimap2 alignments.
//
// Copyright 2025 Tommi Mäklin [tommi@maklin.fi].
//
// Copyrights in this project are retained by contributors. No copyright assignment
// is required to contribute to this project.
//
// Except as otherwise noted (below and/or in individual files), this
// project is licensed under the Apache License, Version 2.0
// <LICENSE-APACHE> or <http://www.apache.org/licenses/LICENSE-2.0> or
// the MIT license, <LICENSE-MIT> or <http://opensource.org/licenses/MIT>,
// at your option.
//
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;

use log::info;

use crate::CoverageError;

/// Runs [minimap2](https://github.com/lh3/minimap2) to produce PAF alignments with `cs` tags.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Minimap2 {
    pub executable: PathBuf,
}

impl Default for Minimap2 {
    fn default() -> Self {
        Minimap2 { executable: PathBuf::from("minimap2") }
    }
}

impl Minimap2 {
    pub fn new<P: AsRef<Path>>(
        executable: P,
    ) -> Self {
        Minimap2 { executable: executable.as_ref().to_path_buf() }
    }

    /// Command that aligns `queries` to `targets` and writes the PAF to `out`.
    pub fn command(
        &self,
        targets: &Path,
        queries: &Path,
        out: &Path,
    ) -> Command {
        let mut cmd = Command::new(&self.executable);
        cmd.arg("--cs").arg("-o").arg(out).arg(targets).arg(queries);
        cmd
    }

    /// Align `queries` to `targets`, writing the alignments to `out`.
    ///
    /// ## Errors
    ///
    /// [ExternalToolFailure](CoverageError::ExternalToolFailure) if minimap2
    /// can't be started or exits with a nonzero status, and
    /// [MissingFile](CoverageError::MissingFile) if it exits successfully
    /// without writing `out`.
    ///
    pub fn run(
        &self,
        targets: &Path,
        queries: &Path,
        out: &Path,
    ) -> Result<(), CoverageError> {
        let tool = self.executable.to_string_lossy().to_string();
        info!("Running {} --cs -o {} {} {}", tool, out.display(), targets.display(), queries.display());

        let output = self.command(targets, queries, out).output().map_err(|e| CoverageError::ExternalToolFailure {
            tool: tool.clone(),
            detail: format!("could not be started: {}", e),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let detail = if stderr.is_empty() {
                format!("exit status {}", output.status)
            } else {
                format!("exit status {}: {}", output.status, stderr)
            };
            return Err(CoverageError::ExternalToolFailure { tool, detail })
        }

        if !out.exists() {
            return Err(CoverageError::MissingFile(out.to_path_buf()))
        }

        Ok(())
    }
}

// Tests
#[cfg(test)]
mod tests {

    #[test]
    fn command_arguments() {
        use super::Minimap2;
        use std::ffi::OsStr;
        use std::path::Path;

        let aligner = Minimap2::default();
        let cmd = aligner.command(Path::new("targets.fasta"), Path::new("primers.fasta"), Path::new("out.paf"));

        let got: Vec<&OsStr> = cmd.get_args().collect();
        let expected: Vec<&OsStr> = ["--cs", "-o", "out.paf", "targets.fasta", "primers.fasta"].into_iter().map(OsStr::new).collect();

        assert_eq!(cmd.get_program(), OsStr::new("minimap2"));
        assert_eq!(got, expected);
    }

    #[test]
    fn run_missing_executable() {
        use super::Minimap2;
        use crate::CoverageError;
        use std::path::Path;

        let aligner = Minimap2::new("/nonexistent/simplecov/minimap2");
        let got = aligner.run(Path::new("targets.fasta"), Path::new("primers.fasta"), Path::new("out.paf"));

        assert!(matches!(got, Err(CoverageError::ExternalToolFailure{ .. })));
    }

    #[cfg(unix)]
    #[test]
    fn run_nonzero_exit() {
        use super::Minimap2;
        use crate::CoverageError;
        use std::path::Path;

        let aligner = Minimap2::new("false");
        let got = aligner.run(Path::new("targets.fasta"), Path::new("primers.fasta"), Path::new("out.paf"));

        assert!(matches!(got, Err(CoverageError::ExternalToolFailure{ ref detail, .. }) if detail.starts_with("exit status")));
    }

    #[cfg(unix)]
    #[test]
    fn run_without_output_file() {
        use super::Minimap2;
        use crate::CoverageError;
        use std::path::Path;

        let aligner = Minimap2::new("true");
        let got = aligner.run(Path::new("targets.fasta"), Path::new("primers.fasta"), Path::new("/nonexistent/simplecov/out.paf"));

        assert!(matches!(got, Err(CoverageError::MissingFile(_))));
    }
}
