use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use rtsm_core::Randomization;
use rtsm_model::TrialDesign;

use crate::csv_writer::write_table_csv;
use crate::error::OutputError;
use crate::manifest::{OutputPaths, RunManifest};
use crate::schema::ExportSchema;
use crate::views::{allocation_view, combined_view, dispensing_view};

/// File names and encoding of the written outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputOptions {
    pub bom: bool,
    pub allocation_file: String,
    pub dispensing_file: String,
    pub manifest_file: String,
    /// Single-table export with one column per label. Not written when `None`.
    pub combined_file: Option<String>,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            bom: false,
            allocation_file: "allocation.csv".to_string(),
            dispensing_file: "dispensing.csv".to_string(),
            manifest_file: "manifest.json".to_string(),
            combined_file: None,
        }
    }
}

impl OutputOptions {
    #[must_use]
    pub fn with_bom(mut self, enable: bool) -> Self {
        self.bom = enable;
        self
    }

    #[must_use]
    pub fn with_combined(mut self, enable: bool) -> Self {
        self.combined_file = enable.then(|| "combined.csv".to_string());
        self
    }
}

/// Write the allocation list, the dispensing list and the run manifest
/// into `output_dir`, creating it if needed.
///
/// The files of a run replace the previous set together or not at all:
/// everything is written under a `.tmp` name first and moved into place
/// only once every write has succeeded.
pub fn write_outputs(
    output_dir: &Path,
    run: &Randomization,
    design: &TrialDesign,
    schema: &ExportSchema,
    options: &OutputOptions,
) -> Result<OutputPaths, OutputError> {
    fs::create_dir_all(output_dir).map_err(|error| OutputError::io(output_dir, error))?;

    let files = OutputPaths {
        allocation: Some(output_dir.join(&options.allocation_file)),
        dispensing: Some(output_dir.join(&options.dispensing_file)),
        manifest: Some(output_dir.join(&options.manifest_file)),
        combined: options
            .combined_file
            .as_ref()
            .map(|name| output_dir.join(name)),
    };
    for target in files.iter() {
        ensure_replaceable(target)?;
    }

    let mut staging = Staging::default();
    if let Err(error) = stage_outputs(&mut staging, &files, run, design, schema, options) {
        staging.discard();
        return Err(error);
    }
    staging.commit()?;

    for path in files.iter() {
        info!(path = %path.display(), "output written");
    }
    Ok(files)
}

fn stage_outputs(
    staging: &mut Staging,
    files: &OutputPaths,
    run: &Randomization,
    design: &TrialDesign,
    schema: &ExportSchema,
    options: &OutputOptions,
) -> Result<(), OutputError> {
    let records = &run.allocation.records;
    if let Some(target) = &files.allocation {
        let table = allocation_view(records, design, schema);
        write_table_csv(&staging.stage(target), &table, options.bom)?;
    }
    if let Some(target) = &files.dispensing {
        let table = dispensing_view(records, design, schema);
        write_table_csv(&staging.stage(target), &table, options.bom)?;
    }
    if let Some(target) = &files.combined {
        let table = combined_view(records, design, schema);
        write_table_csv(&staging.stage(target), &table, options.bom)?;
    }
    if let Some(target) = &files.manifest {
        RunManifest::new(run, design, files.clone())?.write(&staging.stage(target))?;
    }
    Ok(())
}

/// An existing output must be a regular file so that it can be replaced.
fn ensure_replaceable(path: &Path) -> Result<(), OutputError> {
    match fs::symlink_metadata(path) {
        Ok(metadata) if !metadata.is_file() => Err(OutputError::NotAFile {
            path: path.to_path_buf(),
        }),
        _ => Ok(()),
    }
}

fn temp_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

fn backup_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_owned();
    name.push(".bak");
    PathBuf::from(name)
}

fn remove_quietly(path: &Path) {
    if let Err(error) = fs::remove_file(path) {
        warn!(path = %path.display(), %error, "could not remove file");
    }
}

/// Outputs written under temporary names, moved over their targets together.
#[derive(Default)]
struct Staging {
    /// `(temporary, target)` pairs in write order.
    files: Vec<(PathBuf, PathBuf)>,
}

impl Staging {
    fn stage(&mut self, target: &Path) -> PathBuf {
        let temp = temp_path(target);
        self.files.push((temp.clone(), target.to_path_buf()));
        temp
    }

    fn discard(&self) {
        for (temp, _) in &self.files {
            if temp.exists() {
                remove_quietly(temp);
            }
        }
    }

    /// Move every staged file into place. Existing targets are set aside
    /// first and restored if any move fails.
    fn commit(self) -> Result<(), OutputError> {
        let mut backups: Vec<(PathBuf, PathBuf)> = Vec::new();
        for (_, target) in &self.files {
            if !target.exists() {
                continue;
            }
            let backup = backup_path(target);
            if let Err(error) = fs::rename(target, &backup) {
                restore(&backups);
                self.discard();
                return Err(OutputError::io(target, error));
            }
            backups.push((backup, target.clone()));
        }

        let mut placed: Vec<&Path> = Vec::new();
        for (temp, target) in &self.files {
            if let Err(error) = fs::rename(temp, target) {
                for path in placed {
                    remove_quietly(path);
                }
                restore(&backups);
                self.discard();
                return Err(OutputError::io(target, error));
            }
            placed.push(target);
        }

        for (backup, _) in &backups {
            remove_quietly(backup);
        }
        Ok(())
    }
}

fn restore(backups: &[(PathBuf, PathBuf)]) {
    for (backup, target) in backups {
        if let Err(error) = fs::rename(backup, target) {
            warn!(
                backup = %backup.display(),
                target = %target.display(),
                %error,
                "could not restore previous output"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staged_names_keep_the_target_extension() {
        let target = Path::new("out/allocation.csv");
        assert_eq!(temp_path(target), PathBuf::from("out/allocation.csv.tmp"));
        assert_eq!(backup_path(target), PathBuf::from("out/allocation.csv.bak"));
    }

    #[test]
    fn commit_replaces_existing_targets() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("a.csv");
        fs::write(&target, "old").expect("write old");

        let mut staging = Staging::default();
        fs::write(staging.stage(&target), "new").expect("write staged");
        staging.commit().expect("commit");

        assert_eq!(fs::read_to_string(&target).expect("read"), "new");
        assert!(!temp_path(&target).exists());
        assert!(!backup_path(&target).exists());
    }

    #[test]
    fn failed_move_restores_previous_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let first = dir.path().join("a.csv");
        let second = dir.path().join("b.csv");
        fs::write(&first, "old a").expect("write old");

        let mut staging = Staging::default();
        fs::write(staging.stage(&first), "new a").expect("write staged");
        // Never written, so moving it into place fails.
        staging.stage(&second);

        assert!(staging.commit().is_err());
        assert_eq!(fs::read_to_string(&first).expect("read"), "old a");
        assert!(!second.exists());
        assert!(!temp_path(&first).exists());
        assert!(!backup_path(&first).exists());
    }
}
