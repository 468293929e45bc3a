//! Discovery of candidate scripts within the scripts directory.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::Args;
use walkdir::WalkDir;

use crate::params::{ParamSpec, extract_params};

/// File extension that identifies a candidate script.
pub const SCRIPT_EXTENSION: &str = "py";

/// CLI arguments selecting the scripts directory.
#[derive(Args, Clone, Debug)]
pub struct ScriptsArgs {
    /// Path to the directory containing the scripts to list and run.
    #[arg(long, default_value = ".")]
    scripts_dir: PathBuf,
}

impl ScriptsArgs {
    pub fn scripts_dir(&self) -> &Path {
        &self.scripts_dir
    }
}

/// One discovered candidate script. Valid for a single listing pass.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ScriptEntry {
    /// File name of the script.
    pub name: String,
    pub path: PathBuf,
    /// Parameters declared by the script, in declared order.
    pub params: Vec<ParamSpec>,
}

impl ScriptEntry {
    /// Human-readable summary of the declared parameters.
    pub fn params_summary(&self) -> String {
        if self.params.is_empty() {
            return "<none>".to_owned();
        }
        self.params
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Lists candidate scripts directly within `dir`, ordered by file name.
///
/// A script that cannot be read is logged and skipped, so that one bad
/// entry does not prevent listing the rest. An unreadable directory is an
/// error.
pub fn list_scripts(dir: &Path) -> Result<Vec<ScriptEntry>> {
    let mut entries = Vec::new();

    let walk = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name();
    for dir_entry in walk {
        let dir_entry =
            dir_entry.with_context(|| format!("listing scripts directory {:?}", dir))?;
        if !dir_entry.file_type().is_file() {
            continue;
        }
        let path = dir_entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some(SCRIPT_EXTENSION) {
            continue;
        }

        let source = match fs::read_to_string(path) {
            Ok(source) => source,
            Err(err) => {
                log::warn!("Skipping unreadable script {:?}: {}", path, err);
                continue;
            }
        };

        entries.push(ScriptEntry {
            name: dir_entry.file_name().to_string_lossy().into_owned(),
            path: path.to_owned(),
            params: extract_params(&source),
        });
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use googletest::{
        assert_that,
        matchers::{anything, elements_are, eq, err},
    };
    use tempfile::tempdir;

    use crate::params::{ParamSpec, TypeTag};

    use super::list_scripts;

    #[googletest::test]
    fn lists_scripts_sorted_with_params() {
        let dir = tempdir().expect("should create temp dir");
        fs::write(
            dir.path().join("beta.py"),
            "REQUIRED_PARAMS = [[int, 'n']]\n",
        )
        .expect("should write");
        fs::write(dir.path().join("alpha.py"), "print('hi')\n").expect("should write");
        fs::write(dir.path().join("notes.txt"), "not a script\n").expect("should write");
        fs::create_dir(dir.path().join("nested.py")).expect("should create dir");

        let entries = list_scripts(dir.path()).expect("should list");

        assert_that!(
            entries
                .iter()
                .map(|e| (e.name.as_str(), e.params.clone()))
                .collect::<Vec<_>>(),
            elements_are![
                eq(&("alpha.py", vec![])),
                eq(&("beta.py", vec![ParamSpec::new(TypeTag::Int, "n")])),
            ],
        );
    }

    #[googletest::test]
    fn does_not_recurse_into_subdirectories() {
        let dir = tempdir().expect("should create temp dir");
        fs::create_dir(dir.path().join("sub")).expect("should create dir");
        fs::write(dir.path().join("sub").join("inner.py"), "").expect("should write");

        let entries = list_scripts(dir.path()).expect("should list");

        assert_that!(entries.len(), eq(0));
    }

    #[googletest::test]
    fn missing_directory_is_an_error() {
        let dir = tempdir().expect("should create temp dir");
        let missing = dir.path().join("does-not-exist");

        assert_that!(list_scripts(&missing), err(anything()));
    }

    #[googletest::test]
    fn summary_formats_declared_params() {
        let dir = tempdir().expect("should create temp dir");
        fs::write(
            dir.path().join("job.py"),
            "REQUIRED_PARAMS = [[int, 'n'], [str, 'input_file']]\n",
        )
        .expect("should write");

        let entries = list_scripts(dir.path()).expect("should list");

        assert_that!(entries[0].params_summary(), eq("n: int, input_file: str"));
    }
}
