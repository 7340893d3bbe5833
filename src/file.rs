// src/file.rs

use std::{
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use crate::config::options::ExportOptions;
use crate::csv::write_dataset;
use crate::data::DataSet;
use crate::error::Result;

/// Write one dataset to `<out_dir>/course_<id>/<stem>.<ext>`.
/// Returns the final path written to.
pub fn write_export(
    export: &ExportOptions,
    course_id: u32,
    stem: &str,
    ds: &DataSet,
) -> Result<PathBuf> {
    let path = export.out_path(course_id, stem);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_directory(parent)?;
        }
    }

    let file = File::create(&path)?; // truncate/overwrite
    let mut out = BufWriter::new(file);
    write_dataset(&mut out, ds, export.format, export.include_headers)?;
    out.flush()?;

    logf!("Wrote {} rows to {}", ds.len(), path.display());
    Ok(path)
}

pub fn ensure_directory(dir: &Path) -> io::Result<()> {
    if dir.exists() && !dir.is_dir() {
        return Err(io::Error::other(format!(
            "Path exists but is not a directory: {}",
            dir.display()
        )));
    }
    if !dir.exists() { fs::create_dir_all(dir)?; }
    Ok(())
}

/* ---------------- File stems ---------------- */

pub fn tasks_stem(course_id: u32) -> String {
    format!("tasks_{course_id}")
}

pub fn quiz_stem(course_id: u32) -> String {
    format!("quiz_scores_{course_id}")
}

/// `submissions_<cid>_mod<mid>[_grp<gid>]` for one task, `..._all[...]` for all.
pub fn submissions_stem(course_id: u32, module_id: Option<&str>, group: Option<&str>) -> String {
    let mut stem = match module_id {
        Some(mid) => format!("submissions_{course_id}_mod{}", sanitize_part(mid)),
        None => format!("submissions_{course_id}_all"),
    };
    if let Some(g) = group {
        stem.push_str(&join!("_grp", &sanitize_part(g)));
    }
    stem
}

fn sanitize_part(s: &str) -> String {
    crate::core::sanitize::sanitize_stem(s, "x")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stems_follow_output_layout() {
        assert_eq!(tasks_stem(450), "tasks_450");
        assert_eq!(quiz_stem(450), "quiz_scores_450");
        assert_eq!(submissions_stem(450, Some("2817"), None), "submissions_450_mod2817");
        assert_eq!(submissions_stem(450, Some("2817"), Some("3345")), "submissions_450_mod2817_grp3345");
        assert_eq!(submissions_stem(450, None, Some("12")), "submissions_450_all_grp12");
    }
}
