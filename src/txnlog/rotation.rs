//! Daily rotation of the active transaction log
//!
//! The log rotates when the local calendar day of an entry's timestamp
//! differs from the local day of the active file's last write. Rotated
//! files are named for the day they contain; mid-day collisions get a
//! numeric suffix.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, TimeZone};

/// Suffix shared by the active log and every rotated sibling.
const LOG_SUFFIX: &str = ".txn.log";

/// Formats the local calendar date of an epoch-seconds timestamp.
pub(crate) fn local_day(ts: f64) -> String {
    match Local.timestamp_opt(ts as i64, 0).single() {
        Some(day) => day.format("%Y-%m-%d").to_string(),
        None => "1970-01-01".to_string(),
    }
}

/// Returns the local calendar date of the active file's last write, or
/// `None` when the file is missing or empty (no rotation needed).
pub(crate) fn mtime_day(active: &Path) -> io::Result<Option<String>> {
    let metadata = match fs::metadata(active) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err),
    };
    if metadata.len() == 0 {
        return Ok(None);
    }
    let modified: DateTime<Local> = metadata.modified()?.into();
    Ok(Some(modified.format("%Y-%m-%d").to_string()))
}

/// Computes the dated name for the active file: `BASE.txn.log` becomes
/// `BASE.YYYY-MM-DD.txn.log` in the same directory.
pub(crate) fn dated_path(active: &Path, day: &str) -> PathBuf {
    let name = active
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(LOG_SUFFIX);
    let base = name.strip_suffix(LOG_SUFFIX).unwrap_or(name);
    active.with_file_name(format!("{base}.{day}{LOG_SUFFIX}"))
}

/// Moves the active file aside under its dated name and re-creates an
/// empty active file.
///
/// When the dated name is already taken, the next free numeric suffix
/// (`….txn.log.1`, `….txn.log.2`, …) is used instead, so entries from
/// separate runs on the same day are never clobbered.
pub(crate) fn rotate(active: &Path, day: &str) -> io::Result<PathBuf> {
    let dated = dated_path(active, day);
    let target = if dated.exists() {
        next_free_suffix(&dated)
    } else {
        dated
    };

    fs::rename(active, &target)?;
    File::create(active)?;
    Ok(target)
}

/// Picks the first `<dated>.N` path that does not exist yet, starting at 1.
fn next_free_suffix(dated: &Path) -> PathBuf {
    let name = dated
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(LOG_SUFFIX)
        .to_string();
    let mut n = 1u32;
    loop {
        let candidate = dated.with_file_name(format!("{name}.{n}"));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_local_day_formats_calendar_date() {
        let day = local_day(0.0);
        assert_eq!(day.len(), 10);
        assert_eq!(day.matches('-').count(), 2);
        // Epoch falls on 1969-12-31 or 1970-01-01 depending on the zone.
        assert!(day.starts_with("1969-12-31") || day.starts_with("1970-01-01"));
    }

    #[test]
    fn test_dated_path_inserts_day_before_suffix() {
        let active = Path::new("/data/store.txn.log");
        assert_eq!(
            dated_path(active, "2024-03-01"),
            Path::new("/data/store.2024-03-01.txn.log")
        );
    }

    #[test]
    fn test_mtime_day_missing_and_empty_files() {
        let dir = TempDir::new().unwrap();
        let active = dir.path().join("store.txn.log");

        assert!(mtime_day(&active).unwrap().is_none());

        File::create(&active).unwrap();
        assert!(mtime_day(&active).unwrap().is_none());

        fs::write(&active, b"{}\n").unwrap();
        assert!(mtime_day(&active).unwrap().is_some());
    }

    #[test]
    fn test_rotate_moves_active_and_recreates_empty() {
        let dir = TempDir::new().unwrap();
        let active = dir.path().join("store.txn.log");
        fs::write(&active, b"{\"op\":\"insert-after\"}\n").unwrap();

        let target = rotate(&active, "2024-03-01").unwrap();

        assert_eq!(target, dir.path().join("store.2024-03-01.txn.log"));
        assert!(fs::read(&target).unwrap().starts_with(b"{"));
        assert_eq!(fs::metadata(&active).unwrap().len(), 0);
    }

    #[test]
    fn test_rotate_collision_picks_numeric_suffix() {
        let dir = TempDir::new().unwrap();
        let active = dir.path().join("store.txn.log");
        let dated = dir.path().join("store.2024-03-01.txn.log");

        fs::write(&dated, b"first\n").unwrap();
        fs::write(&active, b"second\n").unwrap();
        let target = rotate(&active, "2024-03-01").unwrap();
        assert_eq!(target, dir.path().join("store.2024-03-01.txn.log.1"));

        let mut file = File::create(&active).unwrap();
        file.write_all(b"third\n").unwrap();
        drop(file);
        let target = rotate(&active, "2024-03-01").unwrap();
        assert_eq!(target, dir.path().join("store.2024-03-01.txn.log.2"));

        assert_eq!(fs::read(&dated).unwrap(), b"first\n");
    }
}
