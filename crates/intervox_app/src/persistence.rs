use std::fs;
use std::io::Write;
use std::path::Path;

use client_logging::{client_error, client_info, client_warn};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

const HISTORY_FILENAME: &str = ".intervox_history.ron";

/// One finished batch run, as recorded on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecord {
    pub project_id: String,
    pub kind: String,
    pub processed: u64,
    pub total: u64,
    pub failed: u64,
    pub finished_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct History {
    runs: Vec<RunRecord>,
}

pub fn load_history(dir: &Path) -> Vec<RunRecord> {
    let path = dir.join(HISTORY_FILENAME);
    let content = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Vec::new();
        }
        Err(err) => {
            client_warn!("Failed to read run history from {:?}: {}", path, err);
            return Vec::new();
        }
    };

    let history: History = match ron::from_str(&content) {
        Ok(history) => history,
        Err(err) => {
            client_warn!("Failed to parse run history from {:?}: {}", path, err);
            return Vec::new();
        }
    };

    history.runs
}

pub fn append_run(dir: &Path, record: RunRecord) {
    let mut runs = load_history(dir);
    runs.push(record);

    let history = History { runs };
    let pretty = ron::ser::PrettyConfig::new();
    let content = match ron::ser::to_string_pretty(&history, pretty) {
        Ok(text) => text,
        Err(err) => {
            client_error!("Failed to serialize run history: {}", err);
            return;
        }
    };

    if let Err(err) = write_atomic(dir, HISTORY_FILENAME, &content) {
        client_error!("Failed to write run history to {:?}: {}", dir, err);
        return;
    }
    client_info!("Recorded finished run in {:?}", dir.join(HISTORY_FILENAME));
}

/// Write `{dir}/{filename}` via a temp file and rename, never in place.
fn write_atomic(dir: &Path, filename: &str, content: &str) -> std::io::Result<()> {
    let target = dir.join(filename);
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.flush()?;
    tmp.as_file_mut().sync_all()?;

    if target.exists() {
        fs::remove_file(&target)?;
    }
    tmp.persist(&target).map_err(|e| e.error)?;
    Ok(())
}
