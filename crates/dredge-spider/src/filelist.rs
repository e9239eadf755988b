use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{trace, warn};

/// Flat log of completed downloads, one record per line:
///
/// ```text
/// url|local_path|timestamp|size
/// ```
///
/// The log is the only resumption state the dredger keeps. A URL is skipped
/// when it has a record and the recorded file is still on disk with a
/// matching size; anything else (deleted file, truncated download, malformed
/// line) falls through to a fresh fetch.
pub struct Filelist {
    path: PathBuf,
}

impl Filelist {
    pub fn open(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join("filelist.txt"),
        }
    }

    /// Linear scan for `url`; no uniqueness is enforced, the newest record
    /// wins because later lines overwrite earlier matches.
    pub fn is_complete(&self, url: &str) -> bool {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            // no log yet means nothing is complete
            Err(_) => return false,
        };

        let mut complete = false;
        for line in content.lines() {
            let fields: Vec<&str> = line.split('|').collect();
            if fields.len() != 4 {
                warn!("malformed filelist line skipped: {line}");
                continue;
            }
            if fields[0] != url {
                continue;
            }
            let local_path = Path::new(fields[1]);
            let size: u64 = match fields[3].parse() {
                Ok(size) => size,
                Err(_) => {
                    warn!("malformed filelist size skipped: {line}");
                    continue;
                }
            };
            // extracted archives are recorded against their directory, where
            // a size comparison means nothing
            complete = match std::fs::metadata(local_path) {
                Ok(meta) => meta.is_dir() || meta.len() == size,
                Err(_) => false,
            };
        }

        complete
    }

    /// Append a record for a completed download. The line is formatted up
    /// front and appended with one write, so records landing from concurrent
    /// fetch tasks cannot interleave mid-line.
    pub fn record(&self, url: &str, local_path: &str, size: u64) -> anyhow::Result<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let line = format!(
            "{url}|{local_path}|{timestamp}|{size}\n",
            timestamp = chrono::Utc::now().to_rfc3339(),
        );
        file.write_all(line.as_bytes())?;
        trace!("recorded download of {url} ({size} bytes)");
        Ok(())
    }
}

//////////////////////////////////////////////////////////////
// -- TESTS --
//////////////////////////////////////////////////////////////
