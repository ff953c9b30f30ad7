use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

/// Optional JSONL mirror of stdout. Set once in main(), fed by emit().
static JSONL_FILE: OnceLock<Mutex<BufWriter<File>>> = OnceLock::new();

/// `<dir>/<mode>_<YYYYMMDD-HHMMSS>.jsonl`, creating `dir` if needed.
pub fn jsonl_path(dir: &Path, mode: &str) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    Ok(dir.join(format!("{mode}_{timestamp}.jsonl")))
}

pub fn open_jsonl(path: &Path) -> io::Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    JSONL_FILE
        .set(Mutex::new(BufWriter::new(file)))
        .map_err(|_| io::Error::new(io::ErrorKind::AlreadyExists, "JSONL file already open"))
}

pub fn mirror_line(line: &str) {
    if let Some(file) = JSONL_FILE.get() {
        if let Ok(mut w) = file.lock() {
            let _ = writeln!(w, "{line}");
            let _ = w.flush();
        }
    }
}
