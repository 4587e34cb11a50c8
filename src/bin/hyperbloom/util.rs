use anyhow::{Context, Result};
use hyperbloom::SharedFilter;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter};
use std::path::{Path, PathBuf};

/// Keys from `--keys` (one per line, "-" = stdin) followed by `--key` literals.
pub fn collect_keys(file: Option<PathBuf>, literals: Vec<String>) -> Result<Vec<String>> {
    let mut keys = Vec::new();
    if let Some(path) = file {
        if path.as_os_str() == "-" {
            read_lines(std::io::stdin().lock(), &mut keys)?;
        } else {
            let f = File::open(&path).with_context(|| format!("open keys file {}", path.display()))?;
            read_lines(BufReader::new(f), &mut keys)?;
        }
    }
    keys.extend(literals);
    Ok(keys)
}

fn read_lines<R: BufRead>(reader: R, out: &mut Vec<String>) -> Result<()> {
    for line in reader.lines() {
        let line = line?;
        let key = line.trim_end_matches('\r');
        if !key.is_empty() {
            out.push(key.to_string());
        }
    }
    Ok(())
}

/// Save through a temp file and rename, so a failed write keeps the old file.
pub fn save_atomically(filter: &dyn SharedFilter, path: &Path) -> Result<()> {
    let tmp = path.with_extension("tmp");
    {
        let file = File::create(&tmp).with_context(|| format!("create {}", tmp.display()))?;
        let mut writer = BufWriter::new(file);
        filter.save(&mut writer)?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
    }
    std::fs::rename(&tmp, path)
        .with_context(|| format!("rename {} -> {}", tmp.display(), path.display()))?;
    Ok(())
}
