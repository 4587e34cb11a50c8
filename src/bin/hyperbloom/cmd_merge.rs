use anyhow::{Context, Result};
use hyperbloom::persist;
use log::info;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use super::util::save_atomically;

pub fn exec(into: PathBuf, from: Vec<PathBuf>) -> Result<()> {
    let target = persist::open_path(&into)?;
    let before = target.count_ones();

    for path in &from {
        let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
        target
            .load(&mut BufReader::new(file))
            .with_context(|| format!("merge {}", path.display()))?;
        info!("merged {} into {}", path.display(), into.display());
    }

    save_atomically(target.as_ref(), &into)?;
    println!(
        "OK merged {} filters into {} (set positions {} -> {})",
        from.len(),
        into.display(),
        before,
        target.count_ones()
    );
    Ok(())
}
