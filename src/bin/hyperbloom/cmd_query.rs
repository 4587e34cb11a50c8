use anyhow::{anyhow, Result};
use hyperbloom::persist;
use std::path::PathBuf;

use super::util::collect_keys;

pub fn exec(filter: PathBuf, keys: Option<PathBuf>, key: Vec<String>, json: bool) -> Result<()> {
    let keys = collect_keys(keys, key)?;
    if keys.is_empty() {
        return Err(anyhow!("no keys given (use --key or --keys)"));
    }

    let bloom = persist::open_path(&filter)?;
    let mut hits = 0usize;
    for k in &keys {
        let present = bloom.lookup(k.as_bytes())?;
        hits += usize::from(present);
        if json {
            println!("{}", serde_json::json!({ "key": k, "present": present }));
        } else if present {
            println!("MAYBE '{}'", k);
        } else {
            println!("ABSENT '{}'", k);
        }
    }
    if !json {
        println!("{} of {} keys possibly present", hits, keys.len());
    }
    Ok(())
}
