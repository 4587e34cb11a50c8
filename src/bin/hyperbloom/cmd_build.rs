use anyhow::{Context, Result};
use hyperbloom::{FilterBuilder, FilterConfig};
use log::info;
use std::path::PathBuf;

use super::cli::Geometry;
use super::util::{collect_keys, save_atomically};

pub fn exec(out: PathBuf, geometry: Geometry, keys: Option<PathBuf>, key: Vec<String>) -> Result<()> {
    let keys = collect_keys(keys, key)?;

    let config = match &geometry.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("read config {}", path.display()))?;
            serde_json::from_str::<FilterConfig>(&raw)
                .with_context(|| format!("parse config {}", path.display()))?
        }
        None => builder_for(&geometry).config()?,
    };

    let filter = config.build_shared()?;
    for k in &keys {
        filter.insert(k.as_bytes())?;
    }
    save_atomically(filter.as_ref(), &out)?;

    info!("inserted {} keys into {}", keys.len(), filter);
    println!(
        "OK built {} (size={}, k={}, shards={}, storage={}) with {} keys",
        out.display(),
        filter.size(),
        filter.num_hashes(),
        filter.shard_count(),
        filter.storage_kind(),
        keys.len()
    );
    Ok(())
}

fn builder_for(geometry: &Geometry) -> FilterBuilder {
    let mut builder = FilterBuilder::new().storage(geometry.storage);
    if let Some(size) = geometry.size {
        builder = builder.size(size);
    }
    if let Some(k) = geometry.num_hashes {
        builder = builder.num_hashes(k);
    }
    if let Some(shards) = geometry.shards {
        builder = builder.shards(shards);
    }
    builder
}
