use anyhow::Result;
use hyperbloom::persist;
use std::path::PathBuf;

pub fn exec(filter: PathBuf, json: bool) -> Result<()> {
    let header = persist::inspect_path(&filter)?;
    let bloom = persist::open_path(&filter)?;
    let ones = bloom.count_ones();
    let fill = ones as f64 / header.size as f64;

    if json {
        let out = serde_json::json!({
            "path": filter.display().to_string(),
            "header": header,
            "set_positions": ones,
            "fill": fill,
            "estimated_fpr": bloom.estimated_fpr(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("Filter:");
    println!("  path:          {}", filter.display());
    println!("  version:       {}", header.version);
    println!("  storage:       {}", header.storage);
    println!("  size:          {}", header.size);
    println!("  num_hashes:    {}", header.num_hashes);
    println!("  shards:        {}", header.shard_count);
    println!("  payload:       {} B", header.payload_len);
    println!("  hasher print:  {:#018x}", header.hasher_fingerprint);
    println!("  set positions: {} ({:.2}%)", ones, fill * 100.0);
    println!("  est. FPR:      {:.6}", bloom.estimated_fpr());
    Ok(())
}
