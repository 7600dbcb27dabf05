use anyhow::{anyhow, Result};
use krs_watcher::krs::analyze_odpis_at;
use std::fs;
use structopt::StructOpt;

#[derive(StructOpt, Debug)]
#[structopt(name = "odpis-analyzer", about = "Analyse a saved KRS extract (OdpisPelny JSON)")]
struct Opt {
    /// Extract file to analyse
    #[structopt(parse(from_os_str))]
    input: std::path::PathBuf,

    /// Report on this entry number instead of the latest one
    #[structopt(long)]
    entry: Option<u64>,
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();
    let opt = Opt::from_args();

    let content = fs::read_to_string(&opt.input)
        .map_err(|e| anyhow!("Cannot read {:?}: {}", opt.input, e))?;
    let record: serde_json::Value = serde_json::from_str(&content)
        .map_err(|e| anyhow!("Invalid JSON in {:?}: {}", opt.input, e))?;

    let analysis = analyze_odpis_at(&record, opt.entry);
    println!("{}", serde_json::to_string_pretty(&analysis)?);

    if !analysis.ok {
        std::process::exit(1);
    }
    Ok(())
}
