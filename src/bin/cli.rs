use anyhow::Result;
use colored::*;
use krs_watcher::{
    core::config::{WatcherConfig, DEFAULT_CONFIG_PATH},
    identifiers,
    krs::{client::USER_AGENT, KrsClient},
    notify::Delivery,
    state::StateStore,
    watcher::{summary_json, WatchOptions, Watcher},
};
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(StructOpt, Debug)]
#[structopt(name = "krs-watcher", about = "Notify about new KRS registry entries")]
struct Opt {
    /// Path to config.json (defaults to $KRS_CONFIG, then ./config.json)
    #[structopt(long, parse(from_os_str))]
    config: Option<PathBuf>,

    /// Run even outside the configured send time
    #[structopt(long)]
    force_send: bool,

    /// Log notifications instead of delivering them
    #[structopt(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();
    let opt = Opt::from_args();

    let config_path = opt
        .config
        .or_else(|| std::env::var_os("KRS_CONFIG").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = WatcherConfig::load(&config_path)?;
    log::debug!("Loaded config from {:?}", config_path);

    if !opt.force_send && !config.send_at.is_open_now() {
        println!(
            "{}",
            format!(
                "Not {} {} time, skipping this run (use --force-send to override)",
                config.send_at, config.send_at.tz
            )
            .yellow()
        );
        return Ok(());
    }

    let http_client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(config.request_timeout)
        .connect_timeout(std::time::Duration::from_secs(10))
        .build()?;

    let registry = KrsClient::new(config.api_base_url.clone(), config.request_timeout)?;
    let delivery = Delivery::from_config(&config, opt.dry_run);
    log::debug!("Delivering notifications via {:?}", delivery);
    let notifier = delivery.build(&http_client)?;

    let krs_list =
        identifiers::collect(&http_client, &config.krs, config.krs_sheet_url.as_ref()).await;
    if krs_list.is_empty() {
        println!("{}", "No KRS numbers to check".yellow());
    }

    let store = StateStore::new(&config.state_file);
    let mut state = store.load();

    let watcher = Watcher::new(
        &registry,
        notifier.as_ref(),
        WatchOptions {
            from: config.mail_from.clone(),
            recipients: config.recipients.clone(),
            send_only_on_change: config.send_only_on_change,
        },
    );
    let outcomes = watcher.run(&krs_list, &mut state).await;

    if !opt.dry_run {
        store.save(&state)?;
    }

    for outcome in &outcomes {
        let line = match (&outcome.error, outcome.changed) {
            (Some(error), _) => format!("{} {}", outcome.krs, error).red(),
            (None, Some(true)) => format!("{} new entry {}", outcome.krs, outcome.last.unwrap_or_default()).green(),
            _ => format!("{} no change", outcome.krs).normal(),
        };
        println!("{}", line);
    }
    println!("{}", summary_json(&outcomes)?);

    Ok(())
}
