use std::fs::{self, File};
use std::path::Path;

use anyhow::Context as _;
use directories::ProjectDirs;
use mapscrip_application::{Session, load_catalog};
use mapscrip_engine::ContentClient;
use mapscrip_storage::Storage;
use mapscrip_ui::Ui;

const LOG_FILE: &str = "mapscrip.log";

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:?}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let project_dirs =
        ProjectDirs::from("dev", "mapscrip", "mapscrip").context("resolve project dirs")?;

    let config_dir = project_dirs.config_dir();
    fs::create_dir_all(config_dir)
        .with_context(|| format!("create config dir {}", config_dir.display()))?;
    init_logging(config_dir)?;

    let storage = Storage::open(config_dir)?;
    let mut settings = storage.load_settings()?;
    if let Ok(base_url) = std::env::var("MAPSCRIP_BASE_URL")
        && !base_url.trim().is_empty()
    {
        log::info!("base url overridden by MAPSCRIP_BASE_URL: {base_url}");
        settings.base_url = base_url.trim().to_string();
        settings.normalize();
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .context("start async runtime")?;

    let client = ContentClient::new(settings.base_url.clone()).context("create http client")?;
    log::info!("loading catalog from {}", client.base_url());
    let catalog = runtime
        .block_on(load_catalog(&client))
        .with_context(|| format!("content unavailable from {}", client.base_url()))?;

    let address = std::env::args().nth(1).unwrap_or_default();
    let mut ui = Ui::new(Session::new(settings, catalog), client, runtime.handle().clone());
    let session = ui.run(&address)?;

    // Only the persisted part of the session outlives the process; the base
    // url override stays a per-run setting.
    let mut saved = storage.load_settings()?;
    saved.text_source = session.settings.text_source;
    storage.save_settings(&saved)?;

    log::info!("session ended at {:?}", session.address());
    runtime.shutdown_background();
    Ok(())
}

fn init_logging(dir: &Path) -> anyhow::Result<()> {
    let path = dir.join(LOG_FILE);
    let file = File::create(&path).with_context(|| format!("create log {}", path.display()))?;
    env_logger::Builder::from_env(
        env_logger::Env::default()
            .filter_or("MAPSCRIP_LOG", "info")
            .write_style_or("MAPSCRIP_LOG_STYLE", "never"),
    )
    .target(env_logger::Target::Pipe(Box::new(file)))
    .init();
    Ok(())
}
