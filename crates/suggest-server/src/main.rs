//! suggestion_server — отдаёт ранжированные подсказки по HTTP и раз в
//! 15 минут перечитывает их из JSON-файла.
//!
//! # Запуск
//!
//! ```bash
//! RUST_LOG=info cargo run -p suggest-server -- 0.0.0.0 8080 --source suggestions.json
//! curl -X POST -d '{"input":"hel"}' http://localhost:8080/v1/api/suggest
//! ```

use std::{
    net::{IpAddr, SocketAddr},
    path::PathBuf,
    sync::Arc,
    time::Duration,
};

use anyhow::{Context, Result};
use clap::Parser;
use suggest_common::{DEFAULT_REFRESH_INTERVAL_SECS, DEFAULT_SOURCE_PATH};
use suggest_server::{
    index::SuggestionIndex, refresher::Refresher, server::SuggestServer, source::JsonFileSource,
};
use tracing::{error, info};

/// Сервер подсказок.
///
/// Отвечает на `POST /v1/api/suggest` с телом `{"input": "..."}` и
/// периодически обновляет набор подсказок из файла в фоне.
#[derive(Parser, Debug)]
#[command(name = "suggestion_server")]
#[command(version, about)]
struct Args {
    /// IP-адрес для приёма подключений.
    address: IpAddr,

    /// TCP-порт для приёма подключений.
    port: u16,

    /// JSON-файл с подсказками (массив объектов `id`, `name`, `cost`).
    #[arg(long, default_value = DEFAULT_SOURCE_PATH)]
    source: PathBuf,

    /// Пауза между обновлениями подсказок, в секундах.
    #[arg(long, default_value_t = DEFAULT_REFRESH_INTERVAL_SECS)]
    refresh_interval: u64,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    if let Err(e) = run() {
        error!("{e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();
    let addr = SocketAddr::new(args.address, args.port);

    // Индекс разделяется между потоком обновления и обработчиками запросов
    let index = Arc::new(SuggestionIndex::new());

    let server = SuggestServer::bind(addr, Arc::clone(&index)).context("start HTTP server")?;

    // ── Запуск потока обновления ──
    let source = JsonFileSource::new(&args.source);
    info!(source = %source.path().display(), interval_secs = args.refresh_interval, "loading suggestions");
    let refresher = Refresher::new(
        source,
        Arc::clone(&index),
        Duration::from_secs(args.refresh_interval),
    )
    .spawn()
    .context("spawn refresher thread")?;

    // Ctrl+C останавливает цикл приёма, после чего гасим и обновление
    let shutdown = server.shutdown_handle();
    ctrlc::set_handler(move || {
        info!("Ctrl+C received, shutting down...");
        shutdown.shutdown();
    })
    .context("set Ctrl+C handler")?;

    server.run();

    if let Err(e) = refresher.stop() {
        error!("refresher thread panicked: {e:?}");
    }
    info!("server shut down cleanly");

    Ok(())
}
