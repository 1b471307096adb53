use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
mod config;
mod error;
mod events;
mod services;
mod utils;

use config::Config;
use events::HostEvent;
use services::host::SignalSourceTrait;
use services::{create_backend, remote, FocusDispatcher, TokioTimerScheduler};

#[derive(Parser, Debug)]
#[command(name = "mouse-follows-focus")]
#[command(about = "Перемещает указатель мыши в окно, получившее фокус")]
struct Args {
    /// Путь к файлу конфигурации
    #[arg(short, long, default_value = "mff.toml")]
    config: String,

    /// Режим сухого запуска (эмулируемый рабочий стол)
    #[arg(long)]
    dry_run: bool,

    /// Уровень логирования (перекрывает конфигурацию)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Загрузка конфигурации до логирования: уровень зависит от enable_debugging
    let config = Arc::new(Config::load(&args.config)?);

    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.effective_log_level().to_string());
    init_tracing(&level, &config.logging.format)?;

    info!("Запуск Mouse Follows Focus v{}", env!("CARGO_PKG_VERSION"));
    info!("Конфигурация загружена из: {}", args.config);

    if args.dry_run {
        warn!("Режим сухого запуска - указатель перемещается только в эмуляции");
    }

    let (event_tx, event_rx) = mpsc::channel::<HostEvent>(256);
    let (command_tx, command_rx) = mpsc::channel(16);

    let backend = create_backend(config.clone(), args.dry_run)?;
    let timers = TokioTimerScheduler::new(event_tx.clone());
    let dispatcher = FocusDispatcher::new(config.focus.clone(), backend.host, timers);

    // Соединение D-Bus должно жить до конца работы
    let _remote_connection = if config.remote.enabled {
        match remote::serve(&config.remote, command_tx.clone()).await {
            Ok(connection) => Some(connection),
            Err(e) => {
                warn!("Удалённые команды недоступны: {}", e);
                None
            }
        }
    } else {
        None
    };

    info!("Все компоненты инициализированы");

    let dispatcher_handle = tokio::spawn(dispatcher.run(event_rx, command_rx));
    let signals = backend.signals;
    let signals_tx = event_tx.clone();
    let signals_handle = tokio::spawn(async move {
        if let Err(e) = signals.run(signals_tx).await {
            error!("Ошибка в источнике событий: {}", e);
        }
    });

    info!("Все сервисы запущены");

    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Получен сигнал завершения (Ctrl+C)");
        }
        Err(err) => {
            error!("Ошибка при ожидании сигнала завершения: {}", err);
        }
    }

    info!("Завершение работы...");

    // Источник событий больше не нужен, движок останавливается штатно
    signals_handle.abort();
    if event_tx.send(HostEvent::Shutdown).await.is_err() {
        warn!("Цикл событий уже завершён");
    }

    let shutdown_timeout = tokio::time::Duration::from_secs(5);
    match tokio::time::timeout(shutdown_timeout, dispatcher_handle).await {
        Ok(_) => info!("Все сервисы завершили работу корректно"),
        Err(_) => warn!("Таймаут при завершении сервисов"),
    }

    info!("Mouse Follows Focus завершил работу");
    Ok(())
}

fn init_tracing(level: &str, format: &str) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))?;

    let registry = tracing_subscriber::registry().with(filter);
    if format == "compact" {
        registry.with(tracing_subscriber::fmt::layer().compact()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    Ok(())
}
