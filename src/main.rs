#![deny(clippy::implicit_return)]
#![allow(clippy::needless_return)]

mod application;
mod configuration;
mod domain;
mod infrastructure;

use std::env;
use std::process;

use anyhow::Error;
use anyhow::Result;
use domain::models::Action;
use domain::models::ConversationSettings;
use domain::models::Event;
use domain::models::Notice;
use domain::models::PayloadMode;
use domain::services::clipboard::ClipboardService;
use domain::services::ConversationStore;
use domain::services::StoreOptions;
use infrastructure::backends::BackendManager;
use tokio::sync::mpsc;
use tokio::task;
use yansi::Paint;

use crate::application::cli;
use crate::application::ui;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::services::actions::ActionsService;

fn handle_error(err: Error) {
    eprintln!(
        "{}",
        Paint::red(format!(
            "Oh no! chatclone has failed with the following app version and error.\n\nVersion: {}\nError: {}",
            env!("CARGO_PKG_VERSION"),
            err
        ))
    );

    let backtrace = err.backtrace();
    if backtrace.to_string() == "disabled backtrace" {
        let args = env::args().collect::<Vec<String>>().join(" ");
        eprintln!("\nRunning the following can help explain further what the issue is:");
        eprintln!("\nRUST_BACKTRACE=1 {args}");
    } else {
        eprintln!("\n{}", backtrace);
    }

    process::exit(1);
}

fn settings_from_config() -> Result<(ConversationSettings, StoreOptions)> {
    let settings = ConversationSettings::parse(
        &Config::get(ConfigKey::Model),
        &Config::get(ConfigKey::Temperature),
    )?;
    let options = StoreOptions {
        payload_mode: Config::get(ConfigKey::PayloadMode).parse::<PayloadMode>()?,
        system_prompt: Config::get(ConfigKey::SystemPrompt),
    };

    return Ok((settings, options));
}

async fn run() -> Result<()> {
    let (settings, options) = settings_from_config()?;

    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();
    let (event_tx, event_rx) = mpsc::unbounded_channel::<Event>();

    let backend = BackendManager::get();
    let store = ConversationStore::with_listener(
        backend.clone(),
        settings,
        options,
        event_tx.clone(),
    );

    let mut background_futures = task::JoinSet::new();

    let health_tx = event_tx.clone();
    tokio::spawn(async move {
        if let Err(err) = backend.health_check().await {
            let url = Config::get(ConfigKey::BackendURL);
            let notice = Notice::error(&format!(
                "The backend at {url} isn't reachable. Messages will fail until it is.\n\nError: {err}"
            ));
            if health_tx.send(Event::Notice(notice)).is_err() {
                tracing::debug!("UI closed before the health check finished");
            }
        }
    });

    background_futures.spawn(async move {
        return ActionsService::start(store, event_tx, &mut action_rx).await;
    });

    if let Err(clipboard_err) = ClipboardService::healthcheck() {
        tracing::warn!(err = ?clipboard_err, "Clipboard service is unable to start")
    } else {
        background_futures.spawn(async move {
            return ClipboardService::start().await;
        });
    }

    let ui_future = ui::start(action_tx, event_rx, settings);

    return tokio::select!(
        res = background_futures.join_next() => match res {
            Some(Ok(res)) => res,
            Some(Err(err)) => Err(err.into()),
            None => Ok(()),
        },
        res = ui_future => res,
    );
}

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        ui::destruct_terminal_for_panic();
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));

    let log_path = cli::log_path();
    let log_dir = log_path
        .parent()
        .map(|dir| return dir.to_path_buf())
        .unwrap_or_default();
    let file_appender = tracing_appender::rolling::never(log_dir, "debug.log");
    let (writer, _guard) = tracing_appender::non_blocking(file_appender);
    if env::var("RUST_LOG")
        .unwrap_or_else(|_| return "".to_string())
        .contains("chatclone")
    {
        tracing_subscriber::fmt()
            .json()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(writer)
            .init();
    }

    match cli::parse().await {
        Ok(true) => (),
        Ok(false) => process::exit(0),
        Err(err) => handle_error(err),
    }

    if let Err(err) = run().await {
        ui::destruct_terminal_for_panic();
        handle_error(err);
    }

    process::exit(0);
}
