use std::process::exit;
use std::sync::{Arc, OnceLock};

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use iotpump::config::Config;
use iotpump::core::convert::ConverterRegistry;
use iotpump::core::pump::Pump;
use iotpump::core::queue::IngestQueue;
use iotpump::core::sink::LogSink;
use iotpump::core::source::MqttSource;
use iotpump::logger::LoggerManager;
use iotpump::{print_error, print_info};

static CONFIG: OnceLock<Config> = OnceLock::new();

fn config() -> &'static Config {
    CONFIG.get_or_init(|| match Config::new() {
        Ok(config) => config,
        Err(err) => {
            print_error!("configuration error: {err}");
            exit(1);
        }
    })
}

#[tokio::main]
async fn main() {
    let cfg = config();

    print_info!("initializing logging");
    if let Err(err) = LoggerManager::new(&cfg.logger).and_then(|manager| manager.init()) {
        print_error!("logger error: {err}");
        exit(1);
    }
    info!(version = env!("CARGO_PKG_VERSION"), "starting iotpump");

    let mut registry = ConverterRegistry::builtin();
    registry.apply_overrides(&cfg.convert);

    let (handle, queue) = IngestQueue::channel();
    let cancel = CancellationToken::new();

    let source = MqttSource::new(cfg.mqtt.clone(), handle, cancel.clone());
    let mut state = source.state();
    tokio::spawn(async move {
        while state.changed().await.is_ok() {
            info!("mqtt source: {}", *state.borrow_and_update());
        }
    });
    let source_task = tokio::spawn(source.run());

    let pump = Pump::new(
        queue,
        registry,
        cfg.series.prefix.clone(),
        Arc::new(LogSink),
    );
    let pump_task = tokio::spawn(pump.run());

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("interrupt received, shutting down");
            cancel.cancel();
        }
        result = source_task => match result {
            Ok(Ok(())) => info!("mqtt source finished"),
            Ok(Err(err)) => error!("mqtt source failed: {err}"),
            Err(err) => error!("mqtt source task panicked: {err}"),
        }
    }

    // the source dropped its queue handle by now, so the pump drains the
    // remaining events and exits on its own
    if let Err(err) = pump_task.await {
        error!("pump task panicked: {err}");
    }
    info!("iotpump stopped");
}
