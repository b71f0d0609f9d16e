use color_eyre::{eyre::eyre, Result};
use gcpoller::adapter::GcAdapter;
use gcpoller::clock::create_best_matching_clock;
use gcpoller::config::{GcConfig, InputConfig};
use gcpoller::input::{
    AnalogDirection, CaptureSession, Capturing, GcAnalogFactory, GcButtonFactory,
};
use gcpoller::params::ParamPackage;
use gcpoller::producer::PadScript;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let config = load_config();
    info!("Using configuration: {:?}", config);

    let clock = create_best_matching_clock(config.clock.cpu_frequency, config.clock.clock_frequency);
    let adapter = Arc::new(GcAdapter::new());
    let cancel = CancellationToken::new();
    let producer = start_producer(&config, adapter.clone(), cancel.clone())?;

    let buttons = GcButtonFactory::new(adapter.clone(), config.input.axis_threshold_mode);
    let sticks = GcAnalogFactory::new(adapter.clone(), config.input.analog_deadzone);

    info!("Press a button to bind it");
    let button_binding = capture(buttons.begin_configuration(), &config.input).await;
    info!("Move a stick in two directions to bind it");
    let stick_binding = capture(sticks.begin_configuration(), &config.input).await;

    let (Some(button_binding), Some(stick_binding)) = (button_binding, stick_binding) else {
        cancel.cancel();
        producer
            .await
            .map_err(|e| eyre!("Producer task failed: {}", e))?;
        return Err(eyre!("Capture timed out before both bindings were complete"));
    };
    println!("button: {}", button_binding);
    println!("stick:  {}", stick_binding);

    let button = buttons.create(&button_binding);
    let stick = sticks.create(&stick_binding);
    for _ in 0..20 {
        tokio::time::sleep(Duration::from_millis(100)).await;
        let (x, y) = stick.status();
        info!(
            "t={}ms cpu={} cntpct={} button={} stick=({:.3}, {:.3}) right={}",
            clock.elapsed_ms(),
            clock.cpu_cycles(),
            clock.clock_cycles(),
            button.status(),
            x,
            y,
            stick.direction_status(AnalogDirection::Right)
        );
    }

    cancel.cancel();
    producer
        .await
        .map_err(|e| eyre!("Producer task failed: {}", e))?;
    info!("Shut down after {}us", clock.elapsed_us());
    Ok(())
}

fn setup() -> Result<()> {
    for (key, default) in [("RUST_LIB_BACKTRACE", "0"), ("RUST_LOG", "info")] {
        if std::env::var_os(key).is_none() {
            std::env::set_var(key, default);
        }
    }
    color_eyre::install()?;

    let level = log_level(std::env::var("RUST_LOG").ok().as_deref());
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| eyre!("Failed to install log subscriber: {}", e))
}

/// Maximum log level named by `RUST_LOG`; anything unparsable means info.
fn log_level(value: Option<&str>) -> Level {
    value
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(Level::INFO)
}

fn load_config() -> GcConfig {
    let path = GcConfig::default_path();
    match GcConfig::ensure_default(&path) {
        Ok(config) => config,
        Err(e) => {
            warn!("Falling back to default configuration: {}", e);
            GcConfig::default()
        }
    }
}

fn start_producer(
    config: &GcConfig,
    adapter: Arc<GcAdapter>,
    cancel: CancellationToken,
) -> Result<JoinHandle<()>> {
    if let Some(path) = &config.producer.script {
        info!("Replaying pad script {}", path.display());
        let script = PadScript::load(path)?;
        return Ok(script.spawn(adapter, cancel));
    }

    if let Some(handle) = start_gamepads(adapter.clone(), cancel.clone()) {
        return Ok(handle);
    }

    info!("No pad script configured, replaying the built-in demo");
    Ok(PadScript::demo().spawn(adapter, cancel))
}

#[cfg(feature = "gilrs")]
fn start_gamepads(adapter: Arc<GcAdapter>, cancel: CancellationToken) -> Option<JoinHandle<()>> {
    match gcpoller::producer::GilrsSource::create() {
        Ok(source) => Some(source.spawn(adapter, cancel)),
        Err(e) => {
            warn!("No host gamepads available ({}), using demo script", e);
            None
        }
    }
}

#[cfg(not(feature = "gilrs"))]
fn start_gamepads(_adapter: Arc<GcAdapter>, _cancel: CancellationToken) -> Option<JoinHandle<()>> {
    None
}

/// Polls a capture session until it yields a binding or the timeout passes.
async fn capture(
    mut session: CaptureSession<Capturing>,
    input: &InputConfig,
) -> Option<ParamPackage> {
    let mut ticker = tokio::time::interval(Duration::from_millis(input.capture_poll_interval_ms));
    let deadline = tokio::time::Instant::now() + Duration::from_millis(input.capture_timeout_ms);

    let binding = loop {
        ticker.tick().await;
        if let Some(params) = session.next_input() {
            break Some(params);
        }
        if tokio::time::Instant::now() >= deadline {
            warn!("No {} binding captured within {}ms", session.kind(), input.capture_timeout_ms);
            break None;
        }
    };

    let idle = session.end();
    debug!("{} session closed", idle.kind());
    binding
}
