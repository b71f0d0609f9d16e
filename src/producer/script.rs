//! Scripted pad producer
//!
//! Replays a list of timed port states into a [`GcAdapter`], standing in for
//! the adapter's polling thread. Scripts are TOML:
//!
//! ```toml
//! repeat = true
//!
//! [[step]]
//! port = 0
//! delay_ms = 250
//! buttons = ["A"]
//!
//! [[step]]
//! port = 1
//! delay_ms = 100
//! axes = { stick_x = 230, stick_y = 20 }
//! ```
//!
//! Each step replaces the whole state of its port after waiting `delay_ms`.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::adapter::{GcAdapter, PadAxis, PadButtons, PortState, PORT_COUNT};

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Failed to read script {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse script: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Step {step}: unknown button {name:?}")]
    UnknownButton { step: usize, name: String },

    #[error("Step {step}: unknown axis {name:?}")]
    UnknownAxis { step: usize, name: String },

    #[error("Step {step}: port {port} out of range")]
    PortOutOfRange { step: usize, port: usize },
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct ScriptFile {
    repeat: bool,
    step: Vec<StepFile>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct StepFile {
    port: usize,
    delay_ms: u64,
    buttons: Vec<String>,
    axes: BTreeMap<String, u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScriptStep {
    pub delay: Duration,
    pub port: usize,
    pub state: PortState,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PadScript {
    steps: Vec<ScriptStep>,
    repeat: bool,
}

impl PadScript {
    pub fn new(steps: Vec<ScriptStep>, repeat: bool) -> Self {
        Self { steps, repeat }
    }

    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        let text = std::fs::read_to_string(path).map_err(|source| ScriptError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ScriptError> {
        let file: ScriptFile = toml::from_str(text)?;
        let steps = file
            .step
            .into_iter()
            .enumerate()
            .map(|(index, step)| compile_step(index, step))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(steps, file.repeat))
    }

    /// Presses A on port 0, then sweeps the main stick of port 1.
    pub fn demo() -> Self {
        let step = |delay_ms: u64, port: usize, buttons: PadButtons, x: u8, y: u8| {
            let mut state = PortState::with_stick(x, y);
            state.buttons = buttons;
            ScriptStep {
                delay: Duration::from_millis(delay_ms),
                port,
                state,
            }
        };
        Self::new(
            vec![
                step(300, 0, PadButtons::A, 128, 128),
                step(150, 0, PadButtons::empty(), 128, 128),
                step(300, 1, PadButtons::empty(), 230, 128),
                step(100, 1, PadButtons::empty(), 230, 20),
                step(300, 1, PadButtons::empty(), 128, 128),
            ],
            true,
        )
    }

    pub fn steps(&self) -> &[ScriptStep] {
        &self.steps
    }

    pub fn repeats(&self) -> bool {
        self.repeat
    }

    /// Plays the script into `adapter` until it ends or `cancel` fires.
    ///
    /// Returns the number of steps applied.
    pub async fn replay(&self, adapter: &GcAdapter, cancel: &CancellationToken) -> usize {
        let mut applied = 0;
        if self.steps.is_empty() {
            return applied;
        }

        loop {
            for step in &self.steps {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        info!("Script replay cancelled after {} steps", applied);
                        return applied;
                    }
                    _ = tokio::time::sleep(step.delay) => {}
                }
                debug!("Script step on port {}: {:?}", step.port, step.state);
                adapter.update_port(step.port, step.state);
                applied += 1;
            }
            if !self.repeat {
                info!("Script replay finished after {} steps", applied);
                return applied;
            }
        }
    }

    pub fn spawn(self, adapter: Arc<GcAdapter>, cancel: CancellationToken) -> JoinHandle<()> {
        info!(
            "Spawning scripted producer with {} steps (repeat: {})",
            self.steps.len(),
            self.repeat
        );
        tokio::spawn(async move {
            let applied = self.replay(&adapter, &cancel).await;
            debug!("Scripted producer exited after {} steps", applied);
        })
    }
}

fn compile_step(index: usize, step: StepFile) -> Result<ScriptStep, ScriptError> {
    if step.port >= PORT_COUNT {
        return Err(ScriptError::PortOutOfRange {
            step: index,
            port: step.port,
        });
    }

    let mut state = PortState::default();
    for name in step.buttons {
        let button = PadButtons::from_name(&name.to_ascii_uppercase()).ok_or_else(|| {
            ScriptError::UnknownButton {
                step: index,
                name: name.clone(),
            }
        })?;
        state.buttons |= button;
    }
    for (name, value) in step.axes {
        let axis: PadAxis = name
            .parse()
            .map_err(|name| ScriptError::UnknownAxis { step: index, name })?;
        state.set_axis(axis, value);
    }

    Ok(ScriptStep {
        delay: Duration::from_millis(step.delay_ms),
        port: step.port,
        state,
    })
}
