//! Commands: the only way hosts change a running world.
//!
//! Hosts never touch world collections directly. They send a [`Command`]
//! through a [`CommandSender`]; the world drains its receiver once at the
//! start of each tick, validates each command and applies or drops it.

use crate::config::{dimension_ok, MAX_DIMENSION};
use crate::entity::SpawnKind;
use crate::error::EngineError;
use crate::field_source::SourceParams;
use glam::DVec2;
use serde::{Deserialize, Serialize};
use std::sync::mpsc::{self, Receiver, Sender};

/// A state change requested by the host, applied at the next tick start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Create `count` entities of `kind` at `origin`. Creation is spread
    /// over as many ticks as the per-tick spawn cap requires.
    SpawnBurst {
        origin: DVec2,
        count: i64,
        kind: SpawnKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        life: Option<u32>,
    },
    /// Create one field source at `origin`.
    SpawnFieldSource { origin: DVec2, params: SourceParams },
    /// Scale the strength of every live source by `factor`.
    WeakenAllSources { factor: f64 },
    /// Put every live source into its collapsing state.
    CollapseAllSources,
    /// Change the world bounds and rebuild the grid.
    Resize { width: f64, height: f64 },
    /// Move (or with `None`, remove) the pointer that attracts motes.
    PointerMoved {
        #[serde(default)]
        position: Option<DVec2>,
    },
    /// Composite trigger: massive well, wormhole, a ring of intense warps
    /// and three rifts of rift motes around `origin`.
    Travel { origin: DVec2 },
    /// Composite trigger: weaken every source to 30 % and collapse wormholes.
    Calibrate,
}

impl Command {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Command::SpawnBurst { .. } => "spawn_burst",
            Command::SpawnFieldSource { .. } => "spawn_field_source",
            Command::WeakenAllSources { .. } => "weaken_all_sources",
            Command::CollapseAllSources => "collapse_all_sources",
            Command::Resize { .. } => "resize",
            Command::PointerMoved { .. } => "pointer_moved",
            Command::Travel { .. } => "travel",
            Command::Calibrate => "calibrate",
        }
    }

    /// Rejects negative counts, non-finite coordinates, bad factors and
    /// zero sizes.
    pub fn validate(&self) -> Result<(), EngineError> {
        match self {
            Command::SpawnBurst {
                origin,
                count,
                life,
                ..
            } => {
                check_point("origin", *origin)?;
                if *count < 0 {
                    return Err(EngineError::InvalidCommand(format!(
                        "spawn count must be >= 0, got {count}"
                    )));
                }
                if *life == Some(0) {
                    return Err(EngineError::InvalidCommand("entity life must be > 0".into()));
                }
                Ok(())
            }
            Command::SpawnFieldSource { origin, params } => {
                check_point("origin", *origin)?;
                params.validate()
            }
            Command::WeakenAllSources { factor } => {
                if !factor.is_finite() || *factor <= 0.0 {
                    return Err(EngineError::InvalidCommand(format!(
                        "weaken factor must be finite and > 0, got {factor}"
                    )));
                }
                Ok(())
            }
            Command::Resize { width, height } => {
                if !dimension_ok(*width) || !dimension_ok(*height) {
                    return Err(EngineError::InvalidCommand(format!(
                        "resize to {width}x{height}: dimensions must be finite, > 0 and <= {MAX_DIMENSION}"
                    )));
                }
                Ok(())
            }
            Command::PointerMoved { position } => match position {
                Some(p) => check_point("pointer", *p),
                None => Ok(()),
            },
            Command::Travel { origin } => check_point("origin", *origin),
            Command::CollapseAllSources | Command::Calibrate => Ok(()),
        }
    }
}

fn check_point(what: &str, p: DVec2) -> Result<(), EngineError> {
    if p.is_finite() {
        Ok(())
    } else {
        Err(EngineError::InvalidCommand(format!(
            "{what} must be finite, got ({}, {})",
            p.x, p.y
        )))
    }
}

/// Cloneable host-side handle to a world's command queue.
#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: Sender<Command>,
}

impl CommandSender {
    /// Enqueues `command` for the next tick. Validation happens on dequeue.
    ///
    /// Returns `EngineError::QueueClosed` if the world has been dropped.
    pub fn send(&self, command: Command) -> Result<(), EngineError> {
        self.tx.send(command).map_err(|_| EngineError::QueueClosed)
    }

    pub fn spawn_burst(&self, origin: DVec2, count: i64, kind: SpawnKind) -> Result<(), EngineError> {
        self.send(Command::SpawnBurst {
            origin,
            count,
            kind,
            life: None,
        })
    }

    pub fn spawn_field_source(&self, origin: DVec2, params: SourceParams) -> Result<(), EngineError> {
        self.send(Command::SpawnFieldSource { origin, params })
    }

    pub fn weaken_all_sources(&self, factor: f64) -> Result<(), EngineError> {
        self.send(Command::WeakenAllSources { factor })
    }

    pub fn collapse_all_sources(&self) -> Result<(), EngineError> {
        self.send(Command::CollapseAllSources)
    }

    pub fn resize(&self, width: f64, height: f64) -> Result<(), EngineError> {
        self.send(Command::Resize { width, height })
    }
}

/// World-side end of the queue.
#[derive(Debug)]
pub(crate) struct CommandQueue {
    tx: Sender<Command>,
    rx: Receiver<Command>,
}

impl CommandQueue {
    pub(crate) fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }

    pub(crate) fn sender(&self) -> CommandSender {
        CommandSender {
            tx: self.tx.clone(),
        }
    }

    /// Everything sent so far, in send order. Never blocks.
    pub(crate) fn drain(&self) -> Vec<Command> {
        self.rx.try_iter().collect()
    }
}
