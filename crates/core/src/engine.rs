//! The engine loop: one simulation tick plus one render pass per frame.
//!
//! The loop does not own a scheduler. A host calls [`EngineLoop::frame`]
//! from its display-refresh callback, or [`EngineLoop::run_frames`] from a
//! fixed-rate headless driver. Each frame runs to completion before
//! returning, so stopping never leaves a tick half applied.

use crate::error::EngineError;
use crate::render::{Renderer, Surface};
use crate::simulation::Simulation;
use crate::world::TickReport;

/// Lifecycle of an [`EngineLoop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Stopped,
    Running,
}

/// Drives a [`Simulation`] and a [`Renderer`] in lockstep.
pub struct EngineLoop<S: Simulation> {
    sim: S,
    state: LoopState,
    frames: u64,
}

impl<S: Simulation> EngineLoop<S> {
    /// Wraps `sim` in a stopped loop.
    pub fn new(sim: S) -> Self {
        Self {
            sim,
            state: LoopState::Stopped,
            frames: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    /// Frames completed since construction.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn simulation(&self) -> &S {
        &self.sim
    }

    pub fn simulation_mut(&mut self) -> &mut S {
        &mut self.sim
    }

    pub fn into_simulation(self) -> S {
        self.sim
    }

    /// Begins running. Calling it while running is a no-op.
    pub fn start(&mut self) {
        if self.state == LoopState::Stopped {
            tracing::info!(frames = self.frames, "engine loop started");
            self.state = LoopState::Running;
        }
    }

    /// Halts ticking and rendering. Calling it while stopped is a no-op.
    pub fn stop(&mut self) {
        if self.state == LoopState::Running {
            tracing::info!(frames = self.frames, "engine loop stopped");
            self.state = LoopState::Stopped;
        }
    }

    /// Runs one tick and renders it.
    ///
    /// Returns `Ok(None)` without doing anything while stopped. If the surface
    /// is gone the loop stops and `EngineError::SurfaceUnavailable` is
    /// returned; the host must start again with a new surface.
    pub fn frame(
        &mut self,
        surface: &mut dyn Surface,
        renderer: &Renderer,
    ) -> Result<Option<TickReport>, EngineError> {
        if self.state == LoopState::Stopped {
            return Ok(None);
        }
        if !surface.is_available() {
            tracing::warn!(frames = self.frames, "drawing surface unavailable, stopping");
            self.stop();
            return Err(EngineError::SurfaceUnavailable);
        }
        let report = self.sim.step()?;
        renderer.render(&self.sim.scene(), surface);
        self.frames += 1;
        Ok(Some(report))
    }

    /// Runs up to `n` frames, stopping early if the loop stops. Returns the
    /// reports of the frames that ran.
    pub fn run_frames(
        &mut self,
        n: usize,
        surface: &mut dyn Surface,
        renderer: &Renderer,
    ) -> Result<Vec<TickReport>, EngineError> {
        let mut reports = Vec::with_capacity(n);
        for _ in 0..n {
            match self.frame(surface, renderer)? {
                Some(report) => reports.push(report),
                None => break,
            }
        }
        Ok(reports)
    }
}
