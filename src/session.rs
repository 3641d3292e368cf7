// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The frame loop.  Each frame polls the sink for input, lets the
//! controller turn it into new viewports, gives the scheduler one
//! tick, and flips the surface if anything changed.

use tracing::{debug, info};

use crate::config::Config;
use crate::controller::{Action, Controller};
use crate::errors::BifurcateError;
use crate::scheduler::Scheduler;
use crate::sink::{DisplaySink, SurfaceHandle};
use crate::viewport::Viewport;

/// Whether the frame loop should keep going.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Flow {
    /// Keep going
    Continue,
    /// The user asked to leave
    Quit,
}

/// A display, the current view, and the machinery that computes it.
pub struct Session<S: DisplaySink> {
    config: Config,
    sink: S,
    surface: SurfaceHandle,
    viewport: Viewport,
    controller: Controller,
    scheduler: Scheduler,
    frames: usize,
}

impl<S: DisplaySink> Session<S> {
    /// Validates the configuration, creates the surface, and starts
    /// computing the initial view.
    pub fn new(config: Config, mut sink: S) -> Result<Self, BifurcateError> {
        config.validate()?;
        let viewport = Viewport::new(
            config.width,
            config.height,
            config.param_range,
            config.value_range,
            config.subsample,
        )?;
        let surface = sink.create_surface(viewport.width(), viewport.height())?;
        let mut scheduler = Scheduler::new(&config);
        scheduler.restart(viewport.clone())?;
        Ok(Session {
            config,
            sink,
            surface,
            controller: Controller::new(viewport.clone()),
            viewport,
            scheduler,
            frames: 0,
        })
    }

    /// The view being computed.
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// The scheduler, for progress reporting.
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// The display.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// The display, mutably.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// The surface being drawn on.
    pub fn surface(&self) -> SurfaceHandle {
        self.surface
    }

    /// How many frames have run.
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Gives the display back.
    pub fn into_sink(self) -> S {
        self.sink
    }

    fn restart(&mut self, viewport: Viewport) -> Result<(), BifurcateError> {
        self.viewport = viewport;
        self.scheduler.restart(self.viewport.clone())?;
        Ok(())
    }

    fn apply(&mut self, action: Action) -> Result<Flow, BifurcateError> {
        match action {
            Action::Nothing => {}
            Action::Drag(rect) => self.sink.present_drag(self.surface, rect),
            Action::Restart(viewport) => {
                self.sink.present_drag(self.surface, None);
                self.restart(viewport)?;
            }
            Action::Resize(viewport) => {
                self.scheduler.cancel();
                self.sink.destroy_surface(self.surface);
                self.surface = self
                    .sink
                    .create_surface(viewport.width(), viewport.height())?;
                debug!(
                    width = viewport.width(),
                    height = viewport.height(),
                    "surface resized"
                );
                self.restart(viewport)?;
            }
            Action::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    /// Runs one frame.
    pub fn frame(&mut self) -> Result<Flow, BifurcateError> {
        let mut dirty = false;
        for event in self.sink.poll_events() {
            let action = self.controller.handle(&event, &self.viewport);
            dirty |= action != Action::Nothing;
            if self.apply(action)? == Flow::Quit {
                info!(frames = self.frames, "quitting");
                return Ok(Flow::Quit);
            }
        }

        let report = self.scheduler.tick(&mut self.sink, self.surface);
        if dirty || report.presented > 0 {
            self.sink.flip(self.surface);
        }
        self.sink.tick(self.config.target_fps);
        self.frames += 1;
        Ok(Flow::Continue)
    }

    /// Runs frames until the user quits.
    pub fn run(&mut self) -> Result<(), BifurcateError> {
        while self.frame()? == Flow::Continue {}
        Ok(())
    }

    /// Runs frames while `keep_going` says so, or until the user
    /// quits.  Returns how the loop ended.
    pub fn run_while<F>(&mut self, mut keep_going: F) -> Result<Flow, BifurcateError>
    where
        F: FnMut(&Self) -> bool,
    {
        while keep_going(self) {
            if self.frame()? == Flow::Quit {
                return Ok(Flow::Quit);
            }
        }
        Ok(Flow::Continue)
    }
}
