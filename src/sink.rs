// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The boundary between the diagram and whatever puts it on a
//! screen.  The engine only ever hands columns of gray levels across
//! this boundary, and only ever receives normalized input events
//! from it.
//!
//! `HeadlessSink` keeps its surfaces in memory and replays a script
//! of input events, one batch per frame.  The binary and the tests
//! both drive sessions through it.

use std::collections::VecDeque;
use std::time::Instant;

use image::RgbImage;

use crate::errors::BifurcateError;
use crate::raster::PixelColumn;
use crate::viewport::{Pixel, PixelRect};

/// Color of the column the engine is about to compute.
pub const PROGRESS_COLOR: [u8; 3] = [0x7F, 0xFF, 0x7F];

/// Opaque reference to a surface owned by a sink.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SurfaceHandle(pub usize);

/// Keys the controller cares about.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Key {
    /// Quit
    Escape,
    /// Quit
    Q,
    /// Quit
    CtrlC,
    /// Double the vertical oversampling
    Up,
    /// Halve the vertical oversampling
    Down,
    /// Pan toward smaller parameters
    Left,
    /// Pan toward larger parameters
    Right,
    /// Back to the initial view
    Home,
    /// Anything else
    Other(char),
}

/// Mouse buttons.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MouseButton {
    /// Drags out a zoom rectangle
    Left,
    /// Drags the view around
    Right,
    /// Unused
    Middle,
}

/// Wheel direction.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ScrollDirection {
    /// Away from the user; zooms in
    Up,
    /// Toward the user; zooms out
    Down,
}

/// Everything a sink can tell the engine.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum InputEvent {
    /// The window was closed
    Quit,
    /// A key was released
    KeyUp(Key),
    /// A mouse button went down at a position
    MouseDown(Pixel, MouseButton),
    /// A mouse button came up at a position
    MouseUp(Pixel, MouseButton),
    /// The pointer moved
    MouseMove(Pixel),
    /// The wheel turned
    Scroll(ScrollDirection),
    /// The surface changed size
    Resize(usize, usize),
}

/// What the engine needs from a display.
pub trait DisplaySink {
    /// Allocates a drawable surface.
    fn create_surface(
        &mut self,
        width: usize,
        height: usize,
    ) -> Result<SurfaceHandle, BifurcateError>;

    /// Releases a surface that will not be drawn on again.
    fn destroy_surface(&mut self, _surface: SurfaceHandle) {}

    /// Writes one column into the back buffer.
    fn present_column(&mut self, surface: SurfaceHandle, column: &PixelColumn);

    /// Marks the column the engine will compute next, replacing any
    /// earlier marker.  `None` removes the marker.
    fn present_progress(&mut self, _surface: SurfaceHandle, _column: Option<usize>) {}

    /// Shows (or, with `None`, hides) the rectangle being dragged out.
    fn present_drag(&mut self, _surface: SurfaceHandle, _rect: Option<PixelRect>) {}

    /// Makes the back buffer visible.
    fn flip(&mut self, surface: SurfaceHandle);

    /// Everything that happened since the last poll.
    fn poll_events(&mut self) -> Vec<InputEvent>;

    /// Paces the frame loop; returns milliseconds since the last tick.
    fn tick(&mut self, target_fps: u32) -> u64;
}

// The progress marker is laid over the front buffer at each flip and
// never touches the back buffer.
struct Surface {
    back: RgbImage,
    front: RgbImage,
    marker: Option<usize>,
}

fn paint(image: &mut RgbImage, x: u32, y: u32, rgb: [u8; 3]) {
    let offset = ((y * image.width() + x) * 3) as usize;
    let raw: &mut [u8] = image;
    raw[offset..offset + 3].copy_from_slice(&rgb);
}

fn peek(image: &RgbImage, x: u32, y: u32) -> [u8; 3] {
    let offset = ((y * image.width() + x) * 3) as usize;
    let raw: &[u8] = image;
    [raw[offset], raw[offset + 1], raw[offset + 2]]
}

/// An in-memory display with a scripted event queue.
pub struct HeadlessSink {
    surfaces: Vec<Option<Surface>>,
    script: VecDeque<Vec<InputEvent>>,
    drag: Option<PixelRect>,
    flips: usize,
    columns_presented: usize,
    last_tick: Instant,
}

impl Default for HeadlessSink {
    fn default() -> Self {
        HeadlessSink::new(Vec::new())
    }
}

impl HeadlessSink {
    /// Each entry of `script` is delivered by one call to
    /// `poll_events`.
    pub fn new(script: Vec<Vec<InputEvent>>) -> Self {
        HeadlessSink {
            surfaces: Vec::new(),
            script: script.into_iter().collect(),
            drag: None,
            flips: 0,
            columns_presented: 0,
            last_tick: Instant::now(),
        }
    }

    /// Queues another batch of events for a future frame.
    pub fn push_events(&mut self, events: Vec<InputEvent>) {
        self.script.push_back(events);
    }

    /// True once every scripted batch has been delivered.
    pub fn script_exhausted(&self) -> bool {
        self.script.is_empty()
    }

    /// How many frames have been flipped.
    pub fn flips(&self) -> usize {
        self.flips
    }

    /// How many columns have been written, across all surfaces.
    pub fn columns_presented(&self) -> usize {
        self.columns_presented
    }

    /// The drag rectangle currently on display.
    pub fn drag(&self) -> Option<PixelRect> {
        self.drag
    }

    /// What the surface showed at the last flip.
    pub fn frame(&self, surface: SurfaceHandle) -> Option<&RgbImage> {
        self.surface(surface).map(|s| &s.front)
    }

    /// One pixel of what the surface showed at the last flip.
    pub fn pixel(&self, surface: SurfaceHandle, x: u32, y: u32) -> Option<[u8; 3]> {
        let frame = self.frame(surface)?;
        if x < frame.width() && y < frame.height() {
            Some(peek(frame, x, y))
        } else {
            None
        }
    }

    fn surface(&self, surface: SurfaceHandle) -> Option<&Surface> {
        self.surfaces.get(surface.0).and_then(|s| s.as_ref())
    }

    fn surface_mut(&mut self, surface: SurfaceHandle) -> Option<&mut Surface> {
        self.surfaces.get_mut(surface.0).and_then(|s| s.as_mut())
    }
}

impl DisplaySink for HeadlessSink {
    fn create_surface(
        &mut self,
        width: usize,
        height: usize,
    ) -> Result<SurfaceHandle, BifurcateError> {
        if width == 0 || height == 0 || width > u32::MAX as usize || height > u32::MAX as usize {
            return Err(BifurcateError::Surface { width, height });
        }
        let blank = RgbImage::new(width as u32, height as u32);
        self.surfaces.push(Some(Surface {
            back: blank.clone(),
            front: blank,
            marker: None,
        }));
        Ok(SurfaceHandle(self.surfaces.len() - 1))
    }

    fn destroy_surface(&mut self, surface: SurfaceHandle) {
        if let Some(slot) = self.surfaces.get_mut(surface.0) {
            *slot = None;
        }
    }

    fn present_column(&mut self, surface: SurfaceHandle, column: &PixelColumn) {
        let surface = match self.surface_mut(surface) {
            Some(surface) => surface,
            None => return,
        };
        let (width, height) = surface.back.dimensions();
        if column.column >= width as usize {
            return;
        }
        let x = column.column as u32;
        // Row 0 is the bottom of the view; image y grows downward.
        for (row, level) in column.intensities.iter().take(height as usize).enumerate() {
            let y = height - 1 - row as u32;
            paint(&mut surface.back, x, y, [*level, *level, *level]);
        }
        self.columns_presented += 1;
    }

    fn present_progress(&mut self, surface: SurfaceHandle, column: Option<usize>) {
        if let Some(surface) = self.surface_mut(surface) {
            surface.marker = column;
        }
    }

    fn present_drag(&mut self, _surface: SurfaceHandle, rect: Option<PixelRect>) {
        self.drag = rect;
    }

    fn flip(&mut self, surface: SurfaceHandle) {
        if let Some(surface) = self.surface_mut(surface) {
            surface.front.clone_from(&surface.back);
            let (width, height) = surface.front.dimensions();
            match surface.marker {
                Some(column) if column < width as usize => {
                    for y in 0..height {
                        paint(&mut surface.front, column as u32, y, PROGRESS_COLOR);
                    }
                }
                _ => {}
            }
        }
        self.flips += 1;
    }

    fn poll_events(&mut self) -> Vec<InputEvent> {
        self.script.pop_front().unwrap_or_default()
    }

    fn tick(&mut self, _target_fps: u32) -> u64 {
        let elapsed = self.last_tick.elapsed();
        self.last_tick = Instant::now();
        elapsed.as_secs() * 1000 + u64::from(elapsed.subsec_millis())
    }
}
