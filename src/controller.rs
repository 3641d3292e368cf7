// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Translates input events into new viewports.  The controller never
//! touches the scheduler itself; it says what should happen and the
//! session makes it so.

use crate::sink::{InputEvent, Key, MouseButton, ScrollDirection};
use crate::viewport::{Pixel, PixelRect, Viewport};

/// Scale applied by one notch of the wheel toward the user.
pub const ZOOM_IN: f64 = 0.75;

/// Scale applied by one notch of the wheel away from the user.
pub const ZOOM_OUT: f64 = 1.33;

/// Fraction of the parameter span moved by one arrow key.
pub const PAN_STEP: f64 = 0.1;

/// Oversampling step.
pub const SUBSAMPLE_STEP: f64 = 2.0;

/// What the session should do about an event.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    /// Nothing changes
    Nothing,
    /// Show, or hide, the rectangle being dragged
    Drag(Option<PixelRect>),
    /// Cancel the current job and compute this view instead
    Restart(Viewport),
    /// Same, but the surface has to be rebuilt at the new size first
    Resize(Viewport),
    /// Leave the frame loop
    Quit,
}

#[derive(Copy, Clone, Debug, PartialEq)]
enum DragKind {
    Zoom,
    Pan,
}

#[derive(Copy, Clone, Debug)]
struct Drag {
    kind: DragKind,
    origin: Pixel,
    current: Pixel,
}

/// Tracks the one piece of state input handling needs: a drag in
/// progress.
#[derive(Debug)]
pub struct Controller {
    home: Viewport,
    drag: Option<Drag>,
}

fn changed(before: &Viewport, after: Viewport) -> Action {
    if *before == after {
        Action::Nothing
    } else {
        Action::Restart(after)
    }
}

impl Controller {
    /// `home` is where the Home key goes back to.
    pub fn new(home: Viewport) -> Self {
        Controller { home, drag: None }
    }

    /// The zoom rectangle being dragged, if any.
    pub fn drag_rect(&self) -> Option<PixelRect> {
        match self.drag {
            Some(Drag {
                kind: DragKind::Zoom,
                origin,
                current,
            }) => Some(PixelRect::from_corners(origin, current)),
            _ => None,
        }
    }

    /// Decides what an event means for the given view.
    pub fn handle(&mut self, event: &InputEvent, viewport: &Viewport) -> Action {
        match *event {
            InputEvent::Quit => Action::Quit,

            InputEvent::KeyUp(key) => match key {
                Key::Escape | Key::Q | Key::CtrlC => Action::Quit,
                Key::Up => changed(viewport, viewport.with_subsample(SUBSAMPLE_STEP)),
                Key::Down => changed(viewport, viewport.with_subsample(1.0 / SUBSAMPLE_STEP)),
                Key::Left => changed(viewport, viewport.pan_param(-PAN_STEP)),
                Key::Right => changed(viewport, viewport.pan_param(PAN_STEP)),
                Key::Home => {
                    match self.home.with_resolution(viewport.width(), viewport.height()) {
                        Some(home) => changed(viewport, home),
                        None => Action::Nothing,
                    }
                }
                Key::Other(_) => Action::Nothing,
            },

            InputEvent::Scroll(ScrollDirection::Up) => {
                changed(viewport, viewport.zoom_scale(ZOOM_IN))
            }
            InputEvent::Scroll(ScrollDirection::Down) => {
                changed(viewport, viewport.zoom_scale(ZOOM_OUT))
            }

            InputEvent::MouseDown(pos, button) => {
                let kind = match button {
                    MouseButton::Left => DragKind::Zoom,
                    MouseButton::Right => DragKind::Pan,
                    MouseButton::Middle => return Action::Nothing,
                };
                self.drag = Some(Drag {
                    kind,
                    origin: pos,
                    current: pos,
                });
                Action::Nothing
            }

            InputEvent::MouseMove(pos) => match self.drag.as_mut() {
                Some(drag) => {
                    drag.current = pos;
                    if drag.kind == DragKind::Zoom {
                        Action::Drag(Some(PixelRect::from_corners(drag.origin, pos)))
                    } else {
                        Action::Nothing
                    }
                }
                None => Action::Nothing,
            },

            InputEvent::MouseUp(pos, button) => match self.drag {
                Some(drag) if drag.kind == DragKind::Zoom && button == MouseButton::Left => {
                    self.drag = None;
                    match viewport.zoom_box(PixelRect::from_corners(drag.origin, pos)) {
                        Some(zoomed) => Action::Restart(zoomed),
                        None => Action::Drag(None),
                    }
                }
                Some(drag) if drag.kind == DragKind::Pan && button == MouseButton::Right => {
                    self.drag = None;
                    changed(
                        viewport,
                        viewport.pan(pos.0 - drag.origin.0, pos.1 - drag.origin.1),
                    )
                }
                _ => Action::Nothing,
            },

            InputEvent::Resize(width, height) => {
                self.drag = None;
                match viewport.with_resolution(width, height) {
                    Some(resized) if resized != *viewport => Action::Resize(resized),
                    _ => Action::Nothing,
                }
            }
        }
    }
}
