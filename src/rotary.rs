use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, warn};

use crate::capture::{Capture, ControlId, InputRouter};
use crate::error::ConfigError;
use crate::gesture::{EditGesture, set_value_as_gesture};
use crate::input::{InputEvent, Propagation, TouchPoint};
use crate::mapping::{DEFAULT_MAX_ROTATION, RangeMapper};
use crate::ownership::{EditResolver, Ownership};
use crate::parameter::Parameter;
use crate::render::{RotaryRender, UpdateHandle, Visual};

pub const NORMAL_DRAG_SPEED: f32 = 1.5;
pub const FINE_DRAG_SPEED: f32 = 0.25;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DragSpeed {
    pub normal: f32,
    pub fine: f32,
}

impl Default for DragSpeed {
    fn default() -> Self {
        Self {
            normal: NORMAL_DRAG_SPEED,
            fine: FINE_DRAG_SPEED,
        }
    }
}

impl DragSpeed {
    pub fn multiplier(&self, fine: bool) -> f32 {
        if fine { self.fine } else { self.normal }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RotaryConfig {
    pub max_rotation: f32,
    pub ownership: Ownership,
    pub drag: DragSpeed,
}

impl Default for RotaryConfig {
    fn default() -> Self {
        Self {
            max_rotation: DEFAULT_MAX_ROTATION,
            ownership: Ownership::Controlled,
            drag: DragSpeed::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RotaryState {
    Idle,
    Dragging,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Pointer {
    Mouse,
    Touch { id: u64, last_y: f32 },
}

struct GestureSession {
    accumulator: f32,
    pointer: Pointer,
    gesture: EditGesture,
    capture: Capture,
}

pub struct RotaryControl {
    id: ControlId,
    mapper: RangeMapper,
    initial_value: f32,
    drag: DragSpeed,
    render: Rc<RefCell<RotaryRender>>,
    update: UpdateHandle,
    resolver: EditResolver,
    router: InputRouter,
    session: Option<GestureSession>,
}

impl RotaryControl {
    pub fn new(
        id: ControlId,
        parameter: Rc<dyn Parameter>,
        visual: Box<dyn Visual>,
        router: InputRouter,
        config: RotaryConfig,
    ) -> Result<Self, ConfigError> {
        let mapper = RangeMapper::new(parameter.min(), parameter.max(), config.max_rotation)?;
        let initial_value = resolve_initial(parameter.as_ref(), &mapper)?;
        if !mapper.contains(initial_value) {
            warn!(
                "{id}: initial value {initial_value} outside [{}, {}]",
                mapper.min(),
                mapper.max()
            );
        }

        let render = Rc::new(RefCell::new(RotaryRender::new(mapper, visual)));
        let update = UpdateHandle::new(render.clone());
        let resolver = EditResolver::new(config.ownership, parameter, update.clone());
        update.update(initial_value, true);

        Ok(Self {
            id,
            mapper,
            initial_value,
            drag: config.drag,
            render,
            update,
            resolver,
            router,
            session: None,
        })
    }

    pub fn id(&self) -> ControlId {
        self.id
    }

    pub fn update_handle(&self) -> UpdateHandle {
        self.update.clone()
    }

    pub fn initial_value(&self) -> f32 {
        self.initial_value
    }

    pub fn state(&self) -> RotaryState {
        if self.session.is_some() {
            RotaryState::Dragging
        } else {
            RotaryState::Idle
        }
    }

    pub fn rotation(&self) -> Option<f32> {
        self.render.borrow().rotation()
    }

    pub fn accumulator(&self) -> Option<f32> {
        self.session.as_ref().map(|session| session.accumulator)
    }

    pub fn handle(&mut self, event: &InputEvent) -> Propagation {
        match event {
            InputEvent::MouseDown => self.press(Pointer::Mouse),
            InputEvent::TouchStart { touches } => match touches.first() {
                Some(touch) => self.press(Pointer::Touch {
                    id: touch.id,
                    last_y: touch.y,
                }),
                None => Propagation::Ignored,
            },
            InputEvent::MouseMove { delta_y, fine } => self.mouse_move(*delta_y, *fine),
            InputEvent::TouchMove { touches, fine } => self.touch_move(touches, *fine),
            InputEvent::MouseUp => match self.pointer() {
                Some(Pointer::Mouse) => self.release(),
                _ => Propagation::Ignored,
            },
            InputEvent::TouchEnd { touches } => match self.pointer() {
                Some(Pointer::Touch { id, .. }) if touches.iter().any(|t| t.id == id) => {
                    self.release()
                }
                _ => Propagation::Ignored,
            },
            InputEvent::Reset => {
                self.reset();
                Propagation::Consumed
            }
            InputEvent::Activate => Propagation::Ignored,
        }
    }

    /// Runs a complete gesture back to the initial value. The drag
    /// accumulator is left as it is.
    pub fn reset(&self) {
        set_value_as_gesture(&self.resolver, self.initial_value);
    }

    fn pointer(&self) -> Option<Pointer> {
        self.session.as_ref().map(|session| session.pointer)
    }

    fn press(&mut self, pointer: Pointer) -> Propagation {
        if self.session.is_some() {
            debug!("{}: press ignored, a drag is already in progress", self.id);
            return Propagation::Ignored;
        }

        // Start from the drawn rotation; the knob may have moved externally.
        let accumulator = self
            .rotation()
            .unwrap_or_else(|| self.mapper.to_rotation(self.initial_value));
        let gesture = EditGesture::begin(&self.resolver);
        let capture = self.router.capture(self.id);
        debug!("{}: drag started at {accumulator} degrees", self.id);
        self.session = Some(GestureSession {
            accumulator,
            pointer,
            gesture,
            capture,
        });
        Propagation::Consumed
    }

    fn mouse_move(&mut self, delta_y: f32, fine: bool) -> Propagation {
        match self.pointer() {
            Some(Pointer::Mouse) => {
                self.turn(delta_y, fine);
                Propagation::Consumed
            }
            _ => Propagation::Ignored,
        }
    }

    fn touch_move(&mut self, touches: &[TouchPoint], fine: bool) -> Propagation {
        let Some(Pointer::Touch { id, last_y }) = self.pointer() else {
            return Propagation::Ignored;
        };
        let mut last_y = last_y;
        let mut propagation = Propagation::Ignored;
        for touch in touches.iter().filter(|touch| touch.id == id) {
            let delta_y = touch.y - last_y;
            last_y = touch.y;
            if let Some(session) = self.session.as_mut() {
                session.pointer = Pointer::Touch { id, last_y };
            }
            self.turn(delta_y, fine);
            propagation = Propagation::Consumed;
        }
        propagation
    }

    fn turn(&mut self, delta_y: f32, fine: bool) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let speed = self.drag.multiplier(fine);
        session.accumulator = self
            .mapper
            .clamp_rotation(session.accumulator - delta_y * speed);
        session.gesture.edit(self.mapper.to_value(session.accumulator));
    }

    fn release(&mut self) -> Propagation {
        let Some(session) = self.session.take() else {
            return Propagation::Ignored;
        };
        let GestureSession {
            gesture, capture, ..
        } = session;
        drop(capture);
        debug!("{}: drag released", self.id);
        gesture.end();
        Propagation::Consumed
    }
}

pub(crate) fn resolve_initial(
    parameter: &dyn Parameter,
    mapper: &RangeMapper,
) -> Result<f32, ConfigError> {
    match parameter.initial_value() {
        Some(value) if !value.is_finite() => Err(ConfigError::NonFiniteInitialValue(value)),
        Some(value) => Ok(value),
        None => Ok(mapper.min()),
    }
}
