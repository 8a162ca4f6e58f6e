use std::cell::RefCell;
use std::rc::Rc;

use crate::mapping::{RangeMapper, to_bool};
use crate::parameter::Listener;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum VisualState {
    Rotation(f32),
    Switch(bool),
}

pub trait Visual {
    fn apply(&mut self, state: VisualState);
}

impl<F> Visual for F
where
    F: FnMut(VisualState),
{
    fn apply(&mut self, state: VisualState) {
        self(state)
    }
}

/// Inverts switch states before handing them on. Rotations pass through.
pub struct Negated(pub Box<dyn Visual>);

impl Visual for Negated {
    fn apply(&mut self, state: VisualState) {
        match state {
            VisualState::Switch(active) => self.0.apply(VisualState::Switch(!active)),
            rotation => self.0.apply(rotation),
        }
    }
}

pub trait Render {
    fn render(&mut self, value: f32, force: bool) -> bool;

    fn state(&self) -> Option<VisualState>;
}

pub struct RotaryRender {
    mapper: RangeMapper,
    rotation: Option<f32>,
    visual: Box<dyn Visual>,
}

impl RotaryRender {
    pub fn new(mapper: RangeMapper, visual: Box<dyn Visual>) -> Self {
        Self {
            mapper,
            rotation: None,
            visual,
        }
    }

    pub fn rotation(&self) -> Option<f32> {
        self.rotation
    }
}

impl Render for RotaryRender {
    fn render(&mut self, value: f32, force: bool) -> bool {
        let degrees = self.mapper.to_rotation(value);
        if !force && self.rotation == Some(degrees) {
            return false;
        }
        self.rotation = Some(degrees);
        self.visual.apply(VisualState::Rotation(degrees));
        true
    }

    fn state(&self) -> Option<VisualState> {
        self.rotation.map(VisualState::Rotation)
    }
}

pub struct SwitchRender {
    active: bool,
    visual: Box<dyn Visual>,
}

impl SwitchRender {
    pub fn new(active: bool, visual: Box<dyn Visual>) -> Self {
        Self { active, visual }
    }

    pub fn active(&self) -> bool {
        self.active
    }
}

impl Render for SwitchRender {
    fn render(&mut self, value: f32, force: bool) -> bool {
        let next = to_bool(value);
        if !force && self.active == next {
            return false;
        }
        self.active = next;
        self.visual.apply(VisualState::Switch(next));
        true
    }

    fn state(&self) -> Option<VisualState> {
        Some(VisualState::Switch(self.active))
    }
}

#[derive(Clone)]
pub struct UpdateHandle {
    render: Rc<RefCell<dyn Render>>,
}

impl UpdateHandle {
    pub fn new(render: Rc<RefCell<dyn Render>>) -> Self {
        Self { render }
    }

    /// Sets the visible state. Without `force` a value that renders the same
    /// as the last one is dropped.
    pub fn update(&self, value: f32, force: bool) -> bool {
        self.render.borrow_mut().render(value, force)
    }

    pub fn state(&self) -> Option<VisualState> {
        self.render.borrow().state()
    }

    pub fn listener(&self) -> Listener {
        let handle = self.clone();
        Rc::new(move |value| {
            handle.update(value, false);
        })
    }
}
