use std::cell::RefCell;
use std::rc::Rc;

use log::debug;

use crate::capture::ControlId;
use crate::gesture::set_value_as_gesture;
use crate::input::{InputEvent, Propagation};
use crate::mapping::{from_bool, to_bool};
use crate::ownership::{EditResolver, Ownership};
use crate::parameter::Parameter;
use crate::render::{SwitchRender, UpdateHandle, Visual};

pub struct ToggleControl {
    id: ControlId,
    render: Rc<RefCell<SwitchRender>>,
    update: UpdateHandle,
    resolver: EditResolver,
}

impl ToggleControl {
    pub fn new(
        id: ControlId,
        parameter: Rc<dyn Parameter>,
        visual: Box<dyn Visual>,
        ownership: Ownership,
    ) -> Self {
        let initial = parameter.initial_value().is_some_and(to_bool);
        let render = Rc::new(RefCell::new(SwitchRender::new(initial, visual)));
        let update = UpdateHandle::new(render.clone());
        let resolver = EditResolver::new(ownership, parameter, update.clone());
        update.update(from_bool(initial), true);

        Self {
            id,
            render,
            update,
            resolver,
        }
    }

    pub fn id(&self) -> ControlId {
        self.id
    }

    pub fn update_handle(&self) -> UpdateHandle {
        self.update.clone()
    }

    pub fn is_on(&self) -> bool {
        self.render.borrow().active()
    }

    pub fn handle(&mut self, event: &InputEvent) -> Propagation {
        match event {
            InputEvent::Activate => {
                self.toggle();
                Propagation::Consumed
            }
            _ => Propagation::Ignored,
        }
    }

    pub fn toggle(&self) {
        let next = !self.is_on();
        debug!("{}: requesting {}", self.id, if next { "on" } else { "off" });
        set_value_as_gesture(&self.resolver, from_bool(next));
    }
}
