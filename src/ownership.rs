use std::rc::Rc;

use crate::parameter::Parameter;
use crate::render::UpdateHandle;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Ownership {
    #[default]
    Controlled,
    Uncontrolled,
}

impl Ownership {
    pub fn from_controlled(controlled: bool) -> Self {
        if controlled {
            Ownership::Controlled
        } else {
            Ownership::Uncontrolled
        }
    }
}

#[derive(Clone)]
pub struct EditResolver {
    ownership: Ownership,
    parameter: Rc<dyn Parameter>,
    update: UpdateHandle,
}

impl EditResolver {
    pub fn new(ownership: Ownership, parameter: Rc<dyn Parameter>, update: UpdateHandle) -> Self {
        Self {
            ownership,
            parameter,
            update,
        }
    }

    pub fn parameter(&self) -> &Rc<dyn Parameter> {
        &self.parameter
    }

    pub fn edit(&self, value: f32) {
        self.parameter.on_edit(value);
        if self.ownership == Ownership::Uncontrolled {
            self.update.update(value, false);
        }
    }
}
