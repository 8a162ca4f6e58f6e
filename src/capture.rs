use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ControlId(pub u32);

impl fmt::Display for ControlId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "control#{}", self.0)
    }
}

type Registry = RefCell<Vec<(u64, ControlId)>>;

#[derive(Clone, Default)]
pub struct InputRouter {
    registry: Rc<Registry>,
    next_token: Rc<Cell<u64>>,
}

impl InputRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn capture(&self, control: ControlId) -> Capture {
        let token = self.next_token.get();
        self.next_token.set(token.wrapping_add(1));
        self.registry.borrow_mut().push((token, control));
        Capture {
            token,
            control,
            registry: Rc::downgrade(&self.registry),
        }
    }

    pub fn captured(&self) -> Vec<ControlId> {
        self.registry
            .borrow()
            .iter()
            .map(|(_, control)| *control)
            .collect()
    }

    pub fn is_captured(&self, control: ControlId) -> bool {
        self.registry.borrow().iter().any(|(_, c)| *c == control)
    }

    pub fn len(&self) -> usize {
        self.registry.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.borrow().is_empty()
    }
}

pub struct Capture {
    token: u64,
    control: ControlId,
    registry: Weak<Registry>,
}

impl Capture {
    pub fn control(&self) -> ControlId {
        self.control
    }
}

impl Drop for Capture {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.borrow_mut().retain(|(token, _)| *token != self.token);
        }
    }
}

impl fmt::Debug for Capture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capture")
            .field("token", &self.token)
            .field("control", &self.control)
            .finish()
    }
}
