use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::mapping::from_bool;
use crate::parameter::{Listener, Parameter, Subscription};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum EditPolicy {
    #[default]
    Accept,
    // Clamp, then snap to `steps` equal intervals across the range.
    Quantize { steps: u32 },
    // Keep the current value and re-publish it.
    Reject,
}

type Listeners = RefCell<Vec<(u64, Listener)>>;

pub struct ParameterModel {
    min: f32,
    max: f32,
    initial: f32,
    value: Cell<f32>,
    policy: EditPolicy,
    open_gestures: Cell<u32>,
    listeners: Rc<Listeners>,
    next_listener: Cell<u64>,
}

impl ParameterModel {
    pub fn new(min: f32, max: f32, initial: f32) -> Self {
        let mut model = Self {
            min,
            max,
            initial,
            value: Cell::new(initial),
            policy: EditPolicy::Accept,
            open_gestures: Cell::new(0),
            listeners: Rc::new(RefCell::new(Vec::new())),
            next_listener: Cell::new(0),
        };
        model.initial = model.canonical(initial);
        model.value.set(model.initial);
        model
    }

    pub fn switch(initial: bool) -> Self {
        Self::new(0.0, 1.0, from_bool(initial)).with_policy(EditPolicy::Quantize { steps: 1 })
    }

    pub fn with_policy(mut self, policy: EditPolicy) -> Self {
        self.policy = policy;
        self.initial = self.canonical(self.initial);
        self.value.set(self.initial);
        self
    }

    pub fn value(&self) -> f32 {
        self.value.get()
    }

    pub fn is_editing(&self) -> bool {
        self.open_gestures.get() > 0
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn set(&self, value: f32) {
        self.value.set(self.clamp(value));
        self.publish();
    }

    fn clamp(&self, value: f32) -> f32 {
        let (low, high) = if self.min <= self.max {
            (self.min, self.max)
        } else {
            (self.max, self.min)
        };
        if value.is_nan() {
            return low;
        }
        value.clamp(low, high)
    }

    fn canonical(&self, value: f32) -> f32 {
        let clamped = self.clamp(value);
        match self.policy {
            EditPolicy::Quantize { steps } if steps > 0 && self.max != self.min => {
                let span = self.max - self.min;
                let position = ((clamped - self.min) / span * steps as f32).round();
                self.min + position / steps as f32 * span
            }
            _ => clamped,
        }
    }

    fn publish(&self) {
        let value = self.value.get();
        let listeners: Vec<Listener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener(value);
        }
    }
}

impl Parameter for ParameterModel {
    fn min(&self) -> f32 {
        self.min
    }

    fn max(&self) -> f32 {
        self.max
    }

    fn initial_value(&self) -> Option<f32> {
        Some(self.initial)
    }

    fn on_begin_edit(&self) {
        self.open_gestures.set(self.open_gestures.get() + 1);
    }

    fn on_edit(&self, value: f32) {
        if self.policy != EditPolicy::Reject {
            self.value.set(self.canonical(value));
        }
        self.publish();
    }

    fn on_end_edit(&self) {
        self.open_gestures.set(self.open_gestures.get().saturating_sub(1));
    }

    fn subscribe(&self, listener: Listener) -> Option<Subscription> {
        let id = self.next_listener.get();
        self.next_listener.set(id + 1);
        self.listeners.borrow_mut().push((id, listener));
        let listeners = Rc::downgrade(&self.listeners);
        Some(Subscription::new(move || {
            if let Some(listeners) = listeners.upgrade() {
                listeners.borrow_mut().retain(|(existing, _)| *existing != id);
            }
        }))
    }
}
