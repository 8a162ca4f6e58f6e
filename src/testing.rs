use std::cell::RefCell;
use std::rc::Rc;

use crate::parameter::{Listener, Parameter, Subscription};
use crate::render::{Visual, VisualState};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Call {
    Begin,
    Edit(f32),
    End,
}

pub struct Recorder {
    min: f32,
    max: f32,
    initial: Option<f32>,
    pub calls: RefCell<Vec<Call>>,
    listeners: Rc<RefCell<Vec<Listener>>>,
}

impl Recorder {
    pub fn new(min: f32, max: f32, initial: Option<f32>) -> Rc<Self> {
        Rc::new(Self {
            min,
            max,
            initial,
            calls: RefCell::new(Vec::new()),
            listeners: Rc::new(RefCell::new(Vec::new())),
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn edits(&self) -> Vec<f32> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                Call::Edit(value) => Some(*value),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn push(&self, value: f32) {
        let listeners = self.listeners.borrow().clone();
        for listener in listeners {
            listener(value);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}

impl Parameter for Recorder {
    fn min(&self) -> f32 {
        self.min
    }

    fn max(&self) -> f32 {
        self.max
    }

    fn initial_value(&self) -> Option<f32> {
        self.initial
    }

    fn on_begin_edit(&self) {
        self.calls.borrow_mut().push(Call::Begin);
    }

    fn on_edit(&self, value: f32) {
        self.calls.borrow_mut().push(Call::Edit(value));
    }

    fn on_end_edit(&self) {
        self.calls.borrow_mut().push(Call::End);
    }

    fn subscribe(&self, listener: Listener) -> Option<Subscription> {
        self.listeners.borrow_mut().push(listener.clone());
        let listeners = Rc::downgrade(&self.listeners);
        Some(Subscription::new(move || {
            if let Some(listeners) = listeners.upgrade() {
                listeners
                    .borrow_mut()
                    .retain(|existing| !Rc::ptr_eq(existing, &listener));
            }
        }))
    }
}

pub fn recording_visual() -> (Rc<RefCell<Vec<VisualState>>>, Box<dyn Visual>) {
    let applied = Rc::new(RefCell::new(Vec::new()));
    let sink = applied.clone();
    (
        applied,
        Box::new(move |state: VisualState| sink.borrow_mut().push(state)),
    )
}

pub fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-4
}
