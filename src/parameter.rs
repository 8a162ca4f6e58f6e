use std::fmt;
use std::rc::Rc;

pub type Listener = Rc<dyn Fn(f32)>;

pub trait Parameter {
    fn min(&self) -> f32 {
        0.0
    }

    fn max(&self) -> f32 {
        1.0
    }

    /// Value restored by a reset gesture. `None` means "use the control's
    /// own default" (`min` for knobs, off for switches).
    fn initial_value(&self) -> Option<f32> {
        None
    }

    fn on_begin_edit(&self) {}

    fn on_edit(&self, _value: f32) {}

    fn on_end_edit(&self) {}

    /// Registers `listener` for value pushes.
    ///
    /// Returns `None` when the parameter cannot push updates; the control
    /// then only changes through local interaction.
    fn subscribe(&self, _listener: Listener) -> Option<Subscription> {
        None
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Unbound;

impl Parameter for Unbound {}

/// Handle that removes a listener from its parameter.
///
/// The removal runs exactly once: on [`Subscription::cancel`] or on drop,
/// whichever comes first.
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(unsubscribe: impl FnOnce() + 'static) -> Self {
        Self {
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    pub fn cancel(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}
