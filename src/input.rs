#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TouchPoint {
    pub id: u64,
    pub y: f32,
}

impl TouchPoint {
    pub fn new(id: u64, y: f32) -> Self {
        Self { id, y }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    MouseDown,
    // Pixels, positive downwards.
    MouseMove { delta_y: f32, fine: bool },
    MouseUp,
    TouchStart { touches: Vec<TouchPoint> },
    TouchMove { touches: Vec<TouchPoint>, fine: bool },
    TouchEnd { touches: Vec<TouchPoint> },
    Activate,
    Reset,
}

impl InputEvent {
    pub fn is_global(&self) -> bool {
        matches!(
            self,
            InputEvent::MouseMove { .. }
                | InputEvent::MouseUp
                | InputEvent::TouchMove { .. }
                | InputEvent::TouchEnd { .. }
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Propagation {
    Consumed,
    Ignored,
}

impl Propagation {
    pub fn is_consumed(self) -> bool {
        self == Propagation::Consumed
    }

    pub fn or(self, other: Propagation) -> Propagation {
        if self.is_consumed() { self } else { other }
    }
}
