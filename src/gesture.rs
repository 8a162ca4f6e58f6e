use log::debug;

use crate::ownership::EditResolver;

pub struct EditGesture {
    resolver: EditResolver,
    open: bool,
}

impl EditGesture {
    pub fn begin(resolver: &EditResolver) -> Self {
        resolver.parameter().on_begin_edit();
        Self {
            resolver: resolver.clone(),
            open: true,
        }
    }

    pub fn edit(&self, value: f32) {
        self.resolver.edit(value);
    }

    pub fn end(mut self) {
        self.close();
    }

    fn close(&mut self) {
        if self.open {
            self.open = false;
            self.resolver.parameter().on_end_edit();
        }
    }
}

impl Drop for EditGesture {
    fn drop(&mut self) {
        if self.open {
            debug!("closing edit gesture that was dropped while open");
        }
        self.close();
    }
}

/// Issues one complete gesture that sets `value`.
pub fn set_value_as_gesture(resolver: &EditResolver, value: f32) {
    let gesture = EditGesture::begin(resolver);
    gesture.edit(value);
    gesture.end();
}
