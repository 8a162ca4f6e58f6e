use crate::error::ConfigError;

pub const DEFAULT_MAX_ROTATION: f32 = 132.0;

pub fn remap(source: f32, source_from: f32, source_to: f32, target_from: f32, target_to: f32) -> f32 {
    target_from + (source - source_from) * (target_to - target_from) / (source_to - source_from)
}

/// Maps between a parameter's semantic range and a knob's rotation range
/// `[-max_rotation, +max_rotation]` in degrees.
///
/// Neither direction clamps; clamping belongs to the drag accumulator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RangeMapper {
    min: f32,
    max: f32,
    max_rotation: f32,
}

impl RangeMapper {
    pub fn new(min: f32, max: f32, max_rotation: f32) -> Result<Self, ConfigError> {
        if !min.is_finite() || !max.is_finite() {
            return Err(ConfigError::NonFiniteBound { min, max });
        }
        if min == max {
            return Err(ConfigError::DegenerateRange { min, max });
        }
        if !max_rotation.is_finite() || max_rotation <= 0.0 {
            return Err(ConfigError::InvalidMaxRotation(max_rotation));
        }
        Ok(Self {
            min,
            max,
            max_rotation,
        })
    }

    pub fn min(&self) -> f32 {
        self.min
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    pub fn max_rotation(&self) -> f32 {
        self.max_rotation
    }

    pub fn to_rotation(&self, value: f32) -> f32 {
        remap(value, self.min, self.max, -self.max_rotation, self.max_rotation)
    }

    pub fn to_value(&self, rotation: f32) -> f32 {
        remap(rotation, -self.max_rotation, self.max_rotation, self.min, self.max)
    }

    pub fn clamp_rotation(&self, rotation: f32) -> f32 {
        rotation.clamp(-self.max_rotation, self.max_rotation)
    }

    pub fn contains(&self, value: f32) -> bool {
        let (low, high) = if self.min <= self.max {
            (self.min, self.max)
        } else {
            (self.max, self.min)
        };
        (low..=high).contains(&value)
    }
}

pub fn to_bool(value: f32) -> bool {
    value != 0.0 && !value.is_nan()
}

pub fn from_bool(active: bool) -> f32 {
    if active { 1.0 } else { 0.0 }
}
