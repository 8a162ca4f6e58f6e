use std::fmt;
use std::rc::Rc;

use log::{debug, info, warn};

use crate::capture::{ControlId, InputRouter};
use crate::error::ConfigError;
use crate::input::{InputEvent, Propagation};
use crate::mapping::RangeMapper;
use crate::ownership::Ownership;
use crate::parameter::{Parameter, Subscription, Unbound};
use crate::render::{Negated, UpdateHandle, Visual, VisualState};
use crate::rotary::{DragSpeed, RotaryConfig, RotaryControl, resolve_initial};
use crate::toggle::ToggleControl;

pub const SURFACE_MAX_ROTATION: f32 = 140.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Slot {
    Bypass,
    Wave,
    Rate,
    Depth,
}

impl Slot {
    pub const ALL: [Slot; 4] = [Slot::Bypass, Slot::Wave, Slot::Rate, Slot::Depth];

    pub fn anchor_id(self) -> &'static str {
        match self {
            Slot::Bypass => "stomp-switch",
            Slot::Wave => "knob-shape",
            Slot::Rate => "knob-rate",
            Slot::Depth => "knob-depth",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Slot::Bypass => "BYPASS",
            Slot::Wave => "SHAPE",
            Slot::Rate => "RATE",
            Slot::Depth => "DEPTH",
        }
    }

    pub fn is_knob(self) -> bool {
        self != Slot::Bypass
    }

    fn control_id(self) -> ControlId {
        ControlId(self as u32)
    }

    fn from_control_id(id: ControlId) -> Option<Slot> {
        Slot::ALL.into_iter().find(|slot| slot.control_id() == id)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Default)]
pub struct Parameters {
    pub bypass: Option<Rc<dyn Parameter>>,
    pub wave: Option<Rc<dyn Parameter>>,
    pub rate: Option<Rc<dyn Parameter>>,
    pub depth: Option<Rc<dyn Parameter>>,
}

impl Parameters {
    pub fn with(mut self, slot: Slot, parameter: Rc<dyn Parameter>) -> Self {
        *self.slot_mut(slot) = Some(parameter);
        self
    }

    pub fn get(&self, slot: Slot) -> Option<&Rc<dyn Parameter>> {
        match slot {
            Slot::Bypass => self.bypass.as_ref(),
            Slot::Wave => self.wave.as_ref(),
            Slot::Rate => self.rate.as_ref(),
            Slot::Depth => self.depth.as_ref(),
        }
    }

    fn slot_mut(&mut self, slot: Slot) -> &mut Option<Rc<dyn Parameter>> {
        match slot {
            Slot::Bypass => &mut self.bypass,
            Slot::Wave => &mut self.wave,
            Slot::Rate => &mut self.rate,
            Slot::Depth => &mut self.depth,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Options {
    pub controlled: bool,
    pub drag: DragSpeed,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            controlled: true,
            drag: DragSpeed::default(),
        }
    }
}

impl Options {
    pub fn ownership(&self) -> Ownership {
        Ownership::from_controlled(self.controlled)
    }
}

pub trait AnchorSource {
    fn anchor(&mut self, slot: Slot) -> Option<Box<dyn Visual>>;
}

enum Control {
    Rotary(RotaryControl),
    Toggle(ToggleControl),
}

impl Control {
    fn handle(&mut self, event: &InputEvent) -> Propagation {
        match self {
            Control::Rotary(knob) => knob.handle(event),
            Control::Toggle(switch) => switch.handle(event),
        }
    }

    fn update_handle(&self) -> UpdateHandle {
        match self {
            Control::Rotary(knob) => knob.update_handle(),
            Control::Toggle(switch) => switch.update_handle(),
        }
    }
}

struct Mounted {
    controls: Vec<(Slot, Control)>,
    subscriptions: Vec<Subscription>,
}

pub struct ControlSurface {
    parameters: Vec<(Slot, Rc<dyn Parameter>)>,
    options: Options,
    router: InputRouter,
    mounted: Option<Mounted>,
}

impl ControlSurface {
    pub fn new(parameters: Parameters, options: Options) -> Result<Self, ConfigError> {
        let mut resolved: Vec<(Slot, Rc<dyn Parameter>)> = Vec::with_capacity(Slot::ALL.len());
        for slot in Slot::ALL {
            let parameter = match parameters.get(slot) {
                Some(parameter) => parameter.clone(),
                None => {
                    debug!("{slot}: no parameter bound");
                    Rc::new(Unbound)
                }
            };
            if slot.is_knob() {
                let mapper = RangeMapper::new(parameter.min(), parameter.max(), SURFACE_MAX_ROTATION)?;
                resolve_initial(parameter.as_ref(), &mapper)?;
            }
            resolved.push((slot, parameter));
        }
        Ok(Self {
            parameters: resolved,
            options,
            router: InputRouter::new(),
            mounted: None,
        })
    }

    pub fn router(&self) -> &InputRouter {
        &self.router
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    /// Builds the controls and subscribes them to their parameters.
    pub fn mount(&mut self, anchors: &mut dyn AnchorSource) {
        if self.mounted.is_some() {
            warn!("surface mounted twice; releasing the previous mount first");
            self.unmount();
        }

        let ownership = self.options.ownership();
        let mut mounted = Mounted {
            controls: Vec::with_capacity(self.parameters.len()),
            subscriptions: Vec::new(),
        };

        for (slot, parameter) in &self.parameters {
            let slot = *slot;
            let Some(visual) = anchors.anchor(slot) else {
                warn!("{slot}: no anchor '{}', control skipped", slot.anchor_id());
                continue;
            };
            let control = match slot {
                Slot::Bypass => Control::Toggle(ToggleControl::new(
                    slot.control_id(),
                    parameter.clone(),
                    Box::new(Negated(visual)),
                    ownership,
                )),
                _ => {
                    let config = RotaryConfig {
                        max_rotation: SURFACE_MAX_ROTATION,
                        ownership,
                        drag: self.options.drag,
                    };
                    match RotaryControl::new(
                        slot.control_id(),
                        parameter.clone(),
                        visual,
                        self.router.clone(),
                        config,
                    ) {
                        Ok(knob) => Control::Rotary(knob),
                        Err(err) => {
                            warn!("{slot}: {err}");
                            continue;
                        }
                    }
                }
            };

            if let Some(subscription) = parameter.subscribe(control.update_handle().listener()) {
                mounted.subscriptions.push(subscription);
            }
            mounted.controls.push((slot, control));
        }

        info!(
            "surface mounted: {} controls, {} subscriptions, {:?}",
            mounted.controls.len(),
            mounted.subscriptions.len(),
            ownership
        );
        self.mounted = Some(mounted);
    }

    pub fn unmount(&mut self) {
        let Some(mounted) = self.mounted.take() else {
            debug!("unmount without mount ignored");
            return;
        };
        let Mounted {
            controls,
            mut subscriptions,
        } = mounted;
        let released = subscriptions.len();
        for subscription in subscriptions.drain(..) {
            subscription.cancel();
        }
        drop(controls);
        info!("surface unmounted: {released} subscriptions released");
    }

    pub fn subscription_count(&self) -> usize {
        self.mounted
            .as_ref()
            .map_or(0, |mounted| mounted.subscriptions.len())
    }

    /// Delivers an event aimed at one slot's anchor. Moves and releases
    /// belong on [`dispatch_global`](Self::dispatch_global) and are ignored here.
    pub fn dispatch(&mut self, slot: Slot, event: &InputEvent) -> Propagation {
        if event.is_global() {
            debug!("{slot}: {event:?} is process-wide, ignored");
            return Propagation::Ignored;
        }
        match self.control_mut(slot) {
            Some(control) => control.handle(event),
            None => Propagation::Ignored,
        }
    }

    /// Delivers a process-wide event to every control currently capturing.
    pub fn dispatch_global(&mut self, event: &InputEvent) -> Propagation {
        if !event.is_global() {
            debug!("{event:?} targets an anchor, ignored");
            return Propagation::Ignored;
        }
        let mut propagation = Propagation::Ignored;
        for id in self.router.captured() {
            let Some(slot) = Slot::from_control_id(id) else {
                continue;
            };
            if let Some(control) = self.control_mut(slot) {
                propagation = propagation.or(control.handle(event));
            }
        }
        propagation
    }

    pub fn update_handle(&self, slot: Slot) -> Option<UpdateHandle> {
        self.control(slot).map(Control::update_handle)
    }

    pub fn state(&self, slot: Slot) -> Option<VisualState> {
        self.update_handle(slot).and_then(|handle| handle.state())
    }

    pub fn rotary(&self, slot: Slot) -> Option<&RotaryControl> {
        match self.control(slot) {
            Some(Control::Rotary(knob)) => Some(knob),
            _ => None,
        }
    }

    pub fn toggle(&self, slot: Slot) -> Option<&ToggleControl> {
        match self.control(slot) {
            Some(Control::Toggle(switch)) => Some(switch),
            _ => None,
        }
    }

    fn control(&self, slot: Slot) -> Option<&Control> {
        self.mounted.as_ref().and_then(|mounted| {
            mounted
                .controls
                .iter()
                .find(|(s, _)| *s == slot)
                .map(|(_, control)| control)
        })
    }

    fn control_mut(&mut self, slot: Slot) -> Option<&mut Control> {
        self.mounted.as_mut().and_then(|mounted| {
            mounted
                .controls
                .iter_mut()
                .find(|(s, _)| *s == slot)
                .map(|(_, control)| control)
        })
    }
}
