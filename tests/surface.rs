use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use stompbox_panel::{
    AnchorSource, ControlSurface, EditPolicy, InputEvent, Listener, Options, Parameter,
    ParameterModel, Parameters, Propagation, Slot, Subscription, TouchPoint, Visual, VisualState,
};

const EPSILON: f32 = 1e-4;

#[derive(Clone, Debug, PartialEq)]
enum Event {
    Begin,
    Edit(f32),
    End,
}

/// Wraps a model and journals the hooks the surface calls on it.
struct Journaled {
    model: ParameterModel,
    events: RefCell<Vec<Event>>,
    unsubscribed: Rc<Cell<u32>>,
}

impl Journaled {
    fn new(model: ParameterModel) -> Rc<Self> {
        Rc::new(Self {
            model,
            events: RefCell::new(Vec::new()),
            unsubscribed: Rc::new(Cell::new(0)),
        })
    }

    fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }
}

impl Parameter for Journaled {
    fn min(&self) -> f32 {
        self.model.min()
    }

    fn max(&self) -> f32 {
        self.model.max()
    }

    fn initial_value(&self) -> Option<f32> {
        self.model.initial_value()
    }

    fn on_begin_edit(&self) {
        self.events.borrow_mut().push(Event::Begin);
        self.model.on_begin_edit();
    }

    fn on_edit(&self, value: f32) {
        self.events.borrow_mut().push(Event::Edit(value));
        self.model.on_edit(value);
    }

    fn on_end_edit(&self) {
        self.events.borrow_mut().push(Event::End);
        self.model.on_end_edit();
    }

    fn subscribe(&self, listener: Listener) -> Option<Subscription> {
        let inner = self.model.subscribe(listener)?;
        let counter = self.unsubscribed.clone();
        Some(Subscription::new(move || {
            counter.set(counter.get() + 1);
            inner.cancel();
        }))
    }
}

/// Parameter with hooks but no way to push values.
#[derive(Default)]
struct WriteOnly {
    edits: RefCell<Vec<f32>>,
}

impl Parameter for WriteOnly {
    fn initial_value(&self) -> Option<f32> {
        Some(0.5)
    }

    fn on_edit(&self, value: f32) {
        self.edits.borrow_mut().push(value);
    }
}

#[derive(Default)]
struct Anchors {
    applied: Rc<RefCell<HashMap<&'static str, Vec<VisualState>>>>,
}

impl Anchors {
    fn applied(&self, slot: Slot) -> Vec<VisualState> {
        self.applied
            .borrow()
            .get(slot.anchor_id())
            .cloned()
            .unwrap_or_default()
    }
}

impl AnchorSource for Anchors {
    fn anchor(&mut self, slot: Slot) -> Option<Box<dyn Visual>> {
        let applied = self.applied.clone();
        let id = slot.anchor_id();
        Some(Box::new(move |state: VisualState| {
            applied.borrow_mut().entry(id).or_default().push(state);
        }))
    }
}

fn rotation(surface: &ControlSurface, slot: Slot) -> f32 {
    match surface.state(slot) {
        Some(VisualState::Rotation(degrees)) => degrees,
        other => panic!("{slot} is not a knob: {other:?}"),
    }
}

fn stompbox(options: Options) -> (ControlSurface, Anchors, [Rc<Journaled>; 4]) {
    let bypass = Journaled::new(ParameterModel::switch(false));
    let wave = Journaled::new(
        ParameterModel::new(0.0, 1.0, 0.0).with_policy(EditPolicy::Quantize { steps: 3 }),
    );
    let rate = Journaled::new(ParameterModel::new(0.0, 1.0, 0.5));
    let depth = Journaled::new(ParameterModel::new(0.0, 1.0, 0.5));
    let parameters = Parameters::default()
        .with(Slot::Bypass, bypass.clone())
        .with(Slot::Wave, wave.clone())
        .with(Slot::Rate, rate.clone())
        .with(Slot::Depth, depth.clone());
    let mut surface = ControlSurface::new(parameters, options).unwrap();
    let mut anchors = Anchors::default();
    surface.mount(&mut anchors);
    (surface, anchors, [bypass, wave, rate, depth])
}

fn mouse_drag(surface: &mut ControlSurface, slot: Slot, deltas: &[f32]) {
    surface.dispatch(slot, &InputEvent::MouseDown);
    for delta_y in deltas {
        surface.dispatch_global(&InputEvent::MouseMove {
            delta_y: *delta_y,
            fine: false,
        });
    }
    surface.dispatch_global(&InputEvent::MouseUp);
}

#[test]
fn mount_renders_initial_values_and_subscribes_every_slot() {
    let (surface, anchors, _) = stompbox(Options::default());
    assert_eq!(surface.subscription_count(), 4);
    assert_eq!(anchors.applied(Slot::Rate), vec![VisualState::Rotation(0.0)]);
    assert_eq!(anchors.applied(Slot::Wave), vec![VisualState::Rotation(-140.0)]);
    // The power LED is lit while the effect is not bypassed.
    assert_eq!(anchors.applied(Slot::Bypass), vec![VisualState::Switch(true)]);
}

#[test]
fn controlled_knob_follows_the_model() {
    let (mut surface, anchors, [_, _, rate, _]) = stompbox(Options::default());
    mouse_drag(&mut surface, Slot::Rate, &[-28.0]);

    let events = rate.events();
    assert_eq!(events.len(), 3);
    assert_eq!(events[0], Event::Begin);
    assert!(matches!(events[1], Event::Edit(v) if (v - 0.65).abs() < EPSILON));
    assert_eq!(events[2], Event::End);

    assert!((rate.model.value() - 0.65).abs() < EPSILON);
    assert!((rotation(&surface, Slot::Rate) - 42.0).abs() < EPSILON);
    assert_eq!(anchors.applied(Slot::Rate).len(), 2);
    assert!(surface.router().is_empty());
}

#[test]
fn controlled_knob_shows_quantized_value() {
    let (mut surface, _, [_, wave, _, _]) = stompbox(Options::default());
    // -140 + 40 * 1.5 = -80 degrees, i.e. 0.214, which the model snaps to 1/3.
    mouse_drag(&mut surface, Slot::Wave, &[-40.0]);
    assert!((wave.model.value() - 1.0 / 3.0).abs() < EPSILON);
    assert!((rotation(&surface, Slot::Wave) - (-140.0 + 280.0 / 3.0)).abs() < EPSILON);
}

#[test]
fn controlled_knob_without_subscription_stays_put() {
    let depth = Rc::new(WriteOnly::default());
    let parameters = Parameters::default().with(Slot::Depth, depth.clone());
    let mut surface = ControlSurface::new(parameters, Options::default()).unwrap();
    surface.mount(&mut Anchors::default());

    mouse_drag(&mut surface, Slot::Depth, &[-10.0, -10.0]);
    assert_eq!(depth.edits.borrow().len(), 2);
    assert_eq!(rotation(&surface, Slot::Depth), 0.0);
}

#[test]
fn uncontrolled_knob_echoes_every_edit() {
    let depth = Rc::new(WriteOnly::default());
    let parameters = Parameters::default().with(Slot::Depth, depth.clone());
    let options = Options {
        controlled: false,
        ..Options::default()
    };
    let mut surface = ControlSurface::new(parameters, options).unwrap();
    let mut anchors = Anchors::default();
    surface.mount(&mut anchors);

    mouse_drag(&mut surface, Slot::Depth, &[-10.0, -10.0]);
    let applied = anchors.applied(Slot::Depth);
    assert_eq!(applied.len(), 3);
    assert!((rotation(&surface, Slot::Depth) - 30.0).abs() < EPSILON);
}

#[test]
fn bypass_switch_round_trip() {
    let (mut surface, anchors, [bypass, ..]) = stompbox(Options::default());

    assert!(surface.dispatch(Slot::Bypass, &InputEvent::Activate).is_consumed());
    assert_eq!(
        bypass.events(),
        vec![Event::Begin, Event::Edit(1.0), Event::End]
    );
    assert_eq!(surface.state(Slot::Bypass), Some(VisualState::Switch(true)));
    assert_eq!(
        anchors.applied(Slot::Bypass).last(),
        Some(&VisualState::Switch(false))
    );

    surface.dispatch(Slot::Bypass, &InputEvent::Activate);
    assert_eq!(bypass.events()[4], Event::Edit(0.0));
    assert_eq!(surface.state(Slot::Bypass), Some(VisualState::Switch(false)));
}

#[test]
fn external_change_reaches_the_knob() {
    let (surface, anchors, [_, _, _, depth]) = stompbox(Options::default());
    depth.model.set(1.0);
    assert_eq!(rotation(&surface, Slot::Depth), 140.0);
    depth.model.set(1.0);
    assert_eq!(anchors.applied(Slot::Depth).len(), 2);
}

#[test]
fn double_click_resets_to_initial_value() {
    let (mut surface, _, [_, _, rate, _]) = stompbox(Options::default());
    mouse_drag(&mut surface, Slot::Rate, &[-50.0]);
    surface.dispatch(Slot::Rate, &InputEvent::Reset);

    let events = rate.events();
    assert_eq!(&events[events.len() - 3..], &[Event::Begin, Event::Edit(0.5), Event::End]);
    assert_eq!(rotation(&surface, Slot::Rate), 0.0);
}

#[test]
fn two_fingers_on_two_knobs_stay_independent() {
    let (mut surface, _, [_, _, rate, depth]) = stompbox(Options::default());
    surface.dispatch(
        Slot::Rate,
        &InputEvent::TouchStart {
            touches: vec![TouchPoint::new(1, 300.0)],
        },
    );
    surface.dispatch(
        Slot::Depth,
        &InputEvent::TouchStart {
            touches: vec![TouchPoint::new(2, 300.0)],
        },
    );
    assert_eq!(surface.router().len(), 2);

    let moved = surface.dispatch_global(&InputEvent::TouchMove {
        touches: vec![TouchPoint::new(2, 280.0)],
        fine: false,
    });
    assert_eq!(moved, Propagation::Consumed);
    assert_eq!(rate.events(), vec![Event::Begin]);
    assert!((rotation(&surface, Slot::Depth) - 30.0).abs() < EPSILON);
    assert_eq!(rotation(&surface, Slot::Rate), 0.0);

    surface.dispatch_global(&InputEvent::TouchEnd {
        touches: vec![TouchPoint::new(2, 280.0)],
    });
    assert_eq!(depth.events().last(), Some(&Event::End));
    assert_eq!(rate.events().last(), Some(&Event::Begin));
    assert_eq!(surface.router().len(), 1);

    surface.dispatch_global(&InputEvent::TouchEnd {
        touches: vec![TouchPoint::new(1, 300.0)],
    });
    assert!(surface.router().is_empty());
}

#[test]
fn global_events_without_capture_are_ignored() {
    let (mut surface, _, [_, _, rate, _]) = stompbox(Options::default());
    let propagation = surface.dispatch_global(&InputEvent::MouseMove {
        delta_y: -10.0,
        fine: false,
    });
    assert_eq!(propagation, Propagation::Ignored);
    assert!(rate.events().is_empty());
}

#[test]
fn unmount_releases_everything_exactly_once() {
    let (mut surface, _, parameters) = stompbox(Options::default());
    surface.dispatch(Slot::Rate, &InputEvent::MouseDown);
    assert!(!surface.router().is_empty());

    surface.unmount();
    surface.unmount();
    for parameter in &parameters {
        assert_eq!(parameter.unsubscribed.get(), 1);
        assert_eq!(parameter.model.subscriber_count(), 0);
    }
    assert!(surface.router().is_empty());
    assert_eq!(parameters[2].events(), vec![Event::Begin, Event::End]);
    assert_eq!(surface.dispatch(Slot::Rate, &InputEvent::Reset), Propagation::Ignored);
}

#[test]
fn remount_after_unmount_binds_again() {
    let (mut surface, _, [_, _, rate, _]) = stompbox(Options::default());
    surface.unmount();
    let mut anchors = Anchors::default();
    surface.mount(&mut anchors);
    assert_eq!(rate.model.subscriber_count(), 1);
    rate.model.set(0.0);
    assert_eq!(rotation(&surface, Slot::Rate), -140.0);
}
