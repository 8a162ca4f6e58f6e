use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::{Arc, Mutex, mpsc};

use stompbox_panel::mapping::{from_bool, to_bool};
use stompbox_panel::{Listener, Parameter, Slot, Subscription};
use tokio::runtime::Runtime;

pub const RATE_MIN_HZ: f32 = 0.5;
pub const RATE_MAX_HZ: f32 = 12.0;
const RATE_DEFAULT_HZ: f32 = 4.0;
const DEPTH_DEFAULT: f32 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Wave {
    Sine,
    Triangle,
    Square,
    Ramp,
}

impl Wave {
    pub const VALUES: [Wave; 4] = [Wave::Sine, Wave::Triangle, Wave::Square, Wave::Ramp];

    pub fn label(&self) -> &'static str {
        match self {
            Wave::Sine => "SINE",
            Wave::Triangle => "TRI",
            Wave::Square => "SQUARE",
            Wave::Ramp => "RAMP",
        }
    }

    pub fn from_value(value: f32) -> Self {
        let last = Self::VALUES.len() - 1;
        let index = (value.clamp(0.0, 1.0) * last as f32).round() as usize;
        Self::VALUES[index.min(last)]
    }

    pub fn to_value(self) -> f32 {
        let index = Self::VALUES
            .iter()
            .position(|wave| *wave == self)
            .unwrap_or(0);
        index as f32 / (Self::VALUES.len() - 1) as f32
    }
}

pub fn range(slot: Slot) -> (f32, f32, f32) {
    match slot {
        Slot::Bypass => (0.0, 1.0, 0.0),
        Slot::Wave => (0.0, 1.0, Wave::Sine.to_value()),
        Slot::Rate => (RATE_MIN_HZ, RATE_MAX_HZ, RATE_DEFAULT_HZ),
        Slot::Depth => (0.0, 1.0, DEPTH_DEFAULT),
    }
}

#[derive(Debug)]
pub struct TremoloState {
    pub bypass: bool,
    pub wave: Wave,
    pub rate_hz: f32,
    pub depth: f32,
    pub open_gestures: u32,
    pub edits: u64,
}

impl TremoloState {
    pub fn new() -> Self {
        Self {
            bypass: false,
            wave: Wave::Sine,
            rate_hz: RATE_DEFAULT_HZ,
            depth: DEPTH_DEFAULT,
            open_gestures: 0,
            edits: 0,
        }
    }

    pub fn apply(&mut self, slot: Slot, value: f32) -> f32 {
        self.edits += 1;
        match slot {
            Slot::Bypass => self.bypass = to_bool(value),
            Slot::Wave => self.wave = Wave::from_value(value),
            Slot::Rate => self.rate_hz = value.clamp(RATE_MIN_HZ, RATE_MAX_HZ),
            Slot::Depth => self.depth = value.clamp(0.0, 1.0),
        }
        self.value(slot)
    }

    pub fn value(&self, slot: Slot) -> f32 {
        match slot {
            Slot::Bypass => from_bool(self.bypass),
            Slot::Wave => self.wave.to_value(),
            Slot::Rate => self.rate_hz,
            Slot::Depth => self.depth,
        }
    }
}

#[derive(Debug)]
pub enum ModelCommand {
    BeginEdit(Slot),
    Edit(Slot, f32),
    EndEdit(Slot),
    Set(Slot, f32),
}

pub type ModelHandle = (
    Arc<Mutex<TremoloState>>,
    mpsc::Sender<ModelCommand>,
    mpsc::Receiver<(Slot, f32)>,
);

pub fn spawn_model(runtime: &Runtime) -> ModelHandle {
    let (tx, rx) = mpsc::channel();
    let (confirm_tx, confirm_rx) = mpsc::channel();
    let state = Arc::new(Mutex::new(TremoloState::new()));
    let thread_state = state.clone();

    runtime.spawn_blocking(move || {
        while let Ok(cmd) = rx.recv() {
            let Ok(mut guard) = thread_state.lock() else {
                break;
            };
            match cmd {
                ModelCommand::BeginEdit(_) => guard.open_gestures += 1,
                ModelCommand::EndEdit(_) => {
                    guard.open_gestures = guard.open_gestures.saturating_sub(1)
                }
                ModelCommand::Edit(slot, value) | ModelCommand::Set(slot, value) => {
                    let kept = guard.apply(slot, value);
                    if confirm_tx.send((slot, kept)).is_err() {
                        break;
                    }
                }
            }
        }
    });

    (state, tx, confirm_rx)
}

pub struct RemoteBank {
    commands: mpsc::Sender<ModelCommand>,
    confirmations: mpsc::Receiver<(Slot, f32)>,
    listeners: Rc<RefCell<Vec<(u64, Slot, Listener)>>>,
    next_listener: Cell<u64>,
}

impl RemoteBank {
    pub fn new(
        commands: mpsc::Sender<ModelCommand>,
        confirmations: mpsc::Receiver<(Slot, f32)>,
    ) -> Self {
        Self {
            commands,
            confirmations,
            listeners: Rc::new(RefCell::new(Vec::new())),
            next_listener: Cell::new(0),
        }
    }

    pub fn parameter(self: &Rc<Self>, slot: Slot) -> Rc<dyn Parameter> {
        Rc::new(RemoteParameter {
            slot,
            bank: self.clone(),
        })
    }

    pub fn send(&self, command: ModelCommand) {
        // A closed channel means the worker is gone; edits are dropped.
        let _ = self.commands.send(command);
    }

    pub fn pump(&self) -> usize {
        let mut delivered = 0;
        while let Ok((slot, value)) = self.confirmations.try_recv() {
            let listeners: Vec<Listener> = self
                .listeners
                .borrow()
                .iter()
                .filter(|(_, s, _)| *s == slot)
                .map(|(_, _, listener)| listener.clone())
                .collect();
            for listener in listeners {
                listener(value);
            }
            delivered += 1;
        }
        delivered
    }

    fn subscribe(&self, slot: Slot, listener: Listener) -> Subscription {
        let id = self.next_listener.get();
        self.next_listener.set(id + 1);
        self.listeners.borrow_mut().push((id, slot, listener));
        let listeners = Rc::downgrade(&self.listeners);
        Subscription::new(move || {
            if let Some(listeners) = listeners.upgrade() {
                listeners.borrow_mut().retain(|(existing, _, _)| *existing != id);
            }
        })
    }
}

struct RemoteParameter {
    slot: Slot,
    bank: Rc<RemoteBank>,
}

impl Parameter for RemoteParameter {
    fn min(&self) -> f32 {
        range(self.slot).0
    }

    fn max(&self) -> f32 {
        range(self.slot).1
    }

    fn initial_value(&self) -> Option<f32> {
        Some(range(self.slot).2)
    }

    fn on_begin_edit(&self) {
        self.bank.send(ModelCommand::BeginEdit(self.slot));
    }

    fn on_edit(&self, value: f32) {
        self.bank.send(ModelCommand::Edit(self.slot, value));
    }

    fn on_end_edit(&self) {
        self.bank.send(ModelCommand::EndEdit(self.slot));
    }

    fn subscribe(&self, listener: Listener) -> Option<Subscription> {
        Some(self.bank.subscribe(self.slot, listener))
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;

    #[test]
    fn wave_snaps_to_nearest_shape() {
        assert_eq!(Wave::from_value(0.0), Wave::Sine);
        assert_eq!(Wave::from_value(0.3), Wave::Triangle);
        assert_eq!(Wave::from_value(0.9), Wave::Ramp);
        assert_eq!(Wave::from_value(7.0), Wave::Ramp);
        assert_eq!(Wave::from_value(Wave::Square.to_value()), Wave::Square);
    }

    #[test]
    fn state_clamps_rate() {
        let mut state = TremoloState::new();
        assert_eq!(state.apply(Slot::Rate, 40.0), RATE_MAX_HZ);
        assert_eq!(state.apply(Slot::Bypass, 1.0), 1.0);
        assert!(state.bypass);
        assert_eq!(state.edits, 2);
    }

    #[test]
    fn worker_confirms_canonical_values() {
        let runtime = Runtime::new().unwrap();
        let (state, commands, confirmations) = spawn_model(&runtime);
        let bank = Rc::new(RemoteBank::new(commands, confirmations));
        let rate = bank.parameter(Slot::Rate);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let _subscription = rate
            .subscribe(Rc::new(move |value: f32| sink.borrow_mut().push(value)))
            .unwrap();

        rate.on_begin_edit();
        rate.on_edit(0.1);
        rate.on_end_edit();

        let deadline = Instant::now() + Duration::from_secs(2);
        while seen.borrow().is_empty() && Instant::now() < deadline {
            bank.pump();
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(*seen.borrow(), vec![RATE_MIN_HZ]);
        assert_eq!(state.lock().unwrap().rate_hz, RATE_MIN_HZ);
    }
}
