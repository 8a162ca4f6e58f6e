mod remote;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use macroquad::input::simulate_mouse_with_touch;
use macroquad::prelude::*;
use remote::{ModelCommand, RemoteBank, TremoloState, spawn_model};
use stompbox_panel::{
    AnchorSource, ControlSurface, InputEvent, Options, Parameters, Slot, TouchPoint, Visual,
    VisualState,
};
use tokio::runtime::Runtime;

const SCREEN_WIDTH: f32 = 640.0;
const SCREEN_HEIGHT: f32 = 720.0;
const SCALE: f32 = 1.25;
const ENCLOSURE_WIDTH: f32 = 250.0;
const ENCLOSURE_HEIGHT: f32 = 423.0;
const BIG_KNOB: f32 = 68.0;
const SMALL_KNOB: f32 = 48.0;
const LED_SIZE: f32 = 10.0;
const DOUBLE_CLICK_SECONDS: f64 = 0.35;
const RATE_NUDGE_HZ: f32 = 0.5;
const INFO_GAP: f32 = 20.0;
const INFO_LINE_HEIGHT: f32 = 18.0;
const INFO_LINES: usize = 7;
// Ownership mode for every control on the panel.
const CONTROLLED: bool = true;

const ENCLOSURE: Color = Color {
    r: 0.55,
    g: 0.08,
    b: 0.07,
    a: 1.0,
};
const KNOB_BODY: Color = Color {
    r: 0.08,
    g: 0.08,
    b: 0.08,
    a: 1.0,
};
const CREAM: Color = Color {
    r: 0.95,
    g: 0.9,
    b: 0.78,
    a: 1.0,
};
const BACKGROUND: Color = Color {
    r: 0.02,
    g: 0.02,
    b: 0.02,
    a: 1.0,
};

#[macroquad::main(window_conf)]
async fn main() {
    init_logging();
    if let Err(err) = run().await {
        log::error!("stompbox-panel: {err:#}");
    }
}

fn init_logging() {
    // A second call (tests) keeps the logger already installed.
    let _ = env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .try_init();
}

fn window_conf() -> Conf {
    Conf {
        window_title: "Tremolo Stompbox".into(),
        fullscreen: false,
        sample_count: 4,
        window_width: SCREEN_WIDTH as i32,
        window_height: SCREEN_HEIGHT as i32,
        high_dpi: false,
        ..Default::default()
    }
}

async fn run() -> Result<()> {
    let runtime = Runtime::new().context("tokio runtime")?;
    let (model_state, commands, confirmations) = spawn_model(&runtime);
    let bank = Rc::new(RemoteBank::new(commands, confirmations));

    let parameters = Slot::ALL
        .into_iter()
        .fold(Parameters::default(), |parameters, slot| {
            parameters.with(slot, bank.parameter(slot))
        });
    let options = Options {
        controlled: CONTROLLED,
        ..Options::default()
    };
    let mut surface = ControlSurface::new(parameters, options).context("building control surface")?;

    let mut visuals = PanelVisuals::default();
    surface.mount(&mut visuals);
    log::info!("panel mounted, controlled = {CONTROLLED}");
    simulate_mouse_with_touch(false);

    let layout = compute_layout();
    let mut pointer = PointerTracker::new();

    loop {
        if is_key_pressed(KeyCode::Escape) {
            break;
        }
        handle_host_keys(&bank, &model_state);
        bank.pump();
        handle_mouse(&mut surface, &layout, &mut pointer);
        handle_touches(&mut surface, &layout);
        bank.pump();

        draw_scene(&layout, &visuals, &model_state, options);
        next_frame().await;
    }

    surface.unmount();
    Ok(())
}

#[derive(Clone, Default)]
struct PanelVisuals {
    states: Rc<RefCell<HashMap<Slot, VisualState>>>,
}

impl PanelVisuals {
    fn get(&self, slot: Slot) -> Option<VisualState> {
        self.states.borrow().get(&slot).copied()
    }
}

impl AnchorSource for PanelVisuals {
    fn anchor(&mut self, slot: Slot) -> Option<Box<dyn Visual>> {
        let states = self.states.clone();
        Some(Box::new(move |state: VisualState| {
            states.borrow_mut().insert(slot, state);
        }))
    }
}

#[derive(Clone)]
struct PanelLayout {
    enclosure: Rect,
    knobs: [(Slot, Rect); 3],
    switch: Rect,
    led: Rect,
    info: Rect,
}

impl PanelLayout {
    fn hit_test(&self, point: Vec2) -> Option<Slot> {
        self.knobs
            .iter()
            .find(|(_, rect)| rect.contains(point))
            .map(|(slot, _)| *slot)
            .or_else(|| self.switch.contains(point).then_some(Slot::Bypass))
    }

    fn info_baselines(&self) -> impl Iterator<Item = f32> + '_ {
        (0..INFO_LINES).map(|line| self.info.y + INFO_LINE_HEIGHT * (line + 1) as f32)
    }
}

fn compute_layout() -> PanelLayout {
    let width = ENCLOSURE_WIDTH * SCALE;
    let height = ENCLOSURE_HEIGHT * SCALE;
    let info_height = INFO_LINE_HEIGHT * INFO_LINES as f32;
    let origin = vec2(
        (SCREEN_WIDTH - width) * 0.5,
        (SCREEN_HEIGHT - height - INFO_GAP - info_height) * 0.5,
    );
    let enclosure = Rect::new(origin.x, origin.y, width, height);
    let info = Rect::new(origin.x, origin.y + height + INFO_GAP, width, info_height);

    // Positions follow the stompbox markup, in unscaled enclosure pixels.
    let slot_offset = vec2(10.0, 0.0);
    let controls = slot_offset + vec2(25.0, 12.0);
    let at = |offset: Vec2, w: f32, h: f32| {
        Rect::new(
            origin.x + offset.x * SCALE,
            origin.y + offset.y * SCALE,
            w * SCALE,
            h * SCALE,
        )
    };

    let knobs = [
        (Slot::Rate, at(controls + vec2(0.0, 5.0), BIG_KNOB, BIG_KNOB)),
        (Slot::Depth, at(controls + vec2(111.0, 5.0), BIG_KNOB, BIG_KNOB)),
        (Slot::Wave, at(controls + vec2(66.0, 78.0), SMALL_KNOB, SMALL_KNOB)),
    ];
    let switch = at(
        slot_offset + vec2(7.0, ENCLOSURE_HEIGHT - 8.0 - 145.0),
        216.0,
        145.0,
    );
    let led = at(slot_offset + vec2(110.0, 20.0), LED_SIZE, LED_SIZE);

    PanelLayout {
        enclosure,
        knobs,
        switch,
        led,
        info,
    }
}

struct PointerTracker {
    last_mouse: Vec2,
    pressed_on: Option<Slot>,
    last_press: Option<(Slot, f64)>,
    double_click: Option<Slot>,
}

impl PointerTracker {
    fn new() -> Self {
        let (x, y) = mouse_position();
        Self {
            last_mouse: vec2(x, y),
            pressed_on: None,
            last_press: None,
            double_click: None,
        }
    }
}

fn handle_mouse(surface: &mut ControlSurface, layout: &PanelLayout, pointer: &mut PointerTracker) {
    let (x, y) = mouse_position();
    let mouse = vec2(x, y);
    let delta = mouse - pointer.last_mouse;
    pointer.last_mouse = mouse;

    if is_mouse_button_pressed(MouseButton::Left) {
        let hit = layout.hit_test(mouse);
        pointer.pressed_on = hit;
        if let Some(slot) = hit {
            let now = get_time();
            pointer.double_click = match pointer.last_press {
                Some((previous, at)) if previous == slot && now - at < DOUBLE_CLICK_SECONDS => {
                    Some(slot)
                }
                _ => None,
            };
            pointer.last_press = Some((slot, now));
            if slot.is_knob() {
                surface.dispatch(slot, &InputEvent::MouseDown);
            }
        }
    }

    if delta.y != 0.0 {
        surface.dispatch_global(&InputEvent::MouseMove {
            delta_y: delta.y,
            fine: fine_modifier(),
        });
    }

    if is_mouse_button_released(MouseButton::Left) {
        surface.dispatch_global(&InputEvent::MouseUp);
        let released_over = layout.hit_test(mouse);
        match pointer.pressed_on.take() {
            Some(Slot::Bypass) if released_over == Some(Slot::Bypass) => {
                surface.dispatch(Slot::Bypass, &InputEvent::Activate);
            }
            Some(slot) if pointer.double_click == Some(slot) => {
                surface.dispatch(slot, &InputEvent::Reset);
                pointer.double_click = None;
                pointer.last_press = None;
            }
            _ => {}
        }
    }
}

fn fine_modifier() -> bool {
    is_key_down(KeyCode::LeftShift) || is_key_down(KeyCode::RightShift)
}

#[derive(Debug, PartialEq)]
enum Routed {
    Anchor(Slot, InputEvent),
    Global(InputEvent),
}

fn handle_touches(surface: &mut ControlSurface, layout: &PanelLayout) {
    for routed in route_touches(layout, &touches(), fine_modifier()) {
        match routed {
            Routed::Anchor(slot, event) => surface.dispatch(slot, &event),
            Routed::Global(event) => surface.dispatch_global(&event),
        };
    }
}

fn route_touches(layout: &PanelLayout, touches: &[Touch], fine: bool) -> Vec<Routed> {
    let mut routed = Vec::new();
    let mut moved = Vec::new();
    let mut ended = Vec::new();
    for touch in touches {
        let point = TouchPoint::new(touch.id, touch.position.y);
        match touch.phase {
            TouchPhase::Started => match layout.hit_test(touch.position) {
                Some(Slot::Bypass) => routed.push(Routed::Anchor(Slot::Bypass, InputEvent::Activate)),
                Some(slot) => routed.push(Routed::Anchor(
                    slot,
                    InputEvent::TouchStart {
                        touches: vec![point],
                    },
                )),
                None => {}
            },
            TouchPhase::Moved => moved.push(point),
            TouchPhase::Ended | TouchPhase::Cancelled => ended.push(point),
            TouchPhase::Stationary => {}
        }
    }
    if !moved.is_empty() {
        routed.push(Routed::Global(InputEvent::TouchMove {
            touches: moved,
            fine,
        }));
    }
    if !ended.is_empty() {
        routed.push(Routed::Global(InputEvent::TouchEnd { touches: ended }));
    }
    routed
}

fn handle_host_keys(bank: &RemoteBank, model_state: &Arc<Mutex<TremoloState>>) {
    let Ok(state) = model_state.lock() else {
        return;
    };
    let bypass = state.bypass;
    let rate = state.rate_hz;
    drop(state);

    if is_key_pressed(KeyCode::Space) {
        bank.send(ModelCommand::Set(Slot::Bypass, if bypass { 0.0 } else { 1.0 }));
    }
    if is_key_pressed(KeyCode::Up) {
        bank.send(ModelCommand::Set(Slot::Rate, rate + RATE_NUDGE_HZ));
    }
    if is_key_pressed(KeyCode::Down) {
        bank.send(ModelCommand::Set(Slot::Rate, rate - RATE_NUDGE_HZ));
    }
}

fn draw_scene(
    layout: &PanelLayout,
    visuals: &PanelVisuals,
    model_state: &Arc<Mutex<TremoloState>>,
    options: Options,
) {
    clear_background(BACKGROUND);
    let enclosure = layout.enclosure;
    draw_rectangle(enclosure.x, enclosure.y, enclosure.w, enclosure.h, ENCLOSURE);
    draw_rectangle_lines(enclosure.x, enclosure.y, enclosure.w, enclosure.h, 2.0, CREAM);

    for (slot, rect) in &layout.knobs {
        let rotation = match visuals.get(*slot) {
            Some(VisualState::Rotation(degrees)) => degrees,
            _ => 0.0,
        };
        draw_knob(*rect, rotation, slot.label());
    }

    let lit = matches!(visuals.get(Slot::Bypass), Some(VisualState::Switch(true)));
    draw_led(layout.led, lit);
    draw_stomp_switch(layout.switch);

    if let Ok(state) = model_state.lock() {
        draw_model_info(&state, options, layout);
    }
}

fn draw_knob(rect: Rect, rotation: f32, label: &str) {
    let center = rect.center();
    let radius = rect.w.min(rect.h) * 0.5;
    draw_circle(center.x, center.y, radius, KNOB_BODY);
    draw_circle_lines(center.x, center.y, radius, 1.5, CREAM);
    let theta = rotation.to_radians();
    let pointer = vec2(theta.sin(), -theta.cos()) * radius * 0.8;
    draw_line(
        center.x,
        center.y,
        center.x + pointer.x,
        center.y + pointer.y,
        3.0,
        CREAM,
    );
    draw_centered_text(label, Rect::new(rect.x, rect.y + rect.h + 2.0, rect.w, 16.0), 14);
}

fn draw_led(rect: Rect, lit: bool) {
    let center = rect.center();
    let alpha = if lit { 1.0 } else { 0.5 };
    draw_circle(center.x, center.y, rect.w * 0.5, Color::new(1.0, 0.0, 0.0, alpha));
    draw_circle(
        center.x - rect.w * 0.15,
        center.y - rect.h * 0.15,
        rect.w * 0.2,
        Color::new(1.0, 1.0, 1.0, 0.5),
    );
}

fn draw_stomp_switch(rect: Rect) {
    draw_rectangle(rect.x, rect.y, rect.w, rect.h, Color::new(0.75, 0.75, 0.78, 1.0));
    draw_rectangle_lines(rect.x, rect.y, rect.w, rect.h, 2.0, KNOB_BODY);
    draw_centered_text("TREMOLO", rect, 28);
}

fn draw_model_info(state: &TremoloState, options: Options, layout: &PanelLayout) {
    let text = format!(
        "RATE {:.2} Hz\nDEPTH {:.0}%\nSHAPE {}\n{}\nMODE {}\nEDITS {}{}",
        state.rate_hz,
        state.depth * 100.0,
        state.wave.label(),
        if state.bypass { "BYPASSED" } else { "ENGAGED" },
        if options.controlled {
            "CONTROLLED"
        } else {
            "UNCONTROLLED"
        },
        state.edits,
        if state.open_gestures > 0 { "  (editing)" } else { "" },
    );
    for (line, y) in text.lines().zip(layout.info_baselines()) {
        draw_text_ex(
            line,
            layout.info.x,
            y,
            TextParams {
                font_size: 16,
                color: CREAM,
                ..Default::default()
            },
        );
    }
}

fn draw_centered_text(text: &str, rect: Rect, size: u16) {
    let dims = measure_text(text, None, size, 1.0);
    draw_text_ex(
        text,
        rect.x + (rect.w - dims.width) * 0.5,
        rect.y + (rect.h + dims.height) * 0.5,
        TextParams {
            font_size: size,
            color: CREAM,
            ..Default::default()
        },
    );
}
