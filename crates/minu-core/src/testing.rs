//! Host fakes for the hardware-facing traits.

use std::{cell::RefCell, rc::Rc, string::String, vec::Vec};

use embassy_time::Timer;

use crate::{
    canvas::{BACKGROUND_DEFAULT, Canvas, Color, FOREGROUND_DEFAULT, Point},
    clock::LocalTime,
    fob::{WifiControl, WifiMode, WifiSnapshot, WifiStatusSource},
    input::{BUTTON_COUNT, ButtonId, ButtonInput},
    probe::PingTarget,
    scan::{MAX_SCAN_RESULTS, ScanError, ScannedNetwork, WifiScanner},
    worker::{DeviceInfo, WorkSources},
};

#[derive(Clone, Copy, Debug, Default)]
struct ButtonStep {
    pressed: [bool; BUTTON_COUNT],
    released: [bool; BUTTON_COUNT],
}

/// Replays one step of edges per `update`, then reports no edges.
#[derive(Debug, Default)]
pub struct ScriptedButtons {
    steps: Vec<ButtonStep>,
    cursor: usize,
    current: ButtonStep,
}

impl ScriptedButtons {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(mut self, button: ButtonId) -> Self {
        let mut step = ButtonStep::default();
        step.pressed[button.index()] = true;
        self.steps.push(step);
        self
    }

    pub fn release(mut self, button: ButtonId) -> Self {
        let mut step = ButtonStep::default();
        step.released[button.index()] = true;
        self.steps.push(step);
        self
    }

    pub fn idle(mut self) -> Self {
        self.steps.push(ButtonStep::default());
        self
    }
}

impl ButtonInput for ScriptedButtons {
    fn update(&mut self) {
        self.current = self.steps.get(self.cursor).copied().unwrap_or_default();
        self.cursor = self.cursor.saturating_add(1);
    }

    fn was_pressed(&self, button: ButtonId) -> bool {
        self.current.pressed[button.index()]
    }

    fn was_released(&self, button: ButtonId) -> bool {
        self.current.released[button.index()]
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CanvasOp {
    Clear(Color),
    Fill {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        color: Color,
    },
    Text {
        x: i32,
        y: i32,
        foreground: Color,
        background: Color,
        text: String,
    },
}

/// Canvas with a 6x8 cell per text size unit that records every operation.
#[derive(Debug)]
pub struct RecordingCanvas {
    width: i32,
    height: i32,
    cursor: Point,
    text_size: u8,
    foreground: Color,
    background: Color,
    pub ops: Vec<CanvasOp>,
}

impl RecordingCanvas {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            cursor: Point::default(),
            text_size: 1,
            foreground: FOREGROUND_DEFAULT,
            background: BACKGROUND_DEFAULT,
            ops: Vec::new(),
        }
    }

    /// Text operations in draw order.
    pub fn texts(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                CanvasOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn text_op(&self, needle: &str) -> Option<&CanvasOp> {
        self.ops
            .iter()
            .find(|op| matches!(op, CanvasOp::Text { text, .. } if text == needle))
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.texts().iter().any(|text| text.contains(needle))
    }

    pub fn reset_ops(&mut self) {
        self.ops.clear();
    }
}

impl Canvas for RecordingCanvas {
    fn width(&self) -> i32 {
        self.width
    }

    fn height(&self) -> i32 {
        self.height
    }

    fn cursor(&self) -> Point {
        self.cursor
    }

    fn set_cursor(&mut self, x: i32, y: i32) {
        self.cursor = Point::new(x, y);
    }

    fn text_size(&self) -> u8 {
        self.text_size
    }

    fn set_text_size(&mut self, size: u8) {
        self.text_size = size.max(1);
    }

    fn set_text_color(&mut self, foreground: Color, background: Color) {
        self.foreground = foreground;
        self.background = background;
    }

    fn char_width(&self) -> i32 {
        6 * self.text_size as i32
    }

    fn line_height(&self) -> i32 {
        8 * self.text_size as i32
    }

    fn fill_rect(&mut self, x: i32, y: i32, width: i32, height: i32, color: Color) {
        self.ops.push(CanvasOp::Fill {
            x,
            y,
            width,
            height,
            color,
        });
    }

    fn clear(&mut self, color: Color) {
        self.ops.push(CanvasOp::Clear(color));
    }

    fn print(&mut self, text: &str) {
        let mut segments = text.split('\n').peekable();
        while let Some(segment) = segments.next() {
            if !segment.is_empty() {
                self.ops.push(CanvasOp::Text {
                    x: self.cursor.x,
                    y: self.cursor.y,
                    foreground: self.foreground,
                    background: self.background,
                    text: segment.into(),
                });
                self.cursor.x += self.char_width() * segment.chars().count() as i32;
            }
            if segments.peek().is_some() {
                self.cursor = Point::new(0, self.cursor.y + self.line_height());
            }
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum WorkEvent {
    Time,
    Info,
    Probe(String),
}

pub type WorkLog = Rc<RefCell<Vec<WorkEvent>>>;

/// Worker data with a configurable probe latency and failing hosts.
pub struct ScriptedSources {
    pub time: Option<LocalTime>,
    pub info: DeviceInfo,
    pub unreachable: Vec<&'static str>,
    pub probe_delay_ms: u64,
    pub log: WorkLog,
}

impl ScriptedSources {
    pub fn new(log: WorkLog) -> Self {
        Self {
            time: LocalTime::from_unix(1_709_159_405, 0),
            info: DeviceInfo {
                name: heapless::String::try_from("TestFob").unwrap(),
                uptime_ms: 1_234,
                hwid: [0xDE, 0xAD, 0xBE, 0xEF, 0x00, 0x01],
                battery_pct: 87,
            },
            unreachable: Vec::new(),
            probe_delay_ms: 0,
            log,
        }
    }

    pub fn count(log: &WorkLog, event: &WorkEvent) -> usize {
        log.borrow().iter().filter(|seen| *seen == event).count()
    }

    pub fn probes(log: &WorkLog) -> Vec<String> {
        log.borrow()
            .iter()
            .filter_map(|event| match event {
                WorkEvent::Probe(name) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }
}

impl WorkSources for ScriptedSources {
    async fn local_time(&mut self) -> Option<LocalTime> {
        self.log.borrow_mut().push(WorkEvent::Time);
        self.time
    }

    async fn device_info(&mut self) -> DeviceInfo {
        self.log.borrow_mut().push(WorkEvent::Info);
        self.info.clone()
    }

    async fn probe(&mut self, target: &PingTarget) -> bool {
        if self.probe_delay_ms > 0 {
            Timer::after_millis(self.probe_delay_ms).await;
        }
        let name = target.display_name.as_str();
        self.log.borrow_mut().push(WorkEvent::Probe(name.into()));
        !self.unreachable.iter().any(|host| *host == name)
    }
}

/// Radio fake; connection requests take effect immediately.
pub struct ScriptedWifi {
    pub status: WifiSnapshot,
    pub networks: Option<Vec<(&'static str, i8)>>,
    pub connect_calls: usize,
    pub ap_calls: usize,
}

impl ScriptedWifi {
    pub fn new() -> Self {
        Self {
            status: WifiSnapshot::OFF,
            networks: Some(Vec::new()),
            connect_calls: 0,
            ap_calls: 0,
        }
    }
}

impl WifiStatusSource for ScriptedWifi {
    fn snapshot(&self) -> WifiSnapshot {
        self.status
    }
}

impl WifiControl for ScriptedWifi {
    async fn connect_station(&mut self) {
        self.connect_calls += 1;
        self.status = WifiSnapshot {
            mode: WifiMode::Station,
            connected: false,
            ip: None,
        };
    }

    async fn start_access_point(&mut self) {
        self.ap_calls += 1;
        self.status = WifiSnapshot {
            mode: WifiMode::AccessPoint,
            connected: false,
            ip: Some(core::net::Ipv4Addr::new(192, 168, 4, 1)),
        };
    }
}

impl WifiScanner for ScriptedWifi {
    async fn scan(
        &mut self,
        out: &mut heapless::Vec<ScannedNetwork, MAX_SCAN_RESULTS>,
    ) -> Result<(), ScanError> {
        let Some(networks) = &self.networks else {
            return Err(ScanError::Radio);
        };
        for (ssid, rssi) in networks {
            let _ = out.push(ScannedNetwork {
                ssid: heapless::String::try_from(*ssid).unwrap(),
                rssi: *rssi,
            });
        }
        Ok(())
    }
}

/// Static status for render hook tests.
#[derive(Clone, Copy)]
pub struct FixedStatus(pub WifiSnapshot);

impl WifiStatusSource for FixedStatus {
    fn snapshot(&self) -> WifiSnapshot {
        self.0
    }
}
