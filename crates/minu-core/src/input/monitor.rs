use embassy_time::{Instant, Timer};
use log::{debug, warn};

use super::{BUTTON_COUNT, ButtonEvent, ButtonId, ButtonInput, InputConfig, PressState};
use crate::shared::Coordinator;

/// Turns sampled button edges into classified press events.
#[derive(Debug)]
pub struct InputMonitor<B> {
    buttons: B,
    config: InputConfig,
    states: [PressState; BUTTON_COUNT],
}

impl<B> InputMonitor<B>
where
    B: ButtonInput,
{
    pub const fn new(buttons: B, config: InputConfig) -> Self {
        Self {
            buttons,
            config,
            states: [PressState::new(); BUTTON_COUNT],
        }
    }

    pub fn buttons(&self) -> &B {
        &self.buttons
    }

    /// Samples once and emits one event per completed press.
    pub fn poll_once(&mut self, now_ms: u64, mut emit: impl FnMut(ButtonEvent)) {
        self.buttons.update();

        for (button, state) in ButtonId::ALL.into_iter().zip(self.states.iter_mut()) {
            if self.buttons.was_pressed(button) {
                state.on_pressed(now_ms);
            }
            if self.buttons.was_released(button)
                && let Some(kind) =
                    state.on_released(now_ms, self.config.long_press_threshold_ms())
            {
                emit(ButtonEvent {
                    button,
                    kind,
                    timestamp_ms: now_ms,
                });
            }
        }
    }

    pub async fn run(&mut self, coord: &Coordinator) -> ! {
        loop {
            let now_ms = Instant::now().as_millis();
            let mut published = false;

            self.poll_once(now_ms, |event| {
                if coord.presses.publish(event.button, event.kind) {
                    debug!(
                        "input: {:?} {:?} at {}ms",
                        event.button, event.kind, event.timestamp_ms
                    );
                } else {
                    warn!(
                        "input: dropped {:?} {:?}, previous press unread",
                        event.button, event.kind
                    );
                }
                published = true;
            });

            if published {
                coord.wake_ui();
            }

            Timer::after_millis(self.config.poll_interval_ms()).await;
        }
    }
}
