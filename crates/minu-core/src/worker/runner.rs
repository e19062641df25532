use embassy_futures::select::{Either, select};
use embassy_time::Timer;
use log::{debug, info};

use super::{WorkKind, WorkSources, WorkerConfig, WorkerHandle};
use crate::{
    canvas::{BACKGROUND_DEFAULT, Canvas, Color, FOREGROUND_DEFAULT, Point, print_fmt},
    shared::Shared,
};

/// Executes whatever worker the slot hands out.
///
/// The worker future is raced against the stop signal and dropped when stop
/// wins. Drawing happens while holding the canvas lock and never spans an
/// await, so a stop cannot land mid-draw.
pub struct WorkerRunner<S> {
    sources: S,
    config: WorkerConfig,
}

impl<S> WorkerRunner<S>
where
    S: WorkSources,
{
    pub const fn new(sources: S, config: WorkerConfig) -> Self {
        Self { sources, config }
    }

    pub async fn run<A, C>(&mut self, shared: &Shared<A, C>) -> !
    where
        C: Canvas,
    {
        let slot = &shared.worker;
        loop {
            let handle = slot.start.wait().await;
            debug!("worker: runner picked up generation {}", handle.generation);

            // Stop is polled first so a pending stop wins before any work runs.
            match select(slot.stop.wait(), self.work(handle, shared)).await {
                Either::First(()) => {}
                Either::Second(never) => match never {},
            }

            slot.stopped.signal(handle);
        }
    }

    async fn work<A, C>(
        &mut self,
        handle: WorkerHandle,
        shared: &Shared<A, C>,
    ) -> core::convert::Infallible
    where
        C: Canvas,
    {
        // The region starts below a fresh page draw, not wherever a previous
        // worker left the cursor.
        shared.coord.render.request();
        shared.coord.render.wait_rendered().await;

        let origin = {
            let mut canvas = shared.canvas.lock().await;
            let origin = canvas.cursor();
            let (width, height) = (canvas.width(), canvas.height());
            canvas.fill_rect(0, origin.y, width, height - origin.y, BACKGROUND_DEFAULT);
            origin
        };

        loop {
            match handle.kind {
                WorkKind::ClockRefresh => self.draw_clock(origin, shared).await,
                WorkKind::DeviceInfoRefresh => self.draw_device_info(origin, shared).await,
                WorkKind::ReachabilityProbe => self.probe_targets(handle, shared).await,
            }

            Timer::after_millis(self.config.interval_ms()).await;
        }
    }

    async fn draw_clock<A, C>(&mut self, origin: Point, shared: &Shared<A, C>)
    where
        C: Canvas,
    {
        let time = self.sources.local_time().await;

        let mut canvas = shared.canvas.lock().await;
        canvas.set_cursor(origin.x, origin.y);
        match time {
            Some(time) => {
                canvas.set_text_color(FOREGROUND_DEFAULT, BACKGROUND_DEFAULT);
                print_fmt(&mut *canvas, format_args!("{time}"));
            }
            None => {
                canvas.set_text_color(Color::RED, BACKGROUND_DEFAULT);
                canvas.print("--:--:--H\n");
                canvas.set_text_color(FOREGROUND_DEFAULT, BACKGROUND_DEFAULT);
            }
        }
    }

    async fn draw_device_info<A, C>(&mut self, origin: Point, shared: &Shared<A, C>)
    where
        C: Canvas,
    {
        let info = self.sources.device_info().await;

        let mut canvas = shared.canvas.lock().await;
        canvas.set_cursor(origin.x, origin.y);
        canvas.set_text_color(FOREGROUND_DEFAULT, BACKGROUND_DEFAULT);
        print_fmt(&mut *canvas, format_args!("{info}"));
    }

    /// Probes every target in order, publishing each result on its own.
    async fn probe_targets<A, C>(&mut self, handle: WorkerHandle, shared: &Shared<A, C>) {
        let count = shared.targets.len();
        info!("worker: pinging {} targets", count);

        for index in 0..count {
            let Some(target) = shared.targets.get(index) else {
                break;
            };

            let reachable = self.sources.probe(&target).await;
            shared.targets.record(index, reachable);

            if let Some(page) = handle.page {
                let mut menu = shared.menu.lock().await;
                if let Ok(page) = menu.page_mut(page) {
                    let color = if reachable { Color::GREEN } else { Color::RED };
                    page.set_aux_background(index, color);
                }
            }

            info!(
                "worker: target {} ({}) -> ping {}",
                index,
                target.display_name,
                if reachable { "OK" } else { "FAIL" }
            );
            shared.coord.render.request();
        }
    }
}
