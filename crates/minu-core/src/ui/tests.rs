use embassy_futures::{
    block_on,
    select::{select, select3},
};
use embassy_time::Timer;

use super::*;
use crate::{
    canvas::Color,
    input::{ButtonId, PressKind},
    menu::{Menu, Page},
    render::{NoHooks, RenderConfig, RenderScheduler},
    testing::{RecordingCanvas, ScriptedSources, WorkEvent, WorkLog},
    worker::{WorkerConfig, WorkerRunner},
};

type TestShared = Shared<u8, RecordingCanvas>;

const JUMP: u8 = 9;

struct Recording {
    invoked: Vec<(u8, String)>,
    jump_to: Option<PageId>,
}

impl Recording {
    fn new(jump_to: Option<PageId>) -> Self {
        Self {
            invoked: Vec::new(),
            jump_to,
        }
    }
}

impl ItemActions<u8, RecordingCanvas> for Recording {
    async fn invoke(
        &mut self,
        action: u8,
        item: &PageItem<u8>,
        ui: &UiContext<'_, u8, RecordingCanvas>,
    ) {
        self.invoked.push((action, item.main_text().into()));
        if action == JUMP
            && let Some(id) = self.jump_to
        {
            ui.go_to_page(id).await.unwrap();
            ui.render_and_wait().await;
        }
    }
}

struct Pages {
    home: PageId,
    clock: PageId,
    info: PageId,
    results: PageId,
}

fn build() -> (TestShared, Pages) {
    let mut menu = Menu::new();

    let mut home = Page::new("HOME");
    home.add_item(Some(JUMP), "Jump", "", None).unwrap();
    home.add_item(Some(1), "One", "", None).unwrap();
    home.add_item(Some(2), "Two", "", None).unwrap();
    home.add_item(Some(3), "Three", "", None).unwrap();
    let home = menu.add_page(home).unwrap();

    let mut clock = Page::new("CLOCK")
        .with_open_hook(LifecycleHook::StartWorker(WorkKind::ClockRefresh))
        .with_close_hook(LifecycleHook::StopWorker);
    clock.add_item(Some(0), "", "", None).unwrap();
    let clock = menu.add_page(clock).unwrap();

    let mut info = Page::new("INFO")
        .with_open_hook(LifecycleHook::StartWorker(WorkKind::DeviceInfoRefresh))
        .with_close_hook(LifecycleHook::StopWorker);
    info.add_item(Some(0), "", "", None).unwrap();
    let info = menu.add_page(info).unwrap();

    let mut results = Page::new("RESULTS").with_close_hook(LifecycleHook::ClearItems);
    results.add_item(None, "net", "-40", None).unwrap();
    results.set_footer("Scan done. 1 found");
    let results = menu.add_page(results).unwrap();

    (
        Shared::new(menu, RecordingCanvas::new(240, 135)),
        Pages {
            home,
            clock,
            info,
            results,
        },
    )
}

async fn until(mut condition: impl FnMut() -> bool) {
    while !condition() {
        Timer::after_millis(1).await;
    }
}

#[test]
fn short_a_presses_cycle_highlight_with_one_render_each() {
    let (shared, pages) = build();
    let mut scheduler = RenderScheduler::new(NoHooks, RenderConfig::default());
    let mut controller = UiController::new(Recording::new(None));

    block_on(select(scheduler.run(&shared), async {
        controller.step(&shared).await;
        let render = &shared.coord.render;
        assert_eq!(render.render_count(), 1);

        for (presses, expected) in [(1, 1), (2, 2), (3, 3), (4, 0)] {
            shared.coord.presses.publish(ButtonId::A, PressKind::Short);
            controller.step(&shared).await;

            let view = render.last_drawn_view().unwrap();
            assert_eq!(view.page, pages.home);
            assert_eq!(view.highlighted, Some(expected));
            assert_eq!(render.render_count(), 1 + presses);
        }

        // No press, no change: nothing to draw.
        controller.step(&shared).await;
        assert_eq!(render.render_count(), 5);
    }));
}

#[test]
fn long_a_and_short_b_activate_once_per_cycle() {
    let (shared, _) = build();
    let mut scheduler = RenderScheduler::new(NoHooks, RenderConfig::default());
    let mut controller = UiController::new(Recording::new(None));

    block_on(select(scheduler.run(&shared), async {
        controller.step(&shared).await;
        shared.coord.presses.publish(ButtonId::A, PressKind::Short);
        shared.coord.presses.publish(ButtonId::A, PressKind::Long);
        shared.coord.presses.publish(ButtonId::B, PressKind::Short);
        shared.coord.presses.publish(ButtonId::B, PressKind::Long);
        controller.step(&shared).await;
    }));

    assert_eq!(controller.actions().invoked, vec![(1, "One".into())]);
    assert!(!shared.coord.presses.any_pending());
}

#[test]
fn action_that_renders_itself_is_not_rendered_again() {
    let (shared, pages) = build();
    let mut scheduler = RenderScheduler::new(NoHooks, RenderConfig::default());
    let mut controller = UiController::new(Recording::new(Some(pages.results)));

    block_on(select(scheduler.run(&shared), async {
        controller.step(&shared).await;
        shared.coord.presses.publish(ButtonId::B, PressKind::Short);
        controller.step(&shared).await;

        let render = &shared.coord.render;
        assert_eq!(render.render_count(), 2);
        assert_eq!(render.last_drawn_view().unwrap().page, pages.results);
        assert!(render.rendered());
    }));
}

#[test]
fn unknown_page_is_rejected_without_side_effects() {
    let (shared, pages) = build();
    let ui = UiContext::new(&shared);
    let missing = {
        let mut menu = Menu::<u8>::new();
        for _ in 0..6 {
            menu.add_page(Page::new("X")).unwrap();
        }
        menu.add_page(Page::new("X")).unwrap()
    };

    let outcome = block_on(ui.go_to_page(missing));

    assert_eq!(outcome, Err(MenuError::UnknownPage));
    let menu = shared.menu.try_lock().unwrap();
    assert_eq!(menu.current_page_id(), Some(pages.home));
}

#[test]
fn leaving_a_worker_page_stops_it_before_the_next_one_starts() {
    let (shared, pages) = build();
    let log = WorkLog::default();
    let mut runner = WorkerRunner::new(
        ScriptedSources::new(log.clone()),
        WorkerConfig::default().with_interval_ms(5),
    );
    let mut scheduler = RenderScheduler::new(NoHooks, RenderConfig::default());

    block_on(select3(scheduler.run(&shared), runner.run(&shared), async {
        let ui = UiContext::new(&shared);

        ui.go_to_page(pages.clock).await.unwrap();
        let clock = shared.worker.current().unwrap();
        assert_eq!(clock.kind, WorkKind::ClockRefresh);
        assert_eq!(clock.page, Some(pages.clock));

        ui.render_and_wait().await;
        until(|| ScriptedSources::count(&log, &WorkEvent::Time) >= 2).await;

        ui.go_to_page(pages.info).await.unwrap();
        let clock_cycles = ScriptedSources::count(&log, &WorkEvent::Time);
        let info = shared.worker.current().unwrap();
        assert_eq!(info.kind, WorkKind::DeviceInfoRefresh);
        assert_eq!(info.generation, clock.generation + 1);

        ui.render_and_wait().await;
        until(|| ScriptedSources::count(&log, &WorkEvent::Info) >= 2).await;
        assert_eq!(ScriptedSources::count(&log, &WorkEvent::Time), clock_cycles);

        ui.go_to_page(pages.home).await.unwrap();
        assert_eq!(shared.worker.current(), None);
    }));
}

#[test]
fn closing_the_results_page_clears_it() {
    let (shared, pages) = build();
    let ui = UiContext::new(&shared);

    block_on(async {
        ui.go_to_page(pages.results).await.unwrap();
        ui.go_to_page(pages.home).await.unwrap();
    });

    let menu = shared.menu.try_lock().unwrap();
    let results = menu.page(pages.results).unwrap();
    assert!(results.items().is_empty());
    assert_eq!(results.footer(), "");
    assert_eq!(results.highlighted_index(), None);
}

#[test]
fn opening_the_probe_page_resets_previous_results() {
    let mut menu = Menu::new();
    let home = menu.add_page(Page::<u8>::new("HOME")).unwrap();
    let mut ping = Page::new("PING")
        .with_open_hook(LifecycleHook::StartWorker(WorkKind::ReachabilityProbe))
        .with_close_hook(LifecycleHook::StopWorker);
    ping.add_item(None, "alpha", " ", None).unwrap();
    ping.add_item(Some(0), "<--", "", None).unwrap();
    ping.set_aux_background(0, Color::RED);
    let ping = menu.add_page(ping).unwrap();
    let shared = Shared::new(menu, RecordingCanvas::new(240, 135));
    shared.targets.push(crate::probe::PingTarget::by_host("alpha", "alpha.lan"));
    shared.targets.record(0, true);

    let log = WorkLog::default();
    let mut runner = WorkerRunner::new(
        ScriptedSources::new(log.clone()),
        WorkerConfig::default().with_interval_ms(10_000),
    );

    block_on(select(runner.run(&shared), async {
        let ui = UiContext::new(&shared);
        ui.go_to_page(ping).await.unwrap();

        {
            let menu = shared.menu.lock().await;
            let page = menu.page(ping).unwrap();
            assert_eq!(page.items()[0].aux_background(), Color::BLACK);
            assert_eq!(page.highlighted_index(), Some(0));
        }
        assert!(!shared.targets.get(0).unwrap().probed);

        ui.go_to_page(home).await.unwrap();
    }));

    assert!(log.borrow().is_empty());
}
