use embassy_futures::{block_on, join::join, select::select};
use embassy_time::Timer;

use super::*;
use crate::{
    canvas::{Color, Point},
    menu::Menu,
    testing::{CanvasOp, RecordingCanvas},
};

fn shared_with_page() -> Shared<u8, RecordingCanvas> {
    let mut menu = Menu::new();
    let mut page = Page::new("HOME");
    page.add_item(Some(1), "One", " ", Some(9)).unwrap();
    page.add_item(Some(2), "Two", "", None).unwrap();
    menu.add_page(page).unwrap();
    Shared::new(menu, RecordingCanvas::new(240, 135))
}

#[test]
fn first_render_is_owed_at_boot() {
    let state = RenderState::new();
    assert!(!state.rendered());
    assert_eq!(state.last_drawn_view(), None);
    assert_eq!(state.render_count(), 0);
}

#[test]
fn burst_of_requests_collapses_into_one_render() {
    let shared = shared_with_page();
    let mut scheduler = RenderScheduler::new(NoHooks, RenderConfig::default());

    for _ in 0..10 {
        shared.coord.render.request();
    }

    block_on(select(scheduler.run(&shared), async {
        shared.coord.render.wait_rendered().await;
        // Give the scheduler a chance to render again if it were queuing.
        Timer::after_millis(20).await;
    }));

    assert_eq!(shared.coord.render.render_count(), 1);
    assert!(shared.coord.render.rendered());
}

#[test]
fn request_during_render_is_not_marked_done_by_it() {
    let state = RenderState::new();
    let target = state.begin();
    state.request();
    state.finish(target, None);
    assert!(!state.rendered());

    let target = state.begin();
    state.finish(target, None);
    assert!(state.rendered());
    assert_eq!(state.render_count(), 2);
}

#[test]
fn every_waiter_is_released_by_one_render() {
    let shared = shared_with_page();
    let mut scheduler = RenderScheduler::new(NoHooks, RenderConfig::default());
    let render = &shared.coord.render;

    block_on(select(
        join(render.wait_rendered(), render.wait_rendered()),
        async {
            Timer::after_millis(5).await;
            render.request();
            scheduler.render_once(&shared).await;
            core::future::pending::<()>().await;
        },
    ));

    assert!(render.rendered());
}

#[test]
fn render_once_resets_canvas_and_records_view() {
    let shared = shared_with_page();
    let mut scheduler = RenderScheduler::new(NoHooks, RenderConfig::default());

    block_on(scheduler.render_once(&shared));

    let canvas = block_on(shared.canvas.lock());
    assert_eq!(canvas.ops.first(), Some(&CanvasOp::Clear(Color::BLACK)));
    assert_eq!(canvas.text_size(), TEXT_SIZE_DEFAULT);
    assert_eq!(canvas.texts(), vec!["HOME", "One", " ", "Two"]);
    drop(canvas);

    let view = shared.coord.render.last_drawn_view().unwrap();
    assert_eq!(view.highlighted, Some(0));
}

#[derive(Default)]
struct Recorder {
    tokens: Vec<u8>,
    rendered_at: Option<Point>,
}

impl RenderHooks<u8> for Recorder {
    fn item_rendering(&mut self, token: &u8, item: &mut PageItem<u8>) {
        self.tokens.push(*token);
        item.set_aux_background(Color::RED);
    }

    fn page_rendered<C: Canvas + ?Sized>(&mut self, _id: PageId, _page: &Page<u8>, canvas: &mut C) {
        self.rendered_at = Some(canvas.cursor());
    }
}

#[test]
fn hooks_run_around_the_page_draw() {
    let shared = shared_with_page();
    let config = RenderConfig::default().with_text_size(1);
    let mut scheduler = RenderScheduler::new(Recorder::default(), config);

    block_on(scheduler.render_once(&shared));

    assert_eq!(scheduler.hooks().tokens, vec![9]);
    // Title plus two rows at 8 px per line.
    assert_eq!(scheduler.hooks().rendered_at, Some(Point::new(0, 24)));

    let canvas = block_on(shared.canvas.lock());
    assert!(canvas.ops.contains(&CanvasOp::Fill {
        x: 234,
        y: 8,
        width: 6,
        height: 8,
        color: Color::RED,
    }));
}
