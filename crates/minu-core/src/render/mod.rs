//! Render coordination: coalesced requests, completion tracking and the
//! scheduler that owns drawing.

#[cfg(test)]
mod tests;

use core::{
    cell::RefCell,
    future::poll_fn,
    sync::atomic::{AtomicU32, Ordering},
    task::Poll,
};

use embassy_sync::{
    blocking_mutex::{self, raw::CriticalSectionRawMutex},
    signal::Signal,
    waitqueue::MultiWakerRegistration,
};
use log::debug;

use crate::{
    canvas::{BACKGROUND_DEFAULT, Canvas, FOREGROUND_DEFAULT},
    menu::{Page, PageId, PageItem, ViewKey},
    shared::Shared,
};

pub const ITEM_MAX_VISIBLE: usize = 6;
pub const TEXT_SIZE_DEFAULT: u8 = 2;
/// Activities that may wait on render completion at the same time.
pub const RENDER_WAITERS: usize = 4;

const NO_VIEW: u32 = u32::MAX;

/// Render request and completion state shared by all activities.
///
/// A request bumps the `requested` generation and raises a single-slot
/// signal; any number of requests before the scheduler wakes collapse into
/// one render. A render that starts at generation `n` marks `drawn = n` when
/// it finishes, so "rendered" flips only once a full draw covering every
/// earlier request is complete.
pub struct RenderState {
    signal: Signal<CriticalSectionRawMutex, ()>,
    requested: AtomicU32,
    drawn: AtomicU32,
    drawn_view: AtomicU32,
    completed: AtomicU32,
    waiters: blocking_mutex::Mutex<
        CriticalSectionRawMutex,
        RefCell<MultiWakerRegistration<RENDER_WAITERS>>,
    >,
}

impl RenderState {
    pub const fn new() -> Self {
        Self {
            signal: Signal::new(),
            // Nothing has been drawn yet, so the first render is owed.
            requested: AtomicU32::new(1),
            drawn: AtomicU32::new(0),
            drawn_view: AtomicU32::new(NO_VIEW),
            completed: AtomicU32::new(0),
            waiters: blocking_mutex::Mutex::new(RefCell::new(MultiWakerRegistration::new())),
        }
    }

    /// Marks a render as owed and wakes the scheduler.
    pub fn request(&self) {
        self.invalidate();
        self.signal.signal(());
    }

    /// Marks a render as owed without waking the scheduler.
    pub fn invalidate(&self) {
        self.requested.fetch_add(1, Ordering::AcqRel);
    }

    /// Wakes the scheduler for a render already owed.
    pub fn kick(&self) {
        self.signal.signal(());
    }

    /// `true` when the last completed render covers every request so far.
    pub fn rendered(&self) -> bool {
        self.drawn.load(Ordering::Acquire) == self.requested.load(Ordering::Acquire)
    }

    /// View drawn by the last completed render.
    pub fn last_drawn_view(&self) -> Option<ViewKey> {
        match self.drawn_view.load(Ordering::Acquire) {
            NO_VIEW => None,
            word => Some(ViewKey::unpack(word)),
        }
    }

    /// Number of renders completed since boot.
    pub fn render_count(&self) -> u32 {
        self.completed.load(Ordering::Acquire)
    }

    pub async fn wait_rendered(&self) {
        poll_fn(|cx| {
            if self.rendered() {
                return Poll::Ready(());
            }
            self.waiters
                .lock(|waiters| waiters.borrow_mut().register(cx.waker()));
            if self.rendered() {
                Poll::Ready(())
            } else {
                Poll::Pending
            }
        })
        .await
    }

    pub(crate) async fn wait_request(&self) {
        self.signal.wait().await;
    }

    pub(crate) fn begin(&self) -> u32 {
        self.signal.reset();
        self.requested.load(Ordering::Acquire)
    }

    pub(crate) fn finish(&self, target: u32, view: Option<ViewKey>) {
        self.drawn_view
            .store(view.map_or(NO_VIEW, ViewKey::pack), Ordering::Release);
        self.drawn.store(target, Ordering::Release);
        self.completed.fetch_add(1, Ordering::AcqRel);
        self.waiters.lock(|waiters| waiters.borrow_mut().wake());
    }
}

impl Default for RenderState {
    fn default() -> Self {
        Self::new()
    }
}

/// Application decoration around each page draw.
pub trait RenderHooks<A> {
    /// Called for items carrying a render token, before the page is drawn.
    fn item_rendering(&mut self, _token: &A, _item: &mut PageItem<A>) {}

    /// Called after the page is drawn, with the cursor after the last row.
    fn page_rendered<C: Canvas + ?Sized>(&mut self, _id: PageId, _page: &Page<A>, _canvas: &mut C) {
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoHooks;

impl<A> RenderHooks<A> for NoHooks {}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct RenderConfig {
    max_visible: usize,
    text_size: u8,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_visible: ITEM_MAX_VISIBLE,
            text_size: TEXT_SIZE_DEFAULT,
        }
    }
}

impl RenderConfig {
    pub const fn with_max_visible(mut self, max_visible: usize) -> Self {
        self.max_visible = max_visible;
        self
    }

    pub const fn with_text_size(mut self, text_size: u8) -> Self {
        self.text_size = text_size;
        self
    }

    pub const fn max_visible(&self) -> usize {
        self.max_visible
    }

    pub const fn text_size(&self) -> u8 {
        self.text_size
    }
}

/// The only activity that draws menu pages.
pub struct RenderScheduler<H> {
    hooks: H,
    config: RenderConfig,
}

impl<H> RenderScheduler<H> {
    pub const fn new(hooks: H, config: RenderConfig) -> Self {
        Self { hooks, config }
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    /// Draws the current page once and publishes completion.
    ///
    /// The menu and canvas stay locked for the whole draw, so observers of
    /// `rendered` never see a partial frame.
    pub async fn render_once<A, C>(&mut self, shared: &Shared<A, C>)
    where
        A: Clone,
        H: RenderHooks<A>,
        C: Canvas,
    {
        let target = shared.coord.render.begin();

        let mut menu = shared.menu.lock().await;
        let mut canvas = shared.canvas.lock().await;

        canvas.clear(BACKGROUND_DEFAULT);
        canvas.set_cursor(0, 0);
        canvas.set_text_size(self.config.text_size);
        canvas.set_text_color(FOREGROUND_DEFAULT, BACKGROUND_DEFAULT);

        let view = menu.view();
        if let Some(id) = menu.current_page_id()
            && let Ok(page) = menu.page_mut(id)
        {
            for item in page.items_mut() {
                if let Some(token) = item.on_render().cloned() {
                    self.hooks.item_rendering(&token, item);
                }
            }

            page.render(self.config.max_visible, &mut *canvas);
            canvas.set_text_color(FOREGROUND_DEFAULT, BACKGROUND_DEFAULT);
            self.hooks.page_rendered(id, page, &mut *canvas);
            debug!("render: page {} drawn (generation {})", page.title(), target);
        }

        drop(canvas);
        drop(menu);
        shared.coord.render.finish(target, view);
    }

    pub async fn run<A, C>(&mut self, shared: &Shared<A, C>) -> !
    where
        A: Clone,
        H: RenderHooks<A>,
        C: Canvas,
    {
        loop {
            while !shared.coord.render.rendered() {
                self.render_once(shared).await;
            }
            shared.coord.render.wait_request().await;
        }
    }
}
