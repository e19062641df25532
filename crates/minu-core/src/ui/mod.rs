//! UI controller and page navigation.

mod controller;

#[cfg(test)]
mod tests;

pub use controller::UiController;

use log::info;

use crate::{
    canvas::BACKGROUND_DEFAULT,
    menu::{LifecycleHook, MenuError, PageId, PageItem},
    shared::Shared,
    worker::{WorkKind, WorkerHandle},
};

/// Application behavior bound to menu items.
#[allow(async_fn_in_trait)]
pub trait ItemActions<A, C> {
    /// Runs `action` for the activated `item`. Page changes and explicit
    /// renders go through `ui`.
    async fn invoke(&mut self, action: A, item: &PageItem<A>, ui: &UiContext<'_, A, C>);
}

/// Capabilities handed to item actions.
pub struct UiContext<'a, A, C> {
    shared: &'a Shared<A, C>,
}

impl<'a, A, C> UiContext<'a, A, C> {
    pub const fn new(shared: &'a Shared<A, C>) -> Self {
        Self { shared }
    }

    pub fn shared(&self) -> &'a Shared<A, C> {
        self.shared
    }

    /// Runs the outgoing page's close hook, switches page, then runs the new
    /// page's open hook. The new page is marked as owing a render before its
    /// open hook runs.
    pub async fn go_to_page(&self, id: PageId) -> Result<(), MenuError> {
        let (old, close_hook) = {
            let menu = self.shared.menu.lock().await;
            if !menu.contains(id) {
                return Err(MenuError::UnknownPage);
            }
            let old = menu.current_page_id();
            let close_hook = old
                .and_then(|old| menu.page(old).ok())
                .and_then(|page| page.close_hook());
            (old, close_hook)
        };

        if let Some(old) = old {
            if let Some(hook) = close_hook {
                self.run_hook(hook, old).await;
            }
            self.log_page("closed", old).await;
        }

        let open_hook = {
            let mut menu = self.shared.menu.lock().await;
            menu.set_current(id)?;
            self.shared.coord.render.invalidate();
            menu.page(id)?.open_hook()
        };
        self.log_page("opened", id).await;

        if let Some(hook) = open_hook {
            self.run_hook(hook, id).await;
        }
        Ok(())
    }

    pub fn request_render(&self) {
        self.shared.coord.render.request();
    }

    pub async fn wait_rendered(&self) {
        self.shared.coord.render.wait_rendered().await;
    }

    pub async fn render_and_wait(&self) {
        self.request_render();
        self.wait_rendered().await;
    }

    /// Starts `kind` bound to the current page, replacing any live worker.
    pub async fn start_worker(&self, kind: WorkKind) -> WorkerHandle {
        let page = self.shared.menu.lock().await.current_page_id();
        self.shared.worker.start(kind, page).await
    }

    pub async fn stop_worker(&self) {
        self.shared.worker.stop().await;
    }

    async fn run_hook(&self, hook: LifecycleHook, page: PageId) {
        match hook {
            LifecycleHook::StartWorker(kind) => {
                if kind == WorkKind::ReachabilityProbe {
                    let mut menu = self.shared.menu.lock().await;
                    if let Ok(page) = menu.page_mut(page) {
                        for item in page.items_mut() {
                            item.set_aux_background(BACKGROUND_DEFAULT);
                        }
                        page.highlight(0);
                    }
                    self.shared.targets.reset_results();
                }
                self.shared.worker.start(kind, Some(page)).await;
            }
            LifecycleHook::StopWorker => self.shared.worker.stop().await,
            LifecycleHook::ClearItems => {
                let mut menu = self.shared.menu.lock().await;
                if let Ok(page) = menu.page_mut(page) {
                    page.remove_all_items();
                    page.clear_footer();
                }
            }
        }
    }

    async fn log_page(&self, what: &str, id: PageId) {
        let menu = self.shared.menu.lock().await;
        if let Ok(page) = menu.page(id) {
            info!("ui: {} page {}", what, page.title());
        }
    }
}
