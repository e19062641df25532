use log::debug;

use super::{ItemActions, UiContext};
use crate::{
    input::{ButtonId, PressKind},
    shared::Shared,
};

/// Consumes press flags, drives the menu and requests renders.
pub struct UiController<X> {
    actions: X,
}

impl<X> UiController<X> {
    pub const fn new(actions: X) -> Self {
        Self { actions }
    }

    pub fn actions(&self) -> &X {
        &self.actions
    }

    /// One controller cycle: drain presses, act, then make sure what is on
    /// screen matches the menu before returning.
    pub async fn step<A, C>(&mut self, shared: &Shared<A, C>)
    where
        A: Clone,
        X: ItemActions<A, C>,
    {
        let presses = &shared.coord.presses;
        let ui = UiContext::new(shared);

        if presses.take(ButtonId::A, PressKind::Short) {
            let mut menu = shared.menu.lock().await;
            if let Some(page) = menu.current_page_mut() {
                page.highlight_next();
            }
        }

        // Drain both flags even when the first one is set.
        let long_a = presses.take(ButtonId::A, PressKind::Long);
        let short_b = presses.take(ButtonId::B, PressKind::Short);
        if long_a || short_b {
            let item = {
                let menu = shared.menu.lock().await;
                menu.current_page()
                    .and_then(|page| page.highlighted_item())
                    .cloned()
            };
            if let Some(item) = item
                && let Some(action) = item.action().cloned()
            {
                self.actions.invoke(action, &item, &ui).await;
            }
        }

        if presses.take(ButtonId::B, PressKind::Long) {
            debug!("ui: long press on B ignored");
        }
        for kind in [PressKind::Short, PressKind::Long] {
            if presses.take(ButtonId::C, kind) {
                debug!("ui: {:?} press on C ignored", kind);
            }
        }

        // An action may already have rendered this view; only ask again when
        // the screen is stale.
        let view = shared.menu.lock().await.view();
        let render = &shared.coord.render;
        let drawn = render.last_drawn_view();
        if drawn != view {
            debug!("ui: view changed {:?} -> {:?}", drawn, view);
            render.request();
        } else if !render.rendered() {
            render.kick();
        }
        render.wait_rendered().await;
    }

    pub async fn run<A, C>(&mut self, shared: &Shared<A, C>) -> !
    where
        A: Clone,
        X: ItemActions<A, C>,
    {
        loop {
            self.step(shared).await;
            if !shared.coord.presses.any_pending() {
                shared.coord.wait_ui_wake().await;
            }
        }
    }
}
