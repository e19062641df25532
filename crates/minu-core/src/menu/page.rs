use heapless::{String, Vec};

use super::{
    AUX_TEXT_LEN, FOOTER_LEN, LifecycleHook, MAIN_TEXT_LEN, MAX_ITEMS, MenuError, TITLE_LEN,
};
use crate::canvas::{BACKGROUND_DEFAULT, Canvas, Color, FOREGROUND_DEFAULT};

/// Copies `text` into a bounded string, dropping whatever does not fit.
pub(crate) fn truncated<const N: usize>(text: &str) -> String<N> {
    let mut out = String::new();
    for ch in text.chars() {
        if out.push(ch).is_err() {
            break;
        }
    }
    out
}

#[derive(Clone, Debug)]
pub struct PageItem<A> {
    action: Option<A>,
    main_text: String<MAIN_TEXT_LEN>,
    aux_text: String<AUX_TEXT_LEN>,
    aux_background: Color,
    on_render: Option<A>,
}

impl<A> PageItem<A> {
    pub fn new(action: Option<A>, main_text: &str, aux_text: &str, on_render: Option<A>) -> Self {
        Self {
            action,
            main_text: truncated(main_text),
            aux_text: truncated(aux_text),
            aux_background: BACKGROUND_DEFAULT,
            on_render,
        }
    }

    pub fn action(&self) -> Option<&A> {
        self.action.as_ref()
    }

    pub fn on_render(&self) -> Option<&A> {
        self.on_render.as_ref()
    }

    pub fn main_text(&self) -> &str {
        &self.main_text
    }

    pub fn aux_text(&self) -> &str {
        &self.aux_text
    }

    pub fn aux_background(&self) -> Color {
        self.aux_background
    }

    pub fn set_aux_background(&mut self, color: Color) {
        self.aux_background = color;
    }

    /// Items without text take a slot in the list but draw nothing.
    pub fn is_blank(&self) -> bool {
        self.main_text.is_empty() && self.aux_text.is_empty()
    }
}

#[derive(Debug)]
pub struct Page<A> {
    title: String<TITLE_LEN>,
    items: Vec<PageItem<A>, MAX_ITEMS>,
    highlighted: Option<usize>,
    on_open: Option<LifecycleHook>,
    on_close: Option<LifecycleHook>,
    footer: String<FOOTER_LEN>,
}

impl<A> Page<A> {
    pub fn new(title: &str) -> Self {
        Self {
            title: truncated(title),
            items: Vec::new(),
            highlighted: None,
            on_open: None,
            on_close: None,
            footer: String::new(),
        }
    }

    pub fn with_open_hook(mut self, hook: LifecycleHook) -> Self {
        self.on_open = Some(hook);
        self
    }

    pub fn with_close_hook(mut self, hook: LifecycleHook) -> Self {
        self.on_close = Some(hook);
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn open_hook(&self) -> Option<LifecycleHook> {
        self.on_open
    }

    pub fn close_hook(&self) -> Option<LifecycleHook> {
        self.on_close
    }

    /// Appends an item and returns its index. The first item added to an
    /// empty page becomes highlighted.
    pub fn add_item(
        &mut self,
        action: Option<A>,
        main_text: &str,
        aux_text: &str,
        on_render: Option<A>,
    ) -> Result<usize, MenuError> {
        let index = self.items.len();
        self.items
            .push(PageItem::new(action, main_text, aux_text, on_render))
            .map_err(|_| MenuError::TooManyItems)?;
        if self.highlighted.is_none() {
            self.highlighted = Some(0);
        }
        Ok(index)
    }

    pub fn items(&self) -> &[PageItem<A>] {
        &self.items
    }

    pub fn items_mut(&mut self) -> impl Iterator<Item = &mut PageItem<A>> {
        self.items.iter_mut()
    }

    pub fn set_aux_background(&mut self, index: usize, color: Color) -> bool {
        match self.items.get_mut(index) {
            Some(item) => {
                item.set_aux_background(color);
                true
            }
            None => false,
        }
    }

    pub fn remove_all_items(&mut self) {
        self.items.clear();
        self.highlighted = None;
    }

    /// `None` only when the page has no items.
    pub fn highlighted_index(&self) -> Option<usize> {
        self.highlighted
    }

    pub fn highlighted_item(&self) -> Option<&PageItem<A>> {
        self.highlighted.and_then(|index| self.items.get(index))
    }

    /// Out-of-range indices are ignored.
    pub fn highlight(&mut self, index: usize) -> bool {
        if index < self.items.len() {
            self.highlighted = Some(index);
            true
        } else {
            false
        }
    }

    pub(crate) fn highlight_first(&mut self) {
        self.highlighted = if self.items.is_empty() { None } else { Some(0) };
    }

    /// Advances the highlight, wrapping from the last item to the first.
    pub fn highlight_next(&mut self) -> Option<usize> {
        let count = self.items.len();
        self.highlighted = match (self.highlighted, count) {
            (_, 0) => None,
            (Some(index), _) => Some((index + 1) % count),
            (None, _) => Some(0),
        };
        self.highlighted
    }

    pub fn footer(&self) -> &str {
        &self.footer
    }

    pub fn set_footer(&mut self, text: &str) {
        self.footer = truncated(text);
    }

    pub fn clear_footer(&mut self) {
        self.footer.clear();
    }

    /// First item index of the visible window.
    pub fn window_start(&self, max_visible: usize) -> usize {
        match self.highlighted {
            Some(index) if max_visible > 0 && index >= max_visible => index + 1 - max_visible,
            _ => 0,
        }
    }

    /// Draws the title bar, the visible item window and the footer starting
    /// at the current cursor. Leaves the cursor on the line after the last
    /// drawn row.
    pub fn render<C: Canvas + ?Sized>(&self, max_visible: usize, canvas: &mut C) {
        let width = canvas.width();
        let line = canvas.line_height();
        let glyph = canvas.char_width();

        if !self.title.is_empty() {
            let y = canvas.cursor().y;
            canvas.fill_rect(0, y, width, line, FOREGROUND_DEFAULT);
            canvas.set_text_color(BACKGROUND_DEFAULT, FOREGROUND_DEFAULT);
            canvas.print(&self.title);
            canvas.set_cursor(0, y + line);
        }

        let start = self.window_start(max_visible);
        for (index, item) in self.items.iter().enumerate().skip(start).take(max_visible) {
            if item.is_blank() {
                continue;
            }

            let y = canvas.cursor().y;
            let (foreground, background) = if self.highlighted == Some(index) {
                canvas.fill_rect(0, y, width, line, FOREGROUND_DEFAULT);
                (BACKGROUND_DEFAULT, FOREGROUND_DEFAULT)
            } else {
                (FOREGROUND_DEFAULT, BACKGROUND_DEFAULT)
            };
            canvas.set_text_color(foreground, background);
            canvas.print(&item.main_text);

            if !item.aux_text.is_empty() {
                let aux_width = glyph * item.aux_text.chars().count() as i32;
                let x = (width - aux_width).max(0);
                let aux_background = if item.aux_background == BACKGROUND_DEFAULT {
                    background
                } else {
                    item.aux_background
                };
                canvas.fill_rect(x, y, aux_width, line, aux_background);
                canvas.set_cursor(x, y);
                canvas.set_text_color(foreground, aux_background);
                canvas.print(&item.aux_text);
            }

            canvas.set_cursor(0, y + line);
        }

        canvas.set_text_color(FOREGROUND_DEFAULT, BACKGROUND_DEFAULT);
        if !self.footer.is_empty() {
            canvas.print(&self.footer);
            canvas.print("\n");
        }
    }
}
