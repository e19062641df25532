//! Paged menu model: pages, items, highlight and lifecycle hook bindings.
//!
//! `A` is the application's action token. Items carry an optional action
//! invoked on activation and an optional render token handed to the render
//! hooks before each draw.

mod page;


pub use page::{Page, PageItem};
pub(crate) use page::truncated;

use heapless::Vec;

use crate::worker::WorkKind;

pub const MAX_PAGES: usize = 8;
pub const MAX_ITEMS: usize = 16;
pub const MAIN_TEXT_LEN: usize = 15;
pub const AUX_TEXT_LEN: usize = 5;
pub const TITLE_LEN: usize = 16;
pub const FOOTER_LEN: usize = 32;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct PageId(u8);

impl PageId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    pub const fn raw(self) -> u8 {
        self.0
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MenuError {
    TooManyPages,
    TooManyItems,
    UnknownPage,
}

/// Work bound to a page transition, run by the navigator on the activity
/// that triggers the transition.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LifecycleHook {
    StartWorker(WorkKind),
    StopWorker,
    ClearItems,
}

/// Identity of what is on screen: the page and its highlighted row.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ViewKey {
    pub page: PageId,
    pub highlighted: Option<usize>,
}

impl ViewKey {
    const NO_HIGHLIGHT: u32 = 0xFFFF;

    /// Packs into one word so it can live in an atomic.
    pub const fn pack(self) -> u32 {
        let highlighted = match self.highlighted {
            Some(index) if index < Self::NO_HIGHLIGHT as usize => index as u32,
            _ => Self::NO_HIGHLIGHT,
        };
        ((self.page.0 as u32) << 16) | highlighted
    }

    pub const fn unpack(word: u32) -> Self {
        let highlighted = word & 0xFFFF;
        Self {
            page: PageId((word >> 16) as u8),
            highlighted: if highlighted == Self::NO_HIGHLIGHT {
                None
            } else {
                Some(highlighted as usize)
            },
        }
    }
}

#[derive(Debug)]
pub struct Menu<A> {
    pages: Vec<Page<A>, MAX_PAGES>,
    current: Option<PageId>,
}

impl<A> Menu<A> {
    pub const fn new() -> Self {
        Self {
            pages: Vec::new(),
            current: None,
        }
    }

    /// Registers a page. The first registered page becomes current.
    pub fn add_page(&mut self, page: Page<A>) -> Result<PageId, MenuError> {
        let id = PageId(self.pages.len() as u8);
        self.pages.push(page).map_err(|_| MenuError::TooManyPages)?;
        if self.current.is_none() {
            self.current = Some(id);
        }
        Ok(id)
    }

    pub fn num_pages(&self) -> usize {
        self.pages.len()
    }

    pub fn contains(&self, id: PageId) -> bool {
        id.index() < self.pages.len()
    }

    pub fn page(&self, id: PageId) -> Result<&Page<A>, MenuError> {
        self.pages.get(id.index()).ok_or(MenuError::UnknownPage)
    }

    pub fn page_mut(&mut self, id: PageId) -> Result<&mut Page<A>, MenuError> {
        self.pages.get_mut(id.index()).ok_or(MenuError::UnknownPage)
    }

    pub fn current_page_id(&self) -> Option<PageId> {
        self.current
    }

    pub fn current_page(&self) -> Option<&Page<A>> {
        self.current.and_then(|id| self.pages.get(id.index()))
    }

    pub fn current_page_mut(&mut self) -> Option<&mut Page<A>> {
        self.current.and_then(|id| self.pages.get_mut(id.index()))
    }

    /// Switches the current page and highlights its first item.
    ///
    /// Hooks are not run here; page transitions go through the navigator.
    pub fn set_current(&mut self, id: PageId) -> Result<(), MenuError> {
        let page = self.pages.get_mut(id.index()).ok_or(MenuError::UnknownPage)?;
        page.highlight_first();
        self.current = Some(id);
        Ok(())
    }

    pub fn view(&self) -> Option<ViewKey> {
        let page = self.current?;
        Some(ViewKey {
            page,
            highlighted: self.pages.get(page.index())?.highlighted_index(),
        })
    }
}

impl<A> Default for Menu<A> {
    fn default() -> Self {
        Self::new()
    }
}
