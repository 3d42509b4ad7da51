//! Same-document navigation detection.
//!
//! Single-page hosts change the URL through the history API without a load
//! event. The embedder routes `pushState`/`replaceState` (and `popstate`)
//! through [`UrlChangeAdapter`], the one interception point, which reports
//! every effective URL change to the installed listener.

use std::cell::RefCell;
use std::rc::Rc;

/// The browser history API.
pub trait HistoryApi {
    fn current_url(&self) -> String;
    fn push_state(&self, url: &str);
    fn replace_state(&self, url: &str);
}

type UrlListener = Rc<dyn Fn(&str)>;

pub struct UrlChangeAdapter<H: HistoryApi> {
    history: H,
    listener: RefCell<Option<UrlListener>>,
    last_url: RefCell<String>,
}

impl<H: HistoryApi> std::fmt::Debug for UrlChangeAdapter<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlChangeAdapter")
            .field("installed", &self.is_installed())
            .field("last_url", &*self.last_url.borrow())
            .finish()
    }
}

impl<H: HistoryApi> UrlChangeAdapter<H> {
    pub fn new(history: H) -> Self {
        let last_url = history.current_url();
        Self {
            history,
            listener: RefCell::new(None),
            last_url: RefCell::new(last_url),
        }
    }

    /// Returns `false` when a listener is already installed; the existing one
    /// is kept.
    pub fn install(&self, listener: impl Fn(&str) + 'static) -> bool {
        let mut slot = self.listener.borrow_mut();
        if slot.is_some() {
            tracing::debug!("url change listener already installed");
            return false;
        }
        *slot = Some(Rc::new(listener));
        *self.last_url.borrow_mut() = self.history.current_url();
        true
    }

    pub fn uninstall(&self) -> bool {
        self.listener.borrow_mut().take().is_some()
    }

    pub fn is_installed(&self) -> bool {
        self.listener.borrow().is_some()
    }

    pub fn push_state(&self, url: &str) {
        self.history.push_state(url);
        self.check();
    }

    pub fn replace_state(&self, url: &str) {
        self.history.replace_state(url);
        self.check();
    }

    /// Back/forward navigation reported by the browser.
    pub fn pop_state(&self) {
        self.check();
    }

    fn check(&self) {
        let current = self.history.current_url();
        if *self.last_url.borrow() == current {
            return;
        }
        *self.last_url.borrow_mut() = current.clone();
        let listener = self.listener.borrow().clone();
        if let Some(listener) = listener {
            listener(&current);
        }
    }
}
