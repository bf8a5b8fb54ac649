//! View state machines for the blog pages.
//!
//! Both views move `Loading -> Ready(Live | Fallback)`. Each fetch is tied to
//! a `RequestToken`; an outcome is applied only if its token is still the
//! latest one issued, so a slow response for an old query cannot overwrite
//! the state of a newer one.
use crate::content::Fetched;

pub mod detail;
pub mod list;

pub use detail::{DetailSnapshot, DetailView};
pub use list::{ListSnapshot, ListView};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Issues strictly increasing tokens and remembers the latest.
#[derive(Debug, Default)]
pub struct TokenIssuer {
    latest: u64,
}

impl TokenIssuer {
    pub fn issue(&mut self) -> RequestToken {
        self.latest += 1;
        RequestToken(self.latest)
    }

    pub fn is_latest(&self, token: RequestToken) -> bool {
        token.0 == self.latest
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState<T> {
    Loading,
    Ready(Fetched<T>),
}

impl<T> ViewState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading)
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            ViewState::Loading => None,
            ViewState::Ready(fetched) => Some(fetched.get()),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, ViewState::Ready(f) if f.is_fallback())
    }
}
