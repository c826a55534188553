//! Listing continuation rule
//!
//! A listing branch advances only when its page produced items. The
//! advertised total is the primary stop; the explicit next link and the
//! offset parameter are only consulted below it.

use crate::sites::ListingPage;
use crate::url::set_query_param;
use url::Url;

/// What follows a handled listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Continuation {
    Next(Url),
    Stop(StopReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The page yielded no items
    EmptyPage,
    /// The index reached the advertised total
    TotalReached,
    /// No next link and no way to compute one
    NoNextPage,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmptyPage => "empty page",
            Self::TotalReached => "total reached",
            Self::NoNextPage => "no next page",
        }
    }
}

/// Decides the continuation of a listing page
///
/// `inbound` is the item index the page was fetched with, `outbound` the
/// index after counting the page's items.
pub fn continuation(
    page_url: &Url,
    listing: &ListingPage,
    inbound: u64,
    outbound: u64,
    offset_param: Option<&str>,
) -> Continuation {
    if outbound <= inbound {
        return Continuation::Stop(StopReason::EmptyPage);
    }

    if let Some(total) = listing.total {
        if outbound >= total {
            return Continuation::Stop(StopReason::TotalReached);
        }
    }

    if let Some(next) = listing.next_page.as_ref().filter(|next| *next != page_url) {
        return Continuation::Next(next.clone());
    }

    match (listing.total, offset_param) {
        (Some(_), Some(param)) => {
            Continuation::Next(set_query_param(page_url, param, &outbound.to_string()))
        }
        _ => Continuation::Stop(StopReason::NoNextPage),
    }
}
