pub mod feed;
pub mod store;

pub use feed::{Coupon, FeedFilters, OfferFeed};
pub use store::{BatchSlot, DraftRequest, NewOffer, OfferStore};

/// Failures talking to a collaborator (feed, store, copy provider).
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Collaborator unavailable: {0}")]
    Unavailable(String),
    #[error("Collaborator rejected request ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("Unexpected collaborator payload: {0}")]
    Decode(String),
    #[error("Not configured: {0}")]
    NotConfigured(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
