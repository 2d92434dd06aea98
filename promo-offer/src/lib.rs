pub mod models;
pub mod error;
pub mod discount;
pub mod niche;
pub mod duplicate;
pub mod urgency;
pub mod priority;
pub mod channels;
pub mod qualifier;
pub mod copy;

pub use models::{CandidateOffer, Channel, ChannelSet, Niche, Priority, QualifiedOffer, RejectionReason, RejectionRecord, Urgency};
pub use error::QualificationError;
pub use discount::DiscountRule;
pub use duplicate::{DuplicateDetector, ExistingOffer, RecentOfferSnapshot};
pub use channels::ChannelRecommender;
pub use qualifier::{OfferQualifier, QualificationConfig, QualificationRun};
pub use copy::CopyGenerator;
