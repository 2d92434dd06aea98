use crate::models::RejectionReason;

/// Why a candidate could not be qualified.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QualificationError {
    #[error("Invalid title")]
    InvalidTitle,

    #[error("Invalid price pair")]
    InvalidPrice,

    #[error("Suspicious discount: {0}%")]
    SuspiciousDiscount(u8),

    #[error("Discount below threshold: {0}%")]
    BelowThreshold(u8),

    #[error("Duplicate of a recent offer")]
    Duplicate,
}

impl QualificationError {
    pub fn reason(&self) -> RejectionReason {
        match self {
            QualificationError::InvalidTitle => RejectionReason::InvalidTitle,
            QualificationError::InvalidPrice => RejectionReason::InvalidPrice,
            QualificationError::SuspiciousDiscount(_) => RejectionReason::SuspiciousDiscount,
            QualificationError::BelowThreshold(_) => RejectionReason::BelowThreshold,
            QualificationError::Duplicate => RejectionReason::Duplicate,
        }
    }

    /// The computed discount, for rejections that got far enough to have one.
    pub fn discount(&self) -> Option<u8> {
        match self {
            QualificationError::SuspiciousDiscount(d) | QualificationError::BelowThreshold(d) => Some(*d),
            _ => None,
        }
    }
}
