use thiserror::Error;

use crate::engine::ExperienceState;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpotError {
    #[error("startup data incomplete: missing {0}")]
    IncompleteStartup(&'static str),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid sound target {key:?}: {reason}")]
    InvalidTarget { key: String, reason: String },

    #[error("no orientation sensor available")]
    NoOrientationSource,

    #[error("experience cannot {action} while {state:?}")]
    NotReady {
        action: &'static str,
        state: ExperienceState,
    },
}

pub type Result<T> = std::result::Result<T, SpotError>;
