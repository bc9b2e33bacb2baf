use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("unknown payoff archetype '{0}' (expected one of: User, HawkDove, HawkDoveGrid, StagHunt, PrisonersDilemma)")]
    UnknownArchetype(String),

    #[error("unknown coupling effect '{0}' (expected one of: Fight, FightSplit, FightRand, StagHunt, FSH, None)")]
    UnknownCouplingEffect(String),

    #[error("invalid payoff: {0}")]
    InvalidPayoff(String),

    #[error("sweep axis '{axis}' must not be empty")]
    EmptyAxis { axis: &'static str },

    #[error("sweep axis '{axis}' has invalid value {value}: {reason}")]
    InvalidAxis {
        axis: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("record {key} is missing its artifact {}", path.display())]
    MissingArtifact { key: String, path: PathBuf },

    #[error("malformed record in {} line {line}: {reason}", path.display())]
    MalformedRecord {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("sweep directory is locked by another run: {}", path.display())]
    SweepLocked { path: PathBuf },

    #[error("i/o error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SetupError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(path: impl Into<PathBuf>, line: usize, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            path: path.into(),
            line,
            reason: reason.into(),
        }
    }
}

pub type SetupResult<T> = Result<T, SetupError>;
