use thiserror::Error;

use crate::model::{AnswerKeyError, LimitsError, VariantKeyError};
use crate::progress::ProgressError;
use crate::session::SessionError;
use crate::settings::SettingsError;

/// Any error the core can produce.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    AnswerKey(#[from] AnswerKeyError),
    #[error(transparent)]
    Limits(#[from] LimitsError),
    #[error(transparent)]
    VariantKey(#[from] VariantKeyError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
}
