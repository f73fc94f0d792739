//! Infrastructure error handling

pub mod conversions;

pub use conversions::InfraError;

use questlog_domain::QuestlogError;

/// Convert any infrastructure error into the domain error.
pub(crate) fn to_domain<E>(err: E) -> QuestlogError
where
    InfraError: From<E>,
{
    QuestlogError::from(InfraError::from(err))
}
