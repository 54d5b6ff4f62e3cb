use thiserror::Error;
use validator::ValidationErrors;

pub mod group;
pub mod task;
pub mod task_list;
pub mod user;

#[cfg(test)]
pub mod test_util;

/// The error taxonomy shared by every driving port. Routing code translates each
/// variant into an HTTP response; domain code never reasons about status codes.
#[derive(Error, Debug)]
pub enum Error {
    #[error("input was invalid: {0}")]
    Invalid(ValidationErrors),
    #[error("requested data does not exist")]
    DoesNotExist,
    #[error("{field} is already taken")]
    Conflict { field: &'static str },
    #[error("the referenced {entity} does not exist")]
    InvalidReference { entity: &'static str },
    #[error("failed to {action} due to a communication failure: {cause}")]
    RetrieveFailure {
        action: String,
        #[source]
        cause: anyhow::Error,
    },
}

impl Error {
    /// Produces a closure converting a driven port's error into a domain error
    /// annotated with the [action] being performed over the port.
    pub(crate) fn failed_to(action: &'static str) -> impl FnOnce(anyhow::Error) -> Error {
        move |cause| Error::RetrieveFailure {
            action: action.into(),
            cause,
        }
    }
}

impl From<ValidationErrors> for Error {
    fn from(value: ValidationErrors) -> Self {
        Self::Invalid(value)
    }
}
