//! Filter construction errors

use thiserror::Error;

/// Error returned when a filter is configured inconsistently
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterConfigError {
    /// Neither a page nor a complete controller/action pair was given
    #[error("Either RedirectToPage or both RedirectToController and RedirectToAction must be set.")]
    MissingRedirectTarget,
}
