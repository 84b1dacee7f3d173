// =============================================================================
// error.rs — THE TAXONOMY OF THINGS THAT GO WRONG
// =============================================================================
//
// Four ways an intake request can die, in increasing order of "that's our
// fault": the beacon forgot a field, the integration key is bogus, the
// Record Store refused the write, or we did something unexpected and would
// rather not discuss the details with the caller.
//
// Catalog failures are deliberately NOT in this list — a dead catalog
// degrades to an empty recommendation list and the request still succeeds.
// The analysis row is the deliverable; the recommendations are the garnish.
// =============================================================================

use thiserror::Error;

/// Everything that can terminate an intake request early.
#[derive(Debug, Error)]
pub enum IntakeError {
    /// The beacon is missing a required field. Rejected before any
    /// analysis runs and before anything touches a collaborator.
    #[error("missing required parameters: {0}")]
    MissingParameters(&'static str),

    /// Unknown integration key, inactive website, or a registry we
    /// couldn't reach in time. All three look identical to the caller,
    /// which is exactly how an auth failure should look.
    #[error("unauthorized integration key")]
    Unauthorized,

    /// The Record Store rejected the analysis write. The row IS the
    /// product, so this fails the whole request.
    #[error("failed to persist analysis record")]
    Store(#[source] anyhow::Error),

    /// Something blew up where nothing should blow up. Full detail goes
    /// to the logs; the caller gets this generic shrug.
    #[error("internal analysis error")]
    Internal(#[source] anyhow::Error),
}

impl IntakeError {
    /// The HTTP status the intake server maps this error to.
    pub fn status_code(&self) -> u16 {
        match self {
            IntakeError::MissingParameters(_) => 400,
            IntakeError::Unauthorized => 401,
            IntakeError::Store(_) | IntakeError::Internal(_) => 500,
        }
    }

    /// The caller-facing message. Never includes source-error detail —
    /// stack traces belong in tracing output, not in JSON bodies served
    /// to strangers' browsers.
    pub fn public_message(&self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(IntakeError::MissingParameters("content").status_code(), 400);
        assert_eq!(IntakeError::Unauthorized.status_code(), 401);
        assert_eq!(
            IntakeError::Store(anyhow::anyhow!("redis down")).status_code(),
            500
        );
        assert_eq!(
            IntakeError::Internal(anyhow::anyhow!("whoops")).status_code(),
            500
        );
    }

    #[test]
    fn test_internal_detail_stays_out_of_public_message() {
        let err = IntakeError::Internal(anyhow::anyhow!("secret gore"));
        assert!(!err.public_message().contains("secret gore"));
    }
}
