//! Ready-made failure handlers for `StatementRegistry::must_prepare`.

use crate::logging::sanitize_message;
use crate::stmts::RegistryError;
use log::error;

const MAX_LOGGED_ERROR_CHARS: usize = 200;

/// Formats the message every bundled handler reports.
pub fn failure_message(err: &RegistryError) -> String {
    format!("unable to prepare statement with error: {err}")
}

/// Logs the failure and lets the caller continue.
pub fn log_failure(err: &RegistryError) {
    error!(
        "event=stmt_must_prepare module=stmts status=error error_code={} error={}",
        err.code(),
        sanitize_message(&failure_message(err), MAX_LOGGED_ERROR_CHARS)
    );
}

/// Panics with the failure message.
pub fn panic_on_failure(err: &RegistryError) {
    panic!("{}", failure_message(err))
}

#[cfg(test)]
mod tests {
    use super::{failure_message, panic_on_failure};
    use crate::stmts::RegistryError;

    #[test]
    fn message_embeds_error() {
        let message = failure_message(&RegistryError::NothingToPrepare);
        assert_eq!(
            message,
            "unable to prepare statement with error: no statements to prepare"
        );
    }

    #[test]
    #[should_panic(expected = "no statements to prepare")]
    fn panic_handler_panics_with_message() {
        panic_on_failure(&RegistryError::NothingToPrepare);
    }
}
