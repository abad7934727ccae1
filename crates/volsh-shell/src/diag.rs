//! Translation of volume service failures into diagnostics.
//!
//! Each failing volume service call site reports exactly once, at the point
//! of failure; the resulting [`Reported`] marker propagates upward so no
//! failure is ever reported twice.

use std::io::Write;

use volsh_volume::VolumeError;

use crate::transfer::TransferError;

/// Component tag prefixed to every diagnostic line.
const COMPONENT: &str = "volsh";

/// Marker for a failure already written to the error stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reported;

/// Result type returned by command handlers and the dispatcher.
pub type CmdResult = Result<(), Reported>;

/// Writes the fixed-format diagnostic for a failed volume service call.
///
/// Terminator codes are consumed by their loops and must never get here.
pub fn report(err: &mut dyn Write, operation: &str, failure: &VolumeError) -> Reported {
    debug_assert!(
        !failure.is_terminator(),
        "terminator {:?} reached the translator",
        failure
    );
    let _ = writeln!(
        err,
        "{}: {} failed for error message [{}]",
        COMPONENT, operation, failure
    );
    Reported
}

/// Reports a transfer failure, routing volume failures through the fixed
/// diagnostic format and stream failures through a plainer one.
pub fn report_transfer(err: &mut dyn Write, operation: &str, failure: &TransferError) -> Reported {
    match failure {
        TransferError::Volume(e) => report(err, operation, e),
        other => {
            let _ = writeln!(err, "{}: {} failed: {}", COMPONENT, operation, other);
            Reported
        }
    }
}

/// Writes a usage line for a malformed argument list.
pub fn usage(err: &mut dyn Write, grammar: &str) -> Reported {
    let _ = writeln!(err, "Usage: {}", grammar);
    Reported
}
