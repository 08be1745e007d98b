/*---------------------------------------------------------------------------------------------
 *  Licensed under the Apache License, Version 2.0.
 *--------------------------------------------------------------------------------------------*/

use std::fmt::Display;
use std::io::ErrorKind;

/// well-defined errors the pipeline can surface. Tamper detection is not an
/// error; it is reported through the recovered channel as ordinary data.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ExitCode {
    AssertionFailure = 1,
    /// input channel buffer is not 256x256
    InvalidDimensions = 2,
    /// a (n, r, v) triple with r > n or v >= C(n, r); corrupted weight map or share
    InvalidWeight = 3,
    /// the tent map failed to cover every block position within its iteration bound
    InternalInconsistency = 4,
    BadBundleFormat = 5,
    ShortRead = 6,
    OsError = 7,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

/// standard error returned by the library
#[derive(Debug, Clone)]
pub struct SecureVisionError {
    exit_code: ExitCode,
    message: String,
}

impl SecureVisionError {
    pub fn new(exit_code: ExitCode, message: &str) -> SecureVisionError {
        SecureVisionError {
            exit_code,
            message: message.to_owned(),
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for SecureVisionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "error code: {0:?} {1}", self.exit_code, self.message)
    }
}

impl std::error::Error for SecureVisionError {}

impl From<std::io::Error> for SecureVisionError {
    fn from(e: std::io::Error) -> Self {
        let exit_code = match e.kind() {
            ErrorKind::UnexpectedEof => ExitCode::ShortRead,
            _ => ExitCode::OsError,
        };

        SecureVisionError {
            exit_code,
            message: e.to_string(),
        }
    }
}

/// maps whatever is inside an anyhow error back to the exit code, defaulting
/// to AssertionFailure for errors that did not originate here
pub fn exit_code_from_error(e: &anyhow::Error) -> ExitCode {
    match e.downcast_ref::<SecureVisionError>() {
        Some(sv) => sv.exit_code(),
        None => match e.downcast_ref::<std::io::Error>() {
            Some(io) => SecureVisionError::from(std::io::Error::from(io.kind())).exit_code(),
            None => ExitCode::AssertionFailure,
        },
    }
}
