//! Classification of HTTP status codes returned by the PurpleAir API.

use crate::error::{ApiError, Result};

/// Status codes treated as a successful request.
pub const SUCCESS_CODES: [u16; 2] = [200, 201];

/// Status codes the API documents as failures.
pub const ERROR_CODES: [u16; 8] = [400, 403, 404, 429, 500, 502, 503, 504];

/// `Ok(true)` for a success code, `Ok(false)` for a documented error code.
///
/// Any other code means the client and the API disagree about the protocol,
/// so it is surfaced as an error instead of a boolean.
pub fn verify_status_code(status: u16) -> Result<bool> {
    if SUCCESS_CODES.contains(&status) {
        Ok(true)
    } else if ERROR_CODES.contains(&status) {
        Ok(false)
    } else {
        Err(ApiError::UnknownStatus(status))
    }
}
