use std::time::Duration;

use tokio::time;

use crate::{error::LocateError, geo::Coordinate};

/// Why the positioning capability failed to produce a fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionError {
    /// The user declined to share their position.
    Denied,
    /// The capability exists but could not determine a position.
    Unavailable,
}

/// Abstraction over the platform's current-position capability.
///
/// `is_supported` must be consulted before `current_position`; an
/// unsupported source is never invoked.
pub trait PositionSource {
    fn is_supported(&self) -> bool;

    /// One position attempt. `high_accuracy` requests the most precise fix
    /// the capability offers.
    fn current_position(
        &self,
        high_accuracy: bool,
    ) -> impl std::future::Future<Output = Result<Coordinate, PositionError>>;
}

/// Obtain the user's coordinates: a single high-accuracy attempt, bounded by
/// `timeout`. No retry; retrying is a caller decision.
pub async fn resolve_location<S: PositionSource>(
    source: &S,
    timeout: Duration,
) -> Result<Coordinate, LocateError> {
    if !source.is_supported() {
        return Err(LocateError::Unsupported);
    }
    match time::timeout(timeout, source.current_position(true)).await {
        Ok(Ok(coordinate)) => Ok(coordinate),
        Ok(Err(PositionError::Denied)) => Err(LocateError::PermissionDenied),
        Ok(Err(PositionError::Unavailable)) => Err(LocateError::PositionUnavailable),
        Err(_) => Err(LocateError::Timeout),
    }
}
