use std::io;
use thiserror::Error;

/// Failure to obtain the platform device enumeration facilities. Terminal for
/// the hub's usefulness; surfaced by rejecting the request that needed them.
#[derive(Error, Debug)]
pub enum EnumerationError {
    #[error("device hot-plug watch unavailable: {0}")]
    WatchUnavailable(io::Error),

    #[error("device enumeration failed: {0}")]
    ListFailed(io::Error),
}

/// Failure to access one candidate device. Recovered locally: the device is
/// dropped and the hub keeps waiting for further arrivals.
#[derive(Error, Debug)]
pub enum DeviceAccessError {
    #[error("failed to open device: {0}")]
    Open(io::Error),

    #[error("failed to read device descriptor: {0}")]
    Descriptor(io::Error),
}
