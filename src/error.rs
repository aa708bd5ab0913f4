//! Error taxonomy shared by every fallible operation in the crate.

/// Outcome of a driver operation.
///
/// Transport failures are reported as the unit-payload
/// [`Error::TransportFailure`] variant rather than carrying the
/// transport's own associated error type. Log the transport error at the
/// call site (via `defmt` or `Debug`) before it is discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// The underlying transport's `write_read` call returned an error.
    TransportFailure,
    /// An operation other than the lifecycle sequence itself was invoked
    /// before `init` completed successfully.
    NotInitialised,
    /// A required callable/collaborator was not supplied.
    MissingCallback,
    /// Address is not aligned to the operation's required granularity.
    InvalidAddress,
    /// Program length exceeds 256 bytes, or otherwise out of range.
    InvalidLength,
    /// The requested opcode is not valid for the current interface /
    /// dual-quad combination (e.g. a multi-lane opcode issued with
    /// dual/quad disabled in SPI mode, or a single-lane-only opcode
    /// issued in QSPI mode).
    UnsupportedInMode,
    /// `addr_mode = 4B` requested on a family below W25Q256, or an
    /// address-mode/family mismatch was otherwise detected.
    InvalidAddressMode,
    /// Probed JEDEC id did not match the configured family.
    IdMismatch,
    /// Busy-wait exceeded the operation's deadline.
    Timeout,
    /// Lifecycle step failures, one variant per distinguishable failure point.
    TransportInitFailed,
    ResetFailed,
    EnterQspiFailed,
    AddressModeFailed,
}

pub type Result<T> = core::result::Result<T, Error>;
