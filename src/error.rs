use thiserror::Error;

/// Failures raised when the table's internal bookkeeping is inconsistent.
///
/// None of these are expected in normal operation: a missing key is reported
/// through `Option`, never through this type. Seeing one of these means the
/// table itself is broken.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A freshly inserted entry could not be located in its bucket after the
    /// table grew.
    #[error("entry lost after growth: bucket {bucket} of {capacity} does not hold it")]
    EntryLost {
        /// The bucket the entry should have been relocated to.
        bucket: usize,
        /// The table capacity after growth.
        capacity: usize,
    },
}
