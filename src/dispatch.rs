use crate::record::LogRecord;
use std::error::Error;

/// Destination boundary for batches taken out of a [`crate::buffer::LogBuffer`].
///
/// Implementations route a flushed batch to zero or more concrete
/// targets (file, database, console, ...). The buffer calls `dispatch`
/// synchronously, exactly once per flush, with the records in emission
/// order; a slow implementation stalls the logging caller, which is an
/// accepted property of this design.
pub trait Dispatcher: Send + Sync {
    /// Receive one flushed generation.
    ///
    /// **Parameters**
    /// - `records`: the exact batch taken from the buffer at swap time,
    ///   in emission order.
    /// - `final_flush`: `true` only for the last flush of the process
    ///   lifetime, so targets can close files, write trailers, etc.
    ///
    /// **Returns**
    /// - `Ok(())` if the batch was accepted.
    /// - `Err(..)` if a target failed. The buffer reports the error to
    ///   stderr and carries on; it never retries and never propagates
    ///   the failure to the logging caller.
    fn dispatch(
        &self,
        records: &[LogRecord],
        final_flush: bool,
    ) -> Result<(), Box<dyn Error + Send + Sync>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noop_dispatch::NoopDispatcher;
    use crate::record::{Level, Payload};
    use chrono::Utc;

    #[test]
    fn trait_object_is_usable() {
        let d: Box<dyn Dispatcher> = Box::new(NoopDispatcher);
        let record = LogRecord {
            timestamp: Utc::now(),
            level: Level::Info,
            category: "core".into(),
            payload: Payload::from("hello"),
            trace: Vec::new(),
        };
        assert!(d.dispatch(&[record], false).is_ok());
    }
}
