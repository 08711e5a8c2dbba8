use super::Record;

/// Receives records written by the training loop.
pub trait Recorder {
    /// Writes a record.
    fn write(&mut self, record: Record);

    /// Flushes written records, tagged with the environment step.
    fn flush(&mut self, _step: usize) {}
}
