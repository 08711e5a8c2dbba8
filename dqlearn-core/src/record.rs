//! Records of training metrics and the recorders receiving them.
//!
//! The [`Trainer`](crate::Trainer) writes a [`Record`] to a [`Recorder`] at every
//! evaluation and log tick. A record maps string keys to [`RecordValue`]s:
//!
//! ```rust
//! use dqlearn_core::record::{Record, RecordValue};
//!
//! let mut record = Record::from_scalar("loss", 0.25);
//! record.insert("eps", RecordValue::Scalar(0.1));
//! record.insert("td_err", RecordValue::Array1(vec![0.5, -0.5]));
//!
//! assert_eq!(record.get_scalar("eps").unwrap(), 0.1);
//! assert!(record.get_scalar("grad_norm").is_err());
//! ```
mod base;
mod buffered_recorder;
mod null_recorder;
mod recorder;

pub use base::{Record, RecordValue};
pub use buffered_recorder::BufferedRecorder;
pub use null_recorder::NullRecorder;
pub use recorder::Recorder;
