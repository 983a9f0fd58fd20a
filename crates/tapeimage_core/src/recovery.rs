//! Descriptor validation and the single-anomaly recovery protocol.
//!
//! A damaged tape is still readable if it has exactly one framing anomaly: an
//! unknown type tag, or a back pointer that disagrees with the chain. The
//! first one is patched in memory and the session switches to
//! [`RecoveryState::Recovering`]. Any further anomaly means the tape is damaged
//! in more than one place and reading stops.

use crate::config::Config;
use crate::error::{TapeError, TapeResult};
use crate::header::{Header, HeaderType};
use crate::index::RecordIndex;
use tracing::warn;

/// Whether an anomaly has been patched in this session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecoveryState {
    /// No anomaly seen.
    #[default]
    Clean,
    /// One anomaly was patched; the next one is fatal.
    Recovering,
}

impl RecoveryState {
    /// Returns true once an anomaly has been patched.
    #[must_use]
    pub const fn is_recovering(self) -> bool {
        matches!(self, Self::Recovering)
    }

    fn tolerate(&mut self, config: &Config, anomaly: &str) -> TapeResult<()> {
        match *self {
            Self::Recovering => Err(TapeError::failed_recovery(format!(
                "{anomaly}. Error happened in recovery mode. File might be missing data"
            ))),
            Self::Clean if !config.allow_recovery => Err(TapeError::corrupt(anomaly)),
            Self::Clean => {
                warn!(
                    anomaly = %anomaly,
                    "tapeimage: patching anomaly in memory, entering recovery mode"
                );
                *self = Self::Recovering;
                Ok(())
            }
        }
    }
}

/// Checks a descriptor freshly read from disk against the chain in `index`,
/// patching it if the anomaly is tolerable.
///
/// This is the only place `state` changes.
pub(crate) fn validate_header(
    mut head: Header,
    index: &RecordIndex,
    config: &Config,
    state: &mut RecoveryState,
) -> TapeResult<Header> {
    let type_consistent = head.header_type().is_some();
    if !type_consistent {
        // Possibly a typo'd tag or an extension type. If it is the only
        // error, read it as a plain record.
        let anomaly = format!("tapeimage: unknown head.type (= {})", head.kind);
        state.tolerate(config, &anomaly)?;
        head.kind = HeaderType::Record.as_u32();
    }

    // Either pointer may be broken, so there is nothing to patch. This is
    // also what a tape larger than 4GB looks like once the offsets wrap.
    if head.next <= head.prev {
        let message = if type_consistent {
            format!(
                "head.next (= {}) <= head.prev (= {}). File size might be > 4GB",
                head.next, head.prev
            )
        } else {
            format!(
                "header type is not 0 or 1, head.next (= {}) <= head.prev (= {}). \
                 File might be missing data",
                head.next, head.prev
            )
        };
        return Err(TapeError::corrupt(message));
    }

    let headers = index.headers();
    if headers.len() >= 2 {
        // Assume the back pointer is what's wrong. Patched in memory only;
        // confirming it would need a back-to-front walk of the file.
        let back2 = headers[headers.len() - 2];
        if head.prev != back2.next {
            let anomaly = format!(
                "head.prev (= {}) != prev(prev(head)).next (= {})",
                head.prev, back2.next
            );
            state.tolerate(config, &anomaly)?;
            head.prev = back2.next;
        }
    } else if state.is_recovering() && !headers.is_empty() {
        // The second descriptor must point back at the first, which sits at
        // the base of the tape.
        let base = index.addr().base();
        if i64::from(head.prev) != base {
            return Err(TapeError::failed_recovery(format!(
                "second header prev (= {}) must be pointing to zero (= {base}). \
                 Error happened in recovery mode. File might be missing data",
                head.prev
            )));
        }
    }

    Ok(head)
}
