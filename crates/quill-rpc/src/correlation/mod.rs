//! Correlation of outstanding requests with their responses.
//!
//! The table maps each in-flight [`MessageId`] to the semantic kind of the
//! request that used it, so a response can be interpreted without keeping the
//! original request around. Entries live only between send and response.
//!
//! The remote side does not bound the number of in-flight requests, so the
//! table logs a warning each time its size climbs past a soft threshold.

use std::collections::HashMap;
use std::fmt;

use tracing::warn;

use crate::error::ProtocolError;
use crate::message::MessageId;

/// Log target for correlation bookkeeping.
const CORRELATION_TARGET: &str = "quill_rpc::correlation";

/// Pending-request count above which a warning is logged.
pub const DEFAULT_WARN_THRESHOLD: usize = 64;

/// What an outstanding request asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingRequestKind {
    /// `nvim_get_api_info`.
    GetApiInfo,
    /// `nvim_ui_attach`.
    AttachUi,
    /// `nvim_ui_try_resize`.
    TryResize,
    /// `nvim_input`.
    Input,
    /// `nvim_input_mouse`.
    InputMouse,
    /// `nvim_ui_set_focus`.
    SetFocus,
    /// `nvim_command`.
    Command,
    /// `nvim_get_option_value` for the named option.
    GetOptionValue {
        /// Option being queried.
        name: String,
    },
}

impl fmt::Display for PendingRequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GetApiInfo => f.write_str("get-api-info"),
            Self::AttachUi => f.write_str("attach-ui"),
            Self::TryResize => f.write_str("try-resize"),
            Self::Input => f.write_str("send-input"),
            Self::InputMouse => f.write_str("send-mouse-input"),
            Self::SetFocus => f.write_str("set-focus"),
            Self::Command => f.write_str("send-command"),
            Self::GetOptionValue { name } => write!(f, "get-option({name})"),
        }
    }
}

/// Table of requests awaiting a response.
#[derive(Debug, Clone)]
pub struct PendingRequests {
    pending: HashMap<MessageId, PendingRequestKind>,
    warn_threshold: usize,
    over_threshold: bool,
}

impl Default for PendingRequests {
    fn default() -> Self {
        Self::with_warn_threshold(DEFAULT_WARN_THRESHOLD)
    }
}

impl PendingRequests {
    /// Creates an empty table with the default warning threshold.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty table that warns once more than `threshold` requests
    /// are pending.
    #[must_use]
    pub fn with_warn_threshold(threshold: usize) -> Self {
        Self {
            pending: HashMap::new(),
            warn_threshold: threshold,
            over_threshold: false,
        }
    }

    /// Records that request `id` was sent for `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::DuplicateId`] when `id` is still pending.
    pub fn register(&mut self, id: MessageId, kind: PendingRequestKind) -> Result<(), ProtocolError> {
        if self.pending.contains_key(&id) {
            return Err(ProtocolError::DuplicateId { id });
        }
        self.pending.insert(id, kind);

        if self.pending.len() > self.warn_threshold && !self.over_threshold {
            self.over_threshold = true;
            warn!(
                target: CORRELATION_TARGET,
                pending = self.pending.len(),
                threshold = self.warn_threshold,
                "unusually many requests awaiting a response"
            );
        }
        Ok(())
    }

    /// Removes and returns the kind registered for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::UnknownResponseId`] when nothing is pending
    /// under `id`.
    pub fn resolve(&mut self, id: MessageId) -> Result<PendingRequestKind, ProtocolError> {
        let kind = self
            .pending
            .remove(&id)
            .ok_or(ProtocolError::UnknownResponseId { id })?;
        if self.pending.len() <= self.warn_threshold {
            self.over_threshold = false;
        }
        Ok(kind)
    }

    /// Returns `true` when `id` is awaiting a response.
    #[must_use]
    pub fn contains(&self, id: MessageId) -> bool {
        self.pending.contains_key(&id)
    }

    /// Number of requests awaiting a response.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns `true` when no request is awaiting a response.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Empties the table, returning the unanswered entries in id order.
    pub fn drain_unanswered(&mut self) -> Vec<(MessageId, PendingRequestKind)> {
        let mut unanswered: Vec<_> = self.pending.drain().collect();
        unanswered.sort_by_key(|(id, _)| *id);
        self.over_threshold = false;
        unanswered
    }
}

#[cfg(test)]
mod tests;
