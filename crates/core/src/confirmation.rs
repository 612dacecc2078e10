//! User-confirmation gate.

use std::fmt;

use tracing::{debug, info};
use unlock_storage::{KeyValueStore, SharedStore};

use crate::clock::Timestamp;
use crate::context::GateContext;
use crate::keys;
use crate::task::{Gate, GateProgress};
use crate::Result;

/// Host-supplied interaction.
///
/// Called by [`ConfirmationTask::interact`] with a fresh acknowledgement handle;
/// the host runs whatever UI it needs and calls [`Acknowledgement::confirm`] if
/// the user went through with it.
pub type ConfirmationAction = Box<dyn Fn(&mut Acknowledgement) + Send + Sync>;

/// Completion handle passed to a [`ConfirmationAction`].
#[derive(Debug, Default)]
pub struct Acknowledgement {
    confirmed: bool,
}

impl Acknowledgement {
    /// Report that the user confirmed.
    pub fn confirm(&mut self) {
        self.confirmed = true;
    }

    /// Whether [`Acknowledgement::confirm`] was called.
    pub fn is_confirmed(&self) -> bool {
        self.confirmed
    }
}

/// Completed once the user has acknowledged something.
pub struct ConfirmationTask {
    storage_key: String,
    answered: bool,
    action: Option<ConfirmationAction>,
    store: SharedStore,
}

impl ConfirmationTask {
    /// Create the task, reading the persisted answer.
    pub fn load(storage_key: impl Into<String>, ctx: &GateContext) -> Result<Self> {
        let storage_key = storage_key.into();
        let answered = ctx
            .store
            .get_bool(&keys::confirmation_answered(&storage_key), false)?;

        Ok(Self {
            storage_key,
            answered,
            action: None,
            store: ctx.store.clone(),
        })
    }

    /// Register the host interaction.
    pub fn with_action(
        mut self,
        action: impl Fn(&mut Acknowledgement) + Send + Sync + 'static,
    ) -> Self {
        self.action = Some(Box::new(action));
        self
    }

    /// Storage key the answer lives under.
    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    /// Whether the user has confirmed.
    pub fn is_answered(&self) -> bool {
        self.answered
    }

    /// Whether a host interaction is registered.
    pub fn has_action(&self) -> bool {
        self.action.is_some()
    }

    /// Set and persist the answer.
    pub fn record_answer(&mut self, answered: bool) -> Result<()> {
        self.answered = answered;
        self.store
            .put_bool(&keys::confirmation_answered(&self.storage_key), answered)?;
        debug!(storage_key = %self.storage_key, answered, "Recorded confirmation");
        Ok(())
    }

    /// Run the host interaction and record a confirmation if it reports one.
    ///
    /// Returns whether the user confirmed. Without a registered action nothing
    /// happens and `false` is returned.
    pub fn interact(&mut self) -> Result<bool> {
        let Some(action) = &self.action else {
            return Ok(false);
        };

        let mut ack = Acknowledgement::default();
        action(&mut ack);

        if ack.is_confirmed() {
            self.record_answer(true)?;
            info!(storage_key = %self.storage_key, "Task confirmed");
        }
        Ok(ack.is_confirmed())
    }
}

impl Gate for ConfirmationTask {
    fn is_completed(&self, _started_at: Timestamp) -> bool {
        self.answered
    }

    fn progress(&self, _started_at: Timestamp) -> GateProgress {
        if self.answered {
            GateProgress::Completed
        } else {
            GateProgress::AwaitingConfirmation
        }
    }

    fn reset(&mut self) -> Result<()> {
        self.record_answer(false)
    }
}

impl fmt::Debug for ConfirmationTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfirmationTask")
            .field("storage_key", &self.storage_key)
            .field("answered", &self.answered)
            .field("has_action", &self.action.is_some())
            .finish_non_exhaustive()
    }
}
