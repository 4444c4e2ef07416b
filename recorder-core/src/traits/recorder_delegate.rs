use crate::models::error::RecorderError;
use crate::models::export::ExportKind;
use crate::models::state::RecorderState;

/// Event delegate for recorder notifications.
///
/// `on_state_changed` runs on the thread that called `start`/`stop`; the
/// other methods run on the recorder's reply thread.
pub trait RecorderDelegate: Send + Sync {
    /// Called when recording starts or stops.
    fn on_state_changed(&self, state: RecorderState);

    /// Called when the worker reports a failure, including chunk contract
    /// violations that aborted an export.
    fn on_error(&self, error: &RecorderError);

    /// Called after an export reply has been handed to its requester.
    fn on_export_finished(&self, kind: ExportKind);
}
