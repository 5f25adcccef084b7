use std::path::PathBuf;

/// sent to the audio thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioCommand {
    /// stop whatever is playing and loop this file until told otherwise
    Play(PathBuf),
    Stop,
}

/// sent from the poller to the ui
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEvent {
    ShowPopup,
}
