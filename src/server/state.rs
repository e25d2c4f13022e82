use crate::caption::ResolvedCaptionFont;
use crate::settings;

/// Shared per-process state. The font is resolved before the listener binds,
/// so every request measures against a loaded face.
pub(crate) struct ServerState {
    pub(crate) settings: settings::Settings,
    pub(crate) font: ResolvedCaptionFont,
}
