//! Platform-specific configuration

use crossterm::event::KeyModifiers;

/// Platform-appropriate modifier for the export/save shortcut
/// - macOS: SUPER (Cmd key)
/// - Linux/Windows: CONTROL (Ctrl key)
#[cfg(target_os = "macos")]
pub const SHORTCUT_MODIFIER: KeyModifiers = KeyModifiers::SUPER;

#[cfg(not(target_os = "macos"))]
pub const SHORTCUT_MODIFIER: KeyModifiers = KeyModifiers::CONTROL;

/// Export shortcut display for form help text
/// Ctrl+S works on all platforms
pub const EXPORT_SHORTCUT: &str = "Ctrl+S";

/// Reset shortcut display
/// - macOS: "Cmd+R"
/// - Linux/Windows: "Ctrl+R"
#[cfg(target_os = "macos")]
pub const RESET_SHORTCUT: &str = "Cmd+R";

#[cfg(not(target_os = "macos"))]
pub const RESET_SHORTCUT: &str = "Ctrl+R";
