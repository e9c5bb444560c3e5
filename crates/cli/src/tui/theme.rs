//! Centralized TUI theme built on ratatui's Tailwind CSS palette.

use ratatui::style::Color;
use ratatui::style::palette::tailwind;

/// The application theme: all visual tokens in one place.
pub struct Theme {
    // ── Base ──
    /// Primary foreground/text color.
    pub fg: Color,
    /// Dimmed foreground, also used for the locked transcript.
    pub fg_dim: Color,
    /// Muted foreground for minimal-emphasis elements.
    pub fg_muted: Color,
    /// Default border color for panels and widgets.
    pub border: Color,
    /// Border color for the active/focused widget.
    pub border_active: Color,

    // ── Accent / Brand ──
    pub accent: Color,
    pub accent_bright: Color,

    // ── Semantic ──
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,

    // ── Chat roles ──
    /// Label color for user messages in chat.
    pub user_label: Color,
    /// Label color for assistant responses in chat.
    pub assistant_label: Color,

    // ── Status bar ──
    /// Spinner animation color in the status bar.
    pub status_spinner: Color,
    /// Hint/keybinding text color in the status bar.
    pub status_hint: Color,

    // ── Overlays (lock notice, settings, wizard) ──
    /// Background behind modal content.
    pub overlay_bg: Color,
    /// Border of the lock overlay.
    pub lock_border: Color,
    /// Selected-row marker in pick lists.
    pub selected_marker: Color,
    /// Logo on the boot and setup screens.
    pub logo: Color,
}

impl Theme {
    /// The default dark theme using Tailwind palette.
    pub const fn default_dark() -> Self {
        Self {
            fg: tailwind::SLATE.c100,
            fg_dim: tailwind::SLATE.c400,
            fg_muted: tailwind::SLATE.c500,
            border: tailwind::SLATE.c700,
            border_active: tailwind::EMERALD.c500,

            accent: tailwind::EMERALD.c500,
            accent_bright: tailwind::EMERALD.c400,

            success: tailwind::EMERALD.c500,
            warning: tailwind::AMBER.c500,
            error: tailwind::RED.c500,
            info: tailwind::SKY.c500,

            user_label: tailwind::CYAN.c400,
            assistant_label: tailwind::EMERALD.c400,

            status_spinner: tailwind::AMBER.c400,
            status_hint: tailwind::SLATE.c500,

            overlay_bg: tailwind::SLATE.c900,
            lock_border: tailwind::AMBER.c500,
            selected_marker: tailwind::EMERALD.c400,
            logo: tailwind::EMERALD.c400,
        }
    }
}

/// Global theme instance.
pub const THEME: Theme = Theme::default_dark();
