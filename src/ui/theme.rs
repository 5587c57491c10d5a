use owo_colors::{OwoColorize, Style};
use std::sync::OnceLock;

static THEME: OnceLock<Theme> = OnceLock::new();

/// Terminal styles for CLI output
#[derive(Debug, Clone)]
pub struct Theme {
    pub header: Style,
    pub accent: Style,
    pub success: Style,
    pub error: Style,
    pub warn: Style,
    pub label: Style,
    pub muted: Style,
}

impl Theme {
    /// Colored only for an interactive stdout outside quiet mode
    pub fn for_terminal(is_term: bool, quiet: bool) -> Self {
        if is_term && !quiet {
            Self::colored()
        } else {
            Self::plain()
        }
    }

    pub fn colored() -> Self {
        Self {
            header: Style::new().cyan().bold(),
            accent: Style::new().blue().bold().underline(),
            success: Style::new().green().bold(),
            error: Style::new().red().bold(),
            warn: Style::new().yellow().bold(),
            label: Style::new().white().dimmed(),
            muted: Style::new().bright_black(),
        }
    }

    pub fn plain() -> Self {
        Self {
            header: Style::new(),
            accent: Style::new(),
            success: Style::new(),
            error: Style::new(),
            warn: Style::new(),
            label: Style::new(),
            muted: Style::new(),
        }
    }

    pub fn paint(&self, text: &str, style: &Style) -> String {
        text.style(style.clone()).to_string()
    }
}

pub fn theme() -> &'static Theme {
    THEME.get_or_init(|| {
        Theme::for_terminal(console::Term::stdout().is_term(), crate::output::is_quiet())
    })
}
