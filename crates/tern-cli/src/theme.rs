use ratatui::style::Color;
use ratatui::style::Modifier;
use ratatui::style::Style;
use tern_core::AgentStatus;
use tern_core::LogLevel;
use tern_core::StepStatus;
use tern_core::TextStyle;
use tern_core::UiTheme;
use tern_core::WorkflowStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiPalette {
    pub accent: Color,
    pub accent_alt: Color,
    pub success: Color,
    pub warning: Color,
    pub danger: Color,
    pub muted: Color,
    pub border: Color,
    pub selected_bg: Color,
}

pub fn palette_for(theme: UiTheme) -> UiPalette {
    match theme {
        UiTheme::Classic => UiPalette {
            accent: Color::Cyan,
            accent_alt: Color::Blue,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
            muted: Color::DarkGray,
            border: Color::Gray,
            selected_bg: Color::DarkGray,
        },
        UiTheme::Cyberpunk => UiPalette {
            accent: Color::Magenta,
            accent_alt: Color::Cyan,
            success: Color::LightGreen,
            warning: Color::LightYellow,
            danger: Color::LightRed,
            muted: Color::Gray,
            border: Color::Magenta,
            selected_bg: Color::Rgb(58, 0, 58),
        },
        UiTheme::NeonNoir => UiPalette {
            accent: Color::LightBlue,
            accent_alt: Color::LightCyan,
            success: Color::LightGreen,
            warning: Color::Yellow,
            danger: Color::LightRed,
            muted: Color::Gray,
            border: Color::LightBlue,
            selected_bg: Color::Rgb(18, 28, 42),
        },
        UiTheme::SolarFlare => UiPalette {
            accent: Color::LightYellow,
            accent_alt: Color::LightRed,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
            muted: Color::Gray,
            border: Color::Yellow,
            selected_bg: Color::Rgb(42, 28, 0),
        },
        UiTheme::ForestZen => UiPalette {
            accent: Color::LightGreen,
            accent_alt: Color::Green,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
            muted: Color::Gray,
            border: Color::LightGreen,
            selected_bg: Color::Rgb(8, 32, 10),
        },
    }
}

pub fn syntect_theme_name(theme: UiTheme) -> &'static str {
    match theme {
        UiTheme::Classic | UiTheme::SolarFlare | UiTheme::ForestZen => "base16-ocean.dark",
        UiTheme::Cyberpunk => "base16-eighties.dark",
        UiTheme::NeonNoir => "base16-mocha.dark",
    }
}

impl UiPalette {
    pub fn muted(&self) -> Style {
        Style::default().fg(self.muted)
    }

    pub fn accent(&self) -> Style {
        Style::default().fg(self.accent)
    }

    pub fn text(&self, style: TextStyle) -> Style {
        match style {
            TextStyle::Error => Style::default().fg(self.danger),
            TextStyle::Success => Style::default().fg(self.success),
            TextStyle::Warning => Style::default().fg(self.warning),
            TextStyle::Muted => Style::default().fg(self.muted),
            TextStyle::Bold => Style::default().add_modifier(Modifier::BOLD),
            TextStyle::Italic => Style::default().add_modifier(Modifier::ITALIC),
            TextStyle::Default => Style::default(),
        }
    }

    pub fn agent_status(&self, status: AgentStatus) -> Style {
        let color = match status {
            AgentStatus::Thinking | AgentStatus::Working => self.accent,
            AgentStatus::Waiting => self.warning,
            AgentStatus::Completed => self.success,
            AgentStatus::Failed => self.danger,
            AgentStatus::Idle | AgentStatus::Unknown => self.muted,
        };
        Style::default().fg(color)
    }

    pub fn workflow_status(&self, status: WorkflowStatus) -> Style {
        let color = match status {
            WorkflowStatus::Running => self.accent,
            WorkflowStatus::Paused => self.warning,
            WorkflowStatus::Completed => self.success,
            WorkflowStatus::Failed | WorkflowStatus::Cancelled => self.danger,
            WorkflowStatus::Pending | WorkflowStatus::Unknown => self.muted,
        };
        Style::default().fg(color)
    }

    pub fn step_status(&self, status: StepStatus) -> Style {
        let color = match status {
            StepStatus::Running => self.accent,
            StepStatus::Done => self.success,
            StepStatus::Failed => self.danger,
            StepStatus::Pending | StepStatus::Skipped | StepStatus::Unknown => self.muted,
        };
        Style::default().fg(color)
    }

    pub fn log_level(&self, level: LogLevel) -> Style {
        let color = match level {
            LogLevel::Error => self.danger,
            LogLevel::Warn => self.warning,
            LogLevel::Info => self.accent,
            LogLevel::Debug | LogLevel::Trace | LogLevel::Unknown => self.muted,
        };
        Style::default().fg(color)
    }
}

pub fn agent_glyph(status: AgentStatus) -> &'static str {
    match status {
        AgentStatus::Idle => "○",
        AgentStatus::Thinking | AgentStatus::Working => "◐",
        AgentStatus::Waiting => "◔",
        AgentStatus::Completed => "✓",
        AgentStatus::Failed => "✗",
        AgentStatus::Unknown => "?",
    }
}

pub fn step_glyph(status: StepStatus) -> &'static str {
    match status {
        StepStatus::Done => "✓",
        StepStatus::Running => "◐",
        StepStatus::Failed => "✗",
        StepStatus::Skipped => "–",
        StepStatus::Pending => "○",
        StepStatus::Unknown => "?",
    }
}
