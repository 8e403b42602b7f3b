use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::text::Span;
use tern_core::ChatMessage;
use tern_core::ConfirmationDecision;
use tern_core::ConfirmationStatus;
use tern_core::MessageKind;
use tern_core::MessageStore;
use tern_core::StoreError;
use tracing::info;

use crate::blocks::flatten_regions;
use crate::blocks::render_blocks;
use crate::blocks::BlockContext;
use crate::theme::UiPalette;

pub const ROWS_PER_MESSAGE: usize = 3;

pub fn visible_capacity(budget_rows: usize, min_messages: usize) -> usize {
    (budget_rows / ROWS_PER_MESSAGE).max(min_messages).max(1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamWindow {
    pub start: usize,
    pub end: usize,
    pub len: usize,
}

impl StreamWindow {
    pub fn older(&self) -> usize {
        self.start
    }

    pub fn newer(&self) -> usize {
        self.len - self.end
    }

    pub fn range(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }
}

/// With auto-scroll on the window follows the transcript tail. Off, it stays
/// at the end recorded when it was frozen, or shows the head of the
/// transcript if it was never anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamViewport {
    auto_scroll: bool,
    frozen_end: Option<usize>,
}

impl Default for StreamViewport {
    fn default() -> Self {
        Self::new(true)
    }
}

impl StreamViewport {
    pub fn new(auto_scroll: bool) -> Self {
        Self {
            auto_scroll,
            frozen_end: None,
        }
    }

    pub fn auto_scroll(&self) -> bool {
        self.auto_scroll
    }

    pub fn set_auto_scroll(&mut self, enabled: bool) {
        self.auto_scroll = enabled;
    }

    pub fn sync(&mut self, len: usize) {
        let end = if self.auto_scroll {
            Some(len)
        } else {
            self.frozen_end.map(|end| end.min(len))
        };
        self.frozen_end = end.filter(|end| *end > 0);
    }

    pub fn window(&self, len: usize, capacity: usize) -> StreamWindow {
        let end = match (self.auto_scroll, self.frozen_end) {
            (true, _) => len,
            (false, Some(end)) => end.min(len),
            (false, None) => len.min(capacity),
        };
        StreamWindow {
            start: end.saturating_sub(capacity),
            end,
            len,
        }
    }
}

pub fn active_confirmation(messages: &[ChatMessage]) -> Option<&ChatMessage> {
    messages
        .iter()
        .rev()
        .find(|message| message.is_pending_confirmation())
}

pub fn respond<S>(store: &mut S, decision: ConfirmationDecision) -> Result<Option<String>, StoreError>
where
    S: MessageStore + ?Sized,
{
    let Some(id) = active_confirmation(store.messages()).and_then(|m| m.confirmation_id.clone())
    else {
        return Ok(None);
    };
    store.resolve_confirmation(&id, decision)?;
    info!(confirmation = %id, ?decision, "confirmation resolved");
    Ok(Some(id))
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

fn role_style(kind: MessageKind, palette: UiPalette) -> Style {
    let color = match kind {
        MessageKind::User => palette.accent,
        MessageKind::Assistant => palette.success,
        MessageKind::Tool => palette.accent_alt,
        MessageKind::System => palette.muted,
        MessageKind::Error => palette.danger,
        MessageKind::Confirmation => palette.warning,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

fn confirmation_footer(message: &ChatMessage, actionable: bool, palette: UiPalette) -> Line<'static> {
    match message.status {
        Some(ConfirmationStatus::Pending) if actionable => Line::from(vec![
            Span::styled(
                "[y] accept",
                Style::default()
                    .fg(palette.success)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(
                "[n] decline",
                Style::default()
                    .fg(palette.danger)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Some(ConfirmationStatus::Pending) => {
            Line::from(Span::styled("waiting", palette.muted()))
        }
        Some(ConfirmationStatus::Accepted) => {
            Line::from(Span::styled("✓ accepted", Style::default().fg(palette.success)))
        }
        Some(ConfirmationStatus::Declined) => {
            Line::from(Span::styled("✗ declined", Style::default().fg(palette.danger)))
        }
        None => Line::from(Span::styled("no status", palette.muted())),
    }
}

pub fn render_message(
    message: &ChatMessage,
    actionable: bool,
    ctx: &BlockContext,
) -> Vec<Line<'static>> {
    let mut out = vec![Line::from(Span::styled(
        message.kind.label().to_string(),
        role_style(message.kind, ctx.palette),
    ))];
    out.extend(
        flatten_regions(render_blocks(&message.blocks, ctx))
            .into_iter()
            .map(|line| {
                let mut spans = vec![Span::raw("  ")];
                spans.extend(line.spans);
                Line::from(spans)
            }),
    );
    if message.kind == MessageKind::Confirmation {
        let mut footer = confirmation_footer(message, actionable, ctx.palette);
        footer.spans.insert(0, Span::raw("  "));
        out.push(footer);
    }
    out
}

pub fn render_stream(
    messages: &[ChatMessage],
    window: StreamWindow,
    ctx: &BlockContext,
) -> Vec<Line<'static>> {
    let active_id = active_confirmation(messages).map(|message| message.id.as_str());
    let mut out = Vec::new();
    if window.older() > 0 {
        out.push(Line::from(Span::styled(
            format!("↑ {}", plural(window.older(), "older message")),
            ctx.palette.muted(),
        )));
    }
    let visible = messages.get(window.range()).unwrap_or_default();
    for (index, message) in visible.iter().enumerate() {
        if index > 0 {
            out.push(Line::default());
        }
        let actionable = Some(message.id.as_str()) == active_id;
        out.extend(render_message(message, actionable, ctx));
    }
    if window.newer() > 0 {
        out.push(Line::from(Span::styled(
            format!("↓ {}", plural(window.newer(), "newer message")),
            ctx.palette.muted(),
        )));
    }
    out
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tern_core::ContentBlock;
    use tern_core::Transcript;
    use tern_core::UiTheme;

    use super::*;
    use crate::blocks::line_text;

    fn transcript(count: usize) -> Vec<ChatMessage> {
        (0..count)
            .map(|n| {
                ChatMessage::new(
                    format!("m{n}"),
                    MessageKind::Assistant,
                    vec![ContentBlock::text(format!("message {n}"))],
                )
            })
            .collect()
    }

    fn rendered(messages: &[ChatMessage], window: StreamWindow) -> Vec<String> {
        render_stream(messages, window, &BlockContext::new(UiTheme::Classic))
            .iter()
            .map(line_text)
            .collect()
    }

    #[test]
    fn window_is_suffix_with_older_indicator() {
        let messages = transcript(25);
        let viewport = StreamViewport::new(true);
        let window = viewport.window(messages.len(), 20);
        assert_eq!(window.range(), 5..25);

        let lines = rendered(&messages, window);
        assert_eq!(lines[0], "↑ 5 older messages");
        let bodies: Vec<&String> = lines.iter().filter(|l| l.contains("message ")).collect();
        assert_eq!(bodies.len(), 20);
        assert_eq!(bodies[0], "  message 5");
        assert_eq!(bodies[19], "  message 24");
    }

    #[test]
    fn no_indicator_when_everything_fits() {
        let messages = transcript(3);
        let window = StreamViewport::default().window(messages.len(), 20);
        let lines = rendered(&messages, window);
        assert!(lines.iter().all(|line| !line.contains("older")));
    }

    #[test]
    fn frozen_viewport_holds_its_end() {
        let mut viewport = StreamViewport::new(true);
        viewport.sync(10);
        viewport.set_auto_scroll(false);
        viewport.sync(14);

        let window = viewport.window(14, 4);
        assert_eq!(window.range(), 6..10);
        assert_eq!(window.newer(), 4);

        let lines = rendered(&transcript(14), window);
        assert_eq!(lines.last().map(String::as_str), Some("↓ 4 newer messages"));

        viewport.set_auto_scroll(true);
        viewport.sync(15);
        assert_eq!(viewport.window(15, 4).range(), 11..15);
    }

    #[test]
    fn starting_frozen_shows_the_head_and_holds_it() {
        let mut viewport = StreamViewport::new(false);
        for len in 1..=5 {
            viewport.sync(len);
        }
        assert_eq!(viewport.window(5, 20).range(), 0..5);

        viewport.sync(30);
        let window = viewport.window(30, 20);
        assert_eq!(window.range(), 0..20);
        assert_eq!(window.newer(), 10);

        viewport.sync(31);
        assert_eq!(viewport.window(31, 20).range(), 0..20);

        let lines = rendered(&transcript(5), viewport.window(5, 20));
        assert_eq!(lines[0], "Assistant");
        assert!(lines.iter().all(|line| !line.contains("newer")));
    }

    #[test]
    fn frozen_end_clamps_when_transcript_shrinks() {
        let mut viewport = StreamViewport::new(true);
        viewport.sync(8);
        viewport.set_auto_scroll(false);
        viewport.sync(2);
        assert_eq!(viewport.window(2, 3).range(), 0..2);
    }

    #[test]
    fn freezing_an_empty_transcript_does_not_hide_later_messages() {
        let mut viewport = StreamViewport::new(true);
        viewport.sync(0);
        viewport.set_auto_scroll(false);
        viewport.sync(0);
        viewport.sync(4);
        assert_eq!(viewport.window(4, 10).range(), 0..4);
    }

    #[test]
    fn capacity_is_clamped_to_minimum() {
        assert_eq!(visible_capacity(60, 3), 20);
        assert_eq!(visible_capacity(4, 3), 3);
        assert_eq!(visible_capacity(0, 0), 1);
    }

    #[test]
    fn only_latest_pending_confirmation_is_actionable() {
        let mut messages = transcript(2);
        messages.insert(
            1,
            ChatMessage::confirmation("c-old", "first", vec![ContentBlock::text("apply?")]),
        );
        messages.push(ChatMessage::confirmation(
            "c-new",
            "second",
            vec![ContentBlock::text("retry?")],
        ));

        let window = StreamViewport::default().window(messages.len(), 10);
        let lines = rendered(&messages, window);
        let prompts: Vec<usize> = lines
            .iter()
            .enumerate()
            .filter(|(_, line)| line.contains("[y] accept"))
            .map(|(index, _)| index)
            .collect();
        assert_eq!(prompts.len(), 1);
        assert!(lines[prompts[0] - 1].contains("retry?"));
        assert!(lines.iter().any(|line| line == "  waiting"));
    }

    #[test]
    fn respond_resolves_latest_then_exposes_previous() {
        let mut store = Transcript::new();
        store.push(ChatMessage::confirmation("m1", "first", Vec::new()));
        store.push(ChatMessage::confirmation("m2", "second", Vec::new()));

        assert_eq!(
            respond(&mut store, ConfirmationDecision::Decline),
            Ok(Some("second".to_string()))
        );
        assert_eq!(
            active_confirmation(store.messages()).map(|m| m.id.as_str()),
            Some("m1")
        );
        assert_eq!(
            respond(&mut store, ConfirmationDecision::Accept),
            Ok(Some("first".to_string()))
        );
        assert_eq!(respond(&mut store, ConfirmationDecision::Accept), Ok(None));

        let statuses: Vec<_> = store.messages().iter().map(|m| m.status).collect();
        assert_eq!(
            statuses,
            vec![
                Some(ConfirmationStatus::Accepted),
                Some(ConfirmationStatus::Declined)
            ]
        );
    }
}
