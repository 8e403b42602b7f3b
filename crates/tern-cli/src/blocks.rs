use std::sync::OnceLock;

use ratatui::style::Color;
use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::text::Span;
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxReference;
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;
use tern_core::sanitize_text;
use tern_core::ActionListBlock;
use tern_core::CodeBlock;
use tern_core::CommandKind;
use tern_core::ContentBlock;
use tern_core::DiffBlock;
use tern_core::DividerBlock;
use tern_core::DividerStyle;
use tern_core::ListBlock;
use tern_core::ResultsBlock;
use tern_core::TableBlock;
use tern_core::TextBlock;
use tern_core::TodoListBlock;
use tern_core::TodoStatus;
use tern_core::UiTheme;

use crate::theme::palette_for;
use crate::theme::syntect_theme_name;
use crate::theme::UiPalette;

pub const RESULT_OUTPUT_PREVIEW_LINES: usize = 3;
const BLOCK_GAP: usize = 1;

static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
static THEME_SET: OnceLock<ThemeSet> = OnceLock::new();

fn get_syntax_set() -> &'static SyntaxSet {
    SYNTAX_SET.get_or_init(SyntaxSet::load_defaults_newlines)
}

fn get_theme_set() -> &'static ThemeSet {
    THEME_SET.get_or_init(ThemeSet::load_defaults)
}

#[derive(Debug, Clone, Copy)]
pub struct BlockContext {
    pub palette: UiPalette,
    pub theme: UiTheme,
    pub show_commands: bool,
    pub show_parameters: bool,
    pub width: u16,
    pub highlight: bool,
}

impl BlockContext {
    pub fn new(theme: UiTheme) -> Self {
        Self {
            palette: palette_for(theme),
            theme,
            show_commands: true,
            show_parameters: false,
            width: 40,
            highlight: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedBlock {
    pub lines: Vec<Line<'static>>,
    pub gap_after: usize,
}

pub fn render_blocks(blocks: &[ContentBlock], ctx: &BlockContext) -> Vec<RenderedBlock> {
    let last = blocks.len().saturating_sub(1);
    blocks
        .iter()
        .enumerate()
        .map(|(index, block)| RenderedBlock {
            lines: render_block(block, ctx),
            gap_after: if index == last { 0 } else { BLOCK_GAP },
        })
        .collect()
}

pub fn flatten_regions(regions: Vec<RenderedBlock>) -> Vec<Line<'static>> {
    let mut out = Vec::new();
    for region in regions {
        out.extend(region.lines);
        out.extend(std::iter::repeat_with(Line::default).take(region.gap_after));
    }
    out
}

pub fn render_block(block: &ContentBlock, ctx: &BlockContext) -> Vec<Line<'static>> {
    match block {
        ContentBlock::Text(text) => render_text(text, ctx),
        ContentBlock::TodoList(list) => render_todo_list(list, ctx),
        ContentBlock::ActionList(list) => render_action_list(list, ctx),
        ContentBlock::Results(results) => render_results(results, ctx),
        ContentBlock::Diff(diff) => render_diff(diff, ctx),
        ContentBlock::Code(code) => render_code(code, ctx),
        ContentBlock::Divider(divider) => render_divider(divider, ctx),
        ContentBlock::List(list) => render_list(list, ctx),
        ContentBlock::Table(table) => render_table(table, ctx),
        ContentBlock::Unsupported { kind } => vec![Line::from(Span::styled(
            format!("[unsupported block: {kind}]"),
            Style::default()
                .fg(ctx.palette.warning)
                .add_modifier(Modifier::ITALIC),
        ))],
    }
}

fn render_text(block: &TextBlock, ctx: &BlockContext) -> Vec<Line<'static>> {
    let style = ctx.palette.text(block.style);
    let mut lines: Vec<Line<'static>> = block
        .content
        .lines()
        .map(|line| Line::from(Span::styled(line.to_string(), style)))
        .collect();
    if lines.is_empty() {
        lines.push(Line::default());
    }
    if let Some(icon) = block.icon.as_deref().filter(|icon| !icon.is_empty()) {
        lines[0]
            .spans
            .insert(0, Span::styled(format!("{icon} "), style));
    }
    lines
}

pub fn todo_glyph(status: TodoStatus) -> &'static str {
    match status {
        TodoStatus::Completed => "✓",
        TodoStatus::InProgress => "◐",
        TodoStatus::Pending => "○",
    }
}

fn render_todo_list(block: &TodoListBlock, ctx: &BlockContext) -> Vec<Line<'static>> {
    let palette = ctx.palette;
    let mut out = Vec::new();
    for (index, item) in block.items.iter().enumerate() {
        let glyph_style = match item.status {
            TodoStatus::Completed => Style::default().fg(palette.success),
            TodoStatus::InProgress => Style::default().fg(palette.accent),
            TodoStatus::Pending => palette.muted(),
        };
        let text_style = if block.current_index == Some(index) {
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        out.push(Line::from(vec![
            Span::styled(format!("{} ", todo_glyph(item.status)), glyph_style),
            Span::styled(item.description.clone(), text_style),
        ]));
        if let Some(result) = item.result.as_deref() {
            out.push(Line::from(Span::styled(
                format!("    {result}"),
                palette.muted().add_modifier(Modifier::DIM),
            )));
        }
    }
    out
}

fn render_action_list(block: &ActionListBlock, ctx: &BlockContext) -> Vec<Line<'static>> {
    let palette = ctx.palette;
    let show_commands = block.show_commands.unwrap_or(ctx.show_commands);
    let show_parameters = block.show_parameters.unwrap_or(ctx.show_parameters);
    let mut out = Vec::new();
    for (index, action) in block.actions.iter().enumerate() {
        out.push(Line::from(vec![
            Span::styled(format!("{}. ", index + 1), palette.accent()),
            Span::raw(action.description.clone()),
        ]));
        if show_commands {
            let reveal = match (action.command_kind(), action.target()) {
                (CommandKind::Shell, Some(command)) => format!("   $ {command}"),
                (CommandKind::File, Some(path)) => format!("   → {path}"),
                _ => format!("   ⚙ {}", action.command),
            };
            out.push(Line::from(Span::styled(
                reveal,
                Style::default().fg(palette.accent_alt),
            )));
        }
        if show_parameters && !action.parameters.is_null() {
            out.push(Line::from(Span::styled(
                format!("   {}", action.parameters),
                palette.muted(),
            )));
        }
    }
    out
}

fn render_results(block: &ResultsBlock, ctx: &BlockContext) -> Vec<Line<'static>> {
    let palette = ctx.palette;
    let mut out = Vec::new();
    for result in &block.results {
        let (glyph, color) = if result.success {
            ("✓", palette.success)
        } else {
            ("✗", palette.danger)
        };
        let glyph = Span::styled(format!("{glyph} "), Style::default().fg(color));
        let output = result.output.as_deref().filter(|text| !text.is_empty());
        let error = result.error.as_deref().filter(|text| !text.is_empty());

        if output.is_none() && error.is_none() {
            out.push(Line::from(vec![glyph, Span::raw(result.message.clone())]));
            continue;
        }

        let mut glyph = Some(glyph);
        if let Some(output) = output {
            let lines: Vec<&str> = output.lines().collect();
            for line in lines.iter().take(RESULT_OUTPUT_PREVIEW_LINES) {
                let lead = glyph.take().unwrap_or_else(|| Span::raw("  "));
                out.push(Line::from(vec![lead, Span::raw((*line).to_string())]));
            }
            let hidden = lines.len().saturating_sub(RESULT_OUTPUT_PREVIEW_LINES);
            if hidden > 0 {
                let noun = if hidden == 1 { "line" } else { "lines" };
                out.push(Line::from(Span::styled(
                    format!("  … {hidden} more {noun}"),
                    palette.muted(),
                )));
            }
        }
        if let Some(error) = error {
            let lead = glyph.take().unwrap_or_else(|| Span::raw(""));
            out.push(Line::from(vec![
                Span::raw("  "),
                lead,
                Span::styled(sanitize_text(error), Style::default().fg(palette.danger)),
            ]));
        }
    }
    out
}

fn render_diff(block: &DiffBlock, ctx: &BlockContext) -> Vec<Line<'static>> {
    let palette = ctx.palette;
    let mut out = Vec::new();
    if let Some(path) = block.file_path.as_deref() {
        out.push(Line::from(Span::styled(
            path.to_string(),
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD),
        )));
    }
    out.extend(block.deletions.iter().map(|line| {
        Line::from(Span::styled(
            format!("- {line}"),
            Style::default().fg(palette.danger),
        ))
    }));
    out.extend(block.additions.iter().map(|line| {
        Line::from(Span::styled(
            format!("+ {line}"),
            Style::default().fg(palette.success),
        ))
    }));
    out
}

fn find_syntax<'a>(set: &'a SyntaxSet, block: &CodeBlock) -> Option<&'a SyntaxReference> {
    block
        .language
        .as_deref()
        .and_then(|language| set.find_syntax_by_token(language))
        .or_else(|| {
            block
                .filename
                .as_deref()
                .and_then(|name| name.rsplit('.').next())
                .and_then(|ext| set.find_syntax_by_extension(ext))
        })
}

fn highlight_code(block: &CodeBlock, theme: UiTheme) -> Option<Vec<Line<'static>>> {
    let syntax_set = get_syntax_set();
    let syntax = find_syntax(syntax_set, block)?;
    let theme = get_theme_set().themes.get(syntect_theme_name(theme))?;
    let mut highlighter = HighlightLines::new(syntax, theme);
    let mut out = Vec::new();
    for line in LinesWithEndings::from(&block.content) {
        let ranges = highlighter.highlight_line(line, syntax_set).ok()?;
        let mut spans = vec![Span::raw("  ")];
        spans.extend(ranges.into_iter().filter_map(|(style, text)| {
            let text = text.trim_end_matches(['\n', '\r']);
            if text.is_empty() {
                return None;
            }
            let fg = style.foreground;
            Some(Span::styled(
                text.to_string(),
                Style::default().fg(Color::Rgb(fg.r, fg.g, fg.b)),
            ))
        }));
        out.push(Line::from(spans));
    }
    Some(out)
}

fn render_code(block: &CodeBlock, ctx: &BlockContext) -> Vec<Line<'static>> {
    let palette = ctx.palette;
    let header = match (block.filename.as_deref(), block.language.as_deref()) {
        (Some(name), Some(language)) => format!("{name} ({language})"),
        (Some(name), None) => name.to_string(),
        (None, Some(language)) => language.to_string(),
        (None, None) => "code".to_string(),
    };
    let mut out = vec![Line::from(Span::styled(header, palette.muted()))];

    let highlighted = if ctx.highlight {
        highlight_code(block, ctx.theme)
    } else {
        None
    };
    match highlighted {
        Some(lines) => out.extend(lines),
        None => out.extend(block.content.lines().map(|line| {
            Line::from(vec![
                Span::raw("  "),
                Span::styled(line.to_string(), Style::default().fg(palette.accent_alt)),
            ])
        })),
    }
    out
}

fn render_divider(block: &DividerBlock, ctx: &BlockContext) -> Vec<Line<'static>> {
    let width = usize::from(ctx.width.max(1));
    let rule = match block.style {
        DividerStyle::Dot => "· ".repeat(width.div_ceil(2)).trim_end().to_string(),
        DividerStyle::Rule => "─".repeat(width),
    };
    vec![Line::from(Span::styled(rule, ctx.palette.muted()))]
}

fn render_list(block: &ListBlock, ctx: &BlockContext) -> Vec<Line<'static>> {
    block
        .items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let marker = if block.ordered {
                format!("{}. ", index + 1)
            } else {
                "• ".to_string()
            };
            Line::from(vec![
                Span::styled(marker, ctx.palette.accent()),
                Span::raw(item.clone()),
            ])
        })
        .collect()
}

fn render_table(block: &TableBlock, ctx: &BlockContext) -> Vec<Line<'static>> {
    let columns = block
        .rows
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(block.headers.len()))
        .max()
        .unwrap_or(0);
    let mut widths = vec![0_usize; columns];
    for row in std::iter::once(&block.headers).chain(block.rows.iter()) {
        for (index, cell) in row.iter().enumerate() {
            widths[index] = widths[index].max(cell.chars().count());
        }
    }

    let format_row = |cells: &[String]| -> String {
        widths
            .iter()
            .enumerate()
            .map(|(index, width)| {
                let cell = cells.get(index).map(String::as_str).unwrap_or("");
                format!("{cell:<width$}")
            })
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut out = Vec::new();
    if !block.headers.is_empty() {
        out.push(Line::from(Span::styled(
            format_row(&block.headers),
            Style::default().add_modifier(Modifier::BOLD),
        )));
        let separator = widths
            .iter()
            .map(|width| "-".repeat(*width))
            .collect::<Vec<_>>()
            .join("-+-");
        out.push(Line::from(Span::styled(separator, ctx.palette.muted())));
    }
    out.extend(
        block
            .rows
            .iter()
            .map(|row| Line::from(Span::raw(format_row(row)))),
    );
    out
}

pub fn line_text(line: &Line<'_>) -> String {
    line.spans.iter().map(|span| span.content.as_ref()).collect()
}
