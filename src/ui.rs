use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use unicode_width::UnicodeWidthChar;

use crate::app::{App, Screen};
use crate::state::ChatRole;

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    match app.screen {
        Screen::Credential => render_credential_screen(app, frame, body_area),
        Screen::Chat => render_chat_screen(app, frame, body_area),
    }

    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let mode = if app.is_proxy_mode() { " proxy " } else { " direct " };

    let title = Line::from(vec![
        Span::styled(" Chat ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(mode, Style::default().fg(Color::Black).bg(Color::Green)),
        Span::raw(" "),
        Span::styled(app.client.model().to_string(), Style::default().fg(Color::White)),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints = match app.screen {
        Screen::Credential => vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" set key ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" quit ", label_style),
        ],
        Screen::Chat => vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" send ", label_style),
            Span::styled(" ↑/↓ PgUp/PgDn ", key_style),
            Span::styled(" scroll ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" quit ", label_style),
        ],
    };

    frame.render_widget(Paragraph::new(Line::from(hints)), area);
}

fn render_credential_screen(app: &App, frame: &mut Frame, area: Rect) {
    let Some(gate) = app.gate.as_ref() else {
        return;
    };

    let popup_width = 60.min(area.width.saturating_sub(4));
    let popup_height = 7.min(area.height);
    let popup_x = area.x + (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = area.y + (area.height.saturating_sub(popup_height)) / 2;
    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Enter your OpenRouter API key ");

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);
    if inner.height < 5 {
        return;
    }

    let instructions = Paragraph::new("The key is kept in memory for this session only.")
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(instructions, Rect::new(inner.x, inner.y, inner.width, 1));

    let input_area = Rect::new(inner.x, inner.y + 2, inner.width, 1);
    let input = Paragraph::new(gate.masked_input()).style(Style::default().fg(Color::Cyan));
    frame.render_widget(input, input_area);

    let cursor_x = (gate.masked_input().chars().count() as u16).min(input_area.width);
    frame.set_cursor_position((input_area.x + cursor_x, input_area.y));

    let status = Paragraph::new(format!("{} characters", gate.input.chars().count()))
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(status, Rect::new(inner.x, inner.y + 4, inner.width, 1));
}

fn render_chat_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [chat_area, input_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(3)]).areas(area);

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Conversation ");
    let inner = chat_block.inner(chat_area);

    // Measure with the same wrapping that draws it
    let chat = Paragraph::new(chat_text(app)).wrap(Wrap { trim: false });
    let lines = chat.line_count(inner.width).min(u16::MAX as usize) as u16;
    let message_count = app.conversation.messages().len();
    app.update_chat_view(inner.height, lines, message_count);

    let chat = chat.block(chat_block).scroll((app.chat_scroll, 0));
    frame.render_widget(chat, chat_area);

    let busy = app.conversation.is_busy();
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if busy { Color::DarkGray } else { Color::Yellow }))
        .title(" Message ");
    let input_inner = input_block.inner(input_area);

    let (visible, cursor_x) =
        visible_draft(app.conversation.draft(), app.draft_cursor, input_inner.width);
    frame.render_widget(Paragraph::new(visible).block(input_block), input_area);
    frame.set_cursor_position((input_inner.x + cursor_x, input_inner.y));
}

fn chat_text(app: &App) -> Text<'static> {
    let messages = app.conversation.messages();
    let busy = app.conversation.is_busy();

    if messages.is_empty() && !busy {
        return Text::from(Span::styled(
            "Type a message...",
            Style::default().fg(Color::DarkGray),
        ));
    }

    let mut lines: Vec<Line<'static>> = Vec::new();
    for msg in messages {
        lines.push(role_line(msg.role));
        for line in msg.content.lines() {
            lines.push(Line::from(line.to_string()));
        }
        lines.push(Line::default());
    }

    if busy {
        lines.push(role_line(ChatRole::Assistant));
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    Text::from(lines)
}

/// Slice of the draft that fits in `width` columns with the cursor in view,
/// and the cursor column within that slice. Widths are display widths.
fn visible_draft(draft: &str, cursor: usize, width: u16) -> (String, u16) {
    let width = width as usize;
    if width == 0 {
        return (String::new(), 0);
    }

    let chars: Vec<char> = draft.chars().collect();
    let cursor = cursor.min(chars.len());
    let char_width = |c: &char| c.width().unwrap_or(0);

    // Walk back from the cursor, keeping one column free for it
    let mut start = cursor;
    let mut used = 0;
    while start > 0 {
        let w = char_width(&chars[start - 1]);
        if used + w > width - 1 {
            break;
        }
        used += w;
        start -= 1;
    }
    // Short prefixes are shown from the beginning
    if chars[..cursor].iter().map(char_width).sum::<usize>() < width {
        start = 0;
    }

    let mut visible = String::new();
    let mut taken = 0;
    let mut cursor_col = 0;
    for (i, c) in chars.iter().enumerate().skip(start) {
        let w = char_width(c);
        if taken + w > width {
            break;
        }
        if i < cursor {
            cursor_col += w;
        }
        visible.push(*c);
        taken += w;
    }

    (visible, cursor_col.min(width - 1) as u16)
}

fn role_line(role: ChatRole) -> Line<'static> {
    match role {
        ChatRole::User => Line::from(Span::styled(
            "👤 You:",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        ChatRole::Assistant => Line::from(Span::styled(
            "🤖 AI:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
    }
}
