use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::models::{Category, PostStats};

const TOP_KEYWORDS: usize = 10;

pub fn draw(frame: &mut Frame, app: &App) {
    // Main horizontal split: post list left, detail + stats right
    let main_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 2), Constraint::Ratio(1, 2)])
        .split(frame.area());

    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar with KPIs
            Constraint::Min(0),    // Post list
            Constraint::Length(1), // Status line
        ])
        .split(main_chunks[0]);

    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),     // Selected post detail
            Constraint::Length(12), // Top keyword breakdown
        ])
        .split(main_chunks[1]);

    let stats = PostStats::from_posts(&app.posts, TOP_KEYWORDS);

    render_header(frame, app, &stats, left_chunks[0]);
    render_post_list(frame, app, left_chunks[1]);
    render_status(frame, app, left_chunks[2]);

    render_post_detail(frame, app, right_chunks[0]);
    render_top_keywords(frame, &stats, right_chunks[1]);

    if app.keyword_input_active {
        render_input_popup(frame, " Add keyword ", &app.keyword_input);
    }
    if app.import_input_active {
        render_input_popup(frame, " Import keywords - path to JSON file ", &app.import_input);
    }
    if app.show_help {
        render_help(frame);
    }
}

fn render_header(frame: &mut Frame, app: &App, stats: &PostStats, area: Rect) {
    let title = format!(
        " Stock Pulse [{} | {} | {}] ",
        app.category_filter.label(),
        app.keyword_filter_label(),
        app.handle_filter_label(),
    );
    let kpis = format!(
        " {} Posts | {} Stock-Specific | {} Awareness | {} Keywords",
        stats.total,
        stats.stock_specific,
        stats.awareness,
        app.keywords.len(),
    );

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let paragraph = Paragraph::new(kpis).style(Style::default().fg(Color::White));
    frame.render_widget(paragraph, inner);
}

fn render_post_list(frame: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .posts
        .iter()
        .map(|post| {
            let (tag, tag_style) = match post.category {
                Category::StockSpecific => (
                    format!("[{}] ", post.matched_keyword.as_deref().unwrap_or("?")),
                    Style::default().fg(Color::Yellow),
                ),
                Category::FinancialAwareness => {
                    ("[—] ".to_string(), Style::default().fg(Color::DarkGray))
                }
            };

            let first_line = post.content.lines().next().unwrap_or("");

            let line = Line::from(vec![
                Span::styled(
                    format!("{} ", post.created_at.format("%m-%d %H:%M")),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(format!("{} ", post.handle), Style::default().fg(Color::Blue)),
                Span::styled(tag, tag_style),
                Span::styled(first_line, Style::default().fg(Color::White)),
            ]);

            ListItem::new(line)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    if !app.posts.is_empty() {
        state.select(Some(app.selected_index));
    }

    frame.render_stateful_widget(list, area, &mut state);
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    let status = if app.is_collecting {
        "Collecting posts..."
    } else if let Some(status) = app.status.as_deref() {
        status
    } else {
        "j/k:nav  r:collect  f/s/h:filter  x:clear  a:add  i:import  ?:help  q:quit"
    };

    let paragraph = Paragraph::new(status).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(paragraph, area);
}

fn render_post_detail(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Post ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));

    let Some(post) = app.selected_post() else {
        let paragraph = Paragraph::new("No post selected").block(block);
        frame.render_widget(paragraph, area);
        return;
    };

    let category_style = match post.category {
        Category::StockSpecific => Style::default().fg(Color::Yellow),
        Category::FinancialAwareness => Style::default().fg(Color::Cyan),
    };

    let mut lines = vec![
        Line::from(vec![
            Span::styled(post.handle.clone(), Style::default().fg(Color::Blue)),
            Span::raw("  "),
            Span::styled(
                post.created_at.format("%Y-%m-%d %H:%M UTC").to_string(),
                Style::default().fg(Color::DarkGray),
            ),
        ]),
        Line::from(vec![
            Span::styled(post.category.to_string(), category_style),
            match post.matched_keyword.as_deref() {
                Some(keyword) => Span::styled(
                    format!("  {keyword}"),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                ),
                None => Span::raw(""),
            },
        ]),
        Line::from(Span::styled(
            format!("collected {}", post.collected_at.format("%Y-%m-%d %H:%M UTC")),
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(""),
    ];
    lines.extend(post.content.lines().map(|l| Line::from(l.to_string())));

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn render_top_keywords(frame: &mut Frame, stats: &PostStats, area: Rect) {
    let block = Block::default()
        .title(" Top Stocks ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta));

    if stats.top_keywords.is_empty() {
        let paragraph = Paragraph::new("No stock-specific posts in view")
            .block(block)
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(paragraph, area);
        return;
    }

    let max = stats.top_keywords.first().map(|(_, c)| *c).unwrap_or(1);
    let lines: Vec<Line> = stats
        .top_keywords
        .iter()
        .map(|(keyword, count)| {
            let bar_len = (count * 20 / max.max(1)).max(1);
            Line::from(vec![
                Span::styled(format!("{keyword:<14}"), Style::default().fg(Color::Yellow)),
                Span::styled("▇".repeat(bar_len), Style::default().fg(Color::Magenta)),
                Span::styled(format!(" {count}"), Style::default().fg(Color::White)),
            ])
        })
        .collect();

    let paragraph = Paragraph::new(lines).block(block);
    frame.render_widget(paragraph, area);
}

fn render_input_popup(frame: &mut Frame, title: &str, input: &str) {
    let area = centered_rect(60, 20, frame.area());

    let block = Block::default()
        .title(title.to_string())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let inner = block.inner(area);

    frame.render_widget(ratatui::widgets::Clear, area);
    frame.render_widget(block, area);

    let input_text = format!("> {input}_");
    let paragraph = Paragraph::new(input_text).style(Style::default().fg(Color::White));
    frame.render_widget(paragraph, inner);
}

fn render_help(frame: &mut Frame) {
    let area = centered_rect(50, 60, frame.area());

    let help_text = vec![
        "",
        " Navigation:",
        "   j / ↓    Move down",
        "   k / ↑    Move up",
        "   < / >    Jump to top / bottom",
        "",
        " Filters:",
        "   f        Cycle category filter",
        "   s        Cycle stock keyword filter",
        "   h        Cycle handle filter",
        "   x        Clear all filters",
        "",
        " Actions:",
        "   r        Collect posts now",
        "   a        Add a keyword",
        "   i        Import keywords from JSON",
        "   o        Open post in browser",
        "",
        " General:",
        "   ?        Toggle this help",
        "   q        Quit",
        "",
        " Press any key to close",
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let paragraph = Paragraph::new(help_text.join("\n"))
        .block(block)
        .style(Style::default().fg(Color::White));

    frame.render_widget(ratatui::widgets::Clear, area);
    frame.render_widget(paragraph, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
