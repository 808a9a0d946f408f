//! TUI rendering.
//!
//! ┌──────────────────────────────────────────────┐
//! │  shapemedian   cycle #4   1.84s   auto 3.0s  │
//! ├──────────────────────────────────────────────┤
//! │  Shape     Median Area  Latest Area  # Calc  │
//! │  square           4.00         9.00       4  │
//! │  ...                                         │
//! ├──────────────────────────────────────────────┤
//! │  source: simulated   samples 24   failed 0   │
//! ├──────────────────────────────────────────────┤
//! │  r: refresh   a: auto   x: cancel   q: quit  │
//! └──────────────────────────────────────────────┘

use super::app::App;
use ratatui::{prelude::*, widgets::*};
use shapemedian_core::render::{COLUMNS, WELCOME};
use shapemedian_core::{PipelineSnapshot, RenderState, format_area};

pub fn draw(f: &mut Frame, app: &App) {
    let snapshot = app.snapshot();
    let state = app.view_state(&snapshot);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // title
            Constraint::Min(8),    // table
            Constraint::Length(4), // status
            Constraint::Length(1), // keys
        ])
        .split(f.area());

    draw_title(f, rows[0], app, &snapshot, &state);
    draw_table(f, rows[1], &snapshot, &state);
    draw_status(f, rows[2], app, &snapshot);
    draw_keys(f, rows[3]);
}

fn draw_title(
    f: &mut Frame,
    area: Rect,
    app: &App,
    snapshot: &PipelineSnapshot,
    state: &RenderState,
) {
    let cycle = snapshot.status.refresh_count;
    let secs = snapshot.status.last_cycle_secs;
    let spin = if *state == RenderState::Loading {
        " ⟳"
    } else {
        ""
    };
    let auto = if app.auto_refresh() {
        format!("auto {:.1}s", app.auto_interval().as_secs_f64())
    } else {
        "auto off".to_string()
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Line::from(vec![
            Span::styled(" shapemedian ", Style::default().bold().fg(Color::Cyan)),
            Span::styled(
                format!("  cycle #{cycle}  {secs:.2}s{spin}  "),
                Style::default().fg(Color::DarkGray),
            ),
            Span::styled(auto, Style::default().fg(Color::Yellow)),
            Span::raw(" "),
        ]));

    f.render_widget(block, area);
}

fn draw_table(f: &mut Frame, area: Rect, snapshot: &PipelineSnapshot, state: &RenderState) {
    let (title, title_style) = match state {
        RenderState::Welcome => (" Areas ".to_string(), Style::default()),
        RenderState::Loading => (" Loading... ".to_string(), Style::default().fg(Color::Yellow)),
        RenderState::Idle => (" Areas ".to_string(), Style::default().fg(Color::Green)),
        RenderState::Failed(msg) => (
            format!(" Refresh failed: {msg} "),
            Style::default().fg(Color::Red),
        ),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(title, title_style));

    let data = snapshot.rows();
    if data.is_empty() {
        let text = if *state == RenderState::Loading {
            "Loading..."
        } else {
            WELCOME
        };
        let p = Paragraph::new(text)
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        f.render_widget(p, area);
        return;
    }

    let header = Row::new(COLUMNS.iter().map(|c| Cell::from(*c)))
        .style(Style::default().bold().fg(Color::Cyan));

    let rows: Vec<Row> = data
        .iter()
        .map(|r| {
            Row::new(vec![
                Cell::from(r.name()),
                Cell::from(Text::from(format_area(r.median_area)).alignment(Alignment::Right)),
                Cell::from(Text::from(format_area(r.latest_area)).alignment(Alignment::Right)),
                Cell::from(Text::from(r.refresh_count.to_string()).alignment(Alignment::Right)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(12),
        Constraint::Length(14),
        Constraint::Length(14),
        Constraint::Length(20),
    ];
    let table = Table::new(rows, widths).header(header).block(block);
    f.render_widget(table, area);
}

fn draw_status(f: &mut Frame, area: Rect, app: &App, snapshot: &PipelineSnapshot) {
    let s = &snapshot.status;
    let mut lines = vec![Line::from(vec![
        Span::raw(" source: "),
        Span::styled(s.source.clone(), Style::default().bold()),
        Span::raw(format!(
            "   samples {}   completed {}   ",
            s.samples_requested, s.cycles_completed
        )),
        Span::styled(
            format!("failed {}", s.cycles_failed),
            if s.cycles_failed > 0 {
                Style::default().fg(Color::Red)
            } else {
                Style::default()
            },
        ),
    ])];

    let medians = snapshot
        .summary
        .iter()
        .map(|m| format!("{} {}", m.shape.name(), format_area(m.median)))
        .collect::<Vec<_>>()
        .join("  ");
    if !medians.is_empty() {
        lines.push(Line::from(format!(" medians: {medians}")));
    }
    if let Some(notice) = app.notice() {
        lines.push(Line::styled(
            format!(" {notice}"),
            Style::default().fg(Color::Yellow),
        ));
    }

    let block = Block::default().borders(Borders::TOP).title(" Status ");
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_keys(f: &mut Frame, area: Rect) {
    let bar = Paragraph::new(
        " r/space/enter: refresh   a: auto refresh   +/-: interval   x: cancel   q: quit",
    )
    .style(Style::default().bg(Color::DarkGray).fg(Color::White));
    f.render_widget(bar, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use shapemedian_core::{FixedSource, RefreshPipeline, SharedPipeline};
    use std::sync::Arc;
    use std::time::Duration;

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        let buf = terminal.backend().buffer();
        let mut text = String::new();
        for y in 0..buf.area.height {
            for x in 0..buf.area.width {
                text.push_str(buf[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    #[test]
    fn draws_welcome_then_table() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let pipeline = SharedPipeline::new(RefreshPipeline::new(Arc::new(FixedSource::new(2.0))));
        let app = App::new(
            pipeline.clone(),
            rt.handle().clone(),
            Duration::from_secs(2),
            false,
        );
        let mut terminal = Terminal::new(TestBackend::new(90, 20)).unwrap();

        terminal.draw(|f| draw(f, &app)).unwrap();
        let text = buffer_text(&terminal);
        assert!(text.contains("Welcome!"));
        assert!(text.contains("auto off"));

        rt.block_on(pipeline.trigger_refresh()).unwrap();
        terminal.draw(|f| draw(f, &app)).unwrap();
        let text = buffer_text(&terminal);
        assert!(text.contains("Median Area"));
        assert!(text.contains("square"));
        assert!(text.contains("12.57"));
        assert!(text.contains("cycle #1"));
    }
}
