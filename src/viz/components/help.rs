use ratatui::{prelude::*, widgets::*};

const GLOBAL_KEYS: [(&str, &str); 3] = [
    ("  q  ", "Quit the dashboard"),
    ("  h  ", "Toggle this help"),
    (" Tab ", "Switch between plots and logs"),
];

const PLOT_KEYS: [(&str, &str); 1] = [("⬅ / ➡", "Switch metric")];

const LOG_KEYS: [(&str, &str); 8] = [
    ("  s  ", "Show or hide the target selector"),
    ("  f  ", "Focus on the selected target"),
    ("⬆ / ⬇", "Select log target"),
    ("⬅ / ➡", "Show one level less or more"),
    ("- / +", "Capture one level less or more"),
    ("PgUp ", "Scroll back through the history"),
    ("PgDn ", "Scroll forward in page mode"),
    (" Esc ", "Leave page mode"),
];

/// Draw the key bindings of the selected tab as a centered popup
pub fn render_help(area: Rect, buf: &mut Buffer, selected_tab: usize) {
    let tab_keys: &[(&str, &str)] = match selected_tab {
        0 => &PLOT_KEYS,
        1 => &LOG_KEYS,
        _ => &[],
    };

    let lines: Vec<Line> = GLOBAL_KEYS
        .iter()
        .chain(tab_keys)
        .map(|&(key, action)| {
            Line::from(vec![
                Span::from(key).light_cyan().bold(),
                Span::raw(format!(" : {action}")),
            ])
        })
        .collect();

    let [_, middle, _] = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(lines.len() as u16 + 4),
        Constraint::Fill(1),
    ])
    .areas(area);
    let [_, popup, _] = Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Length(60),
        Constraint::Fill(1),
    ])
    .areas(middle);

    Clear.render(popup, buf);
    Paragraph::new(lines)
        .block(
            Block::bordered()
                .border_type(BorderType::Rounded)
                .padding(Padding::proportional(1))
                .title("Help"),
        )
        .render(popup, buf);
}
