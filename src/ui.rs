use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap};

use crate::aggregate::format_percentage;
use crate::app::{App, SmtpForm};
use crate::k8s::{format_bytes, format_cpu_millicores};
use crate::model::{
    HostLogKind, MetricsIndex, RankedUsage, ResourceCategory, ResourceKind, Screen,
};

const BG: Color = Color::Rgb(9, 15, 25);
const PANEL: Color = Color::Rgb(16, 27, 44);
const ACCENT: Color = Color::Rgb(52, 211, 153);
const MUTED: Color = Color::Rgb(140, 156, 178);
const WARN: Color = Color::Rgb(251, 191, 36);
const ERROR: Color = Color::Rgb(248, 113, 113);

pub fn render(frame: &mut Frame, app: &App) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(6),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, root[0], app);

    // modals and help draw over the screen they were opened from
    let base = if app.screen().is_modal() || app.screen() == &Screen::Help {
        app.previous_screen().clone()
    } else {
        app.screen().clone()
    };
    render_body(frame, root[1], app, &base);
    render_footer(frame, root[2], app);

    match app.screen() {
        Screen::ScaleInput => render_scale_modal(frame, app),
        Screen::ConfirmDelete => render_confirm_modal(frame, app),
        Screen::PatchEditor => render_editor_modal(frame, app),
        Screen::SmtpForm => render_smtp_modal(frame, app),
        Screen::Help => render_help_modal(frame),
        _ => {}
    }
}

fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let title = screen_title(app);
    let line = Line::from(vec![
        Span::styled(
            " kubeview ",
            Style::default()
                .fg(Color::Black)
                .bg(ACCENT)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("  {title}"), Style::default().fg(Color::White)),
        Span::styled(
            format!("  ns:{}", app.namespace().label()),
            Style::default().fg(MUTED),
        ),
    ]);
    frame.render_widget(Paragraph::new(line).style(Style::default().bg(BG)), area);
}

fn screen_title(app: &App) -> String {
    match app.screen() {
        Screen::CategoryMenu => "Resources".to_string(),
        Screen::SubMenu(category) => category.title().to_string(),
        Screen::List(kind) => app.list_title(*kind),
        Screen::Details => app
            .detail()
            .map(|detail| format!("{} {}", detail.kind.title(), detail.name))
            .unwrap_or_else(|| "Details".to_string()),
        Screen::Yaml | Screen::Logs | Screen::HostLogOutput => app
            .text_view()
            .map(|view| view.title.clone())
            .unwrap_or_else(|| "Output".to_string()),
        Screen::ScaleInput => "Scale".to_string(),
        Screen::ConfirmDelete => "Confirm".to_string(),
        Screen::PatchEditor => "Edit".to_string(),
        Screen::NamespacePicker => "Namespaces".to_string(),
        Screen::Dashboard => "Cluster Dashboard".to_string(),
        Screen::Host => "Host".to_string(),
        Screen::HostLogMenu => "Host Logs".to_string(),
        Screen::SmtpForm => "Send Alert".to_string(),
        Screen::Help => "Help".to_string(),
    }
}

fn render_body(frame: &mut Frame, area: Rect, app: &App, screen: &Screen) {
    match screen {
        Screen::CategoryMenu => {
            let items = ResourceCategory::ALL
                .iter()
                .map(|category| category.title().to_string())
                .collect::<Vec<_>>();
            render_menu(frame, area, app, "Resources", &items);
        }
        Screen::SubMenu(category) => {
            let items = category
                .kinds()
                .iter()
                .map(|kind| kind.title().to_string())
                .collect::<Vec<_>>();
            render_menu(frame, area, app, category.title(), &items);
        }
        Screen::List(kind) => render_table(frame, area, app, *kind),
        Screen::Details => {
            let (title, body) = app
                .detail()
                .map(|detail| {
                    (
                        format!("{} {}", detail.kind.title(), detail.name),
                        detail.body.clone(),
                    )
                })
                .unwrap_or_else(|| ("Details".to_string(), String::new()));
            render_text_panel(frame, area, &title, &body);
        }
        Screen::Yaml | Screen::Logs | Screen::HostLogOutput => {
            let (title, body) = app
                .text_view()
                .map(|view| (view.title.clone(), view.body.clone()))
                .unwrap_or_else(|| ("Output".to_string(), String::new()));
            render_text_panel(frame, area, &title, &body);
        }
        Screen::NamespacePicker => {
            let mut items = vec!["[ All Namespaces ]".to_string()];
            items.extend(app.namespaces().iter().cloned());
            render_menu(frame, area, app, "Namespaces", &items);
        }
        Screen::Dashboard => render_dashboard(frame, area, app),
        Screen::Host => render_host(frame, area, app),
        Screen::HostLogMenu => {
            let items = HostLogKind::ALL
                .iter()
                .map(|kind| kind.title().to_string())
                .collect::<Vec<_>>();
            render_menu(frame, area, app, "Host Logs", &items);
        }
        // modal and help bodies are drawn as overlays
        _ => {}
    }
}

fn render_menu(frame: &mut Frame, area: Rect, app: &App, title: &str, items: &[String]) {
    let rows = items
        .iter()
        .map(|item| Row::new(vec![Cell::from(item.clone()).style(Style::default().fg(Color::White))]));

    let block = Block::default()
        .title(title.to_string())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ACCENT))
        .style(Style::default().bg(PANEL));

    let table = Table::new(rows, vec![Constraint::Percentage(100)])
        .block(block)
        .row_highlight_style(
            Style::default()
                .bg(Color::Rgb(24, 36, 58))
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = TableState::default();
    state.select(Some(app.cursor().min(items.len().saturating_sub(1))));
    frame.render_stateful_widget(table, area, &mut state);
}

fn render_table(frame: &mut Frame, area: Rect, app: &App, kind: ResourceKind) {
    let title = app.list_title(kind);
    let Some(table_data) = app.table(kind).filter(|table| !table.rows.is_empty()) else {
        let panel = Paragraph::new(Text::from(kind.empty_label()))
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .title(title)
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(MUTED))
                    .style(Style::default().bg(PANEL)),
            )
            .style(Style::default().fg(MUTED));
        frame.render_widget(panel, area);
        return;
    };

    let usage_columns = matches!(kind, ResourceKind::Pods | ResourceKind::Nodes);
    let mut headers = table_data.headers.clone();
    if usage_columns {
        headers.push("CPU".to_string());
        headers.push("Memory".to_string());
    }

    let header_row = Row::new(headers.iter().map(|header| {
        Cell::from(header.clone()).style(Style::default().add_modifier(Modifier::BOLD))
    }))
    .height(1)
    .style(Style::default().fg(ACCENT));

    let metrics = app.metrics(kind);
    let rows = table_data.rows.iter().map(|row| {
        let mut columns = row.columns.clone();
        if usage_columns {
            let (cpu, memory) = metric_cells(metrics, &row.name);
            columns.push(cpu);
            columns.push(memory);
        }
        Row::new(
            columns
                .into_iter()
                .map(|column| Cell::from(column).style(Style::default().fg(Color::White))),
        )
    });

    let constraints = column_constraints(headers.len().max(1));
    let block = Block::default()
        .title(format!("{title} [{}]", table_data.rows.len()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ACCENT))
        .style(Style::default().bg(PANEL));

    let table = Table::new(rows, constraints)
        .header(header_row)
        .block(block)
        .column_spacing(1)
        .row_highlight_style(
            Style::default()
                .bg(Color::Rgb(24, 36, 58))
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = TableState::default();
    state.select(Some(app.cursor()));
    frame.render_stateful_widget(table, area, &mut state);
}

/// Usage cells for a pod or node row. A missing sample renders placeholders
/// so the row itself is never dropped.
fn metric_cells(metrics: Option<&MetricsIndex>, name: &str) -> (String, String) {
    match metrics.and_then(|index| index.sample(name)) {
        Some(sample) => (
            format_cpu_millicores(sample.cpu_millicores),
            format_bytes(sample.memory_bytes),
        ),
        None => ("---".to_string(), "---".to_string()),
    }
}

fn render_text_panel(frame: &mut Frame, area: Rect, title: &str, body: &str) {
    let paragraph = Paragraph::new(Text::from(body.to_string()))
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title(title.to_string())
                .borders(Borders::ALL)
                .border_style(Style::default().fg(ACCENT))
                .style(Style::default().bg(PANEL)),
        )
        .style(Style::default().fg(Color::White));
    frame.render_widget(paragraph, area);
}

fn render_dashboard(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .title("Cluster Dashboard")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ACCENT))
        .style(Style::default().bg(PANEL));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(dashboard) = app.dashboard() else {
        frame.render_widget(
            Paragraph::new("Collecting cluster metrics…").style(Style::default().fg(MUTED)),
            inner,
        );
        return;
    };

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(4)])
        .split(inner);

    let totals = vec![
        Line::from(format!(
            "Nodes: {}   Pods: {}",
            dashboard.node_count, dashboard.pod_count
        )),
        Line::from(format!(
            "CPU:    {} / {}  ({}%)",
            format_cpu_millicores(dashboard.cpu_usage_millicores),
            format_cpu_millicores(dashboard.cpu_capacity_millicores),
            format_percentage(
                dashboard.cpu_usage_millicores,
                dashboard.cpu_capacity_millicores
            ),
        )),
        Line::from(format!(
            "Memory: {} / {}  ({}%)",
            format_bytes(dashboard.memory_usage_bytes),
            format_bytes(dashboard.memory_capacity_bytes),
            format_percentage(
                dashboard.memory_usage_bytes,
                dashboard.memory_capacity_bytes
            ),
        )),
    ];
    frame.render_widget(
        Paragraph::new(totals).style(Style::default().fg(Color::White)),
        sections[0],
    );

    let halves = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(sections[1]);
    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(halves[0]);
    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(halves[1]);

    render_ranking(frame, top[0], "Top Pods CPU", &dashboard.top_pods_cpu, false);
    render_ranking(
        frame,
        top[1],
        "Top Pods Memory",
        &dashboard.top_pods_memory,
        true,
    );
    render_ranking(
        frame,
        bottom[0],
        "Top Nodes CPU",
        &dashboard.top_nodes_cpu,
        false,
    );
    render_ranking(
        frame,
        bottom[1],
        "Top Nodes Memory",
        &dashboard.top_nodes_memory,
        true,
    );
}

fn render_ranking(frame: &mut Frame, area: Rect, title: &str, entries: &[RankedUsage], bytes: bool) {
    let lines = if entries.is_empty() {
        vec![Line::from(Span::styled(
            "no samples",
            Style::default().fg(MUTED),
        ))]
    } else {
        let max = entries
            .iter()
            .map(|entry| entry.value)
            .max()
            .unwrap_or(0)
            .max(1);
        entries
            .iter()
            .map(|entry| {
                let value = if bytes {
                    format_bytes(entry.value)
                } else {
                    format_cpu_millicores(entry.value)
                };
                let filled = ((entry.value as f64 / max as f64) * 16.0).round() as usize;
                Line::from(vec![
                    Span::styled(
                        format!("{:<24} ", truncate_name(&entry.name, 24)),
                        Style::default().fg(Color::White),
                    ),
                    Span::styled("█".repeat(filled.max(1)), Style::default().fg(ACCENT)),
                    Span::styled(format!(" {value}"), Style::default().fg(MUTED)),
                ])
            })
            .collect()
    };

    let panel = Paragraph::new(lines).block(
        Block::default()
            .title(title.to_string())
            .borders(Borders::ALL)
            .border_style(Style::default().fg(MUTED))
            .style(Style::default().bg(PANEL)),
    );
    frame.render_widget(panel, area);
}

fn truncate_name(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        return value.to_string();
    }
    let mut out = value.chars().take(max.saturating_sub(1)).collect::<String>();
    out.push('…');
    out
}

fn render_host(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .title("Host (L for logs)")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ACCENT))
        .style(Style::default().bg(PANEL));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(host) = app.host() else {
        frame.render_widget(
            Paragraph::new("Sampling host…").style(Style::default().fg(MUTED)),
            inner,
        );
        return;
    };

    let mut lines = vec![
        Line::from(format!("CPU:    {:.1}%", host.cpu_percent)),
        Line::from(format!("Memory: {:.1}%", host.memory_percent)),
        Line::from(""),
        Line::from(Span::styled(
            format!(
                "{:<24} {:>10} {:>10} {:>10}",
                "Mount", "Total", "Used", "Free"
            ),
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        )),
    ];
    for disk in &host.disks {
        lines.push(Line::from(format!(
            "{:<24} {:>10} {:>10} {:>10}",
            disk.mount,
            format_bytes(disk.total_bytes),
            format_bytes(disk.used_bytes),
            format_bytes(disk.free_bytes),
        )));
    }

    frame.render_widget(
        Paragraph::new(lines).style(Style::default().fg(Color::White)),
        inner,
    );
}

fn render_scale_modal(frame: &mut Frame, app: &App) {
    let area = centered_rect(46, 20, frame.area());
    frame.render_widget(Clear, area);

    let name = app
        .detail()
        .map(|detail| detail.name.clone())
        .unwrap_or_else(|| "-".to_string());
    let lines = vec![
        Line::from(format!("Replicas: {}_", app.scale_draft())),
        Line::from(""),
        Line::from(Span::styled(
            "Enter apply   Esc cancel",
            Style::default().fg(MUTED),
        )),
    ];
    let modal = Paragraph::new(lines).block(
        Block::default()
            .title(format!("Scale {name}"))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(WARN))
            .style(Style::default().bg(PANEL)),
    );
    frame.render_widget(modal, area);
}

fn render_confirm_modal(frame: &mut Frame, app: &App) {
    let area = centered_rect(52, 18, frame.area());
    frame.render_widget(Clear, area);

    let prompt = app
        .pending_delete()
        .map(|(namespace, name)| format!("Delete pod {namespace}/{name}? (y/n)"))
        .unwrap_or_else(|| "Delete? (y/n)".to_string());
    let modal = Paragraph::new(prompt)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .title("Confirm")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(WARN))
                .style(Style::default().bg(PANEL)),
        )
        .style(Style::default().fg(Color::White));
    frame.render_widget(modal, area);
}

fn render_editor_modal(frame: &mut Frame, app: &App) {
    let area = centered_rect(84, 80, frame.area());
    frame.render_widget(Clear, area);

    let name = app
        .detail()
        .map(|detail| detail.name.clone())
        .unwrap_or_else(|| "-".to_string());
    let modal = Paragraph::new(Text::from(app.patch_draft().to_string()))
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title(format!("Edit {name}  Ctrl+S apply  Esc cancel"))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(WARN))
                .style(Style::default().bg(PANEL)),
        )
        .style(Style::default().fg(Color::White));
    frame.render_widget(modal, area);
}

fn render_smtp_modal(frame: &mut Frame, app: &App) {
    let area = centered_rect(56, 42, frame.area());
    frame.render_widget(Clear, area);

    let form = app.smtp_form();
    let mut lines = Vec::new();
    for (index, label) in SmtpForm::LABELS.iter().enumerate() {
        let value = if *label == "Password" {
            "*".repeat(form.fields[index].chars().count())
        } else {
            form.fields[index].clone()
        };
        let marker = if index == form.active { "> " } else { "  " };
        let style = if index == form.active {
            Style::default().fg(ACCENT)
        } else {
            Style::default().fg(Color::White)
        };
        lines.push(Line::from(Span::styled(
            format!("{marker}{label:<10} {value}"),
            style,
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Enter next/send   Esc cancel",
        Style::default().fg(MUTED),
    )));

    let modal = Paragraph::new(lines).block(
        Block::default()
            .title("Send Alert Email")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(WARN))
            .style(Style::default().bg(PANEL)),
    );
    frame.render_widget(modal, area);
}

fn render_help_modal(frame: &mut Frame) {
    let area = centered_rect(70, 70, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from("Navigation: j/k or arrows move  Enter open  Esc/Backspace back"),
        Line::from(""),
        Line::from("Global: m menu  N namespaces  D dashboard  H host  A alerts  Q quotas"),
        Line::from("        ? help  q quit"),
        Line::from(""),
        Line::from("Pods:        d delete  l logs  y yaml"),
        Line::from("Deployments: r scale  e edit  y yaml"),
        Line::from("Quotas:      e edit  y yaml"),
        Line::from("Alerts:      s email  y yaml"),
        Line::from(""),
        Line::from("Host: L journal logs (system, kubelet, docker)"),
        Line::from(""),
        Line::from("Lists refresh on a fixed timer; the error line clears on the"),
        Line::from("next successful fetch."),
    ];

    let modal = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title("Help")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(ACCENT))
                .style(Style::default().bg(PANEL)),
        )
        .style(Style::default().fg(Color::White));
    frame.render_widget(modal, area);
}

fn render_footer(frame: &mut Frame, area: Rect, app: &App) {
    if let Some(error) = app.last_error() {
        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled(" error ", Style::default().fg(Color::Black).bg(ERROR)),
                Span::styled(format!(" {error}"), Style::default().fg(ERROR)),
            ]))
            .style(Style::default().bg(BG)),
            area,
        );
        return;
    }

    let hint = match app.screen() {
        Screen::List(ResourceKind::Pods) => "d delete  l logs  y yaml  Enter details",
        Screen::List(ResourceKind::Deployments) => "r scale  e edit  y yaml  Enter details",
        Screen::List(ResourceKind::ResourceQuotas) => "e edit  y yaml  Enter details",
        Screen::List(ResourceKind::Alerts) => "s email  y yaml  Enter details",
        Screen::List(_) => "y yaml  Enter details",
        Screen::Host => "L logs  Esc back",
        _ => "? help  q quit",
    };
    let text = app
        .status()
        .map(str::to_string)
        .unwrap_or_else(|| hint.to_string());

    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            format!(" {text}"),
            Style::default().fg(MUTED),
        )))
        .style(Style::default().bg(BG)),
        area,
    );
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn column_constraints(columns: usize) -> Vec<Constraint> {
    if columns == 0 {
        return vec![Constraint::Percentage(100)];
    }

    let width = (100 / columns as u16).max(1);
    (0..columns)
        .map(|_| Constraint::Percentage(width))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::metric_cells;
    use crate::model::{MetricsIndex, UsageSample};

    #[test]
    fn missing_sample_renders_placeholders() {
        let mut index = MetricsIndex::default();
        index.insert(
            "sampled",
            UsageSample {
                cpu_millicores: 250,
                memory_bytes: 64 << 20,
            },
        );

        assert_eq!(
            metric_cells(Some(&index), "sampled"),
            ("250m".to_string(), "64.0Mi".to_string())
        );
        assert_eq!(
            metric_cells(Some(&index), "unsampled"),
            ("---".to_string(), "---".to_string())
        );
        assert_eq!(
            metric_cells(None, "anything"),
            ("---".to_string(), "---".to_string())
        );
    }
}
