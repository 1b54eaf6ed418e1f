use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::app::{menu_items, picker_row_width, App, MenuItem, SetupField};
use crate::coach;
use crate::config::Locale;
use crate::sequence::{Answer, PaletteColor, Sequence};
use crate::session::{CoachState, MemorizeState, Phase, RecallState, ResultsState};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim() -> Style {
    Style::default().add_modifier(Modifier::DIM)
}

fn selected() -> Style {
    bold().fg(Color::Magenta)
}

fn swatch(color: PaletteColor) -> Style {
    let (r, g, b) = color.rgb();
    Style::default().bg(Color::Rgb(r, g, b)).fg(Color::White)
}

/// Centers `text` in a cell `width` columns wide.
fn cell(text: &str, width: usize) -> String {
    let w = text.width();
    if w >= width {
        return text.to_string();
    }
    let left = (width - w) / 2;
    format!("{}{}{}", " ".repeat(left), text, " ".repeat(width - w - left))
}

fn answer_span(answer: &Answer, width: usize, highlight: bool) -> Span<'static> {
    let text = cell(&answer.label(), width);
    let style = match answer {
        Answer::Color(c) => swatch(*c),
        Answer::Card(card) if card.face.suit.is_red() => Style::default().fg(Color::Red),
        _ => Style::default(),
    };
    if highlight {
        Span::styled(
            format!("[{}]", text.trim()),
            style.patch(bold()).add_modifier(Modifier::REVERSED),
        )
    } else {
        Span::styled(format!(" {text} "), style)
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints(
                [Constraint::Length(2), Constraint::Min(1), Constraint::Length(2)].as_ref(),
            )
            .split(area);

        let header = Line::from(vec![
            Span::styled("mnemo", bold().fg(Color::Cyan)),
            Span::styled(
                format!("  ·  {}  ·  {}", self.session.discipline().label(), self.session.locale()),
                dim(),
            ),
        ]);
        Paragraph::new(header).render(chunks[0], buf);

        let (body, footer) = match self.session.phase() {
            Phase::Menu => (
                menu_lines(self),
                "↑/↓ select · enter open · h history · g guide · l language · q quit",
            ),
            Phase::Guide => (guide_lines(self.session.locale()), "↑/↓ scroll · esc back"),
            Phase::History => (
                history_lines(self, chunks[1].height as usize),
                "↑/↓ scroll · x clear · esc back",
            ),
            Phase::Setup => (
                setup_lines(self),
                "↑/↓ field · ←/→ adjust · pgup/pgdn ×10 · enter start · esc back",
            ),
            Phase::Generating { .. } => (
                vec![Line::from(Span::styled(
                    "Generating sequence…",
                    dim().add_modifier(Modifier::ITALIC),
                ))],
                "esc cancel",
            ),
            Phase::Memorize(state) => (
                memorize_lines(state),
                "←/→ move · home/end jump · enter recall now · esc abandon",
            ),
            Phase::Recall(state) => (
                recall_lines(self, state),
                if state.run.discipline.is_picked() {
                    "arrows pick · enter answer · backspace clear · tab/shift-tab slot · ctrl-f finish · esc abandon"
                } else {
                    "type · enter submit · tab/shift-tab slot · ctrl-f finish · esc abandon"
                },
            ),
            Phase::Results(state) => (
                results_lines(state, self.results_scroll, chunks[1].height as usize),
                "c coach · r play again · m menu · ↑/↓ scroll",
            ),
        };

        let scroll = match self.session.phase() {
            Phase::Guide => self.guide_scroll,
            _ => 0,
        };
        Paragraph::new(body)
            .wrap(Wrap { trim: false })
            .scroll((scroll, 0))
            .render(chunks[1], buf);

        let mut bottom = vec![Line::from(Span::styled(footer, dim()))];
        if let Some(notice) = &self.notice {
            bottom.insert(0, Line::from(Span::styled(notice.clone(), bold().fg(Color::Yellow))));
        }
        Paragraph::new(bottom).render(chunks[2], buf);
    }
}

fn menu_lines(app: &App) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(Span::styled("Choose a drill", bold())), Line::default()];
    for (i, item) in menu_items().into_iter().enumerate() {
        let label = match item {
            MenuItem::Drill(d) => d.label().to_string(),
            MenuItem::History => "History".to_string(),
            MenuItem::Guide => "Guide".to_string(),
        };
        if i == app.menu_cursor {
            lines.push(Line::from(Span::styled(format!("> {label}"), selected())));
        } else {
            lines.push(Line::from(format!("  {label}")));
        }
    }
    lines
}

fn guide_lines(locale: Locale) -> Vec<Line<'static>> {
    let (heading, subtitle) = coach::guide_heading(locale);
    let mut lines = vec![
        Line::from(Span::styled(heading, bold())),
        Line::from(Span::styled(subtitle, dim())),
    ];
    for technique in coach::techniques(locale) {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(technique.title, selected())));
        lines.push(Line::from(Span::styled(technique.method, bold())));
        lines.push(Line::from(technique.how));
    }
    lines
}

fn history_lines(app: &App, height: usize) -> Vec<Line<'static>> {
    let view = &app.history;
    if view.confirm_clear {
        return vec![Line::from(Span::styled(
            "Delete all history? y to confirm, any other key to cancel",
            bold().fg(Color::Red),
        ))];
    }
    if view.entries.is_empty() {
        return vec![Line::from(Span::styled("No runs yet.", dim()))];
    }
    let mut lines = vec![Line::from(Span::styled("Per discipline", bold()))];
    for s in &view.summary {
        lines.push(Line::from(format!(
            "  {:<10} {:>3} runs  best {:>3}%  avg {:>5.1}%",
            s.discipline.label(),
            s.runs,
            s.best_accuracy,
            s.average_accuracy
        )));
    }
    lines.push(Line::default());
    lines.push(Line::from(Span::styled("Recent runs", bold())));
    let room = height.saturating_sub(lines.len()).max(1);
    for entry in view.entries.iter().skip(view.scroll).take(room) {
        let when = entry
            .local_time()
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "unknown".into());
        let style = if entry.accuracy >= 80 {
            Style::default().fg(Color::Green)
        } else {
            Style::default()
        };
        lines.push(Line::from(vec![
            Span::styled(format!("  {when}  "), dim()),
            Span::raw(format!("{:<10}", entry.discipline.label())),
            Span::styled(
                format!("{:>4}/{:<4} {:>3}%  ", entry.score, entry.total, entry.accuracy),
                style,
            ),
            Span::styled(format!("{}s", entry.time_used_secs), dim()),
        ]));
    }
    lines
}

fn setup_lines(app: &App) -> Vec<Line<'static>> {
    let discipline = app.session.discipline();
    let v = &app.setup.values;
    let mut lines = vec![
        Line::from(Span::styled(format!("{} setup", discipline.label()), bold())),
        Line::default(),
    ];
    for (i, field) in SetupField::fields_for(discipline).iter().enumerate() {
        let value = match field {
            SetupField::Quantity => v.quantity.to_string(),
            SetupField::TimeLimit => format!("{} s", v.time_limit_secs),
            SetupField::Pace if v.pace_items_per_minute == 0 => "manual".to_string(),
            SetupField::Pace => format!("{} / min", v.pace_items_per_minute),
            SetupField::Grouping => v.grouping.to_string(),
        };
        let text = format!("{:<12} ‹ {value} ›", field.to_string());
        if i == app.setup.field {
            lines.push(Line::from(Span::styled(format!("> {text}"), selected())));
        } else {
            lines.push(Line::from(format!("  {text}")));
        }
    }
    lines
}

fn memorize_lines(state: &MemorizeState) -> Vec<Line<'static>> {
    let run = &state.run;
    let time_style = if run.time_remaining <= 10 {
        bold().fg(Color::Red)
    } else {
        bold()
    };
    let mut lines = vec![
        Line::from(vec![
            Span::styled(format!("{}s", run.time_remaining), time_style),
            Span::styled(
                format!(
                    "   {}/{}{}",
                    state.cursor + 1,
                    state.positions(),
                    if state.is_paced() { "  (paced)" } else { "" }
                ),
                dim(),
            ),
        ]),
        Line::default(),
    ];

    let slots = state.visible_slots();
    let shown: Vec<Span<'static>> = match &run.sequence {
        Sequence::Numbers(s) | Sequence::Binaries(s) => vec![Span::styled(
            s.chars().skip(slots.start).take(slots.len()).collect::<String>(),
            bold().fg(Color::Cyan),
        )],
        Sequence::Cards(cards) => cards[slots.clone()]
            .iter()
            .map(|c| answer_span(&Answer::Card(c.clone()), 4, false))
            .collect(),
        Sequence::Words(words) => vec![Span::styled(words[slots.start].clone(), bold())],
        Sequence::Names(names) => {
            let n = &names[slots.start];
            vec![
                Span::styled(n.name.clone(), bold()),
                Span::styled(format!("   {}", n.portrait), dim()),
            ]
        }
        Sequence::Images(images) => vec![Span::styled(images[slots.start].to_string(), bold())],
        Sequence::Colors(colors) => {
            vec![answer_span(&Answer::Color(colors[slots.start]), 12, false)]
        }
    };
    lines.push(Line::from(shown).alignment(Alignment::Center));
    lines.push(Line::default());

    // context strip: the neighbouring positions, current one underlined
    let from = state.cursor.saturating_sub(3);
    let to = (state.cursor + 4).min(state.positions());
    let group = run.discipline.effective_group(run.config.grouping);
    let strip: Vec<Span<'static>> = (from..to)
        .map(|pos| {
            let labels: String = (pos * group..((pos + 1) * group).min(run.sequence.len()))
                .filter_map(|slot| run.sequence.label(slot))
                .collect::<Vec<_>>()
                .join(if group > 1 { "" } else { " " });
            let style = if pos == state.cursor {
                bold().add_modifier(Modifier::UNDERLINED)
            } else {
                dim()
            };
            Span::styled(format!(" {labels} "), style)
        })
        .collect();
    lines.push(Line::from(strip).alignment(Alignment::Center));
    lines
}

fn recall_lines(app: &App, state: &RecallState) -> Vec<Line<'static>> {
    let run = &state.run;
    let total = run.sequence.len();
    let mut lines = vec![
        Line::from(Span::styled(
            format!(
                "Recall  ·  {} of {} answered",
                run.responses.answered_count(),
                total
            ),
            bold(),
        )),
        Line::default(),
    ];

    if let Some(buffer) = run.responses.buffer() {
        let group = run.config.grouping.max(1);
        let grouped = buffer
            .chars()
            .collect::<Vec<_>>()
            .chunks(group)
            .map(|c| c.iter().collect::<String>())
            .collect::<Vec<_>>()
            .join(" ");
        lines.push(Line::from(vec![
            Span::styled(grouped, bold().fg(Color::Cyan)),
            Span::styled("_", dim()),
        ]));
        lines.push(Line::from(Span::styled(format!("{}/{}", buffer.len(), total), dim())));
        return lines;
    }

    lines.push(Line::from(vec![
        Span::styled(format!("Slot {}/{}  ", state.cursor + 1, total), bold()),
        Span::raw(run.responses.label(state.cursor).unwrap_or_else(|| "—".into())),
    ]));
    if let Sequence::Names(names) = &run.sequence {
        lines.push(Line::from(Span::styled(names[state.cursor].portrait.clone(), dim())));
    }
    lines.push(Line::default());

    if state.choices.is_empty() {
        // typed slots: show a window of neighbours
        let from = state.cursor.saturating_sub(2);
        for slot in from..(state.cursor + 3).min(total) {
            let text = run.responses.text(slot).unwrap_or_default().to_string();
            let line = format!("{:>4}. {}", slot + 1, text);
            if slot == state.cursor {
                lines.push(Line::from(vec![
                    Span::styled(line, selected()),
                    Span::styled("_", dim()),
                ]));
            } else {
                lines.push(Line::from(Span::styled(line, dim())));
            }
        }
        return lines;
    }

    let width = state.choices.iter().map(|a| a.label().width()).max().unwrap_or(1);
    for (row_no, row) in state
        .choices
        .chunks(picker_row_width(run.discipline))
        .enumerate()
    {
        let offset = row_no * picker_row_width(run.discipline);
        let spans: Vec<Span<'static>> = row
            .iter()
            .enumerate()
            .map(|(i, answer)| answer_span(answer, width, offset + i == app.picker_cursor))
            .collect();
        lines.push(Line::from(spans));
    }
    lines
}

fn results_lines(state: &ResultsState, scroll: usize, height: usize) -> Vec<Line<'static>> {
    let s = &state.summary;
    let accuracy_style = match s.accuracy {
        90..=100 => bold().fg(Color::Green),
        50..=89 => bold().fg(Color::Yellow),
        _ => bold().fg(Color::Red),
    };
    let mut lines = vec![
        Line::from(vec![
            Span::styled(format!("{}/{}", s.score, s.total), bold()),
            Span::raw("  "),
            Span::styled(format!("{}%", s.accuracy), accuracy_style),
            Span::styled(
                format!("  {} mistakes  ·  {}s memorizing", s.mistakes, s.time_used_secs),
                dim(),
            ),
        ]),
        Line::default(),
    ];
    match &state.coach {
        CoachState::Idle => {}
        CoachState::Pending => lines.push(Line::from(Span::styled(
            "Asking the coach…",
            dim().add_modifier(Modifier::ITALIC),
        ))),
        CoachState::Ready(text) => {
            lines.push(Line::from(Span::styled(text.clone(), Style::default().fg(Color::Cyan))));
        }
    }
    lines.push(Line::default());

    let room = height.saturating_sub(lines.len()).max(1);
    for (slot, verdict) in state.verdicts.iter().enumerate().skip(scroll).take(room) {
        let (mark, style) = if verdict.correct {
            ("✓", Style::default().fg(Color::Green))
        } else {
            ("✗", Style::default().fg(Color::Red))
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{:>4}. {mark} ", slot + 1), style),
            Span::raw(format!("{:<16}", verdict.expected)),
            Span::styled(
                verdict.recalled.clone().unwrap_or_else(|| "—".into()),
                if verdict.correct { dim() } else { style },
            ),
        ]));
    }
    lines
}
