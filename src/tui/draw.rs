use ratatui::{
    backend::TestBackend,
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};

use crate::command::{CommandBuilder, CommandLine};
use crate::tui::advanced::ModelField;
use crate::tui::editor::EditorFocus;
use crate::tui::input::TextInput;
use crate::tui::providers::FormMode;
use crate::tui::state::{App, Dialog, Screen};
use crate::tui::wizard::WizardStep;

const BG: Color = Color::Rgb(15, 15, 25);
const BORDER: Color = Color::Rgb(50, 50, 80);

// ── Drawing ───────────────────────────────────────────────────────────────────

pub fn draw(f: &mut Frame, app: &mut App) {
    let area = f.area();

    // Background
    f.render_widget(Block::default().style(Style::default().bg(BG)), area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);

    draw_header(f, chunks[0], app);

    match app.screen {
        Screen::PresetList => draw_preset_list(f, chunks[1], app),
        Screen::Preview => draw_preview(f, chunks[1], app),
        Screen::Wizard => draw_wizard(f, chunks[1], app),
        Screen::Editor => draw_editor(f, chunks[1], app),
        Screen::Advanced => draw_advanced(f, chunks[1], app),
        Screen::ModelEditor => draw_model_editor(f, chunks[1], app),
        Screen::Providers => draw_providers(f, chunks[1], app),
        Screen::ProviderForm => {
            draw_providers(f, chunks[1], app);
            draw_provider_form(f, chunks[1], app);
        }
        Screen::WizardFlags => draw_wizard_flags(f, chunks[1], app),
    }

    draw_status(f, chunks[2], app);
    draw_footer(f, chunks[3], app);

    if let Some(dialog) = &app.dialog {
        draw_dialog(f, area, dialog);
    }
}

fn screen_title(screen: Screen) -> &'static str {
    match screen {
        Screen::PresetList => "Presets",
        Screen::Preview => "Launch",
        Screen::Wizard => "New preset",
        Screen::Editor => "Edit preset",
        Screen::Advanced => "Model settings",
        Screen::ModelEditor => "Edit model settings",
        Screen::Providers | Screen::ProviderForm => "Providers & endpoints",
        Screen::WizardFlags => "Wizard flags",
    }
}

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
    let line = Line::from(vec![
        Span::styled(" aider-start", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        Span::styled(format!("  v{}", env!("CARGO_PKG_VERSION")), Style::default().fg(Color::DarkGray)),
        Span::styled("  ·  ", Style::default().fg(Color::DarkGray)),
        Span::styled(screen_title(app.screen), Style::default().fg(Color::White).add_modifier(Modifier::BOLD)),
    ]);
    let header = Paragraph::new(line)
        .block(Block::default().borders(Borders::BOTTOM).border_style(Style::default().fg(BORDER)))
        .alignment(Alignment::Left);
    f.render_widget(header, area);
}

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
    let color = if app.status.starts_with('✓') { Color::Green } else { Color::Yellow };
    let status = Paragraph::new(format!(" {}", app.status)).style(Style::default().fg(color).bg(BG));
    f.render_widget(status, area);
}

fn footer_hint(app: &App) -> &'static str {
    match app.dialog {
        Some(Dialog::Message { .. }) => return " Enter/Esc Close ",
        Some(Dialog::Confirm { .. }) => return " y/Enter Confirm   n/Esc Cancel ",
        None => {}
    }
    match app.screen {
        Screen::PresetList if app.filtering => " Type to filter   Enter Keep   Esc Clear ",
        Screen::PresetList => {
            " ↑↓ Navigate   Enter Launch   n New   e Edit   a Models   d Delete   / Filter   p Providers   w Wizard flags   q Quit "
        }
        Screen::Preview => " Enter/y Launch   c Copy command   Esc Back ",
        Screen::Wizard => " Enter Next   Tab Next   Esc Back   Space Toggle ",
        Screen::Editor => match app.editor.as_ref() {
            Some(e) if e.picker.is_some() => " Type to search   ↑↓ Select   Enter Add   Esc Close ",
            Some(e) if e.editing.is_some() => " Enter Set value   Esc Cancel ",
            _ => " Tab Next field   a Add flag   Enter Edit   d Remove   Ctrl+S/F2 Save   Esc Back ",
        },
        Screen::Advanced => " ↑↓ Navigate   n New   Enter Edit   d Delete   Esc Back ",
        Screen::ModelEditor => " Tab Next field   Ctrl+S/F2 Save   F3 Save template   F4 Load template   Esc Back ",
        Screen::Providers => {
            " ↑↓ Navigate   P Add provider   a Add endpoint   s Set key   x Clear key   m Add model   t Test   d Delete   Esc Back "
        }
        Screen::ProviderForm => " Tab/Enter Next field   Enter Save (last field)   Esc Cancel ",
        Screen::WizardFlags => " ↑↓ Navigate   Space Toggle   Esc Back ",
    }
}

fn draw_footer(f: &mut Frame, area: Rect, app: &App) {
    let footer = Paragraph::new(footer_hint(app))
        .style(Style::default().fg(Color::DarkGray).bg(BG))
        .alignment(Alignment::Center);
    f.render_widget(footer, area);
}

// ── Shared pieces ─────────────────────────────────────────────────────────────

fn panel(title: &str, focused: bool) -> Block<'static> {
    let color = if focused { Color::Yellow } else { BORDER };
    let title_color = if focused { Color::Yellow } else { Color::Cyan };
    Block::default()
        .title(format!(" {title} "))
        .title_style(Style::default().fg(title_color).add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
}

fn highlighted_list(items: Vec<ListItem<'static>>, block: Block<'static>) -> List<'static> {
    List::new(items)
        .block(block)
        .highlight_style(Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD))
        .highlight_symbol("▶ ")
}

fn label(text: &str) -> Span<'static> {
    Span::styled(format!("  {text:<12}: "), Style::default().fg(Color::DarkGray))
}

/// Lines of an input with the cursor shown as a reversed cell when focused.
fn input_lines(input: &TextInput, focused: bool, secret: bool) -> Vec<Line<'static>> {
    if secret {
        let mut text = input.masked();
        if focused {
            text.push('▏');
        }
        return vec![Line::from(Span::styled(text, Style::default().fg(Color::White)))];
    }
    if !focused {
        return input
            .value
            .split('\n')
            .map(|l| Line::from(Span::styled(l.to_string(), Style::default().fg(Color::Gray))))
            .collect();
    }
    let (before, cursor, after) = input.split_at_cursor();
    let text = Style::default().fg(Color::White);
    let mut lines: Vec<Line<'static>> = Vec::new();
    let before_lines: Vec<&str> = before.split('\n').collect();
    let last = before_lines.len() - 1;
    for l in &before_lines[..last] {
        lines.push(Line::from(Span::styled(l.to_string(), text)));
    }
    let mut after_lines = after.split('\n');
    let rest = after_lines.next().unwrap_or_default();
    lines.push(Line::from(vec![
        Span::styled(before_lines[last].to_string(), text),
        Span::styled(cursor.to_string(), Style::default().add_modifier(Modifier::REVERSED)),
        Span::styled(rest.to_string(), text),
    ]));
    for l in after_lines {
        lines.push(Line::from(Span::styled(l.to_string(), text)));
    }
    lines
}

fn draw_input(f: &mut Frame, area: Rect, title: &str, input: &TextInput, focused: bool) {
    let p = Paragraph::new(input_lines(input, focused, false)).block(panel(title, focused));
    f.render_widget(p, area);
}

/// Multi-line input scrolled to keep the cursor line visible.
fn draw_textarea(f: &mut Frame, area: Rect, title: &str, input: &TextInput, focused: bool) {
    let height = area.height.saturating_sub(2) as usize;
    let scroll = input.cursor_line().saturating_sub(height.saturating_sub(1)) as u16;
    let p = Paragraph::new(input_lines(input, focused, false))
        .block(panel(title, focused))
        .scroll((scroll, 0));
    f.render_widget(p, area);
}

fn command_paragraph(command: &CommandLine, title: &str) -> Paragraph<'static> {
    Paragraph::new(Span::styled(command.to_shell_string(), Style::default().fg(Color::Green)))
        .block(panel(title, false))
        .wrap(Wrap { trim: false })
}

fn centered_rect(percent_x: u16, height: u16, area: Rect) -> Rect {
    let width = area.width * percent_x / 100;
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    }
}

fn flag_display(name: &str, value: &Option<String>) -> String {
    match value {
        Some(v) if !v.is_empty() => format!("--{name} {v}"),
        _ => format!("--{name}"),
    }
}

// ── Preset list ───────────────────────────────────────────────────────────────

fn draw_preset_list(f: &mut Frame, area: Rect, app: &mut App) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    let visible = app.visible_presets();
    let title = if app.filtering || !app.filter.is_blank() {
        format!("Presets  /{}", app.filter.value)
    } else {
        format!("Presets ({})", visible.len())
    };
    let items: Vec<ListItem<'static>> = visible
        .iter()
        .map(|p| {
            ListItem::new(Line::from(vec![
                Span::raw(p.name.clone()),
                Span::styled(format!("  {} flags", p.flag_count), Style::default().fg(Color::DarkGray)),
            ]))
        })
        .collect();
    let empty = items.is_empty();
    let selected_id = app.selected_preset().map(|p| p.id);

    if empty {
        let text = if app.presets.is_empty() {
            "  No presets yet. Press n to create one."
        } else {
            "  No presets match the filter."
        };
        let p = Paragraph::new(Span::styled(text, Style::default().fg(Color::DarkGray)))
            .block(panel(&title, app.filtering));
        f.render_widget(p, cols[0]);
    } else {
        let list = highlighted_list(items, panel(&title, app.filtering));
        f.render_stateful_widget(list, cols[0], &mut app.preset_list_state);
    }

    let Some(preset) = selected_id.and_then(|id| app.ctx.db.preset(id).ok()) else {
        let p = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "  Presets store aider flags so a session starts with one key.",
                Style::default().fg(Color::Gray),
            )),
        ])
        .block(panel("Details", false))
        .wrap(Wrap { trim: false });
        f.render_widget(p, cols[1]);
        return;
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(5)])
        .split(cols[1]);

    let mut lines = vec![
        Line::from(""),
        Line::from(vec![
            label("Name"),
            Span::styled(preset.name.clone(), Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        ]),
        Line::from(vec![label("Description"), Span::raw(preset.description.clone())]),
    ];
    if let Some(provider) = &preset.provider {
        lines.push(Line::from(vec![label("Provider"), Span::raw(provider.clone())]));
    }
    if let Some(endpoint) = &preset.endpoint {
        lines.push(Line::from(vec![label("Endpoint"), Span::raw(endpoint.clone())]));
    }
    if let Some(updated) = preset.updated_at {
        lines.push(Line::from(vec![
            label("Updated"),
            Span::styled(updated.format("%Y-%m-%d %H:%M").to_string(), Style::default().fg(Color::Gray)),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("  Flags", Style::default().fg(Color::DarkGray))));
    if preset.flags.is_empty() {
        lines.push(Line::from(Span::styled("    (none)", Style::default().fg(Color::DarkGray))));
    }
    for (name, value) in &preset.flags {
        lines.push(Line::from(Span::styled(
            format!("    {}", flag_display(name, value)),
            Style::default().fg(Color::White),
        )));
    }
    let details = Paragraph::new(lines).block(panel("Details", false)).wrap(Wrap { trim: false });
    f.render_widget(details, rows[0]);

    let command = CommandBuilder::new()
        .with_database(&app.ctx.db)
        .with_providers(&app.ctx.providers)
        .build(&preset);
    match command {
        Ok(command) => f.render_widget(command_paragraph(&command, "Command"), rows[1]),
        Err(e) => {
            let p = Paragraph::new(Span::styled(e.to_string(), Style::default().fg(Color::Red)))
                .block(panel("Command", false))
                .wrap(Wrap { trim: false });
            f.render_widget(p, rows[1]);
        }
    }
}

// ── Preview ───────────────────────────────────────────────────────────────────

fn draw_preview(f: &mut Frame, area: Rect, app: &App) {
    let Some(preview) = &app.preview else { return };
    let mut lines = vec![
        Line::from(""),
        Line::from(vec![
            label("Preset"),
            Span::styled(preview.preset.name.clone(), Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        ]),
        Line::from(""),
        Line::from(Span::styled("  Command", Style::default().fg(Color::DarkGray))),
        Line::from(Span::styled(
            format!("    {}", preview.command.to_shell_string()),
            Style::default().fg(Color::Green),
        )),
        Line::from(""),
    ];
    let env = preview.env_names();
    if !env.is_empty() {
        lines.push(Line::from(vec![
            label("Environment"),
            Span::styled(env.join(", "), Style::default().fg(Color::White)),
        ]));
    }
    if !preview.installed {
        lines.push(Line::from(Span::styled(
            format!("  ✘ '{}' was not found on PATH", preview.command.program),
            Style::default().fg(Color::Red),
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "  Launch aider with this command?",
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    )));
    let p = Paragraph::new(lines).block(panel("Launch", true)).wrap(Wrap { trim: false });
    f.render_widget(p, area);
}

// ── Wizard ────────────────────────────────────────────────────────────────────

fn draw_wizard(f: &mut Frame, area: Rect, app: &App) {
    let Some(wizard) = &app.wizard else { return };
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(22), Constraint::Min(0)])
        .split(area);

    let steps: Vec<Line> = WizardStep::ALL
        .iter()
        .map(|step| {
            let (marker, style) = if *step == wizard.step {
                ("▶", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            } else if step.number() < wizard.step.number() {
                ("✔", Style::default().fg(Color::Green))
            } else {
                (" ", Style::default().fg(Color::DarkGray))
            };
            Line::from(Span::styled(format!(" {marker} {}. {}", step.number(), step.title()), style))
        })
        .collect();
    f.render_widget(Paragraph::new(steps).block(panel("Steps", false)), cols[0]);

    let body = cols[1];
    match wizard.step {
        WizardStep::Name => {
            let rows = Layout::vertical([Constraint::Length(3), Constraint::Min(0)]).split(body);
            draw_input(f, rows[0], "Preset name", &wizard.name, true);
        }
        WizardStep::Description => {
            let rows = Layout::vertical([Constraint::Length(3), Constraint::Min(0)]).split(body);
            draw_input(f, rows[0], "Description (optional)", &wizard.description, true);
        }
        WizardStep::Categories => {
            let items: Vec<ListItem<'static>> = wizard
                .categories
                .iter()
                .zip(&wizard.selected)
                .map(|(c, on)| ListItem::new(format!("[{}] {c}", if *on { "x" } else { " " })))
                .collect();
            let mut state = ListState::default().with_selected(Some(wizard.category_cursor));
            let list = highlighted_list(items, panel("Flag categories (Space to toggle)", true));
            f.render_stateful_widget(list, body, &mut state);
        }
        WizardStep::Flags => {
            let rows = Layout::vertical([Constraint::Min(0), Constraint::Length(4)]).split(body);
            let items: Vec<ListItem<'static>> = wizard
                .flags
                .iter()
                .map(|flag| {
                    let value = match wizard.value_of(&flag.name) {
                        Some(Some(v)) => Span::styled(format!(" = {v}"), Style::default().fg(Color::Green)),
                        Some(None) => Span::styled(" (set)", Style::default().fg(Color::Green)),
                        None => Span::styled(
                            format!("  [{}]", flag.value_type),
                            Style::default().fg(Color::DarkGray),
                        ),
                    };
                    ListItem::new(Line::from(vec![Span::raw(format!("--{}", flag.name)), value]))
                })
                .collect();
            let mut state = ListState::default().with_selected(Some(wizard.flag_cursor));
            let list = highlighted_list(items, panel("Flags", wizard.editing.is_none()));
            f.render_stateful_widget(list, rows[0], &mut state);

            match (&wizard.editing, wizard.current_flag()) {
                (Some(input), Some(flag)) => {
                    draw_input(f, rows[1], &format!("Value for --{}", flag.name), input, true)
                }
                (None, Some(flag)) => {
                    let p = Paragraph::new(Span::styled(flag.description.clone(), Style::default().fg(Color::Gray)))
                        .block(panel("About", false))
                        .wrap(Wrap { trim: true });
                    f.render_widget(p, rows[1]);
                }
                _ => {}
            }
        }
        WizardStep::Backend => {
            let items: Vec<ListItem<'static>> =
                wizard.backends.iter().map(|b| ListItem::new(b.label())).collect();
            let mut state = ListState::default().with_selected(Some(wizard.backend_cursor));
            let list = highlighted_list(items, panel("Provider or endpoint", true));
            f.render_stateful_widget(list, body, &mut state);
        }
        WizardStep::Review => {
            let rows = Layout::vertical([Constraint::Min(0), Constraint::Length(5)]).split(body);
            let preset = wizard.preset();
            let mut lines = vec![
                Line::from(""),
                Line::from(vec![label("Name"), Span::styled(preset.name.clone(), Style::default().fg(Color::Cyan))]),
                Line::from(vec![label("Description"), Span::raw(preset.description.clone())]),
                Line::from(vec![label("Backend"), Span::raw(wizard.backend().label())]),
                Line::from(vec![label("Flags"), Span::raw(preset.flags.len().to_string())]),
            ];
            for (name, value) in &preset.flags {
                lines.push(Line::from(format!("    {}", flag_display(name, value))));
            }
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "  Press Enter to save the preset.",
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            )));
            f.render_widget(Paragraph::new(lines).block(panel("Review", true)), rows[0]);
            f.render_widget(command_paragraph(&wizard.command_preview(), "Command"), rows[1]);
        }
    }
}

// ── Editor ────────────────────────────────────────────────────────────────────

fn draw_editor(f: &mut Frame, area: Rect, app: &App) {
    let Some(editor) = &app.editor else { return };
    let rows = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Min(4),
        Constraint::Length(3),
        Constraint::Length(4),
    ])
    .split(area);

    draw_input(f, rows[0], "Name", &editor.name, editor.focus == EditorFocus::Name);
    draw_input(f, rows[1], "Description", &editor.description, editor.focus == EditorFocus::Description);

    let items: Vec<ListItem<'static>> = editor
        .preset
        .flags
        .iter()
        .map(|(name, value)| {
            let known = app.ctx.flags.flag(name).is_some();
            let style = if known { Style::default() } else { Style::default().fg(Color::Magenta) };
            ListItem::new(Span::styled(flag_display(name, value), style))
        })
        .collect();
    let flags_focused = editor.focus == EditorFocus::Flags;
    let title = format!("Flags ({})", editor.preset.flags.len());
    if items.is_empty() {
        let p = Paragraph::new(Span::styled("  No flags. Press a to add one.", Style::default().fg(Color::DarkGray)))
            .block(panel(&title, flags_focused));
        f.render_widget(p, rows[2]);
    } else {
        let mut state = ListState::default().with_selected(flags_focused.then_some(editor.flag_cursor));
        f.render_stateful_widget(highlighted_list(items, panel(&title, flags_focused)), rows[2], &mut state);
    }

    let backend_focused = editor.focus == EditorFocus::Backend;
    let backend = Paragraph::new(Line::from(vec![
        Span::styled(if backend_focused { " ◀ " } else { "   " }, Style::default().fg(Color::Yellow)),
        Span::raw(editor.backend().label()),
        Span::styled(if backend_focused { " ▶" } else { "" }, Style::default().fg(Color::Yellow)),
    ]))
    .block(panel("Backend", backend_focused));
    f.render_widget(backend, rows[3]);

    let command = CommandBuilder::new()
        .with_database(&app.ctx.db)
        .with_providers(&app.ctx.providers)
        .build(&editor.to_preset());
    match command {
        Ok(command) => f.render_widget(command_paragraph(&command, "Command"), rows[4]),
        Err(e) => {
            let p = Paragraph::new(Span::styled(e.to_string(), Style::default().fg(Color::Red)))
                .block(panel("Command", false));
            f.render_widget(p, rows[4]);
        }
    }

    if let Some(input) = &editor.editing {
        let popup = centered_rect(60, 3, area);
        f.render_widget(Clear, popup);
        let title = format!("Value for --{}", editor.current_flag().unwrap_or_default());
        draw_input(f, popup, &title, input, true);
    }

    if let Some(picker) = &editor.picker {
        let popup = centered_rect(60, 16, area);
        f.render_widget(Clear, popup);
        let parts = Layout::vertical([Constraint::Length(3), Constraint::Min(0)]).split(popup);
        draw_input(f, parts[0], "Add flag", &picker.query, true);
        let items: Vec<ListItem<'static>> = editor
            .picker_candidates(&app.ctx.flags)
            .into_iter()
            .map(|name| {
                let detail = app
                    .ctx
                    .flags
                    .flag(&name)
                    .map(|f| format!("  {}", f.category))
                    .unwrap_or_else(|| "  custom".to_string());
                ListItem::new(Line::from(vec![
                    Span::raw(format!("--{name}")),
                    Span::styled(detail, Style::default().fg(Color::DarkGray)),
                ]))
            })
            .collect();
        let mut state = ListState::default().with_selected(Some(picker.cursor));
        let block = panel("Matches", false).style(Style::default().bg(BG));
        f.render_stateful_widget(highlighted_list(items, block), parts[1], &mut state);
    }
}

// ── Advanced settings ─────────────────────────────────────────────────────────

fn draw_advanced(f: &mut Frame, area: Rect, app: &mut App) {
    let Some(advanced) = app.advanced.as_mut() else { return };
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    let title = format!("Models of '{}'", advanced.preset_name);
    if advanced.models.is_empty() {
        let p = Paragraph::new(Span::styled(
            "  No model settings. Press n to add some.",
            Style::default().fg(Color::DarkGray),
        ))
        .block(panel(&title, true));
        f.render_widget(p, cols[0]);
    } else {
        let items: Vec<ListItem<'static>> = advanced
            .models
            .iter()
            .map(|m| {
                let tag = |on: bool, name: &str| {
                    Span::styled(
                        format!("  {}{name}", if on { "✔ " } else { "✘ " }),
                        Style::default().fg(if on { Color::Green } else { Color::DarkGray }),
                    )
                };
                ListItem::new(Line::from(vec![
                    Span::raw(m.name.clone()),
                    tag(m.has_settings, "settings"),
                    tag(m.has_metadata, "metadata"),
                ]))
            })
            .collect();
        f.render_stateful_widget(highlighted_list(items, panel(&title, true)), cols[0], &mut advanced.list_state);
    }

    let lines = match advanced.selected() {
        Some(m) => vec![
            Line::from(""),
            Line::from(vec![label("Model"), Span::styled(m.name.clone(), Style::default().fg(Color::Cyan))]),
            Line::from(vec![label("Settings"), Span::raw(m.settings_path.clone().unwrap_or_else(|| "-".into()))]),
            Line::from(vec![label("Metadata"), Span::raw(m.metadata_path.clone().unwrap_or_else(|| "-".into()))]),
        ],
        None => vec![
            Line::from(""),
            Line::from(Span::styled(
                "  Settings and metadata are passed to aider with",
                Style::default().fg(Color::Gray),
            )),
            Line::from(Span::styled(
                "  --model-settings-file and --model-metadata-file.",
                Style::default().fg(Color::Gray),
            )),
        ],
    };
    f.render_widget(Paragraph::new(lines).block(panel("Files", false)).wrap(Wrap { trim: false }), cols[1]);
}

fn draw_model_editor(f: &mut Frame, area: Rect, app: &App) {
    let Some(editor) = &app.model_editor else { return };
    let rows = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Percentage(45),
        Constraint::Length(3),
        Constraint::Min(4),
    ])
    .split(area);
    for (field, rect) in ModelField::ALL.iter().zip(rows.iter()) {
        let focused = editor.focus == *field;
        let mut title = field.label().to_string();
        if *field == ModelField::Settings {
            if let Some(t) = editor.template_cursor.and_then(|i| editor.templates.get(i)) {
                title.push_str(&format!("  [template: {}]", t.name));
            }
        }
        if field.is_multiline() {
            draw_textarea(f, *rect, &title, editor.field(*field), focused);
        } else {
            draw_input(f, *rect, &title, editor.field(*field), focused);
        }
    }
}

// ── Providers ─────────────────────────────────────────────────────────────────

fn draw_providers(f: &mut Frame, area: Rect, app: &mut App) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    let items: Vec<ListItem<'static>> = app
        .providers
        .rows
        .iter()
        .map(|row| {
            ListItem::new(Line::from(vec![
                Span::styled(format!("{:<9}", row.kind()), Style::default().fg(Color::DarkGray)),
                Span::raw(row.backend.name().to_string()),
                Span::styled(
                    if row.has_key { "  ✔ key" } else { "" },
                    Style::default().fg(Color::Yellow),
                ),
            ]))
        })
        .collect();
    let title = format!("Backends ({})", items.len());
    f.render_stateful_widget(
        highlighted_list(items, panel(&title, app.screen == Screen::Providers)),
        cols[0],
        &mut app.providers.list_state,
    );

    let Some(row) = app.providers.selected() else {
        let p = Paragraph::new(Span::styled(
            "  No providers configured. Press P to add one.",
            Style::default().fg(Color::DarkGray),
        ))
        .block(panel("Details", false));
        f.render_widget(p, cols[1]);
        return;
    };
    let models = match &row.backend {
        crate::providers::Backend::Provider(n) => app.ctx.providers.provider_models(n).map(<[String]>::to_vec),
        crate::providers::Backend::Endpoint(n) => app.ctx.providers.endpoint_models(n).map(<[String]>::to_vec),
    }
    .unwrap_or_default();
    let mut lines = vec![
        Line::from(""),
        Line::from(vec![
            label("Name"),
            Span::styled(row.backend.name().to_string(), Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        ]),
        Line::from(vec![label("Type"), Span::raw(row.kind())]),
        Line::from(vec![label("API URL"), Span::styled(row.api_url.clone(), Style::default().fg(Color::Green))]),
        Line::from(vec![label("Description"), Span::raw(row.description.clone())]),
        Line::from(vec![
            label("API key"),
            if row.has_key {
                Span::styled("stored in keyring", Style::default().fg(Color::Green))
            } else {
                Span::styled("not set", Style::default().fg(Color::Red))
            },
        ]),
        Line::from(""),
        Line::from(Span::styled(format!("  Models ({})", row.model_count), Style::default().fg(Color::DarkGray))),
    ];
    for model in models {
        lines.push(Line::from(format!("    {model}")));
    }
    f.render_widget(Paragraph::new(lines).block(panel("Details", false)).wrap(Wrap { trim: false }), cols[1]);
}

fn draw_provider_form(f: &mut Frame, area: Rect, app: &App) {
    let Some(form) = &app.provider_form else { return };
    let labels = form.labels();
    let popup = centered_rect(60, labels.len() as u16 * 3 + 2, area);
    f.render_widget(Clear, popup);
    let block = panel(&form.title(), true).style(Style::default().bg(BG));
    let inner = block.inner(popup);
    f.render_widget(block, popup);

    let rows = Layout::vertical(labels.iter().map(|_| Constraint::Length(3))).split(inner);
    for (i, (title, rect)) in labels.iter().zip(rows.iter()).enumerate() {
        let Some(input) = form.field(i) else { continue };
        let focused = form.focus == i;
        let mut title = title.to_string();
        if title == "Models" {
            title.push_str(" (comma separated)");
        }
        if matches!(form.mode, FormMode::Add(_)) && form.is_secret(i) {
            title.push_str(" (optional)");
        }
        let p = Paragraph::new(input_lines(input, focused, form.is_secret(i))).block(panel(&title, focused));
        f.render_widget(p, *rect);
    }
}

// ── Wizard flags ──────────────────────────────────────────────────────────────

fn draw_wizard_flags(f: &mut Frame, area: Rect, app: &mut App) {
    let items: Vec<ListItem<'static>> = app
        .ctx
        .flags
        .all_flags()
        .iter()
        .map(|flag| {
            let mark = if flag.wizard_visible { "[x]" } else { "[ ]" };
            let mut spans = vec![
                Span::raw(format!("{mark} --{:<28}", flag.name)),
                Span::styled(format!("{:<14}", flag.category), Style::default().fg(Color::DarkGray)),
                Span::styled(flag.description.clone(), Style::default().fg(Color::Gray)),
            ];
            if flag.is_deprecated {
                spans.push(Span::styled("  (deprecated)", Style::default().fg(Color::Red)));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();
    let list = highlighted_list(items, panel("Flags offered by the wizard", true));
    f.render_stateful_widget(list, area, &mut app.wizard_flags_state);
}

// ── Dialogs ───────────────────────────────────────────────────────────────────

fn draw_dialog(f: &mut Frame, area: Rect, dialog: &Dialog) {
    let (title, body, color, hint) = match dialog {
        Dialog::Message { title, body, is_error } => (
            title,
            body,
            if *is_error { Color::Red } else { Color::Cyan },
            "Enter OK",
        ),
        Dialog::Confirm { title, body, .. } => (title, body, Color::Yellow, "y Yes   n No"),
    };
    let popup = centered_rect(60, 8, area);
    f.render_widget(Clear, popup);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(format!(" {body}"), Style::default().fg(Color::White))),
        Line::from(""),
        Line::from(Span::styled(format!(" {hint}"), Style::default().fg(Color::DarkGray))),
    ];
    let p = Paragraph::new(lines)
        .block(
            Block::default()
                .title(format!(" {title} "))
                .title_style(Style::default().fg(color).add_modifier(Modifier::BOLD))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color))
                .style(Style::default().bg(BG)),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(p, popup);
}

// ── Test helpers ──────────────────────────────────────────────────────────────

/// Render the current app state into an in-memory buffer using `TestBackend`.
/// Useful for unit tests that need to assert on rendered output without a real terminal.
pub fn render_to_buffer(app: &mut App, width: u16, height: u16) -> Buffer {
    let backend = TestBackend::new(width, height);
    let mut terminal = Terminal::new(backend).expect("TestBackend terminal");
    terminal.draw(|f| draw(f, app)).expect("draw");
    terminal.backend().buffer().clone()
}
