//! Raw-mode terminal front end. Every key press becomes a message: on the
//! today view keystrokes edit the note, elsewhere they drive the view.

use std::fmt::Write as _;
use std::io::{self, Write as _};
use std::time::Duration;

use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{self, ClearType};
use crossterm::{cursor, execute};
use futures::StreamExt;

use daynote::application::App;
use daynote::core::reminder::Reminder;
use daynote::message::{AiLogMessage, Message, NoteMessage, ReminderMessage, View};
use daynote::navigation::{Key, KeyPress, Modifiers};
use daynote::runtime::Runtime;

/// How long quitting waits for a final save to land.
const QUIT_GRACE: Duration = Duration::from_secs(10);

/// Header date, e.g. "Sunday, June 01, 2025".
const HEADER_DATE_FORMAT: &str = "%A, %B %d, %Y";

/// Highlighted rows in the list views. Console-local; the app's selection
/// only exists on the today view.
#[derive(Debug, Default)]
struct ListCursor {
    reminders: usize,
    logs: usize,
}

enum Outcome {
    Dispatch(Message),
    Moved,
    Quit,
    Ignored,
}

fn is_command(modifiers: KeyModifiers) -> bool {
    modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::SUPER)
}

/// Unresolved first, then resolved, as drawn on the reminders view.
fn reminder_rows(app: &App) -> Vec<(i64, bool)> {
    let store = app.reminders();
    store
        .filtered_unresolved()
        .iter()
        .map(|r| (r.id, false))
        .chain(store.filtered_resolved().iter().map(|r| (r.id, true)))
        .collect()
}

fn step(index: &mut usize, len: usize, code: KeyCode) -> bool {
    let last = len.saturating_sub(1);
    *index = (*index).min(last);
    match code {
        KeyCode::Up => *index = index.saturating_sub(1),
        KeyCode::Down => *index = (*index + 1).min(last),
        _ => return false,
    }
    true
}

fn translate(app: &App, list: &mut ListCursor, event: KeyEvent) -> Outcome {
    let KeyEvent { code, modifiers, kind, .. } = event;
    if kind != KeyEventKind::Press {
        return Outcome::Ignored;
    }

    if is_command(modifiers) {
        return match code {
            KeyCode::Char('c') | KeyCode::Char('q') => Outcome::Quit,
            KeyCode::Char(c) => Outcome::Dispatch(Message::Key(KeyPress::new(
                Key::Char(c),
                Modifiers {
                    command: true,
                    shift: modifiers.contains(KeyModifiers::SHIFT) || c.is_ascii_uppercase(),
                },
            ))),
            _ => Outcome::Ignored,
        };
    }
    if code == KeyCode::Esc {
        return Outcome::Dispatch(Message::Key(KeyPress::plain(Key::Escape)));
    }

    match app.view() {
        View::Today => {
            if app.selection().is_some() {
                return match code {
                    KeyCode::Char(c) => Outcome::Dispatch(Message::Key(KeyPress::plain(Key::Char(c)))),
                    _ => Outcome::Ignored,
                };
            }
            let mut text = app.note().text().to_string();
            match code {
                KeyCode::Enter if modifiers.contains(KeyModifiers::SHIFT) => text.push('\n'),
                KeyCode::Enter => return Outcome::Dispatch(Message::Key(KeyPress::plain(Key::Enter))),
                KeyCode::Char(c) => text.push(c),
                KeyCode::Backspace => {
                    if text.pop().is_none() {
                        return Outcome::Ignored;
                    }
                }
                _ => return Outcome::Ignored,
            }
            Outcome::Dispatch(Message::Note(NoteMessage::Edited(text)))
        }

        View::History => Outcome::Ignored,

        View::Reminders => {
            let rows = reminder_rows(app);
            if step(&mut list.reminders, rows.len(), code) {
                return Outcome::Moved;
            }
            let current = rows.get(list.reminders).copied();
            let mut search = app.reminders().search().to_string();
            let message = match (code, current) {
                (KeyCode::Tab, _) => ReminderMessage::ToggleResolved,
                (KeyCode::Enter, Some((id, true))) => ReminderMessage::Unresolve(id),
                (KeyCode::Enter, Some((id, false))) => ReminderMessage::Resolve(id),
                (KeyCode::Delete, Some((id, resolved))) => ReminderMessage::Delete { id, resolved },
                (KeyCode::Char(c), _) => {
                    search.push(c);
                    ReminderMessage::SearchChanged(search)
                }
                (KeyCode::Backspace, _) => {
                    if search.pop().is_none() {
                        return Outcome::Ignored;
                    }
                    ReminderMessage::SearchChanged(search)
                }
                _ => return Outcome::Ignored,
            };
            Outcome::Dispatch(Message::Reminder(message))
        }

        View::AiLogs => {
            let entries = app.ai_logs().entries();
            if step(&mut list.logs, entries.len(), code) {
                return Outcome::Moved;
            }
            match code {
                KeyCode::Delete if modifiers.contains(KeyModifiers::SHIFT) => {
                    Outcome::Dispatch(Message::AiLog(AiLogMessage::DeleteAll))
                }
                KeyCode::Delete => match entries.get(list.logs) {
                    Some(entry) => Outcome::Dispatch(Message::AiLog(AiLogMessage::Delete(entry.id))),
                    None => Outcome::Ignored,
                },
                _ => Outcome::Ignored,
            }
        }
    }
}

fn footer(view: View) -> &'static str {
    match view {
        View::Today => "type to edit · enter save · shift+enter newline · ctrl+r reminders · j/k/r/esc",
        View::History => "ctrl+t today · ctrl+r reminders · ctrl+l logs",
        View::Reminders => "type to search · tab resolved · enter (un)resolve · del delete",
        View::AiLogs => "↑/↓ move · del delete · shift+del delete all",
    }
}

fn render(app: &App, list: &ListCursor) -> String {
    let mut out = String::new();
    for view in View::ALL {
        if *view == app.view() {
            let _ = write!(out, "[{}] ", view.title());
        } else {
            let _ = write!(out, " {}  ", view.title());
        }
    }
    let date = app
        .note()
        .date()
        .map(|d| d.format(HEADER_DATE_FORMAT).to_string())
        .unwrap_or_else(|| "…".into());
    let _ = write!(out, "· {}", date);
    if let Some(message) = &app.status().message {
        let _ = write!(out, "  [{}]", message);
    }
    out.push('\n');

    match app.view() {
        View::Today => {
            out.push_str(app.note().text());
            out.push_str("▏\n-- open reminders --\n");
            for (i, r) in app.reminders().unresolved().iter().enumerate() {
                let marker = if app.selection() == Some(i) { '>' } else { ' ' };
                let _ = writeln!(out, "{} {}", marker, r.text);
            }
        }
        View::History => {
            for note in app.note().history() {
                let _ = writeln!(out, "{}  {}", note.for_date, note.preview(60));
            }
        }
        View::Reminders => {
            let store = app.reminders();
            let _ = writeln!(out, "search: {}", store.search());
            let unresolved = store.filtered_unresolved();
            let resolved = store.filtered_resolved();
            let rows = unresolved
                .iter()
                .map(|r| (r, ' '))
                .chain(resolved.iter().map(|r| (r, 'x')));
            for (i, (r, check)) in rows.enumerate() {
                let marker = if i == list.reminders { '>' } else { ' ' };
                let _ = writeln!(out, "{} [{}] {}{}", marker, check, r.text, details(r));
            }
        }
        View::AiLogs => {
            for (i, entry) in app.ai_logs().entries().iter().enumerate() {
                let marker = if i == list.logs { '>' } else { ' ' };
                let mark = if entry.success { "ok" } else { "failed" };
                let when = entry
                    .timestamp()
                    .map(|t| t.format("%b %-d %H:%M").to_string())
                    .unwrap_or_else(|| entry.created_at.clone());
                let _ = writeln!(
                    out,
                    "{} {} {} · {} reminder(s) · {}",
                    marker, when, mark, entry.reminders_created, entry.reasoning
                );
            }
        }
    }
    let _ = write!(out, "\n{} · ctrl+q quit", footer(app.view()));
    out
}

fn details(r: &Reminder) -> String {
    let mut out = String::new();
    let tags = r.tag_list();
    if !tags.is_empty() {
        let _ = write!(out, " #{}", tags.join(" #"));
    }
    if let Some(due) = &r.due_date {
        let _ = write!(out, " (due {})", due);
    }
    out
}

fn draw(stdout: &mut io::Stdout, frame: &str) -> io::Result<()> {
    execute!(stdout, terminal::Clear(ClearType::All), cursor::MoveTo(0, 0))?;
    // Raw mode: no implicit carriage return.
    for line in frame.lines() {
        write!(stdout, "{}\r\n", line)?;
    }
    stdout.flush()
}

async fn event_loop(runtime: &mut Runtime) -> io::Result<()> {
    let mut stdout = io::stdout();
    let mut events = EventStream::new();
    let mut list = ListCursor::default();
    let mut shown = String::new();

    loop {
        let frame = render(runtime.app(), &list);
        if frame != shown {
            draw(&mut stdout, &frame)?;
            shown = frame;
        }

        tokio::select! {
            maybe_event = events.next() => {
                let Some(event) = maybe_event else {
                    break;
                };
                let Event::Key(key) = event? else {
                    continue;
                };
                match translate(runtime.app(), &mut list, key) {
                    Outcome::Dispatch(message) => runtime.dispatch(message),
                    Outcome::Quit => break,
                    Outcome::Moved | Outcome::Ignored => {}
                }
            }
            _ = runtime.step() => {}
        }
    }
    Ok(())
}

/// Commit pending edits and wait for any save still in flight.
async fn finish(runtime: &mut Runtime) {
    if runtime.app().note().has_unsaved_edits() {
        log::info!("Saving pending edits before exit");
        runtime.dispatch(Message::Note(NoteMessage::SaveNow));
    }
    if !runtime.app().status().is_busy() {
        return;
    }
    let flushed = tokio::time::timeout(QUIT_GRACE, async {
        while runtime.app().status().is_busy() {
            if !runtime.step().await {
                break;
            }
        }
    })
    .await;
    if flushed.is_err() {
        log::warn!("Exiting before the final save finished");
    }
}

pub async fn run(mut runtime: Runtime) -> io::Result<()> {
    terminal::enable_raw_mode()?;
    let result = event_loop(&mut runtime).await;
    let _ = terminal::disable_raw_mode();
    println!();
    finish(&mut runtime).await;
    result
}
