//! UI rendering using ratatui
//!
//! One render function per [`Screen`]. Only the card screen ever shows a
//! role or a word, and only the one belonging to the player holding the
//! device; every other screen is safe for the whole table to see.

use crate::app::{AppCoordinator, Screen, SetupField};
use crate::game::round::GuessVerdict;
use crate::game::{Faction, Player, Role};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};

/// Render the screen for the current session state
pub fn render(frame: &mut Frame, app: &AppCoordinator) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(8),    // Screen body
            Constraint::Length(1), // Notice
            Constraint::Length(1), // Key help
        ])
        .split(frame.area());

    render_header(frame, layout[0], app);

    let help = match app.screen() {
        Screen::Setup => {
            render_setup(frame, layout[1], app);
            "Tab Next field  Enter Add/Start  ↑↓ Adjust  F2 Random words  Esc Quit"
        }
        Screen::Handover => {
            render_handover(frame, layout[1], app);
            "Enter Show my card"
        }
        Screen::Card => {
            render_card(frame, layout[1], app);
            "Enter Hide my card"
        }
        Screen::Clue => {
            render_clues(frame, layout[1], app);
            "Enter Start the vote"
        }
        Screen::Voting => {
            render_vote(frame, layout[1], app);
            "↑↓ Select  Enter Eliminate  Esc Back to clues"
        }
        Screen::Guess => {
            render_guess(frame, layout[1], app);
            "Enter Submit guess / continue"
        }
        Screen::GameOver => {
            render_game_over(frame, layout[1], app);
            "Enter Play again  Esc New game"
        }
    };

    if let Some(notice) = &app.notice {
        let notice = Paragraph::new(notice.as_str())
            .style(Style::default().fg(Color::Yellow))
            .alignment(Alignment::Center);
        frame.render_widget(notice, layout[2]);
    }

    let footer = Paragraph::new(help)
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    frame.render_widget(footer, layout[3]);
}

fn render_header(frame: &mut Frame, area: Rect, app: &AppCoordinator) {
    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let header_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(14), Constraint::Min(10)])
        .split(inner);

    let logo = Paragraph::new("UNDERCOVER")
        .style(Style::default().fg(Color::Magenta).bold())
        .alignment(Alignment::Left);
    frame.render_widget(logo, header_layout[0]);

    let status = match (app.session.reveal(), app.session.round()) {
        (Some(seq), _) => match seq.progress() {
            Some((n, total)) => format!("Reveal {}/{}", n, total),
            None => "Reveal done".to_string(),
        },
        (_, Some(engine)) if !engine.is_over() => format!(
            "Round {}  |  {} players left",
            engine.round_number(),
            engine.active_players().len()
        ),
        (_, Some(_)) => "Game over".to_string(),
        _ => format!("Setup  |  {} players", app.setup.names.len()),
    };
    let status = Paragraph::new(status)
        .style(Style::default().fg(Color::Cyan))
        .alignment(Alignment::Right);
    frame.render_widget(status, header_layout[1]);
}

fn render_setup(frame: &mut Frame, area: Rect, app: &AppCoordinator) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .margin(1)
        .split(area);

    let form = &app.setup;
    let mut items: Vec<ListItem> = form
        .names
        .iter()
        .enumerate()
        .map(|(i, name)| ListItem::new(format!("{:>2}. {}", i + 1, name)))
        .collect();
    let name_focused = form.focus == SetupField::Name;
    items.push(
        ListItem::new(format!("  + {}{}", form.name_input, if name_focused { "_" } else { "" }))
            .style(focus_style(name_focused)),
    );
    let players = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("Players ({})", form.names.len())),
    );
    frame.render_widget(players, columns[0]);

    let rows: Vec<ListItem> = SetupField::all()
        .iter()
        .filter(|f| **f != SetupField::Name)
        .map(|field| {
            let focused = form.focus == *field;
            let value = match field {
                SetupField::MrWhite => form.config.mr_white_count.to_string(),
                SetupField::Undercover => form.config.undercover_count.to_string(),
                SetupField::CommonWord => form.common_word.clone(),
                SetupField::UndercoverWord => form.undercover_word.clone(),
                SetupField::Name => String::new(),
            };
            let prefix = if focused { "> " } else { "  " };
            ListItem::new(format!("{}{:<16} {}", prefix, field.label(), value)).style(focus_style(focused))
        })
        .collect();
    let settings = List::new(rows).block(Block::default().borders(Borders::ALL).title("Match"));
    frame.render_widget(settings, columns[1]);
}

fn render_handover(frame: &mut Frame, area: Rect, app: &AppCoordinator) {
    let Some(seq) = app.session.reveal() else {
        return;
    };
    let layout = centered_rows(area, 5);

    if let Some(announcement) = seq.announcement() {
        let text = Paragraph::new(announcement)
            .style(Style::default().fg(Color::Green).bold())
            .alignment(Alignment::Center);
        frame.render_widget(text, layout[0]);
    }

    let name = seq
        .current_player()
        .map(|p| display_name(seq.roster(), p))
        .unwrap_or_default();
    let pass = Paragraph::new(format!("Pass the device to {}", name))
        .style(Style::default().fg(Color::Yellow).bold())
        .alignment(Alignment::Center);
    frame.render_widget(pass, layout[2]);

    let hint = Paragraph::new(format!("Press ENTER when only {} can see the screen", name))
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    frame.render_widget(hint, layout[4]);
}

fn render_card(frame: &mut Frame, area: Rect, app: &AppCoordinator) {
    let Some(card) = app.session.reveal().and_then(|seq| seq.revealed_card()) else {
        return;
    };
    let layout = centered_rows(area, 5);

    let name = Paragraph::new(card.name)
        .style(Style::default().fg(Color::White).bold())
        .alignment(Alignment::Center);
    frame.render_widget(name, layout[0]);

    let role = Paragraph::new(format!("You are {}", card.role.label()))
        .style(Style::default().fg(role_color(card.role)).bold())
        .alignment(Alignment::Center);
    frame.render_widget(role, layout[2]);

    let word = match card.word {
        Some(word) => format!("Your word: {}", word),
        None => "You have no word. Listen and blend in.".to_string(),
    };
    let word = Paragraph::new(word)
        .style(Style::default().fg(Color::Cyan).bold())
        .alignment(Alignment::Center);
    frame.render_widget(word, layout[4]);
}

fn render_clues(frame: &mut Frame, area: Rect, app: &AppCoordinator) {
    let Some(engine) = app.session.round() else {
        return;
    };
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .margin(1)
        .split(area);

    let order: Vec<ListItem> = engine
        .clue_order()
        .iter()
        .enumerate()
        .map(|(i, p)| ListItem::new(format!("{:>2}. {}", i + 1, display_name(engine.roster(), p))))
        .collect();
    let order = List::new(order).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Give one clue each, in this order"),
    );
    frame.render_widget(order, columns[0]);

    render_eliminated(frame, columns[1], engine.roster(), &engine.eliminated_players());
}

fn render_eliminated(frame: &mut Frame, area: Rect, roster: &[Player], players: &[&Player]) {
    let items: Vec<ListItem> = players
        .iter()
        .map(|p| {
            ListItem::new(format!("✗ {} ({})", display_name(roster, p), p.role.label()))
                .style(Style::default().fg(Color::DarkGray))
        })
        .collect();
    let list = List::new(items).block(Block::default().borders(Borders::ALL).title("Eliminated"));
    frame.render_widget(list, area);
}

fn render_vote(frame: &mut Frame, area: Rect, app: &AppCoordinator) {
    let Some(engine) = app.session.round() else {
        return;
    };
    let items: Vec<ListItem> = engine
        .candidates()
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let selected = i == app.vote_cursor;
            let prefix = if selected { "> " } else { "  " };
            ListItem::new(format!("{}{}", prefix, display_name(engine.roster(), p)))
                .style(focus_style(selected))
        })
        .collect();
    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Who gets eliminated?"),
    );
    let area = Layout::default()
        .constraints([Constraint::Min(0)])
        .margin(1)
        .split(area)[0];
    frame.render_widget(list, area);
}

fn render_guess(frame: &mut Frame, area: Rect, app: &AppCoordinator) {
    let Some(engine) = app.session.round() else {
        return;
    };
    let Some(capture) = engine.capture() else {
        return;
    };
    let layout = centered_rows(area, 7);
    let name = engine
        .player(capture.player())
        .map(|p| display_name(engine.roster(), p))
        .unwrap_or_else(|| "Mr. White".to_string());

    let title = Paragraph::new(format!("{} is Mr. White!", name))
        .style(Style::default().fg(role_color(Role::MrWhite)).bold())
        .alignment(Alignment::Center);
    frame.render_widget(title, layout[0]);

    let remaining = capture.time_remaining();
    let timer = Paragraph::new(format_timer(remaining))
        .style(Style::default().fg(timer_color(remaining)).bold())
        .alignment(Alignment::Center);
    frame.render_widget(timer, layout[2]);

    let input = match capture.guess() {
        Some(guess) if app.is_judging() || capture.verdict().is_some() => format!("Guess: {}", guess),
        _ => format!("Guess the civilian word: {}_", app.guess_input),
    };
    let input = Paragraph::new(input)
        .style(Style::default().fg(Color::White))
        .alignment(Alignment::Center);
    frame.render_widget(input, layout[4]);

    let (status, color) = match capture.verdict() {
        Some(verdict) => (verdict.message().to_string(), verdict_color(verdict)),
        None if capture.is_judging() => ("Judging...".to_string(), Color::DarkGray),
        None => (String::new(), Color::White),
    };
    let status = Paragraph::new(status)
        .style(Style::default().fg(color).bold())
        .alignment(Alignment::Center);
    frame.render_widget(status, layout[6]);
}

fn render_game_over(frame: &mut Frame, area: Rect, app: &AppCoordinator) {
    let Some(result) = app.session.round().and_then(|e| e.result()) else {
        return;
    };
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Winner
            Constraint::Length(2), // Words
            Constraint::Min(4),    // Roster
        ])
        .margin(1)
        .split(area);

    let winner = Paragraph::new(format!("{} win!", result.winning_faction.label()))
        .style(Style::default().fg(faction_color(result.winning_faction)).bold())
        .alignment(Alignment::Center);
    frame.render_widget(winner, layout[0]);

    if let Some(words) = app.session.words() {
        let words = Paragraph::new(format!(
            "Civilian word: {}   Undercover word: {}",
            words.common_word, words.undercover_word
        ))
        .style(Style::default().fg(Color::Cyan))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
        frame.render_widget(words, layout[1]);
    }

    let roster: Vec<ListItem> = result
        .final_roster
        .iter()
        .map(|p| {
            let status = if p.is_eliminated { "✗" } else { "●" };
            ListItem::new(format!(
                "{} {:<16} {:<11} {}",
                status,
                display_name(&result.final_roster, p),
                p.role.label(),
                p.word.as_deref().unwrap_or("-")
            ))
            .style(Style::default().fg(role_color(p.role)))
        })
        .collect();
    let roster = List::new(roster).block(Block::default().borders(Borders::ALL).title("Final roster"));
    frame.render_widget(roster, layout[2]);
}

/// Player name, with the seat number when another player shares it
fn display_name(roster: &[Player], player: &Player) -> String {
    let shared = roster.iter().filter(|p| p.name == player.name).count() > 1;
    match roster.iter().position(|p| p.id == player.id) {
        Some(seat) if shared => format!("{} (seat {})", player.name, seat + 1),
        _ => player.name.clone(),
    }
}

/// Evenly spaced single-line rows, vertically centred
fn centered_rows(area: Rect, rows: u16) -> Vec<Rect> {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(rows),
            Constraint::Fill(1),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Length(1); rows as usize])
        .split(outer[1])
        .to_vec()
}

fn focus_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Yellow).bold()
    } else {
        Style::default().fg(Color::White)
    }
}

fn role_color(role: Role) -> Color {
    match role {
        Role::Civilian => Color::Green,
        Role::Undercover => Color::Red,
        Role::MrWhite => Color::White,
    }
}

fn faction_color(faction: Faction) -> Color {
    match faction {
        Faction::Loyalists => Color::Green,
        Faction::Impostors => Color::Red,
        Faction::MrWhite => Color::Magenta,
    }
}

fn verdict_color(verdict: GuessVerdict) -> Color {
    match verdict {
        GuessVerdict::Correct => Color::Magenta,
        GuessVerdict::Wrong | GuessVerdict::TimedOut => Color::Red,
    }
}

fn timer_color(seconds: u32) -> Color {
    if seconds <= 5 {
        Color::Red
    } else if seconds <= 10 {
        Color::Yellow
    } else {
        Color::Green
    }
}

/// `m:ss`
fn format_timer(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
