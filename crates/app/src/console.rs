use std::fmt::Write as _;

use quiz_core::model::{AnswerLists, Question, QuizOption};
use quiz_core::{FlowAction, QuizFlow};

/// One parsed line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Action(FlowAction),
    Quit,
    Help,
    Invalid(String),
}

pub const HELP: &str =
    "Type an option number to toggle it, c to continue, b to go back, q to save and quit.";

/// Map a line to an action on `question`. Option numbers are 1-based over the
/// options shown for the question's kind.
pub fn parse_input(line: &str, question: &Question) -> Input {
    let trimmed = line.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "c" | "continue" => return Input::Action(FlowAction::Continue),
        "b" | "back" => return Input::Action(FlowAction::Back),
        "q" | "quit" => return Input::Quit,
        "?" | "h" | "help" => return Input::Help,
        _ => {}
    }

    let Ok(number) = trimmed.parse::<usize>() else {
        return Input::Invalid(format!("unrecognised input: {trimmed}"));
    };
    number
        .checked_sub(1)
        .and_then(|idx| question.options_matching_kind().nth(idx))
        .map_or_else(
            || Input::Invalid(format!("no option numbered {number}")),
            |option| Input::Action(FlowAction::ToggleOption(option.id().clone())),
        )
}

pub fn render_question(flow: &QuizFlow) -> String {
    let question = flow.current_question();
    let progress = flow.progress();
    let mut out = String::new();

    let _ = writeln!(
        out,
        "[{}/{}] {}",
        progress.position,
        progress.total,
        question.nav_title()
    );
    let _ = writeln!(out, "{}", question.title());
    if let Some(subtitle) = question.subtitle() {
        let _ = writeln!(out, "{subtitle}");
    }

    for (number, option) in question.options_matching_kind().enumerate() {
        let mark = if flow.is_selected(option.id().as_str()) {
            'x'
        } else {
            ' '
        };
        let _ = writeln!(out, "  {}. [{mark}] {}", number + 1, option_label(option));
    }

    if !flow.is_current_valid() {
        let _ = writeln!(out, "(select at least one option to continue)");
    }
    out
}

fn option_label(option: &QuizOption) -> String {
    match option {
        QuizOption::Text {
            title, subtitle, ..
        } => match subtitle {
            Some(subtitle) if !subtitle.is_empty() => format!("{} - {subtitle}", title.to_uppercase()),
            _ => title.to_uppercase(),
        },
        QuizOption::Image { title, asset, .. } => format!("{} ({asset})", title.to_uppercase()),
        QuizOption::Color {
            title, color_hex, ..
        } => match title {
            Some(title) => format!("{title} {color_hex}"),
            None => color_hex.clone(),
        },
    }
}

pub fn render_answers(answers: &AnswerLists) -> String {
    let mut out = String::new();
    for (question, options) in answers {
        let ids: Vec<&str> = options.iter().map(|o| o.as_str()).collect();
        let _ = writeln!(out, "  {question}: {}", ids.join(", "));
    }
    out
}
