// The quiz in a terminal.

use crate::metawahl::*;

use std::io::{BufRead, Write};

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
enum Reply {
    Answer(Choice),
    Quit,
}

fn parse_reply(line: &str) -> Option<Reply> {
    match line.trim().to_lowercase().as_str() {
        "p" | "pro" | "y" | "yes" => Some(Reply::Answer(Choice::Pro)),
        "c" | "contra" | "n" | "no" => Some(Reply::Answer(Choice::Contra)),
        "q" | "quit" => Some(Reply::Quit),
        _ => None,
    }
}

/// Asks until the reply is usable. `None` when the visitor quits or the input ends.
fn read_choice<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> AppResult<Option<Choice>> {
    loop {
        write!(out, "Pro or contra? [p/c, q to quit] ").context(TerminalSnafu {})?;
        out.flush().context(TerminalSnafu {})?;
        let mut line = String::new();
        if input.read_line(&mut line).context(TerminalSnafu {})? == 0 {
            return Ok(None);
        }
        match parse_reply(&line) {
            Some(Reply::Answer(c)) => return Ok(Some(c)),
            Some(Reply::Quit) => return Ok(None),
            None => writeln!(out, "Please answer p (pro) or c (contra).")
                .context(TerminalSnafu {})?,
        }
    }
}

fn majority_line(opinion: &ThesisOpinion) -> String {
    match (opinion.verdict, opinion.majority_share()) {
        (Stance::Pro, Some(share)) => format!(
            "The majority is pro: {:.1}% of the votes went to parties in favor.",
            share
        ),
        (Stance::Contra, Some(share)) => format!(
            "The majority is contra: {:.1}% of the votes went to parties against it.",
            share
        ),
        _ => format!(
            "There is no majority: {:.1}% pro, {:.1}% contra.",
            opinion.ratio_pro, opinion.ratio_contra
        ),
    }
}

/// Runs the session until it is complete or the visitor quits, then prints the score.
pub fn run_quiz<B: QuizBackend, R: BufRead, W: Write>(
    session: &mut QuizSession<B>,
    mut input: R,
    mut out: W,
) -> AppResult<()> {
    if let Some(e) = session.error() {
        writeln!(out, "Warning: the election could not be loaded: {}", e)
            .context(TerminalSnafu {})?;
    }
    if let Some(info) = session.election() {
        let date = info.date.as_deref().unwrap_or("unknown date");
        writeln!(out, "{} ({}, {})", info.title, info.territory, date).context(TerminalSnafu {})?;
        if info.preliminary {
            writeln!(out, "The results are preliminary.").context(TerminalSnafu {})?;
        }
    }
    let total = session.questions().len();
    if total == 0 {
        writeln!(out, "There are no questions for this election.").context(TerminalSnafu {})?;
        return Ok(());
    }

    while session.state() == SessionState::Active {
        let (text, title, opinion) = match session.current_question() {
            Some(q) => (q.thesis.text.clone(), q.thesis.title.clone(), q.opinion),
            None => break,
        };
        writeln!(out).context(TerminalSnafu {})?;
        let header = match title {
            Some(title) => format!("[{}/{}] {}", session.current_index() + 1, total, title),
            None => format!("[{}/{}]", session.current_index() + 1, total),
        };
        writeln!(out, "{}", header).context(TerminalSnafu {})?;
        writeln!(out, "{}", text).context(TerminalSnafu {})?;

        let choice = match read_choice(&mut input, &mut out)? {
            Some(c) => c,
            None => {
                writeln!(out, "Quiz stopped.").context(TerminalSnafu {})?;
                break;
            }
        };
        let res = whatever!(
            session.answer(choice),
            "The quiz did not accept the answer"
        );
        let verdict_line = if res.correct { "Correct." } else { "Wrong." };
        writeln!(out, "{} {}", verdict_line, majority_line(&opinion)).context(TerminalSnafu {})?;
        if let Some(ratio) = res.community_ratio {
            writeln!(out, "{:.0}% of the other visitors got this right.", ratio * 100.0)
                .context(TerminalSnafu {})?;
        }
        whatever!(session.advance(), "The quiz could not move on");
    }

    writeln!(out).context(TerminalSnafu {})?;
    let score_line = match session.score() {
        Score::Indeterminate => "No question was answered.".to_string(),
        Score::Ratio(r) => {
            let correct = session.answers().iter().filter(|a| a.correct).count();
            format!(
                "You got {} of {} answers right ({:.0}%).",
                correct,
                session.answers().len(),
                r * 100.0
            )
        }
    };
    writeln!(out, "{}", score_line).context(TerminalSnafu {})?;
    Ok(())
}
