//! `promptforge sessions` — inspect saved sessions.

use promptforge_session::{DiffPair, Session, SessionId, SessionRepository, SessionTracker};
use std::path::Path;

use super::{CmdResult, load_config, open_store};

async fn open(config_path: Option<&Path>) -> Result<(SessionRepository, SessionTracker), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;
    let repository = SessionRepository::new(open_store(&config));
    let tracker = SessionTracker::restore(repository.load_all().await?);
    Ok((repository, tracker))
}

/// Find a session by full id or unique id prefix.
pub fn resolve(tracker: &SessionTracker, raw: &str) -> Result<SessionId, String> {
    let raw = raw.trim();
    let exact = SessionId::from(raw);
    if tracker.session(&exact).is_ok() {
        return Ok(exact);
    }

    let matches: Vec<&Session> = tracker
        .sessions()
        .into_iter()
        .filter(|s| !raw.is_empty() && s.id().as_str().starts_with(raw))
        .collect();
    match matches.as_slice() {
        [one] => Ok(one.id().clone()),
        [] => Err(format!("No session matches '{raw}'")),
        many => Err(format!("'{raw}' matches {} sessions; use more characters", many.len())),
    }
}

/// First line of `text`, cut to `max` characters.
fn headline(text: &str, max: usize) -> String {
    let line = text.trim().lines().next().unwrap_or("");
    if line.chars().count() > max {
        let cut: String = line.chars().take(max).collect();
        format!("{cut}…")
    } else {
        line.to_string()
    }
}

pub async fn list(config_path: Option<&Path>) -> CmdResult {
    let (_, tracker) = open(config_path).await?;

    if tracker.is_empty() {
        println!("   No saved sessions.");
        return Ok(());
    }

    println!("🗂️  Sessions");
    println!("─────────────────────────────────────────────────────────────────");
    for session in tracker.sessions() {
        println!(
            "  {:.8}  {:<32} {:>3} iterations  {}",
            session.id().as_str(),
            headline(session.name(), 32),
            session.len(),
            session.updated_at().format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

pub async fn show(config_path: Option<&Path>, id: &str) -> CmdResult {
    let (_, tracker) = open(config_path).await?;
    let id = resolve(&tracker, id)?;
    let session = tracker.session(&id)?;

    println!("🗂️  {} ({})", session.name(), session.id());
    println!(
        "   Created {}  ·  {} iterations",
        session.created_at().format("%Y-%m-%d %H:%M"),
        session.len()
    );
    println!();

    for iteration in session.iterations() {
        let marker = if session.active_index() == Some(iteration.index) {
            "▶"
        } else {
            " "
        };
        let response = &iteration.response;
        println!(
            " {marker} #{:<3} {}/{}  {}",
            iteration.index,
            iteration.provider,
            iteration.model,
            iteration.timestamp.format("%H:%M:%S")
        );
        match &iteration.prompt.edit {
            Some(edit) => println!("       {} ({})", edit.action, edit.target),
            None => println!("       {}", headline(&iteration.prompt.text, 60)),
        }
        if response.is_error() {
            println!("       ❌ {}", headline(&response.explanation, 60));
        } else {
            let languages = response.languages();
            println!(
                "       {} code blocks [{}]  ~{} tokens  ${:.6}",
                response.code_blocks.len(),
                languages.join(", "),
                response.metadata.tokens.total,
                response.metadata.cost.total_cost
            );
        }
    }
    Ok(())
}

fn print_pair(pair: &DiffPair) {
    if pair.is_unchanged() {
        println!("   {} unchanged between #{} and #{}", pair.language, pair.from_index, pair.to_index);
    } else {
        print!("{}", pair.unified());
    }
}

pub async fn diff(config_path: Option<&Path>, id: &str, from: usize, to: usize, all: bool) -> CmdResult {
    let (_, tracker) = open(config_path).await?;
    let id = resolve(&tracker, id)?;

    let pairs = if all {
        tracker.show_all_diffs(&id, from, to)?
    } else {
        tracker.show_diff(&id, from, to)?.into_iter().collect()
    };

    if pairs.is_empty() {
        println!("   Iterations #{from} and #{to} share no code language.");
        return Ok(());
    }
    for pair in &pairs {
        print_pair(pair);
    }
    Ok(())
}

pub async fn delete(config_path: Option<&Path>, id: &str) -> CmdResult {
    let (repository, tracker) = open(config_path).await?;
    let id = resolve(&tracker, id)?;
    let name = tracker.session(&id)?.name().to_string();

    repository.delete(&id).await?;
    println!("🗑️  Deleted session '{name}' ({id})");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> (SessionTracker, SessionId, SessionId) {
        let mut tracker = SessionTracker::new();
        let a = tracker.create_session("first");
        let b = tracker.create_session("second");
        (tracker, a, b)
    }

    #[test]
    fn resolves_exact_and_prefix_ids() {
        let (tracker, a, b) = tracker();
        assert_eq!(resolve(&tracker, a.as_str()).unwrap(), a);

        // uuids differ early; a long prefix is unique
        let prefix = &b.as_str()[..13];
        assert_eq!(resolve(&tracker, prefix).unwrap(), b);
    }

    #[test]
    fn unknown_or_ambiguous_ids_fail() {
        let (tracker, _, _) = tracker();
        assert!(resolve(&tracker, "zzzz").unwrap_err().contains("No session"));
        assert!(resolve(&tracker, "").is_err());
    }

    #[test]
    fn headline_cuts_long_lines() {
        assert_eq!(headline("short\nsecond", 10), "short");
        assert_eq!(headline("abcdefghijkl", 4), "abcd…");
    }
}
