//! Terminal output for answers, sources and indexed threads

use std::io::Write;

use chrono::{DateTime, Utc};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::chat::ChatAnswer;
use crate::error::Result;
use crate::index::IndexedThread;
use crate::search::SourcePost;

/// Width source cards are wrapped to
pub const WRAP_WIDTH: usize = 80;

/// Print an answer and its sources to stdout
pub fn print_answer(answer: &ChatAnswer) -> Result<()> {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    write_answer(&mut stdout, answer)
}

/// Print the list of indexed threads to stdout
pub fn print_threads(threads: &[IndexedThread]) -> Result<()> {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    write_threads(&mut stdout, threads)
}

pub fn write_answer<W: WriteColor>(out: &mut W, answer: &ChatAnswer) -> Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(Color::Green)).set_bold(true))?;
    writeln!(out, "Answer:")?;
    out.reset()?;
    writeln!(out, "{}", answer.answer.trim())?;
    writeln!(out)?;

    write_sources(out, &answer.sources)
}

pub fn write_sources<W: WriteColor>(out: &mut W, sources: &[SourcePost]) -> Result<()> {
    if sources.is_empty() {
        writeln!(out, "No relevant sources found.")?;
        return Ok(());
    }

    out.set_color(ColorSpec::new().set_fg(Some(Color::Green)).set_bold(true))?;
    writeln!(out, "Source Posts:")?;
    out.reset()?;

    for source in sources {
        writeln!(out)?;
        out.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true))?;
        writeln!(
            out,
            "Post #{} by {}",
            source.post_number.as_deref().unwrap_or("unknown"),
            source.username.as_deref().unwrap_or("unknown")
        )?;
        out.reset()?;

        if let Some(date) = &source.date {
            out.set_color(ColorSpec::new().set_dimmed(true))?;
            writeln!(out, "{}", date)?;
            out.reset()?;
        }

        for line in wrap_text(&source.text, WRAP_WIDTH) {
            writeln!(out, "{}", line)?;
        }
        writeln!(out, "{}", "-".repeat(WRAP_WIDTH))?;
    }

    Ok(())
}

pub fn write_threads<W: WriteColor>(out: &mut W, threads: &[IndexedThread]) -> Result<()> {
    if threads.is_empty() {
        writeln!(out, "No threads indexed yet.")?;
        return Ok(());
    }

    for thread in threads {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true))?;
        writeln!(out, "{}", thread.url)?;
        out.reset()?;

        let indexed = DateTime::<Utc>::from_timestamp(thread.indexed_at, 0)
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_else(|| thread.indexed_at.to_string());
        writeln!(
            out,
            "  {} posts, {} chunks, scraped {}, indexed {}",
            thread.post_count, thread.chunk_count, thread.scrape_date, indexed
        )?;
    }

    Ok(())
}

/// Greedy word wrap. Existing line breaks are kept and words longer than
/// `width` get a line of their own.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        let mut current_len = 0;

        for word in paragraph.split_whitespace() {
            let word_len = word.chars().count();
            if current_len > 0 && current_len + 1 + word_len > width {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current.push_str(word);
            current_len += word_len;
        }

        lines.push(current);
    }

    lines
}
