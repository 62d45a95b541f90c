mod logger;
mod terminal;

use async_trait::async_trait;
use thiserror::Error;

use common::prayer::{ NextPrayer, Prayer };

use crate::config::general::RenderModule;
use crate::countdown::Remaining;
use crate::locale::{ Label, Language };
use crate::schedule::Day;

pub use logger::Log;
pub use terminal::Terminal;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("unable to write to output. {0}")]
    Io(#[from] std::io::Error),
}

pub fn build(module: RenderModule, language: Language) -> Box<dyn Render> {
    match module {
        RenderModule::Log => Box::new(Log::new(language)),
        RenderModule::Terminal => Box::new(Terminal::new(tokio::io::stdout(), language)),
    }
}

#[async_trait]
pub trait Render: Send {
    /// Shows the day's table. Called again only when the table changes.
    async fn table(&mut self, day: &Day) -> Result<(), RenderError>;

    /// Shows the time left until `target`, once per tick.
    async fn countdown(&mut self, target: &NextPrayer, remaining: Remaining) -> Result<(), RenderError>;
}

fn table_lines(day: &Day, language: Language) -> Vec<String> {
    let mut lines = Vec::with_capacity(Prayer::ALL.len() + 2);
    lines.push(format!("{date} | {label}: {hijri}",
        date = day.date.format("%A %Y-%m-%d"),
        label = language.label(Label::HijriDate),
        hijri = day.hijri,
    ));
    for (prayer, time) in day.times.iter() {
        let marker = if prayer == day.next.name { ">" } else { " " };
        lines.push(format!("{marker} {name:<10} {time:>8}", name = language.prayer(prayer)));
    }
    lines.push(format!("{label}: {name} {time}",
        label = language.label(Label::NextPrayer),
        name = language.prayer(day.next.name),
        time = day.next.formatted_time,
    ));
    lines
}

fn countdown_line(target: &NextPrayer, remaining: Remaining, language: Language) -> String {
    format!("{label} {remaining} {until} ({time})",
        label = language.label(Label::Countdown),
        until = language.until(target.name),
        time = target.formatted_time,
    )
}

/// "2 Hours 36 Minutes 5 Seconds", localised.
fn remaining_words(remaining: Remaining, language: Language) -> String {
    format!("{h} {hours} {m} {minutes} {s} {seconds}",
        h = remaining.hours(),
        hours = language.label(Label::Hours),
        m = remaining.minutes(),
        minutes = language.label(Label::Minutes),
        s = remaining.seconds(),
        seconds = language.label(Label::Seconds),
    )
}
