use async_trait::async_trait;
use log::info;
use tokio::io::{ AsyncWrite, AsyncWriteExt };

use common::prayer::NextPrayer;

use super::{ countdown_line, table_lines, Render, RenderError };
use crate::countdown::Remaining;
use crate::locale::Language;
use crate::schedule::Day;

const CLEAR_LINE: &str = "\r\x1b[2K";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

/// Prints the table once and rewrites a single countdown line in place.
/// Less than an hour left is shown in red.
pub struct Terminal<W> {
    out: W,
    language: Language,
    countdown_shown: bool,
}

impl<W: AsyncWrite + Unpin + Send> Terminal<W> {
    pub fn new(out: W, language: Language) -> Self {
        info!("rendering to the terminal in {language:?}.");
        Terminal { out, language, countdown_shown: false }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> Render for Terminal<W> {
    async fn table(&mut self, day: &Day) -> Result<(), RenderError> {
        let mut text = String::new();
        if self.countdown_shown {
            text.push('\n');
            self.countdown_shown = false;
        }
        for line in table_lines(day, self.language) {
            text.push_str(&line);
            text.push('\n');
        }
        self.out.write_all(text.as_bytes()).await?;
        self.out.flush().await?;
        Ok(())
    }

    async fn countdown(&mut self, target: &NextPrayer, remaining: Remaining) -> Result<(), RenderError> {
        let line = countdown_line(target, remaining, self.language);
        let text = if remaining.is_less_than_hour() {
            format!("{CLEAR_LINE}{RED}{line}{RESET}")
        } else {
            format!("{CLEAR_LINE}{line}")
        };
        self.out.write_all(text.as_bytes()).await?;
        self.out.flush().await?;
        self.countdown_shown = true;
        Ok(())
    }
}
