use async_trait::async_trait;
use log::{ debug, info };

use common::prayer::NextPrayer;

use super::{ countdown_line, remaining_words, table_lines, Render, RenderError };
use crate::countdown::Remaining;
use crate::locale::{ Label, Language };
use crate::schedule::Day;

/// Renders through the logger. Countdown ticks go to debug, whole minutes to info.
pub struct Log {
    language: Language,
}

impl Log {
    pub fn new(language: Language) -> Self {
        info!("rendering to the log in {language:?}.");
        Log { language }
    }
}

#[async_trait]
impl Render for Log {
    async fn table(&mut self, day: &Day) -> Result<(), RenderError> {
        info!("prayer times for {date} using {config}", date = day.date, config = day.config);
        for line in table_lines(day, self.language) {
            info!("{line}");
        }
        Ok(())
    }

    async fn countdown(&mut self, target: &NextPrayer, remaining: Remaining) -> Result<(), RenderError> {
        if remaining.seconds() == 0 {
            info!("{label}: {words} {until}",
                label = self.language.label(Label::Countdown),
                words = remaining_words(remaining, self.language),
                until = self.language.until(target.name),
            );
        } else {
            debug!("{}", countdown_line(target, remaining, self.language));
        }
        Ok(())
    }
}
