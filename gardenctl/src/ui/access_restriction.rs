//! Boxed rendering of access restriction notices.

use std::fmt;

use crate::config::AccessRestrictionMessages;

/// Inner width of the box, giving 80 columns including the borders.
const MIN_WIDTH: usize = 76;

#[derive(Clone, Copy)]
enum Row {
    Header,
    Body,
    Footer,
}

impl Row {
    const fn borders(self) -> (&'static str, &'static str) {
        match self {
            Self::Header => ("┌─", "─┐"),
            Self::Body => ("│ ", " │"),
            Self::Footer => ("└─", "─┘"),
        }
    }

    const fn fill(self) -> char {
        match self {
            Self::Header | Self::Footer => '─',
            Self::Body => ' ',
        }
    }

    fn write(self, f: &mut fmt::Formatter<'_>, text: &str, width: usize) -> fmt::Result {
        let (start, end) = self.borders();
        let is_item = text.starts_with("* ");
        for (index, line) in text.split('\n').enumerate() {
            let line = if is_item && index > 0 { format!("  {line}") } else { line.to_string() };
            let padding = width.saturating_sub(line.chars().count());
            let fill = std::iter::repeat_n(self.fill(), padding).collect::<String>();
            writeln!(f, "{start}{line}{fill}{end}")?;
        }
        Ok(())
    }
}

fn text_width(text: &str) -> usize {
    text.split('\n').map(|line| line.chars().count()).max().unwrap_or_default()
}

impl fmt::Display for AccessRestrictionMessages {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title =
            if self.0.len() > 1 { " Access Restrictions " } else { " Access Restriction " };

        let width = self
            .0
            .iter()
            .flat_map(|message| {
                std::iter::once(text_width(&message.header))
                    .chain(message.items.iter().map(|item| text_width(item) + 2))
            })
            .chain([title.chars().count(), MIN_WIDTH])
            .max()
            .unwrap_or(MIN_WIDTH);

        Row::Header.write(f, title, width)?;
        for message in &self.0 {
            Row::Body.write(f, &message.header, width)?;
            for item in &message.items {
                Row::Body.write(f, &format!("* {item}"), width)?;
            }
        }
        Row::Footer.write(f, "", width)
    }
}
