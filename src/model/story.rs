//! The document story: an ordered list of paragraphs fed to the layout engine.

/// One renderable paragraph. Wrapped to the frame width at layout time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Paragraph {
    pub text: String,
}

impl Paragraph {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Ordered paragraphs. For email conversion the header lines come first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Story {
    paragraphs: Vec<Paragraph>,
}

impl Story {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a story with one paragraph per `\n`-separated line.
    ///
    /// A trailing `\r` on each line is dropped so CRLF input renders cleanly.
    pub fn from_lines(text: &str) -> Self {
        text.split('\n')
            .map(|line| Paragraph::new(line.strip_suffix('\r').unwrap_or(line)))
            .collect()
    }

    pub fn push(&mut self, paragraph: Paragraph) {
        self.paragraphs.push(paragraph);
    }

    pub fn len(&self) -> usize {
        self.paragraphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }

    pub fn paragraphs(&self) -> &[Paragraph] {
        &self.paragraphs
    }

    pub fn into_paragraphs(self) -> Vec<Paragraph> {
        self.paragraphs
    }
}

impl FromIterator<Paragraph> for Story {
    fn from_iter<I: IntoIterator<Item = Paragraph>>(iter: I) -> Self {
        Self {
            paragraphs: iter.into_iter().collect(),
        }
    }
}

impl Extend<Paragraph> for Story {
    fn extend<I: IntoIterator<Item = Paragraph>>(&mut self, iter: I) {
        self.paragraphs.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_lines_keeps_empty_lines() {
        let story = Story::from_lines("one\n\nthree");
        assert_eq!(story.len(), 3);
        assert_eq!(story.paragraphs()[1].text, "");
    }

    #[test]
    fn test_from_lines_strips_carriage_returns() {
        let story = Story::from_lines("a\r\nb\r\n");
        let texts: Vec<&str> = story.paragraphs().iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "b", ""]);
    }
}
