//! Rule-based sentence boundary detection.
//!
//! Splits after a run of terminal punctuation (`.`, `?`, `!`, optionally
//! followed by closing quotes or brackets) when the run is followed by
//! whitespace or the end of the text. A lone `.` after a known abbreviation
//! or a single-letter initial does not end a sentence.

const TERMINALS: [char; 3] = ['.', '?', '!'];
const CLOSERS: [char; 9] = ['"', '\'', ')', ']', '}', '»', '”', '’', '`'];

const ABBREVIATIONS: &[&str] = &[
    "al", "approx", "cf", "co", "corp", "dept", "dr", "e.g", "eg", "etc", "fig", "i.e", "ie",
    "inc", "jr", "ltd", "mr", "mrs", "ms", "no", "prof", "sr", "st", "vs",
];

/// Byte spans `(start, end)` of the sentences in `text`.
///
/// Spans never include leading or trailing whitespace, so
/// `text[start..end]` is the trimmed sentence.
#[must_use]
pub fn sentence_spans(text: &str) -> Vec<(usize, usize)> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut spans = Vec::new();
    let mut start: Option<usize> = None;
    let mut i = 0;

    while i < chars.len() {
        let (pos, c) = chars[i];
        if start.is_none() {
            if !c.is_whitespace() {
                start = Some(pos);
            }
            i += 1;
            continue;
        }
        if !TERMINALS.contains(&c) {
            i += 1;
            continue;
        }

        let run_start = i;
        let mut j = i;
        while j < chars.len() && TERMINALS.contains(&chars[j].1) {
            j += 1;
        }
        while j < chars.len() && CLOSERS.contains(&chars[j].1) {
            j += 1;
        }
        let run_end = chars.get(j).map_or(text.len(), |&(p, _)| p);
        let at_boundary = chars.get(j).is_none_or(|&(_, next)| next.is_whitespace());
        let lone_period = c == '.' && j == run_start + 1;

        if let Some(sentence_start) = start {
            let abbreviated = lone_period && ends_with_abbreviation(&text[sentence_start..pos]);
            if at_boundary && !abbreviated {
                spans.push((sentence_start, run_end));
                start = None;
            }
        }
        i = j;
    }

    if let Some(sentence_start) = start {
        let end = sentence_start + text[sentence_start..].trim_end().len();
        if end > sentence_start {
            spans.push((sentence_start, end));
        }
    }
    spans
}

/// Sentences of `text` as string slices.
#[must_use]
pub fn sentences(text: &str) -> Vec<&str> {
    sentence_spans(text)
        .into_iter()
        .map(|(s, e)| &text[s..e])
        .collect()
}

fn ends_with_abbreviation(before_period: &str) -> bool {
    let word = before_period
        .rsplit(char::is_whitespace)
        .next()
        .unwrap_or_default()
        .trim_start_matches(|c: char| !c.is_alphanumeric());
    if word.is_empty() {
        return false;
    }
    let mut letters = word.chars();
    if let (Some(first), None) = (letters.next(), letters.next()) {
        return first.is_alphabetic();
    }
    ABBREVIATIONS.contains(&word.to_lowercase().as_str())
}
