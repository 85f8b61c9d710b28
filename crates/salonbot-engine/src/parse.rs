// SPDX-FileCopyrightText: 2026 Salonbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Option and intent parsing for free-text replies.
//!
//! Matching is keyword based: a leading number, a keyword found among the
//! reply's words, or (for one-word replies) a Jaro-Winkler near miss.

use chrono::{Datelike, NaiveDate};
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Minimum Jaro-Winkler score for a one-word reply to count as a keyword.
const FUZZY_THRESHOLD: f64 = 0.9;

/// Words that opt the sender out of automated messages (whole reply).
const OPT_OUT: &[&str] = &["sair", "parar", "stop", "descadastrar", "cancelar inscricao"];

/// Words asking for a person (anywhere in the reply).
const HUMAN_REQUEST: &[&str] = &[
    "atendente",
    "humano",
    "falar com alguem",
    "falar com uma pessoa",
];

const POSITIVE: &[&str] = &[
    "1", "sim", "confirmo", "confirmar", "confirmado", "confirma", "ok", "claro", "aceito",
    "yes",
];

const NEGATIVE: &[&str] = &[
    "2", "nao", "cancelar", "cancela", "cancelo", "desmarcar", "desisto",
];

/// Words allowed after the yes/no keyword without changing its meaning.
const CONFIRMATION_FILLER: &[&str] = &[
    "obrigada", "obrigado", "obg", "por", "favor", "pode", "ser", "quero", "tudo", "certo",
    "com", "certeza", "entao", "beleza", "mesmo", "isso", "pfv",
];

/// Longest reply still read as a plain yes or no.
const MAX_CONFIRMATION_WORDS: usize = 4;

const BACK: &[&str] = &["0", "menu", "voltar", "inicio"];

/// Lowercases, strips diacritics, and turns punctuation into single spaces.
pub fn normalize(text: &str) -> String {
    let folded: String = text
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn tokens(normalized: &str) -> Vec<&str> {
    normalized.split(' ').filter(|t| !t.is_empty()).collect()
}

/// The number a reply starts with (`"2"`, `"2 - corte"`, `"2)"`).
pub fn leading_number(text: &str) -> Option<usize> {
    let normalized = normalize(text);
    let first = normalized.split(' ').next()?;
    if first.chars().all(|c| c.is_ascii_digit()) {
        first.parse().ok()
    } else {
        None
    }
}

/// `true` when `keyword` appears in `words` as a contiguous word sequence.
fn contains_phrase(words: &[&str], keyword: &str) -> bool {
    let needle = tokens(keyword);
    !needle.is_empty() && words.windows(needle.len()).any(|w| w == needle.as_slice())
}

/// `true` when `phrase` appears among the words of `text`.
pub fn mentions(text: &str, phrase: &str) -> bool {
    let normalized = normalize(text);
    contains_phrase(&tokens(&normalized), &normalize(phrase))
}

/// Resolves a reply to a 0-based option index.
///
/// `options[i]` holds the keywords of option `i + 1`. A leading number wins;
/// otherwise the reply must match the keywords of exactly one option.
pub fn parse_choice<S: AsRef<str>>(text: &str, options: &[Vec<S>]) -> Option<usize> {
    if let Some(n) = leading_number(text) {
        return (1..=options.len()).contains(&n).then(|| n - 1);
    }

    let normalized = normalize(text);
    let words = tokens(&normalized);
    if words.is_empty() {
        return None;
    }

    let exact = best_options(options, |kw| {
        contains_phrase(&words, kw).then(|| tokens(kw).len())
    });
    if !exact.is_empty() {
        return unique(exact);
    }

    if words.len() == 1 {
        let word = words[0];
        let fuzzy = best_options(options, |kw| {
            (!kw.contains(' ') && strsim::jaro_winkler(word, kw) >= FUZZY_THRESHOLD).then_some(1)
        });
        return unique(fuzzy);
    }
    None
}

/// Options whose best keyword score ties for the highest score overall.
///
/// Longer keyword phrases score higher, so `"corte infantil"` beats a bare
/// `"corte"` shared by several options.
fn best_options<S: AsRef<str>>(
    options: &[Vec<S>],
    score: impl Fn(&str) -> Option<usize>,
) -> Vec<usize> {
    let scored: Vec<(usize, usize)> = options
        .iter()
        .enumerate()
        .filter_map(|(i, keywords)| {
            keywords
                .iter()
                .filter_map(|kw| score(normalize(kw.as_ref()).as_str()))
                .max()
                .map(|best| (i, best))
        })
        .collect();
    let top = scored.iter().map(|(_, s)| *s).max().unwrap_or(0);
    scored
        .into_iter()
        .filter(|(_, s)| *s == top)
        .map(|(i, _)| i)
        .collect()
}

fn unique(candidates: Vec<usize>) -> Option<usize> {
    match candidates.as_slice() {
        [only] => Some(*only),
        _ => None,
    }
}

/// Yes/no answer to a confirmation-style question.
///
/// The reply must open with a yes/no keyword and contain nothing else but
/// keywords of the same answer and polite filler, so `"sim, confirmo"` is
/// yes while `"nao sei se chego a tempo"` is neither.
pub fn parse_confirmation(text: &str) -> Option<bool> {
    let normalized = normalize(text);
    let words = tokens(&normalized);
    let (first, rest) = words.split_first()?;
    if words.len() > MAX_CONFIRMATION_WORDS {
        return None;
    }
    let (answer, keywords) = if POSITIVE.contains(first) {
        (true, POSITIVE)
    } else if NEGATIVE.contains(first) {
        (false, NEGATIVE)
    } else {
        return None;
    };
    rest.iter()
        .all(|w| keywords.contains(w) || CONFIRMATION_FILLER.contains(w))
        .then_some(answer)
}

pub fn is_opt_out(text: &str) -> bool {
    OPT_OUT.contains(&normalize(text).as_str())
}

pub fn is_human_request(text: &str) -> bool {
    let normalized = normalize(text);
    let words = tokens(&normalized);
    HUMAN_REQUEST.iter().any(|kw| contains_phrase(&words, kw))
}

/// `0`, `menu`, `voltar`: leave the current sub-flow.
pub fn is_back(text: &str) -> bool {
    BACK.contains(&normalize(text).as_str())
}

/// Parses `dd/mm/yyyy` (also with `-` or `.`), `ddmmyyyy`, or ISO dates.
pub fn parse_birthdate(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    ["%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y-%m-%d", "%d%m%Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
}

/// Completed years between `birth` and `today`.
pub fn age_on(birth: NaiveDate, today: NaiveDate) -> u32 {
    let mut years = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        years -= 1;
    }
    u32::try_from(years).unwrap_or(0)
}

/// Cleans up a typed name; `None` when it does not look like one.
pub fn parse_name(text: &str) -> Option<String> {
    let name = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let letters = name.chars().filter(|c| c.is_alphabetic()).count();
    let allowed = name
        .chars()
        .all(|c| c.is_alphabetic() || matches!(c, ' ' | '\'' | '-' | '.'));
    (allowed && letters >= 2 && name.chars().count() <= 60).then_some(name)
}

/// A 1 to 5 rating given as the first word of the reply.
pub fn parse_rating(text: &str) -> Option<u8> {
    leading_number(text)
        .and_then(|n| u8::try_from(n).ok())
        .filter(|n| (1..=5).contains(n))
}
