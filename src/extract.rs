//! Turn parameter extraction
//!
//! Splits raw user input into the text a workflow should work on and the
//! typed [`Parameters`] for the turn. Extraction never fails: anything that
//! does not parse as a directive stays in the text.
//!
//! | workflow    | directives                                          |
//! |-------------|-----------------------------------------------------|
//! | image       | `style:<word>`, `samples:<n>`, `size:<w>x<h>`       |
//! | summary     | trailing `short` / `long`                           |
//! | translation | `text | target language`                            |
//! | grammar     | `--grammar`, `--style`, `--tone`                    |

use once_cell::sync::Lazy;
use regex::Regex;

use crate::pipeline::{
    CheckType, GrammarParams, ImageParams, Parameters, SummaryLength, SummaryParams,
    TranslationParams, MAX_IMAGE_SIZE, MAX_SAMPLES,
};
use crate::workflow::WorkflowKind;

static SAMPLES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bsamples:(\d+)\b").expect("Invalid samples regex"));

static SIZE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bsize:(\d+)x(\d+)\b").expect("Invalid size regex"));

// Any short `key:value` pair; keys are filtered by edit distance to "style"
static STYLE_CANDIDATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b([A-Za-z]{4,6}):(\w[\w-]*)").expect("Invalid style regex")
});

static GRAMMAR_FLAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)--(grammar|style|tone)\b").expect("Invalid grammar flag regex"));

/// Extract clean text and parameters for one turn
pub fn extract(raw: &str, kind: WorkflowKind) -> (String, Parameters) {
    match kind {
        WorkflowKind::Image => {
            let (text, params) = extract_image(raw);
            (text, Parameters::Image(params))
        }
        WorkflowKind::Summary => {
            let (text, params) = extract_summary(raw);
            (text, Parameters::Summary(params))
        }
        WorkflowKind::Translation => {
            let (text, params) = extract_translation(raw);
            (text, Parameters::Translation(params))
        }
        WorkflowKind::Grammar => {
            let (text, params) = extract_grammar(raw);
            (text, Parameters::Grammar(params))
        }
        WorkflowKind::Research | WorkflowKind::Code => (raw.to_string(), Parameters::None),
    }
}

fn extract_image(raw: &str) -> (String, ImageParams) {
    let mut params = ImageParams::default();
    let mut samples = None;
    let mut size = None;
    let mut text = raw.to_string();

    // Removing a directive can splice its neighbours into a new one, so strip
    // until nothing changes; values come from the first occurrence seen
    loop {
        if samples.is_none() {
            samples = SAMPLES
                .captures(&text)
                .map(|caps| clamp_number(&caps[1], 1, MAX_SAMPLES));
        }
        if size.is_none() {
            size = SIZE.captures(&text).map(|caps| {
                (
                    clamp_number(&caps[1], 1, MAX_IMAGE_SIZE),
                    clamp_number(&caps[2], 1, MAX_IMAGE_SIZE),
                )
            });
        }

        let without_numbers = {
            let without_samples = SAMPLES.replace_all(&text, "");
            SIZE.replace_all(&without_samples, "").into_owned()
        };
        let (stripped, style) = strip_style(&without_numbers);
        if params.style.is_none() {
            params.style = style;
        }

        if stripped == text {
            break;
        }
        text = stripped;
    }

    if let Some(samples) = samples {
        params.samples = samples;
    }
    if let Some((width, height)) = size {
        params.width = width;
        params.height = height;
    }

    (collapse_whitespace(&text), params)
}

/// Remove every `style:` directive, returning the first value
///
/// A rejected `key:value` pair only consumes its key, so `mood:style:anime`
/// still finds `style:anime`.
fn strip_style(text: &str) -> (String, Option<String>) {
    let mut out = String::with_capacity(text.len());
    let mut style = None;
    let mut copied = 0;
    let mut pos = 0;

    while let Some(caps) = STYLE_CANDIDATE.captures_at(text, pos) {
        let (Some(whole), Some(key), Some(value)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            break;
        };
        if is_style_key(key.as_str()) {
            out.push_str(&text[copied..whole.start()]);
            style.get_or_insert_with(|| value.as_str().to_string());
            copied = whole.end();
            pos = whole.end();
        } else {
            pos = value.start();
        }
    }
    out.push_str(&text[copied..]);

    (out, style)
}

fn extract_summary(raw: &str) -> (String, SummaryParams) {
    let mut params = SummaryParams::default();
    let mut text = raw.trim_end();

    loop {
        let (head, last) = match text.rfind(char::is_whitespace) {
            Some(i) => (&text[..i], &text[i..]),
            None => ("", text),
        };
        let hint = match last.trim().to_lowercase().as_str() {
            "short" => SummaryLength::Short,
            "long" => SummaryLength::Long,
            _ => break,
        };
        // Stripping from the end, so the first hint found is the last typed
        params.length.get_or_insert(hint);
        text = head.trim_end();
    }

    (text.trim().to_string(), params)
}

fn extract_translation(raw: &str) -> (String, TranslationParams) {
    let mut parts = raw.split('|');
    let content = parts.next().unwrap_or("").trim().to_string();
    let target_language = parts
        .next()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    (content, TranslationParams { target_language })
}

fn extract_grammar(raw: &str) -> (String, GrammarParams) {
    let mut found = Vec::new();
    let mut text = raw.to_string();
    // `---tone-grammar` only reveals `--grammar` once `--tone` is gone
    while GRAMMAR_FLAG.is_match(&text) {
        found.extend(GRAMMAR_FLAG.captures_iter(&text).map(|caps| caps[1].to_lowercase()));
        text = GRAMMAR_FLAG.replace_all(&text, "").into_owned();
    }

    let check_type = if found.iter().any(|f| f == "grammar") {
        CheckType::Grammar
    } else if found.iter().any(|f| f == "style") {
        CheckType::Style
    } else if found.iter().any(|f| f == "tone") {
        CheckType::Tone
    } else {
        CheckType::All
    };

    let text = text
        .lines()
        .map(collapse_whitespace)
        .collect::<Vec<_>>()
        .join("\n");

    (text.trim().to_string(), GrammarParams { check_type })
}

/// Parse a run of digits and clamp it; overflow counts as the maximum
fn clamp_number(digits: &str, min: u32, max: u32) -> u32 {
    digits.parse::<u32>().unwrap_or(u32::MAX).clamp(min, max)
}

fn is_style_key(key: &str) -> bool {
    edit_distance(&key.to_lowercase(), "style") <= 1
}

/// Edit distance counting an adjacent transposition as one edit
fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut d = vec![vec![0usize; b.len() + 1]; a.len() + 1];

    for (i, row) in d.iter_mut().enumerate() {
        row[0] = i;
    }
    for j in 0..=b.len() {
        d[0][j] = j;
    }

    for i in 1..=a.len() {
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            d[i][j] = (d[i - 1][j] + 1)
                .min(d[i][j - 1] + 1)
                .min(d[i - 1][j - 1] + cost);
            if i > 1 && j > 1 && a[i - 1] == b[j - 2] && a[i - 2] == b[j - 1] {
                d[i][j] = d[i][j].min(d[i - 2][j - 2] + 1);
            }
        }
    }

    d[a.len()][b.len()]
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
