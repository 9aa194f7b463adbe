//! Sectioning and plain-language summaries.
//!
//! Text is split into sections (detected headings, else paragraph groups),
//! each section gets a type, a plain-language digest, key points, a risk level
//! and internal-category hints. Document level adds findings and an overall
//! risk rating.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::rights::{InternalCategory, SectionRights};
use crate::text::{HeuristicSegmenter, Segmenter};

/// Paragraph groups are closed once they grow past this many chars.
const SECTION_TARGET_CHARS: usize = 800;
/// Paragraphs shorter than this are noise (page furniture, stray numbers).
const MIN_PARAGRAPH_CHARS: usize = 20;
const MAX_KEY_POINTS: usize = 3;
const MAX_TRANSLATIONS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    Privacy,
    Payments,
    Rights,
    Liability,
    Termination,
    Changes,
    Contact,
    General,
}

impl SectionKind {
    fn intro(self) -> &'static str {
        match self {
            SectionKind::Privacy => "Here's what this means for your personal information:",
            SectionKind::Payments => "Here's what this means for your money:",
            SectionKind::Rights => "Here's what this means for your rights:",
            SectionKind::Liability => "Here's what this means for your responsibility:",
            SectionKind::Termination => "Here's what this means for your account:",
            SectionKind::Changes => "Here's what this means for future updates:",
            SectionKind::Contact | SectionKind::General => "Here's what this section means:",
        }
    }

    pub fn friendly_heading(self) -> &'static str {
        match self {
            SectionKind::Privacy => "Your Privacy & Data",
            SectionKind::Payments => "Costs & Payments",
            SectionKind::Rights => "Your Rights & Permissions",
            SectionKind::Liability => "Your Responsibilities",
            SectionKind::Termination => "Account Cancellation",
            SectionKind::Changes => "Future Changes",
            SectionKind::Contact => "Getting Help",
            SectionKind::General => "Important Terms",
        }
    }

    fn importance_keywords(self) -> &'static [&'static str] {
        match self {
            SectionKind::Privacy => &[
                "collect", "share", "sell", "third party", "data", "information", "tracking",
            ],
            SectionKind::Payments => &[
                "fee", "charge", "payment", "refund", "billing", "subscription", "cost",
            ],
            SectionKind::Rights => &[
                "license", "own", "copyright", "trademark", "property", "use", "permission",
            ],
            SectionKind::Liability => &[
                "liable", "responsible", "damages", "lawsuit", "indemnify", "harm",
            ],
            SectionKind::Termination => &["terminate", "suspend", "cancel", "end", "close", "disable"],
            SectionKind::Changes => &["change", "modify", "update", "amend", "revise", "notice"],
            SectionKind::Contact | SectionKind::General => &[
                "must", "required", "prohibited", "allowed", "agree", "accept",
            ],
        }
    }

    fn category_hints(self) -> &'static [InternalCategory] {
        use InternalCategory::*;
        match self {
            SectionKind::Privacy => &[DataPractices, ConsentAndOptOut, RetentionAndDeletion],
            SectionKind::Payments => &[BillingAndAutorenewal],
            SectionKind::Rights => &[ContentAndIp, LiabilityAndRemedies],
            SectionKind::Liability => &[LiabilityAndRemedies],
            SectionKind::Termination | SectionKind::Changes => &[UnilateralChanges],
            SectionKind::Contact | SectionKind::General => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverallRisk {
    High,
    MediumHigh,
    Medium,
    LowMedium,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionSummary {
    pub heading: String,
    #[serde(rename = "type")]
    pub kind: SectionKind,
    pub summary: String,
    pub key_points: Vec<String>,
    pub risk_level: RiskLevel,
    pub category_hints: Vec<InternalCategory>,
    pub user_friendly_heading: String,
    pub original_text: String,
    /// Rules-only rights view of this section; filled in by the pipeline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rights: Option<SectionRights>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryMetadata {
    pub section_count: usize,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub overall: String,
    pub overall_risk: OverallRisk,
    pub key_findings: Vec<String>,
    pub plain_language_alert: Option<String>,
    pub sections: Vec<SectionSummary>,
    pub metadata: SummaryMetadata,
}

/// A raw section before summarization.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub heading: String,
    pub content: String,
    pub kind: SectionKind,
}

/* ----------------------------
Pattern tables
---------------------------- */

const PLAIN_LANGUAGE: &[(&str, &str)] = &[
    ("aforementioned", "mentioned above"),
    ("heretofore", "before now"),
    ("thereafter", "after that"),
    ("pursuant to", "according to"),
    ("notwithstanding", "despite"),
    ("hereunder", "under this agreement"),
    ("whereas", "because"),
    ("therein", "in that"),
    ("thereof", "of that"),
    ("whereby", "by which"),
    ("herein", "in this document"),
    ("forthwith", "immediately"),
    ("provided that", "as long as"),
    ("in consideration of", "in exchange for"),
    ("shall not", "will not"),
    ("shall", "will"),
    ("may not", "cannot"),
    ("indemnify", "protect from legal claims"),
    ("hold harmless", "protect from responsibility"),
    ("liability", "responsibility for damages"),
    ("damages", "money you might owe"),
    ("breach", "breaking the rules"),
    ("violation", "breaking the rules"),
    ("terminate", "end your account"),
    ("suspend", "temporarily stop your account"),
    ("revoke", "take away"),
    ("waive", "give up your right to"),
    ("forfeit", "lose"),
    ("relinquish", "give up"),
    ("personally identifiable information", "information that identifies you"),
    ("aggregate data", "combined data from many users"),
    ("third parties", "other companies"),
    ("affiliates", "related companies"),
    ("subsidiaries", "companies we own"),
    ("data processing", "using your information"),
    ("data retention", "keeping your information"),
    ("cookies", "small files stored on your device"),
    ("intellectual property", "ownership rights"),
    ("proprietary", "owned by the company"),
    ("sublicense", "permission to give others permission"),
    ("license", "permission to use"),
    ("derivative works", "new things based on existing content"),
    ("modifications", "changes"),
    ("enhancements", "improvements"),
    ("user-generated content", "things you create or post"),
    ("fees", "money you pay"),
    ("charges", "costs"),
    ("refund", "money back"),
    ("billing cycle", "payment period"),
    ("subscription", "ongoing paid service"),
    ("premium features", "paid extras"),
    ("free trial", "test period at no cost"),
    ("arbitration", "private dispute resolution"),
    ("mediation", "help resolving disagreements"),
    ("jurisdiction", "which courts handle disputes"),
    ("governing law", "which laws apply"),
    ("class action", "group lawsuit"),
    ("injunctive relief", "court order to stop something"),
];

fn ci(pattern: &str) -> Regex {
    Regex::new(&format!("(?i){pattern}")).expect("summarizer regex")
}

static PLAIN_LANGUAGE_RE: Lazy<Vec<(&'static str, Regex, &'static str)>> = Lazy::new(|| {
    PLAIN_LANGUAGE
        .iter()
        .map(|(legal, plain)| (*legal, ci(&format!(r"\b{}\b", regex::escape(legal))), *plain))
        .collect()
});

static SECTION_PATTERNS: Lazy<Vec<(SectionKind, Regex)>> = Lazy::new(|| {
    [
        (SectionKind::Privacy, r"privacy|data|personal\s+information|cookies|tracking"),
        (SectionKind::Payments, r"payment|billing|fees|charges|refund|subscription|money"),
        (SectionKind::Rights, r"rights|license|intellectual\s+property|ownership|content"),
        (SectionKind::Liability, r"liability|damages|indemnif|harm|responsible|lawsuit|legal"),
        (SectionKind::Termination, r"terminat|suspend|cancel|\bend\b|\bclose|account"),
        (SectionKind::Changes, r"changes|modif|update|amend|revise"),
        (SectionKind::Contact, r"contact|support|help|email|phone|address"),
        (SectionKind::General, r"general|miscellaneous|other|additional"),
    ]
    .into_iter()
    .map(|(k, p)| (k, ci(p)))
    .collect()
});

static CONTENT_HINTS: Lazy<Vec<(Regex, InternalCategory)>> = Lazy::new(|| {
    use InternalCategory::*;
    [
        (r"arbitrat|jury\s+trial", DisputeResolution),
        (r"class\s+action", ClassActions),
        (r"we\s+may\s+(modify|change|amend)", UnilateralChanges),
        (r"sell\s+.*data|share\s+.*(personal\s+)?data", DataPractices),
        (r"auto-?renew|subscription|billing|negative\s+option", BillingAndAutorenewal),
        (r"moral\s+rights|intellectual\s+property|license", ContentAndIp),
        (r"liability|indemnif|hold\s+harmless", LiabilityAndRemedies),
        (
            r"(delete|erase)\s+your\s+(account|data)|retain\s+data|storage\s+for\s+\d+",
            RetentionAndDeletion,
        ),
        (r"opt-?out", ConsentAndOptOut),
    ]
    .into_iter()
    .map(|(p, c)| (ci(p), c))
    .collect()
});

static TOPIC_CHANGE: Lazy<Regex> = Lazy::new(|| {
    ci(r"^(in addition|furthermore|moreover|however|nevertheless|on the other hand|we may|you agree|you understand|by using|when you|privacy|payment|refund|termination|liability)")
});

static ACTION_WORDS: Lazy<Regex> =
    Lazy::new(|| ci(r"\b(will|must|cannot|may not|required|prohibited)\b"));

static KEY_POINT_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"you (?:agree|acknowledge|understand|consent) (?:to|that) ([^.]+)", "You agree:"),
        (r"we (?:may|will|can) ([^.]+)", "We may:"),
        (r"you (?:may not|cannot|must not) ([^.]+)", "You cannot:"),
        (r"fees? (?:are|will be|may be) ([^.]+)", "Fees:"),
        (r"your (?:data|information) (?:is|will be|may be) ([^.]+)", "Your data:"),
    ]
    .into_iter()
    .map(|(p, prefix)| (ci(p), prefix))
    .collect()
});

static HIGH_RISK: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"waive.*rights?",
        r"indemnify",
        r"hold.*harmless",
        r"unlimited.*liability",
        r"no.*refund",
        r"sell.*data",
        r"share.*third.*part",
        r"terminate.*without.*notice",
        r"change.*terms.*without.*notice",
    ]
    .into_iter()
    .map(ci)
    .collect()
});

static MEDIUM_RISK: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"fees?.*may.*change",
        r"suspend.*account",
        r"limited.*liability",
        r"cookies",
        r"track",
        r"third.*part",
        r"affiliates",
    ]
    .into_iter()
    .map(ci)
    .collect()
});

static LOW_RISK: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"contact.*support",
        r"help",
        r"customer.*service",
        r"privacy.*protect",
        r"secure",
        r"opt.*out",
    ]
    .into_iter()
    .map(ci)
    .collect()
});

static CONCERNING: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"no.*refund|non.*refundable", "Refunds may be limited or not available"),
        (r"sell.*data|share.*third.*part", "Your personal data may be shared with other companies"),
        (r"terminate.*without.*notice", "Your account can be terminated without warning"),
        (r"change.*terms.*without.*notice", "Terms can be changed without notifying you"),
        (r"waive.*rights?|indemnify", "You may be giving up important legal rights"),
    ]
    .into_iter()
    .map(|(p, f)| (ci(p), f))
    .collect()
});

static POSITIVE: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"opt.*out|unsubscribe", "You can opt out of data collection or communications"),
        (r"delete.*data|remove.*information", "You can request deletion of your personal data"),
        (r"30.*day|trial.*period", "There appears to be a trial period or grace period"),
        (r"contact.*support|customer.*service", "Customer support contact information is provided"),
    ]
    .into_iter()
    .map(|(p, f)| (ci(p), f))
    .collect()
});

static NUMBERED_HEADING: Lazy<Regex> = Lazy::new(|| {
    ci(r"^(?:(?:section|article)\s+\d+[.:]?|\d+(?:\.\d+)*[.)]?)\s+\S")
});

static ARBITRATION: Lazy<Regex> = Lazy::new(|| ci(r"arbitration|dispute\s+resolution"));
static CLASS_ACTION: Lazy<Regex> = Lazy::new(|| ci(r"class[\s-]*action"));
static GOVERNING_LAW: Lazy<Regex> = Lazy::new(|| ci(r"governing\s+law|jurisdiction|venue"));

/* ----------------------------
Sectioning
---------------------------- */

pub fn categorize(heading: &str, content: &str) -> SectionKind {
    let text = format!("{heading} {content}");
    SECTION_PATTERNS
        .iter()
        .find(|(_, re)| re.is_match(&text))
        .map(|(k, _)| *k)
        .unwrap_or(SectionKind::General)
}

fn is_heading(line: &str) -> bool {
    let line = line.trim();
    if line.is_empty() || line.len() > 80 || !line.chars().any(char::is_alphabetic) {
        return false;
    }
    if line.ends_with(['.', ',', ';', ':']) {
        return false;
    }
    let words: Vec<&str> = line.split_whitespace().collect();
    if NUMBERED_HEADING.is_match(line) {
        return words.len() <= 12;
    }
    if words.len() > 10 {
        return false;
    }
    let letters: Vec<char> = line.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.len() >= 3 && letters.iter().all(|c| c.is_uppercase()) {
        return true;
    }
    // Title Case: every word of four or more letters capitalized
    words.len() <= 8
        && line.chars().next().is_some_and(char::is_uppercase)
        && words
            .iter()
            .filter(|w| w.chars().filter(|c| c.is_alphabetic()).count() >= 4)
            .all(|w| w.chars().next().is_some_and(char::is_uppercase))
}

fn push_section(out: &mut Vec<Section>, heading: &str, body: &[&str]) {
    let content = body.join(" ").split_whitespace().collect::<Vec<_>>().join(" ");
    if content.is_empty() {
        return;
    }
    let content = if content.len() < 40 {
        format!("{heading}. {content}")
    } else {
        content
    };
    let kind = categorize(heading, &content);
    out.push(Section {
        heading: heading.to_string(),
        content,
        kind,
    });
}

/// Sections from heading lines; text before the first heading is an introduction.
fn sections_from_headings(text: &str) -> Vec<Section> {
    let mut out = Vec::new();
    let mut heading: Option<&str> = None;
    let mut body: Vec<&str> = Vec::new();
    let mut seen_heading = false;

    let lines: Vec<&str> = text.lines().collect();
    let last_text_line = lines.iter().rposition(|l| !l.trim().is_empty());
    for (i, line) in lines.iter().copied().enumerate() {
        // a heading needs body text after it
        let followed = last_text_line.is_some_and(|last| last > i);
        if is_heading(line) && followed {
            seen_heading = true;
            match heading {
                Some(h) => push_section(&mut out, h, &body),
                None if body.iter().map(|l| l.trim().len()).sum::<usize>() >= MIN_PARAGRAPH_CHARS => {
                    push_section(&mut out, "Introduction", &body)
                }
                None => {}
            }
            heading = Some(line.trim());
            body.clear();
        } else {
            body.push(line);
        }
    }
    if let Some(h) = heading {
        push_section(&mut out, h, &body);
    }
    if !seen_heading {
        out.clear();
    }
    out
}

/// Split a paragraph after ". " when the next sentence starts uppercase.
fn split_sentence_runs(paragraph: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let bytes = paragraph.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'.' {
            let mut j = i + 1;
            while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            if j > i + 1 && j < bytes.len() && bytes[j].is_ascii_uppercase() {
                out.push(&paragraph[start..=i]);
                start = j;
                i = j;
                continue;
            }
        }
        i += 1;
    }
    out.push(&paragraph[start..]);
    out
}

static BLANK_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").expect("blank line regex"));

/// Paragraph groups of about [`SECTION_TARGET_CHARS`], closed early on a topic change.
fn sections_from_paragraphs(text: &str) -> Vec<Section> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut n = 1;

    for block in BLANK_LINE.split(text) {
        for piece in split_sentence_runs(block) {
            let piece = piece.trim();
            if piece.len() < MIN_PARAGRAPH_CHARS {
                continue;
            }
            current.push_str(piece);
            current.push(' ');
            if current.len() > SECTION_TARGET_CHARS || TOPIC_CHANGE.is_match(piece) {
                push_section(&mut out, &format!("Section {n}"), &[current.as_str()]);
                current.clear();
                n += 1;
            }
        }
    }
    if !current.trim().is_empty() {
        push_section(&mut out, &format!("Section {n}"), &[current.as_str()]);
    }
    out
}

pub fn split_sections(text: &str) -> Vec<Section> {
    let by_heading = sections_from_headings(text);
    if by_heading.is_empty() {
        sections_from_paragraphs(text)
    } else {
        by_heading
    }
}

/// Add dispute-resolution and governing-law sections when the document talks
/// about them but no section does.
fn mentioned(re: &Regex, sections: &[Section]) -> bool {
    sections
        .iter()
        .any(|s| re.is_match(&s.heading) || re.is_match(&s.content))
}

/// First sentence matching `re` plus the one after it.
fn snippet(sentences: &[String], re: &Regex) -> String {
    sentences
        .iter()
        .position(|s| re.is_match(s))
        .map(|i| sentences[i..(i + 2).min(sentences.len())].join(" "))
        .unwrap_or_default()
}

fn synthesize_critical_sections(text: &str, sections: &mut Vec<Section>) {
    let sentences = HeuristicSegmenter.sentences(text);

    if !mentioned(&ARBITRATION, sections) && ARBITRATION.is_match(text) {
        let mut content = snippet(&sentences, &ARBITRATION);
        if !CLASS_ACTION.is_match(&content) && CLASS_ACTION.is_match(text) {
            let extra = snippet(&sentences, &CLASS_ACTION);
            content = format!("{content} {extra}").trim().to_string();
        }
        if content.len() > 40 {
            let kind = categorize("", &content);
            sections.push(Section {
                heading: "Dispute Resolution (Arbitration)".into(),
                content,
                kind,
            });
        }
    }

    if !mentioned(&GOVERNING_LAW, sections) && GOVERNING_LAW.is_match(text) {
        let content = snippet(&sentences, &GOVERNING_LAW);
        if content.len() > 30 {
            let kind = categorize("", &content);
            sections.push(Section {
                heading: "Governing Law and Jurisdiction".into(),
                content,
                kind,
            });
        }
    }
}

/* ----------------------------
Per-section digest
---------------------------- */

pub fn to_plain_language(text: &str) -> String {
    PLAIN_LANGUAGE_RE
        .iter()
        .fold(text.to_string(), |acc, (_, re, plain)| re.replace_all(&acc, *plain).into_owned())
}

fn important_sentences(text: &str, kind: SectionKind) -> Vec<String> {
    let sentences: Vec<&str> = text
        .split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if sentences.is_empty() {
        return Vec::new();
    }

    let keywords = kind.importance_keywords();
    let mut scored: Vec<(u32, &str)> = sentences
        .iter()
        .map(|s| {
            let lower = s.to_lowercase();
            let mut score = 2 * keywords.iter().filter(|k| lower.contains(*k)).count() as u32;
            if s.len() < 150 {
                score += 1;
            }
            if ACTION_WORDS.is_match(s) {
                score += 2;
            }
            (score, *s)
        })
        .collect();
    // stable: ties keep document order
    scored.sort_by(|a, b| b.0.cmp(&a.0));

    let take = 3.min(sentences.len().div_ceil(3));
    scored.into_iter().take(take).map(|(_, s)| s.to_string()).collect()
}

fn bullet(sentence: &str) -> String {
    let clean = sentence.split_whitespace().collect::<Vec<_>>().join(" ");
    let clean = clean.trim_start_matches(|c: char| !c.is_alphanumeric());
    let mut chars = clean.chars();
    let mut out = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
        None => String::new(),
    };
    if !out.ends_with(['.', '!', '?']) {
        out.push('.');
    }
    format!("- {out}")
}

fn plain_summary(section: &Section) -> String {
    let plain = to_plain_language(&section.content);
    let top = important_sentences(&plain, section.kind);
    if top.is_empty() {
        return "This section doesn't contain clear information we can summarize.".into();
    }
    let bullets: Vec<String> = top.iter().map(|s| bullet(s)).collect();
    format!("{}\n\n{}", section.kind.intro(), bullets.join("\n"))
}

fn key_points(content: &str) -> Vec<String> {
    let mut points = Vec::new();
    for (re, prefix) in KEY_POINT_PATTERNS.iter() {
        for cap in re.captures_iter(content) {
            if let Some(m) = cap.get(1).filter(|m| m.as_str().len() < 100) {
                points.push(format!("{prefix} {}", m.as_str().trim()));
            }
        }
    }
    points.truncate(MAX_KEY_POINTS);
    points
}

pub fn section_risk(heading: &str, content: &str) -> RiskLevel {
    let text = format!("{heading} {content}");
    if HIGH_RISK.iter().any(|re| re.is_match(&text)) {
        RiskLevel::High
    } else if MEDIUM_RISK.iter().any(|re| re.is_match(&text)) {
        RiskLevel::Medium
    } else if LOW_RISK.iter().any(|re| re.is_match(&text)) {
        RiskLevel::Low
    } else {
        RiskLevel::Medium
    }
}

fn category_hints(section: &Section, doc_has_class_action: bool) -> Vec<InternalCategory> {
    let mut hints: Vec<InternalCategory> = section.kind.category_hints().to_vec();
    let mut add = |c: InternalCategory| {
        if !hints.contains(&c) {
            hints.push(c);
        }
    };
    for (re, cat) in CONTENT_HINTS.iter() {
        if re.is_match(&section.heading) || re.is_match(&section.content) {
            add(*cat);
        }
    }
    // arbitration sections usually carry the waiver even when worded elsewhere
    if doc_has_class_action
        && (ARBITRATION.is_match(&section.heading) || ARBITRATION.is_match(&section.content))
    {
        add(InternalCategory::DisputeResolution);
        add(InternalCategory::ClassActions);
    }
    hints
}

/* ----------------------------
Document level
---------------------------- */

fn plain_translations(text: &str) -> Vec<String> {
    PLAIN_LANGUAGE_RE
        .iter()
        .filter(|(_, re, _)| re.is_match(text))
        .take(MAX_TRANSLATIONS)
        .map(|(legal, _, plain)| format!("{legal} -> {plain}"))
        .collect()
}

fn findings(sections: &[SectionSummary]) -> Vec<String> {
    CONCERNING
        .iter()
        .chain(POSITIVE.iter())
        .filter(|(re, _)| sections.iter().any(|s| re.is_match(&s.original_text)))
        .map(|(_, f)| f.to_string())
        .collect()
}

pub fn overall_risk(sections: &[SectionSummary]) -> OverallRisk {
    let count = |lvl: RiskLevel| sections.iter().filter(|s| s.risk_level == lvl).count();
    let (high, medium, low) = (count(RiskLevel::High), count(RiskLevel::Medium), count(RiskLevel::Low));
    if sections.is_empty() {
        return OverallRisk::LowMedium;
    }
    let ratio = high as f64 / sections.len() as f64;
    if ratio > 0.3 {
        OverallRisk::High
    } else if ratio > 0.1 || high > 2 {
        OverallRisk::MediumHigh
    } else if medium > low {
        OverallRisk::Medium
    } else {
        OverallRisk::LowMedium
    }
}

fn overview(sections: &[SectionSummary], text: &str) -> String {
    let high = sections.iter().filter(|s| s.risk_level == RiskLevel::High).count();
    let medium = sections.iter().filter(|s| s.risk_level == RiskLevel::Medium).count();

    let mut out = String::from("Here's what this agreement means in plain language:\n\n");
    out.push_str("Quick overview: ");
    out.push_str(&format!("This document has {} main sections. ", sections.len()));
    if high > 0 {
        out.push_str(&format!(
            "{high} section(s) need your attention because they affect your rights or money. "
        ));
    }
    if medium > 0 {
        out.push_str(&format!(
            "{medium} section(s) have moderate impact on how you use the service."
        ));
    }
    out = out.trim_end().to_string();
    out.push_str("\n\n");

    let translations = plain_translations(text);
    if !translations.is_empty() {
        out.push_str("A few key translations to plain language:\n");
        let lines: Vec<String> = translations.iter().map(|t| format!("- {t}")).collect();
        out.push_str(&lines.join("\n"));
        out.push_str("\n\n");
    }
    out.trim_end().to_string()
}

fn alert(sections: &[SectionSummary]) -> Option<String> {
    let high = sections.iter().filter(|s| s.risk_level == RiskLevel::High).count();
    match high {
        0 => None,
        1 | 2 => Some(
            "This agreement has some terms that affect your rights. Pay special attention to the highlighted sections."
                .into(),
        ),
        _ => Some(
            "This agreement has several sections that significantly limit your rights or increase your responsibilities. Consider reviewing carefully before agreeing."
                .into(),
        ),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Summarizer;

impl Summarizer {
    pub fn new() -> Self {
        Self
    }

    pub fn summarize(&self, text: &str) -> DocumentSummary {
        let mut sections = split_sections(text);
        synthesize_critical_sections(text, &mut sections);
        let doc_has_class_action = CLASS_ACTION.is_match(text);

        let summaries: Vec<SectionSummary> = sections
            .iter()
            .map(|s| SectionSummary {
                heading: s.heading.clone(),
                kind: s.kind,
                summary: plain_summary(s),
                key_points: key_points(&s.content),
                risk_level: section_risk(&s.heading, &s.content),
                category_hints: category_hints(s, doc_has_class_action),
                user_friendly_heading: s.kind.friendly_heading().to_string(),
                original_text: s.content.clone(),
                rights: None,
            })
            .collect();

        debug!(target: "summarize", sections = summaries.len(), "summarized");

        let overall = if summaries.is_empty() {
            "We couldn't find any content to summarize in this document.".to_string()
        } else {
            overview(&summaries, text)
        };

        DocumentSummary {
            overall,
            overall_risk: overall_risk(&summaries),
            key_findings: findings(&summaries),
            plain_language_alert: alert(&summaries),
            metadata: SummaryMetadata {
                section_count: summaries.len(),
                timestamp: Utc::now(),
            },
            sections: summaries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOS: &str = "Terms of Service\n\n1. Acceptance of Terms\nBy accessing this service, you agree to be bound by these terms and all applicable laws.\n\n2. Privacy\nWe collect your personal information and may share it with third parties for advertising.\n\n3. Termination\nWe may terminate your account without notice for any reason at our sole discretion.\n";

    #[test]
    fn headings_are_detected() {
        assert!(is_heading("1. Acceptance of Terms"));
        assert!(is_heading("SECTION 4 LIMITATION OF LIABILITY"));
        assert!(is_heading("Terms of Service"));
        assert!(!is_heading("We collect your personal information and may share it."));
        assert!(!is_heading("1. You must be at least eighteen years old to use this."));
    }

    #[test]
    fn sections_follow_headings() {
        let sections = split_sections(TOS);
        let headings: Vec<&str> = sections.iter().map(|s| s.heading.as_str()).collect();
        assert_eq!(headings, vec!["1. Acceptance of Terms", "2. Privacy", "3. Termination"]);
        assert_eq!(sections[1].kind, SectionKind::Privacy);
    }

    #[test]
    fn headless_text_groups_paragraphs_on_topic_change() {
        let text = "This service is provided for general entertainment purposes only. \
                    We may update these terms whenever we want to do so. \
                    Payment is due at the start of each billing period.";
        let sections = split_sections(text);
        assert!(sections.len() >= 2, "{sections:?}");
        assert!(sections.iter().all(|s| s.heading.starts_with("Section ")));
    }

    #[test]
    fn risk_levels() {
        assert_eq!(section_risk("Termination", "we may terminate your account without notice"), RiskLevel::High);
        assert_eq!(section_risk("Cookies", "we use cookies"), RiskLevel::Medium);
        assert_eq!(section_risk("Contact", "contact support any time"), RiskLevel::Low);
        assert_eq!(section_risk("Misc", "nothing notable"), RiskLevel::Medium);
    }

    #[test]
    fn plain_language_mapping_is_whole_word() {
        let out = to_plain_language("You shall not breach this. The shallow pool.");
        assert_eq!(out, "You will not breaking the rules this. The shallow pool.");
    }

    #[test]
    fn summary_reports_findings_and_risk() {
        let s = Summarizer::new().summarize(TOS);
        assert_eq!(s.metadata.section_count, s.sections.len());
        assert!(s
            .key_findings
            .iter()
            .any(|f| f.contains("terminated without warning")));
        let privacy = &s.sections[1];
        assert_eq!(privacy.risk_level, RiskLevel::High);
        assert!(privacy.category_hints.contains(&InternalCategory::DataPractices));
        assert_eq!(privacy.user_friendly_heading, "Your Privacy & Data");
        assert!(s.plain_language_alert.is_some());
        assert_eq!(s.overall_risk, OverallRisk::High);
    }

    #[test]
    fn arbitration_sections_hint_class_actions() {
        let text = "Welcome to the service and thanks for joining us today.\n\nAny dispute will be settled by binding arbitration in Delaware. You waive any class action.";
        let s = Summarizer::new().summarize(text);
        assert!(s.sections.iter().any(|x| x.category_hints.contains(&InternalCategory::ClassActions)));
    }

    #[test]
    fn missing_arbitration_section_is_synthesized() {
        let text = "Welcome to our wonderful service for everyone.\n\nArbitration only.\n\nThanks for reading all of this today.";
        let s = Summarizer::new().summarize(text);
        let synth = s
            .sections
            .iter()
            .find(|x| x.heading == "Dispute Resolution (Arbitration)")
            .expect("synthesized section");
        assert!(synth.original_text.starts_with("Arbitration only."));
        assert!(synth.category_hints.contains(&InternalCategory::DisputeResolution));
    }

    #[test]
    fn empty_text_has_no_sections() {
        let s = Summarizer::new().summarize("");
        assert!(s.sections.is_empty());
        assert_eq!(s.overall_risk, OverallRisk::LowMedium);
        assert!(s.plain_language_alert.is_none());
    }

    #[test]
    fn serializes_kind_as_type() {
        let s = Summarizer::new().summarize(TOS);
        let v = serde_json::to_value(&s).unwrap();
        assert_eq!(v["sections"][1]["type"], "privacy");
        assert!(v["sections"][0].get("rights").is_none());
        assert!(v["overallRisk"].is_string());
    }
}
