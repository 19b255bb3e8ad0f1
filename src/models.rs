// src/models.rs

use regex::{Regex, RegexBuilder};
use std::fmt;

// --- LIST SOURCE SPECIFIERS ---

/// Where a specifier's raw list comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    Clipboard,
    File,
    ProcessOutput,
    Url,
    InlineCsv,
    Stdin,
    ExternalScript,
    Range,
    /// Copies the raw list of another specifier, without its modifiers.
    DuplicateOf(isize),
    /// Copies the raw list of another specifier and replays its modifiers first.
    DuplicateWithModifiersOf(isize),
}

impl SourceKind {
    /// Returns the referenced index for the duplicate kinds.
    pub fn duplicate_target(&self) -> Option<isize> {
        match self {
            Self::DuplicateOf(index) | Self::DuplicateWithModifiersOf(index) => Some(*index),
            _ => None,
        }
    }
}

/// A parsed descriptor of one list source plus its ordered modifier chain.
#[derive(Debug, Clone, PartialEq)]
pub struct ListSourceSpecifier {
    pub kind: SourceKind,
    pub source_argument: Option<String>,
    pub modifiers: Vec<ModifierSpec>,
    /// The text the specifier was parsed from, kept for diagnostics.
    pub original_token: String,
}

impl ListSourceSpecifier {
    /// True if the chain ends with a `transpose` modifier.
    pub fn is_transposed(&self) -> bool {
        matches!(self.modifiers.last(), Some(ModifierSpec::Transpose))
    }

    /// Every fixed template position requested through `insert-at-index`, in declaration order.
    pub fn insert_positions(&self) -> Vec<usize> {
        self.modifiers
            .iter()
            .filter_map(|m| match m {
                ModifierSpec::InsertAt(position) => Some(*position),
                _ => None,
            })
            .collect()
    }

    /// Drops every `insert-at-index` modifier.
    pub fn without_insert_positions(mut self) -> Self {
        self.modifiers
            .retain(|m| !matches!(m, ModifierSpec::InsertAt(_)));
        self
    }
}

// --- MODIFIERS ---

/// A single named transformation applied to a specifier's list.
#[derive(Debug, Clone, PartialEq)]
pub enum ModifierSpec {
    Escape,
    Format {
        conversion: FormatConversion,
        format: String,
    },
    Flatten {
        separator: String,
    },
    FilterRegex(RegexPattern),
    ExtractRegex {
        group: usize,
        pattern: RegexPattern,
    },
    Replace {
        from: String,
        to: String,
    },
    Slice {
        exclude: bool,
        slices: Vec<SliceSpec>,
    },
    Split(RegexPattern),
    Substring(SliceSpec),
    Strip {
        side: StripSide,
        chars: Option<String>,
    },
    Wildcard {
        inverted: bool,
        pattern: String,
    },
    ExtractAll {
        group: usize,
        pattern: RegexPattern,
    },
    Transpose,
    Subprocess(String),
    ScriptHook {
        path: String,
        argument: Option<String>,
    },
    InsertAt(usize),
}

impl ModifierSpec {
    /// Modifiers that transform list contents. `transpose` and `insert-at-index`
    /// only change how the list is consumed.
    pub fn transforms_list(&self) -> bool {
        !matches!(self, Self::Transpose | Self::InsertAt(_))
    }
}

/// How each element is converted before a `format` modifier runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatConversion {
    None,
    Int,
    Float,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StripSide {
    Both,
    Left,
    Right,
}

/// A Python-like indexer: either a single index or a `start:stop:step` range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceSpec {
    Index(i64),
    Range {
        start: Option<i64>,
        stop: Option<i64>,
        step: Option<i64>,
    },
}

/// A compiled regular expression that compares equal by its source text.
#[derive(Clone)]
pub struct RegexPattern {
    regex: Regex,
    case_insensitive: bool,
}

impl RegexPattern {
    pub fn new(source: &str, case_insensitive: bool) -> Result<Self, regex::Error> {
        let regex = RegexBuilder::new(source)
            .case_insensitive(case_insensitive)
            .build()?;
        Ok(Self {
            regex,
            case_insensitive,
        })
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

impl PartialEq for RegexPattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str() && self.case_insensitive == other.case_insensitive
    }
}

impl fmt::Debug for RegexPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/", self.as_str())?;
        if self.case_insensitive {
            write!(f, "i")?;
        }
        Ok(())
    }
}

// --- TEMPLATE ---

/// The content of an inline marker, before binding.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkerContent {
    /// `%%%%`: takes the next unbound specifier.
    Sequential,
    /// `%%N%%`: binds to a specifier by index, negative counts from the end.
    Index(isize),
    /// `%%fapply-list.txt%%`: declares a new specifier in place.
    Declared(ListSourceSpecifier),
}

/// One piece of a template argument after marker scanning.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePiece {
    Literal(String),
    Marker(MarkerContent),
}

/// One piece of a composite argument, after binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotPiece {
    Literal(String),
    List(usize),
}

/// One argument position of the resolved template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgumentSlot {
    /// Passed through unchanged.
    Literal(String),
    /// The whole argument is the current element of a specifier's list.
    Whole(usize),
    /// Literal text and list elements concatenated into a single argument.
    Composite(Vec<SlotPiece>),
}

/// The template with every marker bound to a specifier index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedTemplate {
    pub slots: Vec<ArgumentSlot>,
}

// --- PIPELINE OUTPUT ---

/// A specifier's list after its modifier chain has run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedList {
    pub values: Vec<String>,
    pub transposed: bool,
}

/// The ordered set of concrete argument vectors to execute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunPlan {
    runs: Vec<Vec<String>>,
}

impl RunPlan {
    pub fn new(runs: Vec<Vec<String>>) -> Self {
        Self { runs }
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn runs(&self) -> &[Vec<String>] {
        &self.runs
    }

    pub fn into_runs(self) -> Vec<Vec<String>> {
        self.runs
    }
}

// --- OPTIONS ---

/// What fills the gap when `/rollover` stretches a shorter list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RolloverFill {
    /// Repeat the list's own elements.
    Repeat,
    /// Pad with empty strings.
    Blank,
}

/// The raw alignment switches, as given on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlignmentOptions {
    pub repeat: Option<usize>,
    pub rollover: Option<RolloverFill>,
    pub cross_join: bool,
}

/// Options consumed by the templating pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateOptions {
    pub alignment: AlignmentOptions,
    /// When false, marker syntax is left untouched.
    pub inline_markers: bool,
}

impl Default for TemplateOptions {
    fn default() -> Self {
        Self {
            alignment: AlignmentOptions::default(),
            inline_markers: true,
        }
    }
}
