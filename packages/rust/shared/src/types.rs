//! Rendering vocabulary shared by the engine, the config layer, and the CLI.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::StructPromptError;

// ---------------------------------------------------------------------------
// BulletStyle
// ---------------------------------------------------------------------------

/// A bullet glyph family.
///
/// Counting families (`Decimal`, the alpha and roman variants) number items
/// within one list, starting again at 1/`a`/`i` for every new list. The other
/// families print the same glyph for every item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BulletStyle {
    /// `1.`, `2.`, `3.`
    Decimal,
    /// `a.`, `b.`, ... `z.`, `aa.`
    LowerAlpha,
    /// `A.`, `B.`, ... `Z.`, `AA.`
    UpperAlpha,
    /// `i.`, `ii.`, `iii.`
    LowerRoman,
    /// `I.`, `II.`, `III.`
    UpperRoman,
    /// `-`
    Dash,
    /// `*`
    Star,
    /// `+`
    Plus,
    /// `•`
    Dot,
    /// Any other literal glyph, printed as-is.
    Symbol(String),
}

impl BulletStyle {
    /// The glyph for the `ordinal`-th item (1-based) of a list.
    pub fn glyph(&self, ordinal: usize) -> String {
        let n = ordinal.max(1);
        match self {
            Self::Decimal => format!("{n}."),
            Self::LowerAlpha => format!("{}.", alpha(n)),
            Self::UpperAlpha => format!("{}.", alpha(n).to_uppercase()),
            Self::LowerRoman => format!("{}.", roman(n)),
            Self::UpperRoman => format!("{}.", roman(n).to_uppercase()),
            Self::Dash => "-".into(),
            Self::Star => "*".into(),
            Self::Plus => "+".into(),
            Self::Dot => "•".into(),
            Self::Symbol(s) => s.clone(),
        }
    }

    /// Canonical config name of the style.
    pub fn name(&self) -> &str {
        match self {
            Self::Decimal => "decimal",
            Self::LowerAlpha => "lower-alpha",
            Self::UpperAlpha => "upper-alpha",
            Self::LowerRoman => "lower-roman",
            Self::UpperRoman => "upper-roman",
            Self::Dash => "dash",
            Self::Star => "star",
            Self::Plus => "plus",
            Self::Dot => "dot",
            Self::Symbol(s) => s,
        }
    }
}

impl FromStr for BulletStyle {
    type Err = StructPromptError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        let style = match trimmed.to_ascii_lowercase().as_str() {
            "" => {
                return Err(StructPromptError::parse("bullet style must not be empty"));
            }
            "decimal" | "number" | "numbered" => Self::Decimal,
            "lower-alpha" | "loweralpha" | "alpha" => Self::LowerAlpha,
            "upper-alpha" | "upperalpha" => Self::UpperAlpha,
            "lower-roman" | "lowerroman" | "roman" => Self::LowerRoman,
            "upper-roman" | "upperroman" => Self::UpperRoman,
            "dash" | "-" => Self::Dash,
            "star" | "asterisk" | "*" => Self::Star,
            "plus" | "+" => Self::Plus,
            "dot" | "bullet" | "•" => Self::Dot,
            _ => Self::Symbol(trimmed.to_string()),
        };
        Ok(style)
    }
}

impl TryFrom<String> for BulletStyle {
    type Error = StructPromptError;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BulletStyle> for String {
    fn from(style: BulletStyle) -> Self {
        style.name().to_string()
    }
}

impl fmt::Display for BulletStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Bijective base-26: 1 → a, 26 → z, 27 → aa.
fn alpha(mut n: usize) -> String {
    let mut out = Vec::new();
    while n > 0 {
        n -= 1;
        out.push(b'a' + (n % 26) as u8);
        n /= 26;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

fn roman(mut n: usize) -> String {
    const TABLE: [(usize, &str); 13] = [
        (1000, "m"),
        (900, "cm"),
        (500, "d"),
        (400, "cd"),
        (100, "c"),
        (90, "xc"),
        (50, "l"),
        (40, "xl"),
        (10, "x"),
        (9, "ix"),
        (5, "v"),
        (4, "iv"),
        (1, "i"),
    ];

    let mut out = String::new();
    for (value, numeral) in TABLE {
        while n >= value {
            out.push_str(numeral);
            n -= value;
        }
    }
    out
}

// ---------------------------------------------------------------------------
// IndentationPreferences
// ---------------------------------------------------------------------------

/// Runtime rendering preferences, merged from config file + CLI flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndentationPreferences {
    /// Indent width per nesting depth.
    pub spaces_per_level: usize,
    /// Glyph styles indexed by depth; depth 0 numbers the top-level sections.
    /// Depths past the end reuse the last entry.
    pub progression: Vec<BulletStyle>,
    /// Used only when `progression` is empty.
    pub fallback: BulletStyle,
    /// Emit one blank line between top-level sections.
    pub blank_line_between_top: bool,
}

impl Default for IndentationPreferences {
    fn default() -> Self {
        Self {
            spaces_per_level: 2,
            progression: vec![BulletStyle::Decimal, BulletStyle::Dash, BulletStyle::Star],
            fallback: BulletStyle::Dash,
            blank_line_between_top: true,
        }
    }
}

impl IndentationPreferences {
    /// Style applied to lists at `depth`, clamped to the last progression entry.
    pub fn style_for_depth(&self, depth: usize) -> &BulletStyle {
        self.progression
            .get(depth)
            .or_else(|| self.progression.last())
            .unwrap_or(&self.fallback)
    }

    /// Leading whitespace for content at `depth`.
    pub fn indent(&self, depth: usize) -> String {
        " ".repeat(self.spaces_per_level * depth)
    }
}
