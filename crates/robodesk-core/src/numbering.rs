//! # Contract Number Generation
//!
//! Two numbering strategies share one layout: a zero-padded counter embedded
//! between a prefix and a suffix. A mask reads the counter of each existing
//! number as the digits between this year's prefix and suffix; sequential
//! numbering reads the trailing digit run of the latest number.
//!
//! ```text
//! Mask "CNT-{YYYY}-{NNN}", year 2024
//!   prefix "CNT-2024-" ── existing CNT-2024-007, CNT-2024-012 ──► CNT-2024-013
//!
//! Sequential "CON-" width 5
//!   latest contract CON-00041 ──────────────────────────────────► CON-00042
//! ```
//!
//! Generation is not atomic with the insert. Two concurrent generations can
//! produce the same number; the unique index on `contracts.contract_number`
//! rejects the second insert and the caller reports a duplicate-number error.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{CoreError, CoreResult};
use crate::{DEFAULT_CONTRACT_MASK, SEQUENTIAL_CONTRACT_PREFIX};

static TRAILING_DIGITS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)$").expect("trailing digit pattern is valid"));

const YEAR_TOKEN: &str = "{YYYY}";
const SEQUENCE_TOKEN: &str = "{NNN}";

/// Parses the trailing run of ASCII digits of `s`.
///
/// ## Example
/// ```rust
/// use robodesk_core::numbering::trailing_number;
///
/// assert_eq!(trailing_number("CNT-2024-012"), Some(12));
/// assert_eq!(trailing_number("DRAFT"), None);
/// ```
pub fn trailing_number(s: &str) -> Option<u64> {
    TRAILING_DIGITS
        .captures(s)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

// =============================================================================
// Shared primitive
// =============================================================================

/// Layout of a generated number: `prefix` + zero-padded counter + `suffix`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceFormat {
    pub prefix: String,
    pub suffix: String,
    pub width: usize,
}

impl SequenceFormat {
    /// Next number after the largest counter found in `previous`.
    ///
    /// The suffix is stripped before the trailing digit run is read.
    /// Candidates without digits are ignored; with no usable candidate the
    /// counter starts at 1.
    pub fn next_after<'a, I>(&self, previous: I) -> String
    where
        I: IntoIterator<Item = &'a str>,
    {
        let max = previous
            .into_iter()
            .filter_map(|number| {
                let body = number.strip_suffix(self.suffix.as_str()).unwrap_or(number);
                trailing_number(body)
            })
            .max()
            .unwrap_or(0);

        self.render(max + 1)
    }

    /// Counter of a number laid out as `prefix` + digits + `suffix`.
    ///
    /// `None` when the number has another layout or the part between prefix
    /// and suffix is not all ASCII digits.
    pub fn counter_of(&self, number: &str) -> Option<u64> {
        let digits = number
            .strip_prefix(self.prefix.as_str())?
            .strip_suffix(self.suffix.as_str())?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }

    /// Renders a counter value with padding.
    pub fn render(&self, counter: u64) -> String {
        format!(
            "{}{:0width$}{}",
            self.prefix,
            counter,
            self.suffix,
            width = self.width
        )
    }
}

// =============================================================================
// Mask-driven numbering
// =============================================================================

/// Configurable mask such as `CNT-{YYYY}-{NNN}`.
///
/// `{YYYY}` is replaced by the year, `{NNN}` by a 3-digit counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberMask {
    mask: String,
}

impl NumberMask {
    /// Counter width used for masks.
    pub const WIDTH: usize = 3;

    /// Validates a mask. It must contain exactly one `{NNN}`.
    pub fn parse(mask: &str) -> CoreResult<Self> {
        let mask = mask.trim();
        match mask.matches(SEQUENCE_TOKEN).count() {
            1 => Ok(NumberMask {
                mask: mask.to_string(),
            }),
            0 => Err(CoreError::InvalidMask {
                mask: mask.to_string(),
                reason: format!("missing {}", SEQUENCE_TOKEN),
            }),
            _ => Err(CoreError::InvalidMask {
                mask: mask.to_string(),
                reason: format!("more than one {}", SEQUENCE_TOKEN),
            }),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.mask
    }

    /// Prefix/suffix layout for `year`.
    pub fn format_for(&self, year: i32) -> SequenceFormat {
        let rendered = self.mask.replace(YEAR_TOKEN, &year.to_string());
        let (prefix, suffix) = rendered
            .split_once(SEQUENCE_TOKEN)
            .unwrap_or((rendered.as_str(), ""));
        SequenceFormat {
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
            width: Self::WIDTH,
        }
    }

    /// Text before the counter for `year`; the lookup key for existing numbers.
    pub fn prefix(&self, year: i32) -> String {
        self.format_for(year).prefix
    }

    /// Next number for `year` given the numbers already issued.
    ///
    /// Only the digits between this year's prefix and suffix count, so a
    /// year placed right before the counter is never read as part of it.
    /// Numbers that do not follow this year's layout are ignored.
    ///
    /// ## Example
    /// ```rust
    /// use robodesk_core::numbering::NumberMask;
    ///
    /// let mask = NumberMask::default();
    /// let next = mask.next(2024, &["CNT-2024-007", "CNT-2024-012", "CNT-2023-099"]);
    /// assert_eq!(next, "CNT-2024-013");
    /// ```
    pub fn next<S: AsRef<str>>(&self, year: i32, existing: &[S]) -> String {
        let format = self.format_for(year);
        let max = existing
            .iter()
            .filter_map(|n| format.counter_of(n.as_ref()))
            .max()
            .unwrap_or(0);
        format.render(max + 1)
    }
}

impl Default for NumberMask {
    fn default() -> Self {
        NumberMask {
            mask: DEFAULT_CONTRACT_MASK.to_string(),
        }
    }
}

// =============================================================================
// Sequential-suffix numbering
// =============================================================================

/// Fixed prefix plus a counter taken from the most recent contract number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequentialSuffix {
    format: SequenceFormat,
}

impl SequentialSuffix {
    pub fn new(prefix: impl Into<String>, width: usize) -> Self {
        SequentialSuffix {
            format: SequenceFormat {
                prefix: prefix.into(),
                suffix: String::new(),
                width,
            },
        }
    }

    /// Next number after `latest`, whatever layout `latest` used.
    ///
    /// ## Example
    /// ```rust
    /// use robodesk_core::numbering::SequentialSuffix;
    ///
    /// let seq = SequentialSuffix::default();
    /// assert_eq!(seq.next(Some("CON-00041")), "CON-00042");
    /// assert_eq!(seq.next(None), "CON-00001");
    /// ```
    pub fn next(&self, latest: Option<&str>) -> String {
        self.format.next_after(latest)
    }
}

impl Default for SequentialSuffix {
    fn default() -> Self {
        SequentialSuffix::new(SEQUENTIAL_CONTRACT_PREFIX, 5)
    }
}

/// Which numbering a call site uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NumberingStrategy {
    /// Offer won → contract, and the new-contract dialog.
    Mask(NumberMask),
    /// Contract created from an offer by hand.
    Sequential(SequentialSuffix),
}

// =============================================================================
// Unit Tests
// =============================================================================
