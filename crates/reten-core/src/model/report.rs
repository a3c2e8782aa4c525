use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::{fmt, str::FromStr};

/// Distinct confirming devices required before a report counts as corroborated.
pub const CORROBORATION_THRESHOLD: u32 = 3;

/// Maximum length of a report description, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 200;

/// Maximum length of a comment body, in characters.
pub const MAX_COMMENT_CHARS: usize = 120;

/// How many leading characters of a device token are shown as comment attribution.
pub const TOKEN_PREFIX_CHARS: usize = 6;

/// The interval after creation during which a report is visible.
///
/// Visibility is always derived from `created_at`; it is never stored and
/// there is no expiry job.
#[must_use]
pub fn visibility_window() -> Duration {
    Duration::hours(2)
}

/// The five checkpoint categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    VehicularControl,
    SobrietyCheck,
    DocumentCheck,
    Fines,
    #[default]
    Unspecified,
}

impl Category {
    /// All known categories in display order.
    pub const ALL: [Self; 5] = [
        Self::VehicularControl,
        Self::SobrietyCheck,
        Self::DocumentCheck,
        Self::Fines,
        Self::Unspecified,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::VehicularControl => "vehicular-control",
            Self::SobrietyCheck => "sobriety-check",
            Self::DocumentCheck => "document-check",
            Self::Fines => "fines",
            Self::Unspecified => "unspecified",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown category string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory {
    pub raw: String,
}

impl fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown category '{}': expected one of vehicular-control, sobriety-check, \
             document-check, fines, unspecified",
            self.raw
        )
    }
}

impl std::error::Error for UnknownCategory {}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vehicular-control" => Ok(Self::VehicularControl),
            "sobriety-check" => Ok(Self::SobrietyCheck),
            "document-check" => Ok(Self::DocumentCheck),
            "fines" => Ok(Self::Fines),
            "unspecified" => Ok(Self::Unspecified),
            _ => Err(UnknownCategory { raw: s.to_string() }),
        }
    }
}

/// A validated latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

/// Error returned for out-of-range or non-finite coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvalidLocation {
    pub lat: f64,
    pub lng: f64,
}

impl fmt::Display for InvalidLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid coordinates ({}, {}): latitude must be within [-90, 90] and \
             longitude within [-180, 180]",
            self.lat, self.lng
        )
    }
}

impl std::error::Error for InvalidLocation {}

impl Location {
    /// Validate and construct a coordinate pair.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidLocation`] when either component is non-finite or
    /// outside its valid range.
    pub fn new(lat: f64, lng: f64) -> Result<Self, InvalidLocation> {
        let valid = lat.is_finite()
            && lng.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lng);

        if valid {
            Ok(Self { lat, lng })
        } else {
            Err(InvalidLocation { lat, lng })
        }
    }
}

/// Store-assigned report identifier (`rt-` followed by 12 hex characters).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportId(String);

impl ReportId {
    /// Wrap an identifier received from the store.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Generate a fresh identifier. Only the store assigns ids.
    #[must_use]
    pub fn generate() -> Self {
        use rand::Rng as _;

        let mut rng = rand::thread_rng();
        let suffix: String = (0..12)
            .map(|_| {
                let nibble: u8 = rng.gen_range(0..16);
                char::from_digit(u32::from(nibble), 16).unwrap_or('0')
            })
            .collect();
        Self(format!("rt-{suffix}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derived presentation hint for a report's corroboration level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Heat {
    Normal,
    Corroborated,
}

impl fmt::Display for Heat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => f.write_str("normal"),
            Self::Corroborated => f.write_str("corroborated"),
        }
    }
}

/// One comment on a report. Append-only; comments are never edited,
/// reordered, or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Comment body, trimmed, at most [`MAX_COMMENT_CHARS`] characters.
    pub text: String,
    /// First [`TOKEN_PREFIX_CHARS`] characters of the author's device token.
    /// The full token is never exposed.
    pub author_prefix: String,
    pub created_at: DateTime<Utc>,
}

/// Return the attribution prefix for a device token.
#[must_use]
pub fn token_prefix(token: &str) -> String {
    token.chars().take(TOKEN_PREFIX_CHARS).collect()
}

/// A checkpoint sighting report.
///
/// Mutated only by confirm (grows `voter_tokens`, bumps `confirmations`) and
/// by comment (appends to `comments`). Never explicitly deleted; it simply
/// stops being visible once `created_at` falls out of the window.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub id: ReportId,
    pub location: Location,
    pub category: Category,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Opaque device token of the submitter. Never displayed in full.
    pub author_token: String,
    /// Count of distinct corroborating tokens. Equals `voter_tokens.len()`.
    pub confirmations: u32,
    /// Tokens that have confirmed. Grow-only; membership is idempotent.
    pub voter_tokens: BTreeSet<String>,
    pub comments: Vec<Comment>,
}

impl Report {
    /// True while `now - created_at` is inside the visibility window.
    #[must_use]
    pub fn is_visible(&self, now: DateTime<Utc>) -> bool {
        now - self.created_at < visibility_window()
    }

    /// The instant this report stops being visible.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.created_at + visibility_window()
    }

    /// True if `token` has already confirmed this report.
    #[must_use]
    pub fn has_voted(&self, token: &str) -> bool {
        self.voter_tokens.contains(token)
    }

    /// Corroboration level derived from the confirmation count.
    #[must_use]
    pub const fn heat(&self) -> Heat {
        if self.confirmations >= CORROBORATION_THRESHOLD {
            Heat::Corroborated
        } else {
            Heat::Normal
        }
    }
}
