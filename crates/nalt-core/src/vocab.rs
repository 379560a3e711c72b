//! Closed vocabularies shared by every protocol version.
//!
//! Each enum exposes `ALL` (declaration order) and `as_str` so the version
//! registry can build its enum constraints from a single list.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when a string is not a member of a vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{value:?} is not a known {vocabulary}")]
pub struct UnknownTerm {
    pub vocabulary: &'static str,
    pub value: String,
}

macro_rules! vocabulary {
    (
        $(#[$meta:meta])*
        $name:ident, $label:literal {
            $($(#[$vmeta:meta])* $variant:ident => $text:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($(#[$vmeta])* #[serde(rename = $text)] $variant,)+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant,)+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }

            /// All wire values in declaration order.
            pub fn names() -> Vec<&'static str> {
                Self::ALL.iter().map(|term| term.as_str()).collect()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownTerm;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    _ => Err(UnknownTerm {
                        vocabulary: $label,
                        value: s.to_string(),
                    }),
                }
            }
        }
    };
}

vocabulary! {
    /// Kind of diary entry.
    EntryType, "entry type" {
        Event => "event",
        Reflection => "reflection",
        Task => "task",
        Idea => "idea",
        Log => "log",
    }
}

vocabulary! {
    /// Time-of-day bucket an entry belongs to, in local time.
    EntryMode, "entry mode" {
        /// 05:00-11:59
        Morning => "morning",
        /// 12:00-17:59
        Afternoon => "afternoon",
        /// 18:00-21:59
        Evening => "evening",
        /// 22:00-04:59
        Night => "night",
        None => "none",
    }
}

vocabulary! {
    /// Content MIME types accepted from 1.1.0 onward.
    ContentFormat, "content format" {
        Plain => "text/plain",
        Markdown => "text/markdown",
        Html => "text/html",
        Json => "application/json",
        Org => "text/org",
    }
}

vocabulary! {
    /// Relation between two entries of the same document.
    RelationType, "relation type" {
        CausedBy => "caused_by",
        LedTo => "led_to",
        RelatedTo => "related_to",
        Explains => "explains",
        Contradicts => "contradicts",
    }
}

vocabulary! {
    SignatureAlg, "signature algorithm" {
        EdDsa => "EdDSA",
        Es256 => "ES256",
        Rs256 => "RS256",
    }
}

vocabulary! {
    /// The fixed mood vocabulary enforced while moods are core fields.
    MoodKind, "mood" {
        Happy => "happy",
        Excited => "excited",
        Peaceful => "peaceful",
        Content => "content",
        Grateful => "grateful",
        Calm => "calm",
        Hopeful => "hopeful",
        Proud => "proud",
        Motivated => "motivated",
        Sad => "sad",
        Angry => "angry",
        Anxious => "anxious",
        Frustrated => "frustrated",
        Tired => "tired",
        Confused => "confused",
        Lonely => "lonely",
        Neutral => "neutral",
        Curious => "curious",
        Nostalgic => "nostalgic",
        Surprised => "surprised",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Positive,
    Negative,
    Neutral,
}

impl MoodKind {
    pub fn polarity(&self) -> Polarity {
        use MoodKind::*;
        match self {
            Happy | Excited | Peaceful | Content | Grateful | Calm | Hopeful | Proud
            | Motivated => Polarity::Positive,
            Sad | Angry | Anxious | Frustrated | Tired | Confused | Lonely => Polarity::Negative,
            Neutral | Curious | Nostalgic | Surprised => Polarity::Neutral,
        }
    }
}
