//! Annotation records in the host's flattened column layout
//!
//! The host stores the selector triple as plain columns and emits rows with
//! every value as a string, so integers here accept both `7` and `"7"`.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{de, Deserialize, Deserializer, Serialize};

use crate::anchoring::{RangeSelector, SelectorTriple, TextPositionSelector, TextQuoteSelector};

/// Marker for an unset selector column
pub const UNSET: i64 = -1;

fn lenient_int<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<i64>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Text(String),
    }

    let value = match Raw::deserialize(deserializer)? {
        Raw::Int(n) => n,
        Raw::Text(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| de::Error::custom(format!("expected an integer, got {:?}", s)))?,
    };
    T::try_from(value).map_err(|_| de::Error::custom(format!("integer {} out of range", value)))
}

/// A persisted annotation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(deserialize_with = "lenient_int")]
    pub id: u64,
    #[serde(deserialize_with = "lenient_int")]
    pub submission: u64,
    /// Author
    #[serde(rename = "userid", deserialize_with = "lenient_int")]
    pub user_id: u64,
    /// Annotation type (category) id
    #[serde(rename = "type", deserialize_with = "lenient_int")]
    pub type_id: u64,
    /// Comment body
    #[serde(default)]
    pub text: String,
    #[serde(rename = "timecreated", deserialize_with = "lenient_int")]
    pub time_created: i64,
    #[serde(rename = "timemodified", deserialize_with = "lenient_int")]
    pub time_modified: i64,
    #[serde(rename = "startcontainer")]
    pub start_container: String,
    #[serde(rename = "endcontainer")]
    pub end_container: String,
    #[serde(rename = "startoffset", deserialize_with = "lenient_int")]
    pub start_offset: usize,
    #[serde(rename = "endoffset", deserialize_with = "lenient_int")]
    pub end_offset: usize,
    #[serde(rename = "annotationstart", deserialize_with = "lenient_int")]
    pub annotation_start: usize,
    #[serde(rename = "annotationend", deserialize_with = "lenient_int")]
    pub annotation_end: usize,
    pub exact: String,
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub suffix: String,
    /// Category color, filled in when the feed is served
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Annotation {
    /// The stored selector triple
    pub fn triple(&self) -> SelectorTriple {
        SelectorTriple {
            range: RangeSelector {
                start_container: self.start_container.clone(),
                start_offset: self.start_offset,
                end_container: self.end_container.clone(),
                end_offset: self.end_offset,
            },
            position: TextPositionSelector {
                start: self.annotation_start,
                end: self.annotation_end,
            },
            quote: TextQuoteSelector {
                exact: self.exact.clone(),
                prefix: self.prefix.clone(),
                suffix: self.suffix.clone(),
            },
        }
    }
}

/// The inbound annotation list, as an array or as an object keyed by id
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AnnotationFeed {
    List(Vec<Annotation>),
    Keyed(BTreeMap<String, Annotation>),
}

impl AnnotationFeed {
    pub fn into_vec(self) -> Vec<Annotation> {
        match self {
            AnnotationFeed::List(list) => list,
            AnnotationFeed::Keyed(map) => {
                let mut list: Vec<Annotation> = map.into_values().collect();
                list.sort_by_key(|a| a.id);
                list
            }
        }
    }
}

/// Outbound create/update form
///
/// `annotationid` 0 creates a new annotation. Selector columns not filled
/// in hold [`UNSET`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationForm {
    #[serde(default, deserialize_with = "lenient_int")]
    pub annotationid: u64,
    #[serde(deserialize_with = "lenient_int")]
    pub submission: u64,
    #[serde(default)]
    pub startcontainer: String,
    #[serde(default)]
    pub endcontainer: String,
    #[serde(default = "unset", deserialize_with = "lenient_int")]
    pub startoffset: i64,
    #[serde(default = "unset", deserialize_with = "lenient_int")]
    pub endoffset: i64,
    #[serde(default = "unset", deserialize_with = "lenient_int")]
    pub annotationstart: i64,
    #[serde(default = "unset", deserialize_with = "lenient_int")]
    pub annotationend: i64,
    #[serde(default)]
    pub exact: String,
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub suffix: String,
    #[serde(rename = "type", deserialize_with = "lenient_int")]
    pub type_id: u64,
    #[serde(default)]
    pub text: String,
}

fn unset() -> i64 {
    UNSET
}

fn column(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(UNSET)
}

impl AnnotationForm {
    /// Form creating a new annotation over `triple`
    pub fn create(submission: u64, triple: &SelectorTriple, type_id: u64, text: &str) -> Self {
        Self {
            annotationid: 0,
            submission,
            startcontainer: triple.range.start_container.clone(),
            endcontainer: triple.range.end_container.clone(),
            startoffset: column(triple.range.start_offset),
            endoffset: column(triple.range.end_offset),
            annotationstart: column(triple.position.start),
            annotationend: column(triple.position.end),
            exact: triple.quote.exact.clone(),
            prefix: triple.quote.prefix.clone(),
            suffix: triple.quote.suffix.clone(),
            type_id,
            text: text.to_string(),
        }
    }

    /// Form updating `existing`; the selector columns are carried over as stored
    pub fn update(existing: &Annotation, type_id: u64, text: &str) -> Self {
        Self {
            annotationid: existing.id,
            ..Self::create(existing.submission, &existing.triple(), type_id, text)
        }
    }

    pub fn is_create(&self) -> bool {
        self.annotationid == 0
    }

    /// Whether every selector column was filled in
    pub fn has_selectors(&self) -> bool {
        [
            self.startoffset,
            self.endoffset,
            self.annotationstart,
            self.annotationend,
        ]
        .iter()
        .all(|&v| v > UNSET)
    }

    /// Build the stored record for a new annotation, not yet modified
    pub fn into_annotation(self, id: u64, user_id: u64) -> Annotation {
        let now = Utc::now().timestamp();
        let offset = |v: i64| usize::try_from(v).unwrap_or(0);
        Annotation {
            id,
            submission: self.submission,
            user_id,
            type_id: self.type_id,
            text: self.text,
            time_created: now,
            time_modified: 0,
            start_container: self.startcontainer,
            end_container: self.endcontainer,
            start_offset: offset(self.startoffset),
            end_offset: offset(self.endoffset),
            annotation_start: offset(self.annotationstart),
            annotation_end: offset(self.annotationend),
            exact: self.exact,
            prefix: self.prefix,
            suffix: self.suffix,
            color: None,
        }
    }
}
