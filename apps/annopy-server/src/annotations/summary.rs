//! Annotation counts per type and per participant

use std::collections::BTreeMap;

use serde::Serialize;

use super::categories::{CategoryLabel, CategoryRegistry};
use super::types::Annotation;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeCount {
    #[serde(rename = "type")]
    pub type_id: u64,
    #[serde(flatten)]
    pub label: CategoryLabel,
    #[serde(rename = "totalcount")]
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParticipantCount {
    #[serde(rename = "userid")]
    pub user_id: u64,
    /// Count per type id; types the user never used are absent
    pub counts: BTreeMap<u64, usize>,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotationSummary {
    /// Every live type in priority order, then removed types still in use
    pub types: Vec<TypeCount>,
    /// By user id
    pub participants: Vec<ParticipantCount>,
    pub total: usize,
}

/// Count `annotations`, labelling each type through `categories`
pub fn summarize(annotations: &[Annotation], categories: &CategoryRegistry) -> AnnotationSummary {
    let mut by_type: BTreeMap<u64, usize> = BTreeMap::new();
    let mut by_user: BTreeMap<u64, BTreeMap<u64, usize>> = BTreeMap::new();
    for annotation in annotations {
        *by_type.entry(annotation.type_id).or_default() += 1;
        *by_user
            .entry(annotation.user_id)
            .or_default()
            .entry(annotation.type_id)
            .or_default() += 1;
    }

    let mut types: Vec<TypeCount> = categories
        .list()
        .iter()
        .map(|t| TypeCount {
            type_id: t.id,
            label: categories.label(t.id),
            count: by_type.get(&t.id).copied().unwrap_or(0),
        })
        .collect();
    types.extend(
        by_type
            .iter()
            .filter(|(id, _)| !categories.contains(**id))
            .map(|(&type_id, &count)| TypeCount {
                type_id,
                label: CategoryLabel::deleted(),
                count,
            }),
    );

    let participants = by_user
        .into_iter()
        .map(|(user_id, counts)| ParticipantCount {
            user_id,
            total: counts.values().sum(),
            counts,
        })
        .collect();

    AnnotationSummary {
        total: types.iter().map(|t| t.count).sum(),
        types,
        participants,
    }
}
