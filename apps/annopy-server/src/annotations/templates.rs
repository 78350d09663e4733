//! Annotation type templates
//!
//! A site-wide library of reusable types. Default templates are offered to
//! everyone; custom templates belong to the user who created them and only
//! that user may use, change or delete them. Seeding or extending a
//! [`CategoryRegistry`](super::CategoryRegistry) copies the template, so
//! later template edits never reach existing types.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::categories::{CategoryError, HexColor, TypeTemplate};

/// A stored template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationTypeTemplate {
    pub id: u64,
    pub name: String,
    pub color: HexColor,
    /// Offered to every user
    #[serde(rename = "defaulttype")]
    pub default_type: bool,
    /// Creator
    #[serde(rename = "userid")]
    pub user_id: u64,
    #[serde(rename = "timecreated")]
    pub time_created: i64,
    #[serde(rename = "timemodified")]
    pub time_modified: i64,
}

impl AnnotationTypeTemplate {
    /// Whether `user` may add this template to a registry
    pub fn usable_by(&self, user: u64) -> bool {
        self.default_type || self.user_id == user
    }

    pub fn template(&self) -> TypeTemplate {
        TypeTemplate {
            name: self.name.clone(),
            color: self.color.clone(),
        }
    }
}

/// Changes to a template; `None` leaves a field alone
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TemplateChanges {
    pub name: Option<String>,
    pub color: Option<String>,
    #[serde(rename = "defaulttype")]
    pub default_type: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct TemplateLibrary {
    templates: BTreeMap<u64, AnnotationTypeTemplate>,
    next_id: u64,
}

impl TemplateLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: u64) -> Option<&AnnotationTypeTemplate> {
        self.templates.get(&id)
    }

    /// Default templates plus the custom ones of `user`, by id
    pub fn available(&self, user: u64) -> Vec<&AnnotationTypeTemplate> {
        self.templates
            .values()
            .filter(|t| t.usable_by(user))
            .collect()
    }

    pub fn defaults(&self) -> Vec<TypeTemplate> {
        self.templates
            .values()
            .filter(|t| t.default_type)
            .map(AnnotationTypeTemplate::template)
            .collect()
    }

    pub fn add(
        &mut self,
        user: u64,
        name: &str,
        color: &str,
        default_type: bool,
    ) -> Result<&AnnotationTypeTemplate, CategoryError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CategoryError::EmptyName);
        }
        let color = HexColor::parse(color)?;

        self.next_id = self.next_id.max(1);
        let id = self.next_id;
        self.next_id += 1;

        let now = Utc::now().timestamp();
        let template = AnnotationTypeTemplate {
            id,
            name: name.to_string(),
            color,
            default_type,
            user_id: user,
            time_created: now,
            time_modified: now,
        };
        Ok(&*self.templates.entry(id).or_insert(template))
    }

    fn editable(&mut self, user: u64, id: u64) -> Result<&mut AnnotationTypeTemplate, CategoryError> {
        let template = self
            .templates
            .get_mut(&id)
            .ok_or(CategoryError::NotFound(id))?;
        if template.usable_by(user) {
            Ok(template)
        } else {
            Err(CategoryError::NotAllowed(id))
        }
    }

    pub fn update(
        &mut self,
        user: u64,
        id: u64,
        changes: &TemplateChanges,
    ) -> Result<&AnnotationTypeTemplate, CategoryError> {
        let name = match changes.name.as_deref().map(str::trim) {
            Some("") => return Err(CategoryError::EmptyName),
            other => other.map(str::to_string),
        };
        let color = changes.color.as_deref().map(HexColor::parse).transpose()?;

        let template = self.editable(user, id)?;
        if let Some(name) = name {
            template.name = name;
        }
        if let Some(color) = color {
            template.color = color;
        }
        if let Some(default_type) = changes.default_type {
            template.default_type = default_type;
        }
        template.time_modified = Utc::now().timestamp();
        Ok(&*template)
    }

    pub fn remove(&mut self, user: u64, id: u64) -> Result<AnnotationTypeTemplate, CategoryError> {
        self.editable(user, id)?;
        self.templates.remove(&id).ok_or(CategoryError::NotFound(id))
    }

    /// Template `id`, if `user` may add it to a registry
    pub fn usable(&self, user: u64, id: u64) -> Result<TypeTemplate, CategoryError> {
        let template = self.get(id).ok_or(CategoryError::NotFound(id))?;
        if template.usable_by(user) {
            Ok(template.template())
        } else {
            Err(CategoryError::NotAllowed(id))
        }
    }

    /// Templates `ids` in the given order, for seeding a registry
    pub fn select(&self, user: u64, ids: &[u64]) -> Result<Vec<TypeTemplate>, CategoryError> {
        ids.iter().map(|&id| self.usable(user, id)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::CategoryRegistry;

    fn library() -> TemplateLibrary {
        let mut library = TemplateLibrary::new();
        library.add(1, "Grammar", "FF0000", true).unwrap();
        library.add(1, "Style", "00FF00", true).unwrap();
        library.add(2, "Mine", "0000FF", false).unwrap();
        library
    }

    #[test]
    fn test_custom_templates_are_private() {
        let library = library();
        let names = |user| -> Vec<String> {
            library
                .available(user)
                .iter()
                .map(|t| t.name.clone())
                .collect()
        };
        assert_eq!(names(2), vec!["Grammar", "Style", "Mine"]);
        assert_eq!(names(3), vec!["Grammar", "Style"]);
        assert_eq!(library.defaults().len(), 2);
    }

    #[test]
    fn test_only_owner_changes_custom_template() {
        let mut library = library();
        let changes = TemplateChanges {
            name: Some("Theirs".into()),
            ..TemplateChanges::default()
        };
        assert_eq!(
            library.update(3, 3, &changes),
            Err(CategoryError::NotAllowed(3))
        );
        assert_eq!(library.remove(3, 3), Err(CategoryError::NotAllowed(3)));

        assert_eq!(library.update(2, 3, &changes).unwrap().name, "Theirs");
        assert!(library.remove(2, 3).is_ok());
        assert!(library.get(3).is_none());
    }

    #[test]
    fn test_invalid_template_rejected() {
        let mut library = library();
        assert_eq!(
            library.add(1, " ", "FF0000", true).map(|t| t.id),
            Err(CategoryError::EmptyName)
        );
        assert!(matches!(
            library.add(1, "Bad", "red", true),
            Err(CategoryError::InvalidColor(_))
        ));
    }

    #[test]
    fn test_seed_registry_from_selection() {
        let library = library();
        assert_eq!(library.select(3, &[3]), Err(CategoryError::NotAllowed(3)));

        let selected = library.select(2, &[3, 1]).unwrap();
        let registry = CategoryRegistry::from_templates(&selected);
        let names: Vec<&str> = registry.list().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Mine", "Grammar"]);
        assert_eq!(registry.list()[1].priority, 2);
    }

    #[test]
    fn test_template_edit_leaves_registry_alone() {
        let mut library = library();
        let registry = CategoryRegistry::from_templates(&library.defaults());

        let changes = TemplateChanges {
            color: Some("123456".into()),
            ..TemplateChanges::default()
        };
        library.update(1, 1, &changes).unwrap();
        assert_eq!(registry.get(1).unwrap().color.as_str(), "FF0000");
    }
}
