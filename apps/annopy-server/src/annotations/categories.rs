//! Annotation types (categories) and their ordering
//!
//! Each scope owns an ordered list of types whose priorities always form
//! exactly `1..=N`. Types can be seeded from templates, renamed, recolored,
//! reordered and removed. Removing a type never touches annotations that
//! reference it; those render with [`CategoryLabel::deleted`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Label shown for annotations whose type no longer exists
pub const DELETED_TYPE_NAME: &str = "deleted type";
/// Color used for annotations whose type no longer exists
pub const DELETED_TYPE_COLOR: &str = "FFFF00";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CategoryError {
    #[error("Invalid color {0:?}: expected 6 hex digits")]
    InvalidColor(String),

    #[error("Annotation type {0} not found")]
    NotFound(u64),

    #[error("Annotation type name must not be empty")]
    EmptyName,

    #[error("Not allowed to change annotation type template {0}")]
    NotAllowed(u64),

    #[error("Invalid direction {0:?}: expected \"up\" or \"down\"")]
    InvalidDirection(String),
}

/// Six hex digits, without the leading `#`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor(String);

impl HexColor {
    pub fn parse(value: &str) -> Result<Self, CategoryError> {
        if value.len() == 6 && value.chars().all(|c| c.is_ascii_hexdigit()) {
            Ok(Self(value.to_string()))
        } else {
            Err(CategoryError::InvalidColor(value.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for HexColor {
    type Error = CategoryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<HexColor> for String {
    fn from(color: HexColor) -> Self {
        color.0
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A category annotations are filed under
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationType {
    pub id: u64,
    pub name: String,
    pub color: HexColor,
    pub priority: u32,
}

/// Site-wide default from which scopes are seeded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeTemplate {
    pub name: String,
    pub color: HexColor,
}

/// What an annotation's type renders as
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryLabel {
    pub name: String,
    pub color: HexColor,
    pub deleted: bool,
}

impl CategoryLabel {
    pub fn deleted() -> Self {
        Self {
            name: DELETED_TYPE_NAME.to_string(),
            color: HexColor(DELETED_TYPE_COLOR.to_string()),
            deleted: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl FromStr for Direction {
    type Err = CategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            other => Err(CategoryError::InvalidDirection(other.to_string())),
        }
    }
}

/// Ordered annotation types of one scope
#[derive(Debug, Clone, Default)]
pub struct CategoryRegistry {
    /// Kept sorted by priority
    types: Vec<AnnotationType>,
    next_id: u64,
}

impl CategoryRegistry {
    pub fn new() -> Self {
        Self {
            types: Vec::new(),
            next_id: 1,
        }
    }

    /// Seed a scope with one type per template, in template order
    pub fn from_templates(templates: &[TypeTemplate]) -> Self {
        let mut registry = Self::new();
        for template in templates {
            registry.push(template.name.clone(), template.color.clone());
        }
        registry
    }

    /// Types in priority order
    pub fn list(&self) -> &[AnnotationType] {
        &self.types
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn get(&self, id: u64) -> Option<&AnnotationType> {
        self.types.iter().find(|t| t.id == id)
    }

    pub fn contains(&self, id: u64) -> bool {
        self.get(id).is_some()
    }

    /// Name and color an annotation of `type_id` renders with
    pub fn label(&self, type_id: u64) -> CategoryLabel {
        match self.get(type_id) {
            Some(t) => CategoryLabel {
                name: t.name.clone(),
                color: t.color.clone(),
                deleted: false,
            },
            None => CategoryLabel::deleted(),
        }
    }

    fn position(&self, id: u64) -> Result<usize, CategoryError> {
        self.types
            .iter()
            .position(|t| t.id == id)
            .ok_or(CategoryError::NotFound(id))
    }

    fn push(&mut self, name: String, color: HexColor) -> &AnnotationType {
        let id = self.next_id.max(1);
        self.next_id = id + 1;
        self.types.push(AnnotationType {
            id,
            name,
            color,
            priority: 0,
        });
        self.renumber();
        &self.types[self.types.len() - 1]
    }

    fn renumber(&mut self) {
        for (i, t) in self.types.iter_mut().enumerate() {
            t.priority = i as u32 + 1;
        }
    }

    /// Add a type at the lowest priority
    pub fn add(&mut self, name: &str, color: &str) -> Result<&AnnotationType, CategoryError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CategoryError::EmptyName);
        }
        let color = HexColor::parse(color)?;
        Ok(self.push(name.to_string(), color))
    }

    /// Rename and/or recolor a type
    pub fn update(
        &mut self,
        id: u64,
        name: Option<&str>,
        color: Option<&str>,
    ) -> Result<&AnnotationType, CategoryError> {
        let index = self.position(id)?;
        let name = match name.map(str::trim) {
            Some("") => return Err(CategoryError::EmptyName),
            other => other,
        };
        let color = color.map(HexColor::parse).transpose()?;

        let entry = &mut self.types[index];
        if let Some(name) = name {
            entry.name = name.to_string();
        }
        if let Some(color) = color {
            entry.color = color;
        }
        Ok(&self.types[index])
    }

    /// Remove a type; the rest move up to close the gap
    pub fn remove(&mut self, id: u64) -> Result<AnnotationType, CategoryError> {
        let index = self.position(id)?;
        let removed = self.types.remove(index);
        self.renumber();
        Ok(removed)
    }

    /// Exchange the priorities of two types
    pub fn swap(&mut self, a: u64, b: u64) -> Result<(), CategoryError> {
        let i = self.position(a)?;
        let j = self.position(b)?;
        self.types.swap(i, j);
        self.renumber();
        Ok(())
    }

    /// Move a type one step; a no-op at either end
    pub fn shift(&mut self, id: u64, direction: Direction) -> Result<(), CategoryError> {
        let index = self.position(id)?;
        let neighbour = match direction {
            Direction::Up => index.checked_sub(1),
            Direction::Down => Some(index + 1).filter(|&n| n < self.types.len()),
        };
        if let Some(neighbour) = neighbour {
            self.types.swap(index, neighbour);
            self.renumber();
        }
        Ok(())
    }

    pub fn move_up(&mut self, id: u64) -> Result<(), CategoryError> {
        self.shift(id, Direction::Up)
    }

    pub fn move_down(&mut self, id: u64) -> Result<(), CategoryError> {
        self.shift(id, Direction::Down)
    }
}
