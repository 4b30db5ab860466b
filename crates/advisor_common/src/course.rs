//! Course data model and catalog snapshot.
//!
//! The catalog is the ground truth for "what is a valid course": loaded once
//! at pipeline construction, immutable for the duration of a query cycle.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::AdvisorError;

/// Full-match pattern for a well-formed course identifier (e.g. `CS101`).
pub static COURSE_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{2,4}[0-9]{3}$").expect("course id regex"));

/// Scan pattern for identifier-shaped tokens inside free text.
pub static COURSE_ID_SCAN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z]{2,4}[0-9]{3}\b").expect("course id scan regex"));

/// Course identifier: 2-4 uppercase letters followed by 3 digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CourseId(String);

impl CourseId {
    /// Parse and validate an identifier.
    pub fn parse(raw: &str) -> Result<Self, AdvisorError> {
        if COURSE_ID_RE.is_match(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(AdvisorError::Validation(format!(
                "course id '{}' must follow a format like 'CS101' or 'MATH301'",
                raw
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Course category buckets used by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CourseCategory {
    #[serde(rename = "Core Requirements")]
    CoreRequirements,
    #[serde(rename = "Major Electives")]
    MajorElectives,
    #[serde(rename = "Math/Science")]
    MathScience,
    #[serde(rename = "General Education")]
    GeneralEducation,
    #[serde(rename = "Humanities")]
    Humanities,
}

impl CourseCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            CourseCategory::CoreRequirements => "Core Requirements",
            CourseCategory::MajorElectives => "Major Electives",
            CourseCategory::MathScience => "Math/Science",
            CourseCategory::GeneralEducation => "General Education",
            CourseCategory::Humanities => "Humanities",
        }
    }
}

impl fmt::Display for CourseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub code: CourseId,
    pub title: String,
    pub description: String,
    pub credits: u32,
    /// Difficulty rating, 1 (easiest) to 5 (hardest).
    pub difficulty: u8,
    pub category: CourseCategory,
    pub semester: String,
    /// Prerequisite names. May reference courses outside this catalog
    /// (e.g. placement tests), so these are free-form strings.
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,
}

impl Course {
    /// Prerequisites rendered for display: "CS201, MATH201" or "None".
    pub fn prerequisites_display(&self) -> String {
        if self.prerequisites.is_empty() {
            "None".to_string()
        } else {
            self.prerequisites.join(", ")
        }
    }
}

/// A retrieved course paired with its similarity score, ephemeral to one
/// query's processing. Ordered descending by similarity.
#[derive(Debug, Clone)]
pub struct RetrievedCandidate {
    pub course: Course,
    pub similarity: f32,
}

/// Immutable catalog snapshot with identifier lookup.
#[derive(Debug, Clone)]
pub struct CourseCatalog {
    courses: Vec<Course>,
    by_code: HashMap<String, usize>,
}

impl CourseCatalog {
    /// Build a catalog, rejecting duplicate or malformed identifiers.
    pub fn new(courses: Vec<Course>) -> Result<Self, AdvisorError> {
        let mut by_code = HashMap::with_capacity(courses.len());
        for (idx, course) in courses.iter().enumerate() {
            if !COURSE_ID_RE.is_match(course.code.as_str()) {
                return Err(AdvisorError::Validation(format!(
                    "catalog entry '{}' has a malformed course id",
                    course.code
                )));
            }
            if by_code.insert(course.code.as_str().to_string(), idx).is_some() {
                return Err(AdvisorError::Validation(format!(
                    "duplicate course id '{}' in catalog",
                    course.code
                )));
            }
        }
        Ok(Self { courses, by_code })
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }

    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    /// Look up a course by code, case-insensitively.
    pub fn get(&self, code: &str) -> Option<&Course> {
        let normalized = code.to_uppercase();
        self.by_code.get(&normalized).map(|&idx| &self.courses[idx])
    }

    /// Whether a code names a course in this catalog (exact match).
    pub fn contains(&self, code: &str) -> bool {
        self.by_code.contains_key(code)
    }

    /// All valid identifiers, in catalog order.
    pub fn valid_ids(&self) -> Vec<&str> {
        self.courses.iter().map(|c| c.code.as_str()).collect()
    }

    pub fn by_category(&self, category: CourseCategory) -> Vec<&Course> {
        self.courses.iter().filter(|c| c.category == category).collect()
    }

    pub fn by_difficulty(&self, min: u8, max: u8) -> Vec<&Course> {
        self.courses
            .iter()
            .filter(|c| c.difficulty >= min && c.difficulty <= max)
            .collect()
    }

    /// Substring search over code, title, and description.
    pub fn search(&self, query: &str) -> Vec<&Course> {
        let needle = query.to_lowercase();
        self.courses
            .iter()
            .filter(|c| {
                let haystack = format!(
                    "{} {} {}",
                    c.code.as_str(),
                    c.title,
                    c.description
                )
                .to_lowercase();
                haystack.contains(&needle)
            })
            .collect()
    }
}
