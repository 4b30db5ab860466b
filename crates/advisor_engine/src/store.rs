//! Course persistence: load and save the catalog as a JSON document.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use advisor_common::course::{Course, CourseCategory, CourseId};
use advisor_common::AdvisorError;

/// Opaque course storage. The pipeline only needs `load` at construction;
/// `save` exists for tooling that edits the catalog.
pub trait CourseStore: Send + Sync {
    fn load(&self) -> Result<Vec<Course>, AdvisorError>;
    fn save(&self, courses: &[Course]) -> Result<(), AdvisorError>;
}

/// JSON-file-backed course store.
pub struct JsonCourseStore {
    path: PathBuf,
}

impl JsonCourseStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the sample catalog if the data file does not exist yet.
    pub fn seed_if_missing(&self) -> Result<(), AdvisorError> {
        if self.path.exists() {
            return Ok(());
        }
        let samples = sample_courses();
        self.save(&samples)?;
        info!("Initialized {} with {} sample courses", self.path.display(), samples.len());
        Ok(())
    }
}

impl CourseStore for JsonCourseStore {
    fn load(&self) -> Result<Vec<Course>, AdvisorError> {
        let raw = fs::read_to_string(&self.path).map_err(|e| {
            AdvisorError::Store(format!("could not read {}: {}", self.path.display(), e))
        })?;
        let courses: Vec<Course> = serde_json::from_str(&raw)
            .map_err(|e| AdvisorError::Store(format!("malformed course file: {}", e)))?;
        info!("Loaded {} courses from {}", courses.len(), self.path.display());
        Ok(courses)
    }

    fn save(&self, courses: &[Course]) -> Result<(), AdvisorError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(courses)?;
        fs::write(&self.path, raw)?;
        info!("Saved {} courses to {}", courses.len(), self.path.display());
        Ok(())
    }
}

fn course(
    code: &str,
    title: &str,
    description: &str,
    credits: u32,
    difficulty: u8,
    category: CourseCategory,
    prerequisites: &[&str],
    instructor: &str,
    schedule: &str,
) -> Course {
    Course {
        code: CourseId::parse(code).expect("sample course id"),
        title: title.to_string(),
        description: description.to_string(),
        credits,
        difficulty,
        category,
        semester: "Fall/Spring".to_string(),
        prerequisites: prerequisites.iter().map(|p| p.to_string()).collect(),
        instructor: Some(instructor.to_string()),
        schedule: Some(schedule.to_string()),
    }
}

/// The sample catalog used to seed an empty data file.
pub fn sample_courses() -> Vec<Course> {
    vec![
        course(
            "CS101",
            "Introduction to Computer Science",
            "Fundamental concepts of programming and computer science. Introduction to \
             problem-solving, algorithm design, and programming in Python.",
            3,
            2,
            CourseCategory::CoreRequirements,
            &[],
            "Dr. Smith",
            "MWF 10:00-11:00 AM",
        ),
        course(
            "CS201",
            "Data Structures and Algorithms",
            "Advanced data structures including arrays, linked lists, stacks, queues, trees, \
             and graphs. Algorithm design and analysis.",
            4,
            4,
            CourseCategory::CoreRequirements,
            &["CS101"],
            "Dr. Johnson",
            "TTh 2:00-3:30 PM",
        ),
        course(
            "CS301",
            "Machine Learning",
            "Introduction to machine learning algorithms, supervised and unsupervised \
             learning, neural networks, and deep learning applications.",
            3,
            4,
            CourseCategory::MajorElectives,
            &["CS201", "MATH201"],
            "Dr. Chen",
            "MWF 1:00-2:00 PM",
        ),
        course(
            "CS302",
            "Web Development",
            "Full-stack web development using modern frameworks. HTML, CSS, JavaScript, \
             React, Node.js, and database integration.",
            3,
            3,
            CourseCategory::MajorElectives,
            &["CS101"],
            "Prof. Garcia",
            "TTh 11:00-12:30 PM",
        ),
        course(
            "CS303",
            "Database Systems",
            "Database design, SQL, relational algebra, normalization, transaction \
             processing, and distributed databases.",
            3,
            3,
            CourseCategory::MajorElectives,
            &["CS201"],
            "Dr. Williams",
            "MWF 3:00-4:00 PM",
        ),
        course(
            "MATH201",
            "Calculus I",
            "Differential calculus, limits, derivatives, applications to optimization, and \
             introduction to integral calculus.",
            4,
            3,
            CourseCategory::MathScience,
            &["Pre-calculus or placement test"],
            "Prof. Davis",
            "MWF 9:00-10:00 AM, Th 9:00-10:00 AM",
        ),
        course(
            "MATH202",
            "Statistics",
            "Probability theory, statistical inference, hypothesis testing, regression \
             analysis, and data interpretation.",
            3,
            3,
            CourseCategory::MathScience,
            &["MATH201"],
            "Dr. Brown",
            "TTh 10:00-11:30 AM",
        ),
        course(
            "ENG102",
            "English Composition",
            "Academic writing skills, critical thinking, research methods, and effective \
             communication in various contexts.",
            3,
            2,
            CourseCategory::GeneralEducation,
            &[],
            "Prof. Taylor",
            "MWF 11:00-12:00 PM",
        ),
        course(
            "PHIL101",
            "Introduction to Philosophy",
            "Classical and contemporary philosophical problems, logic, ethics, metaphysics, \
             and critical reasoning skills.",
            3,
            2,
            CourseCategory::Humanities,
            &[],
            "Dr. Wilson",
            "TTh 1:00-2:30 PM",
        ),
        course(
            "HIST201",
            "World History",
            "Survey of world civilizations, cultural developments, historical analysis \
             methods, and global perspectives.",
            3,
            2,
            CourseCategory::Humanities,
            &[],
            "Prof. Martinez",
            "MWF 2:00-3:00 PM",
        ),
    ]
}
