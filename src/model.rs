use serde::{Deserialize, Serialize};

pub const STUDENTS_KEY: &str = "students";
pub const SUBJECTS_KEY: &str = "subjects";
pub const RECORDS_KEY: &str = "records";
/// Notification-only key. Its value is an opaque timestamp used to wake
/// other views; it carries no payload semantics.
pub const LAST_UPDATE_KEY: &str = "last-update";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub email: String,
    pub name: String,
}

/// Subjects are stored as bare strings under `subjects`.
pub type Subject = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Performance,
    Activity,
    Quiz,
    Recitation,
    Examination,
}

impl Category {
    pub fn parse(s: &str) -> Option<Category> {
        match s {
            "Performance" => Some(Category::Performance),
            "Activity" => Some(Category::Activity),
            "Quiz" => Some(Category::Quiz),
            "Recitation" => Some(Category::Recitation),
            "Examination" => Some(Category::Examination),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Performance => "Performance",
            Category::Activity => "Activity",
            Category::Quiz => "Quiz",
            Category::Recitation => "Recitation",
            Category::Examination => "Examination",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: String,
    pub student_email: String,
    pub subject: String,
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paper_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paper_ref: Option<String>,
    pub created_at: i64,
}

/// Input for the single record-creation path. Both the "record score" and
/// the "upload paper" actions funnel through this shape.
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub student_email: String,
    pub subject: String,
    pub category: String,
    pub score: Option<f64>,
    pub paper: Option<PaperAttachment>,
}

#[derive(Debug, Clone)]
pub struct PaperAttachment {
    pub name: String,
    pub content_ref: String,
}

/// Full-field patch applied by a committed row edit. Display-only fields
/// (paper link, timestamp) are not part of the patch.
#[derive(Debug, Clone)]
pub struct RecordPatch {
    pub student_email: String,
    pub subject: String,
    pub category: String,
    pub score: Option<f64>,
}
