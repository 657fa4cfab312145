use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

pub const DEFAULT_COVER_IMAGE: &str = "/uploads/default-cover.jpg";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Fiction,
    #[serde(rename = "Non-fiction")]
    NonFiction,
    Science,
    Math,
    Technology,
    History,
    Biography,
    Philosophy,
    #[serde(rename = "Self-help")]
    SelfHelp,
    Children,
    Education,
    Comics,
    Fantasy,
    Mystery,
    Horror,
    Romance,
    Business,
    Programming,
}

impl Category {
    pub const ALL: [Category; 18] = [
        Category::Fiction,
        Category::NonFiction,
        Category::Science,
        Category::Math,
        Category::Technology,
        Category::History,
        Category::Biography,
        Category::Philosophy,
        Category::SelfHelp,
        Category::Children,
        Category::Education,
        Category::Comics,
        Category::Fantasy,
        Category::Mystery,
        Category::Horror,
        Category::Romance,
        Category::Business,
        Category::Programming,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Fiction => "Fiction",
            Category::NonFiction => "Non-fiction",
            Category::Science => "Science",
            Category::Math => "Math",
            Category::Technology => "Technology",
            Category::History => "History",
            Category::Biography => "Biography",
            Category::Philosophy => "Philosophy",
            Category::SelfHelp => "Self-help",
            Category::Children => "Children",
            Category::Education => "Education",
            Category::Comics => "Comics",
            Category::Fantasy => "Fantasy",
            Category::Mystery => "Mystery",
            Category::Horror => "Horror",
            Category::Romance => "Romance",
            Category::Business => "Business",
            Category::Programming => "Programming",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    /// Case-insensitive match against the display names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("invalid category: {s}"))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Book {
    pub id: u64,
    pub title: String,
    pub author: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub price: f64,
    pub stock: u32,
    pub cover_image: String,
    pub category: Category,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub publisher: String,
    pub isbn: String,
    pub pages: u32,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub language: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub published_at: String,
    pub average_rating: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Book {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Editable book fields, used for both create and full update.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BookDraft {
    #[validate(length(min = 3, max = 100, message = "title must be between 3 and 100 characters"))]
    pub title: String,
    #[validate(length(min = 3, max = 50, message = "author must be between 3 and 50 characters"))]
    pub author: String,
    #[serde(default)]
    #[validate(length(max = 500, message = "description must be at most 500 characters"))]
    pub description: String,
    #[validate(range(exclusive_min = 0.0, message = "price must be greater than 0"))]
    pub price: f64,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub cover_image: Option<String>,
    pub category: Category,
    #[serde(default)]
    #[validate(length(max = 50, message = "publisher must be at most 50 characters"))]
    pub publisher: String,
    #[serde(default)]
    #[validate(length(max = 50, message = "published_at must be at most 50 characters"))]
    pub published_at: String,
    #[validate(length(min = 10, max = 20, message = "isbn must be between 10 and 20 characters"))]
    pub isbn: String,
    #[validate(range(min = 1, message = "pages must be at least 1"))]
    pub pages: u32,
    #[serde(default)]
    #[validate(length(max = 20, message = "language must be at most 20 characters"))]
    pub language: String,
}

impl BookDraft {

    /// Cover image to store, falling back to the default cover.
    pub fn cover_or_default(&self) -> String {
        match self.cover_image.as_deref().map(str::trim) {
            Some(cover) if !cover.is_empty() => cover.to_string(),
            _ => DEFAULT_COVER_IMAGE.to_string(),
        }
    }
}

/// Case-insensitive substring filters; a book matches if ANY given field matches.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookQuery {
    pub title: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
}

impl BookQuery {
    fn terms(&self) -> impl Iterator<Item = (&'static str, String)> + '_ {
        [
            ("title", &self.title),
            ("author", &self.author),
            ("category", &self.category),
            ("description", &self.description),
        ]
        .into_iter()
        .filter_map(|(field, value)| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| (field, v.to_lowercase()))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.terms().next().is_none()
    }

    pub fn matches(&self, book: &Book) -> bool {
        if self.is_empty() {
            return true;
        }
        self.terms().any(|(field, needle)| {
            let haystack = match field {
                "title" => book.title.to_lowercase(),
                "author" => book.author.to_lowercase(),
                "category" => book.category.as_str().to_lowercase(),
                _ => book.description.to_lowercase(),
            };
            haystack.contains(&needle)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> BookDraft {
        BookDraft {
            title: "The Rust Book".to_string(),
            author: "Steve Klabnik".to_string(),
            description: String::new(),
            price: 29.99,
            stock: 3,
            cover_image: None,
            category: Category::Programming,
            publisher: String::new(),
            published_at: String::new(),
            isbn: "9781718503106".to_string(),
            pages: 560,
            language: "English".to_string(),
        }
    }

    #[test]
    fn test_category_round_trip_names() {
        assert_eq!("non-fiction".parse::<Category>().unwrap(), Category::NonFiction);
        assert_eq!("Self-help".parse::<Category>().unwrap(), Category::SelfHelp);
        assert!("Cooking".parse::<Category>().is_err());
        let json = serde_json::to_string(&Category::SelfHelp).unwrap();
        assert_eq!(json, "\"Self-help\"");
    }

    #[test]
    fn test_draft_validation() {
        assert!(draft().validate().is_ok());

        let mut bad = draft();
        bad.price = 0.0;
        assert!(bad.validate().is_err());

        let mut bad = draft();
        bad.isbn = "123".to_string();
        assert!(bad.validate().is_err());

        let mut bad = draft();
        bad.title = "ab".to_string();
        assert!(bad.validate().is_err());

        let mut bad = draft();
        bad.pages = 0;
        assert!(bad.validate().is_err());

        let mut bad = draft();
        bad.description = "x".repeat(501);
        let err = bad.validate().unwrap_err();
        assert!(err.field_errors().contains_key("description"));
    }

    #[test]
    fn test_cover_defaults() {
        let mut d = draft();
        assert_eq!(d.cover_or_default(), DEFAULT_COVER_IMAGE);
        d.cover_image = Some("/covers/rust.png".to_string());
        assert_eq!(d.cover_or_default(), "/covers/rust.png");
    }
}
