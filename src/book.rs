//! The `Book` record and its typed views: projected rows, field names and updates.

use crate::errors::{Result, ServiceError};
use crate::query::{UpdateDoc, to_f64};
use crate::types::{DocumentId, ID_FIELD};
use bson::{Bson, Document as BsonDocument, doc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type BookId = DocumentId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<BookId>,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub published_year: i32,
    pub price: f64,
    pub in_stock: bool,
}

impl Book {
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        genre: impl Into<String>,
        published_year: i32,
        price: f64,
        in_stock: bool,
    ) -> Self {
        Self {
            id: None,
            title: title.into(),
            author: author.into(),
            genre: genre.into(),
            published_year,
            price,
            in_stock,
        }
    }

    /// The stored form. Identity is never sent; the store assigns it.
    #[must_use]
    pub fn to_document(&self) -> BsonDocument {
        doc! {
            "title": self.title.clone(),
            "author": self.author.clone(),
            "genre": self.genre.clone(),
            "published_year": self.published_year,
            "price": self.price,
            "in_stock": self.in_stock,
        }
    }

    /// Reads a stored document back, reporting the first field that does not fit.
    pub fn from_document(doc: &BsonDocument) -> Result<Self> {
        let id = doc.get(ID_FIELD).and_then(Bson::as_str).and_then(DocumentId::parse);
        let label = id.as_ref().map_or_else(|| "<unknown>".to_string(), ToString::to_string);
        let fail = |field: BookField, reason: &str| ServiceError::Decode {
            id: label.clone(),
            reason: format!("`{field}` {reason}"),
        };
        let text = |field: BookField| {
            doc.get(field.as_str())
                .and_then(Bson::as_str)
                .map(str::to_string)
                .ok_or_else(|| fail(field, "is missing or not a string"))
        };
        Ok(Self {
            title: text(BookField::Title)?,
            author: text(BookField::Author)?,
            genre: text(BookField::Genre)?,
            published_year: doc
                .get(BookField::PublishedYear.as_str())
                .and_then(year_of)
                .ok_or_else(|| fail(BookField::PublishedYear, "is missing or not an integer year"))?,
            price: doc
                .get(BookField::Price.as_str())
                .and_then(to_f64)
                .ok_or_else(|| fail(BookField::Price, "is missing or not a number"))?,
            in_stock: doc
                .get(BookField::InStock.as_str())
                .and_then(Bson::as_bool)
                .ok_or_else(|| fail(BookField::InStock, "is missing or not a boolean"))?,
            id,
        })
    }
}

fn year_of(v: &Bson) -> Option<i32> {
    match v {
        Bson::Int32(y) => Some(*y),
        Bson::Int64(y) => i32::try_from(*y).ok(),
        _ => None,
    }
}

/// An addressable book attribute, named as stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookField {
    #[serde(rename = "_id")]
    Id,
    Title,
    Author,
    Genre,
    PublishedYear,
    Price,
    InStock,
}

impl BookField {
    /// The six fields every stored book carries.
    pub const REQUIRED: [Self; 6] =
        [Self::Title, Self::Author, Self::Genre, Self::PublishedYear, Self::Price, Self::InStock];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Id => ID_FIELD,
            Self::Title => "title",
            Self::Author => "author",
            Self::Genre => "genre",
            Self::PublishedYear => "published_year",
            Self::Price => "price",
            Self::InStock => "in_stock",
        }
    }
}

impl fmt::Display for BookField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookField {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self> {
        std::iter::once(Self::Id)
            .chain(Self::REQUIRED)
            .find(|f| f.as_str() == s.trim())
            .ok_or_else(|| ServiceError::invalid(format!("unknown book field `{s}`")))
    }
}

/// A projected book row. Attributes outside the projection stay `None` and are omitted
/// when serialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialBook {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<BookId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_stock: Option<bool>,
}

impl PartialBook {
    /// Lenient read: attributes that are absent or mistyped are left as `None`.
    #[must_use]
    pub fn from_document(doc: &BsonDocument) -> Self {
        let text = |f: BookField| doc.get(f.as_str()).and_then(Bson::as_str).map(str::to_string);
        Self {
            id: doc.get(ID_FIELD).and_then(Bson::as_str).and_then(DocumentId::parse),
            title: text(BookField::Title),
            author: text(BookField::Author),
            genre: text(BookField::Genre),
            published_year: doc.get(BookField::PublishedYear.as_str()).and_then(year_of),
            price: doc.get(BookField::Price.as_str()).and_then(to_f64),
            in_stock: doc.get(BookField::InStock.as_str()).and_then(Bson::as_bool),
        }
    }
}

impl From<Book> for PartialBook {
    fn from(b: Book) -> Self {
        Self {
            id: b.id,
            title: Some(b.title),
            author: Some(b.author),
            genre: Some(b.genre),
            published_year: Some(b.published_year),
            price: Some(b.price),
            in_stock: Some(b.in_stock),
        }
    }
}

/// Field-level `set` for one book. Fields left unset are not touched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_stock: Option<bool>,
}

impl BookUpdate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn title(mut self, v: impl Into<String>) -> Self {
        self.title = Some(v.into());
        self
    }

    #[must_use]
    pub fn author(mut self, v: impl Into<String>) -> Self {
        self.author = Some(v.into());
        self
    }

    #[must_use]
    pub fn genre(mut self, v: impl Into<String>) -> Self {
        self.genre = Some(v.into());
        self
    }

    #[must_use]
    pub const fn published_year(mut self, v: i32) -> Self {
        self.published_year = Some(v);
        self
    }

    #[must_use]
    pub const fn price(mut self, v: f64) -> Self {
        self.price = Some(v);
        self
    }

    #[must_use]
    pub const fn in_stock(mut self, v: bool) -> Self {
        self.in_stock = Some(v);
        self
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.genre.is_none()
            && self.published_year.is_none()
            && self.price.is_none()
            && self.in_stock.is_none()
    }

    /// Checks the values being set against the same rules as inserted books.
    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(ServiceError::invalid("update sets no fields"));
        }
        let doc = self.to_document();
        for (key, value) in &doc {
            let field = BookField::from_str(key)?;
            check_field(field, value).map_err(|reason| {
                ServiceError::invalid(format!("cannot set `{field}`: value {reason}"))
            })?;
        }
        Ok(())
    }

    fn to_document(&self) -> BsonDocument {
        let mut d = BsonDocument::new();
        let mut put = |f: BookField, v: Option<Bson>| {
            if let Some(v) = v {
                d.insert(f.as_str(), v);
            }
        };
        put(BookField::Title, self.title.clone().map(Bson::String));
        put(BookField::Author, self.author.clone().map(Bson::String));
        put(BookField::Genre, self.genre.clone().map(Bson::String));
        put(BookField::PublishedYear, self.published_year.map(Bson::Int32));
        put(BookField::Price, self.price.map(Bson::Double));
        put(BookField::InStock, self.in_stock.map(Bson::Boolean));
        d
    }

    /// The `$set` this update issues, in field declaration order.
    #[must_use]
    pub fn to_update_doc(&self) -> UpdateDoc {
        UpdateDoc { set: self.to_document().into_iter().collect(), unset: Vec::new() }
    }
}

fn check_field(field: BookField, value: &Bson) -> std::result::Result<(), &'static str> {
    match field {
        BookField::Id => Err("is assigned by the store"),
        BookField::Title | BookField::Author | BookField::Genre => match value {
            Bson::String(s) if !s.trim().is_empty() => Ok(()),
            Bson::String(_) => Err("must not be empty"),
            _ => Err("must be a string"),
        },
        BookField::PublishedYear => year_of(value).map(|_| ()).ok_or("must be an integer year"),
        BookField::Price => match to_f64(value) {
            Some(p) if p.is_finite() && p >= 0.0 => Ok(()),
            Some(_) => Err("must be a finite, non-negative number"),
            None => Err("must be a number"),
        },
        BookField::InStock => value.as_bool().map(|_| ()).ok_or("must be a boolean"),
    }
}

/// Checks that record `index` of a batch has every book field with the right type.
pub fn validate_document(index: usize, doc: &BsonDocument) -> Result<()> {
    for field in BookField::REQUIRED {
        let Some(value) = doc.get(field.as_str()) else {
            return Err(ServiceError::Validation { index, field: field.to_string(), reason: "is missing".into() });
        };
        check_field(field, value).map_err(|reason| ServiceError::Validation {
            index,
            field: field.to_string(),
            reason: reason.to_string(),
        })?;
    }
    Ok(())
}
