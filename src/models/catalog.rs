use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

/// Kind of catalog a title belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Show,
}

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Show => "show",
        }
    }
}

impl Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "movie" | "movies" => Ok(MediaKind::Movie),
            "show" | "shows" | "series" => Ok(MediaKind::Show),
            other => Err(format!("unknown media kind '{}'", other)),
        }
    }
}

/// A movie or show as known to the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub title_id: String,
    pub title: String,
    pub kind: MediaKind,
    #[serde(default)]
    pub genres: Vec<String>,
    /// Runtime in minutes for movies, number of seasons for shows
    #[serde(default)]
    pub length_or_season_count: Option<u32>,
    #[serde(default)]
    pub release_year: Option<i32>,
}

impl CatalogEntry {
    pub fn new(title_id: impl Into<String>, title: impl Into<String>, kind: MediaKind) -> Self {
        Self {
            title_id: title_id.into(),
            title: title.into(),
            kind,
            genres: Vec::new(),
            length_or_season_count: None,
            release_year: None,
        }
    }

    pub fn with_genres<I, S>(mut self, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.genres = genres.into_iter().map(Into::into).collect();
        self
    }

    pub fn has_any_genre(&self, genres: &[String]) -> bool {
        self.genres.iter().any(|genre| genres.contains(genre))
    }
}
