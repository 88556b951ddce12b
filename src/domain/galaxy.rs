//! Galaxy carousel records and the fold from flat join rows into carousel entries.

use uuid::Uuid;

/// Publication state of a galaxy as stored by Directus (plain `varchar` column).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GalaxyStatus {
    Draft,
    Published,
    Archived,
}

impl GalaxyStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            GalaxyStatus::Draft => "draft",
            GalaxyStatus::Published => "published",
            GalaxyStatus::Archived => "archived",
        }
    }
}

/// One row of the galaxy -> modele -> modeles_files -> directus_files left join.
///
/// Only `galaxy_id` is guaranteed: Directus columns are nullable, and a galaxy
/// without a model (or a model without files) still produces a single row.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct CarouselRow {
    pub galaxy_id: i32,
    pub galaxy_title: Option<String>,
    pub galaxy_description: Option<String>,
    pub galaxy_sort: Option<i32>,
    pub modele_id: Option<i32>,
    pub modeles_file_id: Option<i32>,
    pub modeles_id: Option<i32>,
    pub directus_files_id: Option<Uuid>,
    pub file_id: Option<Uuid>,
    pub filename_disk: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarouselFile {
    pub filename_disk: Option<String>,
}

/// A galaxy with every file of its model, in association order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarouselEntry {
    pub title: Option<String>,
    pub description: Option<String>,
    pub files: Vec<CarouselFile>,
}

/// Fold join rows into one entry per galaxy.
///
/// Rows of the same galaxy must be adjacent (the query orders by galaxy sort,
/// then association id). A galaxy id that reappears after another galaxy
/// starts a second entry; nothing is merged back.
pub fn aggregate<I>(rows: I) -> Vec<CarouselEntry>
where
    I: IntoIterator<Item = CarouselRow>,
{
    let mut entries: Vec<CarouselEntry> = Vec::new();
    let mut current_galaxy: Option<i32> = None;

    for row in rows {
        if current_galaxy != Some(row.galaxy_id) {
            current_galaxy = Some(row.galaxy_id);
            entries.push(CarouselEntry {
                title: row.galaxy_title,
                description: row.galaxy_description,
                files: Vec::new(),
            });
        }

        if row.file_id.is_some()
            && let Some(entry) = entries.last_mut()
        {
            entry.files.push(CarouselFile {
                filename_disk: row.filename_disk,
            });
        }
    }

    entries
}
