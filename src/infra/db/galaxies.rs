use async_trait::async_trait;
use sqlx::query_as;

use crate::{
    application::repos::{GalaxiesRepo, RepoError},
    domain::galaxy::{CarouselRow, GalaxyStatus},
};

use super::{PostgresRepositories, map_sqlx_error};

// Left joins keep galaxies without a model or files; the ORDER BY keeps each
// galaxy's rows contiguous for the fold.
const CAROUSEL_ROWS_SQL: &str = "SELECT \
        g.id AS galaxy_id, \
        g.title AS galaxy_title, \
        g.description AS galaxy_description, \
        g.sort AS galaxy_sort, \
        m.id AS modele_id, \
        mf.id AS modeles_file_id, \
        mf.modeles_id, \
        mf.directus_files_id, \
        df.id AS file_id, \
        df.filename_disk \
    FROM galaxy g \
    LEFT JOIN modeles m ON m.id = g.modele \
    LEFT JOIN modeles_files mf ON mf.modeles_id = m.id \
    LEFT JOIN directus_files df ON df.id = mf.directus_files_id \
    WHERE g.status = $1 \
    ORDER BY g.sort ASC, mf.id ASC";

#[async_trait]
impl GalaxiesRepo for PostgresRepositories {
    async fn list_with_files(&self, status: GalaxyStatus) -> Result<Vec<CarouselRow>, RepoError> {
        query_as::<_, CarouselRow>(CAROUSEL_ROWS_SQL)
            .bind(status.as_str())
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)
    }
}
