use askama::{Error as AskamaError, Template};
use thiserror::Error;

use crate::application::error::HttpError;
use crate::domain::galaxy::CarouselEntry;
use axum::http::StatusCode;

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

/// Render a template to its HTML body.
///
/// The body is returned as a plain string so callers can hash it before
/// building the response.
pub fn render_template<T: Template>(template: &T) -> Result<String, HttpError> {
    template.render().map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
        .into()
    })
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlideImageView {
    pub src: String,
    pub alt: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlideView {
    pub title: String,
    pub description: String,
    pub images: Vec<SlideImageView>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CarouselView {
    pub slides: Vec<SlideView>,
}

impl CarouselView {
    /// Build slides from aggregated entries, resolving each stored file name
    /// against `asset_base_url`. Files without a disk name are skipped and a
    /// missing title renders as empty.
    pub fn from_entries(entries: &[CarouselEntry], asset_base_url: &str) -> Self {
        let slides = entries
            .iter()
            .map(|entry| {
                let title = entry.title.clone().unwrap_or_default();
                SlideView {
                    description: entry.description.clone().unwrap_or_default(),
                    images: entry
                        .files
                        .iter()
                        .filter_map(|file| file.filename_disk.as_deref())
                        .map(|name| SlideImageView {
                            src: asset_url(asset_base_url, name),
                            alt: title.clone(),
                        })
                        .collect(),
                    title,
                }
            })
            .collect();

        Self { slides }
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }
}

fn asset_url(base: &str, filename: &str) -> String {
    format!("{base}/{}", filename.trim_start_matches('/'))
}

#[derive(Template)]
#[template(path = "carousel/index.html")]
pub struct CarouselTemplate {
    pub view: CarouselView,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::galaxy::CarouselFile;

    fn entry(title: &str, files: &[Option<&str>]) -> CarouselEntry {
        CarouselEntry {
            title: Some(title.to_string()),
            description: Some(format!("{title} description")),
            files: files
                .iter()
                .map(|name| CarouselFile {
                    filename_disk: name.map(str::to_string),
                })
                .collect(),
        }
    }

    #[test]
    fn builds_asset_urls_from_base() {
        let view = CarouselView::from_entries(
            &[entry("Andromeda", &[Some("a.png"), Some("/b.png")])],
            "https://cms.example.org/assets",
        );

        let srcs: Vec<&str> = view.slides[0]
            .images
            .iter()
            .map(|image| image.src.as_str())
            .collect();
        assert_eq!(
            srcs,
            [
                "https://cms.example.org/assets/a.png",
                "https://cms.example.org/assets/b.png"
            ]
        );
    }

    #[test]
    fn skips_files_without_disk_name() {
        let view = CarouselView::from_entries(&[entry("Void", &[None, Some("x.jpg")])], "/assets");

        assert_eq!(view.slides[0].images.len(), 1);
        assert_eq!(view.slides[0].images[0].src, "/assets/x.jpg");
    }

    #[test]
    fn renders_slides_in_order_with_escaping() {
        let view = CarouselView::from_entries(
            &[entry("<Milky Way>", &[Some("mw.png")]), entry("Andromeda", &[])],
            "/assets",
        );

        let html = render_template(&CarouselTemplate { view }).expect("template renders");

        let milky = html.find("&#60;Milky Way&#62;").expect("escaped title");
        let andromeda = html.find("Andromeda").expect("second title");
        assert!(milky < andromeda);
        assert!(html.contains("/assets/mw.png"));
        assert!(!html.contains("<Milky Way>"));
    }

    #[test]
    fn untitled_galaxy_renders_with_empty_title() {
        let mut untitled = entry("unused", &[Some("u.png")]);
        untitled.title = None;

        let view = CarouselView::from_entries(&[untitled], "/assets");
        assert_eq!(view.slides[0].title, "");
        assert_eq!(view.slides[0].images[0].alt, "");

        let html = render_template(&CarouselTemplate { view }).expect("template renders");
        assert!(html.contains("<h2></h2>"));
        assert!(html.contains("/assets/u.png"));
    }

    #[test]
    fn renders_empty_state() {
        let view = CarouselView::from_entries(&[], "/assets");
        let html = render_template(&CarouselTemplate { view }).expect("template renders");

        assert!(html.contains("Aucune galaxie"));
        assert!(!html.contains("carousel-slide\""));
    }
}
