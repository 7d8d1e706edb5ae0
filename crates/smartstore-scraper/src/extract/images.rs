//! Gallery image recovery and filtering.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

use super::strategies::IMAGE_SELECTORS;

/// File extensions accepted as product imagery.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif"];

/// Filename patterns that mark an image as chrome rather than product
/// content: thumbnails, icons, logos, banners, buttons, sprite sheets,
/// and small fixed-dimension variants like `_50x50`.
static LOW_QUALITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(thumb|icon|logo|banner|sprite|btn|_small|\b\d{2,3}x\d{2,3}\b)")
        .expect("valid image filter regex")
});

/// Walks the image selector cascade and returns resolved, deduplicated
/// gallery URLs, stopping at `max_images`.
pub(super) fn extract_images(document: &Html, base: &Url, max_images: usize) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut images = Vec::new();

    'selectors: for raw in IMAGE_SELECTORS {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        for element in document.select(&selector) {
            // `data-src` covers lazy-loaded galleries whose `src` is a
            // placeholder pixel.
            let Some(src) = element
                .value()
                .attr("src")
                .filter(|s| !s.trim().is_empty())
                .or_else(|| element.value().attr("data-src"))
            else {
                continue;
            };
            let Some(resolved) = resolve_image_url(src.trim(), base) else {
                continue;
            };
            if !is_product_image(&resolved) {
                continue;
            }
            if seen.insert(resolved.clone()) {
                images.push(resolved);
                if images.len() >= max_images {
                    break 'selectors;
                }
            }
        }
    }

    images
}

/// Resolves protocol-relative and page-relative references against the
/// page URL. Absolute URLs pass through untouched.
fn resolve_image_url(src: &str, base: &Url) -> Option<String> {
    if let Some(rest) = src.strip_prefix("//") {
        return Some(format!("{}://{rest}", base.scheme()));
    }
    if src.starts_with("http://") || src.starts_with("https://") {
        return Some(src.to_owned());
    }
    base.join(src).ok().map(Into::into)
}

/// Extension allowlist plus the low-quality filename filter, applied to
/// the URL path with any query string ignored.
fn is_product_image(resolved: &str) -> bool {
    let path = Url::parse(resolved).map_or_else(
        |_| resolved.split('?').next().unwrap_or(resolved).to_owned(),
        |u| u.path().to_owned(),
    );

    let has_allowed_extension = path
        .rsplit('.')
        .next()
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
    if !has_allowed_extension {
        return false;
    }

    let filename = path.rsplit('/').next().unwrap_or(&path);
    !LOW_QUALITY_RE.is_match(filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(body: &str) -> Html {
        Html::parse_document(&format!(
            "<html><body><div class=\"image_gallery\">{body}</div></body></html>"
        ))
    }

    fn base() -> Url {
        Url::parse("https://smartstore.naver.com/acme/products/123").unwrap()
    }

    #[test]
    fn low_quality_filenames_are_rejected_and_scheme_restored() {
        let document = doc(
            "<img src=\"//cdn.example.com/x_small.jpg\">\
             <img src=\"https://cdn.example.com/y.jpg\">",
        );
        let images = extract_images(&document, &base(), 10);
        assert_eq!(images, vec!["https://cdn.example.com/y.jpg".to_owned()]);
    }

    #[test]
    fn protocol_relative_urls_get_the_page_scheme() {
        let document = doc("<img src=\"//cdn.example.com/gallery/main.jpg\">");
        let images = extract_images(&document, &base(), 10);
        assert_eq!(
            images,
            vec!["https://cdn.example.com/gallery/main.jpg".to_owned()]
        );
    }

    #[test]
    fn relative_paths_resolve_against_the_page_url() {
        let document = doc("<img src=\"/media/detail.png\">");
        let images = extract_images(&document, &base(), 10);
        assert_eq!(
            images,
            vec!["https://smartstore.naver.com/media/detail.png".to_owned()]
        );
    }

    #[test]
    fn duplicates_are_removed_by_resolved_url() {
        let document = doc(
            "<img src=\"//cdn.example.com/a.jpg\">\
             <img src=\"https://cdn.example.com/a.jpg\">\
             <img src=\"https://cdn.example.com/b.jpg\">",
        );
        let images = extract_images(&document, &base(), 10);
        assert_eq!(images.len(), 2);
    }

    #[test]
    fn cap_stops_collection_early() {
        let document = doc(
            "<img src=\"https://cdn.example.com/1.jpg\">\
             <img src=\"https://cdn.example.com/2.jpg\">\
             <img src=\"https://cdn.example.com/3.jpg\">",
        );
        let images = extract_images(&document, &base(), 2);
        assert_eq!(images.len(), 2);
    }

    #[test]
    fn disallowed_extensions_are_rejected() {
        let document = doc(
            "<img src=\"https://cdn.example.com/movie.mp4\">\
             <img src=\"https://cdn.example.com/vector.svg\">",
        );
        assert!(extract_images(&document, &base(), 10).is_empty());
    }

    #[test]
    fn query_strings_do_not_hide_the_extension() {
        let document = doc("<img src=\"https://cdn.example.com/a.jpg?type=w640\">");
        let images = extract_images(&document, &base(), 10);
        assert_eq!(
            images,
            vec!["https://cdn.example.com/a.jpg?type=w640".to_owned()]
        );
    }

    #[test]
    fn lazy_loaded_data_src_is_used_when_src_is_empty() {
        let document = doc("<img src=\"\" data-src=\"https://cdn.example.com/lazy.webp\">");
        let images = extract_images(&document, &base(), 10);
        assert_eq!(images, vec!["https://cdn.example.com/lazy.webp".to_owned()]);
    }

    #[test]
    fn dimension_suffixed_variants_are_rejected() {
        let document = doc("<img src=\"https://cdn.example.com/item_50x50.jpg\">");
        assert!(extract_images(&document, &base(), 10).is_empty());
    }
}
