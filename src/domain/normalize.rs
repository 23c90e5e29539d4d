//! Normalization of raw CMS records into UI-facing shapes.
//!
//! Every function here is pure and total: no I/O, no failure paths. The
//! derivations (slug, excerpt, reading time, image resolution) are the
//! contract the rest of the service builds on.

use slug::slugify;

use super::posts::{BlogPost, Category};
use super::raw::{RawCategory, RawImage, RawPost};

/// Sentinel served when a post has no attached image.
pub const PLACEHOLDER_IMAGE: &str = "/placeholder.svg";

const EXCERPT_MAX: usize = 160;
const EXCERPT_TRUNCATED: usize = 157;
const WORDS_PER_MINUTE: usize = 200;
const DEFAULT_CATEGORY_NAME: &str = "Uncategorized";
const DEFAULT_CATEGORY_SLUG: &str = "uncategorized";

/// Convert a raw CMS post into its normalized form.
///
/// `cms_origin` is the CMS base URL used to absolutize root-relative image
/// URLs.
pub fn normalize_post(raw: &RawPost, cms_origin: &str) -> BlogPost {
    let (category, category_slug) = match &raw.category {
        Some(category) => (category.name.clone(), category.slug.clone()),
        None => (
            DEFAULT_CATEGORY_NAME.to_string(),
            DEFAULT_CATEGORY_SLUG.to_string(),
        ),
    };

    BlogPost {
        id: raw.id,
        document_id: raw.document_id.clone(),
        slug: derive_slug(&raw.title, &raw.document_id),
        title: raw.title.clone(),
        excerpt: generate_excerpt(&raw.content),
        content: raw.content.clone(),
        cover_image: resolve_cover_image(raw.image.first(), cms_origin),
        category,
        category_slug,
        tags: raw.tags.iter().map(|tag| tag.name.clone()).collect(),
        published_at: raw.published_at.clone(),
        reading_time: estimate_reading_time(&raw.content),
        author_name: raw.user.as_ref().and_then(|user| user.username.clone()),
        author_email: raw.user.as_ref().and_then(|user| user.email.clone()),
    }
}

/// Pass a raw category through to its normalized form.
pub fn normalize_category(raw: &RawCategory) -> Category {
    Category {
        id: raw.id,
        document_id: raw.document_id.clone(),
        name: raw.name.clone(),
        slug: raw.slug.clone(),
    }
}

/// Derive a URL-safe slug from a title, falling back to the document id when
/// the title yields nothing slug-worthy.
pub fn derive_slug(title: &str, document_id: &str) -> String {
    let candidate = slugify(title);
    if candidate.is_empty() {
        document_id.to_string()
    } else {
        candidate
    }
}

/// Estimate reading time at 200 words per minute, floored at one minute.
pub fn estimate_reading_time(content: &str) -> String {
    let words = content.split_whitespace().count();
    let minutes = words.div_ceil(WORDS_PER_MINUTE).max(1);
    format!("{minutes} min read")
}

/// Produce a plain-text excerpt of at most 160 characters.
///
/// Heading markers, bold markers, and code spans are stripped; newline runs
/// collapse to single spaces. Content longer than 160 characters truncates
/// to 157 plus a three-character ellipsis.
pub fn generate_excerpt(content: &str) -> String {
    let plain = strip_code_spans(content);
    let plain = strip_heading_markers(&plain);
    let plain = strip_bold_markers(&plain);
    let plain = collapse_newlines(&plain);
    let plain = plain.trim();

    if plain.chars().count() <= EXCERPT_MAX {
        return plain.to_string();
    }
    let truncated: String = plain.chars().take(EXCERPT_TRUNCATED).collect();
    format!("{truncated}...")
}

/// Resolve the cover image URL: medium variant first, then large, then the
/// original upload; root-relative URLs get the CMS origin prefixed.
pub fn resolve_cover_image(image: Option<&RawImage>, cms_origin: &str) -> String {
    let Some(image) = image else {
        return PLACEHOLDER_IMAGE.to_string();
    };

    let url = image
        .formats
        .as_ref()
        .and_then(|formats| {
            formats
                .medium
                .as_ref()
                .or(formats.large.as_ref())
                .map(|format| format.url.as_str())
        })
        .unwrap_or(&image.url);

    if url.starts_with('/') {
        format!("{}{url}", cms_origin.trim_end_matches('/'))
    } else {
        url.to_string()
    }
}

/// Remove inline and fenced code spans (one to three backticks, matched
/// against the next backtick run).
fn strip_code_spans(content: &str) -> String {
    let bytes = content.as_bytes();
    let mut output = String::with_capacity(content.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'`' {
            let open = backtick_run(bytes, i).min(3);
            let mut j = i + open;
            // Content runs to the next backtick; unterminated spans are kept verbatim.
            while j < bytes.len() && bytes[j] != b'`' {
                j += 1;
            }
            if j < bytes.len() {
                let close = backtick_run(bytes, j).min(3);
                i = j + close;
                continue;
            }
            output.push_str(&content[i..]);
            break;
        }
        let ch = content[i..].chars().next().unwrap_or('\0');
        output.push(ch);
        i += ch.len_utf8();
    }
    output
}

fn backtick_run(bytes: &[u8], start: usize) -> usize {
    bytes[start..].iter().take_while(|&&b| b == b'`').count()
}

/// Remove `#` heading markers (one to six hashes followed by whitespace).
fn strip_heading_markers(content: &str) -> String {
    let mut output = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '#' {
            output.push(ch);
            continue;
        }
        let mut run = 1;
        while run < 6 && chars.peek() == Some(&'#') {
            chars.next();
            run += 1;
        }
        if chars.peek().is_some_and(|next| next.is_whitespace()) {
            chars.next();
        } else {
            for _ in 0..run {
                output.push('#');
            }
        }
    }
    output
}

/// Unwrap `**bold**` spans, keeping the inner text.
fn strip_bold_markers(content: &str) -> String {
    let mut output = String::with_capacity(content.len());
    let mut rest = content;
    while let Some(start) = rest.find("**") {
        let after = &rest[start + 2..];
        let close = after.find("**").filter(|&close| {
            close > 0 && !after[..close].contains('\n')
        });
        match close {
            Some(close) => {
                output.push_str(&rest[..start]);
                output.push_str(&after[..close]);
                rest = &after[close + 2..];
            }
            None => {
                output.push_str(&rest[..start + 2]);
                rest = after;
            }
        }
    }
    output.push_str(rest);
    output
}

fn collapse_newlines(content: &str) -> String {
    let mut output = String::with_capacity(content.len());
    let mut in_newlines = false;
    for ch in content.chars() {
        if ch == '\n' {
            if !in_newlines {
                output.push(' ');
                in_newlines = true;
            }
        } else {
            in_newlines = false;
            output.push(ch);
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::raw::{RawImageFormat, RawImageFormats, RawTag, RawUser};

    fn raw_post(title: &str, content: &str) -> RawPost {
        RawPost {
            id: 1,
            document_id: "doc-1".to_string(),
            title: title.to_string(),
            content: content.to_string(),
            published_at: "2026-01-02T03:04:05.000Z".to_string(),
            category: None,
            tags: Vec::new(),
            image: Vec::new(),
            user: None,
        }
    }

    #[test]
    fn slug_is_lowercase_alphanumeric_with_single_hyphens() {
        let slug = derive_slug("Hello, World!  Again", "doc-1");
        assert_eq!(slug, "hello-world-again");
        assert!(!slug.starts_with('-') && !slug.ends_with('-'));
        assert!(
            slug.chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        );
    }

    #[test]
    fn empty_slug_falls_back_to_document_id() {
        assert_eq!(derive_slug("!!!", "abc123"), "abc123");
        assert_eq!(derive_slug("", "abc123"), "abc123");
    }

    #[test]
    fn reading_time_floors_at_one_minute() {
        assert_eq!(estimate_reading_time(""), "1 min read");
        assert_eq!(estimate_reading_time("one two three"), "1 min read");
    }

    #[test]
    fn reading_time_rounds_up() {
        let words_201 = vec!["word"; 201].join(" ");
        assert_eq!(estimate_reading_time(&words_201), "2 min read");
        let words_400 = vec!["word"; 400].join(" ");
        assert_eq!(estimate_reading_time(&words_400), "2 min read");
        let words_401 = vec!["word"; 401].join(" ");
        assert_eq!(estimate_reading_time(&words_401), "3 min read");
    }

    #[test]
    fn excerpt_strips_markdown_noise() {
        let excerpt = generate_excerpt("## Heading\n\nSome **bold** text and `code`.");
        assert_eq!(excerpt, "Heading Some bold text and .");
    }

    #[test]
    fn excerpt_short_content_returned_verbatim() {
        assert_eq!(generate_excerpt("A short note."), "A short note.");
    }

    #[test]
    fn excerpt_truncates_to_157_plus_ellipsis() {
        let long = "word ".repeat(100);
        let excerpt = generate_excerpt(&long);
        assert_eq!(excerpt.chars().count(), 160);
        assert!(excerpt.ends_with("..."));
        assert_eq!(
            excerpt.chars().take(157).collect::<String>(),
            long.trim_end().chars().take(157).collect::<String>()
        );
    }

    #[test]
    fn excerpt_never_exceeds_160_chars() {
        for content in [
            "short",
            &"x".repeat(160),
            &"x".repeat(161),
            &"word ".repeat(500),
        ] {
            assert!(generate_excerpt(content).chars().count() <= 160);
        }
    }

    #[test]
    fn excerpt_keeps_unterminated_code_span() {
        assert_eq!(generate_excerpt("start `dangling"), "start `dangling");
    }

    #[test]
    fn cover_image_prefers_medium_then_large_then_original() {
        let image = RawImage {
            id: 1,
            url: "https://cdn.example/orig.jpg".to_string(),
            formats: Some(RawImageFormats {
                large: Some(RawImageFormat {
                    url: "https://cdn.example/large.jpg".to_string(),
                }),
                medium: Some(RawImageFormat {
                    url: "https://cdn.example/medium.jpg".to_string(),
                }),
                ..Default::default()
            }),
        };
        assert_eq!(
            resolve_cover_image(Some(&image), "http://cms.local"),
            "https://cdn.example/medium.jpg"
        );

        let no_medium = RawImage {
            formats: Some(RawImageFormats {
                large: Some(RawImageFormat {
                    url: "https://cdn.example/large.jpg".to_string(),
                }),
                ..Default::default()
            }),
            ..image.clone()
        };
        assert_eq!(
            resolve_cover_image(Some(&no_medium), "http://cms.local"),
            "https://cdn.example/large.jpg"
        );

        let no_formats = RawImage {
            formats: None,
            ..image
        };
        assert_eq!(
            resolve_cover_image(Some(&no_formats), "http://cms.local"),
            "https://cdn.example/orig.jpg"
        );
    }

    #[test]
    fn root_relative_image_gets_cms_origin() {
        let image = RawImage {
            id: 1,
            url: "/uploads/cover.jpg".to_string(),
            formats: None,
        };
        assert_eq!(
            resolve_cover_image(Some(&image), "http://cms.local:1337/"),
            "http://cms.local:1337/uploads/cover.jpg"
        );
    }

    #[test]
    fn missing_image_yields_placeholder() {
        assert_eq!(resolve_cover_image(None, "http://cms.local"), PLACEHOLDER_IMAGE);
    }

    #[test]
    fn normalize_defaults_category_and_author() {
        let post = normalize_post(&raw_post("A Title", "body"), "http://cms.local");
        assert_eq!(post.category, "Uncategorized");
        assert_eq!(post.category_slug, "uncategorized");
        assert_eq!(post.author_name, None);
        assert_eq!(post.author_email, None);
        assert_eq!(post.cover_image, PLACEHOLDER_IMAGE);
        assert_eq!(post.slug, "a-title");
    }

    #[test]
    fn normalize_carries_relations_through() {
        let mut raw = raw_post("Title", "content words");
        raw.category = Some(RawCategory {
            id: 7,
            document_id: "cat-7".to_string(),
            name: "Rust".to_string(),
            slug: "rust".to_string(),
        });
        raw.tags = vec![
            RawTag {
                id: 1,
                name: "systems".to_string(),
            },
            RawTag {
                id: 2,
                name: "tooling".to_string(),
            },
        ];
        raw.user = Some(RawUser {
            id: 3,
            username: Some("ada".to_string()),
            email: Some("ada@example.com".to_string()),
        });

        let post = normalize_post(&raw, "http://cms.local");
        assert_eq!(post.category, "Rust");
        assert_eq!(post.category_slug, "rust");
        assert_eq!(post.tags, vec!["systems", "tooling"]);
        assert_eq!(post.author_name.as_deref(), Some("ada"));
        assert_eq!(post.author_email.as_deref(), Some("ada@example.com"));
    }
}
