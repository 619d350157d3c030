//! Idempotent HTML embed transforms.
//!
//! Every injected block is wrapped in comment markers. Re-running the
//! finalization stage first strips the previous block for a marker, then
//! inserts the fresh one, so embeds never stack up. All functions here
//! are pure.

use serde_json::json;

use crate::config::BusinessProfile;
use crate::domain::TextArtifact;

fn start_marker(kind: &str) -> String {
    format!("<!-- crier:{} -->", kind)
}

fn end_marker(kind: &str) -> String {
    format!("<!-- /crier:{} -->", kind)
}

/// Remove every block previously inserted under `kind`
pub fn strip_embed(content: &str, kind: &str) -> String {
    let start = start_marker(kind);
    let end = end_marker(kind);

    let mut out = content.to_string();

    while let Some(start_pos) = out.find(&start) {
        let Some(end_rel) = out[start_pos..].find(&end) else {
            // Unterminated marker; leave the content alone
            break;
        };
        let end_pos = start_pos + end_rel + end.len();
        out.replace_range(start_pos..end_pos, "");
    }

    out.trim_end().to_string()
}

/// Replace the `kind` block with `html`, appending it at the end of the
/// content. Applying twice with the same input yields the same output.
pub fn insert_embed(content: &str, kind: &str, html: &str) -> String {
    let stripped = strip_embed(content, kind);

    format!(
        "{}\n\n{}\n{}\n{}",
        stripped.trim_end(),
        start_marker(kind),
        html,
        end_marker(kind)
    )
}

pub fn audio_player_embed(player_url: &str) -> String {
    format!(
        "<iframe src=\"{}\" title=\"Listen to this article\" width=\"100%\" height=\"180\" frameborder=\"0\"></iframe>",
        player_url
    )
}

pub fn video_embed(video_url: &str) -> String {
    format!(
        "<video controls preload=\"metadata\" width=\"100%\" src=\"{}\"></video>",
        video_url
    )
}

/// JSON-LD BlogPosting markup for the published article
pub fn schema_markup(
    text: &TextArtifact,
    business: &BusinessProfile,
    article_url: Option<&str>,
) -> String {
    let mut schema = json!({
        "@context": "https://schema.org",
        "@type": "BlogPosting",
        "headline": text.meta_title,
        "description": text.meta_description,
        "author": {
            "@type": "LocalBusiness",
            "name": business.name,
        },
    });

    if let Some(url) = article_url {
        schema["url"] = json!(url);
    }
    if let Some(website) = &business.website {
        schema["author"]["url"] = json!(website);
    }

    format!(
        "<script type=\"application/ld+json\">{}</script>",
        schema
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::GeneratedArticle;
    use uuid::Uuid;

    const BODY: &str = "<p>First paragraph.</p>\n<p>Second paragraph.</p>";

    #[test]
    fn test_strip_without_marker_is_noop() {
        assert_eq!(strip_embed(BODY, "audio"), BODY);
    }

    #[test]
    fn test_insert_then_strip_restores_content() {
        let embedded = insert_embed(BODY, "audio", "<iframe></iframe>");
        assert!(embedded.contains("<!-- crier:audio -->"));
        assert!(embedded.contains("<iframe></iframe>"));

        assert_eq!(strip_embed(&embedded, "audio"), BODY);
    }

    #[test]
    fn test_insert_is_idempotent() {
        let once = insert_embed(BODY, "audio", "<iframe src=\"a\"></iframe>");
        let twice = insert_embed(&once, "audio", "<iframe src=\"a\"></iframe>");

        assert_eq!(once, twice);
        assert_eq!(once.matches("<!-- crier:audio -->").count(), 1);
    }

    #[test]
    fn test_insert_replaces_previous_block() {
        let old = insert_embed(BODY, "video", "<video src=\"v1\"></video>");
        let new = insert_embed(&old, "video", "<video src=\"v2\"></video>");

        assert!(!new.contains("v1"));
        assert!(new.contains("v2"));
        assert_eq!(new.matches("<!-- crier:video -->").count(), 1);
    }

    #[test]
    fn test_distinct_kinds_do_not_interfere() {
        let with_audio = insert_embed(BODY, "audio", "<iframe></iframe>");
        let with_both = insert_embed(&with_audio, "video", "<video></video>");

        assert!(with_both.contains("<!-- crier:audio -->"));
        assert!(with_both.contains("<!-- crier:video -->"));

        let video_stripped = strip_embed(&with_both, "video");
        assert!(video_stripped.contains("<!-- crier:audio -->"));
        assert!(!video_stripped.contains("<!-- crier:video -->"));
    }

    #[test]
    fn test_schema_markup_shape() {
        let text = TextArtifact::from_generated(
            Uuid::new_v4(),
            GeneratedArticle {
                title: "T".to_string(),
                slug: "t".to_string(),
                body_html: "<p>b</p>".to_string(),
                excerpt: "e".to_string(),
                meta_title: "Meta T".to_string(),
                meta_description: "Meta D".to_string(),
            },
        );
        let business = BusinessProfile {
            name: "Hartley Roofing".to_string(),
            description: String::new(),
            location: None,
            website: Some("https://hartleyroofing.example".to_string()),
        };

        let markup = schema_markup(&text, &business, Some("https://blog.example/t"));

        assert!(markup.starts_with("<script type=\"application/ld+json\">"));
        assert!(markup.contains("\"headline\":\"Meta T\""));
        assert!(markup.contains("Hartley Roofing"));
        assert!(markup.contains("https://blog.example/t"));
    }
}
