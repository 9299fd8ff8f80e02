//! Rich-text ("post") messages.
//!
//! A post is an ordered list of paragraphs, each an ordered list of inline
//! elements. Only text and @-mentions carry text the bridge can use.

use {
    serde::{Deserialize, Deserializer},
    serde_json::Value,
};

/// Decoded `content` of a `post` message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostMessageContent {
    #[serde(default)]
    pub post: Option<LocalizedPost>,
}

/// Per-locale variants of a post.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocalizedPost {
    #[serde(default)]
    pub zh_cn: Option<PostBody>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostBody {
    #[serde(default, deserialize_with = "lenient_paragraphs")]
    pub content: Vec<Vec<PostElement>>,
}

/// Inline element of a post paragraph, keyed by its `tag`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "tag")]
pub enum PostElement {
    #[serde(rename = "text")]
    Text {
        #[serde(default)]
        text: String,
    },
    #[serde(rename = "at")]
    Mention {
        #[serde(default)]
        mention_name: Option<String>,
    },
    /// Links, images, emoji and other tags we do not render.
    #[serde(other)]
    Unsupported,
}

/// Decode paragraphs element by element, skipping anything that is not a
/// tagged element object instead of failing the whole post.
fn lenient_paragraphs<'de, D>(deserializer: D) -> Result<Vec<Vec<PostElement>>, D::Error>
where
    D: Deserializer<'de>,
{
    let paragraphs = Vec::<Value>::deserialize(deserializer)?;
    Ok(paragraphs
        .into_iter()
        .filter_map(|paragraph| match paragraph {
            Value::Array(elements) => Some(
                elements
                    .into_iter()
                    .filter_map(|element| PostElement::deserialize(element).ok())
                    .collect(),
            ),
            _ => None,
        })
        .collect())
}

impl PostMessageContent {
    /// Text of the `zh_cn` variant, empty when there is none.
    pub fn plain_text(&self) -> String {
        self.post
            .as_ref()
            .and_then(|p| p.zh_cn.as_ref())
            .map(PostBody::plain_text)
            .unwrap_or_default()
    }
}

impl PostBody {
    pub fn plain_text(&self) -> String {
        extract_text(&self.content)
    }
}

/// Flatten post paragraphs into display text.
///
/// Text elements are copied verbatim and mentions become `@name ` (with a
/// trailing space). Nothing is trimmed or joined between paragraphs.
pub fn extract_text(blocks: &[Vec<PostElement>]) -> String {
    let mut text = String::new();
    for element in blocks.iter().flatten() {
        match element {
            PostElement::Text { text: t } => text.push_str(t),
            PostElement::Mention { mention_name } => {
                text.push('@');
                text.push_str(mention_name.as_deref().unwrap_or("user"));
                text.push(' ');
            },
            PostElement::Unsupported => {},
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest, serde_json::json};

    fn blocks(value: Value) -> Vec<Vec<PostElement>> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn text_and_mention() {
        let b = blocks(json!([[
            { "tag": "text", "text": "Hello " },
            { "tag": "at", "user_id": "ou_1", "mention_name": "Bob" }
        ]]));
        assert_eq!(extract_text(&b), "Hello @Bob ");
    }

    #[test]
    fn mention_without_name_falls_back_to_user() {
        let b = blocks(json!([[{ "tag": "at", "user_id": "ou_1" }]]));
        assert_eq!(extract_text(&b), "@user ");
    }

    #[test]
    fn empty_blocks_give_empty_text() {
        assert_eq!(extract_text(&[]), "");
        assert_eq!(extract_text(&[Vec::new(), Vec::new()]), "");
    }

    #[test]
    fn unknown_tags_are_skipped() {
        let b = blocks(json!([
            [{ "tag": "a", "href": "https://example.com", "text": "link" }],
            [{ "tag": "img", "image_key": "img_1" }, { "tag": "text", "text": "after" }]
        ]));
        assert_eq!(extract_text(&b), "after");
    }

    #[test]
    fn paragraphs_are_concatenated_without_separator() {
        let b = blocks(json!([
            [{ "tag": "text", "text": "  line one " }],
            [{ "tag": "text", "text": "line two" }]
        ]));
        assert_eq!(extract_text(&b), "  line one line two");
    }

    #[rstest]
    #[case(json!([]), json!([[{ "tag": "text", "text": "x" }]]))]
    #[case(
        json!([[{ "tag": "text", "text": "a" }, { "tag": "at", "mention_name": "Ann" }]]),
        json!([[{ "tag": "at" }], [{ "tag": "text", "text": "b" }]])
    )]
    #[case(json!([[{ "tag": "emotion", "emoji_type": "SMILE" }]]), json!([]))]
    fn extraction_distributes_over_concatenation(
        #[case] left: Value,
        #[case] right: Value,
    ) {
        let left = blocks(left);
        let right = blocks(right);
        let joined: Vec<_> = left.iter().chain(right.iter()).cloned().collect();
        assert_eq!(
            extract_text(&joined),
            extract_text(&left) + &extract_text(&right)
        );
    }

    #[test]
    fn plain_text_uses_zh_cn_variant() {
        let content: PostMessageContent = serde_json::from_value(json!({
            "post": {
                "en_us": { "content": [[{ "tag": "text", "text": "english" }]] },
                "zh_cn": { "title": "t", "content": [[{ "tag": "text", "text": "中文" }]] }
            }
        }))
        .unwrap();
        assert_eq!(content.plain_text(), "中文");
    }

    #[rstest]
    #[case(json!([[{ "text": "x" }, { "tag": "text", "text": "ok" }]]), "ok")]
    #[case(json!([["bare", 7, null, { "tag": "text", "text": "ok" }]]), "ok")]
    #[case(json!([[{ "tag": "text", "text": "a" }], "not a paragraph", [{ "tag": "at", "mention_name": "Bo" }]]), "a@Bo ")]
    #[case(json!([[{ "tag": 3, "text": "x" }, { "tag": "text", "text": 5 }, { "tag": "text", "text": "ok" }]]), "ok")]
    fn malformed_elements_are_skipped(#[case] content: Value, #[case] expected: &str) {
        let content: PostMessageContent =
            serde_json::from_value(json!({ "post": { "zh_cn": { "content": content } } })).unwrap();
        assert_eq!(content.plain_text(), expected);
    }

    #[test]
    fn plain_text_without_zh_cn_is_empty() {
        let content: PostMessageContent = serde_json::from_value(json!({
            "post": { "en_us": { "content": [[{ "tag": "text", "text": "english" }]] } }
        }))
        .unwrap();
        assert_eq!(content.plain_text(), "");

        let content: PostMessageContent = serde_json::from_value(json!({})).unwrap();
        assert_eq!(content.plain_text(), "");
    }
}
