use serde::{Serialize, Serializer};

/// Path segment that marks a permalink as an actual post rather than an ad,
/// profile card or embedded link.
pub const POST_PATH_MARKER: &str = "/status/";

/// Separator used when hashtags are flattened into a single field.
pub const HASHTAG_SEPARATOR: &str = "|";

/// Output columns, in the order persistence writes them.
pub const POST_COLUMNS: [&str; 9] = [
    "post_url",
    "username",
    "display_name",
    "date",
    "text",
    "likes",
    "reposts",
    "views",
    "hashtags",
];

/// One feed item. Immutable once built; `url` identifies it within a crawl.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Post {
    #[serde(rename = "post_url")]
    pub url: String,
    pub username: String,
    pub display_name: String,
    #[serde(rename = "date")]
    pub published_at: String,
    pub text: String,
    #[serde(rename = "likes")]
    pub like_count: u64,
    #[serde(rename = "reposts")]
    pub repost_count: u64,
    #[serde(rename = "views")]
    pub view_count: u64,
    #[serde(serialize_with = "join_hashtags")]
    pub hashtags: Vec<String>,
}

impl Post {
    pub fn hashtags_joined(&self) -> String {
        self.hashtags.join(HASHTAG_SEPARATOR)
    }

    /// Field values in `POST_COLUMNS` order.
    pub fn to_record(&self) -> [String; 9] {
        [
            self.url.clone(),
            self.username.clone(),
            self.display_name.clone(),
            self.published_at.clone(),
            self.text.clone(),
            self.like_count.to_string(),
            self.repost_count.to_string(),
            self.view_count.to_string(),
            self.hashtags_joined(),
        ]
    }
}

fn join_hashtags<S>(tags: &[String], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&tags.join(HASHTAG_SEPARATOR))
}

pub fn is_post_permalink(url: &str) -> bool {
    url.contains(POST_PATH_MARKER)
}
