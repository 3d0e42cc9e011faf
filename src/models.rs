use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub username: String,
    #[serde(deserialize_with = "null_as_default")]
    pub profile_picture: String,
    #[serde(deserialize_with = "null_as_default")]
    pub full_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub bio: String,
    #[serde(deserialize_with = "null_as_default")]
    pub website: String,
    #[serde(deserialize_with = "null_as_default")]
    pub is_business: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub counts: UserCounts,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserCounts {
    pub media: u64,
    pub follows: u64,
    pub followed_by: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub user: User,
    #[serde(deserialize_with = "epoch_seconds")]
    pub created_time: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub likes: Counter,
    #[serde(default, deserialize_with = "null_as_default")]
    pub comments: Counter,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub kind: PostKind,
    #[serde(rename = "link", default, deserialize_with = "null_as_default")]
    pub permalink: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub images: MediaVariants,
    #[serde(default)]
    pub videos: Option<MediaVariants>,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub caption: Option<Caption>,
}

impl Post {
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.created_time, 0)
    }

    pub fn like_count(&self) -> u64 {
        self.likes.count
    }

    pub fn comment_count(&self) -> u64 {
        self.comments.count
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Counter {
    pub count: u64,
}

/// Post type tag as sent by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostKind {
    #[default]
    Image,
    Video,
    Carousel,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaVariants {
    pub low_resolution: Option<MediaInfo>,
    pub thumbnail: Option<MediaInfo>,
    pub standard_resolution: Option<MediaInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaInfo {
    #[serde(deserialize_with = "null_as_default")]
    pub url: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub street_address: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Caption {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(deserialize_with = "epoch_seconds")]
    pub created_time: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub from: User,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(deserialize_with = "epoch_seconds")]
    pub created_time: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub from: User,
}

impl Comment {
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.created_time, 0)
    }
}

/// Payload for the media listing page: the signed-in user and their recent posts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaViewModel {
    pub user: User,
    pub media: Vec<Post>,
}

/// Payload for a single post page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostViewModel {
    pub post: Post,
    pub comments: Vec<Comment>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawScalar {
    Int(i64),
    Text(String),
    Null,
}

/// `created_time` comes as a decimal string on most endpoints and as an
/// integer on a few.
fn epoch_seconds<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match RawScalar::deserialize(deserializer)? {
        RawScalar::Int(secs) => Ok(secs),
        RawScalar::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid epoch seconds '{}'", text))),
        RawScalar::Null => Err(serde::de::Error::custom("created_time is null")),
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match RawScalar::deserialize(deserializer)? {
        RawScalar::Int(n) => Ok(n.to_string()),
        RawScalar::Text(text) => Ok(text),
        RawScalar::Null => Ok(String::new()),
    }
}

/// The provider sends `null` for blank profile and text fields.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample_post() -> serde_json::Value {
        json!({
            "id": "123",
            "user": {
                "id": "42",
                "username": "jane",
                "profile_picture": "https://cdn.example/jane.jpg",
                "full_name": "Jane Doe"
            },
            "created_time": "1000",
            "likes": { "count": 5 },
            "comments": { "count": 2 },
            "type": "video",
            "link": "https://instagram.com/p/abc/",
            "filter": "Normal",
            "tags": ["sun"],
            "images": {
                "low_resolution": { "url": "https://cdn.example/l.jpg", "width": 320, "height": 320 },
                "thumbnail": { "url": "https://cdn.example/t.jpg", "width": 150, "height": 150 },
                "standard_resolution": { "url": "https://cdn.example/s.jpg", "width": 640, "height": 640 }
            },
            "videos": {
                "standard_resolution": { "url": "https://cdn.example/v.mp4", "width": 640, "height": 640 }
            },
            "location": {
                "id": 514276,
                "latitude": 37.7808,
                "longitude": -122.3962,
                "street_address": "1 Market St",
                "name": "Ferry Building"
            },
            "caption": {
                "id": "17850",
                "created_time": "1001",
                "text": "hello",
                "from": { "id": "42", "username": "jane" }
            }
        })
    }

    #[test]
    fn post_maps_provider_field_names() {
        let post: Post = serde_json::from_value(sample_post()).unwrap();

        assert_eq!(post.id, "123");
        assert_eq!(post.created_time, 1000);
        assert_eq!(post.like_count(), 5);
        assert_eq!(post.comment_count(), 2);
        assert_eq!(post.kind, PostKind::Video);
        assert_eq!(post.permalink, "https://instagram.com/p/abc/");
        assert_eq!(post.user.profile_picture, "https://cdn.example/jane.jpg");
        assert_eq!(post.user.full_name, "Jane Doe");

        let standard = post.images.standard_resolution.as_ref().unwrap();
        assert_eq!(standard.width, 640);
        assert_eq!(
            post.images.low_resolution.as_ref().unwrap().url,
            "https://cdn.example/l.jpg"
        );

        let videos = post.videos.as_ref().unwrap();
        assert!(videos.low_resolution.is_none());
        assert_eq!(
            videos.standard_resolution.as_ref().unwrap().url,
            "https://cdn.example/v.mp4"
        );

        let location = post.location.as_ref().unwrap();
        assert_eq!(location.id, "514276");
        assert_eq!(location.street_address, "1 Market St");
        assert!((location.latitude - 37.7808).abs() < f64::EPSILON);

        let caption = post.caption.as_ref().unwrap();
        assert_eq!(caption.created_time, 1001);
        assert_eq!(caption.from.username, "jane");
    }

    #[test]
    fn optional_parts_may_be_null_or_missing() {
        let post: Post = serde_json::from_value(json!({
            "id": "7",
            "created_time": 1500000000,
            "type": "image",
            "videos": null,
            "location": null,
            "caption": null
        }))
        .unwrap();

        assert_eq!(post.created_time, 1_500_000_000);
        assert!(post.videos.is_none());
        assert!(post.location.is_none());
        assert!(post.caption.is_none());
        assert_eq!(post.like_count(), 0);
        assert_eq!(
            post.created_at().unwrap().to_rfc3339(),
            "2017-07-14T02:40:00+00:00"
        );
    }

    #[test]
    fn unknown_type_tag_is_other() {
        let post: Post = serde_json::from_value(json!({
            "id": "8",
            "created_time": "1",
            "type": "reel"
        }))
        .unwrap();
        assert_eq!(post.kind, PostKind::Other);

        let post: Post = serde_json::from_value(json!({
            "id": "9",
            "created_time": "1",
            "type": "carousel"
        }))
        .unwrap();
        assert_eq!(post.kind, PostKind::Carousel);
    }

    #[test]
    fn bad_timestamp_is_rejected() {
        let result = serde_json::from_value::<Post>(json!({
            "id": "1",
            "created_time": "yesterday"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn user_counts_map_followed_by() {
        let user: User = serde_json::from_value(json!({
            "id": "1574083",
            "username": "snoopdogg",
            "full_name": "Snoop Dogg",
            "profile_picture": "http://distillery.s3.amazonaws.com/profiles/profile_1574083_75sq_1295469061.jpg",
            "bio": "This is my bio",
            "website": "http://snoopdogg.com",
            "is_business": true,
            "counts": { "media": 1320, "follows": 420, "followed_by": 3410 }
        }))
        .unwrap();

        assert_eq!(user.bio, "This is my bio");
        assert!(user.is_business);
        assert_eq!(
            user.counts,
            UserCounts {
                media: 1320,
                follows: 420,
                followed_by: 3410,
            }
        );
    }

    #[test]
    fn null_text_fields_become_empty() {
        let user: User = serde_json::from_value(json!({
            "id": "42",
            "username": "jane",
            "full_name": null,
            "bio": null,
            "website": null,
            "profile_picture": null,
            "is_business": null,
            "counts": null
        }))
        .unwrap();
        assert_eq!(user.website, "");
        assert_eq!(user.bio, "");
        assert!(!user.is_business);
        assert_eq!(user.counts, UserCounts::default());

        let comment: Comment = serde_json::from_value(json!({
            "id": "1",
            "created_time": "10",
            "text": null,
            "from": null
        }))
        .unwrap();
        assert_eq!(comment.text, "");
        assert_eq!(comment.from, User::default());

        let post: Post = serde_json::from_value(json!({
            "id": "5",
            "created_time": "10",
            "type": null,
            "link": null,
            "likes": null,
            "images": { "thumbnail": { "url": null, "width": 150, "height": 150 } },
            "location": { "id": 1, "latitude": 1.5, "longitude": 2.5, "street_address": null, "name": null },
            "caption": { "created_time": "11", "text": null, "from": { "id": "42", "bio": null } }
        }))
        .unwrap();
        assert_eq!(post.kind, PostKind::Image);
        assert_eq!(post.permalink, "");
        assert_eq!(post.like_count(), 0);
        assert_eq!(post.images.thumbnail.as_ref().unwrap().url, "");
        assert_eq!(post.location.as_ref().unwrap().street_address, "");
        assert_eq!(post.caption.as_ref().unwrap().from.bio, "");
    }

    #[test]
    fn comment_author_has_partial_user() {
        let comment: Comment = serde_json::from_value(json!({
            "created_time": "1280780324",
            "text": "Really amazing photo!",
            "from": {
                "username": "snoop",
                "profile_picture": "http://images.instagram.com/profiles/profile_16_75sq_1305612434.jpg",
                "id": "1574083",
                "full_name": "Snoop Dogg"
            },
            "id": "420"
        }))
        .unwrap();

        assert_eq!(comment.id, "420");
        assert_eq!(comment.from.username, "snoop");
        assert_eq!(comment.from.counts, UserCounts::default());
        assert_eq!(comment.created_at().unwrap().timestamp(), 1_280_780_324);
    }
}
