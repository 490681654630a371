use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::dao::{
    models::{Difficulty, GameEntity, ReviewEntity},
    record_store::couchdb::error::CouchDaoError,
};

pub const GAME_PREFIX: &str = "game::";
pub const REVIEW_PREFIX: &str = "review::";
pub const END_SUFFIX: &str = "\u{ffff}";

#[derive(Debug, Deserialize)]
pub struct AllDocsResponse {
    pub rows: Vec<AllDocsRow>,
}

/// Row of `_all_docs`. Rows for unknown keys carry an `error` and no document.
#[derive(Debug, Deserialize)]
pub struct AllDocsRow {
    #[serde(default)]
    pub doc: Option<Value>,
}

/// Response of a Mango `_find` query.
#[derive(Debug, Deserialize)]
pub struct FindResponse<T> {
    pub docs: Vec<T>,
    #[serde(default)]
    pub bookmark: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FindRequest<'a> {
    pub selector: Value,
    pub limit: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bookmark: Option<&'a str>,
}

/// Entry of a `_bulk_docs` request marking a document as deleted.
#[derive(Debug, Serialize)]
pub struct DeletionStub {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev")]
    pub rev: String,
    #[serde(rename = "_deleted")]
    pub deleted: bool,
}

#[derive(Debug, Serialize)]
pub struct BulkDocsRequest {
    pub docs: Vec<DeletionStub>,
}

/// Per-document outcome returned by `_bulk_docs`.
///
/// Failed rows carry `error` and `reason` instead of `ok`.
#[derive(Debug, Deserialize)]
pub struct BulkDocsResult {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Count the written rows of a `_bulk_docs` reply, failing if any row was refused.
pub fn count_bulk_writes(results: &[BulkDocsResult]) -> Result<u64, CouchDaoError> {
    let mut failures = results.iter().filter(|result| !result.ok);
    let Some(first) = failures.next() else {
        return Ok(results.len() as u64);
    };

    Err(CouchDaoError::BulkWrite {
        failed: 1 + failures.count(),
        total: results.len(),
        doc_id: first.id.clone().unwrap_or_default(),
        reason: match (&first.error, &first.reason) {
            (Some(error), Some(reason)) => format!("{error}: {reason}"),
            (Some(error), None) => error.clone(),
            (None, Some(reason)) => reason.clone(),
            (None, None) => "no outcome reported".to_owned(),
        },
    })
}

/// Response to a single document write.
#[derive(Debug, Deserialize)]
pub struct WriteResponse {
    pub rev: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchGameDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(flatten)]
    pub game: GameBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameBody {
    pub title: String,
    pub genre: String,
    pub platform: String,
    pub release_year: i32,
    pub developer: String,
    pub cover_image_url: String,
    pub description: String,
    #[serde(default)]
    pub completed: bool,
    pub created_at: SystemTime,
}

impl From<(GameEntity, Option<String>)> for CouchGameDocument {
    fn from((game, rev): (GameEntity, Option<String>)) -> Self {
        Self {
            id: game_doc_id(game.id),
            rev,
            game: GameBody {
                title: game.title,
                genre: game.genre,
                platform: game.platform,
                release_year: game.release_year,
                developer: game.developer,
                cover_image_url: game.cover_image_url,
                description: game.description,
                completed: game.completed,
                created_at: game.created_at,
            },
        }
    }
}

impl TryFrom<CouchGameDocument> for GameEntity {
    type Error = CouchDaoError;

    fn try_from(doc: CouchGameDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: extract_uuid(&doc.id)?,
            title: doc.game.title,
            genre: doc.game.genre,
            platform: doc.game.platform,
            release_year: doc.game.release_year,
            developer: doc.game.developer,
            cover_image_url: doc.game.cover_image_url,
            description: doc.game.description,
            completed: doc.game.completed,
            created_at: doc.game.created_at,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchReviewDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(flatten)]
    pub review: ReviewBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewBody {
    /// Hyphenated UUID string, matched by [`review_selector`].
    pub game_id: Uuid,
    pub rating: u8,
    pub review_text: String,
    pub hours_played: f64,
    pub difficulty: Difficulty,
    pub would_recommend: bool,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

impl From<(ReviewEntity, Option<String>)> for CouchReviewDocument {
    fn from((review, rev): (ReviewEntity, Option<String>)) -> Self {
        Self {
            id: review_doc_id(review.id),
            rev,
            review: ReviewBody {
                game_id: review.game_id,
                rating: review.rating,
                review_text: review.review_text,
                hours_played: review.hours_played,
                difficulty: review.difficulty,
                would_recommend: review.would_recommend,
                created_at: review.created_at,
                updated_at: review.updated_at,
            },
        }
    }
}

impl TryFrom<CouchReviewDocument> for ReviewEntity {
    type Error = CouchDaoError;

    fn try_from(doc: CouchReviewDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: extract_uuid(&doc.id)?,
            game_id: doc.review.game_id,
            rating: doc.review.rating,
            review_text: doc.review.review_text,
            hours_played: doc.review.hours_played,
            difficulty: doc.review.difficulty,
            would_recommend: doc.review.would_recommend,
            created_at: doc.review.created_at,
            updated_at: doc.review.updated_at,
        })
    }
}

pub fn game_doc_id(id: Uuid) -> String {
    format!("{}{}", GAME_PREFIX, id)
}

pub fn review_doc_id(id: Uuid) -> String {
    format!("{}{}", REVIEW_PREFIX, id)
}

pub fn extract_uuid(doc_id: &str) -> Result<Uuid, CouchDaoError> {
    let (_, id) = doc_id
        .split_once("::")
        .ok_or_else(|| CouchDaoError::InvalidDocId {
            doc_id: doc_id.to_string(),
            kind: "missing separator",
        })?;

    Uuid::parse_str(id).map_err(|_| CouchDaoError::InvalidDocId {
        doc_id: doc_id.to_string(),
        kind: "invalid UUID",
    })
}

/// Mango selector restricted to review documents, optionally for one game.
pub fn review_selector(game_id: Option<Uuid>) -> Value {
    let mut selector = json!({
        "_id": {
            "$gt": REVIEW_PREFIX,
            "$lt": format!("{}{}", REVIEW_PREFIX, END_SUFFIX),
        }
    });
    if let (Some(game_id), Some(fields)) = (game_id, selector.as_object_mut()) {
        fields.insert("game_id".to_owned(), json!(game_id.to_string()));
    }
    selector
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doc_ids_round_trip_through_extract() {
        let id = Uuid::new_v4();
        assert_eq!(extract_uuid(&game_doc_id(id)).unwrap(), id);
        assert_eq!(extract_uuid(&review_doc_id(id)).unwrap(), id);
    }

    #[test]
    fn extract_rejects_foreign_ids() {
        assert!(matches!(
            extract_uuid("_design/reviews"),
            Err(CouchDaoError::InvalidDocId { .. })
        ));
        assert!(matches!(
            extract_uuid("review::not-a-uuid"),
            Err(CouchDaoError::InvalidDocId { .. })
        ));
    }

    #[test]
    fn review_selector_filters_on_game_when_given() {
        let game_id = Uuid::new_v4();
        let selector = review_selector(Some(game_id));
        assert_eq!(selector["game_id"], json!(game_id.to_string()));
        assert_eq!(selector["_id"]["$gt"], json!(REVIEW_PREFIX));

        assert!(review_selector(None).get("game_id").is_none());
    }

    #[test]
    fn bulk_replies_count_written_rows() {
        let results: Vec<BulkDocsResult> = serde_json::from_value(json!([
            {"id": "review::a", "rev": "2-x", "ok": true},
            {"id": "review::b", "rev": "2-y", "ok": true},
        ]))
        .unwrap();

        assert_eq!(count_bulk_writes(&results).unwrap(), 2);
        assert_eq!(count_bulk_writes(&[]).unwrap(), 0);
    }

    #[test]
    fn bulk_replies_with_refused_rows_fail() {
        let results: Vec<BulkDocsResult> = serde_json::from_value(json!([
            {"id": "review::a", "rev": "2-x", "ok": true},
            {"id": "review::b", "error": "conflict", "reason": "Document update conflict."},
        ]))
        .unwrap();

        let err = count_bulk_writes(&results).unwrap_err();
        assert!(!err.is_connectivity());
        match err {
            CouchDaoError::BulkWrite {
                failed,
                total,
                doc_id,
                reason,
            } => {
                assert_eq!((failed, total), (1, 2));
                assert_eq!(doc_id, "review::b");
                assert_eq!(reason, "conflict: Document update conflict.");
            }
            other => panic!("expected a bulk write failure, got {other:?}"),
        }
    }
}
