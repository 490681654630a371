use std::{sync::Arc, time::SystemTime};

use futures::future::BoxFuture;
use reqwest::{Client, Method, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{from_value, json};
use uuid::Uuid;

use crate::dao::{
    models::{
        GameChangesEntity, GameEntity, NewGameEntity, NewReviewEntity, ReviewChangesEntity,
        ReviewEntity,
    },
    record_store::RecordStore,
    storage::StorageResult,
};

use super::{
    config::CouchConfig,
    error::{CouchDaoError, CouchResult},
    models::{
        AllDocsResponse, BulkDocsRequest, BulkDocsResult, CouchGameDocument, CouchReviewDocument,
        DeletionStub, END_SUFFIX, FindRequest, FindResponse, GAME_PREFIX, WriteResponse,
        count_bulk_writes, game_doc_id, review_doc_id, review_selector,
    },
};

const FIND_PAGE_SIZE: usize = 200;

/// CouchDB-backed [`RecordStore`]; games and reviews share one database and are told
/// apart by their `game::` / `review::` id prefixes.
#[derive(Clone)]
pub struct CouchRecordStore {
    client: Client,
    base_url: Arc<str>,
    database: Arc<str>,
    auth: Option<(Arc<str>, Arc<str>)>,
}

impl CouchRecordStore {
    /// Establish a connection to CouchDB and ensure the database exists.
    pub async fn connect(config: CouchConfig) -> CouchResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| CouchDaoError::ClientBuilder { source })?;

        let base_url = Arc::<str>::from(config.base_url.trim_end_matches('/'));
        let database = Arc::<str>::from(config.database);
        let auth = config
            .username
            .zip(config.password)
            .map(|(u, p)| (Arc::<str>::from(u), Arc::<str>::from(p)));

        let store = Self {
            client,
            base_url,
            database,
            auth,
        };

        store.ensure_database().await?;
        store.ensure_indexes().await?;
        Ok(store)
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}/{}", self.base_url, self.database, path);
        self.authorize(self.client.request(method, url))
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some((ref user, ref pass)) = self.auth {
            builder.basic_auth(user.as_ref(), Some(pass.as_ref()))
        } else {
            builder
        }
    }

    async fn ensure_database(&self) -> CouchResult<()> {
        let database = self.database.to_string();
        let url = format!("{}/{}", self.base_url, self.database);

        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|source| CouchDaoError::DatabaseQuery {
                database: database.clone(),
                source,
            })?;

        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND => {
                let create = self
                    .authorize(self.client.put(&url))
                    .send()
                    .await
                    .map_err(|source| CouchDaoError::DatabaseCreate {
                        database: database.clone(),
                        source,
                    })?;
                if create.status().is_success() {
                    Ok(())
                } else {
                    Err(CouchDaoError::DatabaseStatus {
                        database,
                        status: create.status(),
                    })
                }
            }
            other => Err(CouchDaoError::DatabaseStatus {
                database,
                status: other,
            }),
        }
    }

    async fn ensure_indexes(&self) -> CouchResult<()> {
        const INDEX: &str = "_index";
        // Creating an index that already exists is a no-op answered with 200.
        let body = json!({
            "index": { "fields": ["game_id"] },
            "name": "review-game-idx",
            "type": "json",
        });
        let response = self
            .request(Method::POST, INDEX)
            .json(&body)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: INDEX.to_string(),
                source,
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(CouchDaoError::RequestStatus {
                path: INDEX.to_string(),
                status: response.status(),
            })
        }
    }

    async fn get_document<T>(&self, doc_id: &str) -> CouchResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::GET, doc_id)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                response.json::<T>().await.map(Some).map_err(|source| {
                    CouchDaoError::DecodeResponse {
                        path: doc_id.to_string(),
                        source,
                    }
                })
            }
            other => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status: other,
            }),
        }
    }

    /// Write a document and return its new revision.
    async fn put_document<T>(&self, doc_id: &str, document: &T) -> CouchResult<String>
    where
        T: ?Sized + Serialize,
    {
        let response = self
            .request(Method::PUT, doc_id)
            .json(document)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status: response.status(),
            });
        }

        let written = response.json::<WriteResponse>().await.map_err(|source| {
            CouchDaoError::DecodeResponse {
                path: doc_id.to_string(),
                source,
            }
        })?;
        Ok(written.rev)
    }

    async fn delete_document(&self, doc_id: &str, rev: &str) -> CouchResult<()> {
        let response = self
            .request(Method::DELETE, doc_id)
            .query(&[("rev", rev)])
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status: response.status(),
            })
        }
    }

    async fn list_documents<T>(&self, prefix: &str) -> CouchResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let query = [
            ("include_docs", "true".to_string()),
            ("startkey", format!("\"{}\"", prefix)),
            ("endkey", format!("\"{}{}\"", prefix, END_SUFFIX)),
        ];
        self.all_docs(self.request(Method::GET, "_all_docs").query(&query))
            .await
    }

    async fn fetch_documents<T>(&self, doc_ids: Vec<String>) -> CouchResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        self.all_docs(
            self.request(Method::POST, "_all_docs")
                .query(&[("include_docs", "true")])
                .json(&json!({ "keys": doc_ids })),
        )
        .await
    }

    async fn all_docs<T>(&self, builder: reqwest::RequestBuilder) -> CouchResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        const ALL_DOCS: &str = "_all_docs";
        let response = builder
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: ALL_DOCS.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(CouchDaoError::RequestStatus {
                path: ALL_DOCS.to_string(),
                status: response.status(),
            });
        }

        let payload = response.json::<AllDocsResponse>().await.map_err(|source| {
            CouchDaoError::DecodeResponse {
                path: ALL_DOCS.to_string(),
                source,
            }
        })?;

        let mut documents = Vec::new();
        for row in payload.rows {
            if let Some(doc) = row.doc {
                let parsed = from_value(doc).map_err(|source| CouchDaoError::DeserializeValue {
                    path: ALL_DOCS.to_string(),
                    source,
                })?;
                documents.push(parsed);
            }
        }

        Ok(documents)
    }

    /// Run a Mango query, following bookmarks until every page is read.
    async fn find_reviews(&self, game_id: Option<Uuid>) -> CouchResult<Vec<CouchReviewDocument>> {
        const FIND: &str = "_find";
        let selector = review_selector(game_id);
        let mut documents = Vec::new();
        let mut bookmark: Option<String> = None;

        loop {
            let request = FindRequest {
                selector: selector.clone(),
                limit: FIND_PAGE_SIZE,
                bookmark: bookmark.as_deref(),
            };
            let response = self
                .request(Method::POST, FIND)
                .json(&request)
                .send()
                .await
                .map_err(|source| CouchDaoError::RequestSend {
                    path: FIND.to_string(),
                    source,
                })?;

            if !response.status().is_success() {
                return Err(CouchDaoError::RequestStatus {
                    path: FIND.to_string(),
                    status: response.status(),
                });
            }

            let page = response
                .json::<FindResponse<CouchReviewDocument>>()
                .await
                .map_err(|source| CouchDaoError::DecodeResponse {
                    path: FIND.to_string(),
                    source,
                })?;

            let page_len = page.docs.len();
            documents.extend(page.docs);
            if page_len < FIND_PAGE_SIZE {
                break;
            }
            bookmark = page.bookmark;
            if bookmark.is_none() {
                break;
            }
        }

        Ok(documents)
    }

    async fn update_game(
        &self,
        id: Uuid,
        changes: GameChangesEntity,
    ) -> CouchResult<Option<GameEntity>> {
        let doc_id = game_doc_id(id);
        let Some(existing) = self.get_document::<CouchGameDocument>(&doc_id).await? else {
            return Ok(None);
        };
        let rev = existing.rev.clone();
        let mut game = GameEntity::try_from(existing)?;
        if changes.is_empty() {
            return Ok(Some(game));
        }

        changes.apply_to(&mut game);
        let doc = CouchGameDocument::from((game.clone(), rev));
        self.put_document(&doc_id, &doc).await?;
        Ok(Some(game))
    }

    async fn update_review(
        &self,
        id: Uuid,
        changes: ReviewChangesEntity,
    ) -> CouchResult<Option<ReviewEntity>> {
        let doc_id = review_doc_id(id);
        let Some(existing) = self.get_document::<CouchReviewDocument>(&doc_id).await? else {
            return Ok(None);
        };
        let rev = existing.rev.clone();
        let mut review = ReviewEntity::try_from(existing)?;

        changes.apply_to(&mut review);
        let doc = CouchReviewDocument::from((review.clone(), rev));
        self.put_document(&doc_id, &doc).await?;
        Ok(Some(review))
    }

    async fn delete_game(&self, id: Uuid) -> CouchResult<Option<GameEntity>> {
        let doc_id = game_doc_id(id);
        let Some(existing) = self.get_document::<CouchGameDocument>(&doc_id).await? else {
            return Ok(None);
        };
        let rev = existing.rev.clone().unwrap_or_default();
        let game = GameEntity::try_from(existing)?;
        self.delete_document(&doc_id, &rev).await?;
        Ok(Some(game))
    }

    async fn delete_review(&self, id: Uuid) -> CouchResult<Option<ReviewEntity>> {
        let doc_id = review_doc_id(id);
        let Some(existing) = self.get_document::<CouchReviewDocument>(&doc_id).await? else {
            return Ok(None);
        };
        let rev = existing.rev.clone().unwrap_or_default();
        let review = ReviewEntity::try_from(existing)?;
        self.delete_document(&doc_id, &rev).await?;
        Ok(Some(review))
    }

    async fn delete_reviews_by_game(&self, game_id: Uuid) -> CouchResult<u64> {
        const BULK_DOCS: &str = "_bulk_docs";
        let stubs: Vec<DeletionStub> = self
            .find_reviews(Some(game_id))
            .await?
            .into_iter()
            .filter_map(|doc| {
                doc.rev.map(|rev| DeletionStub {
                    id: doc.id,
                    rev,
                    deleted: true,
                })
            })
            .collect();

        if stubs.is_empty() {
            return Ok(0);
        }

        let response = self
            .request(Method::POST, BULK_DOCS)
            .json(&BulkDocsRequest { docs: stubs })
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: BULK_DOCS.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(CouchDaoError::RequestStatus {
                path: BULK_DOCS.to_string(),
                status: response.status(),
            });
        }

        let results = response
            .json::<Vec<BulkDocsResult>>()
            .await
            .map_err(|source| CouchDaoError::DecodeResponse {
                path: BULK_DOCS.to_string(),
                source,
            })?;

        count_bulk_writes(&results)
    }
}

impl RecordStore for CouchRecordStore {
    fn insert_game(&self, game: NewGameEntity) -> BoxFuture<'static, StorageResult<GameEntity>> {
        let store = self.clone();
        Box::pin(async move {
            let entity = game.into_entity(Uuid::new_v4(), SystemTime::now());
            let doc = CouchGameDocument::from((entity.clone(), None));
            store.put_document(&doc.id, &doc).await?;
            Ok(entity)
        })
    }

    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let doc_id = game_doc_id(id);
            let maybe_doc = store.get_document::<CouchGameDocument>(&doc_id).await?;
            Ok(maybe_doc.map(GameEntity::try_from).transpose()?)
        })
    }

    fn find_games(&self, ids: Vec<Uuid>) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            if ids.is_empty() {
                return Ok(Vec::new());
            }
            let doc_ids = ids.into_iter().map(game_doc_id).collect();
            let docs = store
                .fetch_documents::<CouchGameDocument>(doc_ids)
                .await?;
            Ok(docs
                .into_iter()
                .map(GameEntity::try_from)
                .collect::<Result<Vec<_>, _>>()?)
        })
    }

    fn list_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let docs = store
                .list_documents::<CouchGameDocument>(GAME_PREFIX)
                .await?;
            Ok(docs
                .into_iter()
                .map(GameEntity::try_from)
                .collect::<Result<Vec<_>, _>>()?)
        })
    }

    fn update_game(
        &self,
        id: Uuid,
        changes: GameChangesEntity,
    ) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.update_game(id, changes).await.map_err(Into::into) })
    }

    fn delete_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.delete_game(id).await.map_err(Into::into) })
    }

    fn insert_review(
        &self,
        review: NewReviewEntity,
    ) -> BoxFuture<'static, StorageResult<ReviewEntity>> {
        let store = self.clone();
        Box::pin(async move {
            let entity = review.into_entity(Uuid::new_v4(), SystemTime::now());
            let doc = CouchReviewDocument::from((entity.clone(), None));
            store.put_document(&doc.id, &doc).await?;
            Ok(entity)
        })
    }

    fn find_review(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<ReviewEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let doc_id = review_doc_id(id);
            let maybe_doc = store.get_document::<CouchReviewDocument>(&doc_id).await?;
            Ok(maybe_doc.map(ReviewEntity::try_from).transpose()?)
        })
    }

    fn list_reviews(
        &self,
        game_id: Option<Uuid>,
    ) -> BoxFuture<'static, StorageResult<Vec<ReviewEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let docs = store.find_reviews(game_id).await?;
            Ok(docs
                .into_iter()
                .map(ReviewEntity::try_from)
                .collect::<Result<Vec<_>, _>>()?)
        })
    }

    fn update_review(
        &self,
        id: Uuid,
        changes: ReviewChangesEntity,
    ) -> BoxFuture<'static, StorageResult<Option<ReviewEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.update_review(id, changes).await.map_err(Into::into) })
    }

    fn delete_review(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<ReviewEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.delete_review(id).await.map_err(Into::into) })
    }

    fn delete_reviews_by_game(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .delete_reviews_by_game(game_id)
                .await
                .map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let url = format!("{}/{}", store.base_url, store.database);
            let response = store
                .authorize(store.client.get(&url))
                .send()
                .await
                .map_err(|source| CouchDaoError::RequestSend {
                    path: url.clone(),
                    source,
                })?;

            if response.status().is_success() {
                Ok(())
            } else {
                Err(CouchDaoError::RequestStatus {
                    path: url,
                    status: response.status(),
                }
                .into())
            }
        })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_database().await.map_err(Into::into) })
    }
}
