//! Error types shared by the CouchDB storage implementation.

use reqwest::StatusCode;
use thiserror::Error;

/// Convenient result alias returning [`CouchDaoError`] failures.
pub type CouchResult<T> = Result<T, CouchDaoError>;

/// Failures that can occur while interacting with CouchDB.
#[derive(Debug, Error)]
pub enum CouchDaoError {
    /// Building the HTTP client failed (invalid TLS setup, etc).
    #[error("failed to build CouchDB client")]
    ClientBuilder {
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },
    /// CouchDB rejected a GET against the target database.
    #[error("failed to query CouchDB database `{database}`")]
    DatabaseQuery {
        /// Target database name.
        database: String,
        /// Underlying error.
        #[source]
        source: reqwest::Error,
    },
    /// CouchDB rejected a database creation request.
    #[error("failed to create CouchDB database `{database}`")]
    DatabaseCreate {
        /// Target database name.
        database: String,
        /// Underlying error.
        #[source]
        source: reqwest::Error,
    },
    /// CouchDB returned an unexpected status code for a database operation.
    #[error("unexpected CouchDB database response status {status} for `{database}`")]
    DatabaseStatus {
        /// Target database name.
        database: String,
        /// Status returned by CouchDB.
        status: StatusCode,
    },
    /// A request to a document endpoint could not be sent.
    #[error("failed to send CouchDB request to `{path}`")]
    RequestSend {
        /// Endpoint relative to the database.
        path: String,
        /// Underlying error.
        #[source]
        source: reqwest::Error,
    },
    /// CouchDB returned an unexpected status code for a document endpoint.
    #[error("unexpected CouchDB response status {status} for `{path}`")]
    RequestStatus {
        /// Endpoint relative to the database.
        path: String,
        /// Status returned by CouchDB.
        status: StatusCode,
    },
    /// Response payload could not be parsed into JSON.
    #[error("failed to decode CouchDB response for `{path}`")]
    DecodeResponse {
        /// Endpoint relative to the database.
        path: String,
        /// Underlying error.
        #[source]
        source: reqwest::Error,
    },
    /// Decoding a JSON value into the expected model failed.
    #[error("failed to deserialize CouchDB value for `{path}`")]
    DeserializeValue {
        /// Endpoint relative to the database.
        path: String,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
    /// A document identifier did not carry the expected `<kind>::<uuid>` shape.
    #[error("invalid document ID `{doc_id}`: {kind}")]
    InvalidDocId {
        /// Identifier as found in the database.
        doc_id: String,
        /// What was wrong with it.
        kind: &'static str,
    },
    /// CouchDB refused some documents of a `_bulk_docs` request.
    #[error("{failed} of {total} CouchDB bulk writes failed, first on `{doc_id}`: {reason}")]
    BulkWrite {
        /// Number of refused rows.
        failed: usize,
        /// Number of rows in the request.
        total: usize,
        /// First refused document.
        doc_id: String,
        /// CouchDB error code and reason for that document.
        reason: String,
    },
}

impl CouchDaoError {
    /// Whether CouchDB could not be reached at all.
    pub fn is_connectivity(&self) -> bool {
        match self {
            CouchDaoError::ClientBuilder { .. } | CouchDaoError::DatabaseCreate { .. } => true,
            CouchDaoError::DatabaseQuery { source, .. }
            | CouchDaoError::RequestSend { source, .. } => {
                source.is_connect() || source.is_timeout()
            }
            CouchDaoError::DatabaseStatus { status, .. }
            | CouchDaoError::RequestStatus { status, .. } => status.is_server_error(),
            CouchDaoError::DecodeResponse { .. }
            | CouchDaoError::DeserializeValue { .. }
            | CouchDaoError::InvalidDocId { .. }
            | CouchDaoError::BulkWrite { .. } => false,
        }
    }
}
