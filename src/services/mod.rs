/// OpenAPI documentation generation.
pub mod documentation;
/// Game CRUD and cascading deletion.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Review CRUD and game resolution.
pub mod review_service;
/// Background task keeping a storage backend installed.
pub mod storage_supervisor;
