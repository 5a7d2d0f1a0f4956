pub mod backend_client;

pub use backend_client::{
    BackendClient, BackendRequest, BackendResponse, MultipartField, RequestBody, MIME_DOCX,
    MIME_JSON,
};
