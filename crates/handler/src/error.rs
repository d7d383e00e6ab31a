use thiserror::Error;

#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("Unsupported content type: {content_type}")]
    UnsupportedContentType { content_type: String },
}
