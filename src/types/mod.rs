// Public modules
pub mod endpoint;
pub mod form_request;
pub mod message;
pub mod responses;
pub mod selected_file;
pub mod sender;
pub mod session_id;
pub mod upload_intent;

// Re-exports
pub use endpoint::Endpoint;
pub use form_request::{FormRequest, FormValue};
pub use message::Message;
pub use responses::{AskResponse, SpeechResponse, TranscriptionResponse, UploadResponse};
pub use selected_file::SelectedFile;
pub use sender::Sender;
pub use session_id::SessionId;
pub use upload_intent::UploadIntent;
