use crate::types::SelectedFile;

/// What the user asked for when they triggered a notes upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadIntent {
    /// The chosen file; `None` when nothing was selected.
    pub file: Option<SelectedFile>,

    /// Client-asserted request for global visibility of the upload.
    ///
    /// The backend alone decides whether to honor it.
    pub admin: bool,
}

impl UploadIntent {
    /// Create an intent for a regular upload.
    pub fn new(file: Option<SelectedFile>) -> Self {
        Self { file, admin: false }
    }

    /// Mark the upload as an admin upload.
    pub fn with_admin(mut self, admin: bool) -> Self {
        self.admin = admin;
        self
    }
}
