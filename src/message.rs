use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

/// A file attached to every message of a job.
///
/// The bytes are shared, so cloning an attachment into each recipient's
/// message does not copy the file.
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    pub data: Arc<[u8]>,
}

impl Attachment {
    pub fn new(filename: &str, data: Vec<u8>) -> Attachment {
        Attachment {
            filename: filename.to_owned(),
            content_type: "application/octet-stream".to_owned(),
            data: data.into(),
        }
    }

    /// Read an attachment from disk, named after the file's base name
    pub fn from_path<P: AsRef<Path>>(path: P) -> io::Result<Attachment> {
        let path = path.as_ref();
        let data = fs::read(path)?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "attachment".to_owned());
        Ok(Attachment::new(&filename, data))
    }
}

/// A fully formed message for one recipient, handed to a `Transport`
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub subject: String,
    pub html_body: String,
    pub attachments: Vec<Attachment>,
    pub to: String,
    pub from: String,
    pub from_display_name: String,
}
