//! Attachment operations for Confluence API.

use rand::RngExt;
use tracing::{debug, info};

use super::{ConfluenceClient, check_status};
use crate::api::AttachmentUpload;
use crate::error::ConfluenceError;
use crate::types::{Attachment, AttachmentList};

impl ConfluenceClient {
    /// Find attachment by filename on a page, with its latest version.
    pub(crate) fn find_attachment_by_name(
        &self,
        page_id: &str,
        filename: &str,
    ) -> Result<Option<Attachment>, ConfluenceError> {
        let url = format!("{}/content/{}/child/attachment", self.api_url(), page_id);

        debug!("Looking up attachment '{}' on page {}", filename, page_id);

        let response = self
            .agent
            .get(&url)
            .query("filename", filename)
            .query("expand", "version")
            .header("Authorization", &self.auth_header)
            .header("Accept", "application/json")
            .call()?;

        let list: AttachmentList = check_status(response)?.read_json()?;
        Ok(list.results.into_iter().find(|a| a.title == filename))
    }

    /// POST attachment data as multipart form to `url`.
    pub(crate) fn upload(
        &self,
        url: &str,
        upload: &AttachmentUpload<'_>,
    ) -> Result<(), ConfluenceError> {
        info!("Uploading attachment '{}' to {}", upload.filename, url);

        let boundary = format!(
            "----DocsyncFormBoundary{:016x}",
            rand::rng().random::<u64>()
        );
        let body = multipart_body(&boundary, upload);

        let response = self
            .agent
            .post(url)
            .header("Authorization", &self.auth_header)
            .header(
                "Content-Type",
                &format!("multipart/form-data; boundary={boundary}"),
            )
            .header("X-Atlassian-Token", "nocheck")
            .header("Accept", "application/json")
            .send(&body[..])?;

        check_status(response)?;
        Ok(())
    }
}

/// Build multipart form data with `file` and `comment` parts.
fn multipart_body(boundary: &str, upload: &AttachmentUpload<'_>) -> Vec<u8> {
    let mut body = Vec::with_capacity(upload.data.len() + 512);

    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
            upload.filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", upload.content_type).as_bytes());
    body.extend_from_slice(upload.data);
    body.extend_from_slice(b"\r\n");

    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Disposition: form-data; name=\"comment\"\r\n\r\n");
    body.extend_from_slice(upload.comment.as_bytes());
    body.extend_from_slice(b"\r\n");

    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multipart_body_layout() {
        let upload = AttachmentUpload {
            filename: "diagram.png",
            content_type: "image/png",
            data: b"PNG",
            comment: "docsync [vabc]",
        };
        let body = String::from_utf8(multipart_body("XYZ", &upload)).unwrap();
        assert_eq!(
            body,
            concat!(
                "--XYZ\r\n",
                "Content-Disposition: form-data; name=\"file\"; filename=\"diagram.png\"\r\n",
                "Content-Type: image/png\r\n\r\n",
                "PNG\r\n",
                "--XYZ\r\n",
                "Content-Disposition: form-data; name=\"comment\"\r\n\r\n",
                "docsync [vabc]\r\n",
                "--XYZ--\r\n",
            )
        );
    }
}
