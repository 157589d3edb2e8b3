//! Upload-notification payloads.
//!
//! The hosting event source delivers a JSON document with a list of records,
//! each naming the bucket and the object key of one uploaded file. Only the
//! first record drives an ingestion run. Object keys arrive form-encoded:
//! `+` stands for a space and the remainder is percent-encoded.

use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};

use crate::types::FerryError;

/// One upload notification as delivered by the hosting event source.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UploadEvent {
    #[serde(rename = "Records")]
    pub records: Vec<UploadRecord>,
}

/// A single record inside an [`UploadEvent`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UploadRecord {
    pub s3: StorageEntity,
}

/// Bucket and object coordinates of one uploaded file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageEntity {
    pub bucket: BucketRef,
    pub object: ObjectRef,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BucketRef {
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ObjectRef {
    pub key: String,
}

impl UploadEvent {
    /// Parses an event from its JSON wire form.
    pub fn from_json(payload: &str) -> Result<Self, FerryError> {
        serde_json::from_str(payload).map_err(|err| FerryError::Config(err.to_string()))
    }

    /// First record of the notification; events without records are rejected.
    pub fn first_record(&self) -> Result<&UploadRecord, FerryError> {
        self.records
            .first()
            .ok_or_else(|| FerryError::Config("upload event carries no records".to_string()))
    }
}

impl UploadRecord {
    /// Name of the bucket that received the upload.
    pub fn bucket(&self) -> &str {
        &self.s3.bucket.name
    }

    /// Object key with the wire encoding removed.
    pub fn decoded_key(&self) -> Result<String, FerryError> {
        let spaced = self.s3.object.key.replace('+', " ");
        percent_decode_str(&spaced)
            .decode_utf8()
            .map(|decoded| decoded.into_owned())
            .map_err(|err| FerryError::Config(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_event() -> &'static str {
        r#"{"Records":[{"s3":{"bucket":{"name":"docs-bucket"},"object":{"key":"reports/My+Report%281%29.pdf"}}}]}"#
    }

    #[test]
    fn parses_notification_payload() {
        let event = UploadEvent::from_json(sample_event()).unwrap();
        let record = event.first_record().unwrap();
        assert_eq!(record.bucket(), "docs-bucket");
    }

    #[test]
    fn decodes_plus_and_percent_escapes() {
        let event = UploadEvent::from_json(sample_event()).unwrap();
        let key = event.first_record().unwrap().decoded_key().unwrap();
        assert_eq!(key, "reports/My Report(1).pdf");
    }

    #[test]
    fn plain_keys_pass_through_unchanged() {
        let event = UploadEvent::from_json(
            r#"{"Records":[{"s3":{"bucket":{"name":"b"},"object":{"key":"report.pdf"}}}]}"#,
        )
        .unwrap();
        let key = event.first_record().unwrap().decoded_key().unwrap();
        assert_eq!(key, "report.pdf");
    }

    #[test]
    fn empty_record_list_is_rejected() {
        let event = UploadEvent::from_json(r#"{"Records":[]}"#).unwrap();
        let err = event.first_record().unwrap_err();
        assert!(matches!(err, FerryError::Config(_)));
    }

    #[test]
    fn malformed_payload_is_a_config_error() {
        let err = UploadEvent::from_json("not json").unwrap_err();
        assert!(matches!(err, FerryError::Config(_)));
    }
}
