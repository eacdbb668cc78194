use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ServerSideEncryption;
use chrono::{DateTime, Utc};

use super::object_store::{ObjectStore, ObjectSummary, PutObjectRequest, StoreError};

#[derive(Clone)]
pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
}

impl S3ObjectStore {
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }
}

impl ObjectStore for S3ObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|error| {
                if error
                    .as_service_error()
                    .is_some_and(|service_error| service_error.is_no_such_key())
                {
                    StoreError::NotFound {
                        bucket: bucket.to_string(),
                        key: key.to_string(),
                    }
                } else {
                    StoreError::Io(format!(
                        "failed to read s3://{bucket}/{key}: {}",
                        DisplayErrorContext(&error)
                    ))
                }
            })?;

        let body = output.body.collect().await.map_err(|error| {
            StoreError::Io(format!("failed to stream s3://{bucket}/{key}: {error}"))
        })?;
        Ok(body.into_bytes().to_vec())
    }

    async fn put_object(&self, request: PutObjectRequest<'_>) -> Result<(), StoreError> {
        let mut builder = self
            .client
            .put_object()
            .bucket(request.bucket)
            .key(request.key)
            .content_type(request.content_type)
            .set_cache_control(request.cache_control.map(str::to_string))
            .body(ByteStream::from(request.body.to_vec()));
        if request.server_side_encryption {
            builder = builder.server_side_encryption(ServerSideEncryption::Aes256);
        }
        if let Some(sha256) = request.sha256 {
            builder = builder.metadata("sha256", sha256);
        }

        builder.send().await.map(|_| ()).map_err(|error| {
            StoreError::Io(format!(
                "failed to write s3://{}/{}: {}",
                request.bucket,
                request.key,
                DisplayErrorContext(&error)
            ))
        })
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
    ) -> Result<Vec<ObjectSummary>, StoreError> {
        let mut objects = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let output = self
                .client
                .list_objects_v2()
                .bucket(bucket)
                .prefix(prefix)
                .set_continuation_token(continuation_token.take())
                .send()
                .await
                .map_err(|error| {
                    StoreError::Io(format!(
                        "failed to list s3://{bucket}/{prefix}: {}",
                        DisplayErrorContext(&error)
                    ))
                })?;

            for object in output.contents() {
                let Some(key) = object.key() else {
                    continue;
                };
                objects.push(ObjectSummary {
                    key: key.to_string(),
                    last_modified: object.last_modified().and_then(|modified| {
                        DateTime::<Utc>::from_timestamp(modified.secs(), modified.subsec_nanos())
                    }),
                    size: object
                        .size()
                        .and_then(|size| u64::try_from(size).ok())
                        .unwrap_or(0),
                });
            }

            match output.next_continuation_token() {
                Some(token) if output.is_truncated().unwrap_or(false) => {
                    continuation_token = Some(token.to_string());
                }
                _ => break,
            }
        }

        Ok(objects)
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StoreError> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map(|_| ())
            .map_err(|error| {
                StoreError::Io(format!(
                    "failed to delete s3://{bucket}/{key}: {}",
                    DisplayErrorContext(&error)
                ))
            })
    }
}
