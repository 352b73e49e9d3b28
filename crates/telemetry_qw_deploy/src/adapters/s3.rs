use aws_sdk_s3::primitives::ByteStream;

use crate::adapters::asset_store::AssetStore;

/// [`AssetStore`] backed by S3. Must be used from a multi-threaded tokio runtime.
pub struct S3AssetStore {
    s3_client: aws_sdk_s3::Client,
}

impl S3AssetStore {
    pub fn new(s3_client: aws_sdk_s3::Client) -> Self {
        Self { s3_client }
    }
}

impl AssetStore for S3AssetStore {
    fn object_exists(&self, bucket: &str, key: &str) -> Result<bool, String> {
        let bucket = bucket.to_string();
        let object_key = key.to_string();
        let client = self.s3_client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                match client
                    .head_object()
                    .bucket(bucket)
                    .key(object_key)
                    .send()
                    .await
                {
                    Ok(_) => Ok(true),
                    Err(error)
                        if error
                            .as_service_error()
                            .map(|service_error| service_error.is_not_found())
                            .unwrap_or(false) =>
                    {
                        Ok(false)
                    }
                    Err(error) => Err(format!("failed to inspect object in s3: {error}")),
                }
            })
        })
    }

    fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<(), String> {
        let bucket = bucket.to_string();
        let object_key = key.to_string();
        let client = self.s3_client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .put_object()
                    .bucket(bucket)
                    .key(object_key)
                    .body(ByteStream::from(body))
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|error| format!("failed to write object to s3: {error}"))
            })
        })
    }
}
