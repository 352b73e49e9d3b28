/// Object storage that staged assets are published into.
pub trait AssetStore {
    fn object_exists(&self, bucket: &str, key: &str) -> Result<bool, String>;

    fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<(), String>;
}
