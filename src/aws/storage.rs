//! Object uploads to S3
//!
//! Buckets may live outside the session's region, so every upload looks up
//! the bucket's region, rebinds a store to it and only then writes. The
//! region is never cached and the original store is never modified.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use aws_sdk_s3::Client;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::{Deserialize, Serialize};

use crate::aws::session::Session;
use crate::aws::types::UploadResult;
use crate::error::{Error, Result};
use crate::payload::{decode_base64, ImageType};

/// Region S3 reports as an empty location constraint
const US_EAST_1: &str = "us-east-1";

/// Access policy applied to uploaded objects
///
/// `PublicRead` is the default: every uploaded object is readable by anyone
/// who knows its URL. Pick `Private` or `BucketDefault` unless the images are
/// meant to be public. `BucketDefault` sends no ACL at all, which buckets with
/// ACLs disabled (Object Ownership "bucket owner enforced") require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UploadAcl {
    #[default]
    PublicRead,
    Private,
    BucketDefault,
}

impl UploadAcl {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadAcl::PublicRead => "public-read",
            UploadAcl::Private => "private",
            UploadAcl::BucketDefault => "bucket-default",
        }
    }

    fn canned_acl(self) -> Option<ObjectCannedAcl> {
        match self {
            UploadAcl::PublicRead => Some(ObjectCannedAcl::PublicRead),
            UploadAcl::Private => Some(ObjectCannedAcl::Private),
            UploadAcl::BucketDefault => None,
        }
    }
}

impl fmt::Display for UploadAcl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UploadAcl {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "public-read" => Ok(UploadAcl::PublicRead),
            "private" => Ok(UploadAcl::Private),
            "bucket-default" => Ok(UploadAcl::BucketDefault),
            other => Err(format!(
                "unknown ACL '{}', expected public-read, private or bucket-default",
                other
            )),
        }
    }
}

/// Options applied to every upload of an [`Uploader`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadOptions {
    pub acl: UploadAcl,
}

impl UploadOptions {
    pub fn with_acl(mut self, acl: UploadAcl) -> Self {
        self.acl = acl;
        self
    }
}

/// A single object write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutObject {
    pub bucket: String,
    pub key: String,
    pub body: Vec<u8>,
    pub content_type: Option<String>,
    pub acl: UploadAcl,
}

/// An object store bound to one region
#[async_trait]
pub trait ObjectStore: Send + Sync + Sized {
    /// Region this store sends requests to
    fn region(&self) -> &str;

    /// Region the bucket actually lives in
    async fn bucket_region(&self, bucket: &str) -> Result<String>;

    /// A new store for `region`; `self` stays bound to its own region
    fn rebind(&self, region: &str) -> Result<Self>;

    async fn put_object(&self, object: PutObject) -> Result<()>;
}

/// [`ObjectStore`] backed by Amazon S3
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: Client,
    session: Session,
}

impl S3ObjectStore {
    pub fn new(session: &Session) -> Self {
        let config = aws_sdk_s3::config::Builder::from(session.sdk_config())
            .force_path_style(session.force_path_style())
            .build();

        Self {
            client: Client::from_conf(config),
            session: session.clone(),
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    fn region(&self) -> &str {
        self.session.region()
    }

    async fn bucket_region(&self, bucket: &str) -> Result<String> {
        let response = self
            .client
            .get_bucket_location()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| Error::remote(format!("failed to get location of bucket '{}'", bucket), e))?;

        Ok(normalize_location(
            response.location_constraint().map(|c| c.as_str()),
        ))
    }

    fn rebind(&self, region: &str) -> Result<Self> {
        Ok(Self::new(&self.session.with_region(region)?))
    }

    async fn put_object(&self, object: PutObject) -> Result<()> {
        self.client
            .put_object()
            .bucket(&object.bucket)
            .key(&object.key)
            .body(ByteStream::from(object.body))
            .set_content_type(object.content_type)
            .set_acl(object.acl.canned_acl())
            .send()
            .await
            .map_err(|e| {
                Error::remote(
                    format!("failed to upload '{}' to bucket '{}'", object.key, object.bucket),
                    e,
                )
            })?;

        Ok(())
    }
}

/// Map a `GetBucketLocation` constraint to a region name
fn normalize_location(constraint: Option<&str>) -> String {
    match constraint {
        None | Some("") => US_EAST_1.to_string(),
        // Legacy constraint of buckets created in Ireland before regions had names
        Some("EU") => "eu-west-1".to_string(),
        Some(region) => region.to_string(),
    }
}

/// Bytes escaped inside one key segment (the `url` crate's path segment set)
const KEY_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Build `https://{bucket}.s3.{region}.amazonaws.com/{key}`, escaping key segments.
///
/// Segments are kept verbatim: empty segments stay, and `.`/`..` are escaped
/// so that no client resolves them away.
pub fn object_url(bucket: &str, region: &str, key: &str) -> Result<String> {
    let valid_bucket = !bucket.is_empty()
        && bucket
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_');
    if !valid_bucket {
        return Err(Error::validation(format!(
            "bucket '{}' cannot form a URL",
            bucket
        )));
    }

    let path = key
        .split('/')
        .map(|segment| match segment {
            "." => "%2E".to_string(),
            ".." => "%2E%2E".to_string(),
            _ => utf8_percent_encode(segment, KEY_SEGMENT).to_string(),
        })
        .collect::<Vec<_>>()
        .join("/");

    Ok(format!("https://{}.s3.{}.amazonaws.com/{}", bucket, region, path))
}

fn validate_target(bucket: &str, key: &str) -> Result<()> {
    if bucket.is_empty() {
        return Err(Error::validation("bucket name must not be empty"));
    }
    if key.is_empty() {
        return Err(Error::validation("object key must not be empty"));
    }
    Ok(())
}

/// Uploads images to a bucket in whatever region the bucket lives in
#[derive(Debug, Clone)]
pub struct Uploader<S = S3ObjectStore> {
    store: S,
    options: UploadOptions,
}

impl<S: ObjectStore> Uploader<S> {
    pub fn new(store: S, options: UploadOptions) -> Self {
        Self { store, options }
    }

    pub fn options(&self) -> &UploadOptions {
        &self.options
    }

    /// Decode a base64 image and upload it as `bucket/key`.
    ///
    /// Malformed base64 fails before any request is sent.
    pub async fn upload(&self, base64_image: &str, bucket: &str, key: &str) -> Result<UploadResult> {
        let body = decode_base64(base64_image)?;
        self.upload_bytes(body, bucket, key).await
    }

    /// Upload raw image bytes as `bucket/key`
    pub async fn upload_bytes(&self, body: Vec<u8>, bucket: &str, key: &str) -> Result<UploadResult> {
        validate_target(bucket, key)?;

        let region = self.store.bucket_region(bucket).await?;
        let url = object_url(bucket, &region, key)?;
        let store = self.store.rebind(&region)?;

        tracing::debug!(
            "Uploading {} bytes to {}/{} (bucket region {}, session region {})",
            body.len(),
            bucket,
            key,
            region,
            self.store.region()
        );
        if self.options.acl == UploadAcl::PublicRead {
            tracing::warn!("Uploading {}/{} with a public-read ACL", bucket, key);
        }

        let content_type = ImageType::sniff(&body).map(|t| t.mime_type().to_string());
        store
            .put_object(PutObject {
                bucket: bucket.to_string(),
                key: key.to_string(),
                body,
                content_type,
                acl: self.options.acl,
            })
            .await?;

        Ok(UploadResult { url })
    }
}
