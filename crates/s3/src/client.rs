//! S3 page source implementation
//!
//! Wraps aws-sdk-s3 and implements the PageSource trait from sw-core.
//! One trait call maps to one ListObjectsV2 request, so the walker's retry
//! wrapper operates at page granularity.

use async_trait::async_trait;

use sw_core::error::{Error, Result};
use sw_core::traits::{ListOptions, ObjectPage, ObjectRecord, PageSource, PrefixPage};

/// Connection settings for the S3 client
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    /// Endpoint URL override for S3-compatible backends
    pub endpoint_url: Option<String>,

    /// Region name; falls back to the SDK's default region chain
    pub region: Option<String>,

    /// Use path-style addressing (required by most non-AWS backends)
    pub force_path_style: bool,

    /// Static access key; when absent the default credential chain is used
    pub access_key: Option<String>,

    /// Static secret key
    pub secret_key: Option<String>,

    /// Intended bound on simultaneous connections, matched to the walker's
    /// parallelism. The SDK's shared HTTP client pools per host without a
    /// hard cap, so the worker count is the effective bound on in-flight
    /// requests; this field documents the intent for client construction.
    pub max_connections: usize,
}

/// S3 client wrapper
pub struct S3Client {
    inner: aws_sdk_s3::Client,
}

impl S3Client {
    /// Create a new S3 client from connection settings
    ///
    /// Failure here is fatal to a traversal: without a client no prefix can
    /// be listed.
    pub async fn connect(config: ClientConfig) -> Result<Self> {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());

        if let (Some(access_key), Some(secret_key)) = (&config.access_key, &config.secret_key) {
            let credentials = aws_credential_types::Credentials::new(
                access_key.clone(),
                secret_key.clone(),
                None, // session token
                None, // expiry
                "s3walk-static-credentials",
            );
            loader = loader.credentials_provider(credentials);
        }

        if let Some(region) = config.region.clone() {
            loader = loader.region(aws_config::Region::new(region));
        }

        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;

        if sdk_config.region().is_none() {
            return Err(Error::Client(
                "no region configured; set one in the config file or AWS environment".into(),
            ));
        }

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.force_path_style)
            .build();

        Ok(Self {
            inner: aws_sdk_s3::Client::from_conf(s3_config),
        })
    }

    /// Get the underlying aws-sdk-s3 client
    pub fn inner(&self) -> &aws_sdk_s3::Client {
        &self.inner
    }

    fn list_request(
        &self,
        bucket: &str,
        prefix: &str,
        options: &ListOptions,
    ) -> aws_sdk_s3::operation::list_objects_v2::builders::ListObjectsV2FluentBuilder {
        tracing::debug!(
            bucket,
            prefix,
            delimiter = ?options.delimiter,
            token = ?options.continuation_token,
            "sending ListObjectsV2 request"
        );
        let mut request = self.inner.list_objects_v2().bucket(bucket);

        if !prefix.is_empty() {
            request = request.prefix(prefix);
        }

        if let Some(delimiter) = &options.delimiter {
            request = request.delimiter(delimiter);
        }

        if let Some(max) = options.max_keys {
            request = request.max_keys(max);
        }

        if let Some(token) = &options.continuation_token {
            request = request.continuation_token(token);
        }

        request
    }
}

#[async_trait]
impl PageSource for S3Client {
    async fn list_prefixes(
        &self,
        bucket: &str,
        prefix: &str,
        options: ListOptions,
    ) -> Result<PrefixPage> {
        // Grouping requires a delimiter.
        let options = ListOptions {
            delimiter: options.delimiter.or_else(|| Some("/".into())),
            ..options
        };

        let response = self
            .list_request(bucket, prefix, &options)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let prefixes = response
            .common_prefixes()
            .iter()
            .filter_map(|p| p.prefix().map(str::to_string))
            .collect();

        Ok(PrefixPage {
            prefixes,
            next_token: response.next_continuation_token().map(str::to_string),
        })
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        options: ListOptions,
    ) -> Result<ObjectPage> {
        let response = self
            .list_request(bucket, prefix, &options)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let objects = response.contents().iter().map(record_from).collect();

        Ok(ObjectPage {
            objects,
            next_token: response.next_continuation_token().map(str::to_string),
        })
    }
}

/// Convert one SDK listing entry into an ObjectRecord
fn record_from(object: &aws_sdk_s3::types::Object) -> ObjectRecord {
    let mut record = ObjectRecord::new(
        object.key().unwrap_or_default(),
        object.size().unwrap_or(0),
    );

    if let Some(modified) = object.last_modified() {
        record.last_modified = timestamp_from(modified);
    }

    if let Some(etag) = object.e_tag() {
        record.etag = Some(etag.trim_matches('"').to_string());
    }

    record
}

fn timestamp_from(datetime: &aws_smithy_types::DateTime) -> Option<jiff::Timestamp> {
    jiff::Timestamp::from_second(datetime.secs()).ok()
}
