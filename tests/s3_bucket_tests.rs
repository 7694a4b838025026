use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use typed_object_store::{
    AppBuilder, AppServices, BlobStore, BlobStoreError, BucketLifecycle, BucketName, S3Config,
    StorageBackend, TypedStoreError, adapters::outbound::storage::create_s3_blob_store,
};

/// State of one bucket on the scripted endpoint
#[derive(Debug, Clone, Copy, PartialEq)]
enum Remote {
    Empty,
    Holding,
    Foreign,
}

#[derive(Debug, Default)]
struct Endpoint {
    buckets: HashMap<String, Remote>,
    /// `METHOD /bucket` of every request served
    requests: Vec<String>,
    /// Raw request targets, query included
    targets: Vec<String>,
    /// Answer listings of missing buckets without an error document
    bare_list_errors: bool,
}

impl Endpoint {
    fn respond(&mut self, method: &str, target: &str) -> (&'static str, String) {
        let path = target.split('?').next().unwrap_or(target);
        let bucket = path.trim_matches('/').split('/').next().unwrap_or_default().to_string();
        self.requests.push(format!("{method} /{bucket}"));
        self.targets.push(target.to_string());

        match (method, self.buckets.get(&bucket).copied()) {
            ("HEAD", Some(_)) => ("200 OK", String::new()),
            ("HEAD", None) => ("404 Not Found", String::new()),
            ("PUT", Some(Remote::Foreign)) => ("409 Conflict", error_body("BucketAlreadyExists", &bucket)),
            ("PUT", Some(_)) => ("409 Conflict", error_body("BucketAlreadyOwnedByYou", &bucket)),
            ("PUT", None) => {
                self.buckets.insert(bucket, Remote::Empty);
                ("200 OK", String::new())
            }
            ("DELETE", None) => ("404 Not Found", error_body("NoSuchBucket", &bucket)),
            ("DELETE", Some(Remote::Holding)) => ("409 Conflict", error_body("BucketNotEmpty", &bucket)),
            ("DELETE", Some(Remote::Foreign)) => ("403 Forbidden", error_body("AccessDenied", &bucket)),
            ("DELETE", Some(Remote::Empty)) => {
                self.buckets.remove(&bucket);
                ("204 No Content", String::new())
            }
            ("GET", None) if self.bare_list_errors => ("404 Not Found", String::new()),
            ("GET", None) => ("404 Not Found", error_body("NoSuchBucket", &bucket)),
            ("GET", Some(Remote::Empty)) => ("200 OK", empty_listing(&bucket)),
            _ => ("501 Not Implemented", String::new()),
        }
    }
}

fn error_body(code: &str, bucket: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><Error><Code>{code}</Code><Message>{code}</Message><BucketName>{bucket}</BucketName><RequestId>req-1</RequestId></Error>"#
    )
}

fn empty_listing(bucket: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><ListBucketResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/"><Name>{bucket}</Name><Prefix></Prefix><KeyCount>0</KeyCount><MaxKeys>1000</MaxKeys><IsTruncated>false</IsTruncated></ListBucketResult>"#
    )
}

/// Minimal S3 endpoint on a local port, one request per connection
struct ScriptedS3 {
    endpoint: Arc<Mutex<Endpoint>>,
    url: String,
}

impl ScriptedS3 {
    async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let endpoint = Arc::new(Mutex::new(Endpoint::default()));

        let shared = endpoint.clone();
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                tokio::spawn(serve(socket, shared.clone()));
            }
        });

        Self { endpoint, url }
    }

    fn with_bucket(self, name: &str, state: Remote) -> Self {
        self.endpoint.lock().unwrap().buckets.insert(name.to_string(), state);
        self
    }

    fn with_bare_list_errors(self) -> Self {
        self.endpoint.lock().unwrap().bare_list_errors = true;
        self
    }

    fn config(&self) -> S3Config {
        s3_config(&self.url)
    }

    fn requests(&self) -> Vec<String> {
        self.endpoint.lock().unwrap().requests.clone()
    }

    fn targets(&self) -> Vec<String> {
        self.endpoint.lock().unwrap().targets.clone()
    }

    fn bucket(&self, name: &str) -> Option<Remote> {
        self.endpoint.lock().unwrap().buckets.get(name).copied()
    }

    async fn app(&self, bucket: &str) -> AppServices {
        s3_app(self.config(), bucket).await
    }
}

async fn serve(mut socket: TcpStream, endpoint: Arc<Mutex<Endpoint>>) {
    let mut request = Vec::new();
    let mut chunk = [0u8; 4096];
    let head_len = loop {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => request.extend_from_slice(&chunk[..n]),
        }
        if let Some(pos) = request.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&request[..head_len]).into_owned();
    let body_len = head
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            if name.eq_ignore_ascii_case("content-length") {
                value.trim().parse::<usize>().ok()
            } else {
                None
            }
        })
        .unwrap_or(0);
    while request.len() < head_len + body_len {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => request.extend_from_slice(&chunk[..n]),
        }
    }

    let mut request_line = head.split_whitespace();
    let method = request_line.next().unwrap_or_default().to_string();
    let target = request_line.next().unwrap_or_default().to_string();
    let (status, body) = endpoint.lock().unwrap().respond(&method, &target);

    let head = format!(
        "HTTP/1.1 {status}\r\ncontent-type: application/xml\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
        body.len()
    );
    let _ = socket.write_all(head.as_bytes()).await;
    if method != "HEAD" {
        let _ = socket.write_all(body.as_bytes()).await;
    }
    let _ = socket.shutdown().await;
}

fn s3_config(url: &str) -> S3Config {
    S3Config {
        endpoint: Some(url.to_string()),
        access_key: Some("test-access-key".to_string()),
        secret_key: Some("test-secret-key".to_string()),
        allow_http: true,
        ..S3Config::default()
    }
}

async fn s3_app(config: S3Config, bucket: &str) -> AppServices {
    AppBuilder::new()
        .with_storage_backend(StorageBackend::S3(config))
        .with_bucket(bucket)
        .with_caller_tag("s3-test")
        .build()
        .await
        .unwrap()
}

#[tokio::test]
async fn create_bucket_sends_signed_put() {
    let s3 = ScriptedS3::start().await;
    let app = s3.app("fresh-bucket").await;

    app.bucket_lifecycle.create_bucket("fresh-bucket").await.unwrap();

    assert_eq!(s3.bucket("fresh-bucket"), Some(Remote::Empty));
    assert_eq!(s3.requests(), ["PUT /fresh-bucket"]);
    assert!(s3.targets()[0].contains("X-Amz-Signature="), "{:?}", s3.targets());
}

#[tokio::test]
async fn create_bucket_already_owned_is_success() {
    let s3 = ScriptedS3::start().await.with_bucket("mine-bucket", Remote::Holding);
    let app = s3.app("mine-bucket").await;

    app.bucket_lifecycle.create_bucket("mine-bucket").await.unwrap();
    assert_eq!(s3.bucket("mine-bucket"), Some(Remote::Holding));
}

#[tokio::test]
async fn create_bucket_owned_elsewhere_is_create_error() {
    let s3 = ScriptedS3::start().await.with_bucket("their-bucket", Remote::Foreign);
    let app = s3.app("their-bucket").await;

    let err = app
        .bucket_lifecycle
        .create_bucket("their-bucket")
        .await
        .unwrap_err();
    assert!(matches!(err, TypedStoreError::Create { .. }), "{err:?}");
}

#[tokio::test]
async fn bucket_errors_keep_their_s3_codes() {
    let s3 = ScriptedS3::start()
        .await
        .with_bucket("their-bucket", Remote::Foreign)
        .with_bucket("full-bucket", Remote::Holding);
    let blobs = create_s3_blob_store(s3.config()).unwrap();

    let name = |n: &str| BucketName::new(n).unwrap();
    assert!(matches!(
        blobs.create_bucket(&name("their-bucket")).await,
        Err(BlobStoreError::BucketAlreadyExists { .. })
    ));
    assert!(matches!(
        blobs.delete_bucket(&name("full-bucket")).await,
        Err(BlobStoreError::BucketNotEmpty { .. })
    ));
    assert!(blobs
        .delete_bucket(&name("gone-bucket"))
        .await
        .unwrap_err()
        .is_no_such_bucket());
}

#[tokio::test]
async fn delete_missing_bucket_succeeds() {
    let s3 = ScriptedS3::start().await;
    let app = s3.app("gone-bucket").await;

    app.bucket_lifecycle.delete_bucket("gone-bucket").await.unwrap();
    assert_eq!(s3.requests(), ["DELETE /gone-bucket"]);
}

#[tokio::test]
async fn delete_non_empty_bucket_is_not_empty() {
    let s3 = ScriptedS3::start().await.with_bucket("full-bucket", Remote::Holding);
    let app = s3.app("full-bucket").await;

    let err = app
        .bucket_lifecycle
        .delete_bucket("full-bucket")
        .await
        .unwrap_err();
    assert!(matches!(err, TypedStoreError::NotEmpty { .. }), "{err:?}");
    assert_eq!(s3.bucket("full-bucket"), Some(Remote::Holding));
}

#[tokio::test]
async fn purge_of_missing_bucket_is_a_no_op() {
    let s3 = ScriptedS3::start().await;
    let app = s3.app("ghost-bucket").await;

    app.bucket_lifecycle.purge_bucket("ghost-bucket").await.unwrap();
    app.bucket_lifecycle.purge_bucket("ghost-bucket").await.unwrap();

    // one listing per purge, no object or bucket deletes
    assert_eq!(s3.requests(), ["GET /ghost-bucket", "GET /ghost-bucket"]);
}

#[tokio::test]
async fn purge_of_missing_bucket_without_error_code() {
    let s3 = ScriptedS3::start().await.with_bare_list_errors();
    let app = s3.app("ghost-bucket").await;

    app.bucket_lifecycle.purge_bucket("ghost-bucket").await.unwrap();
    assert_eq!(s3.requests(), ["GET /ghost-bucket", "HEAD /ghost-bucket"]);
}

#[tokio::test]
async fn purge_of_empty_bucket_deletes_it() {
    let s3 = ScriptedS3::start().await.with_bucket("empty-bucket", Remote::Empty);
    let app = s3.app("empty-bucket").await;

    app.bucket_lifecycle.purge_bucket("empty-bucket").await.unwrap();

    assert_eq!(s3.bucket("empty-bucket"), None);
    assert_eq!(s3.requests(), ["GET /empty-bucket", "DELETE /empty-bucket"]);
}

#[tokio::test]
async fn listing_a_missing_bucket_is_a_list_error() {
    let s3 = ScriptedS3::start().await;
    let app = s3.app("ghost-bucket").await;

    let err = app.typed_store.list_keys("ns/").await.unwrap_err();
    assert!(matches!(err, TypedStoreError::List { .. }), "{err:?}");
}

#[tokio::test]
async fn bucket_calls_fail_against_a_dead_endpoint() {
    // nothing listens on port 1
    let app = s3_app(s3_config("http://127.0.0.1:1"), "never-created").await;

    let err = app
        .bucket_lifecycle
        .create_bucket("never-created")
        .await
        .unwrap_err();
    assert!(matches!(err, TypedStoreError::Create { .. }), "{err:?}");

    let err = app
        .bucket_lifecycle
        .delete_bucket("never-created")
        .await
        .unwrap_err();
    assert!(matches!(err, TypedStoreError::Transport { .. }), "{err:?}");
}
