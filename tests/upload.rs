//! Upload adapter integration tests

use drive_storage::transfer::abort_channel;
use drive_storage::{
    AbortSignal, ErrorKind, Principal, StorageConfig, StorageEngine, StorageError, UploadAdapter,
    UploadDescriptor, UploadError,
};
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt, ReadBuf};
use tokio::time::{sleep, timeout};

async fn setup() -> (TempDir, Arc<StorageEngine>, UploadAdapter, Principal) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let engine = Arc::new(StorageEngine::new(StorageConfig::new(temp_dir.path())));
    let adapter = UploadAdapter::new(Arc::clone(&engine));
    let principal = Principal::new("alice").unwrap();
    engine.init_root(&principal).await.expect("init root");
    (temp_dir, engine, adapter, principal)
}

fn descriptor() -> UploadDescriptor {
    UploadDescriptor {
        mime_type: "text/markdown".into(),
        original_name: "../../notes.md".into(),
        encoding: "7bit".into(),
    }
}

#[tokio::test]
async fn stores_upload_under_generated_name() {
    let (_temp_dir, engine, adapter, alice) = setup().await;
    assert!(!engine.exists(&alice, "uploads").await.unwrap());

    let uploaded = adapter
        .handle_file(&alice, descriptor(), &b"# hello"[..], AbortSignal::never())
        .await
        .unwrap();

    assert_eq!(uploaded.size, 7);
    assert_eq!(uploaded.path, format!("uploads/{}", uploaded.filename));
    assert_ne!(uploaded.filename, "notes.md");
    // Declared fields are passed through unverified
    assert_eq!(uploaded.mime_type, "text/markdown");
    assert_eq!(uploaded.original_name, "../../notes.md");
    assert_eq!(uploaded.encoding, "7bit");

    let stat = engine.stat(&alice, &uploaded.path).await.unwrap();
    assert_eq!(stat.size, 7);
    assert_eq!(stat.modify_time, uploaded.modify_time);

    let mut content = String::new();
    engine
        .read_file(&alice, &uploaded.path)
        .await
        .unwrap()
        .read_to_string(&mut content)
        .await
        .unwrap();
    assert_eq!(content, "# hello");
}

#[tokio::test]
async fn uploads_never_collide() {
    let (_temp_dir, engine, adapter, alice) = setup().await;

    let first = adapter
        .handle_file(&alice, descriptor(), &b"one"[..], AbortSignal::never())
        .await
        .unwrap();
    let second = adapter
        .handle_file(&alice, descriptor(), &b"two"[..], AbortSignal::never())
        .await
        .unwrap();

    assert_ne!(first.path, second.path);
    assert_eq!(engine.list(&alice, "uploads").await.unwrap().len(), 2);
}

#[tokio::test]
async fn custom_upload_path_is_created_recursively() {
    let (_temp_dir, engine, _adapter, alice) = setup().await;
    let adapter = UploadAdapter::with_upload_path(Arc::clone(&engine), "incoming/2026/");
    assert_eq!(adapter.upload_path(), "incoming/2026/");

    let uploaded = adapter
        .handle_file(&alice, descriptor(), &b"x"[..], AbortSignal::never())
        .await
        .unwrap();
    assert!(uploaded.path.starts_with("incoming/2026/"));
    assert!(engine.exists(&alice, &uploaded.path).await.unwrap());
}

#[tokio::test]
async fn abort_before_transfer_leaves_nothing_behind() {
    let (_temp_dir, engine, adapter, alice) = setup().await;
    let (handle, signal) = abort_channel();
    handle.abort();

    let err = adapter
        .handle_file(&alice, descriptor(), &b"never stored"[..], signal)
        .await
        .unwrap_err();

    assert!(matches!(err, UploadError::Aborted(_)));
    assert!(engine.list(&alice, "uploads").await.unwrap().is_empty());
}

#[tokio::test]
async fn abort_mid_transfer_removes_partial_file() {
    let (_temp_dir, engine, adapter, alice) = setup().await;
    let (handle, signal) = abort_channel();
    let (mut client, server) = tokio::io::duplex(1024);

    let upload = adapter.handle_file(&alice, descriptor(), server, signal);

    let driver = async {
        client.write_all(b"first chunk of a long upload").await.unwrap();

        // Wait until the destination file exists, then cancel while the
        // client side is still open.
        timeout(Duration::from_secs(5), async {
            while engine.list(&alice, "uploads").await.map_or(true, |l| l.is_empty()) {
                sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("upload never started");

        handle.abort();
        client
    };

    let (result, _client) = tokio::join!(upload, driver);

    match result {
        Err(UploadError::Aborted(path)) => assert!(path.starts_with("uploads/")),
        other => panic!("expected an aborted upload, got {other:?}"),
    }
    assert!(engine.list(&alice, "uploads").await.unwrap().is_empty());
}

#[tokio::test]
async fn stream_failure_removes_partial_file() {
    let (_temp_dir, engine, adapter, alice) = setup().await;

    // Some bytes land on disk before the client connection drops
    let stream = (&b"partial"[..]).chain(ResetStream);
    let err = adapter
        .handle_file(&alice, descriptor(), stream, AbortSignal::never())
        .await
        .unwrap_err();

    match err {
        UploadError::Storage(e) => assert_eq!(e.kind(), ErrorKind::IoFailure),
        other => panic!("expected a storage error, got {other:?}"),
    }
    assert!(engine.list(&alice, "uploads").await.unwrap().is_empty());
}

#[tokio::test]
async fn write_failure_aborts_upload() {
    let (_temp_dir, engine, adapter, alice) = setup().await;
    // A plain file occupies the upload directory's name
    engine.write_file(&alice, "uploads", &b"in the way"[..]).await.unwrap();

    let err = adapter
        .handle_file(&alice, descriptor(), &b"data"[..], AbortSignal::never())
        .await
        .unwrap_err();

    match err {
        UploadError::Storage(e) => assert_eq!(e.kind(), ErrorKind::NotADirectory),
        other => panic!("expected a storage error, got {other:?}"),
    }
}

#[tokio::test]
async fn remove_file_is_non_recursive_delete() {
    let (_temp_dir, engine, adapter, alice) = setup().await;
    let uploaded = adapter
        .handle_file(&alice, descriptor(), &b"bye"[..], AbortSignal::never())
        .await
        .unwrap();

    let removed = adapter.remove_file(&alice, &uploaded.path).await.unwrap();
    assert_eq!(removed.size, 3);
    assert!(!engine.exists(&alice, &uploaded.path).await.unwrap());

    let err = adapter.remove_file(&alice, &uploaded.path).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound(_)));

    engine.write_file(&alice, "uploads/keep.txt", &b"k"[..]).await.unwrap();
    let err = adapter.remove_file(&alice, "uploads").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotEmpty);
}

struct ResetStream;

impl AsyncRead for ResetStream {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Poll::Ready(Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset")))
    }
}
