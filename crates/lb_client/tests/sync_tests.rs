//! End-to-end: a real `lb_server` on a loopback port, a `SyncClient` with an
//! on-disk cache, and server shutdown in the middle of a test.

use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

use lb_client::{ClientConfig, ClientError, SyncClient};
use lb_proto::{Account, Binary, Card, Note, Payload, Record, RecordType};
use lb_server::AppState;
use lb_store::Store;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

struct TestServer {
    address: String,
    stop: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<std::io::Result<()>>>,
}

impl TestServer {
    async fn start(dir: &tempfile::TempDir) -> Self {
        let store = Store::open(&dir.path().join("server.db")).await.unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = format!("http://{}", listener.local_addr().unwrap());
        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(lb_server::serve(listener, AppState::new(store), async move {
            let _ = rx.await;
        }));
        Self {
            address,
            stop: Some(tx),
            handle: Some(handle),
        }
    }

    async fn stop(&mut self) {
        if let Some(tx) = self.stop.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.await.unwrap().unwrap();
        }
    }
}

fn key_file(dir: &tempfile::TempDir) -> PathBuf {
    let path = dir.path().join("key.txt");
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(b"correct horse battery staple").unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600)).unwrap();
    path
}

fn config(dir: &tempfile::TempDir, server: &TestServer, user: &str, cache: bool) -> ClientConfig {
    ClientConfig {
        server_address: server.address.clone(),
        user_name: user.into(),
        password: "pass1".into(),
        full_name: "Test User".into(),
        cache_file: cache.then(|| dir.path().join(format!("{user}-cache.db"))),
        key_file: key_file(dir),
        timeout_ms: 2000,
        https_insecure: false,
    }
}

async fn client(dir: &tempfile::TempDir, server: &TestServer, user: &str, cache: bool) -> SyncClient {
    let client = SyncClient::connect(&config(dir, server, user, cache)).await.unwrap();
    client.register().await.unwrap();
    client
}

fn note(name: &str, text: &str) -> Record {
    Record::seal(name, "", &Payload::Note(Note { text: text.into() })).unwrap()
}

fn text_of(record: &Record) -> String {
    match record.payload().unwrap() {
        Payload::Note(n) => n.text,
        other => panic!("expected a note, got {other:?}"),
    }
}

#[tokio::test]
async fn note_lifecycle_then_offline_cache() {
    let dir = tempfile::tempdir().unwrap();
    let mut server = TestServer::start(&dir).await;
    let client = client(&dir, &server, "u1-user", true).await;
    client.verify().await.unwrap();

    let id = client.store(&note("n1", "hello")).await.unwrap();
    let got = client.get(id).await.unwrap();
    assert_eq!((got.id, got.name.as_str()), (id, "n1"));
    assert_eq!(text_of(&got), "hello");

    client.update(id, &note("n1", "bye")).await.unwrap();
    assert_eq!(text_of(&client.get(id).await.unwrap()), "bye");

    let kept = client.store(&note("kept", "still here")).await.unwrap();

    client.delete(id).await.unwrap();
    assert!(client.get(id).await.unwrap_err().is_not_found());

    server.stop().await;

    // Deleted before shutdown: the cache must not resurrect it.
    assert!(client.get(id).await.unwrap_err().is_not_found());
    // Synced before shutdown: served from the cache.
    assert_eq!(text_of(&client.get(kept).await.unwrap()), "still here");
    let by_name = client
        .get_by_type_name(RecordType::Note, "kept")
        .await
        .unwrap();
    assert_eq!(by_name.id, kept);

    let listed = client.list(None).await.unwrap();
    assert_eq!(listed.keys().copied().collect::<Vec<_>>(), vec![kept]);

    // Writes never fall back.
    let err = client.store(&note("offline", "x")).await.unwrap_err();
    assert!(err.is_network(), "{err}");
    let err = client.delete(kept).await.unwrap_err();
    assert!(err.is_network(), "{err}");
    assert!(client.get(kept).await.is_ok());
}

#[tokio::test]
async fn cache_holds_the_ciphertext_last_synced() {
    let dir = tempfile::tempdir().unwrap();
    let mut server = TestServer::start(&dir).await;
    let client = client(&dir, &server, "u1-user", true).await;

    let id = client.store(&note("n1", "secret text")).await.unwrap();
    let cached = client.cache().get(id).await.unwrap();
    assert_eq!(cached.id, id);
    assert!(!cached.opaque.contains("secret text"));

    server.stop().await;
    let again = client.cache().get(id).await.unwrap();
    assert_eq!(again, cached);
    assert_eq!(text_of(&client.get(id).await.unwrap()), "secret text");
}

#[tokio::test]
async fn same_name_different_types() {
    let dir = tempfile::tempdir().unwrap();
    let mut server = TestServer::start(&dir).await;
    let client = client(&dir, &server, "u1-user", true).await;

    let n = client.store(&note("shared", "a note")).await.unwrap();
    let account = Record::seal(
        "shared",
        "work",
        &Payload::Account(Account {
            url: "https://example.com".into(),
            user_name: "me".into(),
            password: "pw".into(),
        }),
    )
    .unwrap();
    let a = client.store(&account).await.unwrap();
    assert_ne!(n, a);

    let err = client.store(&note("shared", "dup")).await.unwrap_err();
    assert!(matches!(err, ClientError::AlreadyExists(_)), "{err}");

    let got = client
        .get_by_type_name(RecordType::Account, "shared")
        .await
        .unwrap();
    assert_eq!(got.meta, "work");
    assert_eq!(got.payload().unwrap(), account.payload().unwrap());

    let accounts = client.list(Some(RecordType::Account)).await.unwrap();
    assert_eq!(accounts.keys().copied().collect::<Vec<_>>(), vec![a]);
    server.stop().await;
}

#[tokio::test]
async fn update_and_delete_by_type_and_name() {
    let dir = tempfile::tempdir().unwrap();
    let mut server = TestServer::start(&dir).await;
    let client = client(&dir, &server, "u1-user", true).await;

    let card = |cvc: &str| {
        Record::seal(
            "visa",
            "",
            &Payload::Card(Card {
                holder: "A HOLDER".into(),
                number: "4111 1111 1111 1111".into(),
                exp_month: 12,
                exp_year: 2030,
                cvc: cvc.into(),
            }),
        )
        .unwrap()
    };
    let id = client.store(&card("123")).await.unwrap();
    let updated = client
        .update_by_type_name(RecordType::Card, "visa", &card("456"))
        .await
        .unwrap();
    assert_eq!(updated, id);

    match client.get(id).await.unwrap().payload().unwrap() {
        Payload::Card(c) => assert_eq!(c.cvc, "456"),
        other => panic!("unexpected {other:?}"),
    }

    let deleted = client
        .delete_by_type_name(RecordType::Card, "visa")
        .await
        .unwrap();
    assert_eq!(deleted, id);
    assert!(client.cache().get(id).await.unwrap_err().is_not_found());

    server.stop().await;
    assert!(client
        .get_by_type_name(RecordType::Card, "visa")
        .await
        .unwrap_err()
        .is_not_found());
}

#[tokio::test]
async fn binary_payload_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let mut server = TestServer::start(&dir).await;
    let client = client(&dir, &server, "u1-user", true).await;

    let data: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
    let blob = Record::seal("blob", "", &Payload::Binary(Binary { data: data.clone() })).unwrap();
    let id = client.store(&blob).await.unwrap();

    match client.get(id).await.unwrap().payload().unwrap() {
        Payload::Binary(b) => assert_eq!(b.data, data),
        other => panic!("unexpected {other:?}"),
    }
    server.stop().await;
}

#[tokio::test]
async fn users_are_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let mut server = TestServer::start(&dir).await;
    let alice = client(&dir, &server, "alice", true).await;
    let bob = client(&dir, &server, "bobby", true).await;

    let id = alice.store(&note("mine", "alice only")).await.unwrap();
    assert!(bob.get(id).await.unwrap_err().is_not_found());
    assert!(bob.delete(id).await.unwrap_err().is_not_found());
    assert!(bob.list(None).await.unwrap().is_empty());
    assert_eq!(text_of(&alice.get(id).await.unwrap()), "alice only");
    server.stop().await;
}

#[tokio::test]
async fn bad_credentials_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut server = TestServer::start(&dir).await;
    let _registered = client(&dir, &server, "u1-user", false).await;

    let mut cfg = config(&dir, &server, "u1-user", false);
    cfg.password = "wrong".into();
    let intruder = SyncClient::connect(&cfg).await.unwrap();
    assert!(matches!(
        intruder.verify().await.unwrap_err(),
        ClientError::Forbidden
    ));

    let again = SyncClient::connect(&config(&dir, &server, "u1-user", false))
        .await
        .unwrap();
    assert!(matches!(
        again.register().await.unwrap_err(),
        ClientError::AlreadyExists(_)
    ));
    server.stop().await;
}

#[tokio::test]
async fn without_cache_offline_reads_report_network() {
    let dir = tempfile::tempdir().unwrap();
    let mut server = TestServer::start(&dir).await;
    let client = client(&dir, &server, "u1-user", false).await;
    assert!(!client.cache().is_enabled());

    let id = client.store(&note("n1", "hello")).await.unwrap();
    assert_eq!(text_of(&client.get(id).await.unwrap()), "hello");

    server.stop().await;
    assert!(client.get(id).await.unwrap_err().is_network());
    assert!(client.list(None).await.unwrap_err().is_network());
}

#[tokio::test]
async fn wrong_key_cannot_read_cached_records() {
    let dir = tempfile::tempdir().unwrap();
    let mut server = TestServer::start(&dir).await;
    let client = client(&dir, &server, "u1-user", true).await;
    let id = client.store(&note("n1", "hello")).await.unwrap();

    let other_key = dir.path().join("other-key.txt");
    std::fs::write(&other_key, b"a different passphrase").unwrap();
    std::fs::set_permissions(&other_key, std::fs::Permissions::from_mode(0o600)).unwrap();
    let mut cfg = config(&dir, &server, "u1-user", true);
    cfg.key_file = other_key;
    let stranger = SyncClient::connect(&cfg).await.unwrap();

    assert!(matches!(
        stranger.get(id).await.unwrap_err(),
        ClientError::Crypto(_)
    ));
    server.stop().await;
}

#[tokio::test]
async fn key_file_preconditions() {
    let dir = tempfile::tempdir().unwrap();
    let server = TestServer::start(&dir).await;
    let mut cfg = config(&dir, &server, "u1-user", false);

    std::fs::set_permissions(&cfg.key_file, std::fs::Permissions::from_mode(0o644)).unwrap();
    assert!(matches!(
        SyncClient::connect(&cfg).await.err(),
        Some(ClientError::Crypto(lb_crypto::CryptoError::Permission(_)))
    ));

    let short = dir.path().join("short.txt");
    std::fs::write(&short, b"tiny").unwrap();
    std::fs::set_permissions(&short, std::fs::Permissions::from_mode(0o600)).unwrap();
    cfg.key_file = short;
    assert!(matches!(
        SyncClient::connect(&cfg).await.err(),
        Some(ClientError::Crypto(lb_crypto::CryptoError::TooShort { .. }))
    ));
}

/// A server that accepts connections and never answers: every request ends
/// in the client-side timeout.
async fn silent_listener() -> (String, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = format!("http://{}", listener.local_addr().unwrap());
    let handle = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    (address, handle)
}

#[tokio::test]
async fn timed_out_requests_fall_back_like_refused_ones() {
    let dir = tempfile::tempdir().unwrap();
    let mut server = TestServer::start(&dir).await;
    let online = client(&dir, &server, "u1-user", true).await;
    let id = online.store(&note("n1", "hello")).await.unwrap();
    online.cache().close().await;
    drop(online);

    let (silent, listener) = silent_listener().await;
    let mut cfg = config(&dir, &server, "u1-user", true);
    cfg.server_address = silent;
    cfg.timeout_ms = 300;
    let stalled = SyncClient::connect(&cfg).await.unwrap();

    assert_eq!(text_of(&stalled.get(id).await.unwrap()), "hello");
    let listed = stalled.list(None).await.unwrap();
    assert_eq!(listed.keys().copied().collect::<Vec<_>>(), vec![id]);

    let err = stalled.store(&note("n2", "never sent")).await.unwrap_err();
    assert!(err.is_network(), "{err}");

    listener.abort();
    server.stop().await;
}
