use std::path::Path;
use std::time::Instant;

use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tokio::task::JoinHandle;

use ferryd::config::Config;
use ferryd::constants::{SYNC_RECV_TIMEOUT, SYNC_SEND_TIMEOUT};
use ferryd::core_protocol::{Connection, ControlCode};
use ferryd::core_session::{Session, TransferKind};
use ferryd::core_transfer::tcp;

fn test_config(files_dir: &Path) -> Config {
    let mut config = Config::default();
    config.server.files_dir = files_dir.to_string_lossy().into_owned();
    config.transfer.chunk_size = 4096;
    config.transfer.enable_check = false;
    config
}

/// Runs one session's command loop over a localhost socket pair and hands
/// the scripted peer back to the test.
async fn spawn_session(files_dir: &Path) -> (Connection, JoinHandle<Session>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let config = test_config(files_dir);
    let handle = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let mut conn = Connection::new(socket).unwrap();
        let udp = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let mut session = Session::new("test-token".to_string(), Instant::now());
        session.poll(&mut conn, &config, &udp).await;
        session
    });
    let conn = Connection::new(TcpStream::connect(addr).await.unwrap()).unwrap();
    (conn, handle)
}

/// Drives one text command through the envelope and collects the reply lines.
async fn run_text_command(conn: &mut Connection, line: &str) -> Vec<String> {
    conn.send_line(line).await.unwrap();
    assert_eq!(
        conn.recv_control(SYNC_RECV_TIMEOUT).await,
        ControlCode::CmdStart
    );
    conn.send_control(ControlCode::Ok, SYNC_SEND_TIMEOUT).await;
    let mut lines = Vec::new();
    loop {
        match conn.peek(SYNC_RECV_TIMEOUT).await {
            Some(byte) if byte == ControlCode::CmdEnd.as_byte() => break,
            None => break,
            Some(_) => lines.push(conn.read_line().await.unwrap()),
        }
    }
    assert_eq!(
        conn.recv_control(SYNC_RECV_TIMEOUT).await,
        ControlCode::CmdEnd
    );
    conn.send_control(ControlCode::Ok, SYNC_SEND_TIMEOUT).await;
    lines
}

#[tokio::test]
async fn unknown_verb_is_a_bad_request_and_the_session_survives() {
    let dir = tempfile::tempdir().unwrap();
    let (mut conn, handle) = spawn_session(dir.path()).await;

    assert_eq!(
        run_text_command(&mut conn, "frobnicate now").await,
        ["Bad request"]
    );
    assert_eq!(
        run_text_command(&mut conn, "echo still alive").await,
        ["still alive"]
    );
    assert_eq!(
        run_text_command(&mut conn, "logout").await,
        ["logging out..."]
    );

    let session = handle.await.unwrap();
    assert!(!session.active);
    assert!(!session.shutdown_requested);

    // a second logout has no session left to act on; sending it must not
    // panic anything, the connection is simply closing
    let _ = conn.send_line("logout").await;
}

#[tokio::test]
async fn wrong_argument_counts_get_the_generic_reply() {
    let dir = tempfile::tempdir().unwrap();
    let (mut conn, handle) = spawn_session(dir.path()).await;

    assert_eq!(
        run_text_command(&mut conn, "time now").await,
        ["Wrong arguments"]
    );
    assert_eq!(
        run_text_command(&mut conn, "mkdir").await,
        ["Wrong arguments"]
    );
    assert_eq!(
        run_text_command(&mut conn, "rm a b").await,
        ["Wrong arguments"]
    );
    run_text_command(&mut conn, "logout").await;
    handle.await.unwrap();
}

#[tokio::test]
async fn mkdir_on_an_existing_path_fails_without_killing_the_session() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("newdir")).unwrap();
    let (mut conn, handle) = spawn_session(dir.path()).await;

    assert_eq!(
        run_text_command(&mut conn, "mkdir newdir").await,
        ["Can't create directory"]
    );
    assert_eq!(
        run_text_command(&mut conn, "mkdir fresh").await,
        ["Directory created successfully"]
    );
    assert!(dir.path().join("fresh").is_dir());

    run_text_command(&mut conn, "logout").await;
    let session = handle.await.unwrap();
    assert!(!session.active);
}

#[tokio::test]
async fn rm_removes_files_and_reports_missing_ones() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("doomed.txt"), b"bye").unwrap();
    let (mut conn, handle) = spawn_session(dir.path()).await;

    assert_eq!(
        run_text_command(&mut conn, "rm doomed.txt").await,
        ["Directory/file removed successfully"]
    );
    assert!(!dir.path().join("doomed.txt").exists());
    assert_eq!(
        run_text_command(&mut conn, "rm doomed.txt").await,
        ["Can't remove file/directory"]
    );

    run_text_command(&mut conn, "logout").await;
    handle.await.unwrap();
}

#[tokio::test]
async fn shutdown_requests_process_exit() {
    let dir = tempfile::tempdir().unwrap();
    let (mut conn, handle) = spawn_session(dir.path()).await;

    assert_eq!(
        run_text_command(&mut conn, "shutdown").await,
        ["Performing server shutdown..."]
    );
    let session = handle.await.unwrap();
    assert!(!session.active);
    assert!(session.shutdown_requested);
}

#[tokio::test]
async fn help_lists_the_whole_verb_set() {
    let dir = tempfile::tempdir().unwrap();
    let (mut conn, handle) = spawn_session(dir.path()).await;

    let lines = run_text_command(&mut conn, "help").await;
    for verb in [
        "echo", "time", "stime", "tree", "mkdir", "rm", "download", "upload", "udpdownload",
        "udpupload", "logout", "shutdown",
    ] {
        assert!(
            lines.iter().any(|l| l.starts_with(verb)),
            "help is missing {}",
            verb
        );
    }
    run_text_command(&mut conn, "logout").await;
    handle.await.unwrap();
}

#[tokio::test]
async fn download_through_the_dispatch_loop_delivers_the_file() {
    let server_dir = tempfile::tempdir().unwrap();
    let client_dir = tempfile::tempdir().unwrap();
    let payload: Vec<u8> = (0..10_000).map(|i| (i % 249) as u8).collect();
    std::fs::write(server_dir.path().join("a.bin"), &payload).unwrap();
    let (mut conn, handle) = spawn_session(server_dir.path()).await;

    conn.send_line("download files/a.bin out.bin").await.unwrap();
    assert_eq!(
        conn.recv_control(SYNC_RECV_TIMEOUT).await,
        ControlCode::CmdStart
    );
    conn.send_control(ControlCode::Ok, SYNC_SEND_TIMEOUT).await;
    // argument check, then path check
    assert_eq!(conn.recv_control(SYNC_RECV_TIMEOUT).await, ControlCode::Ok);
    assert_eq!(conn.recv_control(SYNC_RECV_TIMEOUT).await, ControlCode::Ok);

    let target = client_dir.path().join("out.bin");
    let total = tcp::recv_file(&mut conn, &target, 4096, 0).await.unwrap();
    assert_eq!(total, 10_000);
    assert_eq!(std::fs::read(&target).unwrap(), payload);

    assert_eq!(
        conn.recv_control(SYNC_RECV_TIMEOUT).await,
        ControlCode::CmdEnd
    );
    conn.send_control(ControlCode::Ok, SYNC_SEND_TIMEOUT).await;

    run_text_command(&mut conn, "logout").await;
    let session = handle.await.unwrap();
    // clean completion clears the transfer but keeps the recorded paths
    assert_eq!(session.transfer, TransferKind::None);
    assert_eq!(session.remote_path.as_deref(), Some("files/a.bin"));
    assert_eq!(session.local_path.as_deref(), Some("out.bin"));
}

#[tokio::test]
async fn download_of_a_missing_file_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let (mut conn, handle) = spawn_session(dir.path()).await;

    conn.send_line("download nope.bin out.bin").await.unwrap();
    assert_eq!(
        conn.recv_control(SYNC_RECV_TIMEOUT).await,
        ControlCode::CmdStart
    );
    conn.send_control(ControlCode::Ok, SYNC_SEND_TIMEOUT).await;
    assert_eq!(conn.recv_control(SYNC_RECV_TIMEOUT).await, ControlCode::Ok);
    assert_eq!(conn.recv_control(SYNC_RECV_TIMEOUT).await, ControlCode::Err);
    assert_eq!(
        conn.recv_control(SYNC_RECV_TIMEOUT).await,
        ControlCode::CmdEnd
    );
    conn.send_control(ControlCode::Ok, SYNC_SEND_TIMEOUT).await;

    // the refusal left the session fully usable
    assert_eq!(run_text_command(&mut conn, "echo ok").await, ["ok"]);
    run_text_command(&mut conn, "logout").await;
    let session = handle.await.unwrap();
    assert_eq!(session.transfer, TransferKind::None);
}

#[tokio::test]
async fn upload_through_the_dispatch_loop_stores_the_file() {
    let server_dir = tempfile::tempdir().unwrap();
    let client_dir = tempfile::tempdir().unwrap();
    let payload: Vec<u8> = (0..6000).map(|i| (i % 253) as u8).collect();
    let source = client_dir.path().join("src.bin");
    std::fs::write(&source, &payload).unwrap();
    let (mut conn, handle) = spawn_session(server_dir.path()).await;

    conn.send_line("upload stored.bin src.bin").await.unwrap();
    assert_eq!(
        conn.recv_control(SYNC_RECV_TIMEOUT).await,
        ControlCode::CmdStart
    );
    conn.send_control(ControlCode::Ok, SYNC_SEND_TIMEOUT).await;
    assert_eq!(conn.recv_control(SYNC_RECV_TIMEOUT).await, ControlCode::Ok);
    // report that the local source exists, then stream it
    conn.send_control(ControlCode::Ok, SYNC_SEND_TIMEOUT).await;
    let total = tcp::send_file(&mut conn, &source, 4096, 0).await.unwrap();
    assert_eq!(total, 6000);

    assert_eq!(
        conn.recv_control(SYNC_RECV_TIMEOUT).await,
        ControlCode::CmdEnd
    );
    conn.send_control(ControlCode::Ok, SYNC_SEND_TIMEOUT).await;

    assert_eq!(
        std::fs::read(server_dir.path().join("stored.bin")).unwrap(),
        payload
    );
    run_text_command(&mut conn, "logout").await;
    let session = handle.await.unwrap();
    assert_eq!(session.transfer, TransferKind::None);
}
