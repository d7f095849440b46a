use std::collections::HashMap;
use std::ffi::OsStr;
use std::io::{Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::process::{Command, Output};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, mpsc};
use std::thread;
use std::time::Duration;

use serde_json::{Value, json};

/// Requests larger than this are rejected by the fake gateway.
const MAX_REQUEST_BYTES: usize = 64 * 1024;

pub struct ServerHandle {
    shutdown: mpsc::Sender<()>,
    thread: Option<thread::JoinHandle<()>>,
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        let _send_result = self.shutdown.send(());
        if let Some(handle) = self.thread.take() {
            drop(handle.join());
        }
    }
}

#[derive(Debug, Clone)]
struct FakeTask {
    polls: u32,
    stdout: String,
    stderr: String,
    exit_code: i32,
}

#[derive(Debug, Default)]
struct GatewayState {
    health: String,
    next_id: AtomicU64,
    tasks: Mutex<HashMap<String, FakeTask>>,
}

/// Spawn an HTTP gateway stand-in that runs submitted commands locally.
/// The first status query of a task answers `RUNNING`; later ones answer
/// `TASK_COMPLETED` nested under `task_info`, with the command's output.
///
/// # Errors
///
/// Returns an error if the listener cannot be created or configured.
pub fn spawn_fake_gateway(health: &str) -> Result<(String, ServerHandle), String> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .map_err(|err| format!("bind test server failed: {}", err))?;
    let addr = listener
        .local_addr()
        .map_err(|err| format!("server addr failed: {}", err))?;
    listener
        .set_nonblocking(true)
        .map_err(|err| format!("set_nonblocking failed: {}", err))?;

    let state = Arc::new(GatewayState {
        health: health.to_owned(),
        ..GatewayState::default()
    });
    let (shutdown_tx, shutdown_rx) = mpsc::channel();

    let handle = thread::spawn(move || {
        loop {
            if shutdown_rx.try_recv().is_ok() {
                break;
            }

            match listener.accept() {
                Ok((stream, _)) => {
                    let state = Arc::clone(&state);
                    thread::spawn(move || handle_client(stream, &state));
                }
                Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(5));
                }
                Err(_) => break,
            }
        }
    });

    Ok((
        format!("http://{}", addr),
        ServerHandle {
            shutdown: shutdown_tx,
            thread: Some(handle),
        },
    ))
}

/// Like [`spawn_fake_gateway`], but skips when the sandbox forbids sockets.
///
/// # Errors
///
/// Returns an error for any other listener failure.
pub fn spawn_fake_gateway_or_skip(health: &str) -> Result<Option<(String, ServerHandle)>, String> {
    match spawn_fake_gateway(health) {
        Ok(result) => Ok(Some(result)),
        Err(err) if err.contains("Operation not permitted") => {
            eprintln!("Skipping e2e test: {}", err);
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

struct Request {
    method: String,
    path: String,
    body: Vec<u8>,
}

fn find_header_end(buffer: &[u8]) -> Option<usize> {
    buffer
        .windows(4)
        .position(|window| window == b"\r\n\r\n")
        .map(|pos| pos.saturating_add(4))
}

fn read_request(stream: &mut TcpStream) -> Option<Request> {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 1024];
    let header_end = loop {
        if let Some(end) = find_header_end(&buffer) {
            break end;
        }
        let read = stream.read(&mut chunk).ok()?;
        if read == 0 || buffer.len() > MAX_REQUEST_BYTES {
            return None;
        }
        buffer.extend_from_slice(chunk.get(..read)?);
    };

    let head = String::from_utf8_lossy(buffer.get(..header_end)?).into_owned();
    let mut lines = head.lines();
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_owned();
    let path = request_line.next()?.to_owned();
    let content_length = lines
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = buffer.get(header_end..)?.to_vec();
    while body.len() < content_length {
        let read = stream.read(&mut chunk).ok()?;
        if read == 0 {
            return None;
        }
        body.extend_from_slice(chunk.get(..read)?);
    }
    Some(Request { method, path, body })
}

fn run_command(request: &Value) -> FakeTask {
    let program = request.get("command").and_then(Value::as_str).unwrap_or("");
    let args: Vec<String> = request
        .get("args")
        .and_then(Value::as_array)
        .map(|values| {
            values
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default();
    match Command::new(program).args(&args).output() {
        Ok(output) => FakeTask {
            polls: 0,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code().unwrap_or(-1),
        },
        Err(err) => FakeTask {
            polls: 0,
            stdout: String::new(),
            stderr: err.to_string(),
            exit_code: 127,
        },
    }
}

fn route(request: &Request, state: &GatewayState) -> (u16, Value) {
    match (request.method.as_str(), request.path.as_str()) {
        ("GET", "/health") => (200, json!({ "status": state.health })),
        ("POST", "/v1/execute") => {
            let Ok(body) = serde_json::from_slice::<Value>(&request.body) else {
                return (400, json!({ "error": "invalid JSON" }));
            };
            let task = run_command(&body);
            let id = state.next_id.fetch_add(1, Ordering::Relaxed);
            let task_id = format!("task-{}", id);
            state
                .tasks
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(task_id.clone(), task);
            (200, json!({ "task_id": task_id }))
        }
        ("GET", path) => {
            let Some(task_id) = path.strip_prefix("/v1/tasks/") else {
                return (404, json!({ "error": "not found" }));
            };
            let mut tasks = state.tasks.lock().unwrap_or_else(PoisonError::into_inner);
            let Some(task) = tasks.get_mut(task_id) else {
                return (404, json!({ "error": "unknown task" }));
            };
            task.polls = task.polls.saturating_add(1);
            if task.polls == 1 {
                return (200, json!({ "status": "RUNNING" }));
            }
            (
                200,
                json!({
                    "task_info": { "status": "TASK_COMPLETED" },
                    "result": {
                        "stdout": task.stdout,
                        "stderr": task.stderr,
                        "exit_code": task.exit_code,
                    },
                }),
            )
        }
        _ => (405, json!({ "error": "method not allowed" })),
    }
}

fn handle_client(mut stream: TcpStream, state: &GatewayState) {
    if stream.set_nonblocking(false).is_err() {
        return;
    }
    let Some(request) = read_request(&mut stream) else {
        return;
    };
    let (status, body) = route(&request, state);
    let payload = body.to_string();
    let reason = if status == 200 { "OK" } else { "Error" };
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reason,
        payload.len(),
        payload
    );
    if stream.write_all(response.as_bytes()).is_err() {
        return;
    }
    if stream.flush().is_err() {
        return;
    }
    drop(stream.shutdown(Shutdown::Both));
}

/// Run the `gateprobe` binary and capture output.
///
/// # Errors
///
/// Returns an error if the binary cannot be executed.
pub fn run_gateprobe<I, S>(args: I) -> Result<Output, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let bin = gateprobe_bin()?;
    Command::new(bin)
        .args(args)
        .env("GATEPROBE_LOG", "error")
        .env_remove("GATEPROBE_URL")
        .output()
        .map_err(|err| format!("run gateprobe failed: {}", err))
}

fn gateprobe_bin() -> Result<String, String> {
    option_env!("CARGO_BIN_EXE_gateprobe").map_or_else(
        || Err("CARGO_BIN_EXE_gateprobe missing at compile time.".to_owned()),
        |path| Ok(path.to_owned()),
    )
}

#[must_use]
pub fn describe(output: &Output) -> String {
    format!(
        "status: {:?}\nstdout: {}\nstderr: {}",
        output.status.code(),
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}
