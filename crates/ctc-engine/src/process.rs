//! External engine bridge
//!
//! Drives an engine living in a child process (typically a small script
//! around a binary-analysis framework) over a JSON-lines protocol on the
//! child's stdin/stdout. One request per line, one reply per line:
//!
//! ```text
//! -> {"op":"load","path":"/usr/bin/target"}
//! <- {"ok":{"project":1}}
//! -> {"op":"solve","state":4,"symbol":"argv_1","width":8}
//! <- {"ok":{"bytes":"4141414141414141"}}
//! <- {"error":"state 4 is unsatisfiable"}
//! ```
//!
//! Byte payloads travel hex-encoded. Projects and states are integer
//! handles owned by the bridge.

use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::binding::{Binding, SimFile, SymbolicBytes};
use crate::engine::{Engine, Exploration, FileDescriptor};
use crate::error::{EngineError, EngineResult};
use crate::policy::ExplorationPolicy;

/// Grace period for the bridge to exit after `shutdown`
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

/// Opaque bridge-side handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BridgeHandle(pub u64);

#[derive(Debug, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Request<'a> {
    Load {
        path: &'a str,
    },
    EntryState {
        project: BridgeHandle,
        args: Vec<WireArg<'a>>,
        files: Vec<WireFile<'a>>,
    },
    Explore {
        state: BridgeHandle,
        policy: &'a ExplorationPolicy,
    },
    Solve {
        state: BridgeHandle,
        symbol: &'a str,
        width: usize,
    },
    LookupFd {
        state: BridgeHandle,
        path: &'a str,
    },
    DumpFd {
        state: BridgeHandle,
        fd: FileDescriptor,
    },
    DumpPath {
        state: BridgeHandle,
        path: &'a str,
    },
    Shutdown,
}

#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum WireArg<'a> {
    Concrete { hex: String },
    Symbolic { name: &'a str, width: usize },
}

#[derive(Debug, Serialize)]
struct WireFile<'a> {
    path: &'a str,
    name: &'a str,
    size: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Reply {
    Ok(serde_json::Value),
    Error(String),
}

#[derive(Debug, Deserialize)]
struct ProjectReply {
    project: BridgeHandle,
}

#[derive(Debug, Deserialize)]
struct StateReply {
    state: BridgeHandle,
}

#[derive(Debug, Deserialize)]
struct ExploreReply {
    terminated: Vec<BridgeHandle>,
    runnable: Vec<BridgeHandle>,
}

#[derive(Debug, Deserialize)]
struct BytesReply {
    bytes: String,
}

#[derive(Debug, Deserialize)]
struct FdReply {
    fd: Option<FileDescriptor>,
}

/// Engine running in a child process
#[derive(Debug)]
pub struct ProcessEngine {
    command: String,
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: BufReader<ChildStdout>,
}

impl ProcessEngine {
    /// Spawn the bridge
    ///
    /// The child's stderr is inherited so engine diagnostics stay visible.
    ///
    /// # Errors
    /// Returns `Spawn` if the command cannot be started.
    pub fn spawn(program: &str, args: &[String]) -> EngineResult<Self> {
        let spawn_err = |source| EngineError::Spawn {
            command: program.to_string(),
            source,
        };
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(spawn_err)?;

        let stdin = child.stdin.take();
        let stdout = child
            .stdout
            .take()
            .map(BufReader::new)
            .ok_or(EngineError::Closed)?;

        tracing::debug!("Spawned engine bridge '{program}' (pid {})", child.id());
        Ok(Self {
            command: program.to_string(),
            child,
            stdin,
            stdout,
        })
    }

    fn call<T: DeserializeOwned>(&mut self, request: &Request<'_>) -> EngineResult<T> {
        self.send(request)?;

        let mut line = String::new();
        if self.stdout.read_line(&mut line)? == 0 {
            return Err(EngineError::Closed);
        }
        match serde_json::from_str::<Reply>(line.trim_end())? {
            Reply::Ok(payload) => Ok(serde_json::from_value(payload)?),
            Reply::Error(message) => Err(EngineError::Rejected(message)),
        }
    }

    fn send(&mut self, request: &Request<'_>) -> EngineResult<()> {
        let stdin = self.stdin.as_mut().ok_or(EngineError::Closed)?;
        let mut line = serde_json::to_string(request)?;
        line.push('\n');
        stdin.write_all(line.as_bytes())?;
        stdin.flush()?;
        Ok(())
    }

    fn bytes(&mut self, request: &Request<'_>) -> EngineResult<Vec<u8>> {
        let reply: BytesReply = self.call(request)?;
        hex::decode(&reply.bytes)
            .map_err(|e| EngineError::Protocol(format!("invalid hex payload: {e}")))
    }
}

impl Engine for ProcessEngine {
    type Project = BridgeHandle;
    type State = BridgeHandle;

    fn load(&mut self, executable: &Path) -> EngineResult<BridgeHandle> {
        let path = executable.to_string_lossy();
        let reply: ProjectReply = self.call(&Request::Load { path: &path })?;
        Ok(reply.project)
    }

    fn entry_state(
        &mut self,
        project: &BridgeHandle,
        args: &[Binding],
        files: &[SimFile],
    ) -> EngineResult<BridgeHandle> {
        let args = args
            .iter()
            .map(|arg| match arg {
                Binding::Concrete(bytes) => WireArg::Concrete {
                    hex: hex::encode(bytes),
                },
                Binding::Symbolic(sym) => WireArg::Symbolic {
                    name: sym.name(),
                    width: sym.width(),
                },
            })
            .collect();
        let files = files
            .iter()
            .map(|file| WireFile {
                path: file.path(),
                name: file.content().name(),
                size: file.size(),
            })
            .collect();

        let reply: StateReply = self.call(&Request::EntryState {
            project: *project,
            args,
            files,
        })?;
        Ok(reply.state)
    }

    fn explore(
        &mut self,
        state: BridgeHandle,
        policy: &ExplorationPolicy,
    ) -> EngineResult<Exploration<BridgeHandle>> {
        let reply: ExploreReply = self.call(&Request::Explore { state, policy })?;
        Ok(Exploration {
            terminated: reply.terminated,
            runnable: reply.runnable,
        })
    }

    fn solve_concrete(
        &mut self,
        state: &BridgeHandle,
        symbol: &SymbolicBytes,
    ) -> EngineResult<Vec<u8>> {
        self.bytes(&Request::Solve {
            state: *state,
            symbol: symbol.name(),
            width: symbol.width(),
        })
    }

    fn lookup_fd(
        &mut self,
        state: &BridgeHandle,
        path: &str,
    ) -> EngineResult<Option<FileDescriptor>> {
        let reply: FdReply = self.call(&Request::LookupFd {
            state: *state,
            path,
        })?;
        Ok(reply.fd)
    }

    fn dump_by_descriptor(
        &mut self,
        state: &BridgeHandle,
        fd: FileDescriptor,
    ) -> EngineResult<Vec<u8>> {
        self.bytes(&Request::DumpFd { state: *state, fd })
    }

    fn dump_by_path(&mut self, state: &BridgeHandle, path: &str) -> EngineResult<Vec<u8>> {
        self.bytes(&Request::DumpPath {
            state: *state,
            path,
        })
    }
}

impl Drop for ProcessEngine {
    fn drop(&mut self) {
        // Best effort: the bridge may already be gone
        let _ = self.send(&Request::Shutdown);
        drop(self.stdin.take());

        let deadline = Instant::now() + SHUTDOWN_GRACE;
        while Instant::now() < deadline {
            match self.child.try_wait() {
                Ok(Some(_)) | Err(_) => return,
                Ok(None) => std::thread::sleep(Duration::from_millis(10)),
            }
        }
        tracing::warn!("Engine bridge '{}' did not exit, killing it", self.command);
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn scripted_bridge(script: &str) -> ProcessEngine {
        ProcessEngine::spawn("sh", &["-c".to_string(), script.to_string()]).unwrap()
    }

    #[test]
    fn request_wire_form() {
        let json = serde_json::to_string(&Request::Solve {
            state: BridgeHandle(4),
            symbol: "argv_1",
            width: 8,
        })
        .unwrap();
        assert_eq!(json, r#"{"op":"solve","state":4,"symbol":"argv_1","width":8}"#);

        let json = serde_json::to_string(&WireArg::Concrete { hex: "2d6e".into() }).unwrap();
        assert_eq!(json, r#"{"kind":"concrete","hex":"2d6e"}"#);
    }

    #[test]
    fn entry_state_wire_form() {
        let json = serde_json::to_string(&Request::EntryState {
            project: BridgeHandle(1),
            args: vec![
                WireArg::Concrete { hex: "2d6e".into() },
                WireArg::Symbolic {
                    name: "argv_1",
                    width: 8,
                },
            ],
            files: vec![WireFile {
                path: "/dev/stdin",
                name: "crete-stdin",
                size: 4,
            }],
        })
        .unwrap();
        assert_eq!(
            json,
            concat!(
                r#"{"op":"entry_state","project":1,"#,
                r#""args":[{"kind":"concrete","hex":"2d6e"},{"kind":"symbolic","name":"argv_1","width":8}],"#,
                r#""files":[{"path":"/dev/stdin","name":"crete-stdin","size":4}]}"#
            )
        );
    }

    #[test]
    fn explore_carries_tagged_policy() {
        let json = serde_json::to_string(&Request::Explore {
            state: BridgeHandle(2),
            policy: &ExplorationPolicy::SingleFork,
        })
        .unwrap();
        assert_eq!(
            json,
            r#"{"op":"explore","state":2,"policy":{"kind":"single_fork"}}"#
        );

        let timeout = ExplorationPolicy::timeout(Duration::from_millis(7500));
        let json = serde_json::to_string(&Request::Explore {
            state: BridgeHandle(2),
            policy: &timeout,
        })
        .unwrap();
        assert_eq!(
            json,
            r#"{"op":"explore","state":2,"policy":{"kind":"timeout","budget":7500}}"#
        );
    }

    #[test]
    fn descriptor_requests_wire_form() {
        let json = serde_json::to_string(&Request::DumpFd {
            state: BridgeHandle(3),
            fd: FileDescriptor(5),
        })
        .unwrap();
        assert_eq!(json, r#"{"op":"dump_fd","state":3,"fd":5}"#);

        let json = serde_json::to_string(&Request::Shutdown).unwrap();
        assert_eq!(json, r#"{"op":"shutdown"}"#);
    }

    #[test]
    fn explore_reply_splits_states() {
        let mut engine =
            scripted_bridge(r#"read line; echo '{"ok":{"terminated":[3],"runnable":[4,5]}}'"#);
        let exploration = engine
            .explore(BridgeHandle(2), &ExplorationPolicy::SingleFork)
            .unwrap();
        assert_eq!(exploration.terminated, [BridgeHandle(3)]);
        assert_eq!(exploration.runnable, [BridgeHandle(4), BridgeHandle(5)]);
    }

    #[test]
    fn dump_by_descriptor_decodes_payload() {
        let mut engine = scripted_bridge(r#"read line; echo '{"ok":{"bytes":"00ff7a"}}'"#);
        let bytes = engine
            .dump_by_descriptor(&BridgeHandle(3), FileDescriptor(5))
            .unwrap();
        assert_eq!(bytes, [0x00, 0xff, 0x7a]);
    }

    #[test]
    fn bad_hex_payload_is_protocol_error() {
        let mut engine = scripted_bridge(r#"read line; echo '{"ok":{"bytes":"zz"}}'"#);
        let err = engine
            .dump_by_descriptor(&BridgeHandle(3), FileDescriptor(5))
            .unwrap_err();
        assert!(matches!(err, EngineError::Protocol(_)));
    }

    #[test]
    fn load_returns_bridge_handle() {
        let mut engine = scripted_bridge(r#"read line; echo '{"ok":{"project":7}}'"#);
        let project = engine.load(Path::new("/bin/true")).unwrap();
        assert_eq!(project, BridgeHandle(7));
    }

    #[test]
    fn error_reply_is_rejected() {
        let mut engine = scripted_bridge(r#"read line; echo '{"error":"unsat"}'"#);
        let err = engine
            .solve_concrete(&BridgeHandle(1), &SymbolicBytes::new("argv_1", 4))
            .unwrap_err();
        assert!(matches!(err, EngineError::Rejected(ref m) if m == "unsat"));
    }

    #[test]
    fn hex_payload_is_decoded() {
        let mut engine = scripted_bridge(r#"read line; echo '{"ok":{"bytes":"41420043"}}'"#);
        let bytes = engine.dump_by_path(&BridgeHandle(1), "/tmp/x").unwrap();
        assert_eq!(bytes, b"AB\0C");
    }

    #[test]
    fn missing_descriptor_is_none() {
        let mut engine = scripted_bridge(r#"read line; echo '{"ok":{"fd":null}}'"#);
        assert_eq!(engine.lookup_fd(&BridgeHandle(1), "/tmp/x").unwrap(), None);
    }

    #[test]
    fn closed_bridge_is_reported() {
        let mut engine = scripted_bridge("exit 0");
        let err = engine.load(Path::new("/bin/true")).unwrap_err();
        assert!(matches!(err, EngineError::Closed | EngineError::Io(_)));
    }

    #[test]
    fn spawn_failure_names_command() {
        let err = ProcessEngine::spawn("/no/such/ctc-bridge", &[]).unwrap_err();
        assert!(err.to_string().contains("/no/such/ctc-bridge"));
    }
}
