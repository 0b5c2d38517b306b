//! Remote transfer engine
//!
//! The engine owns the connection to the remote host for one run and performs
//! the recursive directory upload. Remote operations go through the
//! [`RemoteTransport`] trait; the production implementation is backed by the
//! `ssh2` crate (libssh2), tests use a recording mock.

use std::fs;
use std::net::TcpStream;
use std::path::{Path, PathBuf};

use ssh2::Session;

use crate::config::DeployConfig;
use crate::error::{DeployError, DeployResult};

/// State of the remote target path, computed once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteState {
    /// Path does not exist
    Absent,
    /// Path exists and is a directory
    Directory,
    /// Path exists but is not a directory (file, symlink target, ...)
    NotDirectory,
}

/// Per-file upload completion event, consumed only for progress reporting.
#[derive(Debug, Clone)]
pub struct UploadEvent {
    pub source: PathBuf,
    pub dest: String,
}

/// Operations the engine needs from the remote side.
pub trait RemoteTransport {
    /// Probe the existence/type of a remote path.
    fn probe(&mut self, path: &str) -> DeployResult<RemoteState>;

    /// Create a directory and any missing parents.
    fn make_dir_all(&mut self, path: &str) -> DeployResult<()>;

    /// Remove a directory recursively, contents and entry itself.
    fn remove_dir_all(&mut self, path: &str) -> DeployResult<()>;

    /// Upload one local file to a remote path.
    fn upload_file(&mut self, local: &Path, remote: &str) -> DeployResult<()>;

    /// Disconnect. Must be safe to call more than once.
    fn close(&mut self) -> DeployResult<()>;
}

/// Join a remote directory and an entry name with forward slashes.
fn join_remote(base: &str, name: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), name)
}

/// Owns one [`RemoteTransport`] for the duration of a run.
pub struct TransferEngine<T: RemoteTransport> {
    transport: T,
}

impl TransferEngine<Ssh2Transport> {
    /// Open the SFTP connection described by `config`.
    pub fn connect(config: &DeployConfig) -> DeployResult<Self> {
        let transport = Ssh2Transport::connect(
            &config.host,
            config.port,
            &config.username,
            &config.password,
        )?;
        Ok(Self::with_transport(transport))
    }
}

impl<T: RemoteTransport> TransferEngine<T> {
    pub fn with_transport(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Recursively upload everything under `local` into `remote`, preserving
    /// relative structure. Emits one event per completed file. No retry,
    /// no checksum verification, no resume.
    pub fn upload_dir(
        &mut self,
        local: &Path,
        remote: &str,
        on_event: &mut dyn FnMut(UploadEvent),
    ) -> DeployResult<()> {
        // The reconciler may have removed the target entirely.
        self.transport.make_dir_all(remote)?;
        self.upload_entries(local, remote, on_event)
    }

    fn upload_entries(
        &mut self,
        local: &Path,
        remote: &str,
        on_event: &mut dyn FnMut(UploadEvent),
    ) -> DeployResult<()> {
        let mut entries: Vec<_> =
            fs::read_dir(local)?.collect::<Result<Vec<_>, std::io::Error>>()?;
        // Sort for deterministic upload order
        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let path = entry.path();
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                return Err(DeployError::Transfer(format!(
                    "local name '{}' is not valid UTF-8 and cannot be mapped to a remote path",
                    path.display()
                )));
            };
            let dest = join_remote(remote, name);

            if path.is_dir() {
                self.transport.make_dir_all(&dest)?;
                self.upload_entries(&path, &dest, on_event)?;
            } else {
                self.transport.upload_file(&path, &dest)?;
                on_event(UploadEvent { source: path, dest });
            }
        }

        Ok(())
    }

    /// Close the connection. Consumes the engine so it happens exactly once
    /// per run on the explicit paths; the transport's own cleanup covers the
    /// rest.
    pub fn finish(mut self) -> DeployResult<()> {
        self.transport.close()
    }
}

/// SFTP status code for a nonexistent path (SSH_FX_NO_SUCH_FILE).
const SFTP_NO_SUCH_FILE: i32 = 2;

/// Successive directory prefixes of a remote path, one per component.
///
/// A path without a leading slash is home-relative in SFTP and must stay
/// that way; only an absolute input yields absolute prefixes.
fn dir_prefixes(path: &str) -> Vec<String> {
    let mut prefix = if path.starts_with('/') {
        String::from("/")
    } else {
        String::new()
    };

    let mut prefixes = Vec::new();
    for component in path.split('/').filter(|c| !c.is_empty()) {
        if !prefix.is_empty() && !prefix.ends_with('/') {
            prefix.push('/');
        }
        prefix.push_str(component);
        prefixes.push(prefix.clone());
    }
    prefixes
}

/// Production transport over libssh2 with password authentication.
pub struct Ssh2Transport {
    session: Session,
    sftp: ssh2::Sftp,
    closed: bool,
}

impl Ssh2Transport {
    pub fn connect(host: &str, port: u16, username: &str, password: &str) -> DeployResult<Self> {
        let connection_error = |reason: String| DeployError::Connection {
            host: host.to_string(),
            port,
            reason,
        };

        let tcp = TcpStream::connect((host, port)).map_err(|err| connection_error(err.to_string()))?;
        let mut session = Session::new().map_err(|err| connection_error(err.to_string()))?;
        session.set_tcp_stream(tcp);
        session
            .handshake()
            .map_err(|err| connection_error(err.to_string()))?;
        session
            .userauth_password(username, password)
            .map_err(|err| connection_error(err.to_string()))?;
        if !session.authenticated() {
            return Err(connection_error("authentication failed".to_string()));
        }
        let sftp = session
            .sftp()
            .map_err(|err| connection_error(err.to_string()))?;

        Ok(Self {
            session,
            sftp,
            closed: false,
        })
    }
}

impl RemoteTransport for Ssh2Transport {
    fn probe(&mut self, path: &str) -> DeployResult<RemoteState> {
        match self.sftp.stat(Path::new(path)) {
            Ok(stat) => Ok(if stat.is_dir() {
                RemoteState::Directory
            } else {
                RemoteState::NotDirectory
            }),
            Err(err) => {
                if let ssh2::ErrorCode::SFTP(code) = err.code() {
                    if code == SFTP_NO_SUCH_FILE {
                        return Ok(RemoteState::Absent);
                    }
                }
                Err(DeployError::Transfer(format!(
                    "cannot probe remote path '{path}': {err}"
                )))
            }
        }
    }

    fn make_dir_all(&mut self, path: &str) -> DeployResult<()> {
        for prefix in dir_prefixes(path) {
            match self.sftp.stat(Path::new(&prefix)) {
                Ok(stat) if stat.is_dir() => continue,
                Ok(_) => {
                    return Err(DeployError::Transfer(format!(
                        "cannot create remote directory '{prefix}': a non-directory is in the way"
                    )));
                }
                Err(_) => {
                    self.sftp.mkdir(Path::new(&prefix), 0o755).map_err(|err| {
                        DeployError::Transfer(format!(
                            "cannot create remote directory '{prefix}': {err}"
                        ))
                    })?;
                }
            }
        }
        Ok(())
    }

    fn remove_dir_all(&mut self, path: &str) -> DeployResult<()> {
        let entries = self.sftp.readdir(Path::new(path)).map_err(|err| {
            DeployError::Transfer(format!("cannot list remote directory '{path}': {err}"))
        })?;

        for (entry_path, stat) in entries {
            if stat.is_dir() {
                let Some(entry_str) = entry_path.to_str() else {
                    return Err(DeployError::Transfer(format!(
                        "remote entry '{}' is not valid UTF-8",
                        entry_path.display()
                    )));
                };
                self.remove_dir_all(entry_str)?;
            } else {
                self.sftp.unlink(&entry_path).map_err(|err| {
                    DeployError::Transfer(format!(
                        "cannot remove remote file '{}': {err}",
                        entry_path.display()
                    ))
                })?;
            }
        }

        self.sftp.rmdir(Path::new(path)).map_err(|err| {
            DeployError::Transfer(format!("cannot remove remote directory '{path}': {err}"))
        })
    }

    fn upload_file(&mut self, local: &Path, remote: &str) -> DeployResult<()> {
        let mut local_file = fs::File::open(local)?;
        let mut remote_file = self.sftp.create(Path::new(remote)).map_err(|err| {
            DeployError::Transfer(format!("cannot create remote file '{remote}': {err}"))
        })?;
        std::io::copy(&mut local_file, &mut remote_file).map_err(|err| {
            DeployError::Transfer(format!(
                "upload of '{}' failed: {err}",
                local.display()
            ))
        })?;
        Ok(())
    }

    fn close(&mut self) -> DeployResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.session
            .disconnect(None, "deployment finished", None)
            .map_err(|err| DeployError::Transfer(format!("disconnect failed: {err}")))
    }
}

impl Drop for Ssh2Transport {
    fn drop(&mut self) {
        // Deterministic cleanup on error paths that never reach finish()
        if !self.closed {
            let _ = self.session.disconnect(None, "deployment aborted", None);
        }
    }
}

/// Recording transport for tests.
///
/// The operation log lives behind `Arc<Mutex<>>` so a clone kept by the test
/// still observes operations after the transport moves into the engine.
#[cfg(test)]
#[derive(Clone)]
pub struct MockTransport {
    pub probe_result: RemoteState,
    pub fail_remove: bool,
    pub fail_upload: bool,
    ops: std::sync::Arc<std::sync::Mutex<Vec<String>>>,
}

#[cfg(test)]
impl MockTransport {
    pub fn new(probe_result: RemoteState) -> Self {
        Self {
            probe_result,
            fail_remove: false,
            fail_upload: false,
            ops: std::sync::Arc::new(std::sync::Mutex::new(Vec::new())),
        }
    }

    pub fn log(&self) -> Vec<String> {
        self.ops.lock().unwrap().clone()
    }

    fn record(&self, op: String) {
        self.ops.lock().unwrap().push(op);
    }
}

#[cfg(test)]
impl RemoteTransport for MockTransport {
    fn probe(&mut self, path: &str) -> DeployResult<RemoteState> {
        self.record(format!("probe {path}"));
        Ok(self.probe_result)
    }

    fn make_dir_all(&mut self, path: &str) -> DeployResult<()> {
        self.record(format!("mkdir {path}"));
        Ok(())
    }

    fn remove_dir_all(&mut self, path: &str) -> DeployResult<()> {
        if self.fail_remove {
            return Err(DeployError::Transfer(format!(
                "cannot remove remote directory '{path}': injected failure"
            )));
        }
        self.record(format!("rmdir {path}"));
        Ok(())
    }

    fn upload_file(&mut self, local: &Path, remote: &str) -> DeployResult<()> {
        if self.fail_upload {
            return Err(DeployError::Transfer(format!(
                "upload of '{}' failed: injected failure",
                local.display()
            )));
        }
        let name = local
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.record(format!("upload {name} -> {remote}"));
        Ok(())
    }

    fn close(&mut self) -> DeployResult<()> {
        self.record("close".to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_dir_prefixes_absolute() {
        assert_eq!(dir_prefixes("/srv/app"), vec!["/srv", "/srv/app"]);
        assert_eq!(dir_prefixes("/srv/app/"), vec!["/srv", "/srv/app"]);
    }

    #[test]
    fn test_dir_prefixes_keep_relative_paths_relative() {
        // A path without a leading slash is resolved against the remote
        // user's home and must not be recreated rooted at '/'
        assert_eq!(dir_prefixes("apps/site"), vec!["apps", "apps/site"]);
        assert_eq!(dir_prefixes("site"), vec!["site"]);
    }

    #[test]
    fn test_join_remote() {
        assert_eq!(join_remote("/srv/app", "index.html"), "/srv/app/index.html");
        assert_eq!(join_remote("/srv/app/", "css"), "/srv/app/css");
    }

    #[test]
    fn test_upload_dir_preserves_structure() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("assets/css")).unwrap();
        fs::write(dir.path().join("index.html"), "<html>").unwrap();
        fs::write(dir.path().join("assets/app.js"), "js").unwrap();
        fs::write(dir.path().join("assets/css/site.css"), "css").unwrap();

        let transport = MockTransport::new(RemoteState::Absent);
        let log = transport.clone();
        let mut engine = TransferEngine::with_transport(transport);
        let mut events = Vec::new();
        engine
            .upload_dir(dir.path(), "/srv/app", &mut |event| events.push(event))
            .unwrap();

        assert_eq!(
            log.log(),
            vec![
                "mkdir /srv/app",
                "mkdir /srv/app/assets",
                "upload app.js -> /srv/app/assets/app.js",
                "mkdir /srv/app/assets/css",
                "upload site.css -> /srv/app/assets/css/site.css",
                "upload index.html -> /srv/app/index.html",
            ]
        );
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].dest, "/srv/app/assets/app.js");
    }

    #[test]
    fn test_upload_dir_stops_on_first_failure() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();
        fs::write(dir.path().join("b.txt"), "b").unwrap();

        let mut transport = MockTransport::new(RemoteState::Directory);
        transport.fail_upload = true;
        let mut engine = TransferEngine::with_transport(transport);

        let mut events = Vec::new();
        let result = engine.upload_dir(dir.path(), "/srv/app", &mut |event| events.push(event));

        assert!(matches!(result, Err(DeployError::Transfer(_))));
        assert!(events.is_empty(), "no completion event for a failed upload");
    }

    #[cfg(unix)]
    #[test]
    fn test_upload_dir_rejects_non_utf8_file_name() {
        use std::os::unix::ffi::OsStrExt;

        let dir = tempdir().unwrap();
        let name = std::ffi::OsStr::from_bytes(b"caf\xe9.html");
        fs::write(dir.path().join(name), "x").unwrap();

        let transport = MockTransport::new(RemoteState::Directory);
        let log = transport.clone();
        let mut engine = TransferEngine::with_transport(transport);

        let result = engine.upload_dir(dir.path(), "/srv/app", &mut |_| {});

        match result {
            Err(DeployError::Transfer(message)) => {
                assert!(message.contains("not valid UTF-8"), "message: {message}");
            }
            other => panic!("expected Transfer error, got {other:?}"),
        }
        // Nothing was uploaded under a mangled name
        assert!(!log.log().iter().any(|op| op.starts_with("upload")));
    }

    #[test]
    fn test_finish_closes_transport() {
        let transport = MockTransport::new(RemoteState::Directory);
        let log = transport.clone();
        let engine = TransferEngine::with_transport(transport);
        engine.finish().unwrap();
        assert_eq!(log.log(), vec!["close"]);
    }
}
