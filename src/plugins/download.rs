use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, info};
use reqwest::blocking::Client;
use serde::Deserialize;
use url::Url;

use super::{Plugin, unhandled};
use crate::command::{Command, CommandKind, CommandOutput};
use crate::error::ViewerError;
use crate::viewer::PluginContext;

const FALLBACK_FILE_NAME: &str = "download";
const FETCH_TIMEOUT: Duration = Duration::from_secs(60);

/// Fetches bytes for a URL and stores them under a file name
pub trait Transport {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, ViewerError>;

    fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, ViewerError>;
}

/// Reads local paths and `file://` URLs, saves into a directory
#[derive(Clone, Debug)]
pub struct LocalTransport {
    target_dir: PathBuf,
}

impl LocalTransport {
    pub fn new(target_dir: impl Into<PathBuf>) -> Self {
        Self {
            target_dir: target_dir.into(),
        }
    }

    fn source_path(url: &str) -> Result<PathBuf, ViewerError> {
        match Url::parse(url) {
            Ok(parsed) if parsed.scheme() == "file" => parsed
                .to_file_path()
                .map_err(|()| ViewerError::download(url, "not a local file URL")),
            // Windows drive letters parse as a one-letter scheme
            Ok(parsed) if parsed.scheme().len() > 1 => Err(ViewerError::download(
                url,
                format!("unsupported scheme '{}'", parsed.scheme()),
            )),
            _ => Ok(PathBuf::from(url)),
        }
    }
}

/// Final component of `file_name`; never a directory or a parent reference
fn sanitize_file_name(file_name: &str) -> &str {
    Path::new(file_name)
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .unwrap_or(FALLBACK_FILE_NAME)
}

impl Transport for LocalTransport {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, ViewerError> {
        let path = Self::source_path(url)?;
        fs::read(&path).map_err(|e| ViewerError::download(url, format!("{path:?}: {e}")))
    }

    /// Writes a temp file next to the destination, then renames it into place
    fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, ViewerError> {
        let destination = self.target_dir.join(sanitize_file_name(file_name));
        let mut transient = tempfile::NamedTempFile::new_in(&self.target_dir)?;
        transient.write_all(bytes)?;
        transient.persist(&destination).map_err(|e| e.error)?;
        Ok(destination)
    }
}

fn is_http(url: &str) -> bool {
    Url::parse(url).is_ok_and(|parsed| matches!(parsed.scheme(), "http" | "https"))
}

/// Fetches http(s) URLs with a blocking client; everything else goes to [`LocalTransport`]
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Option<Client>,
    local: LocalTransport,
}

impl HttpTransport {
    pub fn new(target_dir: impl Into<PathBuf>) -> Self {
        Self {
            client: None,
            local: LocalTransport::new(target_dir),
        }
    }

    pub fn with_client(client: Client, target_dir: impl Into<PathBuf>) -> Self {
        Self {
            client: Some(client),
            local: LocalTransport::new(target_dir),
        }
    }

    fn client(&self, url: &str) -> Result<Client, ViewerError> {
        match &self.client {
            Some(client) => Ok(client.clone()),
            None => Client::builder()
                .timeout(FETCH_TIMEOUT)
                .build()
                .map_err(|e| ViewerError::download(url, e.to_string())),
        }
    }
}

impl Transport for HttpTransport {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, ViewerError> {
        if !is_http(url) {
            return self.local.fetch(url);
        }
        let response = self
            .client(url)?
            .get(url)
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(|e| ViewerError::download(url, e.to_string()))?;
        let bytes = response
            .bytes()
            .map_err(|e| ViewerError::download(url, e.to_string()))?;
        Ok(bytes.to_vec())
    }

    fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, ViewerError> {
        self.local.save(file_name, bytes)
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct DownloadOptions {
    pub url: Option<String>,
    pub file_name: Option<String>,
    /// Where downloads are saved; the user's download directory when unset
    pub target_dir: Option<PathBuf>,
}

impl DownloadOptions {
    pub fn for_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }
}

/// Last non-empty path segment of `url`, ignoring query and fragment
pub fn url_file_name(url: &str) -> Option<String> {
    let path = match Url::parse(url) {
        Ok(parsed) if parsed.scheme().len() > 1 => parsed.path().to_string(),
        _ => url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .replace('\\', "/"),
    };
    path.rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
}

/// Explicit name, else configured name, else the URL's last segment, else "download"
pub fn resolve_file_name(explicit: Option<&str>, configured: Option<&str>, url: &str) -> String {
    explicit
        .or(configured)
        .map(str::to_string)
        .or_else(|| url_file_name(url))
        .unwrap_or_else(|| FALLBACK_FILE_NAME.to_string())
}

pub struct DownloadPlugin {
    options: DownloadOptions,
    transport: Box<dyn Transport>,
}

impl DownloadPlugin {
    pub const NAME: &'static str = "download";

    const COMMANDS: &'static [CommandKind] = &[CommandKind::Download];

    pub fn new(options: DownloadOptions) -> Self {
        let target_dir = options
            .target_dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::with_transport(options, HttpTransport::new(target_dir))
    }

    pub fn with_transport(options: DownloadOptions, transport: impl Transport + 'static) -> Self {
        Self {
            options,
            transport: Box::new(transport),
        }
    }

    fn download(&self, file_name: Option<&str>) -> Result<PathBuf, ViewerError> {
        let url = self
            .options
            .url
            .as_deref()
            .ok_or(ViewerError::MissingDownloadUrl)?;

        let bytes = self.transport.fetch(url)?;
        let name = resolve_file_name(file_name, self.options.file_name.as_deref(), url);
        debug!("Fetched {} bytes from {url}, saving as '{name}'", bytes.len());

        let saved = self.transport.save(&name, &bytes)?;
        info!("Downloaded {url} to {}", display(&saved));
        Ok(saved)
    }
}

fn display(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

impl Plugin for DownloadPlugin {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn commands(&self) -> &'static [CommandKind] {
        Self::COMMANDS
    }

    fn execute(
        &mut self,
        command: &Command,
        _ctx: &mut PluginContext<'_>,
    ) -> Result<CommandOutput, ViewerError> {
        match command {
            Command::Download { file_name } => self
                .download(file_name.as_deref())
                .map(CommandOutput::Downloaded),
            other => unhandled(Self::NAME, other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::PluginSpec;
    use crate::viewer::{Direction, Viewer};
    use std::cell::Cell;
    use std::io::Read;
    use std::net::TcpListener;
    use std::rc::Rc;
    use std::thread;

    /// Answers one request with `status` and `body`, returns the base URL
    fn serve_once(status: &'static str, body: &'static [u8]) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let head = format!(
                "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            // The client may hang up early on error statuses
            let _ = stream.write_all(head.as_bytes());
            let _ = stream.write_all(body);
            String::from_utf8_lossy(&request).into_owned()
        });
        (base, handle)
    }

    fn direct_client() -> Client {
        Client::builder().no_proxy().build().unwrap()
    }

    struct CountingTransport {
        fetches: Rc<Cell<usize>>,
    }

    impl Transport for CountingTransport {
        fn fetch(&self, _url: &str) -> Result<Vec<u8>, ViewerError> {
            self.fetches.set(self.fetches.get() + 1);
            Ok(b"bytes".to_vec())
        }

        fn save(&self, file_name: &str, _bytes: &[u8]) -> Result<PathBuf, ViewerError> {
            Ok(PathBuf::from(file_name))
        }
    }

    #[test]
    fn file_name_resolution_order() {
        let url = "https://example.com/docs/report.pdf?x=1#p2";
        assert_eq!(resolve_file_name(Some("a.pdf"), Some("b.pdf"), url), "a.pdf");
        assert_eq!(resolve_file_name(None, Some("b.pdf"), url), "b.pdf");
        assert_eq!(resolve_file_name(None, None, url), "report.pdf");
        assert_eq!(resolve_file_name(None, None, "https://example.com/"), "download");
        assert_eq!(resolve_file_name(None, None, "media/clip.mp4?t=3"), "clip.mp4");
    }

    #[test]
    fn missing_url_fails_before_fetching() {
        let fetches = Rc::new(Cell::new(0));
        let plugin = DownloadPlugin::with_transport(
            DownloadOptions::default(),
            CountingTransport {
                fetches: fetches.clone(),
            },
        );
        let mut viewer = Viewer::new(vec![PluginSpec::custom(plugin)], Direction::Vertical);

        let err = viewer
            .execute(Command::Download { file_name: None })
            .unwrap_err();
        assert!(matches!(err, ViewerError::MissingDownloadUrl));
        assert_eq!(fetches.get(), 0);
    }

    #[test]
    fn downloads_local_file_into_target_dir() {
        let source_dir = tempfile::tempdir().unwrap();
        let target_dir = tempfile::tempdir().unwrap();
        let source = source_dir.path().join("scan.png");
        fs::write(&source, b"not really a png").unwrap();

        let options = DownloadOptions {
            url: Some(source.to_string_lossy().into_owned()),
            file_name: None,
            target_dir: Some(target_dir.path().to_path_buf()),
        };
        let mut viewer = Viewer::new(vec![PluginSpec::Download(options)], Direction::Vertical);

        let out = viewer
            .execute(Command::Download { file_name: None })
            .unwrap();
        let expected = target_dir.path().join("scan.png");
        assert_eq!(out, CommandOutput::Downloaded(expected.clone()));
        assert_eq!(fs::read(&expected).unwrap(), b"not really a png");
        // Only the persisted file remains
        assert_eq!(fs::read_dir(target_dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn file_urls_and_unsupported_schemes() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a.txt");
        fs::write(&source, b"hi").unwrap();
        let transport = LocalTransport::new(dir.path());

        let file_url = Url::from_file_path(&source).unwrap();
        assert_eq!(transport.fetch(file_url.as_str()).unwrap(), b"hi");

        let err = transport.fetch("https://example.com/a.txt").unwrap_err();
        assert!(matches!(err, ViewerError::Download { .. }));
    }

    #[test]
    fn downloads_http_url_into_target_dir() {
        let (base, server) = serve_once("200 OK", b"%PDF-1.7 body");
        let target_dir = tempfile::tempdir().unwrap();
        let url = format!("{base}/files/report.pdf?rev=2");
        let plugin = DownloadPlugin::with_transport(
            DownloadOptions::for_url(url),
            HttpTransport::with_client(direct_client(), target_dir.path()),
        );
        let mut viewer = Viewer::new(vec![PluginSpec::custom(plugin)], Direction::Vertical);

        let out = viewer
            .execute(Command::Download { file_name: None })
            .unwrap();
        let expected = target_dir.path().join("report.pdf");
        assert_eq!(out, CommandOutput::Downloaded(expected.clone()));
        assert_eq!(fs::read(&expected).unwrap(), b"%PDF-1.7 body");
        assert!(server.join().unwrap().starts_with("GET /files/report.pdf?rev=2 "));
    }

    #[test]
    fn http_error_status_fails_without_saving() {
        let (base, server) = serve_once("404 Not Found", b"missing");
        let target_dir = tempfile::tempdir().unwrap();
        let transport = HttpTransport::with_client(direct_client(), target_dir.path());

        let err = transport.fetch(&format!("{base}/gone.pdf")).unwrap_err();
        assert!(matches!(err, ViewerError::Download { .. }));
        server.join().unwrap();
        assert_eq!(fs::read_dir(target_dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn http_transport_reads_local_paths() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a.txt");
        fs::write(&source, b"hi").unwrap();
        let transport = HttpTransport::new(dir.path());
        assert_eq!(transport.fetch(&source.to_string_lossy()).unwrap(), b"hi");
    }

    #[test]
    fn save_keeps_only_the_final_name_component() {
        let root = tempfile::tempdir().unwrap();
        let target = root.path().join("target");
        fs::create_dir(&target).unwrap();
        let transport = LocalTransport::new(&target);

        let saved = transport.save("../escape.txt", b"a").unwrap();
        assert_eq!(saved, target.join("escape.txt"));
        assert!(!root.path().join("escape.txt").exists());

        let absolute = root.path().join("abs.txt");
        let saved = transport.save(&absolute.to_string_lossy(), b"b").unwrap();
        assert_eq!(saved, target.join("abs.txt"));
        assert!(!absolute.exists());

        for name in ["..", ".", ""] {
            assert_eq!(transport.save(name, b"c").unwrap(), target.join("download"));
        }
    }
}
