use super::Result;
use std::{
    collections::HashSet,
    env, fmt,
    path::{Path, PathBuf},
    str::FromStr,
    sync::{Mutex, OnceLock},
};
use url::Url;

/// Strips credentials, query and fragment so URLs are safe to log.
fn redact_url(u: &Url) -> String {
    let mut redacted = u.clone();
    let _ = redacted.set_username("");
    let _ = redacted.set_password(None);
    redacted.set_query(None);
    redacted.set_fragment(None);
    redacted.to_string()
}

#[derive(Clone)]
pub enum Remote {
    Http(Url),
    S3(Url),
    Gcs(Url),
}

impl Remote {
    pub fn url(&self) -> &Url {
        match self {
            Remote::Http(u) | Remote::S3(u) | Remote::Gcs(u) => u,
        }
    }

    fn origin(&self) -> String {
        let url = self.url();
        let scheme = match self {
            Remote::Http(u) => u.scheme(),
            Remote::S3(_) => "s3",
            Remote::Gcs(_) => "gs",
        };
        let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
        match url.port() {
            Some(port) => format!("{}://{}:{}", scheme, host, port),
            None => format!("{}://{}", scheme, host),
        }
    }
}

impl fmt::Display for Remote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", redact_url(self.url()))
    }
}

/// An alignment file given either as a local path or as a URL htslib can stream.
#[derive(Clone)]
pub enum InputSource {
    Local(PathBuf),
    Remote(Remote),
}

impl FromStr for InputSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self> {
        if let Ok(mut url) = Url::parse(s) {
            match url.scheme() {
                "file" => {
                    let p = url
                        .to_file_path()
                        .map_err(|_| "Bad file:// URL".to_string())?;
                    return InputSource::local(&p);
                }
                "http" | "https" => return Ok(InputSource::Remote(Remote::Http(url))),
                "s3" => return Ok(InputSource::Remote(Remote::S3(url))),
                "gs" | "gcs" => {
                    let _ = url.set_scheme("gs");
                    return Ok(InputSource::Remote(Remote::Gcs(url)));
                }
                _ => {}
            }
        }
        InputSource::local(Path::new(s))
    }
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputSource::Local(p) => write!(f, "{}", p.display()),
            InputSource::Remote(r) => write!(f, "{}", r),
        }
    }
}

impl fmt::Debug for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputSource::Local(p) => f.debug_tuple("Local").field(p).finish(),
            InputSource::Remote(r) => f.debug_tuple("Remote").field(&r.to_string()).finish(),
        }
    }
}

static CHECKED_ORIGINS: OnceLock<Mutex<HashSet<String>>> = OnceLock::new();

impl InputSource {
    fn local(p: &Path) -> Result<Self> {
        if p.exists() {
            Ok(InputSource::Local(p.to_path_buf()))
        } else {
            Err(format!("File does not exist: {}", p.display()))
        }
    }

    /// Use this when wrapping errors from htslib that might leak URLs
    pub fn format_error(&self, context: &str, error: impl fmt::Display) -> String {
        let error_str = error.to_string();
        let error_str = match self {
            InputSource::Remote(r) => error_str.replace(r.url().as_str(), &r.to_string()),
            InputSource::Local(_) => error_str,
        };
        format!("{} {}: {}", context, self, error_str)
    }

    /// Warns once per remote origin about missing credentials.
    pub fn preflight_checks(&self) -> Result<()> {
        let InputSource::Remote(r) = self else {
            return Ok(());
        };
        let origin = r.origin();
        let checked = CHECKED_ORIGINS.get_or_init(|| Mutex::new(HashSet::new()));
        let mut guard = checked.lock().unwrap_or_else(|p| p.into_inner());
        if !guard.insert(origin.clone()) {
            return Ok(());
        }

        match r {
            Remote::Http(_) => {}
            Remote::S3(_) => {
                let s3_vars = ["AWS_ACCESS_KEY_ID", "AWS_PROFILE", "AWS_SHARED_CREDENTIALS_FILE"];
                if s3_vars.iter().all(|&v| env::var_os(v).is_none()) {
                    log::warn!(
                        "[S3 auth] {origin}: No AWS credentials configured; only public buckets can be read"
                    );
                }
            }
            Remote::Gcs(_) => {
                if env::var_os("GOOGLE_APPLICATION_CREDENTIALS").is_none() {
                    log::warn!(
                        "[GCS auth] {origin}: GOOGLE_APPLICATION_CREDENTIALS is not set; only public objects can be read"
                    );
                }
            }
        }
        Ok(())
    }
}

pub trait PreflightExt {
    fn preflight_ext(&self) -> Result<()>;
}

impl PreflightExt for InputSource {
    #[inline]
    fn preflight_ext(&self) -> Result<()> {
        self.preflight_checks()
    }
}

impl PreflightExt for Option<InputSource> {
    #[inline]
    fn preflight_ext(&self) -> Result<()> {
        if let Some(inner) = self {
            inner.preflight_checks()?;
        }
        Ok(())
    }
}

#[macro_export]
macro_rules! preflight_fields {
    ($args:expr, $($field:ident),+ $(,)?) => {{
        use $crate::utils::input_source::PreflightExt as _;
        $( ($args).$field.preflight_ext()?; )+
        Ok::<(), std::string::String>(())
    }};
}
