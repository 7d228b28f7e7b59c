//! INI-style unit file parser
//!
//! Scans unit files line by line into a [`ServiceConfig`]. Keys are
//! dispatched on the (section, key) pair; anything unrecognized is skipped.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use tokio::io::{AsyncBufReadExt, BufReader};

use super::service::{ServiceConfig, ServiceType};
use super::specifiers::Specifiers;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("failed to open service file {}: {source}", path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("error reading service file {} at line {line}: {source}", path.display())]
    Read {
        path: PathBuf,
        line: usize,
        source: std::io::Error,
    },
}

/// Section a line belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    /// Before the first header
    None,
    Unit,
    Service,
    Install,
    Other,
}

impl Section {
    fn from_header(name: &str) -> Self {
        match name.trim() {
            "Unit" => Self::Unit,
            "Service" => Self::Service,
            "Install" => Self::Install,
            _ => Self::Other,
        }
    }
}

/// Accumulates lines from a unit file and its drop-ins
pub struct UnitParser<'a> {
    config: ServiceConfig,
    section: Section,
    specifiers: Option<&'a Specifiers<'a>>,
}

impl<'a> UnitParser<'a> {
    /// Values are passed through `specifiers` before they are stored
    pub fn new(source_path: impl Into<PathBuf>, specifiers: Option<&'a Specifiers<'a>>) -> Self {
        Self {
            config: ServiceConfig::new(source_path),
            section: Section::None,
            specifiers,
        }
    }

    /// Feed one file. Each file starts outside any section.
    pub async fn feed_file(&mut self, path: &Path) -> Result<(), ParseError> {
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|source| ParseError::Open {
                path: path.to_path_buf(),
                source,
            })?;

        self.section = Section::None;
        let mut reader = BufReader::new(file);
        let mut buf = Vec::new();
        let mut line_no = 0;
        loop {
            buf.clear();
            line_no += 1;
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => return Ok(()),
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf);
                    if let Cow::Owned(_) = line {
                        log::warn!(
                            "{}:{} is not valid UTF-8, reading it lossily",
                            path.display(),
                            line_no
                        );
                    }
                    self.feed_line(&line);
                }
                Err(source) => {
                    return Err(ParseError::Read {
                        path: path.to_path_buf(),
                        line: line_no,
                        source,
                    })
                }
            }
        }
    }

    /// Feed in-memory content
    pub fn feed_str(&mut self, content: &str) {
        self.section = Section::None;
        for line in content.lines() {
            self.feed_line(line);
        }
    }

    fn feed_line(&mut self, raw: &str) {
        let line = raw.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            return;
        }

        if line.starts_with('[') && line.ends_with(']') {
            self.section = Section::from_header(&line[1..line.len() - 1]);
            return;
        }

        let Some((key, value)) = line.split_once('=') else {
            log::debug!("Ignoring line without '=': {}", line);
            return;
        };

        let key = key.trim();
        let value = value.trim();
        let value = match self.specifiers {
            Some(specifiers) => specifiers.resolve(value),
            None => value.to_string(),
        };

        apply(&mut self.config, self.section, key, value);
    }

    pub fn finish(self) -> ServiceConfig {
        self.config
    }
}

/// Parse unit file content that is already in memory (no specifier expansion)
pub fn parse_service_str(content: &str, source_path: impl Into<PathBuf>) -> ServiceConfig {
    let mut parser = UnitParser::new(source_path, None);
    parser.feed_str(content);
    parser.finish()
}

/// Store one setting. Repeated list keys accumulate; an empty value resets them.
fn apply(config: &mut ServiceConfig, section: Section, key: &str, value: String) {
    match (section, key) {
        (Section::Unit, "Description") => config.description = non_empty(value),
        (Section::Unit, "Documentation") => extend_words(&mut config.documentation, &value),

        (Section::Service, "User") => config.user = non_empty(value),
        (Section::Service, "Group") => config.group = non_empty(value),
        (Section::Service, "WorkingDirectory") => config.working_directory = non_empty(value),
        (Section::Service, "EnvironmentFile") => {
            // A leading '-' only marks the file as optional
            let path = value.strip_prefix('-').unwrap_or(&value);
            config.environment_file = non_empty(path.to_string());
        }
        (Section::Service, "Environment") => {
            push_or_reset(&mut config.environment, &value, |v| unquote(v).to_string())
        }
        (Section::Service, "ExecStartPre") => {
            push_or_reset(&mut config.exec_start_pre, &value, str::to_string)
        }
        (Section::Service, "ExecStart") => config.exec_start = non_empty(value),
        (Section::Service, "ExecStartPost") => {
            push_or_reset(&mut config.exec_start_post, &value, str::to_string)
        }
        (Section::Service, "ExecStop") => config.exec_stop = non_empty(value),
        (Section::Service, "ExecStopPost") => {
            push_or_reset(&mut config.exec_stop_post, &value, str::to_string)
        }
        (Section::Service, "ExecReload") => {
            push_or_reset(&mut config.exec_reload, &value, str::to_string)
        }
        (Section::Service, "PIDFile") => config.pid_file = non_empty(value),
        (Section::Service, "Restart") => config.restart = non_empty(value),
        (Section::Service, "RestartSec") => config.restart_sec = non_empty(value),
        (Section::Service, "AmbientCapabilities") => {
            extend_words(&mut config.ambient_capabilities, &value)
        }
        (Section::Service, "Type") => {
            config.service_type = ServiceType::parse(&value);
            if config.service_type.is_none() && !value.is_empty() {
                log::warn!(
                    "Unknown Type={} in {}, treating as unset",
                    value,
                    config.source_path.display()
                );
            }
        }

        (Section::Install, "WantedBy") => extend_words(&mut config.wanted_by, &value),

        _ => {}
    }
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

fn push_or_reset(list: &mut Vec<String>, value: &str, convert: impl Fn(&str) -> String) {
    if value.is_empty() {
        list.clear();
    } else {
        list.push(convert(value));
    }
}

fn extend_words(list: &mut Vec<String>, value: &str) {
    if value.is_empty() {
        list.clear();
    } else {
        list.extend(value.split_whitespace().map(str::to_string));
    }
}

/// Remove one layer of double quotes wrapping the whole value
pub fn unquote(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::specifiers::tests::FakeHost;

    #[test]
    fn test_parse_simple_service() {
        let content = r#"
[Unit]
Description=Test Service
After=network.target

[Service]
Type=simple
ExecStart=/usr/bin/test --flag
User=nobody
Group=nogroup
WorkingDirectory=/var/lib/test

[Install]
WantedBy=multi-user.target
"#;
        let config = parse_service_str(content, "/etc/systemd/system/test.service");

        assert_eq!(config.description.as_deref(), Some("Test Service"));
        assert_eq!(config.service_type, Some(ServiceType::Simple));
        assert_eq!(config.exec_start.as_deref(), Some("/usr/bin/test --flag"));
        assert_eq!(config.user.as_deref(), Some("nobody"));
        assert_eq!(config.group.as_deref(), Some("nogroup"));
        assert_eq!(config.working_directory.as_deref(), Some("/var/lib/test"));
        assert_eq!(config.wanted_by, vec!["multi-user.target"]);
    }

    #[test]
    fn test_empty_file() {
        let config = parse_service_str("", "x.service");
        assert_eq!(config, ServiceConfig::new("x.service"));
    }

    #[test]
    fn test_comments_and_blank_lines() {
        let content = "# comment\n; another\n\n[Service]\n# ExecStart=/bin/false\nExecStart=/bin/true\n";
        let config = parse_service_str(content, "x.service");
        assert_eq!(config.exec_start.as_deref(), Some("/bin/true"));
    }

    #[test]
    fn test_lines_without_equals_are_ignored() {
        let content = "[Service]\nthis is garbage\nExecStart=/bin/true\n";
        let config = parse_service_str(content, "x.service");
        assert_eq!(config.exec_start.as_deref(), Some("/bin/true"));
    }

    #[test]
    fn test_keys_are_scoped_by_section() {
        let content = r#"
Description=Before any section
[Service]
Description=Wrong section
ExecStart=/bin/true
[Unit]
User=root
"#;
        let config = parse_service_str(content, "x.service");
        assert!(config.description.is_none());
        assert!(config.user.is_none());
    }

    #[test]
    fn test_unknown_section_and_keys_ignored() {
        let content = "[X-Custom]\nExecStart=/bin/false\n[Service]\nMemoryMax=1G\nExecStart=/bin/true\n";
        let config = parse_service_str(content, "x.service");
        assert_eq!(config.exec_start.as_deref(), Some("/bin/true"));
    }

    #[test]
    fn test_whitespace_handling() {
        let content = "[Unit]\n   Description   =   Test Service   \n";
        let config = parse_service_str(content, "x.service");
        assert_eq!(config.description.as_deref(), Some("Test Service"));
    }

    #[test]
    fn test_value_with_equals() {
        let content = "[Service]\nEnvironment=FOO=bar=baz\n";
        let config = parse_service_str(content, "x.service");
        assert_eq!(config.environment, vec!["FOO=bar=baz"]);
    }

    #[test]
    fn test_environment_accumulates_in_order() {
        let content = r#"
[Service]
Environment=B=2
Environment="A=hello world"
Environment=B=3
"#;
        let config = parse_service_str(content, "x.service");
        assert_eq!(config.environment, vec!["B=2", "A=hello world", "B=3"]);
    }

    #[test]
    fn test_environment_mismatched_quotes_kept() {
        let content = "[Service]\nEnvironment=\"A=1\nEnvironment=B=2\"\nEnvironment=\"\n";
        let config = parse_service_str(content, "x.service");
        assert_eq!(config.environment, vec!["\"A=1", "B=2\"", "\""]);
    }

    #[test]
    fn test_environment_file_optional_marker() {
        let content = "[Service]\nEnvironmentFile=-/etc/default/app\n";
        let config = parse_service_str(content, "x.service");
        assert_eq!(config.environment_file.as_deref(), Some("/etc/default/app"));

        let content = "[Service]\nEnvironmentFile=/etc/conf.d/app\n";
        let config = parse_service_str(content, "x.service");
        assert_eq!(config.environment_file.as_deref(), Some("/etc/conf.d/app"));
    }

    #[test]
    fn test_repeated_exec_start_pre() {
        let content = r#"
[Service]
ExecStartPre=/bin/echo one
ExecStartPre=-/bin/echo two
ExecStartPre=/bin/echo three
"#;
        let config = parse_service_str(content, "x.service");
        assert_eq!(
            config.exec_start_pre,
            vec!["/bin/echo one", "-/bin/echo two", "/bin/echo three"]
        );
    }

    #[test]
    fn test_empty_value_resets_list() {
        let content = "[Service]\nExecStartPre=/bin/a\nExecStartPre=\nExecStartPre=/bin/b\n";
        let config = parse_service_str(content, "x.service");
        assert_eq!(config.exec_start_pre, vec!["/bin/b"]);
    }

    #[test]
    fn test_empty_exec_start() {
        let content = "[Service]\nExecStart=\n";
        let config = parse_service_str(content, "x.service");
        assert!(config.exec_start.is_none());
    }

    #[test]
    fn test_last_exec_start_wins() {
        let content = "[Service]\nExecStart=/bin/a\nExecStart=/bin/b\n";
        let config = parse_service_str(content, "x.service");
        assert_eq!(config.exec_start.as_deref(), Some("/bin/b"));
    }

    #[test]
    fn test_capabilities_and_hooks() {
        let content = r#"
[Service]
AmbientCapabilities=CAP_NET_BIND_SERVICE CAP_SYS_TIME
ExecStartPost=/bin/post
ExecReload=/bin/kill -HUP $MAINPID
ExecStop=/bin/stop
ExecStopPost=-/bin/cleanup
PIDFile=/run/app.pid
Restart=on-failure
RestartSec=5s
"#;
        let config = parse_service_str(content, "x.service");
        assert_eq!(
            config.ambient_capabilities,
            vec!["CAP_NET_BIND_SERVICE", "CAP_SYS_TIME"]
        );
        assert_eq!(config.exec_start_post, vec!["/bin/post"]);
        assert_eq!(config.exec_reload, vec!["/bin/kill -HUP $MAINPID"]);
        assert_eq!(config.exec_stop.as_deref(), Some("/bin/stop"));
        assert_eq!(config.exec_stop_post, vec!["-/bin/cleanup"]);
        assert_eq!(config.pid_file.as_deref(), Some("/run/app.pid"));
        assert_eq!(config.restart.as_deref(), Some("on-failure"));
        assert_eq!(config.restart_sec.as_deref(), Some("5s"));
    }

    #[test]
    fn test_unknown_type_is_unset() {
        let content = "[Service]\nType=bogus\n";
        let config = parse_service_str(content, "x.service");
        assert!(config.service_type.is_none());
    }

    #[test]
    fn test_percent_specifiers_preserved_without_instance() {
        let content = "[Service]\nExecStart=/usr/bin/test %n %i %%\n";
        let config = parse_service_str(content, "x.service");
        assert_eq!(config.exec_start.as_deref(), Some("/usr/bin/test %n %i %%"));
    }

    #[test]
    fn test_specifiers_applied_to_values() {
        let host = FakeHost::default();
        let specifiers = Specifiers::new("app@worker1.service", "worker1", &host);
        let mut parser = UnitParser::new("app@.service", Some(&specifiers));
        parser.feed_str(
            "[Unit]\nDescription=App %i\n[Service]\nExecStart=/usr/bin/app --id %i --unit %N\n",
        );
        let config = parser.finish();
        assert_eq!(config.description.as_deref(), Some("App worker1"));
        assert_eq!(
            config.exec_start.as_deref(),
            Some("/usr/bin/app --id worker1 --unit app@worker1")
        );
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("\"A=1\""), "A=1");
        assert_eq!(unquote("\"\"A=1\"\""), "\"A=1\"");
        assert_eq!(unquote("A=1"), "A=1");
        assert_eq!(unquote("\""), "\"");
    }

    #[tokio::test]
    async fn test_feed_file_missing() {
        let mut parser = UnitParser::new("/nonexistent/x.service", None);
        let err = parser
            .feed_file(Path::new("/nonexistent/x.service"))
            .await
            .unwrap_err();
        assert!(matches!(err, ParseError::Open { .. }));
    }

    #[tokio::test]
    async fn test_feed_file_tolerates_invalid_utf8() {
        let dir = crate::testing::TestDir::new("parser");
        let path = dir.join("latin1.service");
        std::fs::write(
            &path,
            b"# caf\xe9\n[Unit]\nDescription=Caf\xe9 daemon\n[Service]\nExecStart=/usr/bin/app\n",
        )
        .unwrap();

        let mut parser = UnitParser::new(&path, None);
        parser.feed_file(&path).await.unwrap();
        let config = parser.finish();
        assert_eq!(config.exec_start.as_deref(), Some("/usr/bin/app"));
        assert_eq!(config.description.as_deref(), Some("Caf\u{FFFD} daemon"));
    }

    #[tokio::test]
    async fn test_feed_file_read_error() {
        // Opening a directory succeeds; reading from it fails
        let dir = crate::testing::TestDir::new("parser");
        let mut parser = UnitParser::new(dir.path(), None);
        let err = parser.feed_file(dir.path()).await.unwrap_err();
        assert!(matches!(err, ParseError::Read { line: 1, .. }));
    }
}
