//! systemd `%x` specifier expansion for template instances
//!
//! See: https://www.freedesktop.org/software/systemd/man/systemd.unit.html#Specifiers

use std::cell::OnceCell;
use std::path::{Path, PathBuf};

/// Host facts needed by `%a`, `%l`, `%m` and `%o`
///
/// Lookups are only made when the specifier actually appears in a value.
pub trait HostFacts {
    fn architecture(&self) -> String;
    fn short_hostname(&self) -> String;
    fn machine_id(&self) -> String;
    fn os_id(&self) -> String;
}

/// Host facts read from the running system (files resolved under `root`)
#[derive(Debug)]
pub struct SystemHost {
    root: PathBuf,
    hostname: OnceCell<String>,
    machine_id: OnceCell<String>,
    os_id: OnceCell<String>,
}

impl SystemHost {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            hostname: OnceCell::new(),
            machine_id: OnceCell::new(),
            os_id: OnceCell::new(),
        }
    }

    fn path(&self, absolute: &str) -> PathBuf {
        self.root.join(absolute.trim_start_matches('/'))
    }
}

impl HostFacts for SystemHost {
    fn architecture(&self) -> String {
        normalize_arch(std::env::consts::ARCH).to_string()
    }

    fn short_hostname(&self) -> String {
        self.hostname
            .get_or_init(|| match nix::unistd::gethostname() {
                Ok(name) => short_hostname(&name.to_string_lossy()).to_string(),
                Err(e) => {
                    log::warn!("Failed to read hostname: {}", e);
                    String::new()
                }
            })
            .clone()
    }

    fn machine_id(&self) -> String {
        self.machine_id
            .get_or_init(|| {
                std::fs::read_to_string(self.path("/etc/machine-id"))
                    .map(|s| s.trim().to_string())
                    .unwrap_or_default()
            })
            .clone()
    }

    fn os_id(&self) -> String {
        self.os_id
            .get_or_init(|| {
                ["/etc/os-release", "/usr/lib/os-release"]
                    .iter()
                    .find_map(|p| std::fs::read_to_string(self.path(p)).ok())
                    .and_then(|content| os_release_id(&content))
                    .unwrap_or_default()
            })
            .clone()
    }
}

/// Map toolchain architecture names onto the names systemd reports
pub fn normalize_arch(arch: &str) -> &str {
    match arch {
        "arm64" => "aarch64",
        "amd64" => "x86_64",
        "386" => "x86",
        other => other,
    }
}

fn short_hostname(hostname: &str) -> &str {
    hostname.split('.').next().unwrap_or(hostname)
}

/// Extract `ID=` from os-release content
pub fn os_release_id(content: &str) -> Option<String> {
    content
        .lines()
        .find_map(|line| line.strip_prefix("ID="))
        .map(|id| id.trim().trim_matches(|c| c == '"' || c == '\'').to_string())
}

/// Undo systemd unit-name escaping: `-` becomes `/`, then `\x2d` becomes `-`
pub fn unescape(value: &str) -> String {
    value.replace('-', "/").replace("\\x2d", "-")
}

/// Expands specifiers for one unit instance
pub struct Specifiers<'a> {
    unit_name: &'a str,
    instance: &'a str,
    host: &'a dyn HostFacts,
}

impl<'a> Specifiers<'a> {
    /// `unit_name` is the full instance name, e.g. `app@worker1.service`
    pub fn new(unit_name: &'a str, instance: &'a str, host: &'a dyn HostFacts) -> Self {
        Self {
            unit_name,
            instance,
            host,
        }
    }

    /// Substitute every recognized specifier in a single left-to-right pass.
    ///
    /// Without an instance name the value is returned unchanged. Unknown
    /// specifiers and a trailing lone `%` are kept as written.
    pub fn resolve(&self, value: &str) -> String {
        if self.instance.is_empty() || !value.contains('%') {
            return value.to_string();
        }

        let mut out = String::with_capacity(value.len());
        let mut chars = value.chars();
        while let Some(c) = chars.next() {
            if c != '%' {
                out.push(c);
                continue;
            }
            match chars.next() {
                Some(spec) => match self.expand(spec) {
                    Some(expanded) => out.push_str(&expanded),
                    None => {
                        out.push('%');
                        out.push(spec);
                    }
                },
                None => out.push('%'),
            }
        }
        out
    }

    fn expand(&self, spec: char) -> Option<String> {
        let value = match spec {
            'a' => self.host.architecture(),
            'i' => self.instance.to_string(),
            'I' => unescape(self.instance),
            'l' => self.host.short_hostname(),
            'm' => self.host.machine_id(),
            'n' => self.unit_name.to_string(),
            'N' => self.name_without_suffix().to_string(),
            'o' => self.host.os_id(),
            'p' => self.prefix().to_string(),
            'P' => unescape(self.prefix()),
            '%' => "%".to_string(),
            _ => return None,
        };
        Some(value)
    }

    fn name_without_suffix(&self) -> &str {
        self.unit_name
            .strip_suffix(".service")
            .unwrap_or(self.unit_name)
    }

    fn prefix(&self) -> &str {
        let name = self.name_without_suffix();
        name.split_once('@').map_or(name, |(prefix, _)| prefix)
    }
}

/// Build the instance unit name from a template file name
/// (`app@.service` + `worker1` -> `app@worker1.service`)
pub fn instance_unit_name(template_path: &Path, instance: &str) -> String {
    let file_name = template_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    match file_name.split_once("@.") {
        Some((prefix, suffix)) => format!("{}@{}.{}", prefix, instance, suffix),
        None => file_name.to_string(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::Cell;

    /// Fixed host facts that count how often they were consulted
    #[derive(Default)]
    pub(crate) struct FakeHost {
        pub lookups: Cell<u32>,
    }

    impl HostFacts for FakeHost {
        fn architecture(&self) -> String {
            self.lookups.set(self.lookups.get() + 1);
            "x86_64".into()
        }
        fn short_hostname(&self) -> String {
            self.lookups.set(self.lookups.get() + 1);
            "box".into()
        }
        fn machine_id(&self) -> String {
            self.lookups.set(self.lookups.get() + 1);
            "0123abcd".into()
        }
        fn os_id(&self) -> String {
            self.lookups.set(self.lookups.get() + 1);
            "alpine".into()
        }
    }

    #[test]
    fn test_instance_and_name() {
        let host = FakeHost::default();
        let spec = Specifiers::new("app@worker1.service", "worker1", &host);
        assert_eq!(spec.resolve("--name %i --unit %N"), "--name worker1 --unit app@worker1");
        assert_eq!(spec.resolve("%n"), "app@worker1.service");
        assert_eq!(spec.resolve("%p"), "app");
    }

    #[test]
    fn test_host_specifiers() {
        let host = FakeHost::default();
        let spec = Specifiers::new("app@a.service", "a", &host);
        assert_eq!(spec.resolve("%a %l %m %o"), "x86_64 box 0123abcd alpine");
    }

    #[test]
    fn test_host_lookups_are_lazy() {
        let host = FakeHost::default();
        let spec = Specifiers::new("app@a.service", "a", &host);
        spec.resolve("/srv/%i/data");
        assert_eq!(host.lookups.get(), 0);
        spec.resolve("%m");
        assert_eq!(host.lookups.get(), 1);
    }

    #[test]
    fn test_unescaped_instance() {
        let host = FakeHost::default();
        let spec = Specifiers::new("mount@var-lib\\x2ddata.service", "var-lib\\x2ddata", &host);
        assert_eq!(spec.resolve("%I"), "var/lib-data");
        assert_eq!(spec.resolve("%i"), "var-lib\\x2ddata");
    }

    #[test]
    fn test_unescaped_prefix() {
        let host = FakeHost::default();
        let spec = Specifiers::new("my-app@x.service", "x", &host);
        assert_eq!(spec.resolve("%P"), "my/app");
    }

    #[test]
    fn test_literal_percent() {
        let host = FakeHost::default();
        let spec = Specifiers::new("app@x.service", "x", &host);
        assert_eq!(spec.resolve("100%%"), "100%");
        assert_eq!(spec.resolve("%%i"), "%i");
        assert_eq!(spec.resolve("%%%i%%"), "%x%");
    }

    #[test]
    fn test_unknown_and_trailing_percent_kept() {
        let host = FakeHost::default();
        let spec = Specifiers::new("app@x.service", "x", &host);
        assert_eq!(spec.resolve("%z and %"), "%z and %");
    }

    #[test]
    fn test_no_instance_passes_through() {
        let host = FakeHost::default();
        let spec = Specifiers::new("app.service", "", &host);
        assert_eq!(spec.resolve("%i %n %%"), "%i %n %%");
    }

    #[test]
    fn test_no_percent_is_identity() {
        let host = FakeHost::default();
        let spec = Specifiers::new("app@x.service", "x", &host);
        let value = "/usr/bin/app --flag=1";
        assert_eq!(spec.resolve(value), value);
        assert_eq!(spec.resolve(&spec.resolve(value)), value);
    }

    #[test]
    fn test_normalize_arch() {
        assert_eq!(normalize_arch("arm64"), "aarch64");
        assert_eq!(normalize_arch("amd64"), "x86_64");
        assert_eq!(normalize_arch("386"), "x86");
        assert_eq!(normalize_arch("riscv64"), "riscv64");
    }

    #[test]
    fn test_os_release_id() {
        let content = "NAME=\"Alpine Linux\"\nID=alpine\nVERSION_ID=3.20.0\n";
        assert_eq!(os_release_id(content), Some("alpine".into()));
        assert_eq!(os_release_id("ID=\"void\"\n"), Some("void".into()));
        assert_eq!(os_release_id("NAME=x\n"), None);
    }

    #[test]
    fn test_short_hostname() {
        assert_eq!(short_hostname("web1.example.com"), "web1");
        assert_eq!(short_hostname("web1"), "web1");
    }

    #[test]
    fn test_instance_unit_name() {
        assert_eq!(
            instance_unit_name(Path::new("/lib/systemd/system/app@.service"), "worker1"),
            "app@worker1.service"
        );
        assert_eq!(
            instance_unit_name(Path::new("/etc/systemd/system/plain.service"), "x"),
            "plain.service"
        );
    }

    #[test]
    fn test_system_host_reads_files_under_root() {
        let dir = std::env::temp_dir().join(format!("sysrc-host-{}", std::process::id()));
        std::fs::create_dir_all(dir.join("etc")).unwrap();
        std::fs::write(dir.join("etc/machine-id"), "feedface\n").unwrap();
        std::fs::write(dir.join("etc/os-release"), "ID=alpine\n").unwrap();

        let host = SystemHost::new(&dir);
        assert_eq!(host.machine_id(), "feedface");
        assert_eq!(host.os_id(), "alpine");

        let empty = SystemHost::new(dir.join("missing"));
        assert_eq!(empty.machine_id(), "");
        assert_eq!(empty.os_id(), "");
        let _ = std::fs::remove_dir_all(&dir);
    }
}
