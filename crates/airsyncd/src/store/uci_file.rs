//! Line-oriented UCI-dialect file store.
//!
//! Understands the subset of the format the agent needs:
//!
//! ```text
//! config wifi-device 'radio0'
//!     option channel '36'
//!     option disabled '0'
//! ```
//!
//! Unnamed sections are skipped with a warning; the agent addresses every
//! section by name.

use super::{ConfigStore, SectionSnapshot};
use crate::error::{AgentError, Result};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

pub struct UciFileStore {
    path: PathBuf,
    sections: Vec<SectionSnapshot>,
    loaded: bool,
    dirty: bool,
}

impl UciFileStore {
    pub fn new(path: &str) -> Self {
        Self {
            path: PathBuf::from(path),
            sections: Vec::new(),
            loaded: false,
            dirty: false,
        }
    }

    fn parse(&mut self, raw: &str) {
        self.sections.clear();
        for (lineno, line) in raw.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut words = line.splitn(3, char::is_whitespace);
            match words.next() {
                Some("config") => {
                    let stype = words.next().unwrap_or("");
                    match words.next().map(unquote) {
                        Some(name) if !name.is_empty() => {
                            self.sections.push(SectionSnapshot::new(name, stype));
                        }
                        _ => warn!(
                            "{}:{}: unnamed {} section skipped",
                            self.path.display(),
                            lineno + 1,
                            stype
                        ),
                    }
                }
                Some("option") | Some("list") => {
                    let key = words.next().unwrap_or("");
                    let value = words.next().map(unquote).unwrap_or("");
                    match self.sections.last_mut() {
                        Some(section) if !key.is_empty() => section.set(key, value),
                        _ => warn!(
                            "{}:{}: option outside a section",
                            self.path.display(),
                            lineno + 1
                        ),
                    }
                }
                Some(other) => {
                    debug!("{}: ignoring '{}' line", self.path.display(), other);
                }
                None => {}
            }
        }
    }

    fn render(&self) -> String {
        let mut out = String::new();
        for section in &self.sections {
            out.push_str(&format!("config {} '{}'\n", section.stype, section.name));
            for (key, value) in section.options() {
                out.push_str(&format!("\toption {} '{}'\n", key, value));
            }
            out.push('\n');
        }
        out
    }
}

fn unquote(s: &str) -> &str {
    s.trim().trim_matches(|c| c == '\'' || c == '"')
}

impl ConfigStore for UciFileStore {
    fn load(&mut self) -> Result<()> {
        let raw = fs::read_to_string(&self.path)
            .map_err(|e| AgentError::Store(format!("{}: {}", self.path.display(), e)))?;
        self.parse(&raw);
        self.loaded = true;
        self.dirty = false;
        Ok(())
    }

    fn section(&self, name: &str) -> Option<SectionSnapshot> {
        if !self.loaded {
            return None;
        }
        self.sections.iter().find(|s| s.name == name).cloned()
    }

    fn sections_of_type(&self, stype: &str) -> Vec<SectionSnapshot> {
        if !self.loaded {
            return Vec::new();
        }
        self.sections
            .iter()
            .filter(|s| s.stype == stype)
            .cloned()
            .collect()
    }

    fn set_options(&mut self, section: &str, options: &[(String, String)]) -> Result<()> {
        let target = self
            .sections
            .iter_mut()
            .find(|s| s.name == section)
            .ok_or_else(|| AgentError::NotFound(format!("section {}", section)))?;
        for (key, value) in options {
            target.set(key, value);
        }
        self.dirty = true;
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        fs::write(&self.path, self.render())
            .map_err(|e| AgentError::Store(format!("{}: {}", self.path.display(), e)))?;
        self.dirty = false;
        Ok(())
    }

    fn unload(&mut self) {
        self.sections.clear();
        self.loaded = false;
        self.dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
config wifi-device 'wifi0'
	option type 'mac80211'
	option channel '36'
	option disabled '0'

config wifi-iface 'home_ap_50'
	option device 'wifi0'
	option ssid 'backhaul'
	option encryption 'psk2'

# trailing comment
config wifi-device
	option channel '1'
"#;

    fn store_with(content: &str) -> (UciFileStore, NamedTempFile) {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        let mut store = UciFileStore::new(file.path().to_str().unwrap());
        store.load().unwrap();
        (store, file)
    }

    #[test]
    fn test_parse_sections() {
        let (store, _file) = store_with(SAMPLE);
        let devices = store.sections_of_type("wifi-device");
        // the unnamed trailing section is dropped
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].get_u32("channel"), Some(36));
        let vif = store.section("home_ap_50").unwrap();
        assert_eq!(vif.stype, "wifi-iface");
        assert_eq!(vif.get("encryption"), Some("psk2"));
    }

    #[test]
    fn test_commit_roundtrip() {
        let (mut store, file) = store_with(SAMPLE);
        store
            .set_options(
                "wifi0",
                &[("channel".to_string(), "149".to_string())],
            )
            .unwrap();
        store.commit().unwrap();
        store.unload();

        let mut reread = UciFileStore::new(file.path().to_str().unwrap());
        reread.load().unwrap();
        assert_eq!(reread.section("wifi0").unwrap().get_u32("channel"), Some(149));
        assert_eq!(
            reread.section("home_ap_50").unwrap().get("ssid"),
            Some("backhaul")
        );
    }

    #[test]
    fn test_set_on_missing_section_fails() {
        let (mut store, _file) = store_with(SAMPLE);
        let err = store
            .set_options("nope", &[("a".to_string(), "b".to_string())])
            .unwrap_err();
        assert!(matches!(err, AgentError::NotFound(_)));
    }

    #[test]
    fn test_missing_file_is_store_error() {
        let mut store = UciFileStore::new("/nonexistent/wireless");
        assert!(matches!(store.load(), Err(AgentError::Store(_))));
    }
}
