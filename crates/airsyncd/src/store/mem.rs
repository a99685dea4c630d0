//! In-memory config store for tests and bench rigs.

use super::{ConfigStore, SectionSnapshot};
use crate::error::{AgentError, Result};

#[derive(Default)]
pub struct MemStore {
    sections: Vec<SectionSnapshot>,
    loaded: bool,
    /// Counts load/unload pairs so tests can assert scoping.
    pub loads: u32,
    pub unloads: u32,
    pub commits: u32,
    pub fail_commit: bool,
}

impl MemStore {
    pub fn new(sections: Vec<SectionSnapshot>) -> Self {
        Self {
            sections,
            ..Default::default()
        }
    }

    /// One 5 GHz radio on channel 36 carrying a single AP, matching the
    /// mock backend's single-radio fixture.
    pub fn one_radio() -> Self {
        Self::new(vec![
            SectionSnapshot::new("wifi0", "wifi-device")
                .with_option("channel", "36")
                .with_option("disabled", "0")
                .with_option("htmode", "VHT80")
                .with_option("hwmode", "11a"),
            SectionSnapshot::new("home-ap-50", "wifi-iface")
                .with_option("device", "wifi0")
                .with_option("ifname", "home_ap_50")
                .with_option("mode", "ap")
                .with_option("ssid", "backhaul")
                .with_option("encryption", "psk2")
                .with_option("key", "secret"),
        ])
    }

    pub fn push_section(&mut self, section: SectionSnapshot) {
        self.sections.push(section);
    }

    pub fn remove_option(&mut self, section: &str, key: &str) {
        if let Some(s) = self.sections.iter().position(|s| s.name == section) {
            let old = std::mem::replace(
                &mut self.sections[s],
                SectionSnapshot::new("", ""),
            );
            let mut rebuilt = SectionSnapshot::new(&old.name, &old.stype);
            for (k, v) in old.options() {
                if k != key {
                    rebuilt.set(k, v);
                }
            }
            self.sections[s] = rebuilt;
        }
    }
}

impl ConfigStore for MemStore {
    fn load(&mut self) -> Result<()> {
        self.loaded = true;
        self.loads += 1;
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
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        if self.fail_commit {
            return Err(AgentError::Store("commit refused".to_string()));
        }
        self.commits += 1;
        Ok(())
    }

    fn unload(&mut self) {
        self.loaded = false;
        self.unloads += 1;
    }
}
