//! 802.11 information element walker.
//!
//! Scan results carry the raw IE blob from the beacon or probe response.
//! Elements are id/len/payload triples; a truncated element terminates the
//! walk without panicking.

const IE_SSID: u8 = 0;
const IE_DS_PARAMS: u8 = 3;

/// Iterates over well-formed elements, stopping at the first truncation.
pub struct ElementIter<'a> {
    buf: &'a [u8],
}

impl<'a> ElementIter<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }
}

impl<'a> Iterator for ElementIter<'a> {
    type Item = (u8, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        if self.buf.len() < 2 {
            return None;
        }
        let id = self.buf[0];
        let len = self.buf[1] as usize;
        if self.buf.len() < 2 + len {
            return None;
        }
        let payload = &self.buf[2..2 + len];
        self.buf = &self.buf[2 + len..];
        Some((id, payload))
    }
}

/// SSID element, if present and valid UTF-8. A zero-length SSID (hidden
/// network) yields `None`.
pub fn ssid(ies: &[u8]) -> Option<String> {
    ElementIter::new(ies)
        .find(|(id, _)| *id == IE_SSID)
        .and_then(|(_, data)| {
            if data.is_empty() || data.len() > 32 {
                None
            } else {
                std::str::from_utf8(data).ok().map(str::to_string)
            }
        })
}

/// Serving channel from the DS Parameter Set element.
pub fn ds_channel(ies: &[u8]) -> Option<u32> {
    ElementIter::new(ies)
        .find(|(id, data)| *id == IE_DS_PARAMS && data.len() == 1)
        .map(|(_, data)| data[0] as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_ssid_and_channel() {
        // SSID "ap", DS channel 11
        let ies = [0x00, 0x02, b'a', b'p', 0x03, 0x01, 11];
        assert_eq!(ssid(&ies), Some("ap".to_string()));
        assert_eq!(ds_channel(&ies), Some(11));
    }

    #[test]
    fn test_hidden_ssid_is_none() {
        let ies = [0x00, 0x00, 0x03, 0x01, 6];
        assert_eq!(ssid(&ies), None);
        assert_eq!(ds_channel(&ies), Some(6));
    }

    #[test]
    fn test_truncated_element_stops_walk() {
        // claims 10 payload bytes, provides 2
        let ies = [0x00, 0x0a, b'x', b'y'];
        assert_eq!(ssid(&ies), None);
        assert_eq!(ElementIter::new(&ies).count(), 0);

        // truncated header
        assert_eq!(ElementIter::new(&[0x03]).count(), 0);
        assert_eq!(ElementIter::new(&[]).count(), 0);
    }

    #[test]
    fn test_skips_unknown_elements() {
        // vendor element, then SSID
        let ies = [0xdd, 0x03, 1, 2, 3, 0x00, 0x01, b'z'];
        assert_eq!(ssid(&ies), Some("z".to_string()));
    }
}
