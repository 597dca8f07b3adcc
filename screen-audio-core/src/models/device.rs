use serde::{Deserialize, Serialize};

/// Which sources a capture session records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioSource {
    #[default]
    None,
    Microphone,
    SystemAudio,
    Both,
}

impl AudioSource {
    pub fn includes_microphone(&self) -> bool {
        matches!(self, Self::Microphone | Self::Both)
    }

    pub fn includes_system_audio(&self) -> bool {
        matches!(self, Self::SystemAudio | Self::Both)
    }

    /// The native stream kinds this source needs, microphone first.
    pub fn kinds(&self) -> Vec<SourceKind> {
        let mut kinds = Vec::with_capacity(2);
        if self.includes_microphone() {
            kinds.push(SourceKind::Microphone);
        }
        if self.includes_system_audio() {
            kinds.push(SourceKind::SystemAudio);
        }
        kinds
    }
}

/// A single class of native endpoint.
///
/// `SystemAudio` refers to render endpoints opened in loopback mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Microphone,
    SystemAudio,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Microphone => f.write_str("microphone"),
            Self::SystemAudio => f.write_str("system audio"),
        }
    }
}

/// An endpoint available for capture.
///
/// `id` is an opaque backend token. Persist it verbatim, never parse it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioDevice {
    pub id: String,
    pub name: String,
    pub is_default: bool,
}

/// Make sure exactly one device carries the default flag.
///
/// Backends may report several endpoints as default (console and
/// communications roles). The first one wins. When none is flagged the
/// first device is promoted.
pub fn normalize_default(mut devices: Vec<AudioDevice>) -> Vec<AudioDevice> {
    let mut seen = false;
    for device in &mut devices {
        if device.is_default {
            if seen {
                device.is_default = false;
            }
            seen = true;
        }
    }
    if !seen {
        if let Some(first) = devices.first_mut() {
            first.is_default = true;
        }
    }
    devices
}

/// Id of the device flagged as default, if any.
pub fn default_device_id(devices: &[AudioDevice]) -> Option<String> {
    devices.iter().find(|d| d.is_default).map(|d| d.id.clone())
}
