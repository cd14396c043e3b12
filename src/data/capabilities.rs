use enumflags2::{bitflags, BitFlags};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum_macros::{AsRefStr, Display, EnumString};

/// Features a media player entity can declare
#[bitflags]
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PlayerCapability {
    /// Reports the active source
    Source = 1 << 0,
    /// Reports the name of the app providing playback
    AppName = 1 << 1,
    /// Reports volume
    Volume = 1 << 2,
    VolumeUp = 1 << 3,
    VolumeDown = 1 << 4,
    /// Volume can be set to an absolute level
    VolumeSet = 1 << 5,
    /// Reports mute state
    Mute = 1 << 6,
    /// Mute can be set
    MuteSet = 1 << 7,
    MediaType = 1 << 8,
    MediaTitle = 1 << 9,
    MediaArtist = 1 << 10,
    MediaAlbum = 1 << 11,
    MediaDuration = 1 << 12,
    MediaPosition = 1 << 13,
    /// Provides cover art / station logo
    MediaImage = 1 << 14,
    Play = 1 << 15,
    Pause = 1 << 16,
    Stop = 1 << 17,
    Previous = 1 << 18,
    Next = 1 << 19,
    Seek = 1 << 20,
    Shuffle = 1 << 21,
    TurnOn = 1 << 22,
    TurnOff = 1 << 23,
}

impl PlayerCapability {
    /// Get a list of all capabilities
    pub fn all() -> Vec<PlayerCapability> {
        BitFlags::<PlayerCapability>::all().iter().collect()
    }
}

impl From<PlayerCapability> for String {
    fn from(cap: PlayerCapability) -> Self {
        cap.as_ref().to_string()
    }
}

/// Static set of capabilities attached to a player instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlayerCapabilitySet {
    flags: BitFlags<PlayerCapability>,
}

impl PlayerCapabilitySet {
    pub fn empty() -> Self {
        Self { flags: BitFlags::empty() }
    }

    pub fn all() -> Self {
        Self { flags: BitFlags::all() }
    }

    pub fn from_slice(capabilities: &[PlayerCapability]) -> Self {
        let mut set = Self::empty();
        for cap in capabilities {
            set.add_capability(*cap);
        }
        set
    }

    pub fn has_capability(&self, capability: PlayerCapability) -> bool {
        self.flags.contains(capability)
    }

    /// True if every listed capability is present
    pub fn has_all(&self, capabilities: &[PlayerCapability]) -> bool {
        capabilities.iter().all(|cap| self.has_capability(*cap))
    }

    pub fn add_capability(&mut self, capability: PlayerCapability) {
        self.flags.insert(capability);
    }

    pub fn remove_capability(&mut self, capability: PlayerCapability) {
        self.flags.remove(capability);
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn to_vec(&self) -> Vec<PlayerCapability> {
        self.flags.iter().collect()
    }
}

impl Serialize for PlayerCapabilitySet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_vec().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PlayerCapabilitySet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let caps = Vec::<PlayerCapability>::deserialize(deserializer)?;
        Ok(PlayerCapabilitySet::from_slice(&caps))
    }
}
