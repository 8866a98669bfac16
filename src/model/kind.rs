use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Every kind of row the hub stores.
///
/// The snake_case name doubles as the store key for the kind and as the
/// resource name in the HTTP API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    // Containers
    Account,
    Library,

    // Composition roots
    Program,
    Instrument,
    Template,

    // Program children
    ProgramMeme,
    ProgramVoice,
    ProgramVoiceTrack,
    ProgramSequence,
    ProgramSequenceChord,
    ProgramSequenceChordVoicing,
    ProgramSequenceBinding,
    ProgramSequenceBindingMeme,
    ProgramSequencePattern,
    ProgramSequencePatternEvent,

    // Instrument children
    InstrumentMeme,
    InstrumentAudio,

    // Template children
    TemplateBinding,
}

impl EntityKind {
    pub const ALL: [EntityKind; 18] = [
        EntityKind::Account,
        EntityKind::Library,
        EntityKind::Program,
        EntityKind::Instrument,
        EntityKind::Template,
        EntityKind::ProgramMeme,
        EntityKind::ProgramVoice,
        EntityKind::ProgramVoiceTrack,
        EntityKind::ProgramSequence,
        EntityKind::ProgramSequenceChord,
        EntityKind::ProgramSequenceChordVoicing,
        EntityKind::ProgramSequenceBinding,
        EntityKind::ProgramSequenceBindingMeme,
        EntityKind::ProgramSequencePattern,
        EntityKind::ProgramSequencePatternEvent,
        EntityKind::InstrumentMeme,
        EntityKind::InstrumentAudio,
        EntityKind::TemplateBinding,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Account => "account",
            EntityKind::Library => "library",
            EntityKind::Program => "program",
            EntityKind::Instrument => "instrument",
            EntityKind::Template => "template",
            EntityKind::ProgramMeme => "program_meme",
            EntityKind::ProgramVoice => "program_voice",
            EntityKind::ProgramVoiceTrack => "program_voice_track",
            EntityKind::ProgramSequence => "program_sequence",
            EntityKind::ProgramSequenceChord => "program_sequence_chord",
            EntityKind::ProgramSequenceChordVoicing => "program_sequence_chord_voicing",
            EntityKind::ProgramSequenceBinding => "program_sequence_binding",
            EntityKind::ProgramSequenceBindingMeme => "program_sequence_binding_meme",
            EntityKind::ProgramSequencePattern => "program_sequence_pattern",
            EntityKind::ProgramSequencePatternEvent => "program_sequence_pattern_event",
            EntityKind::InstrumentMeme => "instrument_meme",
            EntityKind::InstrumentAudio => "instrument_audio",
            EntityKind::TemplateBinding => "template_binding",
        }
    }

    /// Name of the foreign-key attribute other rows use to point at this kind
    pub fn fk_column(&self) -> String {
        format!("{}_id", self.as_str())
    }

    /// The kind a row of this kind belongs to, through its `<owner>_id` attribute
    pub fn owner(&self) -> Option<EntityKind> {
        use EntityKind::*;
        match self {
            Account => None,
            Library | Template => Some(Account),
            Program | Instrument => Some(Library),
            ProgramMeme
            | ProgramVoice
            | ProgramVoiceTrack
            | ProgramSequence
            | ProgramSequenceChord
            | ProgramSequenceChordVoicing
            | ProgramSequenceBinding
            | ProgramSequenceBindingMeme
            | ProgramSequencePattern
            | ProgramSequencePatternEvent => Some(Program),
            InstrumentMeme | InstrumentAudio => Some(Instrument),
            TemplateBinding => Some(Template),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // accept both the snake_case key and the plural resource path segment
        let singular = match s {
            "libraries" => "library",
            other => other.strip_suffix('s').unwrap_or(other),
        };
        EntityKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s || kind.as_str() == singular)
            .ok_or_else(|| anyhow::anyhow!("Unknown entity kind '{}'", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names_match_serde() {
        for kind in EntityKind::ALL {
            let json = serde_json::to_value(kind).unwrap();
            assert_eq!(json, serde_json::Value::String(kind.as_str().to_string()));
        }
    }

    #[test]
    fn test_kind_from_path_segment() {
        assert_eq!("programs".parse::<EntityKind>().unwrap(), EntityKind::Program);
        assert_eq!("libraries".parse::<EntityKind>().unwrap(), EntityKind::Library);
        assert_eq!(
            "program_sequence_pattern_event".parse::<EntityKind>().unwrap(),
            EntityKind::ProgramSequencePatternEvent
        );
        assert!("bogus".parse::<EntityKind>().is_err());
    }

    #[test]
    fn test_fk_column() {
        assert_eq!(EntityKind::ProgramVoice.fk_column(), "program_voice_id");
        assert_eq!(EntityKind::Library.fk_column(), "library_id");
    }

    #[test]
    fn test_every_kind_reaches_an_account() {
        for kind in EntityKind::ALL {
            let mut current = kind;
            let mut hops = 0;
            while let Some(owner) = current.owner() {
                current = owner;
                hops += 1;
            }
            assert_eq!(current, EntityKind::Account);
            assert!(hops <= 3, "{} is {} hops from its account", kind, hops);
        }
    }
}
