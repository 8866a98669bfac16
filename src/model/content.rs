use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::model::{EntityKind, Id, Row};

/// A typed record that maps onto a generic [`Row`] of one kind
pub trait Entity: Serialize + DeserializeOwned {
    const KIND: EntityKind;

    fn id(&self) -> &Id;

    fn to_row(&self) -> Result<Row> {
        let value = serde_json::to_value(self)
            .with_context(|| format!("Failed to serialize {}", Self::KIND))?;
        Row::from_flat_json(value)
    }

    fn from_row(row: &Row) -> Result<Self> {
        serde_json::from_value(row.to_flat_json())
            .with_context(|| format!("Row {} is not a valid {}", row.id, Self::KIND))
    }
}

macro_rules! impl_entity {
    ($($ty:ident => $kind:ident),* $(,)?) => {
        $(
            impl Entity for $ty {
                const KIND: EntityKind = EntityKind::$kind;

                fn id(&self) -> &Id {
                    &self.id
                }
            }
        )*
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgramType {
    Main,
    Macro,
    Beat,
    Detail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgramState {
    Draft,
    Published,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstrumentType {
    Drum,
    Bass,
    Pad,
    Sticky,
    Stripe,
    Stab,
    Hook,
    Percussion,
    Transition,
    Background,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstrumentMode {
    Event,
    Chord,
    Loop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgramSequencePatternType {
    Intro,
    Loop,
    Outro,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstrumentState {
    Draft,
    Published,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemplateType {
    Preview,
    Production,
}

/// What a template binding points at (outside the template's own graph)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentBindingType {
    Library,
    Program,
    Instrument,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: Id,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Library {
    pub id: Id,
    pub account_id: Id,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub id: Id,
    pub library_id: Id,
    pub r#type: ProgramType,
    pub state: ProgramState,
    pub name: String,
    pub key: String,
    pub tempo: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub density: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramMeme {
    pub id: Id,
    pub program_id: Id,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramVoice {
    pub id: Id,
    pub program_id: Id,
    pub r#type: InstrumentType,
    pub name: String,
    #[serde(default)]
    pub order: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramVoiceTrack {
    pub id: Id,
    pub program_id: Id,
    pub program_voice_id: Id,
    pub name: String,
    #[serde(default)]
    pub order: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramSequence {
    pub id: Id,
    pub program_id: Id,
    pub name: String,
    pub key: String,
    pub density: f64,
    pub total: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramSequenceChord {
    pub id: Id,
    pub program_id: Id,
    pub program_sequence_id: Id,
    pub name: String,
    pub position: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramSequenceChordVoicing {
    pub id: Id,
    pub program_id: Id,
    pub program_sequence_chord_id: Id,
    pub program_voice_id: Id,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramSequenceBinding {
    pub id: Id,
    pub program_id: Id,
    pub program_sequence_id: Id,
    pub offset: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramSequenceBindingMeme {
    pub id: Id,
    pub program_id: Id,
    pub program_sequence_binding_id: Id,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramSequencePattern {
    pub id: Id,
    pub program_id: Id,
    pub program_sequence_id: Id,
    pub program_voice_id: Id,
    pub r#type: ProgramSequencePatternType,
    pub name: String,
    pub total: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramSequencePatternEvent {
    pub id: Id,
    pub program_id: Id,
    pub program_sequence_pattern_id: Id,
    pub program_voice_track_id: Id,
    pub position: f64,
    pub duration: f64,
    pub tones: String,
    pub velocity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    pub id: Id,
    pub library_id: Id,
    pub r#type: InstrumentType,
    pub mode: InstrumentMode,
    pub state: InstrumentState,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub density: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentMeme {
    pub id: Id,
    pub instrument_id: Id,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentAudio {
    pub id: Id,
    pub instrument_id: Id,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waveform_key: Option<String>,
    pub transient_seconds: f64,
    pub loop_beats: f64,
    pub tempo: f64,
    pub intensity: f64,
    pub event: String,
    pub tones: String,
    pub volume: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: Id,
    pub account_id: Id,
    pub name: String,
    pub ship_key: String,
    pub r#type: TemplateType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateBinding {
    pub id: Id,
    pub template_id: Id,
    pub r#type: ContentBindingType,
    pub target_id: Id,
}

impl_entity! {
    Account => Account,
    Library => Library,
    Program => Program,
    ProgramMeme => ProgramMeme,
    ProgramVoice => ProgramVoice,
    ProgramVoiceTrack => ProgramVoiceTrack,
    ProgramSequence => ProgramSequence,
    ProgramSequenceChord => ProgramSequenceChord,
    ProgramSequenceChordVoicing => ProgramSequenceChordVoicing,
    ProgramSequenceBinding => ProgramSequenceBinding,
    ProgramSequenceBindingMeme => ProgramSequenceBindingMeme,
    ProgramSequencePattern => ProgramSequencePattern,
    ProgramSequencePatternEvent => ProgramSequencePatternEvent,
    Instrument => Instrument,
    InstrumentMeme => InstrumentMeme,
    InstrumentAudio => InstrumentAudio,
    Template => Template,
    TemplateBinding => TemplateBinding,
}
