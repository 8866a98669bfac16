use crate::model::{
    Account, ContentBindingType, Entity, EntityKind, Id, Instrument, InstrumentAudio, InstrumentMeme,
    InstrumentMode, InstrumentState, InstrumentType, Library, Program, ProgramMeme,
    ProgramSequence, ProgramSequenceBinding, ProgramSequenceBindingMeme, ProgramSequenceChord,
    ProgramSequenceChordVoicing, ProgramSequencePattern, ProgramSequencePatternEvent,
    ProgramSequencePatternType, ProgramState, ProgramType, ProgramVoice, ProgramVoiceTrack, Template, TemplateBinding,
    TemplateType,
};
use crate::store::{EntityStore, StoreTransaction};
use anyhow::{Context, Result};

pub const ACCOUNT_TESTING: &str = "acct-testing";
pub const ACCOUNT_BANANAS: &str = "acct-bananas";
pub const LIBRARY_LEAVES: &str = "lib-leaves";
pub const LIBRARY_GARBAGE: &str = "lib-garbage";
pub const LIBRARY_HOUSE: &str = "lib-house";
pub const PROGRAM_LEAVES: &str = "prog-leaves";
pub const PROGRAM_COCONUTS: &str = "prog-coconuts";
pub const INSTRUMENT_808: &str = "instr-808";
pub const TEMPLATE_LOFI: &str = "tmpl-lofi";

async fn put<E: Entity>(tx: &mut dyn StoreTransaction, entity: E) -> Result<Id> {
    let row = entity.to_row()?;
    tx.insert_row(E::KIND, row).await
}

/// Load the demo content graph in one transaction; a no-op when it is already present
pub async fn load_seed_data<S: EntityStore>(store: &S) -> Result<()> {
    let mut tx = store.begin().await?;

    if tx
        .fetch_row(EntityKind::Account, &ACCOUNT_TESTING.to_string())
        .await?
        .is_some()
    {
        log::info!("Seed data already present, skipping");
        return Ok(());
    }

    load_accounts(tx.as_mut()).await?;
    load_leaves_program(tx.as_mut()).await?;
    load_coconuts_program(tx.as_mut()).await?;
    load_instruments(tx.as_mut()).await?;
    load_templates(tx.as_mut()).await?;

    tx.commit().await.context("Failed to commit seed data")?;
    log::info!("Seed data loaded");
    Ok(())
}

async fn load_accounts(tx: &mut dyn StoreTransaction) -> Result<()> {
    put(
        tx,
        Account {
            id: ACCOUNT_TESTING.to_string(),
            name: "testing".to_string(),
        },
    )
    .await?;
    put(
        tx,
        Account {
            id: ACCOUNT_BANANAS.to_string(),
            name: "bananas".to_string(),
        },
    )
    .await?;

    for (id, account_id, name) in [
        (LIBRARY_LEAVES, ACCOUNT_TESTING, "leaves"),
        (LIBRARY_GARBAGE, ACCOUNT_TESTING, "Garbage Library"),
        (LIBRARY_HOUSE, ACCOUNT_BANANAS, "house"),
    ] {
        put(
            tx,
            Library {
                id: id.to_string(),
                account_id: account_id.to_string(),
                name: name.to_string(),
            },
        )
        .await?;
    }
    Ok(())
}

/// Main program with a bound, chorded and patterned sequence
async fn load_leaves_program(tx: &mut dyn StoreTransaction) -> Result<()> {
    let program_id = PROGRAM_LEAVES.to_string();
    put(
        tx,
        Program {
            id: program_id.clone(),
            library_id: LIBRARY_LEAVES.to_string(),
            r#type: ProgramType::Main,
            state: ProgramState::Published,
            name: "leaves".to_string(),
            key: "C#".to_string(),
            tempo: 120.4,
            density: Some(0.6),
            config: None,
        },
    )
    .await?;

    put(
        tx,
        ProgramMeme {
            id: "leaves-meme-ants".to_string(),
            program_id: program_id.clone(),
            name: "Ants".to_string(),
        },
    )
    .await?;

    let voice_id = put(
        tx,
        ProgramVoice {
            id: "leaves-voice-drums".to_string(),
            program_id: program_id.clone(),
            r#type: InstrumentType::Drum,
            name: "Drums".to_string(),
            order: 1.0,
        },
    )
    .await?;

    let mut tracks = Vec::new();
    for (n, name) in ["BOOM", "SMACK"].into_iter().enumerate() {
        let id = put(
            tx,
            ProgramVoiceTrack {
                id: format!("leaves-track-{}", name.to_lowercase()),
                program_id: program_id.clone(),
                program_voice_id: voice_id.clone(),
                name: name.to_string(),
                order: n as f64,
            },
        )
        .await?;
        tracks.push(id);
    }

    let sequence_id = put(
        tx,
        ProgramSequence {
            id: "leaves-sequence-decay".to_string(),
            program_id: program_id.clone(),
            name: "decay".to_string(),
            key: "F#".to_string(),
            density: 0.25,
            total: 16,
        },
    )
    .await?;

    for (n, (position, name, notes)) in [
        (0.0, "G minor", "G3, Bb3, D4"),
        (4.0, "C major", "C3, E3, G3"),
        (8.0, "F7", "F3, A3, C4, Eb4"),
    ]
    .into_iter()
    .enumerate()
    {
        let chord_id = put(
            tx,
            ProgramSequenceChord {
                id: format!("leaves-chord-{}", n),
                program_id: program_id.clone(),
                program_sequence_id: sequence_id.clone(),
                name: name.to_string(),
                position,
            },
        )
        .await?;
        put(
            tx,
            ProgramSequenceChordVoicing {
                id: format!("leaves-voicing-{}", n),
                program_id: program_id.clone(),
                program_sequence_chord_id: chord_id,
                program_voice_id: voice_id.clone(),
                notes: notes.to_string(),
            },
        )
        .await?;
    }

    for (offset, memes) in [
        (0, &["Gravel"][..]),
        (1, &["Gravel", "Fuzz"][..]),
        (2, &["Rocks", "Fuzz"][..]),
        (3, &["Noise"][..]),
    ] {
        let binding_id = put(
            tx,
            ProgramSequenceBinding {
                id: format!("leaves-binding-{}", offset),
                program_id: program_id.clone(),
                program_sequence_id: sequence_id.clone(),
                offset,
            },
        )
        .await?;
        for meme in memes {
            put(
                tx,
                ProgramSequenceBindingMeme {
                    id: format!("leaves-binding-{}-{}", offset, meme.to_lowercase()),
                    program_id: program_id.clone(),
                    program_sequence_binding_id: binding_id.clone(),
                    name: meme.to_string(),
                },
            )
            .await?;
        }
    }

    let pattern_id = put(
        tx,
        ProgramSequencePattern {
            id: "leaves-pattern-growth".to_string(),
            program_id: program_id.clone(),
            program_sequence_id: sequence_id.clone(),
            program_voice_id: voice_id.clone(),
            r#type: ProgramSequencePatternType::Loop,
            name: "growth".to_string(),
            total: 16,
        },
    )
    .await?;

    for (n, (track, position, tones, velocity)) in [
        (0, 0.0, "C", 1.0),
        (1, 1.0, "G", 0.8),
        (0, 2.5, "C", 0.6),
        (1, 3.0, "G", 0.9),
    ]
    .into_iter()
    .enumerate()
    {
        put(
            tx,
            ProgramSequencePatternEvent {
                id: format!("leaves-event-{}", n),
                program_id: program_id.clone(),
                program_sequence_pattern_id: pattern_id.clone(),
                program_voice_track_id: tracks[track].clone(),
                position,
                duration: 1.0,
                tones: tones.to_string(),
                velocity,
            },
        )
        .await?;
    }

    Ok(())
}

/// A small beat program in the other account's library
async fn load_coconuts_program(tx: &mut dyn StoreTransaction) -> Result<()> {
    let program_id = PROGRAM_COCONUTS.to_string();
    put(
        tx,
        Program {
            id: program_id.clone(),
            library_id: LIBRARY_HOUSE.to_string(),
            r#type: ProgramType::Beat,
            state: ProgramState::Draft,
            name: "coconuts".to_string(),
            key: "F#".to_string(),
            tempo: 110.3,
            density: None,
            config: None,
        },
    )
    .await?;
    put(
        tx,
        ProgramMeme {
            id: "coconuts-meme-ants".to_string(),
            program_id: program_id.clone(),
            name: "Ants".to_string(),
        },
    )
    .await?;
    put(
        tx,
        ProgramVoice {
            id: "coconuts-voice-drums".to_string(),
            program_id,
            r#type: InstrumentType::Drum,
            name: "Drums".to_string(),
            order: 0.0,
        },
    )
    .await?;
    Ok(())
}

async fn load_instruments(tx: &mut dyn StoreTransaction) -> Result<()> {
    let instrument_id = INSTRUMENT_808.to_string();
    put(
        tx,
        Instrument {
            id: instrument_id.clone(),
            library_id: LIBRARY_LEAVES.to_string(),
            r#type: InstrumentType::Drum,
            mode: InstrumentMode::Event,
            state: InstrumentState::Published,
            name: "808 Drums".to_string(),
            density: Some(0.6),
            volume: Some(1.0),
            config: None,
        },
    )
    .await?;

    for name in ["Ants", "Mold"] {
        put(
            tx,
            InstrumentMeme {
                id: format!("808-meme-{}", name.to_lowercase()),
                instrument_id: instrument_id.clone(),
                name: name.to_string(),
            },
        )
        .await?;
    }

    for (id, name, waveform_key, event) in [
        ("808-audio-beat", "Beat", "19801735098q47895897895782138975898.wav", "KICK"),
        ("808-audio-chords", "Chords Cm to D", "a0b9f74kf9b4h8d9e0g73k107s09f7-g0e73982.wav", "CHORD"),
    ] {
        put(
            tx,
            InstrumentAudio {
                id: id.to_string(),
                instrument_id: instrument_id.clone(),
                name: name.to_string(),
                waveform_key: Some(waveform_key.to_string()),
                transient_seconds: 0.01,
                loop_beats: 2.123,
                tempo: 120.0,
                intensity: 0.62,
                event: event.to_string(),
                tones: "C".to_string(),
                volume: 1.0,
            },
        )
        .await?;
    }
    Ok(())
}

async fn load_templates(tx: &mut dyn StoreTransaction) -> Result<()> {
    let template_id = TEMPLATE_LOFI.to_string();
    put(
        tx,
        Template {
            id: template_id.clone(),
            account_id: ACCOUNT_TESTING.to_string(),
            name: "Lofi".to_string(),
            ship_key: "lofi".to_string(),
            r#type: TemplateType::Production,
            config: Some("outputEncoding=\"AAC\"".to_string()),
        },
    )
    .await?;

    for (n, (r#type, target_id)) in [
        (ContentBindingType::Library, LIBRARY_LEAVES),
        (ContentBindingType::Program, PROGRAM_LEAVES),
        (ContentBindingType::Instrument, INSTRUMENT_808),
    ]
    .into_iter()
    .enumerate()
    {
        put(
            tx,
            TemplateBinding {
                id: format!("lofi-binding-{}", n),
                template_id: template_id.clone(),
                r#type,
                target_id: target_id.to_string(),
            },
        )
        .await?;
    }
    Ok(())
}
