mod settings;

use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use segsync_core::interchange::segment_file;
use segsync_core::segments::domain::selection::ToggleOutcome;
use segsync_core::session::editing_session::{AudioSource, EditingSession, TranscriptionUpdate};
use segsync_core::shared::constants::TRANSCRIPTION_POLL_INTERVAL;
use segsync_core::shared::segment_id::SegmentId;
use segsync_core::transcription::domain::transcription_service::TranscriptionTool;
use segsync_core::transcription::infrastructure::http_transcription_service::HttpTranscriptionService;

use settings::Settings;

/// Edit timed transcript segments and drive the transcription server.
#[derive(Parser)]
#[command(name = "segsync")]
struct Cli {
    /// Transcription server base URL (overrides the saved setting).
    #[arg(long, global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the segment table of a segments file.
    Show {
        segments: PathBuf,
    },

    /// Concatenate two adjacent segments, given by row index.
    Merge {
        segments: PathBuf,
        first: usize,
        second: usize,
        /// Output file (defaults to overwriting the input).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Replace the text of one segment.
    Edit {
        segments: PathBuf,
        index: usize,
        text: String,
        /// Output file (defaults to overwriting the input).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Delete one segment.
    Remove {
        segments: PathBuf,
        index: usize,
        /// Output file (defaults to overwriting the input).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Upload an audio file, transcribe it and write the segments.
    Transcribe {
        audio: PathBuf,
        /// Recognizer: faster-whisper or nemo-asr.
        #[arg(long)]
        tool: Option<TranscriptionTool>,
        #[arg(long)]
        model: Option<String>,
        /// Language code, e.g. "en".
        #[arg(long)]
        lang: Option<String>,
        /// Initial prompt for the recognizer.
        #[arg(long)]
        prompt: Option<String>,
        /// Output file (defaults to <stem>_segments_<timestamp>.json).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Request a speech dataset archive for an uploaded audio file.
    Dataset {
        /// Name the server stored the upload under.
        managed_name: String,
        /// Name of the audio file as originally picked.
        original_name: String,
        segments: PathBuf,
        /// Output archive (defaults to <stem>.zip).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the effective settings, optionally persisting overrides.
    Config {
        #[arg(long)]
        tool: Option<TranscriptionTool>,
        #[arg(long)]
        model: Option<String>,
        #[arg(long)]
        lang: Option<String>,
        #[arg(long)]
        save: bool,
    },
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let mut settings = Settings::load();
    if let Some(server) = cli.server {
        settings.server_url = server;
    }

    match cli.command {
        Command::Show { segments } => run_show(&segments),
        Command::Merge {
            segments,
            first,
            second,
            output,
        } => run_merge(&segments, first, second, output.as_deref()),
        Command::Edit {
            segments,
            index,
            text,
            output,
        } => run_edit(&segments, index, text, output.as_deref()),
        Command::Remove {
            segments,
            index,
            output,
        } => run_remove(&segments, index, output.as_deref()),
        Command::Transcribe {
            audio,
            tool,
            model,
            lang,
            prompt,
            output,
        } => {
            apply_overrides(&mut settings, tool, model, lang);
            run_transcribe(&settings, &audio, prompt, output.as_deref())
        }
        Command::Dataset {
            managed_name,
            original_name,
            segments,
            output,
        } => run_dataset(
            &settings,
            managed_name,
            original_name,
            &segments,
            output.as_deref(),
        ),
        Command::Config {
            tool,
            model,
            lang,
            save,
        } => {
            apply_overrides(&mut settings, tool, model, lang);
            run_config(&settings, save)
        }
    }
}

fn run_show(segments: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let session = open_session(segments)?;
    println!(
        "{:>4}  {:>9}  {:>9}  {:>9}  Text",
        "#", "Start", "End", "Duration"
    );
    for (index, row) in session.table().rows().iter().enumerate() {
        println!(
            "{index:>4}  {:>9}  {:>9}  {:>9}  {}",
            row.start, row.end, row.duration, row.text
        );
    }
    log::info!("{} segments", session.table().len());
    Ok(())
}

fn run_merge(
    segments: &Path,
    first: usize,
    second: usize,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = open_session(segments)?;
    for index in [first, second] {
        let id = id_at(&session, index)?;
        if let ToggleOutcome::Rejected(reason) = session.toggle_selection(id) {
            return Err(format!("Cannot select segment {index}: {reason}").into());
        }
    }
    let merged = session.merge_selected()?;
    log::info!(
        "Merged segments {first} and {second} into {:.2}-{:.2}",
        merged.start,
        merged.end
    );
    save_session(&session, output.unwrap_or(segments))
}

fn run_edit(
    segments: &Path,
    index: usize,
    text: String,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = open_session(segments)?;
    let id = id_at(&session, index)?;
    let dialog = session
        .open_edit_dialog(&id)
        .ok_or_else(|| format!("Segment {index} disappeared"))?;
    log::debug!("Replacing text {:?}", dialog.initial_text());
    session.confirm_edit(dialog, text);
    save_session(&session, output.unwrap_or(segments))
}

fn run_remove(
    segments: &Path,
    index: usize,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = open_session(segments)?;
    let id = id_at(&session, index)?;
    session.remove_segment(&id);
    save_session(&session, output.unwrap_or(segments))
}

fn run_transcribe(
    settings: &Settings,
    audio: &Path,
    prompt: Option<String>,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let service = Arc::new(HttpTranscriptionService::new(settings.server_url.clone()));
    let uploaded = service.upload(audio)?;

    let mut session = EditingSession::new();
    session.load_audio(AudioSource {
        original_name: file_name(audio),
        managed_name: uploaded.filename,
    });
    let params = settings.transcription_params(prompt);
    session.start_transcription(service, &params)?;

    loop {
        match session.wait_for_transcription(TRANSCRIPTION_POLL_INTERVAL) {
            TranscriptionUpdate::Running => eprint!("."),
            TranscriptionUpdate::Completed { segments } => {
                eprintln!();
                log::info!("Transcription produced {segments} segments");
                break;
            }
            TranscriptionUpdate::Failed(reason) => {
                eprintln!();
                return Err(format!("Transcription failed: {reason}").into());
            }
            TranscriptionUpdate::Idle => break,
        }
    }

    let output = match output {
        Some(path) => path.to_path_buf(),
        None => default_export_path(&session, audio, &chrono::Local::now().naive_local())?,
    };
    save_session(&session, &output)
}

/// `<stem>_segments_<timestamp>.json` next to the audio file.
fn default_export_path(
    session: &EditingSession,
    audio: &Path,
    at: &chrono::NaiveDateTime,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let name = session
        .export_file_name(at)
        .ok_or("No audio loaded to name the export after")?;
    Ok(audio.with_file_name(name))
}

fn run_dataset(
    settings: &Settings,
    managed_name: String,
    original_name: String,
    segments: &Path,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = EditingSession::new();
    session.load_audio(AudioSource {
        original_name,
        managed_name,
    });
    session.import_file(segments)?;
    let (managed, request) = session
        .dataset_request()
        .ok_or("No segments to export")?;

    let service = HttpTranscriptionService::new(settings.server_url.clone());
    let archive = service.export_dataset(&managed, &request)?;

    let output = match output {
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(segment_file::dataset_archive_name(
            &request.original_file_name,
        )),
    };
    fs::write(&output, archive)?;
    log::info!("Dataset written to {}", output.display());
    Ok(())
}

fn run_config(settings: &Settings, save: bool) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(settings)?);
    if save {
        let path = settings.save()?;
        log::info!("Settings saved to {}", path.display());
    }
    Ok(())
}

fn open_session(segments: &Path) -> Result<EditingSession, Box<dyn std::error::Error>> {
    let mut session = EditingSession::new();
    let count = session.import_file(segments)?;
    log::debug!("Imported {count} segments from {}", segments.display());
    Ok(session)
}

fn save_session(
    session: &EditingSession,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    segment_file::write_segments_file(path, session.store().all())?;
    log::info!("Output written to {}", path.display());
    Ok(())
}

fn id_at(
    session: &EditingSession,
    index: usize,
) -> Result<SegmentId, Box<dyn std::error::Error>> {
    session
        .store()
        .get(index)
        .map(|segment| segment.id)
        .ok_or_else(|| {
            format!(
                "No segment at index {index} (file has {})",
                session.store().len()
            )
            .into()
        })
}

fn apply_overrides(
    settings: &mut Settings,
    tool: Option<TranscriptionTool>,
    model: Option<String>,
    lang: Option<String>,
) {
    if let Some(tool) = tool {
        settings.tool = tool;
    }
    if let Some(model) = model {
        settings.model = model;
    }
    if let Some(lang) = lang {
        settings.language = Some(lang);
    }
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let input = match &cli.command {
        Command::Show { segments }
        | Command::Merge { segments, .. }
        | Command::Edit { segments, .. }
        | Command::Remove { segments, .. }
        | Command::Dataset { segments, .. } => Some(segments),
        Command::Transcribe { audio, .. } => Some(audio),
        Command::Config { .. } => None,
    };
    if let Some(input) = input {
        if !input.exists() {
            return Err(format!("Input file not found: {}", input.display()).into());
        }
    }
    if let Command::Merge { first, second, .. } = &cli.command {
        if first == second {
            return Err(
                format!("Merge needs two different segments, got {first} twice").into(),
            );
        }
    }
    if let Some(server) = &cli.server {
        if !(server.starts_with("http://") || server.starts_with("https://")) {
            return Err(format!(
                "Server URL must start with http:// or https://, got '{server}'"
            )
            .into());
        }
    }
    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
