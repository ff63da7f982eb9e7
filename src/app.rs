//! Voice Extractor main window — egui/eframe application.
//!
//! # Architecture
//!
//! [`VoiceExtractorApp`] is the top-level [`eframe::App`].  It owns the
//! [`JobRunner`] (submissions) and the [`EventReceiver`] (results); the
//! background worker owns the matching [`EventSender`] and never touches UI
//! state directly.
//!
//! Every `update()` call drains the event channel and applies each event to
//! visible state, then schedules the next repaint 100 ms out — the poll loop
//! runs for the lifetime of the window, idle or not.
//!
//! # Event handling
//!
//! | Event       | Effect                                                  |
//! |-------------|---------------------------------------------------------|
//! | `Status`    | replace the status line                                 |
//! | `Progress`  | set the progress bar (clamped 0–100)                    |
//! | `Segment`   | append to the text area, scroll to the end              |
//! | `Completed` | store transcript, re-enable submit/save/copy/clear      |
//! | `Failed`    | modal error, re-enable submit, text area left untouched |
//!
//! [`EventSender`]: crate::pipeline::EventSender

use std::path::{Path, PathBuf};
use std::time::Duration;

use eframe::egui;

use crate::audio::{formats, AUDIO_EXTENSIONS, VIDEO_EXTENSIONS};
use crate::config::AppConfig;
use crate::pipeline::{EventReceiver, Job, JobEvent, JobPhase, JobRunner, SubmitError};
use crate::stt::{ModelKind, SUPPORTED_LANGUAGES};
use crate::transcript::{default_output_path, Transcript};

/// Fixed period of the UI poll loop.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

const ACCENT: egui::Color32 = egui::Color32::from_rgb(0, 255, 136);
const DIM: egui::Color32 = egui::Color32::from_rgb(136, 136, 136);
const ERROR_COLOR: egui::Color32 = egui::Color32::from_rgb(255, 136, 68);

// ---------------------------------------------------------------------------
// VoiceExtractorApp
// ---------------------------------------------------------------------------

/// eframe application — the Voice Extractor window.
pub struct VoiceExtractorApp {
    // ── Selections ───────────────────────────────────────────────────────
    /// Path of the selected media file (typed or dropped).
    source_input: String,
    /// Selected Whisper model.
    model: ModelKind,
    /// Selected language code (`"auto"` or ISO-639-1).
    language: String,

    // ── Job state ────────────────────────────────────────────────────────
    /// Lifecycle of the current/last job.
    phase: JobPhase,
    /// Status line under the extract button.
    status_line: String,
    /// Progress bar value, 0–100.
    progress: u8,
    /// Text area contents: segments stream in here while a job runs.
    transcript_text: String,
    /// Final transcript of the last completed job.
    transcript: Option<Transcript>,
    /// Editable save destination, suggested on completion.
    save_path: String,
    /// Modal error text, when a dialog is open.
    error_modal: Option<String>,

    // ── Infrastructure ───────────────────────────────────────────────────
    runner: JobRunner,
    events: EventReceiver,
    config: AppConfig,
}

impl VoiceExtractorApp {
    /// Create the app.  Model/language selections are seeded from the
    /// config, normalized leniently.
    pub fn new(runner: JobRunner, events: EventReceiver, config: AppConfig) -> Self {
        Self {
            source_input: String::new(),
            model: ModelKind::normalize(&config.stt.model),
            language: crate::stt::normalize_language(&config.stt.language),
            phase: JobPhase::Idle,
            status_line: "Ready to process".into(),
            progress: 0,
            transcript_text: String::new(),
            transcript: None,
            save_path: String::new(),
            error_modal: None,
            runner,
            events,
            config,
        }
    }

    // ── Event polling ────────────────────────────────────────────────────

    /// Drain all pending job events (non-blocking) and apply them in order.
    fn poll_events(&mut self) {
        for event in self.events.drain_all() {
            self.apply_event(event);
        }
    }

    fn apply_event(&mut self, event: JobEvent) {
        match event {
            JobEvent::Status(message) => {
                self.status_line = message;
            }
            JobEvent::Progress(percent) => {
                self.progress = percent.min(100);
            }
            JobEvent::Segment(text) => {
                self.transcript_text.push_str(&text);
            }
            JobEvent::Completed(transcript) => {
                self.transcript_text = transcript.text.clone();
                self.save_path = default_output_path(Path::new(&self.source_input))
                    .display()
                    .to_string();
                self.status_line = format!("Extraction complete — {}", transcript.summary());
                self.transcript = Some(transcript);
                self.phase = JobPhase::Completed;
            }
            JobEvent::Failed(message) => {
                // The text area keeps whatever it had; only the controls and
                // the dialog change.
                self.error_modal = Some(message);
                self.phase = JobPhase::Failed;
            }
        }
    }

    // ── Actions ──────────────────────────────────────────────────────────

    /// Validate the selection and submit a job.
    fn start_extraction(&mut self) {
        let source = PathBuf::from(self.source_input.trim());
        if self.source_input.trim().is_empty() {
            self.error_modal = Some("Select a video or audio file first".into());
            return;
        }
        if !formats::is_supported(&source) {
            self.error_modal = Some(format!(
                "Unsupported file type: {}\nSupported: {} / {}",
                source.display(),
                VIDEO_EXTENSIONS.join(", "),
                AUDIO_EXTENSIONS.join(", "),
            ));
            return;
        }

        let job = Job::new(&source, self.model.id(), &self.language);
        match self.runner.submit(job) {
            Ok(()) => {
                self.phase = JobPhase::Running;
                self.transcript = None;
                self.transcript_text.clear();
                self.progress = 0;
                self.status_line = "Starting…".into();
            }
            Err(SubmitError::Busy) => {
                // Should be unreachable while the button is disabled, but the
                // runner is the authority.
                self.status_line = SubmitError::Busy.to_string();
            }
        }
    }

    fn save_transcript(&mut self) {
        let Some(transcript) = &self.transcript else {
            return;
        };
        let path = PathBuf::from(self.save_path.trim());
        match transcript.save(&path) {
            Ok(()) => {
                self.status_line = format!("Saved to {}", path.display());
            }
            Err(e) => {
                self.error_modal = Some(format!("Could not save {}: {e}", path.display()));
            }
        }
    }

    fn copy_transcript(&mut self) {
        let Some(transcript) = &self.transcript else {
            return;
        };
        match crate::clipboard::copy_text(&transcript.text) {
            Ok(()) => self.status_line = "Copied to clipboard".into(),
            Err(e) => self.error_modal = Some(e.to_string()),
        }
    }

    fn clear_transcript(&mut self) {
        self.transcript = None;
        self.transcript_text.clear();
        self.save_path.clear();
        self.progress = 0;
        self.status_line = "Ready to process".into();
        self.phase = JobPhase::Idle;
    }

    /// Accept the first supported file dropped onto the window.
    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        for file in dropped {
            if let Some(path) = file.path {
                if formats::is_supported(&path) {
                    self.source_input = path.display().to_string();
                    break;
                }
            }
        }
    }

    // ── Panels ───────────────────────────────────────────────────────────

    fn draw_header(&self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.label(egui::RichText::new("Voice Extractor").color(ACCENT).size(22.0).strong());
            ui.label(
                egui::RichText::new("Extract text from videos and audio with Whisper")
                    .color(DIM)
                    .size(12.0),
            );
        });
        ui.add_space(12.0);
    }

    fn draw_file_row(&mut self, ui: &mut egui::Ui) {
        ui.label(egui::RichText::new("Video/audio file").size(12.0));
        ui.horizontal(|ui| {
            let edit = egui::TextEdit::singleline(&mut self.source_input)
                .hint_text("Drop a file here or type a path")
                .desired_width(f32::INFINITY);
            ui.add_enabled(!self.phase.is_running(), edit);
        });
        ui.label(
            egui::RichText::new(format!(
                "Video: {} · Audio: {}",
                VIDEO_EXTENSIONS.join(" "),
                AUDIO_EXTENSIONS.join(" ")
            ))
            .color(DIM)
            .size(10.0),
        );
        ui.add_space(8.0);
    }

    fn draw_selectors(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new("Model").size(12.0));
            egui::ComboBox::from_id_salt("model")
                .selected_text(self.model.id())
                .show_ui(ui, |ui| {
                    for kind in ModelKind::ALL {
                        ui.selectable_value(&mut self.model, *kind, kind.info().display_name);
                    }
                });

            ui.add_space(16.0);

            ui.label(egui::RichText::new("Language").size(12.0));
            egui::ComboBox::from_id_salt("language")
                .selected_text(self.language.clone())
                .show_ui(ui, |ui| {
                    for lang in SUPPORTED_LANGUAGES {
                        ui.selectable_value(&mut self.language, lang.to_string(), *lang);
                    }
                });
        });
        ui.label(
            egui::RichText::new("tiny = fastest / lower quality · large = best quality / slowest")
                .color(DIM)
                .size(10.0),
        );
        ui.add_space(8.0);
    }

    fn draw_extract_button(&mut self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            let label = if self.phase.is_running() {
                "Processing…"
            } else {
                "Extract voice"
            };
            let button = egui::Button::new(egui::RichText::new(label).size(14.0))
                .min_size(egui::vec2(160.0, 28.0));
            if ui.add_enabled(!self.phase.is_running(), button).clicked() {
                self.start_extraction();
            }
        });
        ui.add_space(8.0);
    }

    fn draw_progress(&self, ui: &mut egui::Ui) {
        ui.label(egui::RichText::new(self.status_line.as_str()).size(12.0));
        ui.add(
            egui::ProgressBar::new(self.progress as f32 / 100.0)
                .show_percentage()
                .animate(self.phase.is_running()),
        );
        ui.add_space(8.0);
    }

    fn draw_transcript_area(&mut self, ui: &mut egui::Ui) {
        ui.label(egui::RichText::new("Extracted text").size(12.0));
        let available = (ui.available_height() - 40.0).max(120.0);
        egui::ScrollArea::vertical()
            .max_height(available)
            .stick_to_bottom(true)
            .show(ui, |ui| {
                ui.add_sized(
                    [ui.available_width(), available],
                    egui::TextEdit::multiline(&mut self.transcript_text.as_str())
                        .hint_text("The transcript appears here")
                        .desired_rows(12),
                );
            });
        ui.add_space(6.0);
    }

    fn draw_action_row(&mut self, ui: &mut egui::Ui) {
        let actions_enabled = self.transcript.is_some() && !self.phase.is_running();

        ui.horizontal(|ui| {
            if ui
                .add_enabled(actions_enabled, egui::Button::new("Save text to file"))
                .clicked()
            {
                self.save_transcript();
            }
            if ui
                .add_enabled(actions_enabled, egui::Button::new("Copy to clipboard"))
                .clicked()
            {
                self.copy_transcript();
            }
            if ui
                .add_enabled(actions_enabled, egui::Button::new("Clear text"))
                .clicked()
            {
                self.clear_transcript();
            }
        });

        if actions_enabled {
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new("Save as").color(DIM).size(11.0));
                ui.add(
                    egui::TextEdit::singleline(&mut self.save_path)
                        .desired_width(f32::INFINITY),
                );
            });
        }
    }

    /// Modal error dialog; closing it acknowledges the error.
    fn draw_error_modal(&mut self, ctx: &egui::Context) {
        let Some(message) = self.error_modal.clone() else {
            return;
        };
        let mut open = true;
        let mut dismissed = false;
        egui::Window::new("Extraction error")
            .open(&mut open)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(egui::RichText::new(message.as_str()).color(ERROR_COLOR));
                ui.add_space(8.0);
                if ui.button("Close").clicked() {
                    dismissed = true;
                }
            });
        if !open || dismissed {
            self.error_modal = None;
        }
    }
}

// ---------------------------------------------------------------------------
// eframe::App impl
// ---------------------------------------------------------------------------

impl eframe::App for VoiceExtractorApp {
    /// Called every frame by eframe.  Drains the event channel, then renders
    /// the window and schedules the next poll tick.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_events();
        self.handle_dropped_files(ctx);

        // Keep polling at a fixed period for the lifetime of the window.
        ctx.request_repaint_after(POLL_INTERVAL);

        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_header(ui);
            self.draw_file_row(ui);
            self.draw_selectors(ui);
            self.draw_extract_button(ui);
            self.draw_progress(ui);
            ui.separator();
            self.draw_transcript_area(ui);
            self.draw_action_row(ui);
        });

        self.draw_error_modal(ctx);
    }

    /// Persist selections on exit (best-effort).
    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.config.stt.model = self.model.id().to_string();
        self.config.stt.language = self.language.clone();
        if let Err(e) = self.config.save() {
            log::warn!("failed to save settings on exit: {e}");
        }
        log::info!("Voice Extractor closing");
    }
}
