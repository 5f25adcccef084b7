use std::path::{Path, PathBuf};

use chrono::Timelike;
use eframe::egui::{self, Grid, RichText, TextEdit, Widget};

use crate::alarm::{AlarmTime, Repeat, TimeInputError};

/// file types the sound chooser offers
pub const SOUND_EXTENSIONS: [&str; 2] = ["wav", "mp3"];

/// What the user typed in the main window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmForm {
    pub title: String,
    pub message: String,
    pub(crate) hour: String,
    pub(crate) minute: String,
    pub repeat: Repeat,
}

impl Default for AlarmForm {
    fn default() -> Self {
        let time = chrono::Local::now().naive_local().time();
        Self {
            title: "Reminder".to_string(),
            message: "It's time for your task.".to_string(),
            hour: format!("{:02}", time.hour()),
            minute: format!("{:02}", time.minute()),
            repeat: Repeat::Once,
        }
    }
}

impl AlarmForm {
    #[must_use]
    pub fn with_time(mut self, hour: &str, minute: &str) -> Self {
        self.hour = hour.to_string();
        self.minute = minute.to_string();
        self
    }

    #[must_use]
    pub fn with_repeat(mut self, repeat: Repeat) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn time(&self) -> Result<AlarmTime, TimeInputError> {
        AlarmTime::parse(&self.hour, &self.minute)
    }

    /// returns true if the user asked to choose a new sound
    pub(crate) fn render(&mut self, ui: &mut egui::Ui, sound: &Path) -> bool {
        let mut choose_sound = false;
        Grid::new("alarm form")
            .num_columns(2)
            .spacing([10.0, 8.0])
            .show(ui, |ui| {
                ui.label(RichText::new("Title").strong());
                TextEdit::singleline(&mut self.title)
                    .desired_width(f32::INFINITY)
                    .ui(ui);
                ui.end_row();

                ui.label(RichText::new("Message").strong());
                TextEdit::singleline(&mut self.message)
                    .desired_width(f32::INFINITY)
                    .ui(ui);
                ui.end_row();

                ui.label(RichText::new("Time (24h)").strong());
                self.render_time_editor(ui);
                ui.end_row();

                ui.label("");
                ui.horizontal(|ui| {
                    ui.radio_value(&mut self.repeat, Repeat::Once, Repeat::Once.to_string());
                    ui.radio_value(&mut self.repeat, Repeat::Daily, Repeat::Daily.to_string());
                });
                ui.end_row();

                ui.label(RichText::new("Sound:").strong());
                ui.horizontal(|ui| {
                    ui.label(sound_name(sound));
                    if ui.button("Choose Sound").clicked() {
                        choose_sound = true;
                    }
                });
                ui.end_row();
            });
        choose_sound
    }

    fn render_time_editor(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            TextEdit::singleline(&mut self.hour)
                .desired_width(24.0)
                .char_limit(3)
                .ui(ui);
            ui.label(":");
            TextEdit::singleline(&mut self.minute)
                .desired_width(24.0)
                .char_limit(3)
                .ui(ui);
        });
    }
}

/// what we show for a sound, just the file name
#[must_use]
pub fn sound_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}

/// opens the native file dialog in the users audio folder
#[must_use]
pub fn pick_sound() -> Option<PathBuf> {
    let file_dialog = rfd::FileDialog::new()
        .set_title("Choose sound")
        .add_filter("Audio files", &SOUND_EXTENSIONS);
    let file_dialog = match directories::UserDirs::new()
        .and_then(|u| u.audio_dir().map(Path::to_path_buf))
    {
        Some(audio_path) => file_dialog.set_directory(audio_path),
        None => file_dialog,
    };
    file_dialog.pick_file()
}
