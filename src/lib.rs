#![warn(clippy::pedantic, clippy::nursery, clippy::cargo)]
#![deny(clippy::use_self, rust_2018_idioms)]
#![allow(clippy::multiple_crate_versions, clippy::module_name_repetitions)]

use std::{
    path::{Path, PathBuf},
    sync::{
        mpsc::{self, Receiver, Sender},
        Arc,
    },
    time::Duration,
};

use alarm::{AlarmState, SharedState, TimeInputError};
use alarm_edit::{pick_sound, AlarmForm};
use audio::AudioHandle;
use chrono::NaiveDateTime;
use communication::UiEvent;
use config::Config;
use eframe::egui::{
    self, Align2, CentralPanel, Color32, Context, Frame, Id, RichText, Sense, ViewportCommand,
    Window, WindowLevel,
};
use log::{debug, error, info};
use scheduler::{Fire, Scheduler};

pub mod alarm;
/// the main window form
pub mod alarm_edit;
pub mod audio;
pub mod chime;
pub mod communication;
pub mod config;
pub mod scheduler;

pub const APP_TITLE: &str = "Custom Notifier";
pub const BG_COLOR: Color32 = Color32::from_rgb(0xf5, 0xc6, 0xea);
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Starts the looping sound and asks the ui for the popup.
pub struct Alerter {
    audio: AudioHandle,
    events: Sender<UiEvent>,
    ctx: Context,
}

impl Alerter {
    #[must_use]
    pub const fn new(audio: AudioHandle, events: Sender<UiEvent>, ctx: Context) -> Self {
        Self { audio, events, ctx }
    }
}

impl Fire for Alerter {
    fn fire(&self, sound: &Path) {
        self.audio.play(sound);
        if self.events.send(UiEvent::ShowPopup).is_err() {
            debug!("ui is gone, no popup");
        }
        // the ui may be idle so wake it up
        self.ctx.request_repaint();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Info(String),
    Error(String),
}

pub struct Notifier {
    config: Config,
    config_path: PathBuf,
    form: AlarmForm,
    state: SharedState,
    audio: AudioHandle,
    scheduler: Scheduler<Alerter>,
    events: Receiver<UiEvent>,
    popup_open: bool,
    status: Option<Status>,
    closed: bool,
    now: fn() -> NaiveDateTime,
}

fn local_now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

impl Notifier {
    #[must_use]
    pub fn new(ctx: Context, config: Config, config_path: PathBuf, audio: AudioHandle) -> Self {
        let state = SharedState::new(AlarmState::new(config.sound()));
        let (sender, events) = mpsc::channel();
        let alerter = Alerter::new(audio.clone(), sender, ctx);
        Self {
            scheduler: Scheduler::new(state.clone(), Arc::new(alerter)),
            config,
            config_path,
            form: AlarmForm::default(),
            state,
            audio,
            events,
            popup_open: false,
            status: None,
            closed: false,
            now: local_now,
        }
    }

    /// swaps the wall clock used by the buttons and the poller
    #[must_use]
    pub fn with_clock(mut self, now: fn() -> NaiveDateTime) -> Self {
        self.now = now;
        self.scheduler.set_clock(now);
        self
    }

    #[must_use]
    pub const fn state(&self) -> &SharedState {
        &self.state
    }

    #[must_use]
    pub const fn status(&self) -> Option<&Status> {
        self.status.as_ref()
    }

    #[must_use]
    pub const fn popup_open(&self) -> bool {
        self.popup_open
    }

    #[must_use]
    pub fn is_polling(&self) -> bool {
        self.scheduler.is_running()
    }

    pub fn form_mut(&mut self) -> &mut AlarmForm {
        &mut self.form
    }

    /// validates the form and schedules the alarm, nothing changes on bad input
    pub fn start(&mut self, now: NaiveDateTime) -> Result<NaiveDateTime, TimeInputError> {
        let time = match self.form.time() {
            Ok(time) => time,
            Err(e) => {
                debug!("rejected alarm time: {e}");
                self.status = Some(Status::Error(
                    "Enter valid hour (0-23) and minute (0-59).".to_string(),
                ));
                return Err(e);
            }
        };
        let next = self.state.lock().schedule(now, time, self.form.repeat);
        info!("alarm set for {next} ({})", self.form.repeat);
        self.status = Some(Status::Info(format!("Set for {}", next.format(TIME_FORMAT))));
        self.scheduler.ensure_running();
        Ok(next)
    }

    pub fn pause(&mut self) {
        self.scheduler.pause();
        self.audio.stop();
        self.state.lock().clear();
        info!("notifications paused");
        self.status = Some(Status::Info("Notifications paused.".to_string()));
    }

    pub fn snooze(&mut self, now: NaiveDateTime) -> NaiveDateTime {
        let until = self.state.lock().snooze(now);
        self.audio.stop();
        self.popup_open = false;
        // a fired one shot alarm has no poller left to honour the snooze
        self.scheduler.ensure_running();
        info!("snoozed until {until}");
        self.status = Some(Status::Info("Snoozed for 5 minutes.".to_string()));
        until
    }

    /// rings right away, the schedule is left alone
    pub fn test_sound(&self) {
        let sound = self.state.lock().sound_path.clone();
        self.scheduler.alerter().fire(&sound);
    }

    pub fn set_sound(&mut self, path: PathBuf) {
        info!("sound set to {}", path.display());
        self.state.lock().sound_path.clone_from(&path);
        self.config.sound_path = Some(path);
        self.save();
    }

    pub fn dismiss(&mut self) {
        self.audio.stop();
        self.popup_open = false;
    }

    /// saves the sound choice, silences everything and stops the poller
    pub fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.config.sound_path = Some(self.state.lock().sound_path.clone());
        self.save();
        self.audio.stop();
        self.scheduler.shutdown();
    }

    /// picks up popups requested by the poller
    pub fn drain_events(&mut self) {
        while let Ok(UiEvent::ShowPopup) = self.events.try_recv() {
            self.popup_open = true;
        }
    }

    fn save(&self) {
        if let Err(e) = self.config.save(&self.config_path) {
            error!(
                "couldn't write config file {}: {e}",
                self.config_path.display()
            );
        }
    }

    fn render_controls(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let size = [96.0, 28.0];
            if ui.add_sized(size, egui::Button::new("Start")).clicked() {
                let _ = self.start((self.now)());
            }
            if ui.add_sized(size, egui::Button::new("Pause")).clicked() {
                self.pause();
            }
            if ui.add_sized(size, egui::Button::new("Snooze 5m")).clicked() {
                self.snooze((self.now)());
            }
            if ui.add_sized(size, egui::Button::new("Test Sound")).clicked() {
                self.test_sound();
            }
        });
    }

    fn render_status(&self, ui: &mut egui::Ui) {
        match &self.status {
            Some(Status::Info(text)) => {
                ui.label(text.as_str());
            }
            Some(Status::Error(text)) => {
                ui.label(RichText::new(text).color(Color32::DARK_RED));
            }
            None => {}
        }
        let (next, snooze) = {
            let state = self.state.lock();
            (state.next_fire, state.snooze_until)
        };
        if let Some(until) = snooze {
            ui.label(format!("Snoozed until {}", until.format(TIME_FORMAT)));
        } else if let Some(next) = next {
            ui.label(format!("Next: {}", next.format(TIME_FORMAT)));
        }
    }

    fn render_popup(&mut self, ctx: &Context) {
        let mut stop = false;
        Window::new(self.form.title.as_str())
            .id(Id::new("alarm popup"))
            .title_bar(false)
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
            .fixed_size([420.0, 160.0])
            .frame(Frame::window(&ctx.style()).fill(BG_COLOR))
            .show(ctx, |ui| {
                // clicking anywhere on the popup stops it too
                let body = ui.interact(ui.max_rect(), Id::new("alarm popup body"), Sense::click());
                ui.vertical_centered(|ui| {
                    ui.add_space(12.0);
                    ui.label(RichText::new(&self.form.title).heading().strong());
                    ui.add_space(8.0);
                    ui.label(self.form.message.as_str());
                    ui.add_space(12.0);
                    if ui.add_sized([120.0, 36.0], egui::Button::new("Stop")).clicked() {
                        stop = true;
                    }
                });
                if body.clicked() {
                    stop = true;
                }
            });
        if stop {
            self.dismiss();
        }
    }
}

impl eframe::App for Notifier {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if ctx.input(|i| i.viewport().close_requested()) {
            self.shutdown();
            return;
        }
        let was_open = self.popup_open;
        self.drain_events();
        // keeps the next alarm line fresh
        ctx.request_repaint_after(Duration::from_secs(1));

        CentralPanel::default()
            .frame(Frame::central_panel(&ctx.style()).fill(BG_COLOR).inner_margin(20.0))
            .show(ctx, |ui| {
                ui.visuals_mut().override_text_color = Some(Color32::BLACK);
                let sound = self.state.lock().sound_path.clone();
                if self.form.render(ui, &sound) {
                    if let Some(path) = pick_sound() {
                        self.set_sound(path);
                    }
                }
                ui.add_space(15.0);
                self.render_controls(ui);
                ui.add_space(10.0);
                self.render_status(ui);
            });

        if self.popup_open {
            self.render_popup(ctx);
        }
        // keep the window above everything else while the popup is up
        match (was_open, self.popup_open) {
            (false, true) => {
                ctx.send_viewport_cmd(ViewportCommand::WindowLevel(WindowLevel::AlwaysOnTop));
                ctx.send_viewport_cmd(ViewportCommand::Focus);
            }
            (true, false) => {
                ctx.send_viewport_cmd(ViewportCommand::WindowLevel(WindowLevel::Normal));
            }
            _ => {}
        }
    }
}

impl Drop for Notifier {
    fn drop(&mut self) {
        self.shutdown();
    }
}
